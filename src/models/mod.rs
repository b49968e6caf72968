// src/models/mod.rs

//! Domain models for the grabber.

mod config;
mod post;

// Re-export all public types
pub use config::{
    Config, DEFAULT_PAGE_COUNT, CrawlerConfig, DatabaseConfig, SchedulerConfig, SelectorConfig, ServerConfig,
};
pub use post::Post;
