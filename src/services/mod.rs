//! Service layer for the grabber.
//!
//! This module contains:
//! - Timestamp normalization (`HabrCareerDateTimeParser`)
//! - Vacancy crawling (`HabrCareerParse`)
//! - The bulk read TCP responder (`BulkReadResponder`)

pub mod datetime;
mod posts;
pub mod responder;

pub use datetime::{DateTimeParser, HabrCareerDateTimeParser};
pub use posts::{CrawlOutcome, HabrCareerParse, Parse};
pub use responder::BulkReadResponder;
