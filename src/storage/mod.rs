//! Storage abstractions for post persistence.
//!
//! `Store` is the capability set the scheduled job and the bulk read
//! responder share. Its methods never fail towards the caller: backends log
//! the error and return nothing, an empty list or `None`. Callers that need
//! to tell "no data" from "error" use the backend's `try_*` methods.

pub mod memory;
pub mod psql;

use async_trait::async_trait;

use crate::models::Post;

// Re-export for convenience
pub use memory::MemStore;
pub use psql::PsqlStore;

/// Trait for post storage backends.
#[async_trait]
pub trait Store: Send + Sync {
    /// Persist a post. The generated id is not reported back.
    async fn save(&self, post: &Post);

    /// Load every stored post in backend order.
    async fn get_all(&self) -> Vec<Post>;

    /// Load the post with the given id.
    async fn find_by_id(&self, id: i32) -> Option<Post>;
}
