//! In-memory storage implementation.
//!
//! Behaves like the relational store (sequential ids starting at 1,
//! insertion order on read, no uniqueness checks) without a database.
//! Used by tests and by `grabber run --memory`.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::models::Post;
use crate::storage::Store;

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Post>,
    next_id: i32,
}

/// In-memory store guarded by an async mutex.
#[derive(Debug, Default)]
pub struct MemStore {
    table: Mutex<Table>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored posts.
    pub async fn len(&self) -> usize {
        self.table.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Store for MemStore {
    async fn save(&self, post: &Post) {
        let mut table = self.table.lock().await;
        table.next_id += 1;
        let id = table.next_id;
        table.rows.push(post.clone().with_id(id));
    }

    async fn get_all(&self) -> Vec<Post> {
        self.table.lock().await.rows.clone()
    }

    async fn find_by_id(&self, id: i32) -> Option<Post> {
        self.table
            .lock()
            .await
            .rows
            .iter()
            .rev()
            .find(|post| post.id == Some(id))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_post(title: &str) -> Post {
        Post::new(
            title,
            "https://career.habr.com/vacancies/1000103713",
            "Чем предстоит заниматься",
            NaiveDate::from_ymd_opt(2022, 5, 19)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_save_then_get_all_on_empty_store() {
        let store = MemStore::new();
        let post = sample_post("Java Developer");

        store.save(&post).await;
        let all = store.get_all().await;

        assert_eq!(all.len(), 1);
        assert_eq!(all[0], post.clone().with_id(1));
        assert_eq!(all[0].created, post.created);
    }

    #[tokio::test]
    async fn test_duplicates_are_not_merged() {
        let store = MemStore::new();
        let post = sample_post("Java Developer");

        for _ in 0..3 {
            store.save(&post).await;
        }

        let ids: Vec<_> = store.get_all().await.iter().map(|p| p.id).collect();
        assert_eq!(ids, [Some(1), Some(2), Some(3)]);
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let store = MemStore::new();
        store.save(&sample_post("first")).await;
        store.save(&sample_post("second")).await;

        let found = store.find_by_id(2).await.unwrap();
        assert_eq!(found.title, "second");
        assert!(store.find_by_id(3).await.is_none());
        assert!(store.find_by_id(0).await.is_none());
    }

    #[tokio::test]
    async fn test_len() {
        let store = MemStore::new();
        assert!(store.is_empty().await);
        store.save(&sample_post("first")).await;
        assert_eq!(store.len().await, 1);
    }
}
