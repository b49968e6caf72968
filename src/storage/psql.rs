//! PostgreSQL storage implementation.
//!
//! Holds a single connection for the lifetime of the process. The scheduled
//! crawl job and the bulk read responder both go through it, so access is
//! serialized with an async mutex.
//!
//! ## Schema
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS post (
//!     id      SERIAL PRIMARY KEY,
//!     name    TEXT NOT NULL,
//!     text    TEXT NOT NULL,
//!     link    TEXT NOT NULL,
//!     created TIMESTAMP NOT NULL
//! );
//! ```
//!
//! `link` carries no unique constraint: re-crawling the same listing inserts
//! the same vacancy again under a new id.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Executor, FromRow};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::{DatabaseConfig, Post};
use crate::storage::Store;

const SCHEMA: &str = include_str!("../../db/schema.sql");

const INSERT_POST: &str = "INSERT INTO post (name, text, link, created) VALUES ($1, $2, $3, $4)";
const SELECT_ALL: &str = "SELECT id, name, text, link, created FROM post";
const SELECT_BY_ID: &str = "SELECT id, name, text, link, created FROM post WHERE id = $1";

/// Row layout of the `post` table.
#[derive(Debug, FromRow)]
struct PostRow {
    id: i32,
    name: String,
    text: String,
    link: String,
    created: NaiveDateTime,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post::new(row.name, row.link, row.text, row.created).with_id(row.id)
    }
}

/// PostgreSQL-backed store over one long-lived connection.
pub struct PsqlStore {
    conn: Mutex<PgConnection>,
}

impl PsqlStore {
    /// Open the connection described by `config`.
    ///
    /// Fails on an unsupported driver, a malformed URL or an unreachable
    /// server; callers treat this as fatal.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        config.validate()?;

        let mut options = PgConnectOptions::from_str(&config.url)?;
        if let Some(username) = &config.username {
            options = options.username(username);
        }
        if let Some(password) = &config.password {
            options = options.password(password);
        }

        let mut conn = PgConnection::connect_with(&options).await?;
        log::info!("Connected to {}", config.url);

        if config.init_schema {
            conn.execute(SCHEMA).await?;
            log::info!("Ensured table 'post' exists");
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert a post, reporting failures.
    pub async fn try_save(&self, post: &Post) -> Result<()> {
        let mut conn = self.conn.lock().await;
        sqlx::query(INSERT_POST)
            .bind(&post.title)
            .bind(&post.description)
            .bind(&post.link)
            .bind(post.created)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Load every row, reporting failures.
    pub async fn try_get_all(&self) -> Result<Vec<Post>> {
        let mut conn = self.conn.lock().await;
        let rows = sqlx::query_as::<_, PostRow>(SELECT_ALL)
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    /// Load one row by primary key, reporting failures.
    pub async fn try_find_by_id(&self, id: i32) -> Result<Option<Post>> {
        let mut conn = self.conn.lock().await;
        let row = sqlx::query_as::<_, PostRow>(SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.map(Post::from))
    }

    /// Close the connection. Must be called on shutdown.
    pub async fn close(self) -> Result<()> {
        self.conn.into_inner().close().await?;
        log::info!("Database connection closed");
        Ok(())
    }
}

#[async_trait]
impl Store for PsqlStore {
    async fn save(&self, post: &Post) {
        if let Err(error) = self.try_save(post).await {
            log::error!("Failed to save post {}: {}", post.link, error);
        }
    }

    async fn get_all(&self) -> Vec<Post> {
        self.try_get_all().await.unwrap_or_else(|error| {
            log::error!("Failed to load posts: {}", error);
            Vec::new()
        })
    }

    async fn find_by_id(&self, id: i32) -> Option<Post> {
        self.try_find_by_id(id).await.unwrap_or_else(|error| {
            log::error!("Failed to load post {}: {}", id, error);
            None
        })
    }
}
