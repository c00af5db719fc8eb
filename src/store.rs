// src/store.rs
//
// Persistence for bookmarks and the ad event log.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub mod sqlite;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Entity not found")]
    NotFound,
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => Self::NotFound,
            other => Self::Database(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBookmark {
    pub session_id: Option<String>,
    pub stream_time: f64,
    pub content_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bookmark {
    pub id: i64,
    pub session_id: Option<String>,
    pub stream_time: f64,
    pub content_time: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAdEvent {
    pub session_id: Option<String>,
    pub kind: String,
    pub stream_time: Option<f64>,
    pub detail: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdEvent {
    pub id: i64,
    pub session_id: Option<String>,
    pub kind: String,
    pub stream_time: Option<f64>,
    pub detail: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilters {
    pub kind: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EventStats {
    pub total_events: i64,
    pub sessions: i64,
    pub kind_counts: HashMap<String, i64>,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn save_bookmark(&self, bookmark: NewBookmark) -> Result<Bookmark, StoreError>;
    async fn recent_bookmarks(&self, limit: i64) -> Result<Vec<Bookmark>, StoreError>;
    async fn log_event(&self, event: NewAdEvent) -> Result<i64, StoreError>;
    async fn recent_events(
        &self,
        limit: i64,
        offset: i64,
        filters: EventFilters,
    ) -> Result<Vec<AdEvent>, StoreError>;
    async fn event_stats(&self) -> Result<EventStats, StoreError>;
}
