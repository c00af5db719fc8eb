// src/store/sqlite.rs
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::{debug, info};

use super::{
    AdEvent, Bookmark, EventFilters, EventStats, NewAdEvent, NewBookmark, Store, StoreError,
};

#[derive(Clone)]
pub struct SqliteStore {
    db: Pool<Sqlite>,
}

fn ensure_sqlite_parent(db_url: &str) -> std::io::Result<()> {
    if !db_url.starts_with("sqlite:") { return Ok(()); }
    if db_url.contains(":memory:") { return Ok(()); }

    let path_str = if let Some(rest) = db_url.strip_prefix("sqlite://") {
        rest
    } else if let Some(rest) = db_url.strip_prefix("sqlite:") {
        rest
    } else { return Ok(()); };
    let path_str = path_str.split('?').next().unwrap_or(path_str);

    if path_str.is_empty() { return Ok(()); }
    let p = std::path::Path::new(path_str);
    if let Some(parent) = p.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

impl SqliteStore {
    pub async fn connect(db_url: &str) -> Result<Self, StoreError> {
        ensure_sqlite_parent(db_url)?;

        let conn_opts = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
        // every connection to :memory: is its own database, so keep exactly one alive
        let pool_opts = if db_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let db = pool_opts.connect_with(conn_opts).await?;
        sqlx::migrate!().run(&db).await?;

        info!(db_url, "store ready");
        Ok(Self { db })
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn save_bookmark(&self, bookmark: NewBookmark) -> Result<Bookmark, StoreError> {
        let saved = sqlx::query_as::<_, Bookmark>(
            "INSERT INTO bookmarks(session_id, stream_time, content_time) VALUES(?,?,?) RETURNING *",
        )
        .bind(bookmark.session_id)
        .bind(bookmark.stream_time)
        .bind(bookmark.content_time)
        .fetch_one(&self.db)
        .await?;

        debug!(id = saved.id, stream_time = saved.stream_time, "bookmark saved");
        Ok(saved)
    }

    async fn recent_bookmarks(&self, limit: i64) -> Result<Vec<Bookmark>, StoreError> {
        let rows = sqlx::query_as::<_, Bookmark>("SELECT * FROM bookmarks ORDER BY id DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn log_event(&self, event: NewAdEvent) -> Result<i64, StoreError> {
        let detail = event.detail.map(|d| d.to_string());
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO ad_events(session_id, kind, stream_time, detail) VALUES(?,?,?,?) RETURNING id",
        )
        .bind(event.session_id)
        .bind(&event.kind)
        .bind(event.stream_time)
        .bind(detail)
        .fetch_one(&self.db)
        .await?;

        debug!(event_id = id, kind = %event.kind, "ad event logged");
        Ok(id)
    }

    async fn recent_events(
        &self,
        limit: i64,
        offset: i64,
        filters: EventFilters,
    ) -> Result<Vec<AdEvent>, StoreError> {
        let rows = sqlx::query_as::<_, AdEvent>(
            "SELECT * FROM ad_events
             WHERE (?1 IS NULL OR kind = ?1) AND (?2 IS NULL OR session_id = ?2)
             ORDER BY id DESC LIMIT ?3 OFFSET ?4",
        )
        .bind(filters.kind)
        .bind(filters.session_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn event_stats(&self) -> Result<EventStats, StoreError> {
        let total_events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ad_events")
            .fetch_one(&self.db)
            .await?;

        let sessions: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT session_id) FROM ad_events")
            .fetch_one(&self.db)
            .await?;

        let kind_counts: Vec<(String, i64)> = sqlx::query_as(
            "SELECT kind, COUNT(*) as count FROM ad_events GROUP BY kind ORDER BY count DESC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(EventStats {
            total_events,
            sessions,
            kind_counts: kind_counts.into_iter().collect(),
        })
    }
}
