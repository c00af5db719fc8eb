// src/api.rs
//
// Operator API. Mounted under /api behind the bearer-token middleware.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::error;

use crate::session::{SessionInput, SessionSnapshot};
use crate::store::{EventFilters, StoreError};
use crate::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session", get(session_snapshot))
        .route("/bookmarks", get(list_bookmarks))
        .route("/events", get(list_events))
        .route("/events/stats", get(event_stats))
}

#[derive(Serialize)]
struct SessionView {
    #[serde(flatten)]
    snapshot: SessionSnapshot,
    generated_at: DateTime<Utc>,
}

async fn session_snapshot(State(st): State<Arc<AppState>>) -> Response {
    let (tx, rx) = oneshot::channel();
    if st.inputs.send(SessionInput::Snapshot(tx)).is_err() {
        return (StatusCode::SERVICE_UNAVAILABLE, "session task is not running").into_response();
    }
    match rx.await {
        Ok(snapshot) => Json(SessionView {
            snapshot,
            generated_at: Utc::now(),
        })
        .into_response(),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "session task is not running").into_response(),
    }
}

#[derive(Deserialize)]
struct BookmarkQuery {
    limit: Option<i64>,
}

async fn list_bookmarks(
    State(st): State<Arc<AppState>>,
    Query(q): Query<BookmarkQuery>,
) -> Response {
    resp(st.store.recent_bookmarks(clamp_limit(q.limit)).await)
}

#[derive(Deserialize)]
struct EventQuery {
    limit: Option<i64>,
    offset: Option<i64>,
    kind: Option<String>,
    session_id: Option<String>,
}

async fn list_events(State(st): State<Arc<AppState>>, Query(q): Query<EventQuery>) -> Response {
    let filters = EventFilters {
        kind: q.kind,
        session_id: q.session_id,
    };
    let offset = q.offset.unwrap_or(0).max(0);
    resp(st.store.recent_events(clamp_limit(q.limit), offset, filters).await)
}

async fn event_stats(State(st): State<Arc<AppState>>) -> Response {
    resp(st.store.event_stats().await)
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

// ----------------------------- helpers -----------------------------

fn resp<T: Serialize>(r: Result<T, StoreError>) -> Response {
    match r {
        Ok(v) => Json(v).into_response(),
        Err(StoreError::NotFound) => (StatusCode::NOT_FOUND, "not found").into_response(),
        Err(e) => {
            error!("store query failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
