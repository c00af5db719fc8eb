mod api;
mod breaks;
mod config;
mod controller;
mod host;
mod interceptor;
mod mediator;
mod models;
mod relay;
mod session;
mod store;
mod timeline;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::mpsc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::host::HostLink;
use crate::relay::Relay;
use crate::session::{Session, SessionInput};
use crate::store::{sqlite::SqliteStore, Store};

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub inputs: mpsc::UnboundedSender<SessionInput>,
    pub relay: Relay,
    pub host: HostLink,
    pub admin_token: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("dai_receiver_bridge=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    let store: Arc<dyn Store> = Arc::new(SqliteStore::connect(&config.db_url).await?);
    let state = start_session(&config, store);
    let app = router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("DAI bridge listening on http://{addr}  (host: /host, controllers: /ws)");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Spawn the session task and return the state every handler shares.
fn start_session(config: &Config, store: Arc<dyn Store>) -> Arc<AppState> {
    let relay = Relay::new(config.relay_capacity);
    let host = HostLink::new(config.relay_capacity);
    let session = Session::new(
        host.mediator(),
        Box::new(host.ui()),
        relay.clone(),
        store.clone(),
        &config.backup_stream_url,
    );

    let (inputs, rx) = mpsc::unbounded_channel();
    tokio::spawn(session::run(session, rx));

    Arc::new(AppState {
        store,
        inputs,
        relay,
        host,
        admin_token: config.admin_token.clone(),
    })
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/ws", get(controller::controller_socket))
        .route("/host", get(host::host_socket))
        .nest(
            "/api",
            api::api_router()
                .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_bearer)),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn require_bearer(
    State(st): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ok = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|token| token == st.admin_token)
        .unwrap_or(false);

    if !ok {
        return (StatusCode::UNAUTHORIZED, "missing/invalid token").into_response();
    }
    next.run(req).await
}
