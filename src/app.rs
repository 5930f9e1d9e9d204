//! Shared server state and the HTTP router

use axum::{routing::get, Router};
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::broadcast::SessionHandle;
use crate::roster::Roster;
use crate::{api, ws};

/// State handed to every request handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub roster: Arc<Roster>,
}

impl AppState {
    pub fn new(session: SessionHandle, roster: Arc<Roster>) -> Self {
        Self { session, roster }
    }
}

/// Build the full router: websocket, JSON API, then static files for anything else
pub fn router(state: Arc<AppState>, static_dir: impl AsRef<Path>) -> Router {
    let api_routes = Router::new()
        .route("/api/roster", get(api::get_roster))
        .route("/api/state", get(api::get_state))
        .route("/api/health", get(api::health));

    Router::new()
        .route("/ws", get(ws::ws_handler))
        .merge(api_routes)
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
