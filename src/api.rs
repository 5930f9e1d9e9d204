//! HTTP API endpoints.
//!
//! Read-only views for tooling and late-loading pages. All mutations go
//! through the websocket.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::protocol::PROTOCOL_VERSION;
use crate::roster::RosterGroup;
use crate::types::Role;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub protocol: &'static str,
    pub version: &'static str,
}

/// GET /api/roster
pub async fn get_roster(State(state): State<Arc<AppState>>) -> Json<Vec<RosterGroup>> {
    Json(state.roster.groups().to_vec())
}

/// Current participant-view snapshot.
///
/// GET /api/state
pub async fn get_state(State(state): State<Arc<AppState>>) -> Response {
    match state.session.snapshot(Role::Participant).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => {
            tracing::error!("Snapshot request failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        protocol: PROTOCOL_VERSION,
        version: env!("CARGO_PKG_VERSION"),
    })
}
