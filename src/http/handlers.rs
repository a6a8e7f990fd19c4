//! Endpoint handlers.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    response::Response,
};
use chrono::{Local, SecondsFormat};
use serde_json::json;

use crate::http::request::resolve_remote_addr;
use crate::http::response::{self, json_error};
use crate::http::server::AppState;
use crate::{fields, log_debug, log_info};

fn now() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub async fn index(State(state): State<AppState>, request: Request) -> Response {
    let remote_addr = resolve_remote_addr(&request);
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    log_info!(
        state.logger,
        "Index route accessed",
        fields! {
            "remote_addr" => remote_addr,
            "user_agent" => user_agent,
        }
    );

    response::json(
        StatusCode::OK,
        json!({
            "message": "API Server is running",
            "status": "ok",
            "time": now(),
        }),
    )
}

/// Liveness probe. Skipped by the default request-logging preset.
pub async fn health() -> Response {
    response::json(
        StatusCode::OK,
        json!({
            "status": "healthy",
            "time": now(),
        }),
    )
}

pub async fn version(State(state): State<AppState>) -> Response {
    log_debug!(state.logger, "Version info requested");

    response::json(
        StatusCode::OK,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "api": "v1",
        }),
    )
}

pub async fn websocket_placeholder() -> &'static str {
    "WebSocket endpoint placeholder"
}

/// Fallback for unmatched routes.
pub async fn not_found(request: Request) -> Response {
    json_error(StatusCode::NOT_FOUND, format!("no route for {}", request.uri().path()))
}
