//! API route handlers
//!
//! - `health`: liveness and readiness probes
//! - `detect`: submission intake and clone detection

pub mod detect;
pub mod health;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info
///
/// Root endpoint (GET /), no authentication.
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Cloneguard Server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/detect",
            "/health",
            "/ready"
        ]
    })))
}

/// 404 Not Found handler for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
