// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Service banner, health probe and token acquisition.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub mod auth;

pub use auth::*;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Book Catalog API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "auth": "/register, /login (public)",
                "account": "/change-password (protected)",
                "books": "/c/books[/:isbn13|/cursor|/offset|/year|/rating|/title] (protected)",
            }
        }
    }))
}

/// GET /health - database liveness
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "SERVICE_UNAVAILABLE",
                    "message": "Database unavailable",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
