pub mod auth;
pub mod health;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::gate;
use crate::state::AppState;

/// Full application router. The edge gate wraps every route, including the
/// fallback, so `/backend/...` never reaches route matching.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .merge(auth::router())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), gate::edge_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
