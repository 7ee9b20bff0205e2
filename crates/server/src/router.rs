//! HTTP router construction.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::api;
use crate::state::AppState;

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);
    Router::new()
        .route("/health", get(api::health))
        // Monitor lifecycle and reads
        .route("/monitor/status", get(api::status))
        .route("/monitor/summary", get(api::summary))
        .route("/monitor/start", post(api::start))
        .route("/monitor/stop", post(api::stop))
        .route("/monitor/check", post(api::check))
        // Alerts
        .route("/alerts", post(api::submit_alert))
        .route("/alerts/{id}/resolve", post(api::resolve_alert))
        // Crew duty and rest
        .route("/crew/{id}/compliance", get(api::compliance))
        .route("/crew/{id}/duty", post(api::update_duty))
        .route("/crew/{id}/rest/start", post(api::start_rest))
        .route("/crew/{id}/rest/end", post(api::end_rest))
        // Flights and backup plans
        .route("/flights/{id}/details", get(api::flight_details))
        .route(
            "/flights/{id}/backups",
            get(api::list_backups).post(api::create_backup),
        )
        .route("/flights/{id}/backups/suggest", get(api::suggest_backups))
        .route("/flights/{id}/backups/activate", post(api::activate_backup))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            warn!(origin, error = %e, "invalid CORS origin, falling back to permissive");
            CorsLayer::permissive()
        }
    }
}
