//! HTTP surface of the server.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use quizzes_common::{AppError, AppResult};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Pool used for the health check.
    pub db: Arc<DatabaseConnection>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Reports healthy once the database answers a ping.
async fn health_check(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    state
        .db
        .ping()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(HealthResponse { status: "ok" }))
}

/// Build the router with tracing and CORS layers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}
