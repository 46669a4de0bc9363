use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: &'static str,
    pub success: bool,
    pub status: &'static str,
}

#[tracing::instrument(name = "GET /health")]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "NeuroView Backend API is running",
        success: true,
        status: "healthy",
    })
}
