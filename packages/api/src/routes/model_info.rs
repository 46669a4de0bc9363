use axum::{Json, Router, extract::State, routing::get};
use neuroview_model::ModelInfo;

use super::Envelope;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(model_info))
}

#[tracing::instrument(name = "GET /model-info", skip(state))]
pub async fn model_info(State(state): State<AppState>) -> Json<Envelope<ModelInfo>> {
    Json(Envelope::new(
        "Model information retrieved successfully",
        state.classifier.info(),
    ))
}
