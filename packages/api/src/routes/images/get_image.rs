use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    error::ApiError, repository::ImageRecord, routes::Envelope, state::AppState,
    state::State as Inner,
};

#[tracing::instrument(name = "GET /images/{image_id}", skip(state))]
pub async fn get_image(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
) -> Result<Json<Envelope<ImageRecord>>, ApiError> {
    fetch_one(&state, &image_id).await.map(Json)
}

pub(crate) async fn fetch_one(
    state: &Inner,
    image_id: &str,
) -> Result<Envelope<ImageRecord>, ApiError> {
    if image_id.trim().is_empty() {
        return Err(ApiError::bad_request("Image ID is required"));
    }

    let image = match state.images.get_image(image_id).await {
        Ok(image) => image,
        Err(e) => {
            tracing::error!(image_id, error = %e, "Failed to fetch image");
            None
        }
    };

    image
        .map(|image| Envelope::new("Image retrieved successfully", image))
        .ok_or_else(|| ApiError::not_found("Image not found"))
}
