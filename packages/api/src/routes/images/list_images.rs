use axum::{Json, extract::State};

use crate::{repository::ImageRecord, routes::Envelope, state::AppState, state::State as Inner};

#[tracing::instrument(name = "GET /images", skip(state))]
pub async fn list_images(State(state): State<AppState>) -> Json<Envelope<Vec<ImageRecord>>> {
    Json(fetch_all(&state).await)
}

/// Catalog read failures are logged and answered with an empty list.
pub(crate) async fn fetch_all(state: &Inner) -> Envelope<Vec<ImageRecord>> {
    let images = match state.images.list_images().await {
        Ok(images) => images,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list images");
            Vec::new()
        }
    };
    let count = images.len();
    Envelope::new("Images retrieved successfully", images).with_count(count)
}
