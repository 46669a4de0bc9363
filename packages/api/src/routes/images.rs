use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub mod create_image;
pub mod get_image;
pub mod list_images;
pub mod upload_image;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_images::list_images).post(create_image::create_image),
        )
        .route("/upload", post(upload_image::upload_image))
        .route("/{image_id}", get(get_image::get_image))
}
