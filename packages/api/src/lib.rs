use axum::{Router, extract::DefaultBodyLimit, middleware::from_fn};
use state::AppState;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod middleware;
mod routes;

pub mod config;
pub mod error;
pub mod repository;
pub mod state;
pub mod supabase;
pub mod upload;

pub use axum;

/// Uploads up to this size are accepted unless configured otherwise.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

pub fn construct_router(state: AppState, max_upload_bytes: usize) -> Router {
    let router = Router::new()
        .nest("/health", routes::health::routes())
        .nest("/images", routes::images::routes())
        .nest("/predict", routes::predict::routes())
        .nest("/model-info", routes::model_info::routes())
        .nest("/auto", routes::auto::routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(from_fn(middleware::track_metrics))
                .layer(CorsLayer::permissive()),
        );

    Router::new().nest("/api", router)
}
