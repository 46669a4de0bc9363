#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use axum::{Router, routing::get};
use neuroview_api::{construct_router, state::State};
use neuroview_model::Classifier;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod metrics;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting NeuroView backend");

    let config = config::Config::from_env()?;

    let classifier = match Classifier::load(&config.model_path) {
        Ok(classifier) => classifier,
        Err(e) => {
            tracing::error!(path = %config.model_path.display(), error = %e, "Failed to load model");
            return Err(e.into());
        }
    };

    let prometheus = metrics::init_metrics()?;
    let state = Arc::new(State::from_supabase(classifier, &config.supabase)?);

    let app = Router::new()
        .merge(construct_router(state, config.max_upload_bytes))
        .route(
            "/metrics",
            get(move || {
                let prometheus = prometheus.clone();
                async move { prometheus.render() }
            }),
        );

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
