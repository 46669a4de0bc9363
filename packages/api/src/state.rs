use neuroview_model::Classifier;
use std::sync::Arc;

use crate::config::SupabaseConfig;
use crate::repository::{GatewayResult, ImageRepository, ObjectStorage};
use crate::supabase::{SupabaseImageRepository, SupabaseStorage};

pub type AppState = Arc<State>;

pub struct State {
    /// Loaded once at startup; clones share the same weights.
    pub classifier: Classifier,
    pub images: Arc<dyn ImageRepository>,
    pub storage: Arc<dyn ObjectStorage>,
}

impl State {
    pub fn new(
        classifier: Classifier,
        images: Arc<dyn ImageRepository>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        Self {
            classifier,
            images,
            storage,
        }
    }

    pub fn from_supabase(classifier: Classifier, config: &SupabaseConfig) -> GatewayResult<Self> {
        tracing::info!(url = %config.url, bucket = %config.bucket, "Connecting to Supabase");
        Ok(Self::new(
            classifier,
            Arc::new(SupabaseImageRepository::new(config)?),
            Arc::new(SupabaseStorage::new(config)?),
        ))
    }
}
