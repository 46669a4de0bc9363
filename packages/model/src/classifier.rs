use crate::engine;
use crate::error::{InferenceError, ModelLoadError, PredictionError};
use crate::labels::TumorClass;
use crate::prediction::PredictionResult;
use crate::preprocess::{self, INPUT_SIDE};
use crate::store::ModelParameters;
use image::DynamicImage;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Handle to the loaded model. Cloning is cheap; all clones share one bundle.
#[derive(Debug, Clone)]
pub struct Classifier {
    params: Arc<ModelParameters>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerInfo {
    pub name: &'static str,
    pub inputs: usize,
    pub outputs: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub loaded: bool,
    pub model_type: &'static str,
    pub input_shape: String,
    pub output_classes: usize,
    pub class_labels: Vec<&'static str>,
    pub description: &'static str,
    pub layers: Vec<LayerInfo>,
}

impl Classifier {
    pub fn new(params: ModelParameters) -> Self {
        Self {
            params: Arc::new(params),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        Ok(Self::new(ModelParameters::load(path)?))
    }

    /// Raw class probabilities for an already decoded image.
    pub fn probabilities(&self, img: &DynamicImage) -> Result<Vec<f64>, PredictionError> {
        let features = preprocess::preprocess(img, self.params.scaler())?;
        Ok(engine::forward(&self.params, &features)?)
    }

    /// Decodes `bytes` and classifies the image. Never panics on bad input.
    pub fn predict_bytes(&self, bytes: &[u8]) -> PredictionResult {
        let started = Instant::now();
        let outcome = preprocess::decode(bytes)
            .map_err(PredictionError::from)
            .and_then(|img| self.probabilities(&img));
        let result = self.record(PredictionResult::from_outcome(outcome));
        metrics::histogram!("prediction_duration_seconds").record(started.elapsed().as_secs_f64());
        result
    }

    /// Runs [`Self::predict_bytes`] on the blocking pool.
    pub async fn predict_blocking(&self, bytes: Vec<u8>) -> PredictionResult {
        let classifier = self.clone();
        match tokio::task::spawn_blocking(move || classifier.predict_bytes(&bytes)).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Prediction task did not complete");
                self.record(PredictionResult::failure(InferenceError::Task(e.to_string())))
            }
        }
    }

    pub fn info(&self) -> ModelInfo {
        let names = ["hidden_1", "hidden_2", "output"];
        let layers = names
            .into_iter()
            .zip(self.params.layer_shapes())
            .map(|(name, (inputs, outputs))| LayerInfo {
                name,
                inputs,
                outputs,
            })
            .collect();

        ModelInfo {
            loaded: true,
            model_type: "Neural Network",
            input_shape: format!("{INPUT_SIDE}x{INPUT_SIDE} grayscale"),
            output_classes: TumorClass::COUNT,
            class_labels: TumorClass::ALL.iter().map(|c| c.as_str()).collect(),
            description: "Brain tumor classification model trained on medical imaging data",
            layers,
        }
    }

    fn record(&self, result: PredictionResult) -> PredictionResult {
        if result.success {
            metrics::counter!("predictions_total", "outcome" => "success").increment(1);
            tracing::debug!(
                tumor_type = ?result.tumor_type,
                confidence = result.confidence,
                "Prediction completed"
            );
        } else {
            metrics::counter!("predictions_total", "outcome" => "failure").increment(1);
            tracing::warn!(error = result.error_message(), "Prediction failed");
        }
        result
    }
}
