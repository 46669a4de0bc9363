//! NeuroView brain-scan classifier
//!
//! Everything needed to turn raw image bytes into a tumor classification:
//!
//! - [`store`] loads the immutable parameter bundle once at startup.
//! - [`preprocess`] turns a decoded image into the 1×1024 scaled feature row.
//! - [`engine`] runs the fixed three-layer feed-forward pass.
//! - [`prediction`] turns probabilities into a [`PredictionResult`].
//! - [`classifier`] ties the steps together behind one entry point.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use neuroview_model::{Classifier, ModelParameters};
//!
//! let params = ModelParameters::load("ml_models/best_brain_nn_model.json")?;
//! let classifier = Classifier::new(params);
//! let result = classifier.predict_bytes(&bytes);
//! ```

pub mod classifier;
pub mod engine;
pub mod error;
pub mod labels;
pub mod prediction;
pub mod preprocess;
pub mod store;

pub use classifier::{Classifier, ModelInfo};
pub use error::{InferenceError, ModelLoadError, PredictionError, PreprocessError};
pub use labels::TumorClass;
pub use prediction::{ClassProbabilities, PredictionResult};
pub use preprocess::{FeatureVector, INPUT_LEN, INPUT_SIDE};
pub use store::{ModelParameters, Scaler};
