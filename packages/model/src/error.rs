use std::path::PathBuf;

/// Failure to bring the model up. The service must not start when this happens.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("Model file not found at {0}")]
    NotFound(PathBuf),

    #[error("Failed to read model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid model: {0}")]
    Shape(String),
}

/// The input image could not be turned into a feature vector.
#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("Image data is empty")]
    Empty,

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Scaler expects {expected} features but image produced {actual}")]
    ScalerMismatch { expected: usize, actual: usize },
}

/// Shape or numeric failure inside the forward pass.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("{layer}: cannot multiply {lhs_rows}x{lhs_cols} by {rhs_rows}x{rhs_cols}")]
    MatMul {
        layer: &'static str,
        lhs_rows: usize,
        lhs_cols: usize,
        rhs_rows: usize,
        rhs_cols: usize,
    },

    #[error("{layer}: bias has {bias} entries but layer produces {units}")]
    Bias {
        layer: &'static str,
        bias: usize,
        units: usize,
    },

    #[error("Model produced {actual} outputs but {expected} labels are defined")]
    OutputWidth { expected: usize, actual: usize },

    #[error("Expected a single feature row but got {actual}")]
    SampleCount { actual: usize },

    #[error("Model produced non-finite probabilities")]
    NonFinite,

    #[error("Inference task failed: {0}")]
    Task(String),
}

/// Any per-request failure on the prediction path.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}
