//! Model parameter bundle
//!
//! The bundle is read once from disk, validated, and then only ever shared
//! read-only. Two on-disk encodings are understood, picked by file extension:
//! JSON (`.json`) and MessagePack (`.msgpack` / `.mpk`). Both carry the same
//! layout:
//!
//! ```json
//! { "W1": [[..]], "b1": [..], "W2": [[..]], "b2": [..], "W3": [[..]], "b3": [..],
//!   "scaler": { "mean": [..], "scale": [..] } }
//! ```

use crate::error::{ModelLoadError, PreprocessError};
use crate::labels::TumorClass;
use crate::preprocess::INPUT_LEN;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-feature standardization: `(raw - mean) / scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct Scaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl Scaler {
    /// Zero entries in `scale` belong to constant features and are replaced by 1.0.
    pub fn new(mean: Array1<f64>, scale: Array1<f64>) -> Result<Self, ModelLoadError> {
        if mean.len() != scale.len() {
            return Err(ModelLoadError::Shape(format!(
                "scaler mean has {} entries but scale has {}",
                mean.len(),
                scale.len()
            )));
        }
        if !mean.iter().chain(scale.iter()).all(|v| v.is_finite()) {
            return Err(ModelLoadError::Shape(
                "scaler contains NaN or infinite values".to_string(),
            ));
        }
        let scale = scale.mapv(|s| if s == 0.0 { 1.0 } else { s });
        Ok(Self { mean, scale })
    }

    pub fn identity(len: usize) -> Self {
        Self {
            mean: Array1::zeros(len),
            scale: Array1::ones(len),
        }
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    pub fn scale(&self) -> ArrayView1<'_, f64> {
        self.scale.view()
    }

    /// Scales one flattened sample into a single-row matrix.
    pub fn transform(&self, raw: &[f32]) -> Result<Array2<f64>, PreprocessError> {
        if raw.len() != self.len() {
            return Err(PreprocessError::ScalerMismatch {
                expected: self.len(),
                actual: raw.len(),
            });
        }
        let scaled = raw
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(&x, (&m, &s))| (f64::from(x) - m) / s)
            .collect::<Vec<_>>();
        Ok(Array1::from(scaled).insert_axis(ndarray::Axis(0)))
    }
}

/// Immutable weights, biases and scaler of the three-layer classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParameters {
    pub(crate) w1: Array2<f64>,
    pub(crate) b1: Array1<f64>,
    pub(crate) w2: Array2<f64>,
    pub(crate) b2: Array1<f64>,
    pub(crate) w3: Array2<f64>,
    pub(crate) b3: Array1<f64>,
    pub(crate) scaler: Scaler,
}

impl ModelParameters {
    /// Builds a bundle, checking that every layer chains into the next and that
    /// the input and output widths match the feature vector and the label set.
    pub fn new(
        w1: Array2<f64>,
        b1: Array1<f64>,
        w2: Array2<f64>,
        b2: Array1<f64>,
        w3: Array2<f64>,
        b3: Array1<f64>,
        scaler: Scaler,
    ) -> Result<Self, ModelLoadError> {
        if w1.nrows() != INPUT_LEN {
            return Err(ModelLoadError::Shape(format!(
                "W1 expects {} inputs but images produce {INPUT_LEN} features",
                w1.nrows()
            )));
        }
        if scaler.len() != INPUT_LEN {
            return Err(ModelLoadError::Shape(format!(
                "scaler covers {} features but images produce {INPUT_LEN}",
                scaler.len()
            )));
        }
        check_layer("layer 1", &w1, &b1)?;
        check_link("W1", &w1, "W2", &w2)?;
        check_layer("layer 2", &w2, &b2)?;
        check_link("W2", &w2, "W3", &w3)?;
        check_layer("layer 3", &w3, &b3)?;
        if w3.ncols() != TumorClass::COUNT {
            return Err(ModelLoadError::Shape(format!(
                "W3 produces {} outputs but {} labels are defined",
                w3.ncols(),
                TumorClass::COUNT
            )));
        }

        let finite = [&w1, &w2, &w3].iter().all(|w| w.iter().all(|v| v.is_finite()))
            && [&b1, &b2, &b3].iter().all(|b| b.iter().all(|v| v.is_finite()));
        if !finite {
            return Err(ModelLoadError::Shape(
                "parameters contain NaN or infinite values".to_string(),
            ));
        }

        Ok(Self {
            w1,
            b1,
            w2,
            b2,
            w3,
            b3,
            scaler,
        })
    }

    /// Reads and validates the bundle at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ModelLoadError::NotFound(path.to_path_buf())
            } else {
                ModelLoadError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let artifact: ModelArtifact = match extension.as_str() {
            "json" => serde_json::from_slice(&bytes).map_err(|e| ModelLoadError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?,
            "msgpack" | "mpk" => {
                rmp_serde::from_slice(&bytes).map_err(|e| ModelLoadError::Parse {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?
            }
            other => return Err(ModelLoadError::UnsupportedFormat(other.to_string())),
        };

        let params = artifact.into_parameters()?;
        tracing::info!(
            path = %path.display(),
            layers = ?params.layer_shapes(),
            "Model loaded"
        );
        Ok(params)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ModelLoadError> {
        let artifact: ModelArtifact =
            serde_json::from_slice(bytes).map_err(|e| ModelLoadError::Parse {
                path: Default::default(),
                reason: e.to_string(),
            })?;
        artifact.into_parameters()
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ModelLoadError> {
        let path = path.as_ref();
        let bytes = serde_json::to_vec(&ModelArtifact::from(self)).map_err(|e| {
            ModelLoadError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        std::fs::write(path, bytes).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, ModelLoadError> {
        rmp_serde::to_vec_named(&ModelArtifact::from(self)).map_err(|e| ModelLoadError::Parse {
            path: Default::default(),
            reason: e.to_string(),
        })
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    /// `(rows, cols)` of W1, W2 and W3.
    pub fn layer_shapes(&self) -> [(usize, usize); 3] {
        [self.w1.dim(), self.w2.dim(), self.w3.dim()]
    }
}

fn check_layer(layer: &str, w: &Array2<f64>, b: &Array1<f64>) -> Result<(), ModelLoadError> {
    if w.is_empty() {
        return Err(ModelLoadError::Shape(format!("{layer} has no weights")));
    }
    if b.len() != w.ncols() {
        return Err(ModelLoadError::Shape(format!(
            "{layer} bias has {} entries but weights have {} columns",
            b.len(),
            w.ncols()
        )));
    }
    Ok(())
}

fn check_link(
    lhs: &str,
    lhs_w: &Array2<f64>,
    rhs: &str,
    rhs_w: &Array2<f64>,
) -> Result<(), ModelLoadError> {
    if lhs_w.ncols() != rhs_w.nrows() {
        return Err(ModelLoadError::Shape(format!(
            "{lhs} has {} columns but {rhs} has {} rows",
            lhs_w.ncols(),
            rhs_w.nrows()
        )));
    }
    Ok(())
}

// ============================================================================
// On-disk layout
// ============================================================================

#[derive(Serialize, Deserialize)]
struct ModelArtifact {
    #[serde(rename = "W1")]
    w1: Vec<Vec<f64>>,
    b1: BiasArtifact,
    #[serde(rename = "W2")]
    w2: Vec<Vec<f64>>,
    b2: BiasArtifact,
    #[serde(rename = "W3")]
    w3: Vec<Vec<f64>>,
    b3: BiasArtifact,
    #[serde(default)]
    scaler: ScalerArtifact,
}

/// Biases saved straight from training keep their `(1, n)` row shape.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum BiasArtifact {
    Vector(Vec<f64>),
    Row(Vec<Vec<f64>>),
}

#[derive(Serialize, Deserialize, Default)]
struct ScalerArtifact {
    #[serde(default)]
    mean: Option<Vec<f64>>,
    #[serde(default)]
    scale: Option<Vec<f64>>,
}

impl ModelArtifact {
    fn into_parameters(self) -> Result<ModelParameters, ModelLoadError> {
        let w1 = matrix("W1", self.w1)?;
        let w2 = matrix("W2", self.w2)?;
        let w3 = matrix("W3", self.w3)?;
        let b1 = self.b1.into_vector("b1")?;
        let b2 = self.b2.into_vector("b2")?;
        let b3 = self.b3.into_vector("b3")?;

        let n = w1.nrows();
        let mean = self.scaler.mean.map(Array1::from).unwrap_or_else(|| Array1::zeros(n));
        let scale = self.scaler.scale.map(Array1::from).unwrap_or_else(|| Array1::ones(n));
        let scaler = Scaler::new(mean, scale)?;

        ModelParameters::new(w1, b1, w2, b2, w3, b3, scaler)
    }
}

impl From<&ModelParameters> for ModelArtifact {
    fn from(params: &ModelParameters) -> Self {
        let rows = |w: &Array2<f64>| -> Vec<Vec<f64>> {
            w.rows().into_iter().map(|r| r.to_vec()).collect()
        };
        Self {
            w1: rows(&params.w1),
            b1: BiasArtifact::Vector(params.b1.to_vec()),
            w2: rows(&params.w2),
            b2: BiasArtifact::Vector(params.b2.to_vec()),
            w3: rows(&params.w3),
            b3: BiasArtifact::Vector(params.b3.to_vec()),
            scaler: ScalerArtifact {
                mean: Some(params.scaler.mean.to_vec()),
                scale: Some(params.scaler.scale.to_vec()),
            },
        }
    }
}

impl BiasArtifact {
    fn into_vector(self, name: &str) -> Result<Array1<f64>, ModelLoadError> {
        match self {
            BiasArtifact::Vector(v) => Ok(Array1::from(v)),
            BiasArtifact::Row(mut rows) if rows.len() == 1 => Ok(Array1::from(rows.remove(0))),
            BiasArtifact::Row(rows) => Err(ModelLoadError::Shape(format!(
                "{name} must be a vector or a single row, got {} rows",
                rows.len()
            ))),
        }
    }
}

fn matrix(name: &str, rows: Vec<Vec<f64>>) -> Result<Array2<f64>, ModelLoadError> {
    let n_rows = rows.len();
    let n_cols = rows.first().map(Vec::len).unwrap_or(0);
    if n_rows == 0 || n_cols == 0 {
        return Err(ModelLoadError::Shape(format!("{name} is empty")));
    }
    if let Some(bad) = rows.iter().position(|r| r.len() != n_cols) {
        return Err(ModelLoadError::Shape(format!(
            "{name} row {bad} has {} columns, expected {n_cols}",
            rows[bad].len()
        )));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| ModelLoadError::Shape(format!("{name}: {e}")))
}
