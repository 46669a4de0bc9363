//! Feed-forward pass of the three-layer classifier.
//!
//! ```text
//! Z1 = X·W1 + b1 ; A1 = LeakyReLU(Z1)
//! Z2 = A1·W2 + b2 ; A2 = LeakyReLU(Z2)
//! Z3 = A2·W3 + b3 ; A3 = Softmax(Z3)
//! ```
//!
//! `ndarray::dot` panics on incompatible shapes, so every product is checked first.

use crate::error::InferenceError;
use crate::labels::TumorClass;
use crate::preprocess::FeatureVector;
use crate::store::ModelParameters;
use ndarray::{Array1, Array2, ArrayView2, Axis};

pub const LEAKY_RELU_ALPHA: f64 = 0.01;

pub fn leaky_relu(z: &mut Array2<f64>) {
    z.mapv_inplace(|x| if x > 0.0 { x } else { LEAKY_RELU_ALPHA * x });
}

/// Row-wise softmax, shifted by each row's maximum so `exp` cannot overflow.
pub fn softmax(z: &Array2<f64>) -> Array2<f64> {
    let mut out = z.clone();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let max = row.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    out
}

/// `x·w + b` with the bias broadcast over rows.
pub fn dense(
    layer: &'static str,
    x: ArrayView2<'_, f64>,
    w: &Array2<f64>,
    b: &Array1<f64>,
) -> Result<Array2<f64>, InferenceError> {
    if x.ncols() != w.nrows() {
        return Err(InferenceError::MatMul {
            layer,
            lhs_rows: x.nrows(),
            lhs_cols: x.ncols(),
            rhs_rows: w.nrows(),
            rhs_cols: w.ncols(),
        });
    }
    if b.len() != w.ncols() {
        return Err(InferenceError::Bias {
            layer,
            bias: b.len(),
            units: w.ncols(),
        });
    }
    Ok(x.dot(w) + b)
}

/// Class probabilities for every row of `x`.
pub fn forward_rows(
    params: &ModelParameters,
    x: ArrayView2<'_, f64>,
) -> Result<Array2<f64>, InferenceError> {
    let mut a1 = dense("layer 1", x, &params.w1, &params.b1)?;
    leaky_relu(&mut a1);
    let mut a2 = dense("layer 2", a1.view(), &params.w2, &params.b2)?;
    leaky_relu(&mut a2);
    let z3 = dense("layer 3", a2.view(), &params.w3, &params.b3)?;

    if z3.ncols() != TumorClass::COUNT {
        return Err(InferenceError::OutputWidth {
            expected: TumorClass::COUNT,
            actual: z3.ncols(),
        });
    }

    let probabilities = softmax(&z3);
    if probabilities.iter().any(|p| !p.is_finite()) {
        return Err(InferenceError::NonFinite);
    }
    Ok(probabilities)
}

/// Probabilities for a single sample, one entry per [`TumorClass`].
pub fn forward(
    params: &ModelParameters,
    features: &FeatureVector,
) -> Result<Vec<f64>, InferenceError> {
    let x = features.view();
    if x.nrows() != 1 {
        return Err(InferenceError::SampleCount { actual: x.nrows() });
    }
    let probabilities = forward_rows(params, x)?;
    Ok(probabilities.row(0).to_vec())
}
