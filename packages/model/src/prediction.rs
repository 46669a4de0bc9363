use crate::error::PredictionError;
use crate::labels::TumorClass;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt::Display;

/// Probability per class, kept in output-column order.
///
/// Serializes as a JSON object whose keys follow that order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassProbabilities(Vec<(TumorClass, f64)>);

impl ClassProbabilities {
    pub fn get(&self, class: TumorClass) -> Option<f64> {
        self.0.iter().find(|(c, _)| *c == class).map(|(_, p)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TumorClass, f64)> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ClassProbabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (class, p) in &self.0 {
            map.serialize_entry(class.as_str(), p)?;
        }
        map.end()
    }
}

/// Outcome of one classification. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub success: bool,
    pub predicted_class: Option<usize>,
    pub tumor_type: Option<TumorClass>,
    pub confidence: f64,
    pub probabilities: Vec<f64>,
    pub class_probabilities: ClassProbabilities,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PredictionResult {
    /// Formats one probability row. A row that does not match the label set is
    /// reported as a failed prediction.
    pub fn from_probabilities(probabilities: Vec<f64>) -> Self {
        if probabilities.len() != TumorClass::COUNT {
            return Self::failure(format!(
                "model produced {} probabilities for {} labels",
                probabilities.len(),
                TumorClass::COUNT
            ));
        }
        let Some(index) = argmax(&probabilities) else {
            return Self::failure("model produced no usable probabilities");
        };
        let Some(tumor_type) = TumorClass::from_index(index) else {
            return Self::failure(format!("no label for class index {index}"));
        };

        let confidence = probabilities[index];
        let class_probabilities = ClassProbabilities(
            TumorClass::ALL
                .iter()
                .copied()
                .zip(probabilities.iter().copied())
                .collect(),
        );

        Self {
            success: true,
            predicted_class: Some(index),
            tumor_type: Some(tumor_type),
            confidence,
            probabilities,
            class_probabilities,
            message: Some(format!(
                "Brain scan classified as: {tumor_type} (confidence: {:.2}%)",
                confidence * 100.0
            )),
            error: None,
        }
    }

    pub fn failure(reason: impl Display) -> Self {
        Self {
            success: false,
            predicted_class: None,
            tumor_type: None,
            confidence: 0.0,
            probabilities: Vec::new(),
            class_probabilities: ClassProbabilities::default(),
            message: None,
            error: Some(format!("Prediction failed: {reason}")),
        }
    }

    pub fn from_outcome(outcome: Result<Vec<f64>, PredictionError>) -> Self {
        match outcome {
            Ok(probabilities) => Self::from_probabilities(probabilities),
            Err(e) => Self::failure(e),
        }
    }

    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("Prediction failed")
    }
}

/// Index of the largest value; the first one wins on ties and NaN is never picked.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PreprocessError;

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax(&[0.1, 0.4, 0.4, 0.1]), Some(1));
        assert_eq!(argmax(&[0.25, 0.25, 0.25, 0.25]), Some(0));
        assert_eq!(argmax(&[f64::NAN, 0.2, 0.8]), Some(2));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn success_result_reports_top_class() {
        let result = PredictionResult::from_probabilities(vec![0.1, 0.2, 0.6, 0.1]);
        assert!(result.success);
        assert_eq!(result.predicted_class, Some(2));
        assert_eq!(result.tumor_type, Some(TumorClass::NoTumor));
        assert_eq!(result.confidence, 0.6);
        assert_eq!(result.class_probabilities.get(TumorClass::Glioma), Some(0.1));
        assert_eq!(
            result.message.as_deref(),
            Some("Brain scan classified as: notumor (confidence: 60.00%)")
        );
        assert!(result.error.is_none());
    }

    #[test]
    fn class_probabilities_serialize_in_label_order() {
        let result = PredictionResult::from_probabilities(vec![0.4, 0.3, 0.2, 0.1]);
        let json = serde_json::to_string(&result.class_probabilities).unwrap();
        assert_eq!(
            json,
            r#"{"glioma":0.4,"meningioma":0.3,"notumor":0.2,"pituitary":0.1}"#
        );
    }

    #[test]
    fn failure_has_zeroed_fields() {
        let result = PredictionResult::from_outcome(Err(PreprocessError::Empty.into()));
        assert!(!result.success);
        assert_eq!(result.predicted_class, None);
        assert_eq!(result.tumor_type, None);
        assert_eq!(result.confidence, 0.0);
        assert!(result.probabilities.is_empty());
        assert!(result.class_probabilities.is_empty());
        assert_eq!(
            result.error_message(),
            "Prediction failed: Image preprocessing failed: Image data is empty"
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["tumor_type"], serde_json::Value::Null);
        assert_eq!(json["class_probabilities"], serde_json::json!({}));
        assert!(json.get("message").is_none());
    }

    #[test]
    fn wrong_width_is_a_failure_not_a_panic() {
        let result = PredictionResult::from_probabilities(vec![0.5, 0.5]);
        assert!(!result.success);
        assert!(result.error_message().contains("2 probabilities for 4 labels"));
    }
}
