use neuroview_model::PredictionResult;
use serde::Serialize;

use crate::repository::ImageRecord;

pub mod auto;
pub mod form;
pub mod health;
pub mod images;
pub mod model_info;
pub mod predict;

/// Success body shared by every route: `{message, success, data, ...}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub message: &'static str,
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<PredictionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_image: Option<ImageRecord>,
}

impl<T> Envelope<T> {
    pub fn new(message: &'static str, data: T) -> Self {
        Self {
            message,
            success: true,
            data,
            count: None,
            warning: None,
            prediction: None,
            prediction_error: None,
            updated_image: None,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_warning(mut self, warning: &'static str) -> Self {
        self.warning = Some(warning);
        self
    }
}
