use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::post,
};
use bytes::Bytes;
use neuroview_model::PredictionResult;

use super::{
    Envelope,
    form::{Form, read_form},
};
use crate::{error::ApiError, repository::ImageRecord, state::AppState, state::State as Inner};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(predict))
}

#[tracing::instrument(name = "POST /predict", skip(state, multipart))]
pub async fn predict(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Envelope<PredictionResult>>, ApiError> {
    let form = read_form(multipart).await?;
    predict_form(&state, form).await.map(Json)
}

/// Validates the `file` part and classifies it, persisting the result when an
/// `image_id` field is present.
pub(crate) async fn predict_form(
    state: &Inner,
    form: Form,
) -> Result<Envelope<PredictionResult>, ApiError> {
    let image_id = form.field("image_id").map(str::to_string);
    let file = form
        .file
        .ok_or_else(|| ApiError::bad_request("No file provided"))?;
    if file.filename.is_empty() {
        return Err(ApiError::bad_request("No file selected"));
    }

    match image_id {
        None => {
            let result = classify(state, file.data).await?;
            Ok(Envelope::new(
                "Brain tumor prediction completed successfully",
                result,
            ))
        }
        Some(id) => {
            let (result, updated) = classify_and_save(state, file.data, &id).await?;
            Ok(match updated {
                Some(record) => {
                    let mut envelope = Envelope::new(
                        "Brain tumor prediction completed and saved successfully",
                        result,
                    );
                    envelope.updated_image = Some(record);
                    envelope
                }
                None => Envelope::new(
                    "Brain tumor prediction completed but failed to save to database",
                    result,
                )
                .with_warning("Prediction results could not be saved to database"),
            })
        }
    }
}

/// Runs the classifier off the reactor. An unsuccessful result becomes a 500
/// carrying the result's error text.
pub(crate) async fn classify(state: &Inner, data: Bytes) -> Result<PredictionResult, ApiError> {
    if data.is_empty() {
        return Err(ApiError::bad_request("Image data is required"));
    }

    let result = state.classifier.predict_blocking(data.to_vec()).await;
    if result.success {
        Ok(result)
    } else {
        Err(ApiError::failed(result.error_message()))
    }
}

/// [`classify`] followed by writing the result into the record's `information`.
/// A failed write is not an error; the updated record is simply absent.
pub(crate) async fn classify_and_save(
    state: &Inner,
    data: Bytes,
    image_id: &str,
) -> Result<(PredictionResult, Option<ImageRecord>), ApiError> {
    let result = classify(state, data).await?;
    let updated = save_prediction(state, image_id, &result).await;
    Ok((result, updated))
}

async fn save_prediction(
    state: &Inner,
    image_id: &str,
    result: &PredictionResult,
) -> Option<ImageRecord> {
    let information = match serde_json::to_value(result) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(image_id, error = %e, "Failed to serialize prediction");
            return None;
        }
    };

    match state.images.update_information(image_id, &information).await {
        Ok(Some(record)) => Some(record),
        Ok(None) => {
            tracing::warn!(image_id, "No image matched when saving prediction");
            None
        }
        Err(e) => {
            tracing::error!(image_id, error = %e, "Failed to save prediction");
            None
        }
    }
}
