use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};

use crate::{
    error::ApiError,
    repository::ImageRecord,
    routes::{
        Envelope,
        form::{Form, read_form},
        predict::classify_and_save,
    },
    state::AppState,
    state::State as Inner,
    upload,
};

#[tracing::instrument(name = "POST /images/upload", skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Envelope<ImageRecord>>), ApiError> {
    let form = read_form(multipart).await?;
    let envelope = upload_form(&state, form).await?;
    Ok((StatusCode::CREATED, Json(envelope)))
}

/// Stores the file, registers it, then classifies it and saves the result.
///
/// Once the record exists the request succeeds; a failed prediction is reported
/// in `prediction_error` instead of failing the upload.
pub(crate) async fn upload_form(
    state: &Inner,
    form: Form,
) -> Result<Envelope<ImageRecord>, ApiError> {
    let name = form.field("name").map(str::to_string);
    let file = form
        .file
        .ok_or_else(|| ApiError::bad_request("No file provided"))?;

    let record = upload::upload_image(state, &file, name.as_deref()).await?;

    let Some(image_id) = record.id.clone() else {
        return Ok(Envelope::new(
            "Image uploaded successfully, but no image ID returned",
            record,
        )
        .with_warning("Could not run prediction without image ID"));
    };

    match classify_and_save(state, file.data, &image_id).await {
        Ok((prediction, updated)) => {
            let mut envelope = Envelope::new(
                "Image uploaded, analyzed, and prediction saved successfully",
                record,
            );
            if updated.is_none() {
                envelope = envelope.with_warning("Prediction results could not be saved to database");
            }
            envelope.prediction = Some(prediction);
            envelope.updated_image = updated;
            Ok(envelope)
        }
        Err(e) => {
            tracing::warn!(image_id, error = %e, "Prediction failed after upload");
            let mut envelope = Envelope::new(
                "Image uploaded successfully, but prediction failed",
                record,
            );
            envelope.prediction_error = Some(e.message().to_string());
            Ok(envelope)
        }
    }
}
