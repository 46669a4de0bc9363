use axum::{Json, extract::State, http::StatusCode};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::ApiError, repository::ImageRecord, routes::Envelope, state::AppState,
    state::State as Inner,
};

pub const PLACEHOLDER_URL: &str = "https://via.placeholder.com/400x300?text=No+Image";

#[derive(Debug, Deserialize)]
pub struct CreateImageRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[tracing::instrument(name = "POST /images", skip(state, body))]
pub async fn create_image(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Envelope<ImageRecord>>), ApiError> {
    let envelope = create_from_body(&state, &body).await?;
    Ok((StatusCode::CREATED, Json(envelope)))
}

/// True for a body that carries something: not empty, `null`, `{}`, `[]` or `""`.
pub(crate) fn has_content(body: &[u8]) -> bool {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Null) => false,
        Ok(Value::Object(map)) => !map.is_empty(),
        Ok(Value::Array(items)) => !items.is_empty(),
        Ok(Value::String(s)) => !s.is_empty(),
        Ok(_) => true,
        Err(_) => !body.iter().all(u8::is_ascii_whitespace),
    }
}

pub(crate) async fn create_from_body(
    state: &Inner,
    body: &[u8],
) -> Result<Envelope<ImageRecord>, ApiError> {
    if !has_content(body) {
        return Err(ApiError::bad_request("Request body is required"));
    }
    let request: CreateImageRequest = serde_json::from_slice(body)?;

    let name = request.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(ApiError::bad_request("Image name is required"));
    }
    let url = request
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(PLACEHOLDER_URL);

    match state.images.create_image(name, url).await {
        Ok(record) => {
            tracing::info!(id = ?record.id, "Image created");
            Ok(Envelope::new("Image created successfully", record))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create image");
            Err(ApiError::failed("Failed to create image. Please try again."))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bodies_have_no_content() {
        assert!(!has_content(b""));
        assert!(!has_content(b"  \n"));
        assert!(!has_content(b"null"));
        assert!(!has_content(b"{}"));
        assert!(has_content(br#"{"name":"scan"}"#));
        assert!(has_content(b"{not json"));
    }
}
