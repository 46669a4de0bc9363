//! Single endpoint that picks an operation from the method, query and body type.

use axum::{
    Json, Router,
    extract::{FromRequest, Multipart, Query, Request, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;

use super::{
    form::read_form,
    health, images,
    predict::predict_form,
};
use crate::{error::ApiError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(auto_get).post(auto_post))
}

#[derive(Debug, Default, Deserialize)]
pub struct AutoParams {
    pub action: Option<String>,
    pub id: Option<String>,
}

impl AutoParams {
    fn action(&self) -> Option<&str> {
        self.action.as_deref().filter(|a| !a.is_empty())
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// `?action=health`, `?action=model-info`, `?id=<id>`, otherwise the full list.
#[tracing::instrument(name = "GET /auto", skip(state))]
pub async fn auto_get(
    State(state): State<AppState>,
    Query(params): Query<AutoParams>,
) -> Result<Response, ApiError> {
    Ok(match (params.action(), params.id()) {
        (Some("health"), _) => health::health().await.into_response(),
        (Some("model-info"), _) => super::model_info::model_info(State(state))
            .await
            .into_response(),
        (_, Some(id)) => Json(images::get_image::fetch_one(&state, id).await?).into_response(),
        _ => Json(images::list_images::fetch_all(&state).await).into_response(),
    })
}

/// Multipart with a file uploads it (or only predicts with `?action=predict`);
/// a non-empty JSON body creates a record.
#[tracing::instrument(name = "POST /auto", skip(state, request))]
pub async fn auto_post(
    State(state): State<AppState>,
    Query(params): Query<AutoParams>,
    request: Request,
) -> Result<Response, ApiError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase())
        .unwrap_or_default();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        let form = read_form(multipart).await?;
        if !form.has_file() {
            return Ok(invalid_post());
        }

        return if params.action() == Some("predict") {
            Ok(Json(predict_form(&state, form).await?).into_response())
        } else {
            let envelope = images::upload_image::upload_form(&state, form).await?;
            Ok((StatusCode::CREATED, Json(envelope)).into_response())
        };
    }

    if content_type.starts_with("application/json") {
        let body = Bytes::from_request(request, &state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        if images::create_image::has_content(&body) {
            let envelope = images::create_image::create_from_body(&state, &body).await?;
            return Ok((StatusCode::CREATED, Json(envelope)).into_response());
        }
    }

    Ok(invalid_post())
}

fn invalid_post() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "Invalid POST request. Expected either file upload (multipart/form-data with file) or JSON data (name/url)",
            "success": false,
            "examples": {
                "file_upload": "Send multipart/form-data with \"file\" field",
                "create_image": "Send JSON with {\"name\": \"...\", \"url\": \"...\"}"
            }
        })),
    )
        .into_response()
}
