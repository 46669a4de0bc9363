//! Storing an uploaded scan in the bucket and registering it in the catalog.

use bytes::Bytes;

use crate::{error::ApiError, repository::ImageRecord, state::State};

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A file part taken from a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .filter(|ct| !ct.is_empty())
            .unwrap_or(FALLBACK_CONTENT_TYPE)
    }
}

/// Lower-cased text after the last dot, empty when there is none.
pub fn extension(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

pub fn is_allowed(filename: &str) -> bool {
    ALLOWED_EXTENSIONS.contains(&extension(filename).as_str())
}

/// Reduces a client filename to `[A-Za-z0-9._-]`.
///
/// Path separators and whitespace runs become a single `_`, everything else outside
/// the set is dropped, and leading or trailing dots and underscores are trimmed so the
/// result can never walk out of the bucket prefix.
pub fn secure_filename(filename: &str) -> String {
    let spaced: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// `<uuid hex>-<sanitized name>`
pub fn object_name(secure_name: &str) -> String {
    format!("{}-{}", uuid::Uuid::new_v4().simple(), secure_name)
}

/// Uploads `file` and creates its catalog row.
///
/// When the row cannot be created the stored object is removed again; a failing
/// cleanup is only logged.
#[tracing::instrument(name = "upload_image", skip(state, file), fields(filename = %file.filename, bytes = file.data.len()))]
pub async fn upload_image(
    state: &State,
    file: &UploadedFile,
    name: Option<&str>,
) -> Result<ImageRecord, ApiError> {
    if file.filename.is_empty() {
        return Err(ApiError::bad_request("No file provided"));
    }
    if !is_allowed(&file.filename) {
        return Err(ApiError::bad_request(format!(
            "File type not allowed. Supported formats: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    let secure_name = secure_filename(&file.filename);
    let object = object_name(&secure_name);

    let public_url = state
        .storage
        .upload(&object, file.content_type(), file.data.clone())
        .await
        .map_err(|e| ApiError::failed(format!("Failed to upload file: {e}")))?;

    let image_name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(&secure_name);

    match state.images.create_image(image_name, &public_url).await {
        Ok(record) => {
            tracing::info!(object = %object, id = ?record.id, "Image uploaded");
            Ok(record)
        }
        Err(e) => {
            tracing::error!(object = %object, error = %e, "Failed to create image record");
            if let Err(cleanup) = state.storage.delete(&object).await {
                tracing::warn!(object = %object, error = %cleanup, "Failed to remove orphaned upload");
            }
            Err(ApiError::failed("Failed to create image record in database"))
        }
    }
}
