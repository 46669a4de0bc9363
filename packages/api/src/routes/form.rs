use axum::extract::Multipart;
use std::collections::HashMap;

use crate::{error::ApiError, upload::UploadedFile};

/// A drained multipart body: the `file` part plus every text field.
#[derive(Debug, Default)]
pub struct Form {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl Form {
    /// Text field value, `None` when missing or blank.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// True when a file part arrived with a non-empty filename.
    pub fn has_file(&self) -> bool {
        self.file.as_ref().is_some_and(|f| !f.filename.is_empty())
    }
}

pub async fn read_form(mut multipart: Multipart) -> Result<Form, ApiError> {
    let mut form = Form::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "file" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await?;
            form.file = Some(UploadedFile {
                filename,
                content_type,
                data,
            });
        } else {
            let value = field.text().await?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}
