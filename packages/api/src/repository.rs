//! Collaborator traits for the catalog and the file store.
//!
//! Handlers only see these traits; [`crate::supabase`] provides the production
//! implementations.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Supabase API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

/// One row of the `images` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    #[serde(
        default,
        deserialize_with = "id_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub information: Option<Value>,
    /// Columns this service does not interpret, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accepts both uuid and integer primary keys.
fn id_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl ImageRecord {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            url: url.into(),
            uploaded_at: None,
            information: None,
            extra: Map::new(),
        }
    }
}

#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn create_image(&self, name: &str, url: &str) -> GatewayResult<ImageRecord>;

    /// Newest first.
    async fn list_images(&self) -> GatewayResult<Vec<ImageRecord>>;

    async fn get_image(&self, id: &str) -> GatewayResult<Option<ImageRecord>>;

    /// Replaces the `information` column; `None` when no row matched.
    async fn update_information(
        &self,
        id: &str,
        information: &Value,
    ) -> GatewayResult<Option<ImageRecord>>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `data` under `object` and returns its public URL.
    async fn upload(&self, object: &str, content_type: &str, data: Bytes) -> GatewayResult<String>;

    async fn delete(&self, object: &str) -> GatewayResult<()>;
}
