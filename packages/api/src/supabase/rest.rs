use super::{auth_headers, client, ensure_success};
use crate::config::SupabaseConfig;
use crate::repository::{GatewayError, GatewayResult, ImageRecord, ImageRepository};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde_json::{Value, json};

const TABLE: &str = "images";

/// `images` table over PostgREST.
pub struct SupabaseImageRepository {
    client: reqwest::Client,
    table_url: String,
}

impl SupabaseImageRepository {
    pub fn new(config: &SupabaseConfig) -> GatewayResult<Self> {
        let mut headers = auth_headers(config)?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        Ok(Self {
            client: client(config, headers)?,
            table_url: format!("{}/{TABLE}", config.rest_url()),
        })
    }
}

/// PostgREST answers writes with an array of affected rows.
fn first_record(value: Value) -> GatewayResult<Option<ImageRecord>> {
    let row = match value {
        Value::Array(rows) if rows.is_empty() => return Ok(None),
        Value::Array(mut rows) => rows.swap_remove(0),
        Value::Null => return Ok(None),
        other => other,
    };
    serde_json::from_value(row)
        .map(Some)
        .map_err(|e| GatewayError::Decode(e.to_string()))
}

#[async_trait]
impl ImageRepository for SupabaseImageRepository {
    #[tracing::instrument(name = "supabase.create_image", skip(self))]
    async fn create_image(&self, name: &str, url: &str) -> GatewayResult<ImageRecord> {
        let response = self
            .client
            .post(&self.table_url)
            .json(&json!({ "name": name, "url": url }))
            .send()
            .await?;
        let body: Value = ensure_success(response).await?.json().await?;
        first_record(body)?
            .ok_or_else(|| GatewayError::Decode("insert returned no rows".to_string()))
    }

    #[tracing::instrument(name = "supabase.list_images", skip(self))]
    async fn list_images(&self) -> GatewayResult<Vec<ImageRecord>> {
        let response = self
            .client
            .get(&self.table_url)
            .query(&[("select", "*"), ("order", "uploaded_at.desc")])
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    #[tracing::instrument(name = "supabase.get_image", skip(self))]
    async fn get_image(&self, id: &str) -> GatewayResult<Option<ImageRecord>> {
        let response = self
            .client
            .get(&self.table_url)
            .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))])
            .send()
            .await?;
        let body: Value = ensure_success(response).await?.json().await?;
        first_record(body)
    }

    #[tracing::instrument(name = "supabase.update_information", skip(self, information))]
    async fn update_information(
        &self,
        id: &str,
        information: &Value,
    ) -> GatewayResult<Option<ImageRecord>> {
        let response = self
            .client
            .patch(&self.table_url)
            .query(&[("id", format!("eq.{id}"))])
            .json(&json!({ "information": information }))
            .send()
            .await?;
        let body: Value = ensure_success(response).await?.json().await?;
        first_record(body)
    }
}
