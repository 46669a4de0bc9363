use super::{auth_headers, client, ensure_success};
use crate::config::SupabaseConfig;
use crate::repository::{GatewayResult, ObjectStorage};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;

/// One Supabase Storage bucket.
pub struct SupabaseStorage {
    client: reqwest::Client,
    storage_url: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(config: &SupabaseConfig) -> GatewayResult<Self> {
        Ok(Self {
            client: client(config, auth_headers(config)?)?,
            storage_url: config.storage_url(),
            bucket: config.bucket.clone(),
        })
    }

    fn object_url(&self, object: &str) -> String {
        format!("{}/object/{}/{}", self.storage_url, self.bucket, object)
    }

    pub fn public_url(&self, object: &str) -> String {
        format!("{}/object/public/{}/{}", self.storage_url, self.bucket, object)
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    #[tracing::instrument(name = "supabase.upload", skip(self, data), fields(bytes = data.len()))]
    async fn upload(&self, object: &str, content_type: &str, data: Bytes) -> GatewayResult<String> {
        let response = self
            .client
            .post(self.object_url(object))
            .header(CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(self.public_url(object))
    }

    #[tracing::instrument(name = "supabase.delete", skip(self))]
    async fn delete(&self, object: &str) -> GatewayResult<()> {
        let response = self.client.delete(self.object_url(object)).send().await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_and_public_urls() {
        let storage = SupabaseStorage::new(&SupabaseConfig::new("https://x.supabase.co", "k")).unwrap();
        assert_eq!(
            storage.object_url("abc-scan.png"),
            "https://x.supabase.co/storage/v1/object/brain-images/abc-scan.png"
        );
        assert_eq!(
            storage.public_url("abc-scan.png"),
            "https://x.supabase.co/storage/v1/object/public/brain-images/abc-scan.png"
        );
    }
}
