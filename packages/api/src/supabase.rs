//! Supabase-backed collaborators: PostgREST for the catalog, Storage for files.

use crate::config::SupabaseConfig;
use crate::repository::{GatewayError, GatewayResult};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

pub mod rest;
pub mod storage;

pub use rest::SupabaseImageRepository;
pub use storage::SupabaseStorage;

/// `apikey` and bearer headers every Supabase call needs.
fn auth_headers(config: &SupabaseConfig) -> GatewayResult<HeaderMap> {
    let key = HeaderValue::from_str(&config.anon_key)
        .map_err(|e| GatewayError::Config(format!("SUPABASE_ANON_KEY: {e}")))?;
    let bearer = HeaderValue::from_str(&format!("Bearer {}", config.anon_key))
        .map_err(|e| GatewayError::Config(format!("SUPABASE_ANON_KEY: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert("apikey", key);
    headers.insert(AUTHORIZATION, bearer);
    Ok(headers)
}

fn client(config: &SupabaseConfig, headers: HeaderMap) -> GatewayResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .build()?)
}

/// Turns a non-2xx response into [`GatewayError::Status`] with the body for context.
async fn ensure_success(response: reqwest::Response) -> GatewayResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Status {
        status: status.as_u16(),
        body,
    })
}
