use std::env;
use std::time::Duration;

fn default_bucket() -> String {
    "brain-images".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Connection settings for the Supabase project backing the catalog.
#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    pub anon_key: String,
    /// Storage bucket that receives uploaded scans
    pub bucket: String,
    pub timeout: Duration,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            bucket: default_bucket(),
            timeout: Duration::from_secs(default_timeout_secs()),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("SUPABASE_URL").map_err(|_| ConfigError::MissingVar("SUPABASE_URL"))?;
        let anon_key = env::var("SUPABASE_ANON_KEY")
            .map_err(|_| ConfigError::MissingVar("SUPABASE_ANON_KEY"))?;
        if url.trim().is_empty() {
            return Err(ConfigError::InvalidValue("SUPABASE_URL".to_string()));
        }

        let mut config = Self::new(url.trim(), anon_key);
        if let Ok(bucket) = env::var("SUPABASE_BUCKET") {
            if !bucket.trim().is_empty() {
                config.bucket = bucket.trim().to_string();
            }
        }
        config.timeout = Duration::from_secs(
            env::var("SUPABASE_TIMEOUT_SECS")
                .ok()
                .map(|v| {
                    v.parse()
                        .map_err(|_| ConfigError::InvalidValue("SUPABASE_TIMEOUT_SECS".to_string()))
                })
                .transpose()?
                .unwrap_or_else(default_timeout_secs),
        );
        Ok(config)
    }

    /// PostgREST root, `<url>/rest/v1`
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.url)
    }

    /// Storage API root, `<url>/storage/v1`
    pub fn storage_url(&self) -> String {
        format!("{}/storage/v1", self.url)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid value for: {0}")]
    InvalidValue(String),
}
