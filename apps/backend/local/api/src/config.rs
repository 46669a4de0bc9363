use neuroview_api::{
    DEFAULT_MAX_UPLOAD_BYTES,
    config::{ConfigError, SupabaseConfig},
};
use std::{env, path::PathBuf};

const DEFAULT_PORT: u16 = 5001;
const DEFAULT_MODEL_PATH: &str = "ml_models/best_brain_nn_model.json";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub model_path: PathBuf,
    pub max_upload_bytes: usize,
    pub supabase: SupabaseConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            port: parse_var("PORT")?.unwrap_or(DEFAULT_PORT),
            model_path: env::var("MODEL_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES")?.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            supabase: SupabaseConfig::from_env()?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        _ => Ok(None),
    }
}
