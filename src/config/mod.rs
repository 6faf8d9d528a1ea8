mod types;

pub use types::*;

use crate::{Error, Result};
use std::env;
use tracing::debug;

pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

    debug!("Loading configuration from: {}", config_path);

    let config_str = tokio::fs::read_to_string(&config_path).await?;
    parse(&config_str)
}

pub fn parse(config_str: &str) -> Result<Config> {
    let config: Config = serde_yaml::from_str(config_str)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let inference = &self.inference;

        reqwest::Url::parse(&inference.base_url).map_err(|e| {
            Error::config(format!(
                "Invalid inference base_url '{}': {}",
                inference.base_url, e
            ))
        })?;

        if inference.max_attempts == 0 {
            return Err(Error::config("inference.max_attempts must be at least 1"));
        }
        if inference.initial_backoff_ms > inference.max_backoff_ms {
            return Err(Error::config(
                "inference.initial_backoff_ms must not exceed inference.max_backoff_ms",
            ));
        }
        if inference.max_payload_bytes == 0 || self.tryon.max_upload_bytes == 0 {
            return Err(Error::config("payload limits must be greater than zero"));
        }

        for (name, value) in [
            ("tryon.default_threshold", self.tryon.default_threshold),
            ("tryon.default_opacity", self.tryon.default_opacity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}
