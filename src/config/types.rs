use crate::designs::Design;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub inference: InferenceCallConfig,
    #[serde(default)]
    pub tryon: TryOnConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Process-wide settings for calls to the inference service. Built once at
/// startup and shared read-only by every pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceCallConfig {
    pub base_url: String,
    #[serde(default)]
    pub mode: InferenceMode,
    #[serde(default = "default_compose_path")]
    pub compose_path: String,
    #[serde(default = "default_mask_path")]
    pub mask_path: String,
    #[serde(default = "default_blend_path")]
    pub blend_path: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

/// Call shape used against the inference service.
///
/// `Direct` (one `compose` round trip, design resolved remotely) is the
/// versioned default. `Staged` (mask, then blend) stays selectable for
/// deployments running the two-endpoint service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceMode {
    #[default]
    Direct,
    Staged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TryOnConfig {
    #[serde(default = "default_threshold")]
    pub default_threshold: f64,
    #[serde(default = "default_opacity")]
    pub default_opacity: f64,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default)]
    pub range_policy: RangePolicy,
    #[serde(default)]
    pub output_format: OutputFormat,
}

/// What to do with a `threshold` or `opacity` outside `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePolicy {
    #[default]
    Reject,
    Clamp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_image_root")]
    pub image_root: String,
    #[serde(default)]
    pub seed_designs: Vec<Design>,
}

impl InferenceCallConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            mode: InferenceMode::default(),
            compose_path: default_compose_path(),
            mask_path: default_mask_path(),
            blend_path: default_blend_path(),
            connect_timeout_ms: default_connect_timeout_ms(),
            response_timeout_ms: default_response_timeout_ms(),
            max_payload_bytes: default_max_payload_bytes(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TryOnConfig {
    fn default() -> Self {
        Self {
            default_threshold: default_threshold(),
            default_opacity: default_opacity(),
            max_upload_bytes: default_max_upload_bytes(),
            range_policy: RangePolicy::default(),
            output_format: OutputFormat::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            image_root: default_image_root(),
            seed_designs: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_compose_path() -> String {
    "/api/tryon".to_string()
}

fn default_mask_path() -> String {
    "/api/mask".to_string()
}

fn default_blend_path() -> String {
    "/api/blend".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    15_000
}

fn default_response_timeout_ms() -> u64 {
    30_000
}

fn default_max_payload_bytes() -> usize {
    32 * 1024 * 1024
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    1_000
}

fn default_max_backoff_ms() -> u64 {
    5_000
}

fn default_threshold() -> f64 {
    0.4
}

fn default_opacity() -> f64 {
    0.9
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_database_path() -> String {
    "designs.db".to_string()
}

fn default_image_root() -> String {
    "uploads".to_string()
}
