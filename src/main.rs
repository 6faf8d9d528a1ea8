use anyhow::{Context, Result};
use nail_tryon::{
    config::{self, Config},
    server,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

/// Validates that a log level string is valid
fn validate_log_level(level: &str) -> Result<()> {
    level.parse::<LevelFilter>().map_err(|_| {
        anyhow::anyhow!(
            "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
            level
        )
    })?;
    Ok(())
}

fn init_tracing(config: &Config) -> Result<()> {
    // RUST_LOG wins over the configured level
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.server.logs.level.clone());
    validate_log_level(&log_level)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .json()
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

    // Logging is not up yet, so startup failures go to stderr
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load try-on configuration from '{}': {}", config_path, e);
            eprintln!("Set CONFIG_PATH or copy config.example.yaml to config.yaml");
            std::process::exit(1);
        }
    };

    if let Err(e) = init_tracing(&config) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    info!(
        inference_url = %config.inference.base_url,
        mode = ?config.inference.mode,
        max_attempts = config.inference.max_attempts,
        max_upload_bytes = config.tryon.max_upload_bytes,
        range_policy = ?config.tryon.range_policy,
        seed_designs = config.storage.seed_designs.len(),
        "Starting nail try-on service"
    );

    server::run(config)
        .await
        .context("Try-on server stopped with an error")?;

    Ok(())
}
