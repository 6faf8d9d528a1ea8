pub mod handlers;
pub mod response;
mod types;

pub use handlers::AppState;
pub use response::ResponseEncoder;
pub use types::{ErrorResponse, HealthResponse};

use crate::{
    Result,
    config::Config,
    designs::{DesignResolver, DesignStore, FsImageStore, LibsqlDesignStore},
    inference::HttpInferenceClient,
    tryon::Orchestrator,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Room for multipart framing and the text fields around the photo.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/tryon", post(handlers::try_on))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Seeds the catalog from configuration when the store is still empty.
pub async fn seed_designs(store: &dyn DesignStore, config: &Config) -> Result<()> {
    if store.count().await? > 0 || config.storage.seed_designs.is_empty() {
        return Ok(());
    }

    for design in &config.storage.seed_designs {
        store.upsert(design.clone()).await?;
    }
    info!("Seeded {} designs", config.storage.seed_designs.len());
    Ok(())
}

pub async fn build_state(config: &Config) -> Result<AppState> {
    let db_path = std::env::var("DESIGN_DB_PATH")
        .unwrap_or_else(|_| config.storage.database_path.clone());
    let store = Arc::new(LibsqlDesignStore::new(&db_path).await?);
    seed_designs(store.as_ref(), config).await?;

    let images = Arc::new(FsImageStore::new(&config.storage.image_root));
    let resolver = DesignResolver::new(store, images);
    let client = Arc::new(HttpInferenceClient::new(config.inference.clone())?);

    let orchestrator = Orchestrator::new(&config.tryon, config.inference.mode, resolver, client);

    Ok(AppState {
        orchestrator: Arc::new(orchestrator),
        encoder: ResponseEncoder::new(config.tryon.output_format),
    })
}

pub async fn run(config: Config) -> Result<()> {
    let app_state = build_state(&config).await?;
    let app = router(app_state, config.tryon.max_upload_bytes);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
