use super::{Design, DesignStore, ImageStore};
use crate::{Error, Result};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves design identifiers against the storage collaborator.
#[derive(Clone)]
pub struct DesignResolver {
    store: Arc<dyn DesignStore>,
    images: Arc<dyn ImageStore>,
}

impl DesignResolver {
    pub fn new(store: Arc<dyn DesignStore>, images: Arc<dyn ImageStore>) -> Self {
        Self { store, images }
    }

    pub async fn resolve(&self, design_id: &str) -> Result<Design> {
        match self.store.find(design_id).await? {
            Some(design) => {
                debug!("Resolved design '{}' -> {}", design_id, design.image_path);
                Ok(design)
            }
            None => Err(Error::not_found(design_id)),
        }
    }

    /// Loads the reference image of a resolved design. A record whose image
    /// is gone from the store is reported as `NotFound` for that design.
    pub async fn reference_image(&self, design: &Design) -> Result<Bytes> {
        match self.images.load(&design.image_path).await {
            Ok(data) => Ok(data),
            Err(Error::NotFound { .. }) => {
                warn!(
                    "Design '{}' references missing image '{}'",
                    design.id, design.image_path
                );
                Err(Error::not_found(&design.id))
            }
            Err(e) => Err(e),
        }
    }

    /// Best-effort popularity bump. Runs detached; failures are only logged.
    pub fn record_use(&self, design_id: &str) {
        let store = self.store.clone();
        let design_id = design_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = store.increment_popularity(&design_id).await {
                warn!(
                    "Failed to increment popularity for design '{}': {}",
                    design_id, e
                );
            }
        });
    }
}
