use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Read-only view of the store holding design reference images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn load(&self, name: &str) -> Result<Bytes>;
}

/// Image store backed by a directory on the local filesystem.
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let is_plain = !name.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !is_plain {
            return Err(Error::internal(format!("Invalid image name: {}", name)));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn load(&self, name: &str) -> Result<Bytes> {
        let path = self.resolve(name)?;
        debug!("Loading design image from {}", path.display());

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::not_found(name)),
            Err(e) => Err(e.into()),
        }
    }
}
