use async_trait::async_trait;
use bytes::Bytes;
use nail_tryon::{
    Error, Result,
    designs::{Design, DesignStore, ImageStore},
    inference::{
        BlendRequest, ComposeRequest, CompositeResult, InferenceClient, MaskRequest, MaskResult,
    },
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock design store for testing
#[derive(Debug, Default)]
pub struct MockDesignStore {
    pub designs: Arc<Mutex<HashMap<String, Design>>>,
    pub find_calls: Arc<Mutex<Vec<String>>>,
    pub increments: Arc<Mutex<Vec<String>>>,
    pub increment_error: Option<String>,
    pub find_error: Option<String>,
}

impl MockDesignStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_design(self, design: Design) -> Self {
        self.designs
            .lock()
            .unwrap()
            .insert(design.id.clone(), design);
        self
    }

    pub fn with_increment_error(mut self, error: &str) -> Self {
        self.increment_error = Some(error.to_string());
        self
    }

    pub fn with_find_error(mut self, error: &str) -> Self {
        self.find_error = Some(error.to_string());
        self
    }

    pub fn get_increments(&self) -> Vec<String> {
        self.increments.lock().unwrap().clone()
    }

    pub fn get_find_calls(&self) -> Vec<String> {
        self.find_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DesignStore for MockDesignStore {
    async fn find(&self, id: &str) -> Result<Option<Design>> {
        self.find_calls.lock().unwrap().push(id.to_string());
        if let Some(ref error) = self.find_error {
            return Err(Error::internal(error.clone()));
        }
        Ok(self.designs.lock().unwrap().get(id).cloned())
    }

    async fn increment_popularity(&self, id: &str) -> Result<()> {
        self.increments.lock().unwrap().push(id.to_string());
        if let Some(ref error) = self.increment_error {
            return Err(Error::internal(error.clone()));
        }
        match self.designs.lock().unwrap().get_mut(id) {
            Some(design) => {
                design.popularity += 1;
                Ok(())
            }
            None => Err(Error::not_found(id)),
        }
    }

    async fn upsert(&self, design: Design) -> Result<()> {
        self.designs
            .lock()
            .unwrap()
            .insert(design.id.clone(), design);
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.designs.lock().unwrap().len())
    }
}

/// Mock image store keyed by image name
#[derive(Debug, Default)]
pub struct MockImageStore {
    pub images: HashMap<String, Bytes>,
}

impl MockImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, name: &str, data: &[u8]) -> Self {
        self.images
            .insert(name.to_string(), Bytes::copy_from_slice(data));
        self
    }
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn load(&self, name: &str) -> Result<Bytes> {
        self.images
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(name))
    }
}

/// Builds the error a failing mock call returns.
pub type ErrorFactory = Arc<dyn Fn() -> Error + Send + Sync>;

/// Mock inference client. Masks echo the photo they were computed from and
/// blends concatenate base, overlay and mask, so tests can trace which
/// inputs went into a result.
#[derive(Default)]
pub struct MockInferenceClient {
    pub compose_calls: Arc<Mutex<Vec<ComposeRequest>>>,
    pub mask_calls: Arc<Mutex<Vec<MaskRequest>>>,
    pub blend_calls: Arc<Mutex<Vec<BlendRequest>>>,
    pub compose_error: Option<ErrorFactory>,
    pub mask_error: Option<ErrorFactory>,
    pub blend_error: Option<ErrorFactory>,
    pub delay: Option<Duration>,
}

impl MockInferenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compose_error<F>(mut self, error: F) -> Self
    where
        F: Fn() -> Error + Send + Sync + 'static,
    {
        self.compose_error = Some(Arc::new(error));
        self
    }

    pub fn with_mask_error<F>(mut self, error: F) -> Self
    where
        F: Fn() -> Error + Send + Sync + 'static,
    {
        self.mask_error = Some(Arc::new(error));
        self
    }

    pub fn with_blend_error<F>(mut self, error: F) -> Self
    where
        F: Fn() -> Error + Send + Sync + 'static,
    {
        self.blend_error = Some(Arc::new(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn total_calls(&self) -> usize {
        self.compose_calls.lock().unwrap().len()
            + self.mask_calls.lock().unwrap().len()
            + self.blend_calls.lock().unwrap().len()
    }

    pub fn compose_count(&self) -> usize {
        self.compose_calls.lock().unwrap().len()
    }

    pub fn mask_count(&self) -> usize {
        self.mask_calls.lock().unwrap().len()
    }

    pub fn blend_count(&self) -> usize {
        self.blend_calls.lock().unwrap().len()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl InferenceClient for MockInferenceClient {
    async fn compose(&self, request: ComposeRequest) -> Result<CompositeResult> {
        self.compose_calls.lock().unwrap().push(request.clone());
        self.pause().await;
        if let Some(ref error) = self.compose_error {
            return Err(error());
        }

        let mut bytes = b"COMPOSED:".to_vec();
        bytes.extend_from_slice(request.design_id.as_bytes());
        Ok(CompositeResult {
            bytes: Bytes::from(bytes),
            content_type: Some("image/jpeg".to_string()),
        })
    }

    async fn mask(&self, request: MaskRequest) -> Result<MaskResult> {
        self.mask_calls.lock().unwrap().push(request.clone());
        self.pause().await;
        if let Some(ref error) = self.mask_error {
            return Err(error());
        }

        let mut bytes = b"MASK:".to_vec();
        bytes.extend_from_slice(&request.photo.bytes);
        Ok(MaskResult {
            bytes: Bytes::from(bytes),
        })
    }

    async fn blend(&self, request: BlendRequest) -> Result<CompositeResult> {
        self.blend_calls.lock().unwrap().push(request.clone());
        self.pause().await;
        if let Some(ref error) = self.blend_error {
            return Err(error());
        }

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&request.base.bytes);
        bytes.push(b'|');
        bytes.extend_from_slice(&request.overlay.bytes);
        bytes.push(b'|');
        bytes.extend_from_slice(&request.mask.bytes);
        Ok(CompositeResult {
            bytes: Bytes::from(bytes),
            content_type: Some("image/png".to_string()),
        })
    }
}
