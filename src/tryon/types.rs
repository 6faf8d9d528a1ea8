use crate::inference::ImagePart;
use bytes::Bytes;

/// Uploaded hand photo as received from the caller.
#[derive(Debug, Clone)]
pub struct Photo {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

impl Photo {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: Some(content_type.into()),
            file_name: None,
        }
    }

    pub fn to_part(&self) -> ImagePart {
        ImagePart::new(
            self.bytes.clone(),
            self.content_type
                .clone()
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            self.file_name.clone().unwrap_or_else(|| "photo".to_string()),
        )
    }
}

/// One try-on call. Built per request, never persisted.
#[derive(Debug, Clone, Default)]
pub struct TryOnRequest {
    pub photo: Option<Photo>,
    pub design_id: String,
    /// Detection confidence; the configured default applies when absent.
    pub threshold: Option<f64>,
    /// Overlay strength; the configured default applies when absent.
    pub opacity: Option<f64>,
}

impl TryOnRequest {
    pub fn new(photo: Photo, design_id: impl Into<String>) -> Self {
        Self {
            photo: Some(photo),
            design_id: design_id.into(),
            threshold: None,
            opacity: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }
}

/// Tuning values after defaults and the range rule have been applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TryOnParams {
    pub threshold: f64,
    pub opacity: f64,
}
