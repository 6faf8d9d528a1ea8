use bytes::Bytes;

/// A binary image sent to the inference service as one multipart part.
#[derive(Debug, Clone)]
pub struct ImagePart {
    pub bytes: Bytes,
    pub content_type: String,
    pub file_name: String,
}

impl ImagePart {
    pub fn new(
        bytes: impl Into<Bytes>,
        content_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
            file_name: file_name.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Direct mode: one round trip, the service resolves the design itself.
#[derive(Debug, Clone)]
pub struct ComposeRequest {
    pub photo: ImagePart,
    pub design_id: String,
    pub threshold: f64,
    pub opacity: f64,
}

/// Staged mode, first call.
#[derive(Debug, Clone)]
pub struct MaskRequest {
    pub photo: ImagePart,
    pub threshold: f64,
}

/// Staged mode, second call. `mask` must come from the mask call of the
/// same pipeline run.
#[derive(Debug, Clone)]
pub struct BlendRequest {
    pub base: ImagePart,
    pub overlay: ImagePart,
    pub mask: MaskResult,
    pub opacity: f64,
}

/// Detected nail regions for one photo.
#[derive(Debug, Clone)]
pub struct MaskResult {
    pub bytes: Bytes,
}

impl MaskResult {
    pub fn into_part(self) -> ImagePart {
        ImagePart::new(self.bytes, "image/png", "mask.png")
    }
}

/// Final composited image returned to the caller.
#[derive(Debug, Clone)]
pub struct CompositeResult {
    pub bytes: Bytes,
    /// Image content type reported by the inference service, if any.
    pub content_type: Option<String>,
}

/// Maps a `Content-Type` header value to one of the image types handed to
/// callers. Parameters and case are ignored; anything else yields `None`.
pub fn supported_image_type(value: &str) -> Option<&'static str> {
    let essence = value.split(';').next().unwrap_or_default().trim();
    if essence.eq_ignore_ascii_case("image/jpeg") {
        Some("image/jpeg")
    } else if essence.eq_ignore_ascii_case("image/png") {
        Some("image/png")
    } else {
        None
    }
}
