use axum::{body::Body, http::Request};
use nail_tryon::{
    config::{InferenceCallConfig, InferenceMode, TryOnConfig},
    designs::{Design, DesignResolver, DesignStore, ImageStore},
    inference::InferenceClient,
    tryon::{Orchestrator, Photo},
};
use std::sync::Arc;
use std::time::Duration;

pub const BOUNDARY: &str = "tryon-test-boundary-7MA4YWxkTrZu0gW";

/// Bytes that look like a JPEG: SOI marker, padding, EOI marker.
pub fn fake_jpeg(len: usize) -> Vec<u8> {
    assert!(len >= 6, "a fake JPEG needs at least 6 bytes");
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.resize(len - 2, 0x42);
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

pub fn jpeg_photo(len: usize) -> Photo {
    Photo::new(fake_jpeg(len), "image/jpeg")
}

pub fn create_test_design(id: &str, image_path: &str) -> Design {
    let mut design = Design::new(id, format!("Design {}", id), image_path);
    design.description = "Test design".to_string();
    design.colors = vec!["Pink".to_string()];
    design
}

/// Inference settings with short timeouts and backoff so retry tests run fast.
pub fn fast_inference_config(base_url: &str) -> InferenceCallConfig {
    let mut config = InferenceCallConfig::new(base_url);
    config.connect_timeout_ms = 500;
    config.response_timeout_ms = 1_000;
    config.initial_backoff_ms = 50;
    config.max_backoff_ms = 200;
    config
}

pub fn create_test_orchestrator(
    store: Arc<dyn DesignStore>,
    images: Arc<dyn ImageStore>,
    client: Arc<dyn InferenceClient>,
    mode: InferenceMode,
) -> Orchestrator {
    Orchestrator::new(
        &TryOnConfig::default(),
        mode,
        DesignResolver::new(store, images),
        client,
    )
}

/// Polls `check` until it holds or the timeout elapses.
pub async fn eventually<F>(timeout: Duration, check: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

/// Minimal multipart/form-data body builder for router tests.
#[derive(Default)]
pub struct MultipartBuilder {
    body: Vec<u8>,
}

impl MultipartBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: {}\r\n\r\n",
                BOUNDARY, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        self.body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}

pub fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Finds `needle` inside `haystack`.
pub fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
