use super::{
    BlendRequest, ComposeRequest, CompositeResult, ImagePart, MaskRequest, MaskResult,
    RetryPolicy, supported_image_type,
};
use crate::{Error, Result, config::InferenceCallConfig};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{
    StatusCode,
    header::CONTENT_TYPE,
    multipart::{Form, Part},
};
use tracing::{debug, info, warn};

/// Longest slice of a remote error body kept for logs and error values.
const MAX_ERROR_BODY_CHARS: usize = 1024;

/// Error bodies are read up to this many bytes, then the response is dropped.
const MAX_ERROR_BODY_BYTES: usize = MAX_ERROR_BODY_CHARS * 4;

#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Direct mode: detect and blend in one remote call.
    async fn compose(&self, request: ComposeRequest) -> Result<CompositeResult>;

    /// Staged mode, first call.
    async fn mask(&self, request: MaskRequest) -> Result<MaskResult>;

    /// Staged mode, second call.
    async fn blend(&self, request: BlendRequest) -> Result<CompositeResult>;
}

/// Outcome of one failed attempt.
enum AttemptFailure {
    /// Worth another attempt: transport failure or 5xx.
    Transient(Error),
    /// Retrying cannot help.
    Fatal(Error),
}

struct RemoteImage {
    bytes: Bytes,
    content_type: Option<String>,
}

/// Multipart-over-HTTP client for the inference service. Holds one pooled
/// `reqwest::Client`; cheap to share across concurrent pipeline runs.
pub struct HttpInferenceClient {
    client: reqwest::Client,
    config: InferenceCallConfig,
    policy: RetryPolicy,
}

impl HttpInferenceClient {
    pub fn new(config: InferenceCallConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| Error::config(format!("Failed to build inference HTTP client: {}", e)))?;

        debug!(
            "Created inference client for {} (mode: {:?})",
            config.base_url, config.mode
        );

        Ok(Self {
            client,
            policy: RetryPolicy::from_config(&config),
            config,
        })
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    fn check_payload(&self, parts: &[&ImagePart]) -> Result<()> {
        let total: usize = parts.iter().map(|part| part.len()).sum();
        if total > self.config.max_payload_bytes {
            return Err(Error::invalid_request(format!(
                "Payload of {} bytes exceeds the {} byte limit",
                total, self.config.max_payload_bytes
            )));
        }
        Ok(())
    }

    /// Sends the form built by `build_form`, retrying transient failures
    /// with exponential backoff. The form is rebuilt for every attempt;
    /// image parts share their buffers, so this does not copy payloads.
    async fn call<F>(
        &self,
        operation: &'static str,
        path: &str,
        build_form: F,
    ) -> Result<RemoteImage>
    where
        F: Fn() -> Result<Form> + Send + Sync,
    {
        let url = self.config.url_for(path);
        let max_attempts = self.policy.max_attempts;
        let mut last_error = Error::internal("inference call made no attempts");

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let delay = self.policy.delay(attempt - 1);
                debug!(
                    "{} retry attempt {}/{} after {}ms",
                    operation,
                    attempt,
                    max_attempts,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.attempt(&url, build_form()?).await {
                Ok(image) => {
                    if attempt > 1 {
                        info!("{} succeeded on attempt {}", operation, attempt);
                    }
                    return Ok(image);
                }
                Err(AttemptFailure::Transient(error)) => {
                    warn!(
                        "{} failed (attempt {}/{}): {}",
                        operation, attempt, max_attempts, error
                    );
                    last_error = error;
                }
                Err(AttemptFailure::Fatal(error)) => {
                    warn!("{} failed without retry: {}", operation, error);
                    return Err(error);
                }
            }
        }

        warn!(
            "{} gave up after {} attempts: {}",
            operation, max_attempts, last_error
        );
        Err(last_error)
    }

    async fn attempt(
        &self,
        url: &str,
        form: Form,
    ) -> std::result::Result<RemoteImage, AttemptFailure> {
        let mut response = self
            .client
            .post(url)
            .timeout(self.config.response_timeout())
            .multipart(form)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(&mut response).await;
            return Err(classify_status(status, body));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(supported_image_type)
            .map(str::to_string);

        let limit = self.config.max_payload_bytes;
        if let Some(length) = response.content_length() {
            if length > limit as u64 {
                return Err(AttemptFailure::Fatal(oversized(status, limit)));
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(classify_transport_error)? {
            if body.len() + chunk.len() > limit {
                return Err(AttemptFailure::Fatal(oversized(status, limit)));
            }
            body.extend_from_slice(&chunk);
        }

        if body.is_empty() {
            return Err(AttemptFailure::Fatal(Error::RemoteServiceError {
                status: status.as_u16(),
                body: "empty response body".to_string(),
            }));
        }

        debug!("Received {} byte image from {}", body.len(), url);
        Ok(RemoteImage {
            bytes: body.freeze(),
            content_type,
        })
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn compose(&self, request: ComposeRequest) -> Result<CompositeResult> {
        self.check_payload(&[&request.photo])?;
        debug!(
            "Composing design '{}' (threshold: {}, opacity: {})",
            request.design_id, request.threshold, request.opacity
        );

        let image = self
            .call("compose", &self.config.compose_path, || {
                Ok(Form::new()
                    .part("photo", image_part(&request.photo)?)
                    .text("designId", request.design_id.clone())
                    .text("threshold", request.threshold.to_string())
                    .text("opacity", request.opacity.to_string()))
            })
            .await?;

        Ok(CompositeResult {
            bytes: image.bytes,
            content_type: image.content_type,
        })
    }

    async fn mask(&self, request: MaskRequest) -> Result<MaskResult> {
        self.check_payload(&[&request.photo])?;
        debug!("Requesting nail mask (threshold: {})", request.threshold);

        let image = self
            .call("mask", &self.config.mask_path, || {
                Ok(Form::new()
                    .part("file", image_part(&request.photo)?)
                    .text("threshold", request.threshold.to_string()))
            })
            .await?;

        Ok(MaskResult { bytes: image.bytes })
    }

    async fn blend(&self, request: BlendRequest) -> Result<CompositeResult> {
        let mask = request.mask.clone().into_part();
        self.check_payload(&[&request.base, &request.overlay, &mask])?;
        debug!("Blending design onto mask (opacity: {})", request.opacity);

        let image = self
            .call("blend", &self.config.blend_path, || {
                Ok(Form::new()
                    .part("base", image_part(&request.base)?)
                    .part("overlay", image_part(&request.overlay)?)
                    .part("mask", image_part(&mask)?)
                    .text("opacity", request.opacity.to_string()))
            })
            .await?;

        Ok(CompositeResult {
            bytes: image.bytes,
            content_type: image.content_type,
        })
    }
}

fn image_part(image: &ImagePart) -> Result<Part> {
    Part::stream_with_length(reqwest::Body::from(image.bytes.clone()), image.len() as u64)
        .file_name(image.file_name.clone())
        .mime_str(&image.content_type)
        .map_err(|e| {
            Error::invalid_request(format!(
                "Invalid content type '{}': {}",
                image.content_type, e
            ))
        })
}

fn classify_transport_error(error: reqwest::Error) -> AttemptFailure {
    if error.is_builder() {
        return AttemptFailure::Fatal(Error::internal(format!(
            "Failed to build inference request: {}",
            error
        )));
    }

    let reason = if error.is_timeout() {
        format!("timed out: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        format!("transport error: {}", error)
    };
    AttemptFailure::Transient(Error::remote_unavailable(reason))
}

fn classify_status(status: StatusCode, body: String) -> AttemptFailure {
    match status {
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            AttemptFailure::Transient(Error::remote_unavailable(format!(
                "status {}: {}",
                status.as_u16(),
                body
            )))
        }
        status if status.is_server_error() => {
            AttemptFailure::Transient(Error::RemoteServiceError {
                status: status.as_u16(),
                body,
            })
        }
        status => AttemptFailure::Fatal(Error::RemoteServiceError {
            status: status.as_u16(),
            body,
        }),
    }
}

fn oversized(status: StatusCode, limit: usize) -> Error {
    Error::RemoteServiceError {
        status: status.as_u16(),
        body: format!("response body exceeds {} bytes", limit),
    }
}

/// Reads at most `MAX_ERROR_BODY_BYTES` of an error body. A read failure
/// keeps whatever arrived before it.
async fn read_error_body(response: &mut reqwest::Response) -> String {
    let mut body = BytesMut::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let room = MAX_ERROR_BODY_BYTES - body.len();
                if chunk.len() >= room {
                    body.extend_from_slice(&chunk[..room]);
                    break;
                }
                body.extend_from_slice(&chunk);
            }
            Ok(None) => break,
            Err(e) => {
                debug!("Stopped reading error body: {}", e);
                break;
            }
        }
    }
    truncate(&String::from_utf8_lossy(&body))
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
