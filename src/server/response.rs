use crate::{
    config::OutputFormat,
    inference::{CompositeResult, supported_image_type},
};
use axum::{
    http::header,
    response::{IntoResponse, Response},
};

/// Wraps composite image bytes for the caller. Every result is specific to
/// one request, so intermediaries are told not to cache it.
#[derive(Debug, Clone, Copy)]
pub struct ResponseEncoder {
    default_format: OutputFormat,
}

impl ResponseEncoder {
    pub fn new(default_format: OutputFormat) -> Self {
        Self { default_format }
    }

    /// JPEG or PNG only: the remote type when it is one of those, else the
    /// configured format.
    pub fn content_type(&self, result: &CompositeResult) -> &'static str {
        result
            .content_type
            .as_deref()
            .and_then(supported_image_type)
            .unwrap_or_else(|| self.default_format.content_type())
    }

    pub fn encode(&self, result: CompositeResult) -> Response {
        let content_type = self.content_type(&result);
        (
            [
                (header::CONTENT_TYPE, content_type),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            result.bytes,
        )
            .into_response()
    }
}
