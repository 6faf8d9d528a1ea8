use super::{TryOnParams, TryOnRequest};
use crate::{
    Error, Result,
    config::{RangePolicy, TryOnConfig},
};

/// Checks an inbound try-on request before any network cost is paid.
/// Pure: no I/O, same verdict for the same request.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    max_upload_bytes: usize,
    range_policy: RangePolicy,
    default_threshold: f64,
    default_opacity: f64,
}

impl RequestValidator {
    pub fn new(config: &TryOnConfig) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes,
            range_policy: config.range_policy,
            default_threshold: config.default_threshold,
            default_opacity: config.default_opacity,
        }
    }

    pub fn validate(&self, request: &TryOnRequest) -> Result<TryOnParams> {
        let photo = match request.photo {
            Some(ref photo) if !photo.bytes.is_empty() => photo,
            _ => return Err(Error::invalid_request("Photo is required")),
        };

        let is_image = photo
            .content_type
            .as_deref()
            .is_some_and(|content_type| content_type.starts_with("image/"));
        if !is_image {
            return Err(Error::invalid_request("Photo must be an image"));
        }

        if photo.bytes.len() > self.max_upload_bytes {
            return Err(Error::invalid_request(format!(
                "Photo must not exceed {} bytes",
                self.max_upload_bytes
            )));
        }

        if request.design_id.trim().is_empty() {
            return Err(Error::invalid_request("designId is required"));
        }

        Ok(TryOnParams {
            threshold: self.unit_interval(
                "threshold",
                request.threshold.unwrap_or(self.default_threshold),
            )?,
            opacity: self.unit_interval(
                "opacity",
                request.opacity.unwrap_or(self.default_opacity),
            )?,
        })
    }

    fn unit_interval(&self, name: &str, value: f64) -> Result<f64> {
        if !value.is_finite() {
            return Err(Error::invalid_request(format!(
                "{} must be a finite number",
                name
            )));
        }
        if (0.0..=1.0).contains(&value) {
            return Ok(value);
        }

        match self.range_policy {
            RangePolicy::Reject => Err(Error::invalid_request(format!(
                "{} must be within [0, 1], got {}",
                name, value
            ))),
            RangePolicy::Clamp => Ok(value.clamp(0.0, 1.0)),
        }
    }
}
