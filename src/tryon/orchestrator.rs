use super::{
    RequestValidator, TryOnParams, TryOnRequest,
    staged::{StagedEvent, StagedRun},
};
use crate::{
    Error, Result,
    config::{InferenceMode, TryOnConfig},
    designs::DesignResolver,
    inference::{
        BlendRequest, ComposeRequest, CompositeResult, ImagePart, InferenceClient, MaskRequest,
    },
};
use std::{future::Future, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

/// Sequences one try-on request: validation, design resolution, inference,
/// and the best-effort popularity update. Holds no per-request state, so a
/// single instance serves all concurrent requests.
pub struct Orchestrator {
    validator: RequestValidator,
    resolver: DesignResolver,
    client: Arc<dyn InferenceClient>,
    mode: InferenceMode,
}

impl Orchestrator {
    pub fn new(
        config: &TryOnConfig,
        mode: InferenceMode,
        resolver: DesignResolver,
        client: Arc<dyn InferenceClient>,
    ) -> Self {
        info!("Try-on orchestrator running in {:?} mode", mode);
        Self {
            validator: RequestValidator::new(config),
            resolver,
            client,
            mode,
        }
    }

    pub fn mode(&self) -> InferenceMode {
        self.mode
    }

    /// Runs the pipeline for one request. Cancelling `cancel` aborts the
    /// in-flight remote call and yields `Error::Cancelled`.
    pub async fn try_on(
        &self,
        request: TryOnRequest,
        cancel: &CancellationToken,
    ) -> Result<CompositeResult> {
        let span = info_span!(
            "tryon",
            request_id = %Uuid::new_v4(),
            design_id = %request.design_id,
            mode = ?self.mode
        );
        self.run(request, cancel).instrument(span).await
    }

    async fn run(
        &self,
        request: TryOnRequest,
        cancel: &CancellationToken,
    ) -> Result<CompositeResult> {
        let params = self.validator.validate(&request)?;
        let photo = request
            .photo
            .as_ref()
            .map(|photo| photo.to_part())
            .ok_or_else(|| Error::internal("validated request lost its photo"))?;

        let design = self.resolver.resolve(request.design_id.trim()).await?;

        let result = match self.mode {
            InferenceMode::Direct => {
                let compose = ComposeRequest {
                    photo,
                    design_id: design.id.clone(),
                    threshold: params.threshold,
                    opacity: params.opacity,
                };
                cancellable(cancel, self.client.compose(compose)).await?
            }
            InferenceMode::Staged => {
                let overlay_bytes = self.resolver.reference_image(&design).await?;
                let overlay = ImagePart::new(
                    overlay_bytes,
                    image_content_type(&design.image_path),
                    design.image_path.clone(),
                );
                self.run_staged(photo, overlay, params, cancel).await?
            }
        };

        info!(
            "Try-on for design '{}' produced {} bytes",
            design.id,
            result.bytes.len()
        );
        self.resolver.record_use(&design.id);

        Ok(result)
    }

    async fn run_staged(
        &self,
        photo: ImagePart,
        overlay: ImagePart,
        params: TryOnParams,
        cancel: &CancellationToken,
    ) -> Result<CompositeResult> {
        let mut run = StagedRun::new();

        run.transition(StagedEvent::RequestMask)?;
        let mask_request = MaskRequest {
            photo: photo.clone(),
            threshold: params.threshold,
        };
        let mask = match cancellable(cancel, self.client.mask(mask_request)).await {
            Ok(mask) => mask,
            Err(e) => {
                run.fail(&e);
                return Err(e);
            }
        };
        run.record_mask(mask)?;

        let blend_request = BlendRequest {
            base: photo,
            overlay,
            mask: run.begin_blend()?,
            opacity: params.opacity,
        };
        match cancellable(cancel, self.client.blend(blend_request)).await {
            Ok(result) => {
                run.transition(StagedEvent::BlendArrived)?;
                Ok(result)
            }
            Err(e) => {
                run.fail(&e);
                Err(e)
            }
        }
    }
}

/// Races a remote call against the request's cancellation token. Dropping
/// the losing call future aborts its HTTP exchange.
async fn cancellable<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!("Inbound request cancelled, aborting inference call");
            Err(Error::Cancelled)
        }
        result = call => result,
    }
}

fn image_content_type(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else {
        debug!("Assuming JPEG for design image '{}'", name);
        "image/jpeg"
    }
}
