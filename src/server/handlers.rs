use super::{
    response::ResponseEncoder,
    types::{ErrorResponse, HealthResponse},
};
use crate::{
    Error, Result,
    tryon::{Orchestrator, Photo, TryOnRequest},
};
use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::{Json, Response},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub encoder: ResponseEncoder,
}

pub async fn try_on(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Response, (StatusCode, Json<ErrorResponse>)> {
    // Dropping this handler future (client went away) cancels the token,
    // which aborts any inference call still in flight.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let request = match multipart {
        Ok(multipart) => read_request(multipart).await,
        Err(rejection) => Err(Error::invalid_request(rejection.body_text())),
    }
    .map_err(error_response)?;

    info!(
        "Received try-on request for design '{}' (photo: {} bytes)",
        request.design_id,
        request.photo.as_ref().map_or(0, |photo| photo.bytes.len())
    );

    match state.orchestrator.try_on(request, &cancel).await {
        Ok(result) => Ok(state.encoder.encode(result)),
        Err(e) => Err(error_response(e)),
    }
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        mode: format!("{:?}", state.orchestrator.mode()).to_lowercase(),
    })
}

async fn read_request(mut multipart: Multipart) -> Result<TryOnRequest> {
    let mut request = TryOnRequest::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "photo" => {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(malformed)?;
                request.photo = Some(Photo {
                    bytes,
                    content_type,
                    file_name,
                });
            }
            "designId" => {
                request.design_id = field.text().await.map_err(malformed)?;
            }
            "threshold" => {
                let raw = field.text().await.map_err(malformed)?;
                request.threshold = parse_number("threshold", &raw)?;
            }
            "opacity" => {
                let raw = field.text().await.map_err(malformed)?;
                request.opacity = parse_number("opacity", &raw)?;
            }
            other => {
                debug!("Ignoring unknown multipart field '{}'", other);
            }
        }
    }

    Ok(request)
}

fn parse_number(name: &str, raw: &str) -> Result<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| Error::invalid_request(format!("{} must be a number, got '{}'", name, raw)))
}

fn malformed(e: axum::extract::multipart::MultipartError) -> Error {
    Error::invalid_request(format!("Malformed multipart body: {}", e.body_text()))
}

fn error_response(e: Error) -> (StatusCode, Json<ErrorResponse>) {
    let status = e.status_code();
    if status.is_server_error() {
        error!("Try-on request failed: {}", e);
    } else {
        warn!("Try-on request rejected: {}", e);
    }

    (
        status,
        Json(ErrorResponse {
            error: e.public_message(),
        }),
    )
}
