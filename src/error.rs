use axum::http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Design not found: {design_id}")]
    NotFound { design_id: String },

    #[error("Inference service unavailable: {reason}")]
    RemoteUnavailable { reason: String },

    #[error("Inference service returned {status}: {body}")]
    RemoteServiceError { status: u16, body: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub fn not_found(design_id: impl Into<String>) -> Self {
        Self::NotFound {
            design_id: design_id.into(),
        }
    }

    pub fn remote_unavailable(reason: impl Into<String>) -> Self {
        Self::RemoteUnavailable {
            reason: reason.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status the inbound API answers with for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::RemoteUnavailable { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller. Remote bodies and internal
    /// details stay in the server logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidRequest { reason } => reason.clone(),
            Self::NotFound { design_id } => format!("Design not found: {}", design_id),
            Self::RemoteUnavailable { .. } => "Inference service is unavailable".to_string(),
            Self::RemoteServiceError { .. } => {
                "Inference service failed to process the image".to_string()
            }
            Self::Cancelled => "Request cancelled".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}
