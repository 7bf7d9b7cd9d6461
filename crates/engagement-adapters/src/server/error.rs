//! Error types for the HTTP service

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use engagement_core::{ClassifyError, ImagePreprocessingError};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// A request failure, rendered as `{"error": <message>}`.
///
/// Client faults carry a message describing the payload problem. Server
/// faults display fixed text; their details only reach the logs.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Preprocessing(#[from] ImagePreprocessingError),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("Prediction failed")]
    Inference(anyhow::Error),

    #[error("Batch prediction failed")]
    Batch(String),

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Preprocessing(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ModelNotLoaded | Self::Inference(_) | Self::Batch(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ClassifyError> for ApiError {
    fn from(err: ClassifyError) -> Self {
        match err {
            ClassifyError::Preprocessing(e) => Self::Preprocessing(e),
            ClassifyError::Inference(e) => Self::Inference(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::PayloadTooLarge;
        }
        warn!(detail = %rejection.body_text(), "Rejected request body");
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                Self::validation("Content-Type must be application/json")
            }
            _ => Self::validation("Request body must be valid JSON"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Inference(e) => error!(detail = %format_args!("{e:#}"), "Prediction error"),
            Self::Batch(detail) => error!(detail = %detail, "Batch prediction error"),
            Self::Internal(detail) => error!(detail = %detail, "Internal server error"),
            Self::ModelNotLoaded => warn!("Request rejected: model not loaded"),
            _ => {}
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
