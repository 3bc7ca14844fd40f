//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use llmgate_core::EngineError;
use thiserror::Error;
use tracing::error;

use crate::models::ErrorBody;

/// Per-request failures. None of them affect other requests.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Body is not valid JSON or does not match the request schema.
    #[error("Invalid request body: {0}")]
    MalformedBody(String),

    /// Body parsed but violates a request constraint.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The generation task ended without producing a result.
    #[error("Generation task failed: {0}")]
    Internal(String),
}

impl GatewayError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Engine(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, "Chat completion failed: {self}");
        }
        (
            status,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}
