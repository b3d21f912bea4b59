use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orchestrator::OrchestratorError;
use resolver::MetadataError;
use serde::Serialize;
use tischiron_core::CoreError;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
    Metadata(MetadataError),
    Cli(OrchestratorError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
            AppError::Metadata(err) => match err {
                MetadataError::ProjectNotFound(_) | MetadataError::FileNotFound { .. } => {
                    (StatusCode::NOT_FOUND, "not_found", err.to_string())
                }
                MetadataError::InvalidProjectName(_) => {
                    (StatusCode::BAD_REQUEST, "bad_request", err.to_string())
                }
                _ => {
                    tracing::error!("Metadata error: {:?}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "metadata_error",
                        err.to_string(),
                    )
                }
            },
            AppError::Cli(err) => {
                tracing::error!("CLI error: {:?}", err);
                match err {
                    OrchestratorError::Spawn { .. } => {
                        (StatusCode::BAD_GATEWAY, "cli_unavailable", err.to_string())
                    }
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "cli_error",
                        err.to_string(),
                    ),
                }
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<MetadataError> for AppError {
    fn from(err: MetadataError) -> Self {
        AppError::Metadata(err)
    }
}

impl From<OrchestratorError> for AppError {
    fn from(err: OrchestratorError) -> Self {
        AppError::Cli(err)
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
