//! Error types for the generation pipeline and the web layer.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{error, info, warn};

/// Failures raised while talking to an image provider or saving its output.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Network or HTTP transport error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Provider answered 2xx with a body we could not use.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Provider reported the task as failed. The provider's reason is not kept.
    #[error("image generation task {task_id} failed")]
    TaskFailed { task_id: String },

    /// Task did not reach a terminal state within the wall-clock budget.
    #[error("image generation task {task_id} timed out after {elapsed:?}")]
    Timeout { task_id: String, elapsed: Duration },

    /// Inline payload could not be decoded.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// Inline payload decoded but is not a readable image.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Reading the logo or writing outputs failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for generation operations.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Errors surfaced by the HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Form submission was unusable (no file field, unreadable multipart).
    BadRequest(String),
    /// All generation slots are taken.
    Busy,
    /// Anything the generation pipeline raised.
    Generation(GenerationError),
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        AppError::Generation(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Generation(GenerationError::Io(err))
    }
}

fn plain(status: StatusCode, body: &'static str) -> Response {
    (status, body).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(message) => {
                info!("Bad request: {}", message);
                plain(StatusCode::BAD_REQUEST, "Bad Request")
            }
            AppError::Busy => {
                warn!("Rejecting request, all generation slots are busy");
                plain(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Too many generations in progress, try again later",
                )
            }
            AppError::Generation(err) => {
                error!("Generation failed: {}", err);
                plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GenerationError::Api {
            status: 503,
            message: "overloaded".into(),
        };
        assert_eq!(err.to_string(), "API error: 503 - overloaded");

        let err = GenerationError::TaskFailed {
            task_id: "abc".into(),
        };
        assert_eq!(err.to_string(), "image generation task abc failed");
    }

    #[test]
    fn generation_errors_are_generic_500s() {
        let timeout = AppError::from(GenerationError::Timeout {
            task_id: "t".into(),
            elapsed: Duration::from_secs(300),
        });
        assert_eq!(
            timeout.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let failed = AppError::from(GenerationError::TaskFailed {
            task_id: "t".into(),
        });
        assert_eq!(
            failed.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bad_request_and_busy_statuses() {
        assert_eq!(
            AppError::BadRequest("no file".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Busy.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
