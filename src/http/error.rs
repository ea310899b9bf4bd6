//! Mapping of orchestrator errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::orchestrator::{DriverError, ErrorClass};

/// Error returned by the HTTP handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Rejects a request body that does not match the expected shape.
    #[must_use]
    pub fn unprocessable(err: &serde_json::Error) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: format!("invalid request body: {err}"),
        }
    }

    /// Rejects a header value that is not visible ASCII.
    #[must_use]
    pub fn bad_header(header: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: format!("malformed HTTP header \"{header}\": not valid text"),
        }
    }

    /// Status code sent to the caller.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<DriverError> for ApiError {
    fn from(err: DriverError) -> Self {
        let status = match err.class() {
            ErrorClass::Client => StatusCode::BAD_REQUEST,
            ErrorClass::NotFound => StatusCode::NOT_FOUND,
            ErrorClass::Server => {
                error!(error = %err, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = match self.status {
            StatusCode::NOT_FOUND => "not_found",
            StatusCode::UNPROCESSABLE_ENTITY => "unprocessable_entity",
            StatusCode::INTERNAL_SERVER_ERROR => "internal",
            _ => "bad_request",
        };
        let body = Json(ErrorBody {
            error: kind,
            message: &self.message,
        });
        (self.status, body).into_response()
    }
}
