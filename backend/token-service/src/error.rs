use crate::security::{IssueError, VerifyError};
use crate::services::DeliveryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Body unparsable or failed validation
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Missing, invalid, expired or reused bearer token
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Outbound email could not be sent; the caller must re-request
    #[error("email delivery failed: {0}")]
    Delivery(String),

    /// Token signing failed; indicates a server defect
    #[error("signing failure: {0}")]
    Signing(String),

    /// The request deadline passed before any state was changed
    #[error("client closed request")]
    ClientClosedRequest,
}

/// Message for every rejected bearer token. Unknown, consumed and badly
/// signed tokens look alike to the caller; logs keep the reason.
pub const INVALID_TOKEN: &str = "invalid or expired token";

/// Non-standard status used when the request gave up first
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

impl AppError {
    /// Returns HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::MalformedRequest(_) => 400,
            AppError::Unauthenticated(_) => 401,
            AppError::Delivery(_) => 502,
            AppError::Signing(_) => 500,
            AppError::ClientClosedRequest => CLIENT_CLOSED_REQUEST,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            AppError::MalformedRequest(_) => "malformed_request",
            AppError::Unauthenticated(_) => "unauthenticated",
            AppError::Delivery(_) => "delivery_failure",
            AppError::Signing(_) => "internal_error",
            AppError::ClientClosedRequest => "client_closed_request",
        }
    }
}

/// JSON body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
}

/// Map a domain error to its HTTP status and body
pub fn map_error(err: &AppError) -> (StatusCode, ErrorResponse) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    // Don't leak internal details
    let message = match err {
        AppError::Signing(_) => "Internal server error".to_string(),
        AppError::Delivery(_) => "Failed to send verification email".to_string(),
        other => other.to_string(),
    };

    let response = ErrorResponse {
        error: err.error_type().to_string(),
        message,
        status: status.as_u16(),
    };

    (status, response)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Signing(detail) => tracing::error!(error = %detail, "Token signing failed"),
            AppError::Delivery(detail) => tracing::warn!(error = %detail, "Email delivery failed"),
            _ => {}
        }

        let (status, body) = map_error(&self);
        (status, Json(body)).into_response()
    }
}

// Conversions from lifecycle error types
impl From<VerifyError> for AppError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::UnknownSubject | VerifyError::InvalidToken(_) => {
                AppError::Unauthenticated(INVALID_TOKEN.to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::MalformedRequest(err.to_string())
    }
}

impl From<IssueError> for AppError {
    fn from(err: IssueError) -> Self {
        AppError::Signing(err.to_string())
    }
}

impl From<DeliveryError> for AppError {
    fn from(err: DeliveryError) -> Self {
        AppError::Delivery(err.to_string())
    }
}
