//! Unified error types for the staticpost API
//!
//! Errors are layered the same way the crate is:
//! - `ProviderError`: low-level failure while talking to an external REST API
//! - `HostingError`: git-hosting operations, one variant per failure kind
//! - `MailError`: mail-provider operations
//! - `AppError`: application layer errors (converted into HTTP responses)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Low-level failure from an external REST API call
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("unauthorized - invalid token")]
    Unauthorized,

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl ProviderError {
    /// HTTP status reported by the provider, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Api { status, .. } => Some(*status),
            ProviderError::Unauthorized => Some(401),
            _ => None,
        }
    }
}

/// Git-hosting client errors
///
/// Each variant is a failure kind callers branch on; the provider detail
/// rides along unmodified. A malformed document is a `Parse`, never a
/// `Read` - callers must be able to tell the two apart.
#[derive(Debug, Error)]
pub enum HostingError {
    #[error("an `oauth_token` or a configured access token is required")]
    MissingCredential,

    #[error("failed to read {path}: {source}")]
    Read { path: String, source: ProviderError },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("failed to write {path}: {source}")]
    Write { path: String, source: ProviderError },

    #[error("failed to open review request: {source}")]
    CreateReview { source: ProviderError },

    #[error("failed to resolve current user: {source}")]
    GetUser { source: ProviderError },

    #[error("invitation operation failed: {source}")]
    Invitation { source: ProviderError },
}

/// Mail provider errors
#[derive(Debug, Error)]
pub enum MailError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

/// Application layer errors - used by HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("hosting error: {0}")]
    Hosting(#[from] HostingError),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal server error: {0}")]
    Internal(String),
}

/// Error response body for JSON responses
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Hosting(e) => {
                tracing::error!("Hosting error: {}", e);
                match e {
                    HostingError::MissingCredential => {
                        (StatusCode::UNAUTHORIZED, "Missing credential", None)
                    }
                    HostingError::Read { source, .. } if source.status() == Some(404) => {
                        (StatusCode::NOT_FOUND, "File not found", None)
                    }
                    HostingError::Parse { message, .. } => (
                        StatusCode::BAD_REQUEST,
                        "Malformed document",
                        Some(message.clone()),
                    ),
                    HostingError::Read { source, .. }
                    | HostingError::Write { source, .. }
                    | HostingError::CreateReview { source }
                    | HostingError::GetUser { source }
                    | HostingError::Invitation { source } => {
                        let http_status = match source.status() {
                            Some(401) => StatusCode::UNAUTHORIZED,
                            Some(403) => StatusCode::FORBIDDEN,
                            Some(422) => StatusCode::UNPROCESSABLE_ENTITY,
                            _ => StatusCode::BAD_GATEWAY,
                        };
                        (http_status, "Git service error", Some(source.to_string()))
                    }
                }
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone()))
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            details,
        });

        (status, body).into_response()
    }
}
