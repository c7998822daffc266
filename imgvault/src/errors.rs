use crate::auth::AuthError;
use crate::storage::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

/// Body returned for both kinds of authorization failure.
pub const UNAUTHORIZED_MESSAGE: &str = "Upload not authorized";

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data: malformed multipart, missing or duplicated fields
    #[error("{message}")]
    BadRequest { message: String },

    /// Request body exceeds the upload cap
    #[error("Request body exceeds maximum upload size of {max_size} bytes")]
    PayloadTooLarge { max_size: usize },

    /// Content sniffed as something other than an accepted image format
    #[error("Unsupported file format ({detected}); only image/jpeg and image/png are accepted")]
    UnsupportedMediaType { detected: String },

    /// Credentials could not be decoded, or were rejected
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Filesystem failure while placing a file
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Oversized bodies are reported as a plain client error
            Error::BadRequest { .. } | Error::PayloadTooLarge { .. } | Error::UnsupportedMediaType { .. } => StatusCode::BAD_REQUEST,
            Error::Auth(auth_err) if auth_err.is_unauthorized() => StatusCode::UNAUTHORIZED,
            Error::Auth(_) => StatusCode::BAD_REQUEST,
            Error::Storage(_) | Error::Internal { .. } | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { .. } | Error::PayloadTooLarge { .. } | Error::UnsupportedMediaType { .. } => self.to_string(),
            Error::Auth(auth_err) if auth_err.is_unauthorized() => UNAUTHORIZED_MESSAGE.to_string(),
            Error::Auth(auth_err) => auth_err.to_string(),
            Error::Storage(_) | Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Storage(_) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Auth(auth_err) if auth_err.is_unauthorized() => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::PayloadTooLarge { .. } | Error::UnsupportedMediaType { .. } | Error::Auth(_) => {
                tracing::debug!("Client error: {}", self);
            }
        }

        (self.status_code(), self.user_message()).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
