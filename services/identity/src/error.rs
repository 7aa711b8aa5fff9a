//! Service error type and its HTTP and gRPC mappings.
//!
//! Internal details (storage messages, hashing failures) are logged and
//! never returned to clients.

use crate::jwt::TokenError;
use crate::password::PasswordError;
use crate::storage::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tonic::{Code, Status};
use tracing::error;

/// Errors surfaced by the auth service.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Request body failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Email is already registered
    #[error("User already exists: {0}")]
    AlreadyExists(String),

    /// No such user
    #[error("User not found")]
    NotFound,

    /// Password did not match
    #[error("Invalid credentials")]
    BadCredentials,

    /// Token verification or signing failed
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Password hashing failed or a stored hash is corrupt
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Storage backend failed
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::Conflict(detail) => Self::AlreadyExists(detail),
            StoreError::Backend(detail) => Self::Storage(detail),
        }
    }
}

impl AuthError {
    /// Collapses "no such user" into "bad credentials" so login responses
    /// do not reveal which emails are registered.
    #[must_use]
    pub fn conceal_credentials(self) -> Self {
        match self {
            Self::NotFound => Self::BadCredentials,
            other => other,
        }
    }

    /// Stable error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::Validation,
            Self::AlreadyExists(_) => ErrorCode::AlreadyExists,
            Self::NotFound => ErrorCode::NotFound,
            Self::BadCredentials => ErrorCode::InvalidCredentials,
            Self::Token(TokenError::Expired) => ErrorCode::TokenExpired,
            Self::Token(TokenError::Encoding(_)) | Self::Password(_) | Self::Storage(_) => {
                ErrorCode::Internal
            }
            Self::Token(_) => ErrorCode::Unauthenticated,
        }
    }

    /// Message safe to return to clients.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.code() {
            ErrorCode::Internal => "Internal server error".to_string(),
            ErrorCode::Unauthenticated => "Authentication required".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Error codes for HTTP/gRPC responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed request
    Validation,
    /// Duplicate email
    AlreadyExists,
    /// Unknown user
    NotFound,
    /// Login failed
    InvalidCredentials,
    /// Missing or invalid token
    Unauthenticated,
    /// Token needs refreshing
    TokenExpired,
    /// Anything the client cannot fix
    Internal,
}

impl ErrorCode {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::AlreadyExists => "already_exists",
            Self::NotFound => "not_found",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Unauthenticated => "unauthenticated",
            Self::TokenExpired => "token_expired",
            Self::Internal => "internal_error",
        }
    }

    /// HTTP status for this code.
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::AlreadyExists => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidCredentials | Self::Unauthenticated | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// gRPC status code for this code.
    #[must_use]
    pub const fn grpc_code(&self) -> Code {
        match self {
            Self::Validation => Code::InvalidArgument,
            Self::AlreadyExists => Code::AlreadyExists,
            Self::NotFound => Code::NotFound,
            Self::InvalidCredentials | Self::Unauthenticated | Self::TokenExpired => {
                Code::Unauthenticated
            }
            Self::Internal => Code::Internal,
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error code
    pub error: &'static str,
    /// Human-readable message
    pub message: String,
}

impl From<&AuthError> for ErrorBody {
    fn from(err: &AuthError) -> Self {
        Self {
            error: err.code().as_str(),
            message: err.public_message(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let code = self.code();
        if code == ErrorCode::Internal {
            error!(error = %self, "Request failed");
        }
        (code.http_status(), Json(ErrorBody::from(&self))).into_response()
    }
}

impl From<AuthError> for Status {
    fn from(err: AuthError) -> Self {
        let code = err.code();
        if code == ErrorCode::Internal {
            error!(error = %err, "RPC failed");
        }
        Self::new(code.grpc_code(), err.public_message())
    }
}
