//! Errors raised while issuing or verifying tokens.

use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use thiserror::Error;

/// Token issuance and verification errors.
///
/// `Expired` is kept apart from the other verification failures so callers
/// can tell "refresh and retry" from "not authenticated".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Signature does not match the configured secret
    #[error("Token signature is invalid")]
    InvalidSignature,

    /// Header names an algorithm other than the expected HMAC one
    #[error("Unexpected token algorithm: {0}")]
    UnexpectedAlgorithm(String),

    /// `exp` has been reached
    #[error("Token expired")]
    Expired,

    /// Not a JWT, or the claims do not match the expected layout
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// Valid token of the other kind
    #[error("Expected a {expected} token, got {actual}")]
    WrongTokenType {
        /// Kind the caller asked for
        expected: &'static str,
        /// Kind found in the claims
        actual: &'static str,
    },

    /// Signing failed
    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

impl TokenError {
    /// Stable label for metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::InvalidSignature => "invalid_signature",
            Self::UnexpectedAlgorithm(_) => "unexpected_algorithm",
            Self::Expired => "expired",
            Self::Malformed(_) => "malformed",
            Self::WrongTokenType { .. } => "wrong_token_type",
            Self::Encoding(_) => "encoding",
        }
    }
}

impl From<JwtError> for TokenError {
    fn from(err: JwtError) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::UnexpectedAlgorithm(err.to_string())
            }
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Malformed(err.to_string()),
        }
    }
}
