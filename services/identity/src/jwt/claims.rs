//! Claim sets for access and refresh tokens.
//!
//! Both kinds share one tagged, versioned envelope so a token of the wrong
//! kind fails to decode into the expected variant instead of silently
//! missing keys.

use crate::model::User;
use serde::{Deserialize, Serialize};

/// Current claim layout version.
pub const CLAIMS_VERSION: u8 = 1;

/// Which kind of token a claim set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived resource access
    Access,
    /// Longer-lived, only exchanges for a new pair
    Refresh,
}

impl TokenKind {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// Access token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id
    pub sub: i64,
    /// User email
    pub email: String,
    /// User display name
    pub name: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expires at (Unix seconds)
    pub exp: i64,
    /// Layout version
    pub ver: u8,
}

impl AccessClaims {
    /// Builds claims for `user` valid for `ttl_seconds` from `now`.
    #[must_use]
    pub fn new(user: &User, now: i64, ttl_seconds: i64) -> Self {
        Self {
            sub: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            iat: now,
            exp: now.saturating_add(ttl_seconds),
            ver: CLAIMS_VERSION,
        }
    }
}

/// Refresh token claims. Deliberately carries only the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// User id
    pub sub: i64,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expires at (Unix seconds)
    pub exp: i64,
    /// Layout version
    pub ver: u8,
}

impl RefreshClaims {
    /// Builds claims for `user_id` valid for `ttl_seconds` from `now`.
    #[must_use]
    pub const fn new(user_id: i64, now: i64, ttl_seconds: i64) -> Self {
        Self {
            sub: user_id,
            iat: now,
            exp: now.saturating_add(ttl_seconds),
            ver: CLAIMS_VERSION,
        }
    }
}

/// Signed token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "typ", rename_all = "snake_case")]
pub enum Claims {
    /// Access token payload
    Access(AccessClaims),
    /// Refresh token payload
    Refresh(RefreshClaims),
}

impl Claims {
    /// Kind of token.
    #[must_use]
    pub const fn kind(&self) -> TokenKind {
        match self {
            Self::Access(_) => TokenKind::Access,
            Self::Refresh(_) => TokenKind::Refresh,
        }
    }

    /// Subject user id.
    #[must_use]
    pub const fn subject(&self) -> i64 {
        match self {
            Self::Access(c) => c.sub,
            Self::Refresh(c) => c.sub,
        }
    }

    /// Expiry (Unix seconds).
    #[must_use]
    pub const fn expires_at(&self) -> i64 {
        match self {
            Self::Access(c) => c.exp,
            Self::Refresh(c) => c.exp,
        }
    }

    /// Layout version.
    #[must_use]
    pub const fn version(&self) -> u8 {
        match self {
            Self::Access(c) => c.ver,
            Self::Refresh(c) => c.ver,
        }
    }

    /// Whether the claims are expired at `now`.
    #[must_use]
    pub const fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at()
    }
}
