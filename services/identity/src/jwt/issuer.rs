//! HS256 token minting and verification.

use super::claims::{AccessClaims, Claims, RefreshClaims, TokenKind};
use super::clock::{Clock, SystemClock};
use super::error::TokenError;
use crate::metrics;
use crate::model::User;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// The only accepted signing algorithm.
pub const ALGORITHM: Algorithm = Algorithm::HS256;

/// Access and refresh token minted together.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    /// Short-lived access token
    pub access_token: String,
    /// Refresh token
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// Mints and verifies signed tokens with a single shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    /// Creates an issuer reading time from the system clock.
    #[must_use]
    pub fn new(secret: &SecretString, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self::with_clock(secret, access_ttl, refresh_ttl, Arc::new(SystemClock))
    }

    /// Creates an issuer with an explicit time source.
    #[must_use]
    pub fn with_clock(
        secret: &SecretString,
        access_ttl: Duration,
        refresh_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            access_ttl,
            refresh_ttl,
            clock,
        }
    }

    /// Access token lifetime.
    #[must_use]
    pub const fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Refresh token lifetime.
    #[must_use]
    pub const fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Mints an access token carrying the user's id, email and name.
    ///
    /// # Errors
    ///
    /// Returns `Encoding` if signing fails.
    pub fn issue_access_token(&self, user: &User) -> Result<String, TokenError> {
        let claims = AccessClaims::new(user, self.clock.timestamp(), ttl_seconds(self.access_ttl));
        self.sign(&Claims::Access(claims))
    }

    /// Mints a refresh token carrying only the user's id.
    ///
    /// # Errors
    ///
    /// Returns `Encoding` if signing fails.
    pub fn issue_refresh_token(&self, user: &User) -> Result<String, TokenError> {
        let claims =
            RefreshClaims::new(user.id, self.clock.timestamp(), ttl_seconds(self.refresh_ttl));
        self.sign(&Claims::Refresh(claims))
    }

    /// Mints both tokens for `user`.
    ///
    /// # Errors
    ///
    /// Returns `Encoding` if signing fails.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user)?,
            refresh_token: self.issue_refresh_token(user)?,
            expires_in: self.access_ttl.as_secs(),
        })
    }

    /// Verifies algorithm, signature and expiry, returning the claims.
    ///
    /// # Errors
    ///
    /// - `UnexpectedAlgorithm` if the header names anything but HS256
    /// - `InvalidSignature` if the token was signed with another secret
    /// - `Expired` once the clock has reached `exp`
    /// - `Malformed` for anything that is not a token of this service
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let header = decode_header(token)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::UnexpectedAlgorithm(format!("{:?}", header.alg)));
        }

        // Expiry is checked against the injected clock below.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)?.claims;

        if claims.is_expired_at(self.clock.timestamp()) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Verifies a token and requires it to be an access token.
    ///
    /// # Errors
    ///
    /// As [`Self::verify`], plus `WrongTokenType` for a refresh token.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        match self.verify(token)? {
            Claims::Access(claims) => Ok(claims),
            other => Err(wrong_type(TokenKind::Access, &other)),
        }
    }

    /// Verifies a token and requires it to be a refresh token.
    ///
    /// # Errors
    ///
    /// As [`Self::verify`], plus `WrongTokenType` for an access token.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        match self.verify(token)? {
            Claims::Refresh(claims) => Ok(claims),
            other => Err(wrong_type(TokenKind::Refresh, &other)),
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let token = encode(&Header::new(ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        metrics::TOKENS_ISSUED
            .with_label_values(&[claims.kind().as_str()])
            .inc();

        Ok(token)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

fn wrong_type(expected: TokenKind, actual: &Claims) -> TokenError {
    TokenError::WrongTokenType {
        expected: expected.as_str(),
        actual: actual.kind().as_str(),
    }
}

fn ttl_seconds(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::clock::ManualClock;
    use crate::model::NewUser;

    const SECRET: &str = "unit-test-secret-that-is-long-enough!";

    fn user() -> User {
        NewUser {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            age: 36,
            password_hash: "h".to_string(),
        }
        .with_id(7)
    }

    fn issuer(clock: Arc<ManualClock>) -> TokenIssuer {
        TokenIssuer::with_clock(
            &SecretString::from(SECRET.to_string()),
            Duration::from_secs(900),
            Duration::from_secs(1800),
            clock,
        )
    }

    #[test]
    fn test_access_token_round_trip() {
        let clock = Arc::new(ManualClock::at(1_700_000_000));
        let issuer = issuer(clock);

        let token = issuer.issue_access_token(&user()).unwrap();
        let claims = issuer.verify_access(&token).unwrap();

        assert_eq!(claims.sub, 7);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.name, "Ada");
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_expired_at_exact_exp() {
        let clock = Arc::new(ManualClock::at(1_700_000_000));
        let issuer = issuer(clock.clone());
        let token = issuer.issue_access_token(&user()).unwrap();

        clock.advance(899);
        assert!(issuer.verify(&token).is_ok());

        clock.advance(1);
        assert_eq!(issuer.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_refresh_not_accepted_as_access() {
        let issuer = issuer(Arc::new(ManualClock::at(1_700_000_000)));
        let pair = issuer.issue_pair(&user()).unwrap();

        assert!(matches!(
            issuer.verify_access(&pair.refresh_token),
            Err(TokenError::WrongTokenType { expected: "access", actual: "refresh" })
        ));
        assert!(matches!(
            issuer.verify_refresh(&pair.access_token),
            Err(TokenError::WrongTokenType { expected: "refresh", actual: "access" })
        ));
        assert_eq!(pair.expires_in, 900);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let issuer = issuer(Arc::new(ManualClock::at(0)));
        assert!(matches!(issuer.verify("not.a.jwt"), Err(TokenError::Malformed(_))));
        assert!(matches!(issuer.verify(""), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_debug_hides_tokens() {
        let issuer = issuer(Arc::new(ManualClock::at(1_700_000_000)));
        let pair = issuer.issue_pair(&user()).unwrap();
        let rendered = format!("{pair:?}");
        assert!(!rendered.contains(&pair.access_token));
    }
}
