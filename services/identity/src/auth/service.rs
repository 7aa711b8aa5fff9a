//! The auth service: credentials, sessions and user lookups over storage and cache.

use crate::error::AuthError;
use crate::jwt::{TokenIssuer, TokenPair};
use crate::metrics;
use crate::model::{NewUser, User, UserInfo};
use crate::password::{CredentialVerifier, PasswordError};
use crate::storage::{StoreError, UserCache, UserStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

/// Result of a successful login or refresh.
#[derive(Debug, Clone)]
pub struct Session {
    /// Authenticated user
    pub user: UserInfo,
    /// Freshly minted tokens
    pub tokens: TokenPair,
}

/// Fields accepted by the admin create operation.
#[derive(Clone)]
pub struct CreateUser {
    /// Display name
    pub name: String,
    /// Email
    pub email: String,
    /// Age in years
    pub age: i32,
    /// Plaintext password; hashed before storage
    pub password: String,
}

impl std::fmt::Debug for CreateUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("age", &self.age)
            .finish_non_exhaustive()
    }
}

/// Registration, login, token refresh and user lookups.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    cache: Arc<dyn UserCache>,
    verifier: CredentialVerifier,
    issuer: TokenIssuer,
    cache_ttl: Duration,
    /// Hash checked when the email is unknown, so both login failures cost one verification
    decoy_hash: Arc<OnceCell<String>>,
}

impl AuthService {
    /// Creates the service from its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn UserStore>,
        cache: Arc<dyn UserCache>,
        verifier: CredentialVerifier,
        issuer: TokenIssuer,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            verifier,
            issuer,
            cache_ttl,
            decoy_hash: Arc::default(),
        }
    }

    /// Token issuer, shared with the HTTP auth middleware.
    #[must_use]
    pub const fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Registers a new user with an empty profile. Issues no tokens.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty password or a malformed email
    /// - `AlreadyExists` if the email is taken
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let result = self.register_inner(email, password).await;
        record("register", &result);
        result
    }

    async fn register_inner(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let email = validate_credentials(email, password)?;

        match self.store.get_by_email(email).await {
            Ok(_) => return Err(AuthError::AlreadyExists(email.to_string())),
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let hash = self.hash(password).await?;
        let id = self.store.create(NewUser::registration(email, hash)).await?;

        info!(user_id = id, "User registered");
        Ok(())
    }

    /// Checks credentials and issues a token pair.
    ///
    /// `NotFound` and `BadCredentials` stay distinct here; protocol
    /// boundaries collapse them with [`AuthError::conceal_credentials`].
    ///
    /// # Errors
    ///
    /// - `Validation` for empty input
    /// - `NotFound` if no user has this email
    /// - `BadCredentials` if the password does not match
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let result = self.login_inner(email, password).await;
        record("login", &result);
        result
    }

    async fn login_inner(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "email and password are required".to_string(),
            ));
        }

        let user = match self.store.get_by_email(email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                let decoy = self.decoy_hash().await?;
                self.verify(decoy, password).await?;
                debug!("Unknown email");
                return Err(AuthError::NotFound);
            }
            Err(e) => return Err(e.into()),
        };

        if !self.verify(&user.password_hash, password).await? {
            debug!(user_id = user.id, "Password mismatch");
            return Err(AuthError::BadCredentials);
        }

        let tokens = self.issuer.issue_pair(&user)?;
        info!(user_id = user.id, "User logged in");

        Ok(Session {
            user: user.into(),
            tokens,
        })
    }

    /// Exchanges a refresh token for a new token pair.
    ///
    /// The user is re-read so profile changes show up in the new access
    /// token and deleted users cannot refresh.
    ///
    /// # Errors
    ///
    /// - `Token` if the token is invalid, expired or an access token
    /// - `NotFound` if the subject no longer exists
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let result = self.refresh_inner(refresh_token).await;
        record("refresh", &result);
        result
    }

    async fn refresh_inner(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let claims = self.issuer.verify_refresh(refresh_token)?;
        let user = self.store.get_by_id(claims.sub).await?;
        let tokens = self.issuer.issue_pair(&user)?;

        debug!(user_id = user.id, "Tokens refreshed");
        Ok(Session {
            user: user.into(),
            tokens,
        })
    }

    /// User by id.
    ///
    /// # Errors
    ///
    /// `NotFound` or `Storage`.
    pub async fn get_by_id(&self, id: i64) -> Result<User, AuthError> {
        Ok(self.store.get_by_id(id).await?)
    }

    /// Every user.
    ///
    /// # Errors
    ///
    /// `Storage` on backend failure.
    pub async fn list(&self) -> Result<Vec<User>, AuthError> {
        Ok(self.store.list().await?)
    }

    /// User by email, served from the cache when possible.
    ///
    /// Cache failures are logged and fall through to storage.
    ///
    /// # Errors
    ///
    /// `NotFound` or `Storage`.
    #[instrument(skip(self))]
    pub async fn get_by_email(&self, email: &str) -> Result<User, AuthError> {
        let email = email.trim();
        match self.cache.get(email).await {
            Ok(Some(user)) => {
                metrics::record_cache_lookup("hit");
                return Ok(user);
            }
            Ok(None) => metrics::record_cache_lookup("miss"),
            Err(e) => {
                metrics::record_cache_lookup("error");
                warn!(error = %e, "User cache read failed");
            }
        }

        let user = self.store.get_by_email(email).await?;

        if let Err(e) = self.cache.set(email, &user, self.cache_ttl).await {
            warn!(error = %e, "User cache write failed");
        }

        Ok(user)
    }

    /// Creates a user with a full profile and returns its id.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty password or a malformed email
    /// - `AlreadyExists` if the email is taken
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create(&self, input: CreateUser) -> Result<i64, AuthError> {
        let email = validate_credentials(&input.email, &input.password)?.to_string();
        if input.age < 0 {
            return Err(AuthError::Validation("age must not be negative".to_string()));
        }

        let password_hash = self.hash(&input.password).await?;
        let id = self
            .store
            .create(NewUser {
                name: input.name,
                email,
                age: input.age,
                password_hash,
            })
            .await?;

        info!(user_id = id, "User created");
        Ok(id)
    }

    /// Computed once at the configured cost. The verification result is discarded.
    async fn decoy_hash(&self) -> Result<&str, AuthError> {
        let hash = self
            .decoy_hash
            .get_or_try_init(|| self.hash("decoy-password"))
            .await?;
        Ok(hash.as_str())
    }

    async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let verifier = self.verifier.clone();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || verifier.hash(&password))
            .await
            .map_err(|e| PasswordError::Hashing(e.to_string()))?
            .map_err(AuthError::from)
    }

    async fn verify(&self, hash: &str, password: &str) -> Result<bool, AuthError> {
        let verifier = self.verifier.clone();
        let hash = hash.to_string();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || verifier.verify(&hash, &password))
            .await
            .map_err(|e| PasswordError::Hashing(e.to_string()))?
            .map_err(AuthError::from)
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("issuer", &self.issuer)
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}

/// Returns the email with surrounding whitespace removed.
fn validate_credentials<'a>(email: &'a str, password: &str) -> Result<&'a str, AuthError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::Validation(
            "email and password are required".to_string(),
        ));
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AuthError::Validation(format!("invalid email: {email}"))),
    }
}

fn record<T>(operation: &str, result: &Result<T, AuthError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(e) => e.code().as_str(),
    };
    metrics::record_auth(operation, outcome);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_credentials() {
        assert!(validate_credentials("a@x.com", "pw").is_ok());
        assert!(validate_credentials("", "pw").is_err());
        assert!(validate_credentials("a@x.com", "").is_err());
        assert!(validate_credentials("no-at-sign", "pw").is_err());
        assert!(validate_credentials("@x.com", "pw").is_err());
        assert!(validate_credentials("a@", "pw").is_err());
        assert_eq!(validate_credentials("  a@x.com\t", "pw").unwrap(), "a@x.com");
    }

    #[test]
    fn test_create_user_debug_hides_password() {
        let input = CreateUser {
            name: "Ada".into(),
            email: "a@x.com".into(),
            age: 1,
            password: "hunter2".into(),
        };
        assert!(!format!("{input:?}").contains("hunter2"));
    }
}
