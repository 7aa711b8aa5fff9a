//! Request and response bodies.

use crate::auth::{CreateUser, Session};
use serde::{Deserialize, Serialize};

/// `POST /user/register` and `POST /user/login` body.
#[derive(Clone, Deserialize)]
pub struct CredentialsRequest {
    /// Email
    pub email: String,
    /// Plaintext password
    pub password: String,
}

impl std::fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `POST /user/refresh` body. The token may come from a cookie instead.
#[derive(Clone, Default, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for RefreshRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshRequest").finish_non_exhaustive()
    }
}

/// `POST /admin/user` body.
#[derive(Clone, Deserialize)]
pub struct CreateUserRequest {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Email
    pub email: String,
    /// Age in years
    #[serde(default)]
    pub age: i32,
    /// Plaintext password
    pub password: String,
}

impl std::fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("age", &self.age)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl From<CreateUserRequest> for CreateUser {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            age: req.age,
            password: req.password,
        }
    }
}

/// `GET /admin/user?email=` query.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailQuery {
    /// Email to look up
    pub email: String,
}

/// Login and refresh response.
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Display name
    pub name: String,
    /// Email
    pub email: String,
    /// Access token
    pub access_token: String,
    /// Refresh token
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            name: session.user.name,
            email: session.user.email,
            access_token: session.tokens.access_token,
            refresh_token: session.tokens.refresh_token,
            expires_in: session.tokens.expires_in,
        }
    }
}

impl std::fmt::Debug for SessionResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionResponse")
            .field("email", &self.email)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message
    pub message: String,
}

/// `POST /admin/user` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    /// Assigned id
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let req: CredentialsRequest =
            serde_json::from_str(r#"{"email":"a@x.com","password":"hunter2"}"#).unwrap();
        let rendered = format!("{req:?}");
        assert!(rendered.contains("a@x.com"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_create_user_defaults_profile() {
        let req: CreateUserRequest =
            serde_json::from_str(r#"{"email":"a@x.com","password":"pw"}"#).unwrap();
        assert_eq!(req.name, "");
        assert_eq!(req.age, 0);
        assert!(!format!("{req:?}").contains("\"pw\""));
    }

    #[test]
    fn test_refresh_body_optional() {
        let req: RefreshRequest = serde_json::from_str("{}").unwrap();
        assert!(req.refresh_token.is_none());
    }
}
