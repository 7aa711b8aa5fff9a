//! User identity types shared by storage, the auth service and both
//! protocol boundaries.

use serde::{Deserialize, Serialize};

/// Stored user identity.
///
/// Carries the password hash, so it is never serialized to clients; use
/// [`UserInfo`] on the wire. The cache stores it as JSON, which is why it
/// still derives `Serialize`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Storage-assigned identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Unique login key
    pub email: String,
    /// Age in years
    pub age: i32,
    /// PHC-formatted password hash
    pub password_hash: String,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("age", &self.age)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Identity to be inserted; the id is assigned by storage.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Display name
    pub name: String,
    /// Unique login key
    pub email: String,
    /// Age in years
    pub age: i32,
    /// PHC-formatted password hash
    pub password_hash: String,
}

impl NewUser {
    /// Identity created by self-registration: zero-value profile fields.
    #[must_use]
    pub fn registration(email: impl Into<String>, password_hash: String) -> Self {
        Self {
            name: String::new(),
            email: email.into(),
            age: 0,
            password_hash,
        }
    }

    /// Attaches the storage-assigned id.
    #[must_use]
    pub fn with_id(self, id: i64) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            age: self.age,
            password_hash: self.password_hash,
        }
    }
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("age", &self.age)
            .finish_non_exhaustive()
    }
}

/// Public projection of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Email
    pub email: String,
    /// Age in years
    pub age: i32,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            age: user.age,
        }
    }
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            age: user.age,
        }
    }
}
