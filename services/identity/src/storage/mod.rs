//! User storage and cache collaborators.
//!
//! The auth service only sees the [`UserStore`] and [`UserCache`] traits;
//! which implementation backs them is decided once at startup from
//! configuration.

pub mod cache;
pub mod memory;
pub mod postgres;

pub use cache::{CacheError, MemoryUserCache, RedisUserCache, UserCache};
pub use memory::MemoryUserStore;
pub use postgres::PostgresUserStore;

use crate::model::{NewUser, User};
use async_trait::async_trait;
use thiserror::Error;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No row matched
    #[error("User not found")]
    NotFound,

    /// Uniqueness violated on insert
    #[error("User already exists: {0}")]
    Conflict(String),

    /// Driver or connection failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(db.message().to_string())
            }
            other => Self::Backend(other.to_string()),
        }
    }
}

/// Relational user storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Every stored user, ordered by id.
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    /// User by id, `NotFound` if absent.
    async fn get_by_id(&self, id: i64) -> Result<User, StoreError>;

    /// User by email, `NotFound` if absent.
    async fn get_by_email(&self, email: &str) -> Result<User, StoreError>;

    /// Inserts a user and returns the assigned id. `Conflict` if the email
    /// is taken.
    async fn create(&self, user: NewUser) -> Result<i64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::NotFound
        ));
    }

    #[test]
    fn test_pool_errors_map_to_backend() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Backend(_)
        ));
    }
}
