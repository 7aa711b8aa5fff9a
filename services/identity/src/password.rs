//! Password hashing and verification using Argon2id.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Credential hashing errors.
#[derive(Error, Debug)]
pub enum PasswordError {
    /// The hashing primitive failed
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// A stored hash could not be parsed
    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),

    /// Cost parameters were rejected
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),
}

/// Hashes and verifies passwords. Cheap to clone, no I/O.
///
/// Clones share one count of verifications performed.
#[derive(Clone)]
pub struct CredentialVerifier {
    argon2: Argon2<'static>,
    verifications: Arc<AtomicU64>,
}

impl CredentialVerifier {
    /// Creates a verifier with explicit Argon2id cost parameters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` if Argon2 rejects the memory/iteration pair.
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            verifications: Arc::default(),
        })
    }

    /// Hashes a password with a fresh random salt.
    ///
    /// Returns a PHC-formatted string; two calls for the same password
    /// produce different outputs.
    ///
    /// # Errors
    ///
    /// Returns `Hashing` if the primitive fails.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    /// Checks a password against a stored hash.
    ///
    /// Parameters embedded in the stored hash are used, so hashes produced
    /// under an older cost setting still verify.
    ///
    /// # Errors
    ///
    /// Returns `MalformedHash` if the stored hash cannot be parsed.
    pub fn verify(&self, stored_hash: &str, password: &str) -> Result<bool, PasswordError> {
        self.verifications.fetch_add(1, Ordering::Relaxed);
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::MalformedHash(e.to_string())),
        }
    }

    /// Number of `verify` calls made through this verifier and its clones.
    #[must_use]
    pub fn verifications(&self) -> u64 {
        self.verifications.load(Ordering::Relaxed)
    }
}

impl Default for CredentialVerifier {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
            verifications: Arc::default(),
        }
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> CredentialVerifier {
        CredentialVerifier::with_cost(1024, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let verifier = fast();
        let hash = verifier.hash("correct horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verifier.verify(&hash, "correct horse").unwrap());
        assert!(!verifier.verify(&hash, "wrong horse").unwrap());
    }

    #[test]
    fn test_hash_is_salted() {
        let verifier = fast();
        assert_ne!(verifier.hash("same").unwrap(), verifier.hash("same").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        let result = fast().verify("not-a-phc-string", "anything");
        assert!(matches!(result, Err(PasswordError::MalformedHash(_))));
    }

    #[test]
    fn test_default_verifies_low_cost_hash() {
        let hash = fast().hash("pw").unwrap();
        assert!(CredentialVerifier::default().verify(&hash, "pw").unwrap());
    }

    #[test]
    fn test_clones_share_verification_count() {
        let verifier = fast();
        let clone = verifier.clone();
        let hash = verifier.hash("pw").unwrap();

        clone.verify(&hash, "pw").unwrap();
        let _ = verifier.verify("not-a-phc-string", "pw");

        assert_eq!(verifier.verifications(), 2);
    }

    #[test]
    fn test_invalid_cost_rejected() {
        assert!(matches!(
            CredentialVerifier::with_cost(1, 0),
            Err(PasswordError::InvalidParams(_))
        ));
    }
}
