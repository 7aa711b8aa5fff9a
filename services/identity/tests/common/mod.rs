//! Shared fixtures for integration tests.

#![allow(dead_code)]

use identity_service::jwt::{ManualClock, TokenIssuer};
use identity_service::password::CredentialVerifier;
use identity_service::storage::{MemoryUserCache, MemoryUserStore, UserCache, UserStore};
use identity_service::AuthService;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const NOW: i64 = 1_700_000_000;
pub const ACCESS_TTL: Duration = Duration::from_secs(900);
pub const REFRESH_TTL: Duration = Duration::from_secs(1800);

pub fn secret() -> SecretString {
    SecretString::from(SECRET.to_string())
}

/// Argon2id with minimal cost so tests stay fast.
pub fn fast_verifier() -> CredentialVerifier {
    CredentialVerifier::with_cost(1024, 1).unwrap()
}

pub fn issuer(clock: Arc<ManualClock>) -> TokenIssuer {
    TokenIssuer::with_clock(&secret(), ACCESS_TTL, REFRESH_TTL, clock)
}

pub fn service_with(
    store: Arc<dyn UserStore>,
    cache: Arc<dyn UserCache>,
    clock: Arc<ManualClock>,
) -> AuthService {
    AuthService::new(
        store,
        cache,
        fast_verifier(),
        issuer(clock),
        Duration::from_secs(300),
    )
}

/// Service over fresh in-memory collaborators. The store handle is
/// returned so tests can manipulate it directly.
pub fn memory_service() -> (AuthService, MemoryUserStore, Arc<ManualClock>) {
    let store = MemoryUserStore::new();
    let clock = Arc::new(ManualClock::at(NOW));
    let service = service_with(
        Arc::new(store.clone()),
        Arc::new(MemoryUserCache::default()),
        clock.clone(),
    );
    (service, store, clock)
}
