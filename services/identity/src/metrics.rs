//! Prometheus metrics for the identity service.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, CounterVec, Encoder, TextEncoder};

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "identity_tokens_issued_total",
        "Total number of tokens issued",
        &["token_type"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Register/login/refresh outcomes.
pub static AUTH_OUTCOMES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "identity_auth_outcomes_total",
        "Total number of authentication operations by result",
        &["operation", "result"]
    )
    .expect("Failed to register auth_outcomes metric")
});

/// User cache lookups.
pub static CACHE_LOOKUPS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "identity_user_cache_lookups_total",
        "Total number of user cache lookups",
        &["result"]
    )
    .expect("Failed to register cache_lookups metric")
});

/// Listener lifecycle transitions.
pub static LISTENER_TRANSITIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "identity_listener_transitions_total",
        "Total number of listener state transitions",
        &["listener", "state"]
    )
    .expect("Failed to register listener_transitions metric")
});

/// Record an auth operation result.
pub fn record_auth(operation: &str, result: &str) {
    AUTH_OUTCOMES.with_label_values(&[operation, result]).inc();
}

/// Record a cache lookup result (`hit`, `miss` or `error`).
pub fn record_cache_lookup(result: &str) {
    CACHE_LOOKUPS.with_label_values(&[result]).inc();
}

/// Renders every registered metric in the Prometheus text format.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn render() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_touched_metrics() {
        record_auth("login", "success");
        record_cache_lookup("miss");

        let text = render().unwrap();
        assert!(text.contains("identity_auth_outcomes_total"));
        assert!(text.contains("identity_user_cache_lookups_total"));
    }
}
