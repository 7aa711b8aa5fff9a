//! Property-based tests for rust-common crate.
//!
//! These tests verify universal properties across all inputs using proptest.

use proptest::prelude::*;
use rust_common::{ShutdownTrigger, TtlCache, TtlCacheConfig};
use std::time::Duration;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Only the first of any number of trigger calls performs the transition.
    #[test]
    fn prop_shutdown_fires_exactly_once(calls in 1usize..20) {
        let trigger = ShutdownTrigger::new();
        let transitions = (0..calls)
            .filter(|i| trigger.trigger(&format!("call-{i}")))
            .count();

        prop_assert_eq!(transitions, 1);
        prop_assert!(trigger.is_triggered());
    }

    /// Every subscriber, whenever it subscribed, observes the fired signal.
    #[test]
    fn prop_every_subscriber_observes_signal(before in 0usize..8, after in 0usize..8) {
        let trigger = ShutdownTrigger::new();
        let mut signals: Vec<_> = (0..before).map(|_| trigger.subscribe()).collect();
        trigger.trigger("test");
        signals.extend((0..after).map(|_| trigger.subscribe()));

        for signal in &signals {
            prop_assert!(signal.is_shutdown());
        }
    }

    /// The last write for a key wins and other keys are unaffected.
    #[test]
    fn prop_cache_last_write_wins(
        key in "[a-z]{1,12}",
        other in "[A-Z]{1,12}",
        values in prop::collection::vec(any::<u32>(), 1..10),
    ) {
        let rt = runtime();
        rt.block_on(async {
            let cache = TtlCache::new(TtlCacheConfig::default());
            for v in &values {
                cache.set(&key, *v, Some(Duration::from_secs(60))).await;
            }

            assert_eq!(cache.get(&key).await, values.last().copied());
            assert_eq!(cache.get(&other).await, None);
        });
    }
}
