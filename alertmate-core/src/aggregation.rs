//! Per-source notification counts
//!
//! Counts are lifetime arrival counters: every accepted capture adds one and
//! nothing ever subtracts. They live in memory only.

use std::collections::BTreeMap;

use crate::observable::{Observable, Subscription};

/// Snapshot of source identifier to arrival count
pub type Counts = BTreeMap<String, u64>;

/// Observable map of per-source counts.
///
/// Increments are applied under the observable's write lock, so concurrent
/// captures never lose updates and snapshots never see a half-applied one.
#[derive(Debug, Default)]
pub struct AggregationStore {
    counts: Observable<Counts>,
}

impl AggregationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one to the count for `source_id`, starting from zero
    pub fn increment(&self, source_id: &str) {
        self.counts.update(|counts| {
            // avoid allocating a key for sources we've already seen
            match counts.get_mut(source_id) {
                Some(count) => *count += 1,
                None => {
                    counts.insert(source_id.to_string(), 1);
                }
            }
        });
    }

    /// Immutable point-in-time copy of every count
    pub fn snapshot(&self) -> Counts {
        self.counts.get()
    }

    /// Count for one source (0 if never seen)
    pub fn count(&self, source_id: &str) -> u64 {
        self.snapshot().get(source_id).copied().unwrap_or(0)
    }

    /// Sum across all sources
    pub fn total(&self) -> u64 {
        self.snapshot().values().sum()
    }

    /// Stream the current counts, then the latest counts after each increment
    pub fn subscribe(&self) -> Subscription<Counts> {
        self.counts.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_increment_from_zero() {
        let store = AggregationStore::new();
        assert!(store.snapshot().is_empty());
        assert_eq!(store.count("app.a"), 0);

        store.increment("app.a");
        store.increment("app.a");
        store.increment("app.b");

        assert_eq!(store.count("app.a"), 2);
        assert_eq!(store.count("app.b"), 1);
        assert_eq!(store.total(), 3);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_increments() {
        let store = AggregationStore::new();
        store.increment("app.a");

        let before = store.snapshot();
        store.increment("app.a");

        assert_eq!(before.get("app.a"), Some(&1));
        assert_eq!(store.count("app.a"), 2);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(AggregationStore::new());

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    for _ in 0..125 {
                        store.increment("app.hot");
                    }
                });
            }
        });

        assert_eq!(store.count("app.hot"), 1000);
    }

    #[tokio::test]
    async fn test_subscriber_sees_current_then_updates() {
        let store = AggregationStore::new();
        store.increment("app.a");

        let mut sub = store.subscribe();
        let first = sub.next().await.unwrap();
        assert_eq!(first.get("app.a"), Some(&1));

        store.increment("app.b");
        let second = sub.next().await.unwrap();
        assert_eq!(second.get("app.a"), Some(&1));
        assert_eq!(second.get("app.b"), Some(&1));
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_final_state() {
        let store = AggregationStore::new();
        for _ in 0..3 {
            store.increment("app.a");
        }

        let mut late = store.subscribe();
        assert_eq!(late.next().await.unwrap().get("app.a"), Some(&3));
    }
}
