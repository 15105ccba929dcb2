//! Short-lived per-symbol result cache.
//!
//! Entries expire `ttl` after insertion. Expired entries are invisible to
//! [`AssessmentCache::get`] and are dropped by
//! [`AssessmentCache::purge_expired`].

use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug)]
pub struct AssessmentCache<V> {
    ttl: Duration,
    entries: FxHashMap<String, (Instant, V)>,
}

impl<V> Default for AssessmentCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<V> AssessmentCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: FxHashMap::default(),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&V> {
        self.get_at(symbol, Instant::now())
    }

    pub fn insert(&mut self, symbol: &str, value: V) {
        self.insert_at(symbol, value, Instant::now());
    }

    /// Drop expired entries, returning how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_at(&self, symbol: &str, now: Instant) -> Option<&V> {
        let (stored, value) = self.entries.get(&key(symbol))?;
        (now.saturating_duration_since(*stored) < self.ttl).then_some(value)
    }

    fn insert_at(&mut self, symbol: &str, value: V, now: Instant) {
        self.entries.insert(key(symbol), (now, value));
    }

    fn purge_expired_at(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, (stored, _)| now.saturating_duration_since(*stored) < ttl);
        before - self.entries.len()
    }
}

fn key(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_before_expiry_miss_after() {
        let mut cache = AssessmentCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.insert_at("btcusdt", 1u32, t0);
        assert_eq!(cache.get_at("BTCUSDT", t0 + Duration::from_secs(59)), Some(&1));
        assert_eq!(cache.get_at("BTCUSDT", t0 + Duration::from_secs(60)), None);
        assert_eq!(cache.get_at("ETHUSDT", t0), None);
    }

    #[test]
    fn insert_refreshes_timestamp() {
        let mut cache = AssessmentCache::new(Duration::from_secs(10));
        let t0 = Instant::now();
        cache.insert_at("SOL", "a", t0);
        cache.insert_at("SOL", "b", t0 + Duration::from_secs(8));
        assert_eq!(cache.get_at("SOL", t0 + Duration::from_secs(15)), Some(&"b"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn purge_drops_only_expired() {
        let mut cache = AssessmentCache::new(Duration::from_secs(10));
        let t0 = Instant::now();
        cache.insert_at("A", 1, t0);
        cache.insert_at("B", 2, t0 + Duration::from_secs(5));
        assert_eq!(cache.purge_expired_at(t0 + Duration::from_secs(12)), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at("B", t0 + Duration::from_secs(12)), Some(&2));
    }

    #[test]
    fn default_ttl_is_five_minutes() {
        let cache: AssessmentCache<()> = AssessmentCache::default();
        assert_eq!(cache.ttl, Duration::from_secs(300));
        assert!(cache.is_empty());
    }
}
