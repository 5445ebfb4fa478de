//! # OBIS Reading Store
//!
//! Latest value per OBIS key plus the time it was last seen. A reading that
//! has not been refreshed within the validity window is invalidated (its
//! value becomes `None`) but keeps its timestamp, so repeated sweeps are
//! idempotent. Entries are never removed; the key space is bounded by the
//! meter's OBIS vocabulary.

use serde::Serialize;
use std::collections::HashMap;

/// Latest value of one OBIS key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    /// `None` once the reading went stale.
    pub value: Option<f64>,
    /// Monotonic milliseconds of the last update; 0 means never updated.
    pub updated_ms: u64,
}

#[derive(Debug, Default)]
pub struct ReadingStore {
    readings: HashMap<String, Reading>,
}

impl ReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a reading, refreshing its timestamp.
    pub fn set(&mut self, key: &str, value: f64, now_ms: u64) {
        let reading = Reading {
            value: Some(value),
            updated_ms: now_ms,
        };
        match self.readings.get_mut(key) {
            Some(entry) => *entry = reading,
            None => {
                self.readings.insert(key.to_string(), reading);
            }
        }
    }

    /// Invalidate every reading older than `validity_ms`. A window of 0
    /// disables the sweep. Returns the number of readings invalidated by
    /// this call.
    pub fn expire_stale(&mut self, now_ms: u64, validity_ms: u64) -> usize {
        if validity_ms == 0 {
            return 0;
        }
        let mut expired = 0;
        for reading in self.readings.values_mut() {
            if reading.updated_ms != 0
                && now_ms.saturating_sub(reading.updated_ms) > validity_ms
                && reading.value.is_some()
            {
                reading.value = None;
                expired += 1;
            }
        }
        expired
    }

    /// Current value of a key; `None` when stale or never seen.
    pub fn snapshot(&self, key: &str) -> Option<f64> {
        self.readings.get(key).and_then(|r| r.value)
    }

    pub fn get(&self, key: &str) -> Option<&Reading> {
        self.readings.get(key)
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// All readings sorted by key.
    pub fn entries(&self) -> Vec<(&str, &Reading)> {
        let mut entries: Vec<_> = self
            .readings
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_overwrite() {
        let mut store = ReadingStore::new();
        store.set("1-0:1.8.0", 1.0, 100);
        store.set("1-0:1.8.0", 2.0, 200);
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get("1-0:1.8.0"),
            Some(&Reading {
                value: Some(2.0),
                updated_ms: 200
            })
        );
    }

    #[test]
    fn test_snapshot_unknown_key_does_not_insert() {
        let store = ReadingStore::new();
        assert_eq!(store.snapshot("1-0:1.7.0"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_expire_stale_boundary() {
        let mut store = ReadingStore::new();
        store.set("a", 1.0, 1000);
        assert_eq!(store.expire_stale(2000, 1000), 0);
        assert_eq!(store.snapshot("a"), Some(1.0));
        assert_eq!(store.expire_stale(2001, 1000), 1);
        assert_eq!(store.snapshot("a"), None);
        assert_eq!(store.get("a").map(|r| r.updated_ms), Some(1000));
    }

    #[test]
    fn test_expire_disabled_with_zero_window() {
        let mut store = ReadingStore::new();
        store.set("a", 1.0, 1);
        assert_eq!(store.expire_stale(u64::MAX, 0), 0);
        assert_eq!(store.snapshot("a"), Some(1.0));
    }

    #[test]
    fn test_zero_timestamp_never_expires() {
        let mut store = ReadingStore::new();
        store.set("a", 1.0, 0);
        store.expire_stale(1_000_000, 10);
        assert_eq!(store.snapshot("a"), Some(1.0));
    }

    #[test]
    fn test_refresh_after_expiry_revives_reading() {
        let mut store = ReadingStore::new();
        store.set("a", 1.0, 10);
        store.expire_stale(100, 5);
        assert_eq!(store.snapshot("a"), None);
        store.set("a", 3.0, 120);
        assert_eq!(store.snapshot("a"), Some(3.0));
    }

    #[test]
    fn test_entries_sorted() {
        let mut store = ReadingStore::new();
        store.set("1-0:2.8.1", 2.0, 1);
        store.set("1-0:1.8.1", 1.0, 1);
        let keys: Vec<_> = store.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["1-0:1.8.1", "1-0:2.8.1"]);
    }
}
