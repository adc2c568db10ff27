//! Response cache keyed by request URL.
//!
//! An explicit collaborator passed into the fetch layer — not ambient
//! state — so callers control sharing and lifetime. Entries carry the
//! instant they were stored; freshness is judged against the max-age the
//! caller supplies per lookup, which lets one cache serve widgets with
//! different refresh policies.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;

struct CacheEntry {
    value: Value,
    stored_at: Instant,
}

/// URL-keyed response cache with caller-supplied freshness windows.
#[derive(Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached response for `url` when it is younger than
    /// `max_age`. A zero max-age always misses, which is how connection
    /// tests bypass the cache.
    pub fn get(&self, url: &str, max_age: Duration) -> Option<Value> {
        let entries = self.entries.lock().expect("cache lock poisoned");
        let entry = entries.get(url)?;
        if entry.stored_at.elapsed() < max_age {
            return Some(entry.value.clone());
        }
        None
    }

    /// Store a fresh response for `url`, replacing any previous entry.
    pub fn insert(&self, url: &str, value: Value) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(
            url.to_string(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop the entry for one URL.
    pub fn invalidate(&self, url: &str) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.remove(url);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://example.com/quote";

    #[test]
    fn fresh_entries_hit_within_max_age() {
        let cache = ResponseCache::new();
        cache.insert(URL, json!({"price": 1}));
        assert_eq!(cache.get(URL, Duration::from_secs(60)), Some(json!({"price": 1})));
    }

    #[test]
    fn zero_max_age_always_misses() {
        let cache = ResponseCache::new();
        cache.insert(URL, json!(1));
        assert_eq!(cache.get(URL, Duration::ZERO), None);
    }

    #[test]
    fn unknown_urls_miss() {
        let cache = ResponseCache::new();
        assert_eq!(cache.get(URL, Duration::from_secs(60)), None);
    }

    #[test]
    fn invalidate_and_clear_drop_entries() {
        let cache = ResponseCache::new();
        cache.insert(URL, json!(1));
        cache.insert("https://example.com/other", json!(2));

        cache.invalidate(URL);
        assert_eq!(cache.get(URL, Duration::from_secs(60)), None);
        assert!(cache.get("https://example.com/other", Duration::from_secs(60)).is_some());

        cache.clear();
        assert_eq!(cache.get("https://example.com/other", Duration::from_secs(60)), None);
    }

    #[test]
    fn insert_replaces_previous_entry() {
        let cache = ResponseCache::new();
        cache.insert(URL, json!(1));
        cache.insert(URL, json!(2));
        assert_eq!(cache.get(URL, Duration::from_secs(60)), Some(json!(2)));
    }
}
