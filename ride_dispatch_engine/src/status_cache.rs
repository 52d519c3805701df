//! A small in-process key→bytes cache with per-entry expiry.
//!
//! This is an accelerator for the current-ride-status hot path, never a source of truth. Every read falls back to
//! storage on a miss, and every write is best-effort: the system stays correct (only slower) with the cache absent.
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;

/// Default time-to-live of a cache entry.
pub const DEFAULT_STATUS_TTL: Duration = Duration::from_secs(10);

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// A clonable handle to a shared TTL cache. Clones share the same underlying store.
#[derive(Clone)]
pub struct StatusCache {
    ttl: Duration,
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_TTL)
    }
}

impl StatusCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// The cache key for the latest status of a ride.
    pub fn ride_status_key(ride_id: &str) -> String {
        format!("latest.ride.{ride_id}")
    }

    /// Fetches a live entry. Expired entries are evicted on access.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            },
            None => None,
        }
    }

    /// Inserts or refreshes an entry with the cache's TTL.
    pub fn set(&self, key: &str, value: Vec<u8>) {
        let entry = Entry { value, expires_at: Instant::now() + self.ttl };
        self.entries.lock().insert(key.to_string(), entry);
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn set_then_get() {
        let cache = StatusCache::new(Duration::from_secs(10));
        cache.set("k", b"MATCHING".to_vec());
        assert_eq!(cache.get("k"), Some(b"MATCHING".to_vec()));
    }

    #[test]
    fn entries_expire() {
        let cache = StatusCache::new(Duration::from_millis(0));
        cache.set("k", b"MATCHING".to_vec());
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn set_refreshes_an_existing_entry() {
        let cache = StatusCache::new(Duration::from_secs(10));
        cache.set("k", b"MATCHING".to_vec());
        cache.set("k", b"ENROUTE".to_vec());
        assert_eq!(cache.get("k"), Some(b"ENROUTE".to_vec()));
    }

    #[test]
    fn invalidate_removes_the_entry() {
        let cache = StatusCache::new(Duration::from_secs(10));
        cache.set("k", b"PICKUP".to_vec());
        cache.invalidate("k");
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn clones_share_the_store() {
        let cache = StatusCache::new(Duration::from_secs(10));
        let clone = cache.clone();
        cache.set("k", b"ARRIVED".to_vec());
        assert_eq!(clone.get("k"), Some(b"ARRIVED".to_vec()));
    }
}
