//! In-process hot tier with per-entry TTLs.
//!
//! The cache is strictly subordinate to the metadata index and blob store:
//! writers populate it only after the durable stores commit, and deleters
//! invalidate it first. Contents are stored verbatim.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// TTL applied when callers pass a zero duration.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

const KEY_PREFIX: &str = "paste:";

struct Entry {
    content: String,
    expires_at: Instant,
}

pub struct Cache {
    entries: RwLock<HashMap<String, Entry>>,
    default_ttl: Duration,
}

impl Cache {
    pub fn new() -> Self {
        Self::with_default_ttl(DEFAULT_CACHE_TTL)
    }

    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store content under the namespaced key. A zero TTL falls back to the
    /// default.
    pub fn set(&self, short_id: &str, content: &str, ttl: Duration) {
        let ttl = if ttl.is_zero() { self.default_ttl } else { ttl };
        let entry = Entry {
            content: content.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().insert(build_key(short_id), entry);
    }

    /// Fetch content if present and not yet expired. Expired entries are
    /// dropped on access.
    pub fn get(&self, short_id: &str) -> Option<String> {
        let key = build_key(short_id);
        {
            let entries = self.entries.read();
            match entries.get(&key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.content.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        self.entries.write().remove(&key);
        None
    }

    pub fn delete(&self, short_id: &str) {
        self.entries.write().remove(&build_key(short_id));
    }

    pub fn exists(&self, short_id: &str) -> bool {
        self.ttl(short_id).is_some()
    }

    /// Remaining TTL for a live entry.
    pub fn ttl(&self, short_id: &str) -> Option<Duration> {
        let entries = self.entries.read();
        let entry = entries.get(&build_key(short_id))?;
        entry.expires_at.checked_duration_since(Instant::now())
    }

    /// Update the TTL of an existing entry without touching its value.
    /// Returns false when the entry is missing or already expired.
    pub fn refresh(&self, short_id: &str, ttl: Duration) -> bool {
        let ttl = if ttl.is_zero() { self.default_ttl } else { ttl };
        let mut entries = self.entries.write();
        match entries.get_mut(&build_key(short_id)) {
            Some(entry) if entry.expires_at > Instant::now() => {
                entry.expires_at = Instant::now() + ttl;
                true
            }
            _ => false,
        }
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

fn build_key(short_id: &str) -> String {
    format!("{}{}", KEY_PREFIX, short_id)
}
