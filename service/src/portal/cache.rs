//! Bounded, time-expiring cache for live directory responses.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::types::{ApiResponse, Member};

/// Key of a cached response: the operation plus its normalized parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    operation: &'static str,
    params: String,
}

impl CacheKey {
    /// Build a key for free-text parameters. They are trimmed and
    /// lowercased so that `"Flett "` and `"flett"` share an entry.
    pub fn new(operation: &'static str, params: &[&str]) -> Self {
        let params: Vec<String> = params.iter().map(|p| p.trim().to_lowercase()).collect();
        Self::joined(operation, &params)
    }

    /// Build a key for identifiers that must match exactly.
    pub fn exact(operation: &'static str, params: &[&str]) -> Self {
        let params: Vec<String> = params.iter().map(|p| (*p).to_string()).collect();
        Self::joined(operation, &params)
    }

    fn joined(operation: &'static str, params: &[String]) -> Self {
        Self {
            operation,
            params: params.join("\u{1f}"),
        }
    }
}

/// A cached value of any directory response shape.
#[derive(Debug, Clone)]
pub enum CachedResponse {
    Members(ApiResponse<Vec<Member>>),
    Member(ApiResponse<Option<Member>>),
}

struct Entry {
    value: CachedResponse,
    inserted_at: Instant,
}

pub struct ResponseCache {
    ttl: Duration,
    max_entries: usize,
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl ResponseCache {
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a fresh entry; expired entries are dropped on read.
    pub fn get(&self, key: &CacheKey) -> Option<CachedResponse> {
        let mut entries = self.entries.lock().ok()?;
        let fresh = entries
            .get(key)
            .map(|entry| entry.inserted_at.elapsed() < self.ttl)?;
        if fresh {
            entries.get(key).map(|entry| entry.value.clone())
        } else {
            entries.remove(key);
            None
        }
    }

    /// Store a response, evicting expired entries first and then the
    /// oldest one when the cache is full.
    pub fn insert(&self, key: CacheKey, value: CachedResponse) {
        if self.max_entries == 0 {
            return;
        }
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            let ttl = self.ttl;
            entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);

            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, fresh or not.
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }
}
