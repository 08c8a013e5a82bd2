//! Read-through cache for zone snapshots.
//!
//! The client only talks to [`ZoneCache`]; [`MemoryCache`] is the bundled bounded
//! in-process store.
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Instant;

const BYTES_PER_MB: usize = 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("entry of {required} bytes does not fit in a cache of {capacity} bytes")]
    Capacity { capacity: usize, required: usize },
}

/// Byte store keyed by zone name. A miss is never an error.
#[async_trait]
pub trait ZoneCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store `value` for `ttl`; a zero `ttl` keeps the entry until it is evicted.
    /// Fails when the cache can never hold the entry.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;
}

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>, // None: no expiry
}

impl Entry {
    fn size(&self, key: &str) -> usize {
        key.len() + self.value.len()
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

#[derive(Default)]
struct Entries {
    map: HashMap<String, Entry>,
    used: usize,
}

impl Entries {
    fn remove(&mut self, key: &str) {
        if let Some(entry) = self.map.remove(key) {
            self.used -= entry.size(key);
        }
    }

    fn purge_expired(&mut self, now: Instant) {
        let expired: Vec<String> = self
            .map
            .iter()
            .filter(|(_, entry)| !entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            self.remove(&key);
        }
    }

    /// Drop the entry that would expire first; entries without expiry go last.
    fn evict_one(&mut self) -> bool {
        let victim = self
            .map
            .iter()
            .min_by_key(|(_, entry)| (entry.expires_at.is_none(), entry.expires_at))
            .map(|(key, _)| key.clone());
        match victim {
            Some(key) => {
                self.remove(&key);
                true
            }
            None => false,
        }
    }
}

/// Bounded in-memory cache with a per-entry TTL.
///
/// Capacity is counted as key plus value bytes and fixed at construction. When full,
/// expired entries go first, then the ones closest to expiry.
pub struct MemoryCache {
    capacity: usize,
    entries: Mutex<Entries>,
}

impl MemoryCache {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity: capacity_bytes,
            entries: Mutex::new(Entries::default()),
        }
    }

    pub fn with_megabytes(megabytes: usize) -> Self {
        Self::new(megabytes.saturating_mul(BYTES_PER_MB))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live and not yet purged entries.
    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // entries stay consistent even if a holder panicked; keep serving
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ZoneCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        let mut entries = self.lock();
        match entries.map.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let required = key.len() + value.len();
        if required > self.capacity {
            return Err(CacheError::Capacity {
                capacity: self.capacity,
                required,
            });
        }

        let now = Instant::now();
        let mut entries = self.lock();
        entries.remove(key);
        entries.purge_expired(now);
        while entries.used + required > self.capacity {
            if !entries.evict_one() {
                break;
            }
        }

        entries.used += required;
        entries.map.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: (!ttl.is_zero()).then(|| now + ttl),
            },
        );
        Ok(())
    }
}
