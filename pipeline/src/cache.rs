//! Content-addressed cache keyed by a fingerprint of the distilled page and
//! the user profile.

use crate::telemetry::PipelineTelemetry;
use aura_core::{DistilledData, DistilledElement, UserProfile};
use dashmap::DashMap;
use errors::CacheError;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Serialize)]
struct FingerprintInput<'a> {
    elements: Vec<&'a DistilledElement>,
    profile: Option<&'a UserProfile>
}

/// Stable key over (distilled actions + summary, profile).
///
/// Keys are sorted before hashing, so field order never changes the
/// fingerprint. `None` is the anonymous profile used by prefetching.
pub fn fingerprint(
    distilled: &DistilledData,
    profile: Option<&UserProfile>
) -> Result<String, CacheError> {
    let input = FingerprintInput {
        elements: distilled.actions.iter().chain(&distilled.summary).collect(),
        profile
    };
    utils::compute_json_hash(&input).map_err(|e| CacheError::Serialization {
        reason: e.to_string()
    })
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant
}

/// Concurrent TTL cache.
///
/// Expired entries are treated as absent and evicted on the read that finds
/// them. Writers race last-writer-wins.
pub struct FingerprintCache<V: Clone> {
    name: &'static str,
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
    max_entries: usize,
    enabled: bool,
    telemetry: Arc<PipelineTelemetry>
}

impl<V: Clone> FingerprintCache<V> {
    pub fn new(
        name: &'static str,
        ttl: Duration,
        max_entries: usize,
        telemetry: Arc<PipelineTelemetry>
    ) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            ttl,
            max_entries,
            enabled: true,
            telemetry
        }
    }

    /// A cache that stores nothing and always misses.
    pub fn disabled(name: &'static str, telemetry: Arc<PipelineTelemetry>) -> Self {
        Self {
            enabled: false,
            ..Self::new(name, Duration::ZERO, 0, telemetry)
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get(&self, key: &str) -> Option<V> {
        if !self.enabled {
            return None;
        }

        let expired = match self.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                self.telemetry.record_cache_hit(self.name);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false
        };

        if expired {
            self.entries
                .remove_if(key, |_, entry| entry.inserted_at.elapsed() >= self.ttl);
            debug!(cache = self.name, "Evicted expired entry");
        }
        self.telemetry.record_cache_miss(self.name);
        None
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        if !self.enabled {
            return;
        }

        let key = key.into();
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            self.evict();
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now()
            }
        );
        self.telemetry.record_cache_size(self.name, self.entries.len());
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.telemetry.record_cache_size(self.name, 0);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop expired entries, then the oldest one if still at capacity.
    fn evict(&self) {
        self.entries
            .retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        if self.entries.len() < self.max_entries {
            return;
        }

        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.inserted_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
            debug!(cache = self.name, "Evicted oldest entry at capacity");
        }
    }
}
