//! Data models for the registry layer

use std::time::{Duration, Instant};

/// Refresh and commit counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Snapshots read from the backend
    pub refreshes: u64,
    /// `refresh_if_stale` calls answered from the resident catalog
    pub fresh_hits: u64,
    /// Snapshots written to the backend
    pub commits: u64,
}

/// Staleness tracking for the resident catalog
#[derive(Debug, Clone)]
pub(crate) struct CacheState {
    /// When the catalog was last loaded from the backend
    loaded_at: Option<Instant>,
    /// Time-to-live; `None` never expires
    ttl: Option<Duration>,
}

impl CacheState {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            loaded_at: None,
            ttl,
        }
    }

    /// Record a load at the current instant
    pub fn mark_loaded(&mut self) {
        self.loaded_at = Some(Instant::now());
    }

    /// A catalog that was never loaded is always expired
    pub fn is_expired(&self) -> bool {
        match (self.loaded_at, self.ttl) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(loaded_at), Some(ttl)) => loaded_at.elapsed() > ttl,
        }
    }

    /// Age of the resident catalog
    pub fn age(&self) -> Option<Duration> {
        self.loaded_at.map(|at| at.elapsed())
    }
}
