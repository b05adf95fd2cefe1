//! Per-pass resolution cache.
//!
//! Keyed by the normalized query, so casing and punctuation variants of one
//! name share a single entry. A cache belongs to exactly one resolution pass
//! (or one batch worker) and is never shared between threads.

use std::collections::HashMap;

use crate::outcome::MatchOutcome;

/// Memoized outcomes for one resolution pass.
#[derive(Debug, Default, Clone)]
pub struct ResolutionCache {
    entries: HashMap<String, MatchOutcome>,
    hits: u64,
    misses: u64,
}

impl ResolutionCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a normalized query, counting the hit or miss.
    pub fn get(&mut self, normalized: &str) -> Option<&MatchOutcome> {
        match self.entries.get(normalized) {
            Some(outcome) => {
                self.hits += 1;
                Some(outcome)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store the outcome for a normalized query.
    pub fn insert(&mut self, normalized: String, outcome: MatchOutcome) {
        self.entries.insert(normalized, outcome);
    }

    /// Number of distinct normalized queries cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups answered from the cache.
    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that had to be computed.
    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.misses
    }

    /// Drop every entry and reset the counters, ending the pass.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}
