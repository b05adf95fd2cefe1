//! Resolver and batch configuration.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default Jaccard admission threshold for the similarity tier.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.90;

/// How the similarity tier narrows the buckets it scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prefilter {
    /// Score every bucket sharing at least one token with the query.
    #[default]
    SharedToken,
    /// Only score buckets filed under the first letter of the normalized
    /// query, where each reference surface form files its token key under
    /// its own first letter. Faster on large references, but a name whose
    /// first word changed is never scored.
    Initial,
}

/// Configuration for a resolution pass.
///
/// # Examples
///
/// ```
/// use namelink::ResolverConfig;
///
/// let config = ResolverConfig::default().with_similarity_threshold(0.88);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Minimum Jaccard score for a bucket to be admitted, in (0, 1].
    pub similarity_threshold: f64,
    /// Bucket narrowing strategy for the similarity tier.
    pub prefilter: Prefilter,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            prefilter: Prefilter::SharedToken,
        }
    }
}

impl ResolverConfig {
    /// Sets the similarity threshold.
    #[must_use]
    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Sets the similarity prefilter.
    #[must_use]
    pub const fn with_prefilter(mut self, prefilter: Prefilter) -> Self {
        self.prefilter = prefilter;
        self
    }

    /// Checks that the threshold lies in (0, 1].
    pub fn validate(&self) -> Result<(), ValidationError> {
        let t = self.similarity_threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(ValidationError::ThresholdOutOfRange { value: t });
        }
        Ok(())
    }

    /// Parses and validates a configuration from JSON.
    ///
    /// Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ValidationError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration for [`crate::runtime::BatchResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of worker threads, each with its own cache.
    pub workers: usize,
    /// Maximum queued queries per worker pool.
    pub queue_capacity: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        Self {
            workers: workers.clamp(1, 8),
            queue_capacity: 1024,
        }
    }
}

impl BatchConfig {
    /// Sets the worker count.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Checks that the pool has at least one worker and one queue slot.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.workers == 0 {
            return Err(ValidationError::ZeroWorkers);
        }
        if self.queue_capacity == 0 {
            return Err(ValidationError::ZeroQueueCapacity);
        }
        Ok(())
    }
}
