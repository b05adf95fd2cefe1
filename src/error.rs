//! Error types for namelink.
//!
//! Resolution itself never fails: `Unmatched` and `Ambiguous` are outcomes,
//! not errors. The errors below cover the edges around it: rejecting bad
//! configuration up front and reporting failures of the batch worker pool.

use thiserror::Error;

/// Validation errors raised while checking configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Similarity threshold {value} is out of range (0.0, 1.0]")]
    ThresholdOutOfRange {
        value: f64,
    },

    #[error("Batch worker count must be at least 1")]
    ZeroWorkers,

    #[error("Batch queue capacity must be at least 1")]
    ZeroQueueCapacity,

    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },

    #[error("Inconsistent match outcome: {reason}")]
    InconsistentOutcome {
        reason: String,
    },
}

/// Execution errors raised by the batch runtime.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Failed to spawn resolver worker '{name}': {message}")]
    WorkerSpawn {
        name: String,
        message: String,
    },

    #[error("Resolver worker pool disconnected after {completed} of {expected} results")]
    WorkerDisconnected {
        completed: usize,
        expected: usize,
    },

    #[error("No result was produced for query #{position}")]
    MissingResult {
        position: usize,
    },
}

/// Top-level error type for namelink.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LinkError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is a serialization error.
    #[must_use]
    pub const fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization(_))
    }
}

/// Result type alias for namelink operations.
pub type LinkResult<T> = Result<T, LinkError>;
