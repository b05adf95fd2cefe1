//! # namelink - Tiered entity resolution for free-text names
//!
//! namelink maps names as people type them ("Smith, John", "JOHN SMITH",
//! "Jöhn Smith") onto the stable identifiers of a reference list. It is
//! deliberately conservative: a name is linked only when a single
//! identifier is clearly supported, and everything else is surfaced for
//! review instead of guessed.
//!
//! ## Core Concepts
//!
//! - **Normalizer**: folds accents, case, punctuation and spacing into one canonical form
//! - **ReferenceIndex**: immutable exact and token-set lookups over the reference entities
//! - **Resolver**: tries the exact, token-set and similarity tiers in order
//! - **AuditLog**: records every decision and counts matched, ambiguous and unmatched names
//!
//! ## Usage
//!
//! ```rust
//! use namelink::{Entity, MatchStatus, QueryRow, ReferenceIndex, Resolver};
//!
//! let index = ReferenceIndex::build([
//!     Entity::new("1", "Smith, John"),
//!     Entity::new("2", "Anne Lee"),
//!     Entity::new("3", "Lee Anne"),
//! ]);
//!
//! let mut resolver = Resolver::with_defaults(&index);
//! assert_eq!(resolver.resolve("john smith").status(), MatchStatus::Matched);
//!
//! let audit = resolver.audit(
//!     [QueryRow::from(("JOHN SMITH", "17")), QueryRow::from("lee anne lee")],
//!     Some(index.fingerprint()),
//! );
//! let summary = audit.summary();
//! assert_eq!((summary.matched, summary.ambiguous, summary.unmatched), (1, 1, 0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod entity;
pub mod error;
pub mod normalize;
pub mod outcome;

// Lookup and resolution
pub mod cache;
pub mod config;
pub mod index;
pub mod resolver;

// Reporting and batch execution
pub mod audit;
pub mod runtime;

pub use audit::{AuditLog, AuditRecord, AuditSummary, QueryRow};
pub use cache::ResolutionCache;
pub use config::{BatchConfig, Prefilter, ResolverConfig, DEFAULT_SIMILARITY_THRESHOLD};
pub use entity::{Entity, EntityId};
pub use error::{ExecutionError, LinkError, LinkResult, ValidationError};
pub use index::{BuildStats, IndexBuilder, NameIndex, ReferenceIndex, SimilarityBucket};
pub use outcome::{MatchOutcome, MatchStatus, MatchTier};
pub use resolver::{resolve, Resolver};
pub use runtime::BatchResolver;
