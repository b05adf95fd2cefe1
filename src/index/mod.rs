//! Reference index over the entity dataset.
//!
//! The index is built once per run from the full reference set and is
//! read-only afterwards. Lookups go through the [`NameIndex`] trait so the
//! resolver can be driven by instrumented or synthetic indexes in tests.

mod memory;
mod traits;

pub use memory::{BuildStats, IndexBuilder, ReferenceIndex};
pub use traits::{NameIndex, SimilarityBucket};
