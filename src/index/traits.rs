//! Lookup contract consumed by the resolver.

use std::collections::BTreeSet;

use crate::config::Prefilter;
use crate::entity::EntityId;

/// A token-set bucket offered to the similarity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimilarityBucket<'a> {
    /// The bucket's token key.
    pub key: &'a str,
    /// Ids filed under the key.
    pub ids: &'a BTreeSet<EntityId>,
}

/// Read-only lookups the resolver performs against a reference index.
///
/// Implementations must be immutable for the duration of a resolution pass;
/// the batch runtime shares one instance across worker threads.
pub trait NameIndex: Send + Sync {
    /// Ids whose normalized name equals `key`.
    fn exact(&self, key: &str) -> Option<&BTreeSet<EntityId>>;

    /// Ids whose token key equals `key`.
    fn token_set(&self, key: &str) -> Option<&BTreeSet<EntityId>>;

    /// Buckets sharing at least one token with `tokens`, narrowed by
    /// `prefilter`. `normalized` is the normalized query the tokens came
    /// from. Each distinct bucket key appears at most once.
    fn similarity_buckets(
        &self,
        normalized: &str,
        tokens: &BTreeSet<String>,
        prefilter: Prefilter,
    ) -> Vec<SimilarityBucket<'_>>;
}

impl<T: NameIndex + ?Sized> NameIndex for &T {
    fn exact(&self, key: &str) -> Option<&BTreeSet<EntityId>> {
        (**self).exact(key)
    }

    fn token_set(&self, key: &str) -> Option<&BTreeSet<EntityId>> {
        (**self).token_set(key)
    }

    fn similarity_buckets(
        &self,
        normalized: &str,
        tokens: &BTreeSet<String>,
        prefilter: Prefilter,
    ) -> Vec<SimilarityBucket<'_>> {
        (**self).similarity_buckets(normalized, tokens, prefilter)
    }
}

impl<T: NameIndex + ?Sized> NameIndex for std::sync::Arc<T> {
    fn exact(&self, key: &str) -> Option<&BTreeSet<EntityId>> {
        (**self).exact(key)
    }

    fn token_set(&self, key: &str) -> Option<&BTreeSet<EntityId>> {
        (**self).token_set(key)
    }

    fn similarity_buckets(
        &self,
        normalized: &str,
        tokens: &BTreeSet<String>,
        prefilter: Prefilter,
    ) -> Vec<SimilarityBucket<'_>> {
        (**self).similarity_buckets(normalized, tokens, prefilter)
    }
}
