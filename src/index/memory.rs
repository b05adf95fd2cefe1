//! In-memory reference index.
//!
//! Holds the exact and token-set mappings the resolver consults, plus two
//! structures that keep the similarity tier away from a full scan: a
//! token → bucket-key posting list and first-letter buckets keyed by the
//! initial of each normalized surface form.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::Prefilter;
use crate::entity::{Entity, EntityId};
use crate::index::traits::{NameIndex, SimilarityBucket};
use crate::normalize::{comma_flipped_variants, join_tokens, key_tokens, normalize, tokenize};

/// Counters collected while building a [`ReferenceIndex`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Rows offered to the builder.
    pub rows_seen: usize,
    /// Rows inserted into the index.
    pub indexed: usize,
    /// Rows dropped for a blank id or name.
    pub skipped: usize,
    /// Comma-flipped surface forms inserted alongside their originals.
    pub flipped_variants: usize,
}

/// Incremental constructor for a [`ReferenceIndex`].
///
/// Insertion is append-only; [`IndexBuilder::finish`] freezes the result.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    exact: HashMap<String, BTreeSet<EntityId>>,
    tokens: HashMap<String, BTreeSet<EntityId>>,
    initials: BTreeMap<char, BTreeSet<String>>,
    names: BTreeMap<EntityId, BTreeSet<String>>,
    stats: BuildStats,
}

impl IndexBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one reference row. Returns false if the row was skipped.
    pub fn insert(&mut self, entity: Entity) -> bool {
        self.stats.rows_seen += 1;
        if !entity.is_indexable() {
            self.stats.skipped += 1;
            return false;
        }

        let id = EntityId::new(entity.id.as_str().trim());
        let name = entity.canonical_name.trim();

        self.insert_surface(&id, name);
        for variant in comma_flipped_variants(name) {
            self.insert_surface(&id, &variant);
            self.stats.flipped_variants += 1;
        }

        self.names.entry(id).or_default().insert(name.to_string());
        self.stats.indexed += 1;
        true
    }

    fn insert_surface(&mut self, id: &EntityId, surface: &str) {
        let normalized = normalize(surface);
        let Some(initial) = normalized.chars().next() else {
            return;
        };
        let key = join_tokens(&tokenize(surface));
        self.initials.entry(initial).or_default().insert(key.clone());
        self.tokens.entry(key).or_default().insert(id.clone());
        self.exact.entry(normalized).or_default().insert(id.clone());
    }

    /// Freeze the builder into a read-only index.
    #[must_use]
    pub fn finish(self) -> ReferenceIndex {
        let mut postings: HashMap<String, BTreeSet<String>> = HashMap::new();
        for key in self.tokens.keys() {
            for token in key_tokens(key) {
                postings.entry(token.to_string()).or_default().insert(key.clone());
            }
        }

        let fingerprint = fingerprint(&self.names);

        tracing::info!(
            rows = self.stats.rows_seen,
            indexed = self.stats.indexed,
            skipped = self.stats.skipped,
            flipped = self.stats.flipped_variants,
            exact_keys = self.exact.len(),
            token_keys = self.tokens.len(),
            "reference index built"
        );

        ReferenceIndex {
            exact: self.exact,
            tokens: self.tokens,
            postings,
            initials: self.initials,
            names: self.names,
            stats: self.stats,
            fingerprint,
        }
    }
}

fn fingerprint(names: &BTreeMap<EntityId, BTreeSet<String>>) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for (id, surfaces) in names {
        // Length prefixes keep ("ab", "c") and ("a", "bc") apart.
        hasher.update(&(id.as_str().len() as u64).to_le_bytes());
        hasher.update(id.as_str().as_bytes());
        hasher.update(&(surfaces.len() as u64).to_le_bytes());
        for name in surfaces {
            hasher.update(&(name.len() as u64).to_le_bytes());
            hasher.update(name.as_bytes());
        }
    }
    hasher.finalize()
}

/// Frozen lookup structures over a reference dataset.
///
/// One key may map to several ids: distinct entities can share a display
/// name, and comma-flipped variants file the same id under a second key.
///
/// # Examples
///
/// ```
/// use namelink::{Entity, ReferenceIndex};
///
/// let index = ReferenceIndex::build([Entity::new("1", "Smith, John")]);
/// assert_eq!(index.len(), 1);
/// assert!(index.exact_ids("john smith").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct ReferenceIndex {
    exact: HashMap<String, BTreeSet<EntityId>>,
    tokens: HashMap<String, BTreeSet<EntityId>>,
    postings: HashMap<String, BTreeSet<String>>,
    initials: BTreeMap<char, BTreeSet<String>>,
    names: BTreeMap<EntityId, BTreeSet<String>>,
    stats: BuildStats,
    fingerprint: blake3::Hash,
}

impl ReferenceIndex {
    /// Build an index from a full reference dataset.
    pub fn build<I>(entities: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Entity>,
    {
        let mut builder = IndexBuilder::new();
        for entity in entities {
            builder.insert(entity.into());
        }
        builder.finish()
    }

    /// Number of distinct ids indexed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no row was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Ids filed under a normalized key.
    #[must_use]
    pub fn exact_ids(&self, normalized: &str) -> Option<&BTreeSet<EntityId>> {
        self.exact.get(normalized)
    }

    /// Ids filed under a token key.
    #[must_use]
    pub fn token_ids(&self, key: &str) -> Option<&BTreeSet<EntityId>> {
        self.tokens.get(key)
    }

    /// Number of distinct normalized keys.
    #[must_use]
    pub fn exact_key_count(&self) -> usize {
        self.exact.len()
    }

    /// Number of distinct token keys.
    #[must_use]
    pub fn token_key_count(&self) -> usize {
        self.tokens.len()
    }

    /// Token keys of surface forms whose normalized name starts with `initial`.
    #[must_use]
    pub fn bucket(&self, initial: char) -> Option<&BTreeSet<String>> {
        self.initials.get(&initial)
    }

    /// Lexicographically smallest raw name recorded for an id, for display
    /// in reports.
    #[must_use]
    pub fn name_of(&self, id: &EntityId) -> Option<&str> {
        self.names.get(id).and_then(|s| s.iter().next()).map(String::as_str)
    }

    /// Construction counters.
    #[must_use]
    pub const fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Stable digest of the indexed `(id, name)` pairs, as lowercase hex.
    ///
    /// Independent of input order, so two runs over the same reference data
    /// produce the same fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        self.fingerprint.to_hex().to_string()
    }

    fn shared_token_keys(&self, query: &BTreeSet<String>) -> BTreeSet<&str> {
        query
            .iter()
            .filter_map(|token| self.postings.get(token))
            .flatten()
            .map(String::as_str)
            .collect()
    }

    fn initial_bucket_keys(&self, normalized: &str, query: &BTreeSet<String>) -> BTreeSet<&str> {
        let Some(bucket) = normalized.chars().next().and_then(|c| self.initials.get(&c)) else {
            return BTreeSet::new();
        };
        bucket
            .iter()
            .filter(|key| key_tokens(key).iter().any(|t| query.contains(*t)))
            .map(String::as_str)
            .collect()
    }
}

impl Default for ReferenceIndex {
    fn default() -> Self {
        IndexBuilder::new().finish()
    }
}

impl NameIndex for ReferenceIndex {
    fn exact(&self, key: &str) -> Option<&BTreeSet<EntityId>> {
        self.exact_ids(key)
    }

    fn token_set(&self, key: &str) -> Option<&BTreeSet<EntityId>> {
        self.token_ids(key)
    }

    fn similarity_buckets(
        &self,
        normalized: &str,
        tokens: &BTreeSet<String>,
        prefilter: Prefilter,
    ) -> Vec<SimilarityBucket<'_>> {
        let keys = match prefilter {
            Prefilter::SharedToken => self.shared_token_keys(tokens),
            Prefilter::Initial => self.initial_bucket_keys(normalized, tokens),
        };
        keys.into_iter()
            .filter_map(|key| {
                let (key, ids) = self.tokens.get_key_value(key)?;
                Some(SimilarityBucket { key, ids })
            })
            .collect()
    }
}
