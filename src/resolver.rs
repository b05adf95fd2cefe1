//! Tiered name resolution.
//!
//! A query is tried against three tiers in a fixed order, and the first tier
//! that produces any candidate decides the outcome:
//!
//! 1. **Exact**: the normalized query is a key of the exact index.
//! 2. **Token set**: the query's token key is a key of the token index.
//! 3. **Similarity**: Jaccard similarity against every token bucket sharing
//!    a word with the query, admitted at or above the configured threshold.
//!
//! One candidate resolves the query; several make it ambiguous. The
//! similarity tier only resolves when a single id holds the best score, so
//! two buckets tying above the threshold never get an arbitrary winner.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::audit::{AuditLog, AuditRecord, QueryRow};
use crate::cache::ResolutionCache;
use crate::config::ResolverConfig;
use crate::entity::EntityId;
use crate::error::LinkResult;
use crate::index::{NameIndex, ReferenceIndex};
use crate::normalize::{jaccard, join_tokens, key_tokens, normalize};
use crate::outcome::{MatchOutcome, MatchTier};

/// Resolve one query against `index`, consulting and filling `cache`.
///
/// Never fails: a query nothing matches is an `Unmatched` outcome.
pub fn resolve<I: NameIndex + ?Sized>(
    query: &str,
    index: &I,
    cache: &mut ResolutionCache,
    config: &ResolverConfig,
) -> MatchOutcome {
    let normalized = normalize(query);
    if let Some(cached) = cache.get(&normalized) {
        return cached.clone();
    }
    let outcome = resolve_normalized(&normalized, index, config);
    cache.insert(normalized, outcome.clone());
    outcome
}

fn resolve_normalized<I: NameIndex + ?Sized>(
    normalized: &str,
    index: &I,
    config: &ResolverConfig,
) -> MatchOutcome {
    if normalized.is_empty() {
        return MatchOutcome::unmatched();
    }

    if let Some(outcome) = index
        .exact(normalized)
        .and_then(|ids| MatchOutcome::from_candidates(ids.clone(), MatchTier::Exact, 1.0))
    {
        tracing::trace!(query = normalized, status = %outcome.status(), "exact tier decided");
        return outcome;
    }

    // `normalized` is already canonical, so splitting it is tokenize().
    let tokens: BTreeSet<String> = key_tokens(normalized).into_iter().map(str::to_string).collect();
    let key = join_tokens(&tokens);
    if let Some(outcome) = index
        .token_set(&key)
        .and_then(|ids| MatchOutcome::from_candidates(ids.clone(), MatchTier::TokenSet, 1.0))
    {
        tracing::trace!(query = normalized, status = %outcome.status(), "token-set tier decided");
        return outcome;
    }

    match similarity_tier(normalized, &tokens, index, config) {
        Some(outcome) => {
            tracing::trace!(
                query = normalized,
                status = %outcome.status(),
                score = outcome.score(),
                "similarity tier decided"
            );
            outcome
        }
        None => MatchOutcome::unmatched(),
    }
}

#[allow(clippy::float_cmp)]
fn similarity_tier<I: NameIndex + ?Sized>(
    normalized: &str,
    tokens: &BTreeSet<String>,
    index: &I,
    config: &ResolverConfig,
) -> Option<MatchOutcome> {
    let query: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();

    // An id filed under several admissible buckets counts once, at its best.
    let mut scores: BTreeMap<&EntityId, f64> = BTreeMap::new();
    for bucket in index.similarity_buckets(normalized, tokens, config.prefilter) {
        let score = jaccard(&query, &key_tokens(bucket.key));
        // A NaN threshold compares as None and admits nothing.
        let admitted = score > 0.0
            && score
                .partial_cmp(&config.similarity_threshold)
                .is_some_and(Ordering::is_ge);
        if !admitted {
            continue;
        }
        for id in bucket.ids {
            let best = scores.entry(id).or_insert(score);
            if score > *best {
                *best = score;
            }
        }
    }

    let best = scores.values().copied().reduce(f64::max)?;
    let second = scores.values().copied().filter(|s| *s < best).fold(0.0_f64, f64::max);
    let leaders: BTreeSet<EntityId> = scores
        .into_iter()
        .filter(|(_, s)| *s == best)
        .map(|(id, _)| id.clone())
        .collect();

    if leaders.len() == 1 && best > second {
        let id = leaders.into_iter().next()?;
        return Some(MatchOutcome::matched(id, MatchTier::Similarity, best));
    }
    MatchOutcome::from_candidates(leaders, MatchTier::Similarity, best)
}

/// Stateful resolver for one resolution pass.
///
/// Owns its cache, so repeated queries within the pass are answered without
/// touching the index. Start a new pass with [`Resolver::reset_cache`].
///
/// # Examples
///
/// ```
/// use namelink::{Entity, MatchStatus, ReferenceIndex, Resolver};
///
/// let index = ReferenceIndex::build([Entity::new("1", "Smith, John")]);
/// let mut resolver = Resolver::with_defaults(&index);
/// let outcome = resolver.resolve("John Smith");
/// assert_eq!(outcome.status(), MatchStatus::Matched);
/// ```
#[derive(Debug)]
pub struct Resolver<I: NameIndex = ReferenceIndex> {
    index: I,
    config: ResolverConfig,
    cache: ResolutionCache,
}

impl<I: NameIndex> Resolver<I> {
    /// Create a resolver after validating `config`.
    pub fn new(index: I, config: ResolverConfig) -> LinkResult<Self> {
        config.validate()?;
        Ok(Self {
            index,
            config,
            cache: ResolutionCache::new(),
        })
    }

    /// Create a resolver with the default configuration.
    #[must_use]
    pub fn with_defaults(index: I) -> Self {
        Self {
            index,
            config: ResolverConfig::default(),
            cache: ResolutionCache::new(),
        }
    }

    /// Resolve a single query.
    pub fn resolve(&mut self, query: &str) -> MatchOutcome {
        resolve(query, &self.index, &mut self.cache, &self.config)
    }

    /// Resolve queries in order.
    pub fn resolve_all<S: AsRef<str>>(
        &mut self,
        queries: impl IntoIterator<Item = S>,
    ) -> Vec<MatchOutcome> {
        queries.into_iter().map(|q| self.resolve(q.as_ref())).collect()
    }

    /// Resolve a query row and append its audit record to `audit`.
    pub fn resolve_into<'a>(&mut self, audit: &'a mut AuditLog, row: QueryRow) -> &'a AuditRecord {
        let outcome = self.resolve(&row.name);
        audit.record(row.name, row.original_id, &outcome)
    }

    /// Resolve every row into a fresh audit log tagged with the index fingerprint.
    pub fn audit<R: Into<QueryRow>>(
        &mut self,
        rows: impl IntoIterator<Item = R>,
        fingerprint: Option<String>,
    ) -> AuditLog {
        let mut audit = AuditLog::new();
        if let Some(fp) = fingerprint {
            audit = audit.with_fingerprint(fp);
        }
        for row in rows {
            self.resolve_into(&mut audit, row.into());
        }
        audit
    }

    /// The cache of the current pass.
    #[must_use]
    pub const fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Drop cached outcomes, starting a new pass.
    pub fn reset_cache(&mut self) {
        self.cache.clear();
    }

    /// The index this resolver reads.
    #[must_use]
    pub const fn index(&self) -> &I {
        &self.index
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }
}
