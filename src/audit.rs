//! Audit trail of resolution decisions.
//!
//! Every resolved query leaves an [`AuditRecord`]: the name as submitted,
//! the id it carried before (if any), the id chosen now, the deciding tier
//! and every candidate considered. The [`AuditLog`] partitions those
//! records and counts them so ambiguous and unmatched names can be reviewed
//! and persisted by the caller.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::LinkResult;
use crate::outcome::{MatchOutcome, MatchStatus, MatchTier};

/// A query submitted for resolution, with the id it previously carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRow {
    /// Raw name to resolve.
    pub name: String,
    /// Identifier the source row carried before resolution, if any.
    #[serde(default)]
    pub original_id: Option<String>,
}

impl QueryRow {
    /// A row with no prior id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            original_id: None,
        }
    }

    /// Attach the id the source row carried. Blank ids are treated as absent.
    #[must_use]
    pub fn with_original_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.original_id = (!id.trim().is_empty()).then(|| id.trim().to_string());
        self
    }
}

impl From<&str> for QueryRow {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for QueryRow {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<(&str, &str)> for QueryRow {
    fn from((name, original_id): (&str, &str)) -> Self {
        Self::new(name).with_original_id(original_id)
    }
}

/// The inspectable trace of one resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// The query as submitted.
    pub name: String,

    /// Id the source row carried before resolution.
    #[serde(default)]
    pub original_id: Option<String>,

    /// Set only when the query matched.
    #[serde(default)]
    pub new_id: Option<EntityId>,

    /// Classification of the outcome.
    pub status: MatchStatus,
    /// Tier that decided, `none` when unmatched.
    pub tier: MatchTier,
    /// Every candidate id, sorted.
    pub candidates: Vec<EntityId>,

    /// Score of the deciding tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl AuditRecord {
    /// Build a record from a query and its outcome.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        original_id: Option<String>,
        outcome: &MatchOutcome,
    ) -> Self {
        Self {
            name: name.into(),
            original_id: original_id.filter(|id| !id.trim().is_empty()),
            new_id: outcome.resolved_id().cloned(),
            status: outcome.status(),
            tier: outcome.tier(),
            candidates: outcome.candidates().iter().cloned().collect(),
            score: outcome.score(),
        }
    }

    /// Candidate ids joined with `|`, empty when there are none.
    ///
    /// # Examples
    ///
    /// ```
    /// use namelink::{AuditRecord, Entity, ReferenceIndex, Resolver};
    ///
    /// let index = ReferenceIndex::build([
    ///     Entity::new("1", "Anne Lee"),
    ///     Entity::new("2", "Lee Anne"),
    /// ]);
    /// let mut resolver = Resolver::with_defaults(&index);
    /// let outcome = resolver.resolve("anne lee lee");
    /// let record = AuditRecord::new("anne lee lee", None, &outcome);
    /// assert_eq!(record.candidates_joined(), "1|2");
    /// ```
    #[must_use]
    pub fn candidates_joined(&self) -> String {
        self.candidates.iter().map(EntityId::as_str).collect::<Vec<_>>().join("|")
    }

    /// The id a corrected source row should carry: the resolved id, or empty.
    #[must_use]
    pub fn corrected_id(&self) -> &str {
        self.new_id.as_ref().map_or("", EntityId::as_str)
    }

    /// Returns true if resolution assigned a different id than the row had.
    #[must_use]
    pub fn id_changed(&self) -> bool {
        match (&self.original_id, &self.new_id) {
            (Some(old), Some(new)) => old != new.as_str(),
            (None, Some(_)) => true,
            (_, None) => false,
        }
    }

    /// Returns true if the record needs manual review.
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        self.status != MatchStatus::Matched
    }
}

/// Aggregate counts over an [`AuditLog`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    /// Records in the log.
    pub total: usize,
    /// Records resolved to a single id.
    pub matched: usize,
    /// Records with several equally plausible ids.
    pub ambiguous: usize,
    /// Records no id qualified for.
    pub unmatched: usize,
    /// Matched records whose id differs from the one the row carried.
    pub corrected: usize,
    /// Decided records (matched or ambiguous) per tier.
    pub by_tier: BTreeMap<MatchTier, usize>,

    /// Fingerprint of the index the log was resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl AuditSummary {
    /// Share of records that matched, 0 for an empty log.
    #[must_use]
    pub fn match_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let rate = self.matched as f64 / self.total as f64;
        rate
    }

    /// Number of records needing review.
    #[must_use]
    pub const fn unresolved(&self) -> usize {
        self.ambiguous + self.unmatched
    }
}

impl fmt::Display for AuditSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "processed: {}", self.total)?;
        writeln!(f, "matched:   {}", self.matched)?;
        writeln!(f, "ambiguous: {}", self.ambiguous)?;
        write!(f, "unmatched: {}", self.unmatched)
    }
}

/// Ordered collection of audit records for one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    records: Vec<AuditRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    fingerprint: Option<String>,
}

impl AuditLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag the log with the fingerprint of the index it was resolved against.
    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    /// The index fingerprint, if tagged.
    #[must_use]
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Append the record for one resolved query.
    pub fn record(
        &mut self,
        name: impl Into<String>,
        original_id: Option<String>,
        outcome: &MatchOutcome,
    ) -> &AuditRecord {
        self.push(AuditRecord::new(name, original_id, outcome))
    }

    /// Append a prebuilt record.
    pub fn push(&mut self, record: AuditRecord) -> &AuditRecord {
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    /// All records in input order.
    #[must_use]
    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records with the given status, in input order.
    pub fn with_status(&self, status: MatchStatus) -> impl Iterator<Item = &AuditRecord> {
        self.records.iter().filter(move |r| r.status == status)
    }

    /// Matched records.
    pub fn matched(&self) -> impl Iterator<Item = &AuditRecord> {
        self.with_status(MatchStatus::Matched)
    }

    /// Ambiguous records.
    pub fn ambiguous(&self) -> impl Iterator<Item = &AuditRecord> {
        self.with_status(MatchStatus::Ambiguous)
    }

    /// Unmatched records.
    pub fn unmatched(&self) -> impl Iterator<Item = &AuditRecord> {
        self.with_status(MatchStatus::Unmatched)
    }

    /// Ambiguous and unmatched records together, in input order.
    pub fn unresolved(&self) -> impl Iterator<Item = &AuditRecord> {
        self.records.iter().filter(|r| r.is_unresolved())
    }

    /// The first `limit` unresolved records, for a short review listing.
    #[must_use]
    pub fn review_list(&self, limit: usize) -> Vec<&AuditRecord> {
        self.unresolved().take(limit).collect()
    }

    /// Count records by status and tier.
    #[must_use]
    pub fn summary(&self) -> AuditSummary {
        let mut summary = AuditSummary {
            total: self.records.len(),
            fingerprint: self.fingerprint.clone(),
            ..AuditSummary::default()
        };
        for record in &self.records {
            match record.status {
                MatchStatus::Matched => summary.matched += 1,
                MatchStatus::Ambiguous => summary.ambiguous += 1,
                MatchStatus::Unmatched => summary.unmatched += 1,
            }
            if record.tier != MatchTier::None {
                *summary.by_tier.entry(record.tier).or_default() += 1;
            }
            if record.status == MatchStatus::Matched && record.id_changed() {
                summary.corrected += 1;
            }
        }
        summary
    }

    /// Serialize the log as pretty-printed JSON.
    pub fn to_json(&self) -> LinkResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Extend<AuditRecord> for AuditLog {
    fn extend<T: IntoIterator<Item = AuditRecord>>(&mut self, iter: T) {
        self.records.extend(iter);
    }
}

impl FromIterator<AuditRecord> for AuditLog {
    fn from_iter<T: IntoIterator<Item = AuditRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
            fingerprint: None,
        }
    }
}

impl<'a> FromIterator<(&'a str, Option<String>, MatchOutcome)> for AuditLog {
    fn from_iter<T: IntoIterator<Item = (&'a str, Option<String>, MatchOutcome)>>(iter: T) -> Self {
        iter.into_iter()
            .map(|(name, original_id, outcome)| AuditRecord::new(name, original_id, &outcome))
            .collect()
    }
}
