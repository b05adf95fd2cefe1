//! `MatchOutcome`, the classified result of resolving one query.
//!
//! An outcome carries more than the chosen id: it records which tier made
//! the decision and every candidate that tier produced, so an ambiguous or
//! failed resolution can be reviewed later instead of silently guessed.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::ValidationError;

/// Classification of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Exactly one reference id was selected.
    Matched,
    /// Two or more reference ids are equally plausible.
    Ambiguous,
    /// No reference id qualified.
    Unmatched,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::Ambiguous => write!(f, "ambiguous"),
            Self::Unmatched => write!(f, "unmatched"),
        }
    }
}

/// The matching strategy that produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Normalized key equality.
    Exact,
    /// Token-set key equality.
    TokenSet,
    /// Jaccard similarity over token sets.
    Similarity,
    /// No tier produced a candidate.
    None,
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::TokenSet => write!(f, "token_set"),
            Self::Similarity => write!(f, "similarity"),
            Self::None => Ok(()),
        }
    }
}

/// Result of resolving a single query.
///
/// Fields are private and deserialization is validated, so the
/// status/candidate invariants hold for every value:
///
/// - `Matched`: one candidate, and `resolved_id` is that candidate.
/// - `Ambiguous`: at least two candidates, no `resolved_id`.
/// - `Unmatched`: no candidates, no `resolved_id`, tier `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatchOutcome")]
pub struct MatchOutcome {
    status: MatchStatus,
    resolved_id: Option<EntityId>,
    candidates: BTreeSet<EntityId>,
    tier: MatchTier,

    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
}

impl MatchOutcome {
    /// Creates an unmatched outcome.
    #[must_use]
    pub const fn unmatched() -> Self {
        Self {
            status: MatchStatus::Unmatched,
            resolved_id: None,
            candidates: BTreeSet::new(),
            tier: MatchTier::None,
            score: None,
        }
    }

    /// Creates a matched outcome for a single id.
    #[must_use]
    pub fn matched(id: EntityId, tier: MatchTier, score: f64) -> Self {
        Self {
            status: MatchStatus::Matched,
            resolved_id: Some(id.clone()),
            candidates: BTreeSet::from([id]),
            tier,
            score: Some(score),
        }
    }

    /// Classifies a candidate set produced by `tier`.
    ///
    /// Zero candidates yield `None` so the caller can fall through to the
    /// next tier; one yields `Matched`; more yield `Ambiguous`.
    #[must_use]
    pub fn from_candidates(
        candidates: BTreeSet<EntityId>,
        tier: MatchTier,
        score: f64,
    ) -> Option<Self> {
        match candidates.len() {
            0 => None,
            1 => {
                let id = candidates.into_iter().next()?;
                Some(Self::matched(id, tier, score))
            }
            _ => Some(Self {
                status: MatchStatus::Ambiguous,
                resolved_id: None,
                candidates,
                tier,
                score: Some(score),
            }),
        }
    }

    /// Returns the classification.
    #[must_use]
    pub const fn status(&self) -> MatchStatus {
        self.status
    }

    /// Returns the chosen id, present only when matched.
    #[must_use]
    pub const fn resolved_id(&self) -> Option<&EntityId> {
        self.resolved_id.as_ref()
    }

    /// Returns every candidate the deciding tier produced, in id order.
    #[must_use]
    pub const fn candidates(&self) -> &BTreeSet<EntityId> {
        &self.candidates
    }

    /// Returns the tier that decided this outcome.
    #[must_use]
    pub const fn tier(&self) -> MatchTier {
        self.tier
    }

    /// Returns the score backing the decision.
    ///
    /// Key tiers report 1.0; the similarity tier reports its Jaccard score.
    #[must_use]
    pub const fn score(&self) -> Option<f64> {
        self.score
    }

    /// Returns true if exactly one id was selected.
    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.status == MatchStatus::Matched
    }

    /// Returns true if the outcome needs human review.
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        self.status != MatchStatus::Matched
    }
}

impl Default for MatchOutcome {
    fn default() -> Self {
        Self::unmatched()
    }
}

/// Wire form of a [`MatchOutcome`], checked before it becomes one.
#[derive(Deserialize)]
struct RawMatchOutcome {
    status: MatchStatus,
    #[serde(default)]
    resolved_id: Option<EntityId>,
    #[serde(default)]
    candidates: BTreeSet<EntityId>,
    tier: MatchTier,
    #[serde(default)]
    score: Option<f64>,
}

fn inconsistent(reason: &str) -> ValidationError {
    ValidationError::InconsistentOutcome {
        reason: reason.to_string(),
    }
}

impl TryFrom<RawMatchOutcome> for MatchOutcome {
    type Error = ValidationError;

    fn try_from(raw: RawMatchOutcome) -> Result<Self, Self::Error> {
        if raw.status == MatchStatus::Unmatched {
            let empty = raw.candidates.is_empty()
                && raw.resolved_id.is_none()
                && raw.tier == MatchTier::None
                && raw.score.is_none();
            if !empty {
                return Err(inconsistent("unmatched outcome must carry nothing"));
            }
            return Ok(Self::unmatched());
        }

        if raw.tier == MatchTier::None {
            return Err(inconsistent("decided outcome has no tier"));
        }
        let score = raw.score.ok_or_else(|| inconsistent("decided outcome has no score"))?;
        if !(0.0..=1.0).contains(&score) {
            return Err(inconsistent("score is outside [0, 1]"));
        }

        let rebuilt = Self::from_candidates(raw.candidates, raw.tier, score)
            .ok_or_else(|| inconsistent("decided outcome has no candidates"))?;
        if rebuilt.status != raw.status {
            return Err(inconsistent("status does not fit the number of candidates"));
        }
        if rebuilt.resolved_id != raw.resolved_id {
            return Err(inconsistent("resolved id must be the single candidate of a match"));
        }
        Ok(rebuilt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> BTreeSet<EntityId> {
        raw.iter().map(|s| EntityId::from(*s)).collect()
    }

    #[test]
    fn unmatched_has_no_candidates() {
        let outcome = MatchOutcome::unmatched();
        assert_eq!(outcome.status(), MatchStatus::Unmatched);
        assert!(outcome.candidates().is_empty());
        assert!(outcome.resolved_id().is_none());
        assert_eq!(outcome.tier(), MatchTier::None);
        assert!(outcome.is_unresolved());
    }

    #[test]
    fn single_candidate_is_matched() {
        let outcome = MatchOutcome::from_candidates(ids(&["1"]), MatchTier::Exact, 1.0).unwrap();
        assert!(outcome.is_matched());
        assert_eq!(outcome.resolved_id(), Some(&EntityId::from("1")));
        assert_eq!(outcome.candidates().len(), 1);
    }

    #[test]
    fn multiple_candidates_are_ambiguous() {
        let outcome =
            MatchOutcome::from_candidates(ids(&["2", "1"]), MatchTier::TokenSet, 1.0).unwrap();
        assert_eq!(outcome.status(), MatchStatus::Ambiguous);
        assert!(outcome.resolved_id().is_none());
        let listed: Vec<&str> = outcome.candidates().iter().map(EntityId::as_str).collect();
        assert_eq!(listed, vec!["1", "2"]);
    }

    #[test]
    fn empty_candidates_fall_through() {
        assert!(MatchOutcome::from_candidates(BTreeSet::new(), MatchTier::Exact, 1.0).is_none());
    }

    #[test]
    fn display_names() {
        assert_eq!(MatchStatus::Ambiguous.to_string(), "ambiguous");
        assert_eq!(MatchTier::TokenSet.to_string(), "token_set");
        assert_eq!(MatchTier::None.to_string(), "");
    }

    #[test]
    fn serialization_uses_snake_case() {
        let outcome = MatchOutcome::matched(EntityId::from("7"), MatchTier::TokenSet, 1.0);
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains(r#""status":"matched""#));
        assert!(json.contains(r#""tier":"token_set""#));

        let back: MatchOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back, outcome);
    }

    #[test]
    fn consistent_json_outcomes_deserialize() {
        let ambiguous =
            MatchOutcome::from_candidates(ids(&["1", "2"]), MatchTier::Similarity, 0.95).unwrap();
        for outcome in [MatchOutcome::unmatched(), ambiguous] {
            let json = serde_json::to_string(&outcome).unwrap();
            let back: MatchOutcome = serde_json::from_str(&json).unwrap();
            assert_eq!(back, outcome);
        }
    }

    fn outcome_json(
        status: &str,
        resolved_id: Option<&str>,
        candidates: &[&str],
        tier: &str,
        score: Option<f64>,
    ) -> String {
        serde_json::json!({
            "status": status,
            "resolved_id": resolved_id,
            "candidates": candidates,
            "tier": tier,
            "score": score,
        })
        .to_string()
    }

    #[test]
    fn inconsistent_json_outcomes_are_rejected() {
        let rejected = [
            // Matched with two candidates, no resolved id and no tier.
            outcome_json("matched", None, &["1", "2"], "none", None),
            outcome_json("matched", None, &["1", "2"], "exact", Some(1.0)),
            // Resolved id that is not the candidate.
            outcome_json("matched", Some("2"), &["1"], "exact", Some(1.0)),
            // Ambiguous with a single candidate, or naming a winner.
            outcome_json("ambiguous", None, &["1"], "exact", Some(1.0)),
            outcome_json("ambiguous", Some("1"), &["1", "2"], "exact", Some(1.0)),
            // Unmatched still carrying a candidate.
            outcome_json("unmatched", None, &["1"], "none", None),
            // Decided outcome without a score, or with one out of range.
            outcome_json("matched", Some("1"), &["1"], "exact", None),
            outcome_json("matched", Some("1"), &["1"], "exact", Some(1.5)),
        ];
        for json in &rejected {
            let err = serde_json::from_str::<MatchOutcome>(json).unwrap_err();
            assert!(err.to_string().contains("Inconsistent match outcome"), "{json}: {err}");
        }

        let accepted = outcome_json("matched", Some("1"), &["1"], "exact", Some(1.0));
        let outcome: MatchOutcome = serde_json::from_str(&accepted).unwrap();
        assert_eq!(outcome.resolved_id(), Some(&EntityId::from("1")));
    }
}
