//! Tier 4: final score thresholds and clone-type assignment.

use crate::config::CascadeConfig;
use crate::types::{CandidateMatch, CloneType, ReportedMatch};

/// Classify a score into a clone type, or `None` when it falls below the
/// reporting floor. Deterministic step function, evaluated top-down, first
/// match wins.
pub fn classify(score: f64, config: &CascadeConfig) -> Option<CloneType> {
    if score >= config.verify_exact {
        Some(CloneType::Type1Or2)
    } else if score >= config.verify_structural {
        Some(CloneType::Type3)
    } else if score >= config.verify_semantic {
        Some(CloneType::Type4)
    } else {
        None
    }
}

/// Round a score to three decimals for reporting.
pub fn round_score(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}

/// Verify the surviving candidates: classify each, drop low-confidence ones,
/// round scores. Classification happens on the raw score so boundary cases
/// (e.g. 0.94999) land in the bucket the unrounded value belongs to; the
/// upstream tier's ordering is preserved, not re-sorted.
pub fn verify(candidates: Vec<CandidateMatch>, config: &CascadeConfig) -> Vec<ReportedMatch> {
    candidates
        .into_iter()
        .filter_map(|candidate| {
            classify(candidate.score, config).map(|clone_type| ReportedMatch {
                submission_id: candidate.submission_id,
                clone_type,
                similarity: round_score(candidate.score),
            })
        })
        .collect()
}
