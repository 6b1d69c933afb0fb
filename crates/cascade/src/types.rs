use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A source-code submission entering the detection pipeline.
///
/// Immutable once created. `metadata` is caller-owned (student and assignment
/// identifiers, upload context) and never interpreted by the cascade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    /// Opaque unique identifier, caller- or system-generated.
    pub id: String,
    /// Raw source text.
    pub source: String,
    /// Language tag handed through to the analyzers (e.g. `"python"`).
    pub language: String,
    /// Opaque caller-owned metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Submission {
    pub fn new(id: impl Into<String>, source: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            language: language.into(),
            metadata: HashMap::new(),
        }
    }
}

/// Tier-local label carried by a candidate while it moves down the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TierLabel {
    /// Exact fingerprint match found in Tier 1.
    #[serde(rename = "Type-1")]
    Type1,
    /// Token-overlap candidate awaiting refinement.
    Candidate,
    /// Structurally identical per Tier 2 (histogram cosine of 1.0).
    #[serde(rename = "Type-2")]
    Type2,
    /// Structurally similar per Tier 2.
    #[serde(rename = "Type-3")]
    Type3,
}

impl fmt::Display for TierLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TierLabel::Type1 => "Type-1",
            TierLabel::Candidate => "Candidate",
            TierLabel::Type2 => "Type-2",
            TierLabel::Type3 => "Type-3",
        };
        f.write_str(s)
    }
}

/// Final clone-type classification assigned by the verifier.
///
/// Follows the Bellon Type-1..4 taxonomy; Type-1 and Type-2 are merged in the
/// final report because a score at the top of the scale cannot distinguish
/// formatting-only from rename-only clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloneType {
    /// Identical modulo formatting/comments or identifier renaming.
    #[serde(rename = "Type-1/2")]
    Type1Or2,
    /// Similar with statement-level edits.
    #[serde(rename = "Type-3")]
    Type3,
    /// Same behavior, different structure.
    #[serde(rename = "Type-4")]
    Type4,
}

impl CloneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloneType::Type1Or2 => "Type-1/2",
            CloneType::Type3 => "Type-3",
            CloneType::Type4 => "Type-4",
        }
    }
}

impl fmt::Display for CloneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submission provisionally matched to the query at some tier.
///
/// Transient: exists only for the duration of one detection request. The
/// fixed record shape keeps score-combination and classification rules
/// statically checkable.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMatch {
    pub submission_id: String,
    /// Tier that last scored this candidate (1-3).
    pub tier: u8,
    /// Similarity in `[0, 1]`.
    pub score: f64,
    pub label: TierLabel,
}

/// One verified match in the final report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportedMatch {
    pub submission_id: String,
    pub clone_type: CloneType,
    /// Final score, rounded to three decimals.
    pub similarity: f64,
}

/// Result of one detection request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionReport {
    pub submission_id: String,
    pub top_matches: Vec<ReportedMatch>,
}

/// Errors surfaced by the cascade engine.
///
/// Tier-level collaborator failures are absorbed by the degradation policy
/// and never appear here; the only fatal class is a failed index write, since
/// an unindexed submission is invisible to all future detection requests.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("invalid cascade config: {0}")]
    InvalidConfig(String),
    #[error("failed to index submission {submission_id}: {source}")]
    Indexing {
        submission_id: String,
        #[source]
        source: index::IndexError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_type_wire_names() {
        assert_eq!(CloneType::Type1Or2.as_str(), "Type-1/2");
        assert_eq!(CloneType::Type3.to_string(), "Type-3");
        assert_eq!(
            serde_json::to_string(&CloneType::Type4).unwrap(),
            "\"Type-4\""
        );
    }

    #[test]
    fn submission_metadata_defaults_empty() {
        let json = r#"{"id":"s1","source":"x = 1","language":"python"}"#;
        let submission: Submission = serde_json::from_str(json).unwrap();
        assert!(submission.metadata.is_empty());
    }
}
