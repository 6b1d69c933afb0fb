use std::time::Duration;

use index::LexicalConfig;
use serde::{Deserialize, Serialize};

use crate::types::DetectError;

/// Configuration for the full detection cascade.
///
/// Cheap to clone and serde-friendly so it can be embedded in higher-level
/// configs or shipped across process boundaries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CascadeConfig {
    /// Tier-1 lexical search parameters (token cap, overlap threshold).
    #[serde(default)]
    pub lexical: LexicalConfig,
    /// Minimum histogram cosine for a candidate to survive Tier 2.
    #[serde(default = "CascadeConfig::default_syntactic_threshold")]
    pub syntactic_threshold: f64,
    /// Candidates forwarded from Tier 2 to Tier 3.
    #[serde(default = "CascadeConfig::default_syntactic_top_k")]
    pub syntactic_top_k: usize,
    /// Minimum embedding similarity for a candidate to survive Tier 3.
    #[serde(default = "CascadeConfig::default_semantic_threshold")]
    pub semantic_threshold: f64,
    /// Candidates forwarded from Tier 3 to verification.
    #[serde(default = "CascadeConfig::default_semantic_top_k")]
    pub semantic_top_k: usize,
    /// Verifier boundary: scores at or above classify as `Type-1/2`.
    #[serde(default = "CascadeConfig::default_verify_exact")]
    pub verify_exact: f64,
    /// Verifier boundary: scores at or above (and below `verify_exact`)
    /// classify as `Type-3`.
    #[serde(default = "CascadeConfig::default_verify_structural")]
    pub verify_structural: f64,
    /// Verifier boundary: scores at or above (and below
    /// `verify_structural`) classify as `Type-4`; anything lower is dropped.
    #[serde(default = "CascadeConfig::default_verify_semantic")]
    pub verify_semantic: f64,
    /// Timeout applied to each collaborator call (normalize, AST extraction,
    /// embedding). On expiry the affected tier is skipped, not the request.
    #[serde(default = "CascadeConfig::default_collaborator_timeout_ms")]
    pub collaborator_timeout_ms: u64,
}

impl CascadeConfig {
    fn default_syntactic_threshold() -> f64 {
        0.7
    }

    fn default_syntactic_top_k() -> usize {
        10
    }

    fn default_semantic_threshold() -> f64 {
        0.75
    }

    fn default_semantic_top_k() -> usize {
        5
    }

    fn default_verify_exact() -> f64 {
        0.95
    }

    fn default_verify_structural() -> f64 {
        0.80
    }

    fn default_verify_semantic() -> f64 {
        0.70
    }

    fn default_collaborator_timeout_ms() -> u64 {
        10_000
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }

    /// Validate threshold ordering and bounds.
    pub fn validate(&self) -> Result<(), DetectError> {
        for (name, value) in [
            ("syntactic_threshold", self.syntactic_threshold),
            ("semantic_threshold", self.semantic_threshold),
            ("verify_exact", self.verify_exact),
            ("verify_structural", self.verify_structural),
            ("verify_semantic", self.verify_semantic),
            ("lexical.overlap_threshold", self.lexical.overlap_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DetectError::InvalidConfig(format!(
                    "{name} must be within [0.0, 1.0], got {value}"
                )));
            }
        }
        if self.verify_exact < self.verify_structural
            || self.verify_structural < self.verify_semantic
        {
            return Err(DetectError::InvalidConfig(
                "verifier boundaries must be ordered exact >= structural >= semantic".into(),
            ));
        }
        if self.syntactic_top_k == 0 || self.semantic_top_k == 0 {
            return Err(DetectError::InvalidConfig(
                "tier top_k values must be greater than zero".into(),
            ));
        }
        if self.lexical.token_cap == 0 {
            return Err(DetectError::InvalidConfig(
                "lexical.token_cap must be greater than zero".into(),
            ));
        }
        if self.collaborator_timeout_ms == 0 {
            return Err(DetectError::InvalidConfig(
                "collaborator_timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            lexical: LexicalConfig::default(),
            syntactic_threshold: Self::default_syntactic_threshold(),
            syntactic_top_k: Self::default_syntactic_top_k(),
            semantic_threshold: Self::default_semantic_threshold(),
            semantic_top_k: Self::default_semantic_top_k(),
            verify_exact: Self::default_verify_exact(),
            verify_structural: Self::default_verify_structural(),
            verify_semantic: Self::default_verify_semantic(),
            collaborator_timeout_ms: Self::default_collaborator_timeout_ms(),
        }
    }
}
