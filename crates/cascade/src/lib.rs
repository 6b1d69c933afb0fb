//! Multi-tier clone-detection cascade.
//!
//! Four tiers run in sequence over one submission: a lexical index surfaces
//! candidates cheaply, AST-histogram cosine refines them structurally,
//! embedding similarity re-ranks the survivors, and a final verifier maps
//! scores onto clone types. Each refinement tier only narrows what the
//! previous one produced.

pub mod config;
pub mod engine;
pub mod semantic;
pub mod syntactic;
pub mod types;
pub mod verify;

pub use config::CascadeConfig;
pub use engine::CascadeEngine;
pub use types::{
    CandidateMatch, CloneType, DetectError, DetectionReport, ReportedMatch, Submission, TierLabel,
};
