//! Source-analysis collaborators for the CloneGuard cascade.
//!
//! The cascade treats normalization, AST extraction, and embedding as
//! external services and only depends on the traits defined here. This crate
//! also ships deterministic local implementations — a comment-stripping code
//! tokenizer, a token-class histogram extractor, and a hash-seeded embedder —
//! so the full pipeline runs without any network model. Production deployments
//! substitute real analyzers behind the same traits.

pub mod ast;
pub mod embed;
pub mod normalize;

pub use ast::{AstExtractor, AstHistogram, TokenClassExtractor};
pub use embed::{l2_normalize_in_place, Embedder, Embedding, HashEmbedder};
pub use normalize::{CodeNormalizer, Normalizer};

use thiserror::Error;

/// Errors produced by an analysis collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// The source could not be tokenized or parsed.
    #[error("failed to parse {language} source: {reason}")]
    Unparseable { language: String, reason: String },
    /// The analyzer backend is unavailable (model not loaded, service down).
    #[error("analyzer unavailable: {0}")]
    Unavailable(String),
}
