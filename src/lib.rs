//! Workspace umbrella crate for cloneguard.
//!
//! Re-exports the detection cascade, the lexical/feature index, the storage
//! abstraction, and the source analyzers so callers can drive clone detection
//! with a single dependency.

pub use analysis::{
    AnalysisError, AstExtractor, AstHistogram, CodeNormalizer, Embedder, Embedding, HashEmbedder,
    Normalizer, TokenClassExtractor,
};
pub use cascade::{
    CandidateMatch, CascadeConfig, CascadeEngine, CloneType, DetectError, DetectionReport,
    ReportedMatch, Submission, TierLabel,
};
pub use index::{FeatureCache, IndexError, LexicalConfig, LexicalHit, LexicalIndex};
pub use server::{ServerConfig, ServerError, ServerResult, ServerState};
pub use store::{FeatureStore, MemoryStore, StoreError};
