//! Tier 3: semantic re-ranking over cached embeddings.
//!
//! This tier never scans the corpus; it only re-ranks candidates already
//! surfaced by Tiers 1-2. A pair that shares neither tokens nor AST shape is
//! therefore invisible to the online path by construction — full-corpus
//! nearest-neighbor search belongs to a separate offline vector index.

use analysis::Embedding;
use index::FeatureCache;
use tracing::{debug, warn};

use crate::config::CascadeConfig;
use crate::types::CandidateMatch;

/// Dot product of two embeddings, clamped into `[-1, 1]`.
///
/// Both vectors are L2-normalized by the embedding collaborator, so the dot
/// product is their cosine similarity; the clamp absorbs float drift.
/// Mismatched dimensions (mixed embedder versions) score 0.
pub fn embedding_similarity(a: &Embedding, b: &Embedding) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    dot.clamp(-1.0, 1.0)
}

/// Re-rank Tier-2 candidates against the query embedding.
///
/// The blended score averages the carried tier score with the semantic
/// similarity; candidates whose semantic similarity does not clear the
/// threshold are dropped regardless of their blend. Candidates without a
/// cached embedding are skipped, mirroring the Tier-2 degradation policy.
pub async fn refine(
    cache: &FeatureCache,
    query: &Embedding,
    candidates: Vec<CandidateMatch>,
    config: &CascadeConfig,
) -> Vec<CandidateMatch> {
    let mut refined = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let embedding = match cache.get_embedding(&candidate.submission_id).await {
            Ok(Some(embedding)) => embedding,
            Ok(None) => {
                debug!(
                    candidate = %candidate.submission_id,
                    "no cached embedding, skipping candidate"
                );
                continue;
            }
            Err(err) => {
                warn!(
                    candidate = %candidate.submission_id,
                    error = %err,
                    "embedding lookup failed, skipping candidate"
                );
                continue;
            }
        };
        let semantic = embedding_similarity(query, &embedding);
        if semantic <= config.semantic_threshold {
            continue;
        }
        let blended = ((candidate.score + semantic) / 2.0).clamp(0.0, 1.0);
        refined.push(CandidateMatch {
            submission_id: candidate.submission_id,
            tier: 3,
            score: blended,
            label: candidate.label,
        });
    }
    refined.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.submission_id.cmp(&b.submission_id))
    });
    refined.truncate(config.semantic_top_k);
    refined
}
