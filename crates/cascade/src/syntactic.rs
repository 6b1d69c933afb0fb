//! Tier 2: syntactic refinement over AST histograms.

use analysis::AstHistogram;
use index::FeatureCache;
use tracing::{debug, warn};

use crate::config::CascadeConfig;
use crate::types::{CandidateMatch, TierLabel};

/// Cosine similarity treating two histograms as sparse count vectors.
///
/// The dot product runs over the keys the histograms share; similarity is 0
/// when either vector has zero norm. Symmetric by construction.
pub fn histogram_cosine(a: &AstHistogram, b: &AstHistogram) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(key, &count_a)| b.get(key).map(|&count_b| count_a as f64 * count_b as f64))
        .sum();
    let norm_a: f64 = a.values().map(|&c| (c as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.values().map(|&c| (c as f64).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Refine Tier-1 candidates against the query's AST histogram.
///
/// Candidates with no cached histogram are dropped: they were indexed without
/// structural features (typically a submission still mid-processing), which
/// is an accepted per-candidate degradation rather than an error. Store
/// failures on a single candidate degrade the same way.
pub async fn refine(
    cache: &FeatureCache,
    query: &AstHistogram,
    candidates: Vec<CandidateMatch>,
    config: &CascadeConfig,
) -> Vec<CandidateMatch> {
    let mut refined = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let histogram = match cache.get_histogram(&candidate.submission_id).await {
            Ok(Some(histogram)) => histogram,
            Ok(None) => {
                debug!(
                    candidate = %candidate.submission_id,
                    "no cached histogram, dropping candidate"
                );
                continue;
            }
            Err(err) => {
                warn!(
                    candidate = %candidate.submission_id,
                    error = %err,
                    "histogram lookup failed, dropping candidate"
                );
                continue;
            }
        };
        let similarity = histogram_cosine(query, &histogram);
        if similarity < config.syntactic_threshold {
            continue;
        }
        // Integer count vectors that are scalar multiples of each other come
        // out within float error of 1.0.
        let label = if (1.0 - similarity).abs() < 1e-9 {
            TierLabel::Type2
        } else {
            TierLabel::Type3
        };
        refined.push(CandidateMatch {
            submission_id: candidate.submission_id,
            tier: 2,
            score: similarity,
            label,
        });
    }
    refined.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.submission_id.cmp(&b.submission_id))
    });
    refined.truncate(config.syntactic_top_k);
    refined
}
