//! The cascade orchestrator.
//!
//! One detection request walks a fixed state sequence: normalize, Tier-1
//! lexical search, Tier-2 syntactic refinement, Tier-3 semantic re-ranking,
//! Tier-4 verification, and finally indexing. Indexing runs strictly after
//! verification (write-after-read) so a submission can never match itself in
//! the request that indexes it, and reprocessing stays idempotent.

use std::future::Future;
use std::sync::Arc;

use analysis::{
    AnalysisError, AstExtractor, CodeNormalizer, Embedder, HashEmbedder, Normalizer,
    TokenClassExtractor,
};
use index::{FeatureCache, LexicalIndex};
use store::{FeatureStore, MemoryStore};
use tracing::{debug, warn};

use crate::config::CascadeConfig;
use crate::types::{CandidateMatch, DetectError, DetectionReport, Submission, TierLabel};
use crate::{semantic, syntactic, verify};


/// Detection engine: sequences the four tiers for one submission, then
/// indexes it so future requests can match against it.
///
/// All collaborators are injected capabilities; the engine holds no global
/// state and is shared across concurrent requests behind an `Arc`.
pub struct CascadeEngine {
    normalizer: Arc<dyn Normalizer>,
    extractor: Arc<dyn AstExtractor>,
    embedder: Arc<dyn Embedder>,
    lexical: LexicalIndex,
    features: FeatureCache,
    config: CascadeConfig,
}

impl std::fmt::Debug for CascadeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CascadeEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CascadeEngine {
    /// Construct an engine from explicit collaborators and a shared store.
    pub fn new(
        normalizer: Arc<dyn Normalizer>,
        extractor: Arc<dyn AstExtractor>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn FeatureStore>,
        config: CascadeConfig,
    ) -> Result<Self, DetectError> {
        config.validate()?;
        let lexical = LexicalIndex::new(store.clone(), config.lexical.clone());
        let features = FeatureCache::new(store);
        Ok(Self {
            normalizer,
            extractor,
            embedder,
            lexical,
            features,
            config,
        })
    }

    /// Engine wired to the bundled deterministic analyzers over a caller-
    /// provided store.
    pub fn with_local_analyzers(
        store: Arc<dyn FeatureStore>,
        config: CascadeConfig,
    ) -> Result<Self, DetectError> {
        Self::new(
            Arc::new(CodeNormalizer::new()),
            Arc::new(TokenClassExtractor::new()),
            Arc::new(HashEmbedder::new()),
            store,
            config,
        )
    }

    /// Fully local engine over an in-memory store, for tests and ephemeral
    /// deployments.
    pub fn in_memory_default() -> Result<Self, DetectError> {
        Self::with_local_analyzers(Arc::new(MemoryStore::new()), CascadeConfig::default())
    }

    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Run one collaborator call under the configured timeout. Failure or
    /// expiry skips the dependent tier rather than failing the request.
    async fn collaborator<T, F>(
        &self,
        stage: &'static str,
        submission_id: &str,
        call: F,
    ) -> Option<T>
    where
        F: Future<Output = Result<T, AnalysisError>>,
    {
        match tokio::time::timeout(self.config.collaborator_timeout(), call).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(err)) => {
                warn!(
                    stage,
                    submission = submission_id,
                    error = %err,
                    "collaborator failed, skipping dependent tier"
                );
                None
            }
            Err(_) => {
                warn!(
                    stage,
                    submission = submission_id,
                    timeout_ms = self.config.collaborator_timeout_ms,
                    "collaborator timed out, skipping dependent tier"
                );
                None
            }
        }
    }

    /// Process one submission through the full cascade and index it.
    ///
    /// Refinement-tier failures degrade gracefully (the candidate list passes
    /// through unchanged); the only fatal outcome is a store failure while
    /// indexing, because an unindexed submission would be invisible to every
    /// future request.
    pub async fn detect(&self, submission: &Submission) -> Result<DetectionReport, DetectError> {
        // Normalizing
        let tokens = self
            .collaborator("normalize", &submission.id, async {
                self.normalizer
                    .normalize(&submission.source, &submission.language)
                    .await
            })
            .await;

        // Tier 1: lexical search (read-only).
        let mut candidates: Vec<CandidateMatch> = Vec::new();
        if let Some(tokens) = &tokens {
            match self.lexical.search(tokens).await {
                Ok(hits) => {
                    candidates = hits
                        .into_iter()
                        .map(|hit| CandidateMatch {
                            submission_id: hit.submission_id,
                            tier: 1,
                            score: hit.score,
                            label: if hit.exact {
                                TierLabel::Type1
                            } else {
                                TierLabel::Candidate
                            },
                        })
                        .collect();
                }
                Err(err) => {
                    warn!(
                        submission = %submission.id,
                        error = %err,
                        "lexical search failed, continuing with empty candidate set"
                    );
                }
            }
        }
        debug!(submission = %submission.id, tier1 = candidates.len(), "tier 1 complete");

        // Tier 2: syntactic refinement. The query histogram is computed here
        // even when there are no candidates, so the indexing step can cache
        // it for future requests.
        let histogram = self
            .collaborator("ast_histogram", &submission.id, async {
                self.extractor
                    .ast_histogram(&submission.source, &submission.language)
                    .await
            })
            .await;
        if let Some(histogram) = &histogram {
            candidates =
                syntactic::refine(&self.features, histogram, candidates, &self.config).await;
            debug!(submission = %submission.id, tier2 = candidates.len(), "tier 2 complete");
        }

        // Tier 3: semantic re-ranking.
        let embedding = self
            .collaborator("embed", &submission.id, async {
                self.embedder.embed(&submission.source).await
            })
            .await;
        if let Some(embedding) = &embedding {
            candidates =
                semantic::refine(&self.features, embedding, candidates, &self.config).await;
            debug!(submission = %submission.id, tier3 = candidates.len(), "tier 3 complete");
        }

        // Tier 4: verification.
        let top_matches = verify::verify(candidates, &self.config);

        // Indexing: write-after-read. Only features that were successfully
        // computed are written; an unparseable submission degrades its own
        // future refinement, not this response.
        if let Some(tokens) = &tokens {
            self.lexical
                .insert(&submission.id, tokens)
                .await
                .map_err(|source| DetectError::Indexing {
                    submission_id: submission.id.clone(),
                    source,
                })?;
        }
        if let Some(histogram) = &histogram {
            self.features
                .put_histogram(&submission.id, histogram)
                .await
                .map_err(|source| DetectError::Indexing {
                    submission_id: submission.id.clone(),
                    source,
                })?;
        }
        if let Some(embedding) = &embedding {
            self.features
                .put_embedding(&submission.id, embedding)
                .await
                .map_err(|source| DetectError::Indexing {
                    submission_id: submission.id.clone(),
                    source,
                })?;
        }

        debug!(
            submission = %submission.id,
            matches = top_matches.len(),
            "detection complete"
        );
        Ok(DetectionReport {
            submission_id: submission.id.clone(),
            top_matches,
        })
    }
}
