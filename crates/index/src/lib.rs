//! Shared incremental index structures for the CloneGuard cascade.
//!
//! Everything here is layered over the [`store::FeatureStore`] capability:
//! the Tier-1 [`LexicalIndex`] (exact-match fingerprint buckets plus an
//! inverted token index) and the [`FeatureCache`] holding per-submission AST
//! histograms and embeddings for later tiers. Entries are append-only and
//! insertion is idempotent; there is no deletion path.

mod fingerprint;

pub use fingerprint::{fingerprint_tokens, FINGERPRINT_VERSION};

use std::collections::HashMap;
use std::sync::Arc;

use analysis::{AstHistogram, Embedding};
use serde::{Deserialize, Serialize};
use store::{FeatureStore, StoreError};
use thiserror::Error;
use tracing::debug;

/// Errors produced by the index layer.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The backing store failed.
    #[error("index store error: {0}")]
    Store(#[from] StoreError),
    /// A cached feature could not be decoded.
    #[error("corrupt cached feature under {key}: {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Key layout for the four index structures. Kept in one place so the opaque
/// store namespace stays collision-free.
mod keys {
    pub fn fingerprint_bucket(fp: &str) -> String {
        format!("lex:fp:{fp}")
    }

    pub fn token_bucket(token: &str) -> String {
        format!("lex:tok:{token}")
    }

    pub fn histogram(id: &str) -> String {
        format!("feat:hist:{id}")
    }

    pub fn embedding(id: &str) -> String {
        format!("feat:emb:{id}")
    }
}

/// Tier-1 search configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LexicalConfig {
    /// Upper bound on how many unique query tokens are looked up in the
    /// inverted index. The capped slice is taken in first-occurrence order so
    /// results stay reproducible.
    #[serde(default = "LexicalConfig::default_token_cap")]
    pub token_cap: usize,
    /// Minimum `match_count / |unique tokens|` ratio for a token-overlap
    /// candidate to survive.
    #[serde(default = "LexicalConfig::default_overlap_threshold")]
    pub overlap_threshold: f64,
}

impl LexicalConfig {
    fn default_token_cap() -> usize {
        100
    }

    fn default_overlap_threshold() -> f64 {
        0.4
    }
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self {
            token_cap: Self::default_token_cap(),
            overlap_threshold: Self::default_overlap_threshold(),
        }
    }
}

/// One Tier-1 hit: either an exact fingerprint match (`score == 1.0`) or a
/// token-overlap candidate scored by its overlap ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalHit {
    pub submission_id: String,
    pub score: f64,
    pub exact: bool,
}

/// Deduplicate tokens preserving first-occurrence order.
///
/// An unordered dedupe would make the token cap non-deterministic, which in
/// turn makes detection results irreproducible; first-occurrence order is the
/// stable ordering the cap operates on.
pub fn dedupe_tokens(tokens: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::new();
    for token in tokens {
        if seen.insert(token.as_str()) {
            unique.push(token.clone());
        }
    }
    unique
}

/// Exact-match hash index plus inverted token index (Tier 1).
#[derive(Clone)]
pub struct LexicalIndex {
    store: Arc<dyn FeatureStore>,
    config: LexicalConfig,
}

impl LexicalIndex {
    pub fn new(store: Arc<dyn FeatureStore>, config: LexicalConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &LexicalConfig {
        &self.config
    }

    /// Tier-1 search. Read-only: an empty index yields an empty result.
    ///
    /// Exact fingerprint hits come back with `score = 1.0`; the remaining
    /// candidates are scored by `match_count / |unique tokens|` and kept when
    /// that ratio reaches the overlap threshold.
    pub async fn search(&self, tokens: &[String]) -> Result<Vec<LexicalHit>, IndexError> {
        let fingerprint = fingerprint_tokens(tokens);
        let exact_ids = self
            .store
            .set_members(&keys::fingerprint_bucket(&fingerprint))
            .await?;

        let mut hits: Vec<LexicalHit> = exact_ids
            .iter()
            .map(|id| LexicalHit {
                submission_id: id.clone(),
                score: 1.0,
                exact: true,
            })
            .collect();

        let unique = dedupe_tokens(tokens);
        if unique.is_empty() {
            return Ok(hits);
        }
        let capped = &unique[..unique.len().min(self.config.token_cap)];

        let mut counts: HashMap<String, usize> = HashMap::new();
        for token in capped {
            for id in self.store.set_members(&keys::token_bucket(token)).await? {
                *counts.entry(id).or_insert(0) += 1;
            }
        }

        let denominator = unique.len() as f64;
        let threshold = self.config.overlap_threshold * denominator;
        let mut overlap: Vec<LexicalHit> = counts
            .into_iter()
            .filter(|(id, _)| !exact_ids.contains(id))
            .filter(|(_, count)| *count as f64 >= threshold)
            .map(|(id, count)| LexicalHit {
                submission_id: id,
                score: count as f64 / denominator,
                exact: false,
            })
            .collect();
        // HashMap iteration order is arbitrary; fix it for reproducibility.
        overlap.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.submission_id.cmp(&b.submission_id))
        });
        hits.extend(overlap);

        debug!(
            candidates = hits.len(),
            unique_tokens = unique.len(),
            "lexical search complete"
        );
        Ok(hits)
    }

    /// Insert a submission into both lexical structures. Idempotent: set-add
    /// semantics mean re-indexing the same id never duplicates members.
    pub async fn insert(&self, submission_id: &str, tokens: &[String]) -> Result<(), IndexError> {
        let fingerprint = fingerprint_tokens(tokens);
        self.store
            .set_add(&keys::fingerprint_bucket(&fingerprint), submission_id)
            .await?;
        for token in dedupe_tokens(tokens) {
            self.store
                .set_add(&keys::token_bucket(&token), submission_id)
                .await?;
        }
        Ok(())
    }

    /// Number of ids in a fingerprint bucket (diagnostics and tests).
    pub async fn fingerprint_bucket_len(&self, tokens: &[String]) -> Result<usize, IndexError> {
        let fingerprint = fingerprint_tokens(tokens);
        Ok(self
            .store
            .set_members(&keys::fingerprint_bucket(&fingerprint))
            .await?
            .len())
    }

    /// Number of ids indexed under one token (diagnostics and tests).
    pub async fn token_bucket_len(&self, token: &str) -> Result<usize, IndexError> {
        Ok(self
            .store
            .set_members(&keys::token_bucket(token))
            .await?
            .len())
    }
}

/// Typed access to the per-submission histogram and embedding caches.
///
/// Both caches are write-once-per-key as far as content goes: the value is a
/// pure function of the submission source, so concurrent re-writes are
/// idempotent by construction.
#[derive(Clone)]
pub struct FeatureCache {
    store: Arc<dyn FeatureStore>,
}

impl FeatureCache {
    pub fn new(store: Arc<dyn FeatureStore>) -> Self {
        Self { store }
    }

    pub async fn put_histogram(
        &self,
        submission_id: &str,
        histogram: &AstHistogram,
    ) -> Result<(), IndexError> {
        self.put_json(&keys::histogram(submission_id), histogram).await
    }

    pub async fn get_histogram(
        &self,
        submission_id: &str,
    ) -> Result<Option<AstHistogram>, IndexError> {
        self.get_json(&keys::histogram(submission_id)).await
    }

    pub async fn put_embedding(
        &self,
        submission_id: &str,
        embedding: &Embedding,
    ) -> Result<(), IndexError> {
        self.put_json(&keys::embedding(submission_id), embedding).await
    }

    pub async fn get_embedding(
        &self,
        submission_id: &str,
    ) -> Result<Option<Embedding>, IndexError> {
        self.get_json(&keys::embedding(submission_id)).await
    }

    async fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), IndexError> {
        let bytes = serde_json::to_vec(value).map_err(|source| IndexError::Codec {
            key: key.to_string(),
            source,
        })?;
        self.store.put(key, &bytes).await?;
        Ok(())
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        key: &str,
    ) -> Result<Option<T>, IndexError> {
        match self.store.get(key).await? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes).map_err(|source| IndexError::Codec {
                    key: key.to_string(),
                    source,
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::MemoryStore;

    fn toks(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn lexical() -> LexicalIndex {
        LexicalIndex::new(Arc::new(MemoryStore::new()), LexicalConfig::default())
    }

    #[tokio::test]
    async fn empty_index_yields_empty_result() {
        let index = lexical();
        let hits = index.search(&toks(&["a", "b", "c"])).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn exact_fingerprint_match_scores_one() {
        let index = lexical();
        let tokens = toks(&["def", "f", "(", "x", ")", ":", "return", "x"]);
        index.insert("sub-1", &tokens).await.unwrap();

        let hits = index.search(&tokens).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].submission_id, "sub-1");
        assert_eq!(hits[0].score, 1.0);
        assert!(hits[0].exact);
    }

    #[tokio::test]
    async fn exact_matches_are_excluded_from_overlap_candidates() {
        let index = lexical();
        let tokens = toks(&["a", "b", "c", "d", "e"]);
        index.insert("sub-1", &tokens).await.unwrap();

        let hits = index.search(&tokens).await.unwrap();
        // One hit only: the exact bucket, not a duplicate overlap candidate.
        assert_eq!(hits.len(), 1);
        assert!(hits[0].exact);
    }

    #[tokio::test]
    async fn overlap_ratio_at_threshold_is_included() {
        let index = lexical();
        // Candidate shares exactly 2 of the query's 5 unique tokens: 0.4.
        index.insert("cand", &toks(&["a", "b", "z1", "z2", "z3"])).await.unwrap();

        let hits = index.search(&toks(&["a", "b", "c", "d", "e"])).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].submission_id, "cand");
        assert!((hits[0].score - 0.4).abs() < 1e-12);
        assert!(!hits[0].exact);
    }

    #[tokio::test]
    async fn overlap_ratio_just_below_threshold_is_excluded() {
        let index = lexical();
        // 39 shared tokens out of 100 unique query tokens: 0.39 < 0.4.
        let query: Vec<String> = (0..100).map(|i| format!("tok{i}")).collect();
        let candidate: Vec<String> = (0..39).map(|i| format!("tok{i}")).collect();
        index.insert("cand", &candidate).await.unwrap();

        let hits = index.search(&query).await.unwrap();
        assert!(hits.is_empty());

        // One more shared token reaches 0.40 and is included.
        let candidate40: Vec<String> = (0..40).map(|i| format!("tok{i}")).collect();
        index.insert("cand40", &candidate40).await.unwrap();
        let hits = index.search(&query).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].submission_id, "cand40");
        assert!((hits[0].score - 0.40).abs() < 1e-12);
    }

    #[tokio::test]
    async fn scores_stay_in_unit_interval() {
        let index = lexical();
        // Candidate has every query token plus extras; count can never
        // exceed the unique-query-token denominator.
        index
            .insert("cand", &toks(&["a", "b", "c", "extra1", "extra2"]))
            .await
            .unwrap();
        let hits = index.search(&toks(&["a", "b", "c"])).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].score > 0.0 && hits[0].score <= 1.0);
    }

    #[tokio::test]
    async fn indexing_is_idempotent() {
        let index = lexical();
        let tokens = toks(&["a", "b", "c"]);
        index.insert("sub-1", &tokens).await.unwrap();
        let fp_len = index.fingerprint_bucket_len(&tokens).await.unwrap();
        let tok_len = index.token_bucket_len("a").await.unwrap();

        index.insert("sub-1", &tokens).await.unwrap();
        assert_eq!(index.fingerprint_bucket_len(&tokens).await.unwrap(), fp_len);
        assert_eq!(index.token_bucket_len("a").await.unwrap(), tok_len);
    }

    #[tokio::test]
    async fn dedupe_preserves_first_occurrence_order() {
        let unique = dedupe_tokens(&toks(&["b", "a", "b", "c", "a", "d"]));
        assert_eq!(unique, toks(&["b", "a", "c", "d"]));
    }

    #[tokio::test]
    async fn feature_cache_round_trips_histogram_and_embedding() {
        let store: Arc<dyn FeatureStore> = Arc::new(MemoryStore::new());
        let cache = FeatureCache::new(store);

        assert!(cache.get_histogram("missing").await.unwrap().is_none());

        let mut histogram = AstHistogram::new();
        histogram.insert("kw:def".into(), 1);
        histogram.insert("identifier".into(), 4);
        cache.put_histogram("sub-1", &histogram).await.unwrap();
        assert_eq!(cache.get_histogram("sub-1").await.unwrap(), Some(histogram));

        let embedding: Embedding = vec![0.6, 0.8];
        cache.put_embedding("sub-1", &embedding).await.unwrap();
        assert_eq!(cache.get_embedding("sub-1").await.unwrap(), Some(embedding));
    }
}
