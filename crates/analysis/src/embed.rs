//! Embedding boundary and the bundled hash-seeded embedder.

use async_trait::async_trait;
use fxhash::hash64;

use crate::ast::TokenClassExtractor;
use crate::normalize::CodeNormalizer;
use crate::AnalysisError;

/// Fixed-length, L2-normalized vector representing a submission's semantics.
pub type Embedding = Vec<f32>;

/// Maps source text to a pre-normalized embedding vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, source: &str) -> Result<Embedding, AnalysisError>;
}

/// Scale a vector to unit L2 norm. Zero vectors are left untouched.
pub fn l2_normalize_in_place(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in v.iter_mut() {
            *value /= norm;
        }
    }
}

/// Deterministic local embedder.
///
/// Builds a bag-of-token-classes vector: each token class hashes to a
/// sinusoid basis vector which is accumulated once per occurrence, and the
/// sum is L2-normalized. Submissions with the same token-class bag (identical
/// modulo formatting, comments, or renames) embed to the same point; code
/// with partially overlapping structure lands nearby. Line-comment handling
/// follows the configured language hint; production embedders replace this
/// with a trained model behind the same trait.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
    language_hint: String,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self {
            dim: 384,
            language_hint: "python".to_string(),
        }
    }
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_language(language: impl Into<String>) -> Self {
        Self {
            language_hint: language.into(),
            ..Self::default()
        }
    }

    fn accumulate(&self, class: &str, count: u32, acc: &mut [f32]) {
        let h = hash64(class.as_bytes());
        for (idx, value) in acc.iter_mut().enumerate() {
            let basis = ((h.rotate_left((idx % 64) as u32)) as f32 * 1e-4).sin();
            *value += basis * count as f32;
        }
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, source: &str) -> Result<Embedding, AnalysisError> {
        let tokens = CodeNormalizer::tokenize(source, &self.language_hint);
        let mut histogram = std::collections::BTreeMap::new();
        for token in &tokens {
            *histogram
                .entry(TokenClassExtractor::classify_token(token))
                .or_insert(0u32) += 1;
        }
        let mut v = vec![0f32; self.dim];
        for (class, count) in &histogram {
            self.accumulate(class, *count, &mut v);
        }
        l2_normalize_in_place(&mut v);
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn embedding_is_unit_length() {
        let embedder = HashEmbedder::new();
        let v = embedder.embed("def f(x):\n    return x + 1").await.unwrap();
        assert_eq!(v.len(), 384);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "norm was {norm}");
    }

    #[tokio::test]
    async fn formatting_and_renames_embed_identically() {
        let embedder = HashEmbedder::new();
        let a = embedder.embed("def add(a, b):\n    return a + b").await.unwrap();
        let b = embedder
            .embed("def sum(x, y):  # renamed\n        return x    +    y")
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn unrelated_sources_are_not_collinear() {
        let embedder = HashEmbedder::new();
        let a = embedder.embed("def f(x): return x + 1").await.unwrap();
        let b = embedder
            .embed("class Queue:\n    def __init__(self):\n        self.items = []")
            .await
            .unwrap();
        assert!(dot(&a, &b) < 0.999);
    }

    #[tokio::test]
    async fn empty_source_embeds_to_zero_vector() {
        let embedder = HashEmbedder::new();
        let v = embedder.embed("").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
