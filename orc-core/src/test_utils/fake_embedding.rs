//! FakeEmbeddingProvider — deterministic, dependency-free embeddings for
//! testing the semantic store without a real embedding backend.

use crate::error::RunnerError;
use crate::provider::EmbeddingProvider;
use async_trait::async_trait;

/// Produces a fixed-dimension vector from each text's byte histogram.
/// Deterministic and cheap; not semantically meaningful, but identical
/// inputs always produce identical (and near-identical inputs,
/// near-identical) vectors, which is all the unit tests need.
pub struct FakeEmbeddingProvider {
    dimension: usize,
}

impl FakeEmbeddingProvider {
    /// Create a fake embedding provider with the given vector dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for FakeEmbeddingProvider {
    fn default() -> Self {
        Self::new(16)
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RunnerError> {
        Ok(texts.iter().map(|t| embed_one(t, self.dimension)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn embed_one(text: &str, dim: usize) -> Vec<f32> {
    let mut v = vec![0f32; dim];
    for (i, b) in text.bytes().enumerate() {
        v[i % dim] += b as f32;
    }
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identical_text_yields_identical_vector() {
        let p = FakeEmbeddingProvider::new(8);
        let a = p.embed(&["hello".to_string()]).await.unwrap();
        let b = p.embed(&["hello".to_string()]).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].len(), 8);
    }

    #[tokio::test]
    async fn different_text_yields_different_vector() {
        let p = FakeEmbeddingProvider::new(8);
        let a = p.embed(&["hello".to_string()]).await.unwrap();
        let b = p.embed(&["goodbye".to_string()]).await.unwrap();
        assert_ne!(a, b);
    }
}
