//! Text embedding providers.
//!
//! - [`StubEmbedder`] is deterministic and needs no model or network.
//! - [`HttpEmbeddingProvider`] calls an OpenAI-compatible `/embeddings` endpoint.
//! - [`CachedEmbedder`] wraps any provider with the `embedding:text:` cache namespace.
//!
//! Every provider returns unit-norm vectors, so cosine similarity is a dot product.

pub mod cached;
mod error;
pub mod http;
pub mod stub;


pub use cached::CachedEmbedder;
pub use error::EmbeddingError;
pub use http::HttpEmbeddingProvider;
pub use stub::StubEmbedder;

use async_trait::async_trait;

/// Encodes text into fixed-dimension unit vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short provider label used in logs.
    fn name(&self) -> &'static str;

    /// Output dimension of every vector.
    fn dimension(&self) -> usize;

    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Encodes several texts, preserving input order.
    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.encode(text).await?);
        }
        Ok(out)
    }
}

/// Scales `vector` to unit length in place. Zero vectors are left untouched.
pub fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Cosine similarity clamped to `[0, 1]`. Mismatched or zero vectors score 0.
pub fn compute_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let cosine = dot / (norm_a * norm_b);
    if cosine.is_finite() {
        cosine.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
