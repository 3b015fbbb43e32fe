use async_trait::async_trait;
use tracing::debug;

use super::{EmbeddingError, EmbeddingProvider, normalize};
use crate::constants::DEFAULT_EMBEDDING_DIM;

/// Deterministic bag-of-words embedder for tests and offline runs.
///
/// Each lowercase alphanumeric token seeds a pseudo-random vector. The text vector is the
/// normalized sum of its token vectors, so texts sharing vocabulary land close together and
/// identical texts encode identically.
#[derive(Debug, Clone, Copy)]
pub struct StubEmbedder {
    dimension: usize,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Synchronous encode; never fails.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];
        let mut tokens = 0usize;

        for token in tokenize(text) {
            tokens += 1;
            let mut state = seed(&token);
            for slot in embedding.iter_mut() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                *slot += ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            }
        }

        if tokens == 0 {
            // Non-empty but token-less input (punctuation only) still gets a stable vector.
            let mut state = seed(text);
            for slot in embedding.iter_mut() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                *slot = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            }
        }

        normalize(&mut embedding);
        embedding
    }
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn seed(token: &str) -> u64 {
    let hash = blake3::hash(token.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        debug!(text_len = text.len(), "Generating stub embedding");
        Ok(self.embed(text))
    }
}
