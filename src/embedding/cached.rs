use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{EmbeddingError, EmbeddingProvider};
use crate::cache::{CacheNamespace, CacheStore};
use crate::hashing::embedding_key;

/// Read-through cache in front of another provider.
///
/// Vectors are stored as JSON under `embedding:text:<hash16>` for the embedding TTL.
/// Cached vectors whose length no longer matches the provider dimension are ignored.
pub struct CachedEmbedder {
    inner: Arc<dyn EmbeddingProvider>,
    cache: CacheStore,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn EmbeddingProvider>, cache: CacheStore) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner
    }

    async fn lookup(&self, key: &str) -> Option<Vec<f32>> {
        self.cache
            .get_json::<Vec<f32>>(key)
            .await
            .filter(|v| v.len() == self.inner.dimension())
    }
}

impl std::fmt::Debug for CachedEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedEmbedder")
            .field("inner", &self.inner.name())
            .field("cache_enabled", &self.cache.is_enabled())
            .finish()
    }
}

#[async_trait]
impl EmbeddingProvider for CachedEmbedder {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let key = embedding_key(text);
        if let Some(hit) = self.lookup(&key).await {
            debug!(key = %key, "Embedding cache hit");
            return Ok(hit);
        }

        let vector = self.inner.encode(text).await?;
        self.cache
            .set_json(CacheNamespace::Embedding, &key, &vector)
            .await;
        Ok(vector)
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let keys: Vec<String> = texts.iter().map(|t| embedding_key(t)).collect();
        let mut slots: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        for key in &keys {
            slots.push(self.lookup(key).await);
        }

        let missing: Vec<usize> = (0..texts.len()).filter(|&i| slots[i].is_none()).collect();
        debug!(
            total = texts.len(),
            hits = texts.len() - missing.len(),
            "Embedding batch cache lookup"
        );

        if !missing.is_empty() {
            let pending: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let fresh = self.inner.encode_batch(&pending).await?;
            if fresh.len() != pending.len() {
                return Err(EmbeddingError::InvalidResponse {
                    reason: format!("expected {} embeddings, got {}", pending.len(), fresh.len()),
                });
            }
            for (&i, vector) in missing.iter().zip(fresh) {
                self.cache
                    .set_json(CacheNamespace::Embedding, &keys[i], &vector)
                    .await;
                slots[i] = Some(vector);
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }
}
