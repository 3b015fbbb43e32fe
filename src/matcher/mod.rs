//! Reference indexing and topic → reference matching.

pub mod scoring;


pub use scoring::{FALLBACK_SOURCE_TYPE, final_score, rank_candidates};

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::breaker::BreakerRegistry;
use crate::chunker::DocumentChunker;
use crate::config::{Config, MatcherConfig, TrustDefaults};
use crate::constants::{OVERFETCH_FACTOR, SERVICE_EMBEDDING, SERVICE_VECTOR_STORE};
use crate::embedding::EmbeddingProvider;
use crate::error::{PipelineError, PipelineResult};
use crate::model::{MatchedReference, ReferenceChunk, ReferenceDocument, Topic};
use crate::representation::WeightedRepresentationBuilder;
use crate::retry::RetryPolicy;
use crate::vectordb::{VectorPoint, VectorStore};

/// Indexes reference documents and resolves ranked matches for topics.
///
/// Embedding calls run inside the `embedding` breaker, store calls inside the
/// `vector_store` breaker, each with the retry policy inside the breaker.
pub struct ReferenceMatcher<S: VectorStore> {
    store: Arc<S>,
    embedder: Arc<dyn EmbeddingProvider>,
    breakers: Arc<BreakerRegistry>,
    retry: RetryPolicy,
    builder: WeightedRepresentationBuilder,
    chunker: DocumentChunker,
    trust: TrustDefaults,
    config: MatcherConfig,
    collection: String,
}

impl<S: VectorStore> ReferenceMatcher<S> {
    pub fn new(
        store: Arc<S>,
        embedder: Arc<dyn EmbeddingProvider>,
        breakers: Arc<BreakerRegistry>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            embedder,
            breakers,
            retry: RetryPolicy::new(config.retry),
            builder: WeightedRepresentationBuilder::new(config.weights),
            chunker: DocumentChunker::new(config.chunking),
            trust: config.trust,
            config: config.matcher,
            collection: config.vector_store.collection.clone(),
        }
    }

    /// Replaces the retry policy (tests use [`RetryPolicy::none`]).
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Chunks, embeds and writes `documents`. Returns the number of records written.
    ///
    /// Trust left at the generic default is replaced by the source-type default. A
    /// precomputed embedding is used for documents stored whole when its dimension matches.
    #[instrument(skip(self, documents), fields(documents = documents.len(), collection = %self.collection))]
    pub async fn index(&self, documents: &[ReferenceDocument]) -> PipelineResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let dimension = self.embedder.dimension();
        let mut records: Vec<(ReferenceChunk, Option<Vec<f32>>)> = Vec::new();

        for document in documents {
            let trust = self.trust.resolve(document.source_type, document.trust_score);
            let chunks = self.chunker.chunk_document(document, trust);
            let precomputed = match &document.embedding {
                Some(vector) if vector.len() == dimension => Some(vector.clone()),
                Some(vector) => {
                    warn!(
                        document_id = %document.id,
                        expected = dimension,
                        actual = vector.len(),
                        "Ignoring precomputed embedding with wrong dimension"
                    );
                    None
                }
                None => None,
            };

            for chunk in chunks {
                let vector = if chunk.is_chunk { None } else { precomputed.clone() };
                records.push((chunk, vector));
            }
        }

        let pending: Vec<String> = records
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(c, _)| c.text.clone())
            .collect();
        let mut encoded = if pending.is_empty() {
            Vec::new().into_iter()
        } else {
            self.embed_batch(pending).await?.into_iter()
        };

        let mut points = Vec::with_capacity(records.len());
        for (chunk, vector) in records {
            let vector = match vector.or_else(|| encoded.next()) {
                Some(vector) => vector,
                None => {
                    return Err(PipelineError::permanent(
                        SERVICE_EMBEDDING,
                        "encode_batch",
                        "provider returned fewer vectors than requested",
                    ));
                }
            };
            points.push(VectorPoint::from_chunk(chunk, vector));
        }

        let count = points.len();
        let collection = self.collection.as_str();
        self.breakers
            .get(SERVICE_VECTOR_STORE)
            .call("add", || {
                self.retry.run("add", || async {
                    self.store
                        .ensure_collection(collection, dimension as u64)
                        .await
                        .map_err(|e| e.into_pipeline("ensure_collection"))?;
                    self.store
                        .upsert(collection, points.clone())
                        .await
                        .map_err(|e| e.into_pipeline("add"))
                })
            })
            .await?;

        info!(
            documents = documents.len(),
            records = count,
            "Indexed reference documents"
        );
        Ok(count)
    }

    /// Resolves up to `top_k` references for `topic`, best first.
    ///
    /// Fetches `min(3 × top_k, max_candidates)` candidates, optionally restricted to
    /// `domain_filter`, and ranks them with [`rank_candidates`].
    #[instrument(skip(self, topic), fields(topic_id = %topic.id))]
    pub async fn try_find(
        &self,
        topic: &Topic,
        top_k: usize,
        domain_filter: Option<&str>,
    ) -> PipelineResult<Vec<MatchedReference>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let text = self.builder.build(topic);
        let vector = self.embed_one(&text).await?;

        let limit = top_k
            .saturating_mul(OVERFETCH_FACTOR)
            .min(self.config.max_candidates)
            .max(1) as u64;
        let collection = self.collection.as_str();

        let candidates = self
            .breakers
            .get(SERVICE_VECTOR_STORE)
            .call("query", || {
                self.retry.run("query", || async {
                    self.store
                        .query(collection, vector.clone(), limit, domain_filter)
                        .await
                        .map_err(|e| e.into_pipeline("query"))
                })
            })
            .await?;

        let fetched = candidates.len();
        let matches = rank_candidates(candidates, top_k, &self.config, &self.trust);
        debug!(fetched, matched = matches.len(), "Ranked reference candidates");
        Ok(matches)
    }

    /// Like [`try_find`](Self::try_find) but fails open: any error yields an empty list.
    pub async fn find(
        &self,
        topic: &Topic,
        top_k: usize,
        domain_filter: Option<&str>,
    ) -> Vec<MatchedReference> {
        match self.try_find(topic, top_k, domain_filter).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!(
                    topic_id = %topic.id,
                    error = %e,
                    category = %e.category(),
                    "Reference lookup failed, returning no matches"
                );
                Vec::new()
            }
        }
    }

    /// Drops the whole collection. Returns `false` if it did not exist.
    pub async fn reset_index(&self) -> PipelineResult<bool> {
        let collection = self.collection.as_str();
        let existed = self
            .breakers
            .get(SERVICE_VECTOR_STORE)
            .call("delete_collection", || {
                self.retry.run("delete_collection", || async {
                    self.store
                        .delete_collection(collection)
                        .await
                        .map_err(|e| e.into_pipeline("delete_collection"))
                })
            })
            .await?;
        info!(collection, existed, "Reference index reset");
        Ok(existed)
    }

    async fn embed_one(&self, text: &str) -> PipelineResult<Vec<f32>> {
        self.breakers
            .get(SERVICE_EMBEDDING)
            .call("encode", || {
                self.retry.run("encode", || async {
                    self.embedder
                        .encode(text)
                        .await
                        .map_err(|e| e.into_pipeline("encode"))
                })
            })
            .await
    }

    async fn embed_batch(&self, texts: Vec<String>) -> PipelineResult<Vec<Vec<f32>>> {
        let texts = texts.as_slice();
        self.breakers
            .get(SERVICE_EMBEDDING)
            .call("encode_batch", || {
                self.retry.run("encode_batch", || async {
                    self.embedder
                        .encode_batch(texts)
                        .await
                        .map_err(|e| e.into_pipeline("encode_batch"))
                })
            })
            .await
    }
}

impl<S: VectorStore> std::fmt::Debug for ReferenceMatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceMatcher")
            .field("collection", &self.collection)
            .field("embedder", &self.embedder.name())
            .field("config", &self.config)
            .finish()
    }
}
