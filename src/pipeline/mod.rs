//! Composition root.
//!
//! [`Pipeline`] owns one instance of every component, built from a single [`Config`]. All
//! components share the same cache store and breaker registry, so a tripped `embedding`
//! breaker is seen by indexing and matching alike.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{info, instrument, warn};

use crate::breaker::{BreakerRegistry, BreakerSnapshot};
use crate::bridge::ExecutionBridge;
use crate::cache::CacheStore;
use crate::config::Config;
use crate::embedding::{CachedEmbedder, EmbeddingProvider, HttpEmbeddingProvider, StubEmbedder};
use crate::error::PipelineResult;
use crate::llm::{DefinitionDraft, GenaiProvider, KeywordSuggestions, LlmProvider, ProposalAssistant};
use crate::matcher::ReferenceMatcher;
use crate::model::{MatchedReference, ReferenceDocument, Topic};
use crate::retry::RetryPolicy;
use crate::validation::{ValidationEngine, ValidationResult};
use crate::vectordb::{QdrantStore, VectorStore};

/// Reference matching and validation over one vector store.
pub struct Pipeline<S: VectorStore> {
    config: Config,
    cache: CacheStore,
    breakers: Arc<BreakerRegistry>,
    matcher: ReferenceMatcher<S>,
    validator: ValidationEngine,
    assistant: ProposalAssistant,
    bridge: ExecutionBridge,
}

impl Pipeline<QdrantStore> {
    /// Builds the production pipeline: Qdrant store, HTTP embeddings and a genai LLM.
    ///
    /// Without an embedding endpoint the deterministic stub embedder is used.
    pub fn from_config(config: Config) -> PipelineResult<Self> {
        let store = QdrantStore::new(&config.vector_store.url)
            .map_err(|e| e.into_pipeline("connect"))?;

        let embedder: Arc<dyn EmbeddingProvider> = if config.embedding.endpoint.is_some() {
            Arc::new(
                HttpEmbeddingProvider::new(&config.embedding)
                    .map_err(|e| e.into_pipeline("connect"))?,
            )
        } else {
            warn!(
                dimension = config.embedding.dimension,
                "No embedding endpoint configured, using stub embedder"
            );
            Arc::new(StubEmbedder::new(config.embedding.dimension))
        };

        let llm = Arc::new(GenaiProvider::new(config.llm_model.clone()));
        Ok(Self::new(config, Arc::new(store), embedder, llm))
    }
}

impl<S: VectorStore> Pipeline<S> {
    /// Wires the components around explicit providers.
    pub fn new(
        config: Config,
        store: Arc<S>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        let cache = CacheStore::from_config(config.cache);
        let breakers = Arc::new(BreakerRegistry::new(config.breaker));
        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(CachedEmbedder::new(embedder, cache.clone()));

        let matcher = ReferenceMatcher::new(store, embedder, Arc::clone(&breakers), &config);
        let validator = ValidationEngine::new(cache.clone(), &config);
        let assistant = ProposalAssistant::new(
            llm,
            cache.clone(),
            Arc::clone(&breakers),
            RetryPolicy::new(config.retry),
        );
        let bridge = ExecutionBridge::new(config.bridge);

        info!(
            collection = %config.vector_store.collection,
            cache_enabled = cache.is_enabled(),
            bridge_max = bridge.max_concurrent(),
            "Pipeline initialized"
        );

        Self {
            config,
            cache,
            breakers,
            matcher,
            validator,
            assistant,
            bridge,
        }
    }

    /// Replaces the retry policy of every guarded call.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.matcher = self.matcher.with_retry(retry);
        self.assistant = self.assistant.with_retry(retry);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn breakers(&self) -> &Arc<BreakerRegistry> {
        &self.breakers
    }

    pub fn matcher(&self) -> &ReferenceMatcher<S> {
        &self.matcher
    }

    pub fn validator(&self) -> &ValidationEngine {
        &self.validator
    }

    pub fn assistant(&self) -> &ProposalAssistant {
        &self.assistant
    }

    pub fn bridge(&self) -> &ExecutionBridge {
        &self.bridge
    }

    /// State of every breaker created so far.
    pub fn breaker_snapshot(&self) -> Vec<BreakerSnapshot> {
        self.breakers.snapshot()
    }

    /// Ranked references for `topic`. Fails open to an empty list.
    ///
    /// `top_k` defaults to the configured `default_top_k`.
    pub async fn find_references(
        &self,
        topic: &Topic,
        top_k: Option<usize>,
        domain_filter: Option<&str>,
    ) -> Vec<MatchedReference> {
        let top_k = top_k.unwrap_or(self.config.matcher.default_top_k);
        self.matcher.find(topic, top_k, domain_filter).await
    }

    /// Gap analysis for `topic` against `matches`. Always produces a result.
    pub async fn validate(&self, topic: &Topic, matches: &[MatchedReference]) -> ValidationResult {
        self.validator.validate(topic, matches).await
    }

    /// Finds references for `topic` within its own domain, then validates against them.
    #[instrument(skip(self, topic), fields(topic_id = %topic.id))]
    pub async fn check_topic(&self, topic: &Topic) -> ValidationResult {
        let domain = topic.domain.trim();
        let domain_filter = (!domain.is_empty()).then_some(domain);
        let matches = self.find_references(topic, None, domain_filter).await;
        self.validate(topic, &matches).await
    }

    /// [`check_topic`](Self::check_topic) for several topics concurrently, in input order.
    pub async fn check_topics(&self, topics: &[Topic]) -> Vec<ValidationResult> {
        join_all(topics.iter().map(|topic| self.check_topic(topic))).await
    }

    /// Indexes `documents`; returns the number of records written.
    pub async fn index_references(&self, documents: &[ReferenceDocument]) -> PipelineResult<usize> {
        let written = self.matcher.index(documents).await?;
        if written > 0 {
            // Stored validations carry snippets from the old reference set.
            self.validator.invalidate_all().await;
        }
        Ok(written)
    }

    /// Drops the reference collection and every stored validation.
    pub async fn reset_index(&self) -> PipelineResult<bool> {
        let existed = self.matcher.reset_index().await?;
        self.validator.invalidate_all().await;
        Ok(existed)
    }

    pub async fn invalidate_topic(&self, topic_id: &str) -> usize {
        self.validator.invalidate_topic(topic_id).await
    }

    pub async fn invalidate_reference(&self, reference_id: &str) -> usize {
        self.validator.invalidate_reference(reference_id).await
    }

    pub async fn suggest_keywords(&self, topic: &Topic, max: usize) -> KeywordSuggestions {
        self.assistant.suggest_keywords(topic, max).await
    }

    pub async fn draft_definition(
        &self,
        topic: &Topic,
        references: &[MatchedReference],
    ) -> DefinitionDraft {
        self.assistant.draft_definition(topic, references).await
    }

    /// Blocking [`find_references`](Self::find_references) for non-async callers.
    pub fn find_references_blocking(
        &self,
        topic: &Topic,
        top_k: Option<usize>,
        domain_filter: Option<&str>,
    ) -> PipelineResult<Vec<MatchedReference>> {
        self.bridge
            .run(self.find_references(topic, top_k, domain_filter))
            .map_err(|e| e.into_pipeline("find_references"))
    }

    /// Blocking [`validate`](Self::validate) for non-async callers.
    pub fn validate_blocking(
        &self,
        topic: &Topic,
        matches: &[MatchedReference],
    ) -> PipelineResult<ValidationResult> {
        self.bridge
            .run(self.validate(topic, matches))
            .map_err(|e| e.into_pipeline("validate"))
    }

    /// Blocking [`index_references`](Self::index_references) for non-async callers.
    pub fn index_references_blocking(
        &self,
        documents: &[ReferenceDocument],
    ) -> PipelineResult<usize> {
        self.bridge
            .run(self.index_references(documents))
            .map_err(|e| e.into_pipeline("index_references"))?
    }
}

impl<S: VectorStore> std::fmt::Debug for Pipeline<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("matcher", &self.matcher)
            .field("validator", &self.validator)
            .field("assistant", &self.assistant)
            .field("bridge", &self.bridge)
            .finish()
    }
}
