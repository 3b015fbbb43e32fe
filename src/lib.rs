//! Refcheck library crate (used by the `refcheck` binary and integration tests).
//!
//! Matches exam-preparation topics against authoritative references stored in a vector
//! database, then derives content gaps and quality scores from the matches.
//!
//! # Public API Surface
//!
//! ## Composition
//! - [`Pipeline`] - owns every component; `find_references`, `validate`, `index_references`
//! - [`Config`], [`ConfigError`] - every tunable, with `REFCHECK_*` env overrides
//!
//! ## Matching
//! - [`ReferenceMatcher`] - indexing and ranked lookup
//! - [`DocumentChunker`] - overlapping, boundary-aware splitting of long references
//! - [`WeightedRepresentationBuilder`] - topic → weighted text for embedding
//! - [`EmbeddingProvider`], [`StubEmbedder`], [`HttpEmbeddingProvider`], [`CachedEmbedder`]
//! - [`VectorStore`], [`QdrantStore`]
//!
//! ## Validation
//! - [`ValidationEngine`], [`ValidationResult`], [`ContentGap`], [`GapType`]
//! - [`ProposalAssistant`] - LLM keyword and definition proposals with offline fallbacks
//!
//! ## Resilience
//! - [`CircuitBreaker`], [`BreakerRegistry`] - per-service breakers
//! - [`RetryPolicy`] - exponential backoff for transient errors
//! - [`CacheStore`] - best-effort namespaced cache
//! - [`ExecutionBridge`] - bounded blocking entry points
//! - [`PipelineError`], [`ErrorCategory`]
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod breaker;
pub mod bridge;
pub mod cache;
pub mod chunker;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod error;
pub mod hashing;
pub mod llm;
pub mod matcher;
pub mod model;
pub mod pipeline;
pub mod representation;
pub mod retry;
pub mod validation;
pub mod vectordb;

pub use breaker::{BreakerRegistry, BreakerSnapshot, CircuitBreaker, CircuitState};
pub use bridge::{BridgeError, ExecutionBridge};
pub use cache::{CacheBackend, CacheError, CacheNamespace, CacheStore, MemoryCacheBackend};
pub use chunker::{DocumentChunker, TextChunk};
pub use config::{Config, ConfigError};
pub use embedding::{
    CachedEmbedder, EmbeddingError, EmbeddingProvider, HttpEmbeddingProvider, StubEmbedder,
    compute_similarity,
};
pub use error::{ErrorCategory, PipelineError, PipelineResult};
pub use llm::{GenaiProvider, LlmError, LlmProvider, ProposalAssistant};
pub use matcher::{ReferenceMatcher, final_score};
pub use model::{MatchedReference, ReferenceChunk, ReferenceDocument, SourceType, Topic};
pub use pipeline::Pipeline;
pub use representation::WeightedRepresentationBuilder;
pub use retry::RetryPolicy;
pub use validation::{ContentGap, GapType, ValidationEngine, ValidationResult};
pub use vectordb::{QdrantStore, VectorDbError, VectorStore};

#[cfg(any(test, feature = "mock"))]
pub use llm::ScriptedLlm;
#[cfg(any(test, feature = "mock"))]
pub use vectordb::MockVectorStore;
