//! Cross-cutting, shared constants.
//!
//! Tunables live in [`crate::config::Config`]; the values here are fixed by the key format,
//! the store contract, or service naming and are not meant to be overridden.

/// Breaker/registry name of the vector store service.
pub const SERVICE_VECTOR_STORE: &str = "vector_store";
/// Breaker/registry name of the embedding provider.
pub const SERVICE_EMBEDDING: &str = "embedding";
/// Breaker/registry name of the LLM provider.
pub const SERVICE_LLM: &str = "llm";
/// Service name used in cache-related log fields.
pub const SERVICE_CACHE: &str = "cache";
/// Service name of blocking-bridge errors.
pub const SERVICE_BRIDGE: &str = "bridge";

/// Default vector collection for reference chunks.
pub const DEFAULT_COLLECTION_NAME: &str = "reference_chunks";

/// Embedding dimension used by the stub embedder and as the configured default.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Only this many leading characters of an input are hashed into a cache key.
pub const KEY_HASH_PREFIX_CHARS: usize = 2048;

/// Length of the truncated hex digest embedded in cache keys.
pub const KEY_HASH_HEX_LEN: usize = 16;

/// `find` requests `OVERFETCH_FACTOR * top_k` candidates from the store.
pub const OVERFETCH_FACTOR: usize = 3;

/// Hard cap on candidates requested from the store in one query.
pub const MAX_QUERY_CANDIDATES: usize = 100;

/// Trust value a document carries when the producer did not assign one.
pub const GENERIC_DEFAULT_TRUST: f32 = 0.5;

pub const SECONDS_PER_HOUR: u64 = 60 * 60;
pub const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;
