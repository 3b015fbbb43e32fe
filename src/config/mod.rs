//! Environment-backed configuration.
//!
//! Every tunable of the pipeline lives in one immutable [`Config`]. Components copy the
//! sections they need at construction time. Override defaults with `REFCHECK_*` variables.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_COLLECTION_NAME, DEFAULT_EMBEDDING_DIM, GENERIC_DEFAULT_TRUST, MAX_QUERY_CANDIDATES,
    SECONDS_PER_DAY, SECONDS_PER_HOUR,
};
use crate::model::SourceType;

/// Default Qdrant URL used when `REFCHECK_QDRANT_URL` is not set.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Default model name passed to the LLM provider.
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Reference chunking parameters (characters, not tokens).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkingConfig {
    /// Documents longer than this are split; also the hard cap per chunk. Default: `5000`.
    pub threshold_chars: usize,
    /// Characters shared between consecutive chunks. Default: `500`.
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            threshold_chars: 5000,
            overlap_chars: 500,
        }
    }
}

/// Relative importance of each topic field in the embedded representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldWeights {
    pub definition: f32,
    pub lead: f32,
    pub keywords: f32,
    pub hashtags: f32,
    pub memory_aid: f32,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            definition: 0.35,
            lead: 0.25,
            keywords: 0.25,
            hashtags: 0.10,
            memory_aid: 0.05,
        }
    }
}

impl FieldWeights {
    fn all(&self) -> [(&'static str, f32); 5] {
        [
            ("weights.definition", self.definition),
            ("weights.lead", self.lead),
            ("weights.keywords", self.keywords),
            ("weights.hashtags", self.hashtags),
            ("weights.memory_aid", self.memory_aid),
        ]
    }
}

/// Trust assigned to references whose producer left the generic default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrustDefaults {
    /// The "unset" marker value. Default: `0.5`.
    pub generic: f32,
    pub book: f32,
    pub markdown: f32,
}

impl Default for TrustDefaults {
    fn default() -> Self {
        Self {
            generic: GENERIC_DEFAULT_TRUST,
            book: 0.95,
            markdown: 0.80,
        }
    }
}

impl TrustDefaults {
    /// Default trust for a source type.
    pub fn for_source(&self, source_type: SourceType) -> f32 {
        match source_type {
            SourceType::Book => self.book,
            SourceType::Markdown => self.markdown,
        }
    }

    /// Replaces the generic marker with the source-type default.
    pub fn resolve(&self, source_type: SourceType, trust: f32) -> f32 {
        if (trust - self.generic).abs() < f32::EPSILON {
            self.for_source(source_type)
        } else {
            trust
        }
    }
}

/// Scoring and retrieval parameters of the reference matcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatcherConfig {
    /// Similarity multiplier independent of trust. Default: `0.7`.
    pub base_weight: f32,
    /// Similarity multiplier scaled by trust. Default: `0.3`.
    pub trust_weight: f32,
    /// Minimum final score for book references. Default: `0.60`.
    pub book_threshold: f32,
    /// Minimum final score for markdown references. Default: `0.65`.
    pub markdown_threshold: f32,
    /// Matches returned when the caller does not specify. Default: `5`.
    pub default_top_k: usize,
    /// Cap on candidates fetched per query. Default: `100`.
    pub max_candidates: usize,
    /// Maximum characters copied into a match snippet. Default: `500`.
    pub snippet_chars: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            base_weight: 0.7,
            trust_weight: 0.3,
            book_threshold: 0.60,
            markdown_threshold: 0.65,
            default_top_k: 5,
            max_candidates: MAX_QUERY_CANDIDATES,
            snippet_chars: 500,
        }
    }
}

impl MatcherConfig {
    /// Minimum final score for a source type.
    pub fn threshold_for(&self, source_type: SourceType) -> f32 {
        match source_type {
            SourceType::Book => self.book_threshold,
            SourceType::Markdown => self.markdown_threshold,
        }
    }
}

/// Circuit breaker parameters shared by every registered service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakerConfig {
    /// Consecutive counted failures before opening. Default: `5`.
    pub failure_threshold: u32,
    /// Time after the last failure before a trial call is allowed. Default: `60s`.
    pub recovery_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
        }
    }
}

/// Retry parameters for transient failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first. Default: `3`.
    pub max_attempts: u32,
    /// Wait before the second attempt. Default: `1s`.
    pub min_wait: Duration,
    /// Upper bound on any wait. Default: `10s`.
    pub max_wait: Duration,
    /// Backoff growth factor. Default: `2.0`.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

/// Cache backend and per-namespace TTLs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheConfig {
    /// When false the pipeline runs with a disabled cache. Default: `true`.
    pub enabled: bool,
    /// Max entries kept by the in-process backend. Default: `50_000`.
    pub capacity: u64,
    pub embedding_ttl: Duration,
    pub validation_ttl: Duration,
    pub llm_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 50_000,
            embedding_ttl: Duration::from_secs(7 * SECONDS_PER_DAY),
            validation_ttl: Duration::from_secs(SECONDS_PER_HOUR),
            llm_ttl: Duration::from_secs(SECONDS_PER_DAY),
        }
    }
}

/// Completeness minima and quality bands used by the validation engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationConfig {
    pub min_lead_chars: usize,
    pub min_definition_chars: usize,
    pub min_keywords: usize,
    pub min_hashtags: usize,
    pub min_memory_aid_chars: usize,
    /// Final score above which a match counts as high quality. Default: `0.8`.
    pub high_quality_score: f32,
    /// Final score above which a match counts as medium quality. Default: `0.7`.
    pub medium_quality_score: f32,
    /// Snippet/definition length ratio that triggers an incomplete-definition gap. Default: `1.5`.
    pub expansion_ratio: f32,
    /// Matches inspected for incomplete-definition gaps. Default: `2`.
    pub accuracy_checks: usize,
    /// Matches averaged into the accuracy score. Default: `3`.
    pub accuracy_top_n: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_lead_chars: 30,
            min_definition_chars: 50,
            min_keywords: 3,
            min_hashtags: 2,
            min_memory_aid_chars: 10,
            high_quality_score: 0.8,
            medium_quality_score: 0.7,
            expansion_ratio: 1.5,
            accuracy_checks: 2,
            accuracy_top_n: 3,
        }
    }
}

/// Embedding provider selection.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible `/embeddings` endpoint. `None` selects the deterministic stub.
    pub endpoint: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
    pub dimension: usize,
    pub timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: "text-embedding-3-small".to_string(),
            api_key: None,
            dimension: DEFAULT_EMBEDDING_DIM,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Limits of the blocking bridge executor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BridgeConfig {
    /// Maximum concurrently active bridge invocations. Default: `4`.
    pub max_concurrent: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self { max_concurrent: 4 }
    }
}

/// Pipeline configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `REFCHECK_*` overrides on top of defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub vector_store: VectorStoreConfig,
    pub embedding: EmbeddingConfig,
    pub llm_model: LlmModel,
    pub chunking: ChunkingConfig,
    pub weights: FieldWeights,
    pub trust: TrustDefaults,
    pub matcher: MatcherConfig,
    pub breaker: BreakerConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub validation: ValidationConfig,
    pub bridge: BridgeConfig,
}

/// Vector store endpoint and collection.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorStoreConfig {
    /// Qdrant endpoint URL. Default: `http://localhost:6334`.
    pub url: String,
    /// Collection holding reference chunks. Default: `reference_chunks`.
    pub collection: String,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_QDRANT_URL.to_string(),
            collection: DEFAULT_COLLECTION_NAME.to_string(),
        }
    }
}

/// Model identifier handed to the LLM provider.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModel(pub String);

impl Default for LlmModel {
    fn default() -> Self {
        Self(DEFAULT_LLM_MODEL.to_string())
    }
}

impl LlmModel {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Config {
    const ENV_QDRANT_URL: &'static str = "REFCHECK_QDRANT_URL";
    const ENV_COLLECTION: &'static str = "REFCHECK_COLLECTION";
    const ENV_EMBEDDING_URL: &'static str = "REFCHECK_EMBEDDING_URL";
    const ENV_EMBEDDING_MODEL: &'static str = "REFCHECK_EMBEDDING_MODEL";
    const ENV_EMBEDDING_API_KEY: &'static str = "REFCHECK_EMBEDDING_API_KEY";
    const ENV_EMBEDDING_DIM: &'static str = "REFCHECK_EMBEDDING_DIM";
    const ENV_LLM_MODEL: &'static str = "REFCHECK_LLM_MODEL";
    const ENV_CHUNK_THRESHOLD: &'static str = "REFCHECK_CHUNK_THRESHOLD";
    const ENV_CHUNK_OVERLAP: &'static str = "REFCHECK_CHUNK_OVERLAP";
    const ENV_BASE_WEIGHT: &'static str = "REFCHECK_BASE_WEIGHT";
    const ENV_TRUST_WEIGHT: &'static str = "REFCHECK_TRUST_WEIGHT";
    const ENV_BOOK_THRESHOLD: &'static str = "REFCHECK_BOOK_THRESHOLD";
    const ENV_MARKDOWN_THRESHOLD: &'static str = "REFCHECK_MARKDOWN_THRESHOLD";
    const ENV_BREAKER_THRESHOLD: &'static str = "REFCHECK_BREAKER_THRESHOLD";
    const ENV_BREAKER_RECOVERY_SECS: &'static str = "REFCHECK_BREAKER_RECOVERY_SECS";
    const ENV_RETRY_ATTEMPTS: &'static str = "REFCHECK_RETRY_ATTEMPTS";
    const ENV_CACHE_ENABLED: &'static str = "REFCHECK_CACHE_ENABLED";
    const ENV_CACHE_CAPACITY: &'static str = "REFCHECK_CACHE_CAPACITY";
    const ENV_BRIDGE_MAX: &'static str = "REFCHECK_BRIDGE_MAX_CONCURRENT";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let d = Self::default();

        let vector_store = VectorStoreConfig {
            url: Self::parse_string_from_env(Self::ENV_QDRANT_URL, d.vector_store.url),
            collection: Self::parse_string_from_env(
                Self::ENV_COLLECTION,
                d.vector_store.collection,
            ),
        };

        let embedding = EmbeddingConfig {
            endpoint: Self::parse_optional_string_from_env(Self::ENV_EMBEDDING_URL),
            model: Self::parse_string_from_env(Self::ENV_EMBEDDING_MODEL, d.embedding.model),
            api_key: Self::parse_optional_string_from_env(Self::ENV_EMBEDDING_API_KEY),
            dimension: Self::parse_usize_from_env(
                Self::ENV_EMBEDDING_DIM,
                d.embedding.dimension,
            )?,
            timeout: d.embedding.timeout,
        };

        let llm_model = LlmModel(Self::parse_string_from_env(
            Self::ENV_LLM_MODEL,
            d.llm_model.0,
        ));

        let chunking = ChunkingConfig {
            threshold_chars: Self::parse_usize_from_env(
                Self::ENV_CHUNK_THRESHOLD,
                d.chunking.threshold_chars,
            )?,
            overlap_chars: Self::parse_usize_from_env(
                Self::ENV_CHUNK_OVERLAP,
                d.chunking.overlap_chars,
            )?,
        };

        let matcher = MatcherConfig {
            base_weight: Self::parse_f32_from_env(Self::ENV_BASE_WEIGHT, d.matcher.base_weight)?,
            trust_weight: Self::parse_f32_from_env(
                Self::ENV_TRUST_WEIGHT,
                d.matcher.trust_weight,
            )?,
            book_threshold: Self::parse_f32_from_env(
                Self::ENV_BOOK_THRESHOLD,
                d.matcher.book_threshold,
            )?,
            markdown_threshold: Self::parse_f32_from_env(
                Self::ENV_MARKDOWN_THRESHOLD,
                d.matcher.markdown_threshold,
            )?,
            ..d.matcher
        };

        let breaker = BreakerConfig {
            failure_threshold: Self::parse_u32_from_env(
                Self::ENV_BREAKER_THRESHOLD,
                d.breaker.failure_threshold,
            )?,
            recovery_timeout: Self::parse_u64_from_env(
                Self::ENV_BREAKER_RECOVERY_SECS,
                d.breaker.recovery_timeout.as_secs(),
            )
            .map(Duration::from_secs)?,
        };

        let retry = RetryConfig {
            max_attempts: Self::parse_u32_from_env(
                Self::ENV_RETRY_ATTEMPTS,
                d.retry.max_attempts,
            )?,
            ..d.retry
        };

        let cache = CacheConfig {
            enabled: Self::parse_bool_from_env(Self::ENV_CACHE_ENABLED, d.cache.enabled)?,
            capacity: Self::parse_u64_from_env(Self::ENV_CACHE_CAPACITY, d.cache.capacity)?,
            ..d.cache
        };

        let bridge = BridgeConfig {
            max_concurrent: Self::parse_usize_from_env(
                Self::ENV_BRIDGE_MAX,
                d.bridge.max_concurrent,
            )?,
        };

        Ok(Self {
            vector_store,
            embedding,
            llm_model,
            chunking,
            weights: d.weights,
            trust: d.trust,
            matcher,
            breaker,
            retry,
            cache,
            validation: d.validation,
            bridge,
        })
    }

    /// Checks ranges and cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunking.threshold_chars == 0 {
            return Err(ConfigError::OutOfRange {
                field: "chunking.threshold_chars",
                reason: "must be > 0".to_string(),
            });
        }
        if self.chunking.overlap_chars >= self.chunking.threshold_chars {
            return Err(ConfigError::Inconsistent {
                reason: format!(
                    "chunk overlap ({}) must be smaller than chunk threshold ({})",
                    self.chunking.overlap_chars, self.chunking.threshold_chars
                ),
            });
        }

        for (field, weight) in self.weights.all() {
            check_unit(field, weight)?;
        }

        check_unit("trust.generic", self.trust.generic)?;
        check_unit("trust.book", self.trust.book)?;
        check_unit("trust.markdown", self.trust.markdown)?;

        check_non_negative("matcher.base_weight", self.matcher.base_weight)?;
        check_non_negative("matcher.trust_weight", self.matcher.trust_weight)?;
        check_unit("matcher.book_threshold", self.matcher.book_threshold)?;
        check_unit("matcher.markdown_threshold", self.matcher.markdown_threshold)?;
        if self.matcher.max_candidates == 0 {
            return Err(ConfigError::OutOfRange {
                field: "matcher.max_candidates",
                reason: "must be > 0".to_string(),
            });
        }

        if self.breaker.failure_threshold == 0 {
            return Err(ConfigError::OutOfRange {
                field: "breaker.failure_threshold",
                reason: "must be > 0".to_string(),
            });
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::OutOfRange {
                field: "retry.max_attempts",
                reason: "must be >= 1".to_string(),
            });
        }
        if self.retry.min_wait > self.retry.max_wait {
            return Err(ConfigError::Inconsistent {
                reason: format!(
                    "retry min_wait ({:?}) exceeds max_wait ({:?})",
                    self.retry.min_wait, self.retry.max_wait
                ),
            });
        }
        if !(self.retry.multiplier.is_finite() && self.retry.multiplier >= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "retry.multiplier",
                reason: format!("must be >= 1.0, got {}", self.retry.multiplier),
            });
        }

        if self.validation.medium_quality_score > self.validation.high_quality_score {
            return Err(ConfigError::Inconsistent {
                reason: "validation medium-quality band must not exceed high-quality band"
                    .to_string(),
            });
        }

        if self.embedding.dimension == 0 {
            return Err(ConfigError::OutOfRange {
                field: "embedding.dimension",
                reason: "must be > 0".to_string(),
            });
        }

        if self.bridge.max_concurrent == 0 {
            return Err(ConfigError::OutOfRange {
                field: "bridge.max_concurrent",
                reason: "must be > 0".to_string(),
            });
        }

        Ok(())
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_u64_from_env(var_name: &'static str, default: u64) -> Result<u64, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::IntParseError {
                    name: var_name,
                    value,
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_u32_from_env(var_name: &'static str, default: u32) -> Result<u32, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::IntParseError {
                    name: var_name,
                    value,
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_usize_from_env(var_name: &'static str, default: usize) -> Result<usize, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::IntParseError {
                    name: var_name,
                    value,
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_f32_from_env(var_name: &'static str, default: f32) -> Result<f32, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::FloatParseError {
                    name: var_name,
                    value,
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_bool_from_env(var_name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match env::var(var_name) {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidBool {
                    name: var_name,
                    value,
                }),
            },
            Err(_) => Ok(default),
        }
    }
}

fn check_unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field,
            reason: format!("must be within [0, 1], got {}", value),
        });
    }
    Ok(())
}

fn check_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(ConfigError::OutOfRange {
            field,
            reason: format!("must be a finite value >= 0, got {}", value),
        });
    }
    Ok(())
}
