use std::time::Duration;

use crate::config::CacheConfig;

/// Call-site families sharing a key prefix and a TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    Embedding,
    Validation,
    LlmKeywords,
    LlmGeneration,
}

impl CacheNamespace {
    /// Key prefix including the trailing separator.
    #[inline]
    pub fn prefix(&self) -> &'static str {
        match self {
            CacheNamespace::Embedding => "embedding:",
            CacheNamespace::Validation => "validation:",
            CacheNamespace::LlmKeywords => "llm:keywords:",
            CacheNamespace::LlmGeneration => "llm:generation:",
        }
    }

    /// TTL configured for this namespace.
    #[inline]
    pub fn ttl(&self, config: &CacheConfig) -> Duration {
        match self {
            CacheNamespace::Embedding => config.embedding_ttl,
            CacheNamespace::Validation => config.validation_ttl,
            CacheNamespace::LlmKeywords | CacheNamespace::LlmGeneration => config.llm_ttl,
        }
    }

    /// Namespace owning `key`, if any.
    pub fn of_key(key: &str) -> Option<Self> {
        [
            CacheNamespace::Embedding,
            CacheNamespace::Validation,
            CacheNamespace::LlmKeywords,
            CacheNamespace::LlmGeneration,
        ]
        .into_iter()
        .find(|ns| key.starts_with(ns.prefix()))
    }
}

impl std::fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix().trim_end_matches(':'))
    }
}
