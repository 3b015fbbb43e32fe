use super::*;
use serial_test::serial;
use std::env;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_refcheck_env() {
    let keys: Vec<String> = env::vars()
        .map(|(key, _)| key)
        .filter(|key| key.starts_with("REFCHECK_"))
        .collect();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for key in keys {
        unsafe { env::remove_var(key) };
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.vector_store.url, "http://localhost:6334");
    assert_eq!(config.vector_store.collection, "reference_chunks");
    assert_eq!(config.chunking.threshold_chars, 5000);
    assert_eq!(config.chunking.overlap_chars, 500);
    assert_eq!(config.matcher.base_weight, 0.7);
    assert_eq!(config.matcher.trust_weight, 0.3);
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.validation.min_lead_chars, 30);
    assert_eq!(config.validation.min_definition_chars, 50);
    assert_eq!(config.validation.min_keywords, 3);
    assert!(config.embedding.endpoint.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_default_ttls_per_namespace() {
    let cache = CacheConfig::default();
    assert_eq!(cache.embedding_ttl, Duration::from_secs(7 * 24 * 3600));
    assert_eq!(cache.validation_ttl, Duration::from_secs(3600));
    assert_eq!(cache.llm_ttl, Duration::from_secs(24 * 3600));
}

#[test]
fn test_trust_resolution_replaces_generic_only() {
    let trust = TrustDefaults::default();
    assert_eq!(trust.resolve(SourceType::Book, 0.5), trust.book);
    assert_eq!(trust.resolve(SourceType::Markdown, 0.5), trust.markdown);
    assert_eq!(trust.resolve(SourceType::Book, 0.42), 0.42);
}

#[test]
fn test_threshold_differs_by_source_type() {
    let matcher = MatcherConfig::default();
    assert_ne!(
        matcher.threshold_for(SourceType::Book),
        matcher.threshold_for(SourceType::Markdown)
    );
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_refcheck_env();

    let config = Config::from_env().expect("should parse with defaults");

    assert_eq!(config.vector_store.url, DEFAULT_QDRANT_URL);
    assert_eq!(config.chunking, ChunkingConfig::default());
    assert_eq!(config.breaker, BreakerConfig::default());
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_refcheck_env();

    let config = with_env_vars(
        &[
            ("REFCHECK_QDRANT_URL", "http://qdrant:6334"),
            ("REFCHECK_CHUNK_THRESHOLD", "2000"),
            ("REFCHECK_CHUNK_OVERLAP", "200"),
            ("REFCHECK_BREAKER_THRESHOLD", "2"),
            ("REFCHECK_BREAKER_RECOVERY_SECS", "15"),
            ("REFCHECK_CACHE_ENABLED", "false"),
            ("REFCHECK_TRUST_WEIGHT", "0.4"),
            ("REFCHECK_EMBEDDING_URL", "  http://embed:8000/v1/embeddings "),
        ],
        Config::from_env,
    )
    .expect("should parse overrides");

    assert_eq!(config.vector_store.url, "http://qdrant:6334");
    assert_eq!(config.chunking.threshold_chars, 2000);
    assert_eq!(config.chunking.overlap_chars, 200);
    assert_eq!(config.breaker.failure_threshold, 2);
    assert_eq!(config.breaker.recovery_timeout, Duration::from_secs(15));
    assert!(!config.cache.enabled);
    assert_eq!(config.matcher.trust_weight, 0.4);
    assert_eq!(
        config.embedding.endpoint.as_deref(),
        Some("http://embed:8000/v1/embeddings")
    );
}

#[test]
#[serial]
fn test_from_env_rejects_bad_integer() {
    clear_refcheck_env();

    let result = with_env_vars(&[("REFCHECK_CHUNK_THRESHOLD", "lots")], Config::from_env);

    assert!(matches!(
        result,
        Err(ConfigError::IntParseError {
            name: "REFCHECK_CHUNK_THRESHOLD",
            ..
        })
    ));
}

#[test]
#[serial]
fn test_from_env_rejects_bad_bool() {
    clear_refcheck_env();

    let result = with_env_vars(&[("REFCHECK_CACHE_ENABLED", "maybe")], Config::from_env);

    assert!(matches!(result, Err(ConfigError::InvalidBool { .. })));
}

#[test]
fn test_validate_rejects_overlap_not_below_threshold() {
    let config = Config {
        chunking: ChunkingConfig {
            threshold_chars: 500,
            overlap_chars: 500,
        },
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::Inconsistent { .. })
    ));
}

#[test]
fn test_validate_rejects_weight_out_of_range() {
    let config = Config {
        weights: FieldWeights {
            definition: 1.5,
            ..Default::default()
        },
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::OutOfRange {
            field: "weights.definition",
            ..
        })
    ));
}

#[test]
fn test_validate_rejects_zero_breaker_threshold() {
    let config = Config {
        breaker: BreakerConfig {
            failure_threshold: 0,
            ..Default::default()
        },
        ..Default::default()
    };

    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_inverted_retry_bounds() {
    let config = Config {
        retry: RetryConfig {
            min_wait: Duration::from_secs(20),
            max_wait: Duration::from_secs(10),
            ..Default::default()
        },
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::Inconsistent { .. })
    ));
}

#[test]
fn test_validate_rejects_zero_bridge_capacity() {
    let config = Config {
        bridge: BridgeConfig { max_concurrent: 0 },
        ..Default::default()
    };

    assert!(config.validate().is_err());
}
