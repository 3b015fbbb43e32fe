use std::sync::Arc;

use super::*;
use crate::breaker::CircuitState;
use crate::config::BreakerConfig;
use crate::constants::{SERVICE_EMBEDDING, SERVICE_VECTOR_STORE};
use crate::llm::{ScriptedLlm, SuggestionSource};
use crate::model::SourceType;
use crate::validation::GapType;
use crate::vectordb::MockVectorStore;

const DIM: usize = 64;

fn pipeline_with(config: Config) -> (Arc<MockVectorStore>, Pipeline<MockVectorStore>) {
    let store = Arc::new(MockVectorStore::new());
    let pipeline = Pipeline::new(
        config,
        Arc::clone(&store),
        Arc::new(StubEmbedder::new(DIM)),
        Arc::new(ScriptedLlm::always(r#"["chlorophyll"]"#)),
    )
    .with_retry(RetryPolicy::none());
    (store, pipeline)
}

/// Thresholds at zero so the domain filter alone decides what matches.
fn test_config() -> Config {
    let mut config = Config::default();
    config.matcher.book_threshold = 0.0;
    config.matcher.markdown_threshold = 0.0;
    config
}

fn pipeline() -> (Arc<MockVectorStore>, Pipeline<MockVectorStore>) {
    pipeline_with(test_config())
}

fn documents() -> Vec<ReferenceDocument> {
    vec![
        ReferenceDocument::new(
            "bio-1",
            SourceType::Book,
            "biology",
            "Photosynthesis in green plants uses chlorophyll to capture light energy \
             and convert carbon dioxide and water into glucose and oxygen.",
        )
        .with_title("Plant Biology")
        .with_trust(0.95),
        ReferenceDocument::new(
            "chem-1",
            SourceType::Markdown,
            "chemistry",
            "Ionic bonds form between metals and nonmetals by electron transfer.",
        ),
    ]
}

fn photosynthesis() -> Topic {
    Topic::new("t-photo", "biology")
        .with_lead("Photosynthesis captures light energy in plants")
        .with_definition("Photosynthesis converts carbon dioxide and water into glucose using light")
        .with_keywords(["photosynthesis", "chlorophyll", "glucose"])
}

#[tokio::test]
async fn test_index_then_find_references() {
    let (store, pipeline) = pipeline();

    let written = pipeline.index_references(&documents()).await.unwrap();
    assert_eq!(written, 2);
    assert_eq!(store.point_count(pipeline.matcher().collection()), Some(2));

    let matches = pipeline
        .find_references(&photosynthesis(), Some(3), Some("biology"))
        .await;
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].reference_id, "bio-1");
    assert_eq!(matches[0].source_type, SourceType::Book);
}

#[tokio::test]
async fn test_check_topic_combines_match_and_validate() {
    let (_store, pipeline) = pipeline();
    pipeline.index_references(&documents()).await.unwrap();

    let result = pipeline.check_topic(&photosynthesis()).await;
    assert_eq!(result.topic_id, "t-photo");
    assert_eq!(result.matches.len(), 1);
    assert!(!result.has_gap(GapType::NoReferences));
}

#[tokio::test]
async fn test_check_topics_preserves_order() {
    let (_store, pipeline) = pipeline();
    pipeline.index_references(&documents()).await.unwrap();

    let topics = vec![Topic::new("first", "chemistry"), photosynthesis()];
    let results = pipeline.check_topics(&topics).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].topic_id, "first");
    assert_eq!(results[0].matches[0].reference_id, "chem-1");
    assert_eq!(results[1].topic_id, "t-photo");
}

#[tokio::test]
async fn test_empty_store_validates_with_no_references_gap() {
    let (_store, pipeline) = pipeline();

    let result = pipeline.check_topic(&photosynthesis()).await;
    assert!(result.matches.is_empty());
    assert!(result.has_gap(GapType::NoReferences));
}

#[tokio::test]
async fn test_store_outage_fails_open_and_trips_breaker() {
    let config = Config {
        breaker: BreakerConfig {
            failure_threshold: 2,
            ..BreakerConfig::default()
        },
        ..test_config()
    };
    let (store, pipeline) = pipeline_with(config);
    store.fail_next(10);

    for _ in 0..3 {
        let matches = pipeline.find_references(&photosynthesis(), None, None).await;
        assert!(matches.is_empty());
    }

    assert_eq!(store.query_calls(), 2);
    let snapshot = pipeline.breaker_snapshot();
    let vector_store = snapshot
        .iter()
        .find(|s| s.name == SERVICE_VECTOR_STORE)
        .unwrap();
    assert_eq!(vector_store.state, CircuitState::Open);
    let embedding = snapshot.iter().find(|s| s.name == SERVICE_EMBEDDING).unwrap();
    assert_eq!(embedding.state, CircuitState::Closed);
}

#[tokio::test]
async fn test_indexing_invalidates_stored_validations() {
    let (_store, pipeline) = pipeline();
    let topic = photosynthesis();

    pipeline.validate(&topic, &[]).await;
    pipeline.validate(&topic, &[]).await;
    assert_eq!(pipeline.validator().computations(), 1);

    pipeline.index_references(&documents()).await.unwrap();
    pipeline.validate(&topic, &[]).await;
    assert_eq!(pipeline.validator().computations(), 2);
}

#[tokio::test]
async fn test_reset_index_drops_collection() {
    let (store, pipeline) = pipeline();
    pipeline.index_references(&documents()).await.unwrap();

    assert!(pipeline.reset_index().await.unwrap());
    assert!(!store.has_collection(pipeline.matcher().collection()));
    assert!(!pipeline.reset_index().await.unwrap());
}

#[tokio::test]
async fn test_assistant_skips_known_keywords() {
    let (_store, pipeline) = pipeline();

    let first = pipeline.suggest_keywords(&photosynthesis(), 3).await;
    assert_eq!(first.source, SuggestionSource::Fallback);

    let topic = Topic::new("t-new", "biology").with_lead("Leaves contain pigments");
    let suggested = pipeline.suggest_keywords(&topic, 3).await;
    assert_eq!(suggested.source, SuggestionSource::Llm);
    assert_eq!(suggested.keywords, vec!["chlorophyll"]);
}

#[test]
fn test_blocking_variants_run_through_bridge() {
    let (_store, pipeline) = pipeline();

    let written = pipeline.index_references_blocking(&documents()).unwrap();
    assert_eq!(written, 2);

    let matches = pipeline
        .find_references_blocking(&photosynthesis(), Some(3), Some("biology"))
        .unwrap();
    assert_eq!(matches.len(), 1);

    let result = pipeline.validate_blocking(&photosynthesis(), &matches).unwrap();
    assert_eq!(result.matches.len(), 1);
    assert_eq!(pipeline.bridge().active(), 0);
}

#[tokio::test]
async fn test_blocking_variant_refused_inside_runtime() {
    let (_store, pipeline) = pipeline();

    let err = pipeline.validate_blocking(&photosynthesis(), &[]).unwrap_err();
    assert_eq!(err.service(), "bridge");
    assert!(!err.is_transient());
}
