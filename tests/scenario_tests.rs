//! Behavioral scenarios over the public API: chunk geometry, score thresholds, the blocking
//! bridge, and cache-key formats.

mod common;

use std::sync::Arc;
use std::thread;

use common::fixtures::{corpus, krebs_topic};
use common::harness::{permissive_config, spawn, spawn_default};
use refcheck::chunker::{DocumentChunker, reassemble};
use refcheck::config::{ChunkingConfig, Config, FieldWeights};
use refcheck::hashing::{embedding_key, llm_generation_key, llm_keywords_key, validation_key};
use refcheck::llm::ScriptedLlm;
use refcheck::matcher::final_score;
use refcheck::model::{SourceType, Topic};
use refcheck::representation::WeightedRepresentationBuilder;
use refcheck::vectordb::{ChunkMetadata, StoreMatch};

#[test]
fn test_twelve_thousand_chars_make_three_overlapping_chunks() {
    let chunker = DocumentChunker::new(ChunkingConfig::default());
    let text = "x".repeat(12_000);

    let chunks = chunker.split(&text);

    assert_eq!(chunks.len(), 3);
    assert!(chunks.iter().all(|c| c.char_len() <= 5_000));
    assert_eq!(chunks[1].start, chunks[0].end - 500);
    assert_eq!(chunks[2].start, chunks[1].end - 500);
    assert_eq!(chunks[2].end, 12_000);
    assert_eq!(reassemble(&chunks), text);
}

#[test]
fn test_chunking_is_deterministic() {
    let chunker = DocumentChunker::new(ChunkingConfig::default());
    let text = "Sentence one. Sentence two.\nLine.\n\nParagraph. ".repeat(400);

    assert_eq!(chunker.split(&text), chunker.split(&text));
    assert_eq!(reassemble(&chunker.split(&text)), text);
}

#[test]
fn test_representation_of_empty_topic_is_not_empty() {
    let builder = WeightedRepresentationBuilder::new(FieldWeights::default());
    let text = builder.build(&Topic::new("t-9", "physics"));

    assert!(!text.trim().is_empty());
    assert!(text.contains("t-9"));
}

#[test]
fn test_final_score_monotone_and_bounded() {
    let mut previous = 0.0;
    for step in 0..=10 {
        let similarity = step as f32 / 10.0;
        let score = final_score(similarity, 0.8, 0.7, 0.3);
        assert!(score >= previous);
        assert!((0.0..=1.0).contains(&score));
        previous = score;
    }
    assert!(final_score(0.9, 1.0, 0.7, 0.3) > final_score(0.9, 0.5, 0.7, 0.3));
}

fn scripted_match(id: &str, distance: f32) -> StoreMatch {
    StoreMatch {
        id: id.to_string(),
        distance,
        document: format!("document {}", id),
        metadata: ChunkMetadata {
            domain: "biology".to_string(),
            source_type: Some(SourceType::Markdown),
            trust_score: Some(1.0),
            title: id.to_string(),
            parent_id: Some(id.to_string()),
            is_chunk: false,
            chunk_index: 0,
        },
    }
}

#[tokio::test]
async fn test_markdown_threshold_keeps_only_strong_match() {
    // Default thresholds: markdown 0.65.
    let t = spawn(Config::default(), ScriptedLlm::always("[]"));
    t.pipeline.index_references(&corpus()).await.unwrap();
    t.store
        .script_results(vec![scripted_match("strong", 0.1), scripted_match("weak", 0.4)]);

    let matches = t
        .pipeline
        .find_references(&krebs_topic(), Some(5), None)
        .await;

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].reference_id, "strong");
    assert!((matches[0].final_score - 0.9).abs() < 1e-5);
}

#[test]
fn test_blocking_calls_from_worker_threads() {
    let t = spawn_default();
    let pipeline = Arc::new(t.pipeline);
    pipeline.index_references_blocking(&corpus()).unwrap();

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            thread::spawn(move || {
                let matches = pipeline
                    .find_references_blocking(&krebs_topic(), Some(3), Some("biology"))
                    .unwrap();
                pipeline.validate_blocking(&krebs_topic(), &matches).unwrap()
            })
        })
        .collect();

    for handle in handles {
        let result = handle.join().unwrap();
        assert_eq!(result.topic_id, "topic-krebs");
        assert!(!result.matches.is_empty());
    }
    assert_eq!(pipeline.bridge().active(), 0);
    assert!(pipeline.bridge().max_concurrent() >= 1);
}

#[test]
fn test_cache_key_formats() {
    let topic = krebs_topic();

    let embedding = embedding_key("some text");
    assert!(embedding.starts_with("embedding:text:"));
    assert_eq!(embedding.len(), "embedding:text:".len() + 16);

    let validation = validation_key(&topic, &["r2", "r1"]);
    assert!(validation.starts_with("validation:topic-krebs:"));
    assert_eq!(validation, validation_key(&topic, &["r1", "r2"]));

    assert!(llm_keywords_key("x").starts_with("llm:keywords:"));
    assert!(llm_generation_key("x").starts_with("llm:generation:"));
    assert_ne!(llm_keywords_key("x"), llm_keywords_key("y"));
}

#[test]
fn test_permissive_config_is_valid() {
    permissive_config().validate().unwrap();
    Config::default().validate().unwrap();
}
