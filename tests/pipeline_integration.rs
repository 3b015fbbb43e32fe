//! End-to-end matching, validation and proposals through the public pipeline.

mod common;

use std::collections::HashSet;

use common::fixtures::{
    BIOLOGY, CHEMISTRY, corpus, empty_topic, krebs_book, krebs_topic, long_reference,
};
use common::harness::{permissive_config, spawn, spawn_default};
use refcheck::llm::{ScriptedLlm, SuggestionSource};
use refcheck::model::SourceType;
use refcheck::validation::GapType;

#[tokio::test]
async fn test_index_counts_whole_documents_and_chunks() {
    let t = spawn_default();
    let mut documents = corpus();
    documents.push(long_reference("ref-long"));

    let written = t.pipeline.index_references(&documents).await.unwrap();

    assert_eq!(written, 6);
    assert_eq!(
        t.store.point_count(t.pipeline.matcher().collection()),
        Some(6)
    );
}

#[tokio::test]
async fn test_find_references_ranks_and_dedups_by_parent() {
    let t = spawn_default();
    let mut documents = corpus();
    documents.push(long_reference("ref-long"));
    t.pipeline.index_references(&documents).await.unwrap();

    let matches = t
        .pipeline
        .find_references(&krebs_topic(), Some(5), Some(BIOLOGY))
        .await;

    assert_eq!(matches[0].reference_id, "ref-krebs-book");
    assert_eq!(matches[0].title, "Principles of Biochemistry");
    assert_eq!(matches[0].source_type, SourceType::Book);

    let parents: HashSet<&str> = matches.iter().map(|m| m.reference_id.as_str()).collect();
    assert_eq!(parents.len(), matches.len());
    assert!(parents.contains("ref-long"));
    assert!(!parents.contains("ref-bonding-notes"));

    for pair in matches.windows(2) {
        assert!(pair[0].final_score >= pair[1].final_score);
    }
    assert!(matches.iter().all(|m| (0.0..=1.0).contains(&m.final_score)));
}

#[tokio::test]
async fn test_domain_filter_restricts_candidates() {
    let t = spawn_default();
    t.pipeline.index_references(&corpus()).await.unwrap();

    let matches = t
        .pipeline
        .find_references(&krebs_topic(), Some(5), Some(CHEMISTRY))
        .await;

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].reference_id, "ref-bonding-notes");
    assert_eq!(matches[0].domain, CHEMISTRY);
}

#[tokio::test]
async fn test_default_trust_replaced_by_source_default() {
    let t = spawn_default();
    t.pipeline.index_references(&corpus()).await.unwrap();

    let matches = t
        .pipeline
        .find_references(&krebs_topic(), Some(5), Some(BIOLOGY))
        .await;
    let notes = matches
        .iter()
        .find(|m| m.reference_id == "ref-glycolysis-notes")
        .unwrap();
    let book = matches
        .iter()
        .find(|m| m.reference_id == "ref-krebs-book")
        .unwrap();

    let trust = permissive_config().trust;
    assert!((notes.trust_score - trust.markdown).abs() < 1e-6);
    assert!((book.trust_score - 0.95).abs() < 1e-6);
}

#[tokio::test]
async fn test_validate_complete_topic_against_matches() {
    let t = spawn_default();
    t.pipeline.index_references(&[krebs_book()]).await.unwrap();

    let result = t.pipeline.check_topic(&krebs_topic()).await;

    assert_eq!(result.topic_id, "topic-krebs");
    assert_eq!(result.matches.len(), 1);
    assert!(!result.has_gap(GapType::NoReferences));
    assert!(!result.has_gap(GapType::MissingField));
    assert!((result.field_completeness_score - 1.0).abs() < 1e-6);
    assert!(result.overall_score > 0.0 && result.overall_score <= 1.0);
}

#[tokio::test]
async fn test_validate_empty_topic_without_references() {
    let t = spawn_default();

    let result = t.pipeline.validate(&empty_topic(), &[]).await;

    assert!((result.overall_score - 0.2).abs() < 1e-6);
    assert_eq!(result.gaps.len(), 4);
    assert_eq!(result.gaps_of(GapType::NoReferences).count(), 1);
}

#[tokio::test]
async fn test_validation_cached_until_topic_invalidated() {
    let t = spawn_default();
    let topic = krebs_topic();

    t.pipeline.validate(&topic, &[]).await;
    t.pipeline.validate(&topic, &[]).await;
    assert_eq!(t.pipeline.validator().computations(), 1);

    assert_eq!(t.pipeline.invalidate_topic(&topic.id).await, 1);
    t.pipeline.validate(&topic, &[]).await;
    assert_eq!(t.pipeline.validator().computations(), 2);
}

#[tokio::test]
async fn test_proposals_from_scripted_llm() {
    let llm = ScriptedLlm::new();
    llm.push_reply(r#"["NADH", "oxidative phosphorylation"]"#)
        .push_reply("The Krebs cycle oxidizes acetyl CoA to CO2 in the mitochondrial matrix.");
    let t = spawn(permissive_config(), llm);
    t.pipeline.index_references(&[krebs_book()]).await.unwrap();

    let topic = krebs_topic();
    let keywords = t.pipeline.suggest_keywords(&topic, 5).await;
    assert_eq!(keywords.source, SuggestionSource::Llm);
    assert_eq!(keywords.keywords, vec!["nadh", "oxidative phosphorylation"]);

    let matches = t
        .pipeline
        .find_references(&topic, Some(3), Some(BIOLOGY))
        .await;
    let draft = t.pipeline.draft_definition(&topic, &matches).await;
    assert_eq!(draft.source, SuggestionSource::Llm);
    assert_eq!(draft.reference_ids, vec!["ref-krebs-book"]);
    assert_eq!(t.llm.calls(), 2);
}

#[tokio::test]
async fn test_proposals_degrade_when_llm_unavailable() {
    let t = spawn_default();
    t.pipeline.index_references(&[krebs_book()]).await.unwrap();
    let topic = krebs_topic();

    // "[]" parses but proposes nothing new.
    let keywords = t.pipeline.suggest_keywords(&topic, 2).await;
    assert_eq!(keywords.source, SuggestionSource::Fallback);
    assert_eq!(keywords.keywords.len(), 2);

    let failing = spawn(
        permissive_config(),
        ScriptedLlm::failing(refcheck::llm::LlmError::Unavailable {
            message: "no provider".to_string(),
        }),
    );
    let draft = failing
        .pipeline
        .draft_definition(&topic, &[common::fixtures::matched("r", 0.9, "Reference text.")])
        .await;
    assert_eq!(draft.source, SuggestionSource::Fallback);
    assert_eq!(draft.text, "Reference text.");
}
