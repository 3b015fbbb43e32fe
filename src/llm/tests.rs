use std::sync::Arc;

use super::*;
use crate::breaker::{BreakerRegistry, CircuitState};
use crate::cache::CacheStore;
use crate::config::{BreakerConfig, CacheConfig};
use crate::constants::SERVICE_LLM;
use crate::error::ErrorCategory;
use crate::model::{MatchedReference, SourceType, Topic};
use crate::retry::RetryPolicy;

fn assistant(llm: Arc<ScriptedLlm>) -> ProposalAssistant {
    ProposalAssistant::new(
        llm,
        CacheStore::from_config(CacheConfig::default()),
        Arc::new(BreakerRegistry::default()),
        RetryPolicy::none(),
    )
}

fn topic() -> Topic {
    Topic::new("t-1", "biology")
        .with_lead("Photosynthesis turns light into chemical energy.")
        .with_definition("Photosynthesis is how plants make sugar.")
        .with_keywords(["photosynthesis"])
}

fn reference(id: &str, score: f32, snippet: &str) -> MatchedReference {
    MatchedReference {
        reference_id: id.to_string(),
        title: format!("Ref {}", id),
        source_type: SourceType::Book,
        final_score: score,
        domain: "biology".to_string(),
        trust_score: 0.95,
        snippet: snippet.to_string(),
    }
}

#[test]
fn test_error_categories() {
    assert_eq!(LlmError::RateLimited.category(), ErrorCategory::Transient);
    assert_eq!(LlmError::Timeout.category(), ErrorCategory::Transient);
    assert_eq!(
        LlmError::Unauthorized { message: "x".into() }.category(),
        ErrorCategory::Permanent
    );
    assert_eq!(
        LlmError::Unavailable { message: "x".into() }.category(),
        ErrorCategory::Degraded
    );

    let err = LlmError::Timeout.into_pipeline("draft_definition");
    assert_eq!(err.service(), SERVICE_LLM);
    assert_eq!(err.operation(), "draft_definition");
}

#[test]
fn test_classify_provider_messages() {
    assert_eq!(LlmError::classify("HTTP 429 Too Many Requests"), LlmError::RateLimited);
    assert_eq!(LlmError::classify("request timed out"), LlmError::Timeout);
    assert!(matches!(
        LlmError::classify("status 401: invalid api key"),
        LlmError::Unauthorized { .. }
    ));
    assert!(matches!(
        LlmError::classify("status 503 service unavailable"),
        LlmError::Server { .. }
    ));
    assert!(matches!(
        LlmError::classify("no adapter for model"),
        LlmError::Unavailable { .. }
    ));
}

#[test]
fn test_parse_json_response_tolerates_fences() {
    let list: Vec<String> = parse_json_response("```json\n[\"a\", \"b\"]\n```").unwrap();
    assert_eq!(list, vec!["a", "b"]);

    let err = parse_json_response::<Vec<String>>("no json here").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Permanent);
}

#[tokio::test]
async fn test_keywords_from_llm_are_cleaned_and_cached() {
    let llm = Arc::new(ScriptedLlm::always(
        r##"{"keywords": [" Chlorophyll ", "photosynthesis", "#Light", "chlorophyll", ""]}"##,
    ));
    let assistant = assistant(Arc::clone(&llm));

    let first = assistant.suggest_keywords(&topic(), 5).await;
    assert_eq!(first.source, SuggestionSource::Llm);
    assert_eq!(first.keywords, vec!["chlorophyll", "light"]);

    let second = assistant.suggest_keywords(&topic(), 5).await;
    assert_eq!(second.source, SuggestionSource::Cache);
    assert_eq!(second.keywords, first.keywords);
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_keywords_capped_at_max() {
    let llm = Arc::new(ScriptedLlm::always(r#"["a1", "a2", "a3", "a4"]"#));
    let suggestions = assistant(llm).suggest_keywords(&topic(), 2).await;

    assert_eq!(suggestions.keywords, vec!["a1", "a2"]);
}

#[tokio::test]
async fn test_keyword_failure_falls_back_without_caching() {
    let llm = Arc::new(ScriptedLlm::failing(LlmError::Unavailable {
        message: "down".into(),
    }));
    let assistant = assistant(Arc::clone(&llm));

    let suggestions = assistant.suggest_keywords(&topic(), 3).await;
    assert_eq!(suggestions.source, SuggestionSource::Fallback);
    assert_eq!(suggestions.keywords, vec!["cell", "organism", "evolution"]);

    assistant.suggest_keywords(&topic(), 3).await;
    assert_eq!(llm.calls(), 2);
}

#[tokio::test]
async fn test_unparseable_keywords_fall_back() {
    let llm = Arc::new(ScriptedLlm::always("chlorophyll, light"));
    let suggestions = assistant(llm).suggest_keywords(&topic(), 2).await;

    assert_eq!(suggestions.source, SuggestionSource::Fallback);
}

#[tokio::test]
async fn test_zero_keywords_requested_skips_llm() {
    let llm = Arc::new(ScriptedLlm::always("[]"));
    let suggestions = assistant(Arc::clone(&llm)).suggest_keywords(&topic(), 0).await;

    assert!(suggestions.keywords.is_empty());
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_definition_drafted_from_references() {
    let llm = Arc::new(ScriptedLlm::always("Photosynthesis converts light energy into glucose."));
    let assistant = assistant(Arc::clone(&llm));
    let refs = vec![
        reference("r1", 0.9, "Plants capture light with chlorophyll."),
        reference("r2", 0.8, ""),
    ];

    let draft = assistant.draft_definition(&topic(), &refs).await;
    assert_eq!(draft.source, SuggestionSource::Llm);
    assert_eq!(draft.text, "Photosynthesis converts light energy into glucose.");
    assert_eq!(draft.reference_ids, vec!["r1"]);

    let prompts = llm.prompts();
    assert!(prompts[0].contains("Plants capture light with chlorophyll."));

    let cached = assistant.draft_definition(&topic(), &refs).await;
    assert_eq!(cached.source, SuggestionSource::Cache);
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_definition_failure_uses_reference_text() {
    let llm = Arc::new(ScriptedLlm::failing(LlmError::Timeout));
    let refs = vec![reference("r1", 0.9, "Plants capture light with chlorophyll.")];

    let draft = assistant(llm).draft_definition(&topic(), &refs).await;
    assert_eq!(draft.source, SuggestionSource::Fallback);
    assert_eq!(draft.text, "Plants capture light with chlorophyll.");
}

#[tokio::test]
async fn test_definition_without_references_skips_llm() {
    let llm = Arc::new(ScriptedLlm::always("unused"));
    let draft = assistant(Arc::clone(&llm)).draft_definition(&topic(), &[]).await;

    assert_eq!(draft.source, SuggestionSource::Fallback);
    assert_eq!(draft.text, "Photosynthesis is how plants make sugar.");
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_transient_failures_open_llm_breaker() {
    let llm = Arc::new(ScriptedLlm::failing(LlmError::RateLimited));
    let breakers = Arc::new(BreakerRegistry::new(BreakerConfig {
        failure_threshold: 2,
        ..BreakerConfig::default()
    }));
    let assistant = ProposalAssistant::new(
        Arc::clone(&llm) as Arc<dyn LlmProvider>,
        CacheStore::disabled(),
        Arc::clone(&breakers),
        RetryPolicy::none(),
    );

    for _ in 0..4 {
        let suggestions = assistant.suggest_keywords(&topic(), 3).await;
        assert_eq!(suggestions.source, SuggestionSource::Fallback);
    }

    assert_eq!(llm.calls(), 2);
    assert_eq!(breakers.get(SERVICE_LLM).state(), CircuitState::Open);
}

#[tokio::test]
async fn test_scripted_replies_in_order() {
    let llm = ScriptedLlm::new();
    llm.push_error(LlmError::Timeout).push_reply("second");
    let request = LlmRequest::new("p");

    assert_eq!(llm.complete(&request).await, Err(LlmError::Timeout));
    assert_eq!(llm.complete(&request).await.unwrap(), "second");
    assert!(matches!(
        llm.complete(&request).await,
        Err(LlmError::Unavailable { .. })
    ));
}

#[tokio::test]
async fn test_definition_cache_tracks_references_behind_long_definition() {
    let llm = Arc::new(ScriptedLlm::always("Drafted."));
    let assistant = assistant(Arc::clone(&llm));
    let topic = topic().with_definition("Light reactions and the Calvin cycle. ".repeat(60));

    let first = assistant
        .draft_definition(&topic, &[reference("r1", 0.9, "Chloroplast stroma text.")])
        .await;
    let second = assistant
        .draft_definition(&topic, &[reference("r2", 0.9, "Thylakoid membrane text.")])
        .await;

    assert_eq!(first.source, SuggestionSource::Llm);
    assert_eq!(second.source, SuggestionSource::Llm);
    assert_eq!(second.reference_ids, vec!["r2"]);
    assert_eq!(llm.calls(), 2);
}

#[tokio::test]
async fn test_keyword_cache_tracks_lead_behind_long_definition() {
    let llm = Arc::new(ScriptedLlm::always(r#"["stroma"]"#));
    let assistant = assistant(Arc::clone(&llm));
    let long = topic().with_definition("x".repeat(3_000));
    let relead = long.clone().with_lead("Plants capture photons.");

    assistant.suggest_keywords(&long, 3).await;
    let second = assistant.suggest_keywords(&relead, 3).await;

    assert_eq!(second.source, SuggestionSource::Llm);
    assert_eq!(llm.calls(), 2);
}
