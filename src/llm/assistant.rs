use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::fallback::{fallback_definition, fallback_keywords};
use super::provider::{LlmProvider, LlmRequest, parse_json_response};
use crate::breaker::BreakerRegistry;
use crate::cache::{CacheNamespace, CacheStore};
use crate::constants::SERVICE_LLM;
use crate::error::PipelineResult;
use crate::hashing::{bounded_prefix, llm_generation_key, llm_keywords_key};
use crate::model::{MatchedReference, Topic};
use crate::retry::RetryPolicy;

const KEYWORDS_SYSTEM: &str = "You suggest search keywords for educational topics. \
Reply with a JSON array of short lowercase strings and nothing else.";

const DEFINITION_SYSTEM: &str = "You write concise, factual definitions for educational topics. \
Use only the supplied reference material. Reply with two or three plain sentences.";

const KEYWORDS_TEMPERATURE: f64 = 0.3;
const KEYWORDS_MAX_TOKENS: u32 = 200;
const DEFINITION_TEMPERATURE: f64 = 0.4;
const DEFINITION_MAX_TOKENS: u32 = 400;

/// Reference excerpt length included in drafting prompts.
const PROMPT_SNIPPET_CHARS: usize = 800;
/// References included in drafting prompts.
const PROMPT_REFERENCES: usize = 3;
/// Length of the reference-text fallback draft.
const FALLBACK_DEFINITION_CHARS: usize = 300;

/// Where a suggestion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionSource {
    Llm,
    Cache,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordSuggestions {
    pub keywords: Vec<String>,
    pub source: SuggestionSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionDraft {
    pub text: String,
    /// References the draft was written from.
    pub reference_ids: Vec<String>,
    pub source: SuggestionSource,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KeywordReply {
    List(Vec<String>),
    Object { keywords: Vec<String> },
}

/// LLM-assisted proposals for improving a topic.
///
/// Every model call runs through the `llm` circuit breaker with the retry policy inside it.
/// Replies are cached for the LLM TTL. When the model is unavailable the assistant degrades
/// to offline suggestions, which are never cached.
pub struct ProposalAssistant {
    llm: Arc<dyn LlmProvider>,
    cache: CacheStore,
    breakers: Arc<BreakerRegistry>,
    retry: RetryPolicy,
}

impl ProposalAssistant {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        cache: CacheStore,
        breakers: Arc<BreakerRegistry>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            llm,
            cache,
            breakers,
            retry,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    /// Suggests up to `max` new keywords for `topic`.
    #[instrument(skip(self, topic), fields(topic_id = %topic.id))]
    pub async fn suggest_keywords(&self, topic: &Topic, max: usize) -> KeywordSuggestions {
        if max == 0 {
            return KeywordSuggestions {
                keywords: Vec::new(),
                source: SuggestionSource::Fallback,
            };
        }

        let prompt = keywords_prompt(topic, max);
        let key = llm_keywords_key(&prompt);
        if let Some(keywords) = self.cache.get_json::<Vec<String>>(&key).await {
            debug!(key = %key, "Keyword suggestions served from cache");
            return KeywordSuggestions {
                keywords,
                source: SuggestionSource::Cache,
            };
        }

        let request = LlmRequest::new(prompt)
            .with_system(KEYWORDS_SYSTEM)
            .with_temperature(KEYWORDS_TEMPERATURE)
            .with_max_tokens(KEYWORDS_MAX_TOKENS);

        let reply = self.complete("suggest_keywords", &request).await.and_then(|text| {
            parse_json_response::<KeywordReply>(&text).map_err(|e| e.into_pipeline("suggest_keywords"))
        });

        match reply {
            Ok(reply) => {
                let keywords = clean_keywords(reply, topic, max);
                if keywords.is_empty() {
                    debug!("LLM suggested no new keywords, using fallback");
                    return self.keyword_fallback(topic, max);
                }
                self.cache
                    .set_json(CacheNamespace::LlmKeywords, &key, &keywords)
                    .await;
                KeywordSuggestions {
                    keywords,
                    source: SuggestionSource::Llm,
                }
            }
            Err(e) => {
                warn!(error = %e, category = %e.category(), "Keyword suggestion failed, using fallback");
                self.keyword_fallback(topic, max)
            }
        }
    }

    /// Drafts a definition for `topic` from the matched references.
    #[instrument(skip(self, topic, references), fields(topic_id = %topic.id, references = references.len()))]
    pub async fn draft_definition(
        &self,
        topic: &Topic,
        references: &[MatchedReference],
    ) -> DefinitionDraft {
        let used: Vec<&MatchedReference> = references
            .iter()
            .filter(|r| !r.snippet.trim().is_empty())
            .take(PROMPT_REFERENCES)
            .collect();
        let reference_ids: Vec<String> = used.iter().map(|r| r.reference_id.clone()).collect();

        if used.is_empty() {
            debug!("No reference text to draft from");
            return DefinitionDraft {
                text: fallback_definition(topic, references, FALLBACK_DEFINITION_CHARS),
                reference_ids,
                source: SuggestionSource::Fallback,
            };
        }

        let prompt = definition_prompt(topic, &used);
        let key = llm_generation_key(&prompt);
        if let Some(text) = self.cache.get_json::<String>(&key).await {
            debug!(key = %key, "Definition draft served from cache");
            return DefinitionDraft {
                text,
                reference_ids,
                source: SuggestionSource::Cache,
            };
        }

        let request = LlmRequest::new(prompt)
            .with_system(DEFINITION_SYSTEM)
            .with_temperature(DEFINITION_TEMPERATURE)
            .with_max_tokens(DEFINITION_MAX_TOKENS);

        match self.complete("draft_definition", &request).await {
            Ok(text) => {
                self.cache
                    .set_json(CacheNamespace::LlmGeneration, &key, &text)
                    .await;
                DefinitionDraft {
                    text,
                    reference_ids,
                    source: SuggestionSource::Llm,
                }
            }
            Err(e) => {
                warn!(error = %e, category = %e.category(), "Definition drafting failed, using reference text");
                DefinitionDraft {
                    text: fallback_definition(topic, references, FALLBACK_DEFINITION_CHARS),
                    reference_ids,
                    source: SuggestionSource::Fallback,
                }
            }
        }
    }

    async fn complete(&self, operation: &str, request: &LlmRequest) -> PipelineResult<String> {
        self.breakers
            .get(SERVICE_LLM)
            .call(operation, || {
                self.retry.run(operation, || async {
                    self.llm
                        .complete(request)
                        .await
                        .map_err(|e| e.into_pipeline(operation))
                })
            })
            .await
    }

    fn keyword_fallback(&self, topic: &Topic, max: usize) -> KeywordSuggestions {
        KeywordSuggestions {
            keywords: fallback_keywords(topic, max),
            source: SuggestionSource::Fallback,
        }
    }
}

impl std::fmt::Debug for ProposalAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProposalAssistant")
            .field("provider", &self.llm.name())
            .field("cache_enabled", &self.cache.is_enabled())
            .finish()
    }
}

fn keywords_prompt(topic: &Topic, max: usize) -> String {
    format!(
        "Domain: {}\nLead: {}\nDefinition: {}\nExisting keywords: {}\n\nSuggest up to {} additional keywords.",
        topic.domain.trim(),
        topic.lead.trim(),
        topic.definition.trim(),
        topic.clean_keywords().join(", "),
        max
    )
}

fn definition_prompt(topic: &Topic, references: &[&MatchedReference]) -> String {
    let mut prompt = format!(
        "Domain: {}\nCurrent lead: {}\nCurrent definition: {}\n\nReferences:\n",
        topic.domain.trim(),
        topic.lead.trim(),
        topic.definition.trim()
    );
    for (i, reference) in references.iter().enumerate() {
        prompt.push_str(&format!(
            "[{}] {}: {}\n",
            i + 1,
            reference.title,
            bounded_prefix(reference.snippet.trim(), PROMPT_SNIPPET_CHARS)
        ));
    }
    prompt.push_str("\nWrite an improved definition.");
    prompt
}

/// Trims and lowercases, then drops blanks, duplicates and keywords the topic already has.
fn clean_keywords(reply: KeywordReply, topic: &Topic, max: usize) -> Vec<String> {
    let raw = match reply {
        KeywordReply::List(list) | KeywordReply::Object { keywords: list } => list,
    };
    let mut seen: std::collections::HashSet<String> = topic
        .clean_keywords()
        .iter()
        .map(|k| k.to_lowercase())
        .collect();

    raw.into_iter()
        .map(|k| k.trim().trim_start_matches('#').to_lowercase())
        .filter(|k| !k.is_empty() && seen.insert(k.clone()))
        .take(max)
        .collect()
}
