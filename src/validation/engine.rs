use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tracing::{debug, info, instrument};

use super::types::{ContentGap, GapType, ValidationResult};
use crate::cache::{CacheNamespace, CacheStore};
use crate::config::{Config, ValidationConfig};
use crate::hashing::{VALIDATION_ALL_PATTERN, validation_key, validation_topic_pattern};
use crate::model::{MatchedReference, Topic};

/// Accuracy score used when there are no matches to measure against.
const NEUTRAL_ACCURACY: f32 = 0.5;
/// Confidence of the "no references found" gap.
const NO_REFERENCES_CONFIDENCE: f32 = 0.3;
/// Confidence of completeness gaps; the rule is mechanical.
const COMPLETENESS_CONFIDENCE: f32 = 1.0;

const FIELD_WEIGHT: f32 = 0.3;
const ACCURACY_WEIGHT: f32 = 0.4;
const COVERAGE_WEIGHT: f32 = 0.3;
const HIGH_COVERAGE_CREDIT: f32 = 0.5;
const MEDIUM_COVERAGE_CREDIT: f32 = 0.3;

/// Derives content gaps and a composite quality score for a topic.
///
/// Results are cached under `validation:<topic_id>:<topic_hash>:<refs_hash>`, so
/// re-validating unchanged content against the same reference set is a cache read.
pub struct ValidationEngine {
    cache: CacheStore,
    config: ValidationConfig,
    computations: AtomicU64,
}

impl ValidationEngine {
    pub fn new(cache: CacheStore, config: &Config) -> Self {
        Self::with_config(cache, config.validation)
    }

    pub fn with_config(cache: CacheStore, config: ValidationConfig) -> Self {
        Self {
            cache,
            config,
            computations: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Number of results computed (not served from cache) so far.
    pub fn computations(&self) -> u64 {
        self.computations.load(Ordering::Relaxed)
    }

    /// Validates `topic` against `matches`. Always produces a result.
    #[instrument(skip(self, topic, matches), fields(topic_id = %topic.id, matches = matches.len()))]
    pub async fn validate(&self, topic: &Topic, matches: &[MatchedReference]) -> ValidationResult {
        let reference_ids: Vec<&str> = matches.iter().map(|m| m.reference_id.as_str()).collect();
        let key = validation_key(topic, &reference_ids);

        if let Some(cached) = self.cache.get_json::<ValidationResult>(&key).await {
            debug!(key = %key, "Validation cache hit");
            return cached;
        }

        let result = self.compute(topic, matches);
        self.cache
            .set_json(CacheNamespace::Validation, &key, &result)
            .await;
        result
    }

    /// Uncached validation. Pure apart from the computation counter.
    pub fn compute(&self, topic: &Topic, matches: &[MatchedReference]) -> ValidationResult {
        self.computations.fetch_add(1, Ordering::Relaxed);

        let mut gaps = self.completeness_gaps(topic);
        gaps.extend(self.accuracy_gaps(topic, matches));

        let field = finite_or_zero(self.field_completeness_score(topic));
        let accuracy = finite_or_zero(self.content_accuracy_score(matches));
        let coverage = finite_or_zero(self.reference_coverage_score(matches));
        let overall = finite_or_zero(
            FIELD_WEIGHT * field + ACCURACY_WEIGHT * accuracy + COVERAGE_WEIGHT * coverage,
        );

        debug!(
            topic_id = %topic.id,
            gaps = gaps.len(),
            field,
            accuracy,
            coverage,
            overall,
            "Computed validation"
        );

        ValidationResult {
            topic_id: topic.id.clone(),
            overall_score: overall,
            gaps,
            matches: matches.to_vec(),
            field_completeness_score: field,
            content_accuracy_score: accuracy,
            reference_coverage_score: coverage,
            validated_at: Utc::now(),
        }
    }

    /// Drops every cached result of one topic. Returns the number removed.
    pub async fn invalidate_topic(&self, topic_id: &str) -> usize {
        let removed = self
            .cache
            .invalidate_by_pattern(&validation_topic_pattern(topic_id))
            .await;
        info!(topic_id, removed, "Invalidated topic validations");
        removed
    }

    /// Drops cached results that may involve `reference_id`.
    ///
    /// Reference ids only appear hashed inside keys, so this clears every validation entry.
    pub async fn invalidate_reference(&self, reference_id: &str) -> usize {
        let removed = self.cache.invalidate_by_pattern(VALIDATION_ALL_PATTERN).await;
        info!(reference_id, removed, "Invalidated validations after reference change");
        removed
    }

    /// Drops every cached validation result.
    pub async fn invalidate_all(&self) -> usize {
        self.cache.invalidate_by_pattern(VALIDATION_ALL_PATTERN).await
    }

    fn completeness_gaps(&self, topic: &Topic) -> Vec<ContentGap> {
        let c = &self.config;
        let mut gaps = Vec::new();

        let lead = topic.lead.trim();
        let lead_len = lead.chars().count();
        if lead_len < c.min_lead_chars {
            let gap_type = if lead_len == 0 {
                GapType::MissingField
            } else {
                GapType::IncompleteField
            };
            gaps.push(
                ContentGap::new(gap_type, "lead", COMPLETENESS_CONFIDENCE)
                    .with_current(lead)
                    .with_counts(c.min_lead_chars - lead_len, c.min_lead_chars)
                    .with_reasoning(format!(
                        "Lead has {} characters; at least {} are required",
                        lead_len, c.min_lead_chars
                    )),
            );
        }

        let definition = topic.definition.trim();
        let definition_len = definition.chars().count();
        if definition_len < c.min_definition_chars {
            let gap_type = if definition_len == 0 {
                GapType::MissingField
            } else {
                GapType::IncompleteDefinition
            };
            gaps.push(
                ContentGap::new(gap_type, "definition", COMPLETENESS_CONFIDENCE)
                    .with_current(definition)
                    .with_counts(c.min_definition_chars - definition_len, c.min_definition_chars)
                    .with_reasoning(format!(
                        "Definition has {} characters; at least {} are required",
                        definition_len, c.min_definition_chars
                    )),
            );
        }

        let keywords = topic.clean_keywords();
        if keywords.len() < c.min_keywords {
            gaps.push(
                ContentGap::new(GapType::MissingKeywords, "keywords", COMPLETENESS_CONFIDENCE)
                    .with_current(keywords.join(", "))
                    .with_counts(c.min_keywords - keywords.len(), c.min_keywords)
                    .with_reasoning(format!(
                        "{} keywords present; at least {} are required",
                        keywords.len(),
                        c.min_keywords
                    )),
            );
        }

        gaps
    }

    fn accuracy_gaps(&self, topic: &Topic, matches: &[MatchedReference]) -> Vec<ContentGap> {
        if matches.is_empty() {
            return vec![
                ContentGap::new(GapType::NoReferences, "references", NO_REFERENCES_CONFIDENCE)
                    .with_reasoning("No reference material matched this topic"),
            ];
        }

        let definition = topic.definition.trim();
        let definition_len = definition.chars().count() as f32;

        matches
            .iter()
            .take(self.config.accuracy_checks)
            .filter(|m| m.final_score > self.config.high_quality_score)
            .filter(|m| m.snippet.chars().count() as f32 > self.config.expansion_ratio * definition_len)
            .map(|m| {
                ContentGap::new(GapType::IncompleteDefinition, "definition", m.final_score)
                    .with_current(definition)
                    .with_suggestion(m.snippet.clone())
                    .with_source(m.reference_id.clone())
                    .with_reasoning(format!(
                        "Reference '{}' (score {:.2}) covers this topic in more depth",
                        display_title(m),
                        m.final_score
                    ))
            })
            .collect()
    }

    fn field_completeness_score(&self, topic: &Topic) -> f32 {
        let c = &self.config;
        let ratios = [
            ratio(topic.lead.trim().chars().count(), c.min_lead_chars),
            ratio(topic.definition.trim().chars().count(), c.min_definition_chars),
            ratio(topic.clean_keywords().len(), c.min_keywords),
            ratio(topic.clean_hashtags().len(), c.min_hashtags),
            ratio(topic.memory_aid.trim().chars().count(), c.min_memory_aid_chars),
        ];
        ratios.iter().sum::<f32>() / ratios.len() as f32
    }

    fn content_accuracy_score(&self, matches: &[MatchedReference]) -> f32 {
        let top: Vec<f32> = matches
            .iter()
            .take(self.config.accuracy_top_n)
            .map(|m| finite_or_zero(m.final_score))
            .collect();
        if top.is_empty() {
            return NEUTRAL_ACCURACY;
        }
        top.iter().sum::<f32>() / top.len() as f32
    }

    fn reference_coverage_score(&self, matches: &[MatchedReference]) -> f32 {
        let high = matches
            .iter()
            .filter(|m| m.final_score > self.config.high_quality_score)
            .count() as f32;
        let medium = matches
            .iter()
            .filter(|m| {
                m.final_score > self.config.medium_quality_score
                    && m.final_score <= self.config.high_quality_score
            })
            .count() as f32;
        (HIGH_COVERAGE_CREDIT * high + MEDIUM_COVERAGE_CREDIT * medium).min(1.0)
    }
}

impl std::fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("config", &self.config)
            .field("cache_enabled", &self.cache.is_enabled())
            .field("computations", &self.computations())
            .finish()
    }
}

/// `actual / required`, capped at 1. A zero requirement is always met.
fn ratio(actual: usize, required: usize) -> f32 {
    if required == 0 {
        return 1.0;
    }
    (actual as f32 / required as f32).min(1.0)
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn display_title(m: &MatchedReference) -> &str {
    if m.title.is_empty() {
        &m.reference_id
    } else {
        &m.title
    }
}
