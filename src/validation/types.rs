use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::MatchedReference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GapType {
    /// Field is empty.
    MissingField,
    /// Field has content but falls short of the minimum length.
    IncompleteField,
    /// Definition is short, or a trusted reference says considerably more.
    IncompleteDefinition,
    /// Fewer keywords than required.
    MissingKeywords,
    InaccurateContent,
    OutdatedContent,
    /// No reference matched the topic.
    NoReferences,
}

impl GapType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GapType::MissingField => "MISSING_FIELD",
            GapType::IncompleteField => "INCOMPLETE_FIELD",
            GapType::IncompleteDefinition => "INCOMPLETE_DEFINITION",
            GapType::MissingKeywords => "MISSING_KEYWORDS",
            GapType::InaccurateContent => "INACCURATE_CONTENT",
            GapType::OutdatedContent => "OUTDATED_CONTENT",
            GapType::NoReferences => "NO_REFERENCES",
        }
    }
}

impl std::fmt::Display for GapType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected weakness of a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentGap {
    pub gap_type: GapType,
    pub field_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_value: Option<String>,
    /// In `[0, 1]`.
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_reference_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_count: Option<usize>,
    pub reasoning: String,
}

impl ContentGap {
    pub fn new(gap_type: GapType, field_name: impl Into<String>, confidence: f32) -> Self {
        Self {
            gap_type,
            field_name: field_name.into(),
            current_value: None,
            suggested_value: None,
            confidence: confidence.clamp(0.0, 1.0),
            source_reference_id: None,
            missing_count: None,
            required_count: None,
            reasoning: String::new(),
        }
    }

    pub fn with_current(mut self, value: impl Into<String>) -> Self {
        self.current_value = Some(value.into());
        self
    }

    pub fn with_suggestion(mut self, value: impl Into<String>) -> Self {
        self.suggested_value = Some(value.into());
        self
    }

    pub fn with_source(mut self, reference_id: impl Into<String>) -> Self {
        self.source_reference_id = Some(reference_id.into());
        self
    }

    pub fn with_counts(mut self, missing: usize, required: usize) -> Self {
        self.missing_count = Some(missing);
        self.required_count = Some(required);
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }
}

/// Outcome of validating one topic. All scores are in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub topic_id: String,
    pub overall_score: f32,
    pub gaps: Vec<ContentGap>,
    pub matches: Vec<MatchedReference>,
    pub field_completeness_score: f32,
    pub content_accuracy_score: f32,
    pub reference_coverage_score: f32,
    pub validated_at: DateTime<Utc>,
}

impl ValidationResult {
    pub fn gaps_of(&self, gap_type: GapType) -> impl Iterator<Item = &ContentGap> {
        self.gaps.iter().filter(move |g| g.gap_type == gap_type)
    }

    pub fn has_gap(&self, gap_type: GapType) -> bool {
        self.gaps_of(gap_type).next().is_some()
    }
}
