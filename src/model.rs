//! Domain types shared across the pipeline.

use serde::{Deserialize, Serialize};

use crate::constants::GENERIC_DEFAULT_TRUST;

/// A single exam-study note with its weighted content fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    #[serde(default)]
    pub domain: String,
    /// Short lead text.
    #[serde(default)]
    pub lead: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    /// Mnemonic / memory aid.
    #[serde(default)]
    pub memory_aid: String,
}

impl Topic {
    pub fn new(id: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            domain: domain.into(),
            ..Default::default()
        }
    }

    pub fn with_lead(mut self, lead: impl Into<String>) -> Self {
        self.lead = lead.into();
        self
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = definition.into();
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hashtags<I, S>(mut self, hashtags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hashtags = hashtags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_memory_aid(mut self, memory_aid: impl Into<String>) -> Self {
        self.memory_aid = memory_aid.into();
        self
    }

    /// Keywords with surrounding whitespace removed, empty entries dropped.
    pub fn clean_keywords(&self) -> Vec<&str> {
        clean_list(&self.keywords)
    }

    pub fn clean_hashtags(&self) -> Vec<&str> {
        clean_list(&self.hashtags)
    }

    /// Returns `true` if every content field is blank.
    pub fn is_blank(&self) -> bool {
        self.lead.trim().is_empty()
            && self.definition.trim().is_empty()
            && self.memory_aid.trim().is_empty()
            && self.clean_keywords().is_empty()
            && self.clean_hashtags().is_empty()
    }
}

fn clean_list(items: &[String]) -> Vec<&str> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Kind of authoritative source. Trust and thresholds differ by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Book,
    Markdown,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Book => "book",
            SourceType::Markdown => "markdown",
        }
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "book" | "pdf" => Ok(Self::Book),
            "markdown" | "md" => Ok(Self::Markdown),
            _ => Err(format!("Unknown source type: {}", s)),
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_trust() -> f32 {
    GENERIC_DEFAULT_TRUST
}

/// An authoritative reference (book or markdown excerpt) as plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDocument {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub source_type: SourceType,
    #[serde(default)]
    pub domain: String,
    pub text: String,
    /// Trust in [0,1]; the generic default is replaced by the source-type default at index time.
    #[serde(default = "default_trust")]
    pub trust_score: f32,
    /// Precomputed embedding, used only when the document is stored unchunked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl ReferenceDocument {
    pub fn new(
        id: impl Into<String>,
        source_type: SourceType,
        domain: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            source_type,
            domain: domain.into(),
            text: text.into(),
            trust_score: GENERIC_DEFAULT_TRUST,
            embedding: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_trust(mut self, trust_score: f32) -> Self {
        self.trust_score = trust_score;
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// One indexed segment of a [`ReferenceDocument`].
///
/// `parent_id` is a lookup key back to the source document, not an owning reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceChunk {
    /// Store id, `"{parent_id}#{chunk_index}"`.
    pub id: String,
    pub parent_id: String,
    pub chunk_index: usize,
    /// `false` when the document was stored whole.
    pub is_chunk: bool,
    pub text: String,
    pub title: String,
    pub source_type: SourceType,
    pub domain: String,
    pub trust_score: f32,
}

impl ReferenceChunk {
    pub fn chunk_id(parent_id: &str, chunk_index: usize) -> String {
        format!("{}#{}", parent_id, chunk_index)
    }
}

/// A reference resolved for a topic. Plain scalar copies of store data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedReference {
    /// Parent document id.
    pub reference_id: String,
    pub title: String,
    pub source_type: SourceType,
    /// Similarity fused with trust, in [0,1].
    pub final_score: f32,
    pub domain: String,
    pub trust_score: f32,
    pub snippet: String,
}
