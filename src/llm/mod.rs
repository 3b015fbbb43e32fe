//! LLM-assisted proposals: keyword suggestion and definition drafting.

pub mod assistant;
mod error;
pub mod fallback;
pub mod provider;
#[cfg(any(test, feature = "mock"))]
pub mod scripted;

#[cfg(test)]
mod tests;

pub use assistant::{DefinitionDraft, KeywordSuggestions, ProposalAssistant, SuggestionSource};
pub use error::LlmError;
pub use provider::{GenaiProvider, LlmProvider, LlmRequest, parse_json_response};
#[cfg(any(test, feature = "mock"))]
pub use scripted::ScriptedLlm;
