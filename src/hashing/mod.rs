//! Cache-key digests and key builders.
//!
//! Keys embed a BLAKE3 digest truncated to [`KEY_HASH_HEX_LEN`] hex characters. Each part
//! of a key (a topic field, a line of a composed text) contributes at most
//! [`KEY_HASH_PREFIX_CHARS`] characters, so one long field cannot push the others out of the
//! digest.
//!
//! # Collision Tolerance
//!
//! 16 hex characters are 64 bits. Two inputs whose parts agree on every bounded prefix, or
//! that collide in the truncated digest, map to the same key and one cached value is served
//! for both. Every cache call site is best-effort, so the worst case is a stale cached value
//! until its TTL expires.

use blake3::Hasher;

use crate::constants::{KEY_HASH_HEX_LEN, KEY_HASH_PREFIX_CHARS};
use crate::model::Topic;

/// Returns the first `max_chars` characters of `text` (on a char boundary).
#[inline]
pub fn bounded_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// 16-hex-char digest of the bounded prefix of `text`.
#[inline]
pub fn hash16(text: &str) -> String {
    let prefix = bounded_prefix(text, KEY_HASH_PREFIX_CHARS);
    truncate_hex(blake3::hash(prefix.as_bytes()))
}

/// 16-hex-char digest over several parts, separated so `["ab","c"]` ≠ `["a","bc"]`.
///
/// Every part is bounded on its own.
pub fn hash16_parts<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Hasher::new();
    for part in parts {
        let part = bounded_prefix(part.as_ref(), KEY_HASH_PREFIX_CHARS);
        hasher.update(part.as_bytes());
        hasher.update(b"\x1f");
    }
    truncate_hex(hasher.finalize())
}

/// [`hash16_parts`] over the lines of a composed text (representation, prompt).
pub fn hash16_lines(text: &str) -> String {
    hash16_parts(text.split('\n'))
}

fn truncate_hex(hash: blake3::Hash) -> String {
    let hex = hash.to_hex();
    hex.as_str()[..KEY_HASH_HEX_LEN].to_string()
}

/// Digest of the semantically relevant topic content (id excluded).
pub fn topic_content_hash(topic: &Topic) -> String {
    let keywords = topic.keywords.join(",");
    let hashtags = topic.hashtags.join(",");
    hash16_parts([
        topic.domain.as_str(),
        topic.definition.as_str(),
        topic.lead.as_str(),
        keywords.as_str(),
        hashtags.as_str(),
        topic.memory_aid.as_str(),
    ])
}

/// Digest of a reference id set, independent of input order.
pub fn reference_set_hash<I, S>(reference_ids: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut ids: Vec<String> = reference_ids
        .into_iter()
        .map(|id| id.as_ref().to_string())
        .collect();
    ids.sort();
    ids.dedup();
    let mut hasher = Hasher::new();
    for id in &ids {
        hasher.update(id.as_bytes());
        hasher.update(b"\x1f");
    }
    truncate_hex(hasher.finalize())
}

/// `embedding:text:<hash16>`
pub fn embedding_key(text: &str) -> String {
    format!("embedding:text:{}", hash16_lines(text))
}

/// `validation:<topic_id>:<topic_hash16>:<refs_hash16>`
pub fn validation_key(topic: &Topic, reference_ids: &[&str]) -> String {
    format!(
        "validation:{}:{}:{}",
        topic.id,
        topic_content_hash(topic),
        reference_set_hash(reference_ids)
    )
}

/// Glob matching every validation entry of one topic, and no other topic's.
///
/// The id is escaped and the two digests are matched as hex runs, so `t1` does not reach
/// entries of `t1:x`.
pub fn validation_topic_pattern(topic_id: &str) -> String {
    let digest = "[0-9a-f]".repeat(KEY_HASH_HEX_LEN);
    format!(
        "validation:{}:{}:{}",
        globset::escape(topic_id),
        digest,
        digest
    )
}

/// Glob matching every validation entry.
pub const VALIDATION_ALL_PATTERN: &str = "validation:*";

/// `llm:keywords:<hash16>`
pub fn llm_keywords_key(prompt: &str) -> String {
    format!("llm:keywords:{}", hash16_lines(prompt))
}

/// `llm:generation:<hash16>`
pub fn llm_generation_key(prompt: &str) -> String {
    format!("llm:generation:{}", hash16_lines(prompt))
}

/// Stable 64-bit point id for a string id (vector stores that need numeric ids).
#[inline]
pub fn point_id(id: &str) -> u64 {
    let hash = blake3::hash(id.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}
