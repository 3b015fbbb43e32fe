//! Overlapping character-window chunker for long reference documents.
//!
//! Documents longer than `threshold_chars` are cut into windows of at most
//! `threshold_chars` characters. Inside each window the cut point prefers, in order:
//!
//! 1. the last paragraph break (`\n\n`) in the second half of the window,
//! 2. the last line break (`\n`) in the second half,
//! 3. the last sentence end (`. `) in the second half,
//! 4. a hard cut at the window edge.
//!
//! The next window starts `overlap_chars` before the cut, and always at least one character
//! after the previous start. Offsets are character offsets, so multi-byte text never splits
//! inside a code point. Chunk text is not trimmed; dropping each chunk's leading overlap and
//! concatenating reproduces the input exactly.

use tracing::debug;

use crate::config::ChunkingConfig;
use crate::model::{ReferenceChunk, ReferenceDocument};

/// One window of a split text. `start..end` are character offsets into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl TextChunk {
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DocumentChunker {
    config: ChunkingConfig,
}

impl DocumentChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// `true` when `text` exceeds the chunk threshold.
    pub fn needs_chunking(&self, text: &str) -> bool {
        text.chars().nth(self.config.threshold_chars).is_some()
    }

    /// Splits `text` into overlapping windows. Deterministic for identical inputs.
    ///
    /// Text at or below the threshold comes back as a single chunk; empty text yields none.
    pub fn split(&self, text: &str) -> Vec<TextChunk> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let size = self.config.threshold_chars.max(1);
        let overlap = self.config.overlap_chars.min(size - 1);

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < len {
            let end = (start + size).min(len);
            let cutoff = if end < len {
                find_break(&chars, start, end, size)
            } else {
                end
            };

            chunks.push(TextChunk {
                index: chunks.len(),
                start,
                end: cutoff,
                text: chars[start..cutoff].iter().collect(),
            });

            if cutoff >= len {
                break;
            }
            start = cutoff.saturating_sub(overlap).max(start + 1);
        }

        chunks
    }

    /// Turns a document into store records carrying `trust_score`.
    ///
    /// Short documents become one whole record (`is_chunk = false`, index 0, id = document
    /// id); long ones become `"{id}#{index}"` records.
    pub fn chunk_document(&self, document: &ReferenceDocument, trust_score: f32) -> Vec<ReferenceChunk> {
        let record = |id: String, index: usize, is_chunk: bool, text: String| ReferenceChunk {
            id,
            parent_id: document.id.clone(),
            chunk_index: index,
            is_chunk,
            text,
            title: document.title.clone(),
            source_type: document.source_type,
            domain: document.domain.clone(),
            trust_score,
        };

        if !self.needs_chunking(&document.text) {
            return vec![record(document.id.clone(), 0, false, document.text.clone())];
        }

        let chunks: Vec<ReferenceChunk> = self
            .split(&document.text)
            .into_iter()
            .map(|chunk| {
                record(
                    ReferenceChunk::chunk_id(&document.id, chunk.index),
                    chunk.index,
                    true,
                    chunk.text,
                )
            })
            .collect();

        debug!(
            document_id = %document.id,
            chars = document.char_len(),
            chunks = chunks.len(),
            "Chunked reference document"
        );
        chunks
    }
}

/// Cut point inside `chars[start..end]`, exclusive. Breaks are only accepted in the second
/// half of the window so chunks never shrink below half the target size.
fn find_break(chars: &[char], start: usize, end: usize, size: usize) -> usize {
    let min_cut = start + size / 2;

    rfind_in(chars, min_cut, end, &['\n', '\n'])
        .or_else(|| rfind_in(chars, min_cut, end, &['\n']))
        .or_else(|| rfind_in(chars, min_cut, end, &['.', ' ']).map(|pos| pos - 1))
        .unwrap_or(end)
}

/// Position just past the last occurrence of `needle` starting at or after `from` and ending
/// by `to`.
fn rfind_in(chars: &[char], from: usize, to: usize, needle: &[char]) -> Option<usize> {
    let n = needle.len();
    (from..to)
        .rev()
        .filter(|&pos| pos + n <= to)
        .find(|&pos| chars[pos..pos + n] == *needle)
        .map(|pos| pos + n)
}

/// Rebuilds the source from chunks by dropping each chunk's overlap with its predecessor.
pub fn reassemble(chunks: &[TextChunk]) -> String {
    let mut out = String::new();
    let mut covered: usize = 0;
    for chunk in chunks {
        let skip = covered.saturating_sub(chunk.start);
        out.extend(chunk.text.chars().skip(skip));
        covered = covered.max(chunk.end);
    }
    out
}
