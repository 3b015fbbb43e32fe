//! Trust-adjusted scoring and candidate ranking.

use std::collections::HashSet;

use crate::config::{MatcherConfig, TrustDefaults};
use crate::hashing::bounded_prefix;
use crate::model::{MatchedReference, SourceType};
use crate::vectordb::StoreMatch;

/// Source type assumed for records stored without one.
pub const FALLBACK_SOURCE_TYPE: SourceType = SourceType::Markdown;

/// `clamp(similarity × (base_weight + trust_weight × trust), 0, 1)`.
///
/// Non-decreasing in both `similarity` and `trust` for non-negative weights. Non-finite
/// inputs score 0.
#[inline]
pub fn final_score(similarity: f32, trust: f32, base_weight: f32, trust_weight: f32) -> f32 {
    let score = similarity * (base_weight + trust_weight * trust);
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Turns store hits (ascending distance) into at most `top_k` matches, best first.
///
/// Candidates are visited in store order. Each is scored, dropped if under its source-type
/// threshold, and skipped if its parent document already produced a match, so the first
/// surviving chunk of a document represents it.
pub fn rank_candidates(
    candidates: Vec<StoreMatch>,
    top_k: usize,
    config: &MatcherConfig,
    trust_defaults: &TrustDefaults,
) -> Vec<MatchedReference> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut matches: Vec<MatchedReference> = Vec::with_capacity(top_k.min(candidates.len()));

    for candidate in candidates {
        if matches.len() >= top_k {
            break;
        }

        let source_type = candidate
            .metadata
            .source_type
            .unwrap_or(FALLBACK_SOURCE_TYPE);
        let trust = candidate
            .metadata
            .trust_score
            .filter(|t| t.is_finite())
            .unwrap_or_else(|| trust_defaults.for_source(source_type));
        let similarity = 1.0 - candidate.distance;
        let score = final_score(similarity, trust, config.base_weight, config.trust_weight);

        if score < config.threshold_for(source_type) {
            continue;
        }

        let parent_id = candidate.parent_id().to_string();
        if !seen.insert(parent_id.clone()) {
            continue;
        }

        matches.push(MatchedReference {
            reference_id: parent_id,
            title: candidate.metadata.title,
            source_type,
            final_score: score,
            domain: candidate.metadata.domain,
            trust_score: trust,
            snippet: bounded_prefix(&candidate.document, config.snippet_chars).to_string(),
        });
    }

    matches.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    matches
}
