//! Offline suggestions used when the LLM is unavailable.

use std::collections::{HashMap, HashSet};

use crate::hashing::bounded_prefix;
use crate::model::{MatchedReference, Topic};

/// Stock vocabulary per domain. Lookups are case-insensitive.
const DOMAIN_TERMS: &[(&str, &[&str])] = &[
    ("biology", &["cell", "organism", "evolution", "genetics", "metabolism", "ecosystem"]),
    ("chemistry", &["molecule", "reaction", "compound", "element", "bond", "catalyst"]),
    ("physics", &["energy", "force", "motion", "mass", "wave", "field"]),
    ("mathematics", &["theorem", "proof", "function", "equation", "set", "axiom"]),
    ("medicine", &["diagnosis", "treatment", "symptom", "pathology", "anatomy", "therapy"]),
    ("history", &["era", "civilization", "empire", "revolution", "chronology", "source"]),
    ("economics", &["market", "supply", "demand", "inflation", "capital", "trade"]),
    ("law", &["statute", "jurisdiction", "contract", "liability", "precedent", "court"]),
    ("computer science", &["algorithm", "data structure", "complexity", "program", "compiler", "network"]),
];

const STOPWORDS: &[&str] = &[
    "about", "after", "also", "because", "being", "between", "could", "every", "from", "have",
    "into", "other", "over", "should", "since", "some", "such", "than", "that", "their", "there",
    "these", "they", "this", "those", "through", "under", "upon", "very", "were", "what", "when",
    "where", "which", "while", "with", "within", "would",
];

const MIN_TERM_CHARS: usize = 4;

/// Stock terms for `domain`, empty for unknown domains.
pub fn domain_terms(domain: &str) -> &'static [&'static str] {
    let domain = domain.trim().to_lowercase();
    DOMAIN_TERMS
        .iter()
        .find(|(name, _)| *name == domain)
        .map(|(_, terms)| *terms)
        .unwrap_or(&[])
}

/// Up to `max` keywords for `topic` without calling a model.
///
/// Domain terms come first, then the most frequent words of the lead and definition.
/// Keywords the topic already carries are skipped.
pub fn fallback_keywords(topic: &Topic, max: usize) -> Vec<String> {
    let mut seen: HashSet<String> = topic
        .clean_keywords()
        .iter()
        .map(|k| k.to_lowercase())
        .collect();
    let mut out = Vec::with_capacity(max);

    for term in domain_terms(&topic.domain) {
        if out.len() >= max {
            return out;
        }
        if seen.insert(term.to_string()) {
            out.push(term.to_string());
        }
    }

    for term in frequent_terms(&format!("{} {}", topic.lead, topic.definition)) {
        if out.len() >= max {
            break;
        }
        if seen.insert(term.clone()) {
            out.push(term);
        }
    }
    out
}

/// Words by descending frequency; ties keep first-occurrence order.
fn frequent_terms(text: &str) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let words = text
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() >= MIN_TERM_CHARS && !STOPWORDS.contains(&w.as_str()));

    for (position, word) in words.enumerate() {
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.0.cmp(&a.1.0).then(a.1.1.cmp(&b.1.1)));
    ranked.into_iter().map(|(word, _)| word).collect()
}

/// Draft taken verbatim from the best reference, cut to `max_chars`.
///
/// Prefers ending on a sentence boundary in the second half of the budget. Falls back to
/// the topic's own definition when there is no usable reference.
pub fn fallback_definition(
    topic: &Topic,
    references: &[MatchedReference],
    max_chars: usize,
) -> String {
    let best = references
        .iter()
        .filter(|r| !r.snippet.trim().is_empty())
        .max_by(|a, b| a.final_score.total_cmp(&b.final_score));

    let Some(best) = best else {
        return topic.definition.trim().to_string();
    };

    let snippet = best.snippet.trim();
    let prefix = bounded_prefix(snippet, max_chars);
    if prefix.len() == snippet.len() {
        return prefix.to_string();
    }

    let half = prefix.len() / 2;
    match prefix.rfind(". ") {
        Some(pos) if pos >= half => prefix[..=pos].to_string(),
        _ => prefix.trim_end().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceType;

    fn reference(id: &str, score: f32, snippet: &str) -> MatchedReference {
        MatchedReference {
            reference_id: id.to_string(),
            title: String::new(),
            source_type: SourceType::Book,
            final_score: score,
            domain: "biology".to_string(),
            trust_score: 0.95,
            snippet: snippet.to_string(),
        }
    }

    #[test]
    fn test_domain_terms_case_insensitive() {
        assert_eq!(domain_terms("Biology"), domain_terms("biology"));
        assert!(!domain_terms(" physics ").is_empty());
        assert!(domain_terms("astrology").is_empty());
    }

    #[test]
    fn test_fallback_keywords_skip_existing() {
        let topic = Topic::new("t", "biology").with_keywords(["Cell", "evolution"]);
        let keywords = fallback_keywords(&topic, 3);

        assert_eq!(keywords, vec!["organism", "genetics", "metabolism"]);
    }

    #[test]
    fn test_fallback_keywords_use_topic_text_for_unknown_domain() {
        let topic = Topic::new("t", "astrology")
            .with_lead("Horoscope readings map planets")
            .with_definition("A horoscope assigns planets to houses; planets move.");
        let keywords = fallback_keywords(&topic, 2);

        assert_eq!(keywords, vec!["planets", "horoscope"]);
    }

    #[test]
    fn test_fallback_keywords_respects_max() {
        let topic = Topic::new("t", "chemistry");
        assert!(fallback_keywords(&topic, 0).is_empty());
        assert_eq!(fallback_keywords(&topic, 4).len(), 4);
    }

    #[test]
    fn test_fallback_definition_prefers_best_reference() {
        let refs = vec![
            reference("low", 0.7, "Low scoring text."),
            reference("high", 0.9, "High scoring text."),
        ];
        let topic = Topic::new("t", "biology");

        assert_eq!(fallback_definition(&topic, &refs, 300), "High scoring text.");
    }

    #[test]
    fn test_fallback_definition_cuts_at_sentence() {
        let snippet = "First sentence is here. Second sentence runs on and on past the limit";
        let refs = vec![reference("r", 0.9, snippet)];
        let draft = fallback_definition(&Topic::new("t", "d"), &refs, 40);

        assert_eq!(draft, "First sentence is here.");
    }

    #[test]
    fn test_fallback_definition_without_references() {
        let topic = Topic::new("t", "d").with_definition("  Existing definition.  ");
        assert_eq!(fallback_definition(&topic, &[], 300), "Existing definition.");
    }
}
