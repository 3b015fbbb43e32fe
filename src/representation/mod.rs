//! Weighted single-text representation of a topic.
//!
//! Embedding one text keeps a topic to one vector. Field importance is expressed by
//! repetition: a field with weight `w > 0` appears `max(1, round(w × 8))` times, a field with
//! weight 0 not at all. With the default weights that is definition ×3, lead ×2, keywords ×2,
//! hashtags ×1, memory aid ×1. Repetitions are joined one per line; embedding cache keys
//! digest each line separately.

use crate::config::FieldWeights;
use crate::model::Topic;

/// Repetition units per unit of weight.
const REPETITION_SCALE: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeightedRepresentationBuilder {
    weights: FieldWeights,
}

impl WeightedRepresentationBuilder {
    pub fn new(weights: FieldWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &FieldWeights {
        &self.weights
    }

    /// How many times a field of `weight` is repeated. Zero for non-positive weights.
    pub fn repetitions(weight: f32) -> usize {
        if !weight.is_finite() || weight <= 0.0 {
            return 0;
        }
        ((weight * REPETITION_SCALE).round() as usize).max(1)
    }

    /// Builds the embeddable text. Never empty.
    ///
    /// Field order is definition, lead, keywords, hashtags, memory aid. Empty fields
    /// contribute nothing; a topic with no content yields `"topic <id> in <domain>"`.
    pub fn build(&self, topic: &Topic) -> String {
        let keywords = topic.clean_keywords().join(", ");
        let hashtags = topic.clean_hashtags().join(" ");

        let fields = [
            (topic.definition.trim(), self.weights.definition),
            (topic.lead.trim(), self.weights.lead),
            (keywords.as_str(), self.weights.keywords),
            (hashtags.as_str(), self.weights.hashtags),
            (topic.memory_aid.trim(), self.weights.memory_aid),
        ];

        let mut parts: Vec<&str> = Vec::new();
        for (text, weight) in fields {
            if text.is_empty() {
                continue;
            }
            parts.extend(std::iter::repeat_n(text, Self::repetitions(weight)));
        }

        if parts.is_empty() {
            return placeholder(topic);
        }
        parts.join("\n")
    }
}

fn placeholder(topic: &Topic) -> String {
    let id = topic.id.trim();
    let domain = topic.domain.trim();
    match (id.is_empty(), domain.is_empty()) {
        (true, true) => "untitled topic".to_string(),
        (false, true) => format!("topic {}", id),
        (true, false) => format!("topic in {}", domain),
        (false, false) => format!("topic {} in {}", id, domain),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_topic() -> Topic {
        Topic::new("t-1", "biology")
            .with_definition("DEF")
            .with_lead("LEAD")
            .with_keywords(["k1", "k2"])
            .with_hashtags(["#h1", "#h2"])
            .with_memory_aid("AID")
    }

    #[test]
    fn test_default_repetitions() {
        let w = FieldWeights::default();
        assert_eq!(WeightedRepresentationBuilder::repetitions(w.definition), 3);
        assert_eq!(WeightedRepresentationBuilder::repetitions(w.lead), 2);
        assert_eq!(WeightedRepresentationBuilder::repetitions(w.keywords), 2);
        assert_eq!(WeightedRepresentationBuilder::repetitions(w.hashtags), 1);
        assert_eq!(WeightedRepresentationBuilder::repetitions(w.memory_aid), 1);
        assert_eq!(WeightedRepresentationBuilder::repetitions(0.01), 1);
        assert_eq!(WeightedRepresentationBuilder::repetitions(0.0), 0);
        assert_eq!(WeightedRepresentationBuilder::repetitions(-0.2), 0);
        assert_eq!(WeightedRepresentationBuilder::repetitions(f32::NAN), 0);
    }

    #[test]
    fn test_build_repeats_fields_in_order() {
        let text = WeightedRepresentationBuilder::default().build(&full_topic());
        assert_eq!(
            text,
            "DEF\nDEF\nDEF\nLEAD\nLEAD\nk1, k2\nk1, k2\n#h1 #h2\nAID"
        );
    }

    #[test]
    fn test_build_skips_empty_fields() {
        let topic = Topic::new("t-2", "law").with_lead("Only a lead");
        let text = WeightedRepresentationBuilder::default().build(&topic);
        assert_eq!(text, "Only a lead\nOnly a lead");
    }

    #[test]
    fn test_zero_weight_field_is_left_out() {
        let weights = FieldWeights {
            memory_aid: 0.0,
            ..FieldWeights::default()
        };
        let text = WeightedRepresentationBuilder::new(weights).build(&full_topic());
        assert!(!text.contains("AID"));
        assert!(text.contains("DEF"));

        let only_aid = Topic::new("t-4", "history").with_memory_aid("AID");
        assert_eq!(
            WeightedRepresentationBuilder::new(weights).build(&only_aid),
            "topic t-4 in history"
        );
    }

    #[test]
    fn test_embedding_key_tracks_lead_behind_long_definition() {
        let builder = WeightedRepresentationBuilder::default();
        let definition = "The citric acid cycle. ".repeat(33);
        let a = Topic::new("t-5", "biology")
            .with_definition(definition.clone())
            .with_lead("Oxidizes acetyl CoA");
        let b = a.clone().with_lead("Runs in the mitochondrial matrix");

        let (text_a, text_b) = (builder.build(&a), builder.build(&b));
        assert_ne!(text_a, text_b);
        assert_ne!(
            crate::hashing::embedding_key(&text_a),
            crate::hashing::embedding_key(&text_b)
        );
    }

    #[test]
    fn test_blank_topic_placeholder() {
        let builder = WeightedRepresentationBuilder::default();

        let topic = Topic::new("t-3", "chemistry").with_keywords(["  ", ""]);
        assert_eq!(builder.build(&topic), "topic t-3 in chemistry");
        assert_eq!(builder.build(&Topic::new("", "")), "untitled topic");
        assert!(!builder.build(&Topic::new("x", "")).is_empty());
    }

    #[test]
    fn test_build_is_pure() {
        let builder = WeightedRepresentationBuilder::default();
        let topic = full_topic();
        assert_eq!(builder.build(&topic), builder.build(&topic));
    }
}
