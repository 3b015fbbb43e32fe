//! Shared topics and reference documents.

use refcheck::model::{MatchedReference, ReferenceDocument, SourceType, Topic};

pub const BIOLOGY: &str = "biology";
pub const CHEMISTRY: &str = "chemistry";

pub fn krebs_topic() -> Topic {
    Topic::new("topic-krebs", BIOLOGY)
        .with_lead("The Krebs cycle oxidizes acetyl CoA inside mitochondria to release energy.")
        .with_definition(
            "The Krebs cycle, also called the citric acid cycle, is a series of reactions in \
             the mitochondrial matrix that oxidizes acetyl CoA and produces NADH and FADH2.",
        )
        .with_keywords(["krebs", "citric acid", "mitochondria"])
        .with_hashtags(["#biochemistry", "#metabolism"])
        .with_memory_aid("Citrate Is Krebs' Starting Substrate")
}

pub fn empty_topic() -> Topic {
    Topic::new("topic-empty", BIOLOGY)
}

pub fn krebs_book() -> ReferenceDocument {
    ReferenceDocument::new(
        "ref-krebs-book",
        SourceType::Book,
        BIOLOGY,
        "The Krebs cycle, or citric acid cycle, runs in the mitochondrial matrix. Acetyl CoA \
         is oxidized, producing NADH, FADH2 and ATP. krebs citric acid mitochondria.",
    )
    .with_title("Principles of Biochemistry")
    .with_trust(0.95)
}

pub fn glycolysis_notes() -> ReferenceDocument {
    ReferenceDocument::new(
        "ref-glycolysis-notes",
        SourceType::Markdown,
        BIOLOGY,
        "Glycolysis splits glucose into two pyruvate molecules in the cytoplasm.",
    )
    .with_title("Glycolysis notes")
}

pub fn bonding_notes() -> ReferenceDocument {
    ReferenceDocument::new(
        "ref-bonding-notes",
        SourceType::Markdown,
        CHEMISTRY,
        "Covalent bonds share electron pairs between atoms.",
    )
    .with_title("Chemical bonding")
}

/// A markdown reference long enough to be chunked into three records.
pub fn long_reference(id: &str) -> ReferenceDocument {
    let paragraph = "Mitochondria are the site of cellular respiration. ".repeat(20);
    let text: String = std::iter::repeat_n(paragraph.trim_end(), 12)
        .collect::<Vec<_>>()
        .join("\n\n");
    ReferenceDocument::new(id, SourceType::Markdown, BIOLOGY, text).with_title("Long notes")
}

pub fn corpus() -> Vec<ReferenceDocument> {
    vec![krebs_book(), glycolysis_notes(), bonding_notes()]
}

pub fn matched(id: &str, score: f32, snippet: &str) -> MatchedReference {
    MatchedReference {
        reference_id: id.to_string(),
        title: format!("Reference {}", id),
        source_type: SourceType::Book,
        final_score: score,
        domain: BIOLOGY.to_string(),
        trust_score: 0.95,
        snippet: snippet.to_string(),
    }
}
