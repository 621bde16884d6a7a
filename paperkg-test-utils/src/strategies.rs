//! `proptest` generators for the data model, used by downstream crates'
//! property tests (content-hash stability, normalization idempotence, etc).

use chrono::{TimeZone, Utc};
use paperkg_core::{Author, GraphEntity, GraphEntityId, GraphEntityType, Paper, PaperId, PaperSource, ProcessingStatus};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::HashMap;

fn arb_author() -> impl Strategy<Value = Author> {
    "[A-Z][a-z]{2,10} [A-Z][a-z]{2,10}".prop_map(Author::new)
}

fn arb_source() -> impl Strategy<Value = PaperSource> {
    prop_oneof![Just(PaperSource::Bibliographic), Just(PaperSource::OpenAccess), Just(PaperSource::Manual)]
}

/// A structurally valid `Paper` with a correctly recomputed content hash.
pub fn arb_paper() -> impl Strategy<Value = Paper> {
    (
        "[a-z0-9]{6,12}",
        "[A-Za-z0-9 ,:-]{10,80}",
        vec(arb_author(), 1..4),
        "[A-Za-z0-9 .,]{20,200}",
        arb_source(),
        vec("[a-z]{2}\\.[A-Z]{2}", 1..3),
    )
        .prop_map(|(id, title, authors, abstract_text, source, categories)| {
            let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let mut paper = Paper {
                id: PaperId::new(id),
                title,
                authors,
                abstract_text,
                published_date: fixed_time,
                source,
                categories,
                content_hash: String::new(),
                ingestion_date: fixed_time,
                last_updated: fixed_time,
                processing_status: ProcessingStatus::Ingested,
                doi: None,
                external_id: None,
                citation_count: Some(0),
                references: Vec::new(),
            };
            paper.recompute_content_hash();
            paper
        })
}

fn arb_entity_type() -> impl Strategy<Value = GraphEntityType> {
    prop_oneof![
        Just(GraphEntityType::AiModel),
        Just(GraphEntityType::Technique),
        Just(GraphEntityType::Concept),
        Just(GraphEntityType::Organization),
        Just(GraphEntityType::Person),
        Just(GraphEntityType::Publication),
        Just(GraphEntityType::Benchmark),
        Just(GraphEntityType::Community),
        Just(GraphEntityType::Entity),
    ]
}

pub fn arb_graph_entity() -> impl Strategy<Value = GraphEntity> {
    ("[a-z0-9]{6,12}", arb_entity_type(), "[A-Za-z0-9 -]{3,40}").prop_map(|(id, entity_type, name)| GraphEntity {
        id: GraphEntityId::new(id),
        entity_type,
        name,
        properties: HashMap::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn arb_paper_always_has_a_nonempty_hash(paper in arb_paper()) {
            prop_assert!(!paper.content_hash.is_empty());
        }

        #[test]
        fn arb_graph_entity_name_is_nonempty(entity in arb_graph_entity()) {
            prop_assert!(!entity.name.is_empty());
        }
    }
}
