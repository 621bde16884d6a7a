//! Deterministic, minimally-specified fixture constructors. Every field
//! that a test doesn't care about gets a fixed, recognizable default so
//! assertions can pattern-match against literals instead of wildcards.

use chrono::{TimeZone, Utc};
use paperkg_core::{
    Alias, AliasSource, Author, GraphEntity, GraphEntityId, GraphEntityType, GraphRelation,
    GraphRelationId, GraphRelationType, NormalizationRule, Paper, PaperId, PaperSource,
    ProcessingStatus, RuleId,
};
use std::collections::HashMap;

/// A `Paper` with every required field filled in and a content hash that
/// actually matches (title, abstract, authors, categories).
pub struct PaperBuilder {
    paper: Paper,
}

impl PaperBuilder {
    pub fn new(id: &str, title: &str) -> Self {
        let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut paper = Paper {
            id: PaperId::new(id),
            title: title.to_string(),
            authors: vec![Author::new("Ada Researcher")],
            abstract_text: "A short abstract for testing.".to_string(),
            published_date: fixed_time,
            source: PaperSource::Bibliographic,
            categories: vec!["cs.CL".to_string()],
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
        Self { paper }
    }

    pub fn with_authors(mut self, names: &[&str]) -> Self {
        self.paper.authors = names.iter().map(|n| Author::new(*n)).collect();
        self.paper.recompute_content_hash();
        self
    }

    pub fn with_doi(mut self, doi: &str) -> Self {
        self.paper.doi = Some(doi.to_string());
        self
    }

    pub fn with_external_id(mut self, external_id: &str) -> Self {
        self.paper.external_id = Some(external_id.to_string());
        self
    }

    pub fn with_abstract(mut self, text: &str) -> Self {
        self.paper.abstract_text = text.to_string();
        self.paper.recompute_content_hash();
        self
    }

    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.paper.categories = categories.iter().map(|c| c.to_string()).collect();
        self.paper.recompute_content_hash();
        self
    }

    pub fn with_source(mut self, source: PaperSource) -> Self {
        self.paper.source = source;
        self
    }

    pub fn build(self) -> Paper {
        self.paper
    }
}

pub fn paper(id: &str, title: &str) -> Paper {
    PaperBuilder::new(id, title).build()
}

pub fn graph_entity(id: &str, entity_type: GraphEntityType, name: &str) -> GraphEntity {
    GraphEntity { id: GraphEntityId::new(id), entity_type, name: name.to_string(), properties: HashMap::new() }
}

pub fn graph_relation(id: &str, relation_type: GraphRelationType, source_id: &str, target_id: &str) -> GraphRelation {
    GraphRelation {
        id: GraphRelationId::new(id),
        relation_type,
        source_id: GraphEntityId::new(source_id),
        target_id: GraphEntityId::new(target_id),
        weight: Some(1.0),
        properties: HashMap::new(),
    }
}

pub fn alias(surface_form: &str, canonical: &str, source: AliasSource) -> Alias {
    let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Alias {
        alias: surface_form.to_string(),
        canonical: canonical.to_string(),
        confidence: 0.9,
        source,
        created_at: fixed_time,
        updated_at: fixed_time,
    }
}

pub fn normalization_rule(id: &str, pattern: &str, replacement: &str, priority: i32) -> NormalizationRule {
    NormalizationRule { id: RuleId::new(id), pattern: pattern.to_string(), replacement: replacement.to_string(), priority, category: None }
}
