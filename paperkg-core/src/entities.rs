//! Entity structs for the PaperKG data model.

use crate::enums::{
    AdoptionPhase, AliasSource, GraphEntityType, GraphRelationType, PaperSource, ProcessingStatus,
};
use crate::ids::{GraphEntityId, GraphRelationId, PaperId, RuleId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A free-form property value, replacing the source's dynamic/heterogeneous
/// `properties` map with a small tagged union covering the shapes that
/// actually appear on graph nodes and edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

/// A property bag keyed by string, as carried on `GraphEntity` and `GraphRelation`.
pub type PropertyMap = HashMap<String, PropertyValue>;

/// A single author on a `Paper`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub affiliations: Vec<String>,
    #[serde(default)]
    pub external_id: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            affiliations: Vec::new(),
            external_id: None,
        }
    }
}

/// Canonical ingestion record for a scholarly paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub id: PaperId,
    pub title: String,
    pub authors: Vec<Author>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub published_date: DateTime<Utc>,
    pub source: PaperSource,
    pub categories: Vec<String>,
    pub content_hash: String,
    pub ingestion_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub processing_status: ProcessingStatus,
    pub doi: Option<String>,
    pub external_id: Option<String>,
    pub citation_count: Option<u64>,
    pub references: Vec<String>,
}

impl Paper {
    /// Recompute and store `content_hash` from the current (title, abstract,
    /// authors, categories).
    pub fn recompute_content_hash(&mut self) {
        self.content_hash = crate::content_hash::paper_content_hash(
            &self.title,
            &self.abstract_text,
            &self.authors,
            &self.categories,
        );
    }
}

/// A typed node in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEntity {
    pub id: GraphEntityId,
    #[serde(rename = "type")]
    pub entity_type: GraphEntityType,
    pub name: String,
    #[serde(default)]
    pub properties: PropertyMap,
}

/// A typed directed edge in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRelation {
    pub id: GraphRelationId,
    #[serde(rename = "type")]
    pub relation_type: GraphRelationType,
    pub source_id: GraphEntityId,
    pub target_id: GraphEntityId,
    /// Confidence in [0, 1], when present.
    pub weight: Option<f64>,
    #[serde(default)]
    pub properties: PropertyMap,
}

/// A mapping from a surface form to a canonical entity name.
///
/// `(lowercased-trimmed alias)` is the primary key; see
/// [`crate::text_norm::normalize_alias_key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    pub alias: String,
    pub canonical: String,
    pub confidence: f64,
    pub source: AliasSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Alias {
    /// The primary-key form of this alias, per the table's invariant.
    pub fn key(&self) -> String {
        crate::text_norm::normalize_alias_key(&self.alias)
    }
}

/// A single rule in the rule-normalization stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationRule {
    pub id: RuleId,
    /// Regular expression matched case-insensitively.
    pub pattern: String,
    pub replacement: String,
    /// Higher priority rules are applied first.
    pub priority: i32,
    pub category: Option<String>,
}

/// A per-(entity, date) citation-dynamics data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub entity_id: GraphEntityId,
    pub date: DateTime<Utc>,
    pub citation_count: u64,
    pub velocity: f64,
    pub momentum: f64,
    pub adoption_phase: AdoptionPhase,
    pub rank: Option<u32>,
}

/// A materialized point-in-time summary of phase distribution and hot topics
/// on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSnapshot {
    pub captured_at: DateTime<Utc>,
    pub phase_counts: HashMap<String, u64>,
    pub top_hot_topics: Vec<GraphEntityId>,
}

/// The result of a graph traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub nodes: Vec<GraphEntity>,
    pub relations: Vec<GraphRelation>,
    pub score: Option<f64>,
    pub total_weight: Option<f64>,
}

impl Path {
    /// Number of hops, always `nodes.len() - 1`.
    pub fn hops(&self) -> usize {
        self.relations.len()
    }

    /// Whether this path revisits any node (cycle detection).
    pub fn is_acyclic(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.nodes.len());
        self.nodes.iter().all(|n| seen.insert(&n.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, ty: GraphEntityType, name: &str) -> GraphEntity {
        GraphEntity {
            id: GraphEntityId::new(id),
            entity_type: ty,
            name: name.to_string(),
            properties: HashMap::new(),
        }
    }

    fn relation(id: &str, source: &str, target: &str) -> GraphRelation {
        GraphRelation {
            id: GraphRelationId::new(id),
            relation_type: GraphRelationType::Cites,
            source_id: GraphEntityId::new(source),
            target_id: GraphEntityId::new(target),
            weight: None,
            properties: HashMap::new(),
        }
    }

    #[test]
    fn path_hops_equals_relation_count() {
        let path = Path {
            nodes: vec![
                entity("1", GraphEntityType::Entity, "a"),
                entity("2", GraphEntityType::Entity, "b"),
                entity("3", GraphEntityType::Entity, "c"),
            ],
            relations: vec![relation("r1", "1", "2"), relation("r2", "2", "3")],
            score: None,
            total_weight: None,
        };
        assert_eq!(path.hops(), 2);
        assert_eq!(path.hops(), path.nodes.len() - 1);
        assert!(path.is_acyclic());
    }

    #[test]
    fn path_with_revisited_node_is_cyclic() {
        let path = Path {
            nodes: vec![
                entity("1", GraphEntityType::Entity, "a"),
                entity("2", GraphEntityType::Entity, "b"),
                entity("1", GraphEntityType::Entity, "a"),
            ],
            relations: vec![relation("r1", "1", "2"), relation("r2", "2", "1")],
            score: None,
            total_weight: None,
        };
        assert!(!path.is_acyclic());
    }

    #[test]
    fn alias_key_is_lowercased_and_trimmed() {
        let alias = Alias {
            alias: "  GPT-4  ".to_string(),
            canonical: "GPT4".to_string(),
            confidence: 0.9,
            source: AliasSource::Rule,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(alias.key(), "gpt-4");
    }
}
