//! The [`GraphStore`] trait: every way a caller reads or writes the graph.

use async_trait::async_trait;
use paperkg_core::{
    GraphEntity, GraphEntityId, GraphEntityType, GraphRelation, GraphRelationId, PropertyMap,
    Retryable, TransientKind,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// One row of a `run()` result: a flat map from the query's return aliases
/// to the values bound to them.
pub type ResultRow = HashMap<String, paperkg_core::PropertyValue>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub rows: Vec<ResultRow>,
}

/// A snapshot of the graph's label/relationship-type/property shape, used
/// to ground Cypher-generation prompts and to validate generated queries
/// without touching the store on every call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub entity_labels: Vec<String>,
    pub relationship_types: Vec<String>,
    pub properties_by_label: HashMap<String, Vec<String>>,
}

impl SchemaSnapshot {
    /// Render as a compact, human-readable block suitable for embedding in
    /// an LLM prompt.
    pub fn format_for_prompt(&self) -> String {
        let mut out = String::new();
        out.push_str("Entity labels: ");
        out.push_str(&self.entity_labels.join(", "));
        out.push_str("\nRelationship types: ");
        out.push_str(&self.relationship_types.join(", "));
        for label in &self.entity_labels {
            if let Some(props) = self.properties_by_label.get(label) {
                out.push_str(&format!("\n{label} properties: {}", props.join(", ")));
            }
        }
        out
    }

    /// Render as a JSON dump, for callers that inject the schema into a
    /// prompt as structured data rather than prose (`format_for_prompt`'s
    /// human-readable counterpart).
    pub fn format_as_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Outcome of a bulk MERGE: which records were accepted, which were
/// rejected (with a reason), and, per the additive field decided for
/// partial-batch failures, the error that aborted the remainder of the
/// batch when one occurred.
#[derive(Debug, Default)]
pub struct BatchResult<Id> {
    pub accepted: Vec<Id>,
    pub rejected: Vec<(Id, String)>,
    pub aborting_error: Option<GraphError>,
}

impl<Id> BatchResult<Id> {
    pub fn is_complete(&self) -> bool {
        self.aborting_error.is_none()
    }
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("entity or relation not found: {0}")]
    NotFound(String),

    #[error("transaction aborted: {0}")]
    TransactionAborted(String),

    #[error("transient store error: {0:?}")]
    Transient(TransientKind),

    #[error("query failed: {0}")]
    QueryFailed(String),
}

impl Retryable for GraphError {
    fn is_retryable(&self) -> bool {
        matches!(self, GraphError::Transient(_))
    }
}

/// The graph-store boundary. Implementations own connection pooling and
/// session lifecycle; callers never see a session object directly.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Run a read-only Cypher statement and return its result rows.
    async fn run(&self, cypher: &str, params: PropertyMap) -> Result<QueryResult, GraphError>;

    /// Run a write Cypher statement in its own transaction.
    async fn run_write(&self, cypher: &str, params: PropertyMap) -> Result<QueryResult, GraphError>;

    /// MERGE a single entity by id, creating or updating it.
    async fn merge_entity(&self, entity: &GraphEntity) -> Result<(), GraphError>;

    /// MERGE a single relation by id, creating or updating it.
    async fn merge_relation(&self, relation: &GraphRelation) -> Result<(), GraphError>;

    /// Bulk MERGE via UNWIND, stopping and reporting the failure point if
    /// the underlying store rejects the batch partway through.
    async fn bulk_merge_entities(
        &self,
        entities: &[GraphEntity],
    ) -> Result<BatchResult<GraphEntityId>, GraphError>;

    async fn bulk_merge_relations(
        &self,
        relations: &[GraphRelation],
    ) -> Result<BatchResult<GraphRelationId>, GraphError>;

    async fn get_entity(&self, id: &GraphEntityId) -> Result<Option<GraphEntity>, GraphError>;

    /// Entities matching `entity_type`, optionally narrowed to an exact
    /// `name`. Used by the reasoner to resolve a path query's start/end
    /// endpoints before it begins expanding.
    async fn find_entities(
        &self,
        entity_type: GraphEntityType,
        name: Option<&str>,
    ) -> Result<Vec<GraphEntity>, GraphError>;

    async fn delete_entity(&self, id: &GraphEntityId) -> Result<(), GraphError>;

    /// Relations with `id` as their source, for traversal. Graph databases
    /// would express this as a one-hop Cypher pattern; it is broken out as
    /// its own method so the reasoner doesn't have to generate and parse
    /// Cypher just to walk the graph.
    async fn outgoing_relations(&self, id: &GraphEntityId) -> Result<Vec<GraphRelation>, GraphError>;

    /// Introspect the current label/relationship-type/property shape of the
    /// graph, for schema-aware Cypher generation.
    async fn schema_snapshot(&self) -> Result<SchemaSnapshot, GraphError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable_not_found_is_not() {
        assert!(GraphError::Transient(TransientKind::DeadlockDetected).is_retryable());
        assert!(!GraphError::NotFound("x".into()).is_retryable());
    }

    #[test]
    fn schema_snapshot_formats_labels_and_properties() {
        let mut properties_by_label = HashMap::new();
        properties_by_label.insert("Paper".to_string(), vec!["title".to_string(), "doi".to_string()]);
        let snapshot = SchemaSnapshot {
            entity_labels: vec!["Paper".to_string()],
            relationship_types: vec!["CITES".to_string()],
            properties_by_label,
        };
        let rendered = snapshot.format_for_prompt();
        assert!(rendered.contains("Paper"));
        assert!(rendered.contains("CITES"));
        assert!(rendered.contains("title, doi"));
    }

    #[test]
    fn batch_result_without_aborting_error_is_complete() {
        let result: BatchResult<GraphEntityId> = BatchResult::default();
        assert!(result.is_complete());
    }

    #[test]
    fn schema_snapshot_json_dump_round_trips_through_serde_json() {
        let mut properties_by_label = HashMap::new();
        properties_by_label.insert("Paper".to_string(), vec!["title".to_string(), "doi".to_string()]);
        let snapshot = SchemaSnapshot {
            entity_labels: vec!["Paper".to_string()],
            relationship_types: vec!["CITES".to_string()],
            properties_by_label,
        };

        let json = snapshot.format_as_json();
        let parsed: SchemaSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
