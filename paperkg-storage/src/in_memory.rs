//! An in-process [`GraphStore`] backed by plain maps. Used by this
//! workspace's own tests and by downstream crates' tests in place of a
//! real graph database; `run`/`run_write` don't interpret Cypher, so
//! callers that need to exercise generated queries should implement
//! [`GraphStore`] against a fixture that does.

use crate::graph_store::{BatchResult, GraphError, QueryResult, SchemaSnapshot};
use crate::GraphStore;
use async_trait::async_trait;
use paperkg_core::{GraphEntity, GraphEntityId, GraphEntityType, GraphRelation, GraphRelationId, PropertyMap};
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct State {
    entities: HashMap<GraphEntityId, GraphEntity>,
    relations: HashMap<GraphRelationId, GraphRelation>,
}

pub struct InMemoryGraphStore {
    state: Mutex<State>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self { state: Mutex::new(State::default()) }
    }
}

impl Default for InMemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn run(&self, _cypher: &str, _params: PropertyMap) -> Result<QueryResult, GraphError> {
        Ok(QueryResult::default())
    }

    async fn run_write(&self, _cypher: &str, _params: PropertyMap) -> Result<QueryResult, GraphError> {
        Ok(QueryResult::default())
    }

    async fn merge_entity(&self, entity: &GraphEntity) -> Result<(), GraphError> {
        let mut state = self.state.lock().await;
        state.entities.insert(entity.id.clone(), entity.clone());
        Ok(())
    }

    async fn merge_relation(&self, relation: &GraphRelation) -> Result<(), GraphError> {
        let mut state = self.state.lock().await;
        if !state.entities.contains_key(&relation.source_id) {
            return Err(GraphError::NotFound(relation.source_id.as_str().to_string()));
        }
        if !state.entities.contains_key(&relation.target_id) {
            return Err(GraphError::NotFound(relation.target_id.as_str().to_string()));
        }
        state.relations.insert(relation.id.clone(), relation.clone());
        Ok(())
    }

    async fn bulk_merge_entities(
        &self,
        entities: &[GraphEntity],
    ) -> Result<BatchResult<GraphEntityId>, GraphError> {
        let mut result = BatchResult::default();
        for entity in entities {
            self.merge_entity(entity).await?;
            result.accepted.push(entity.id.clone());
        }
        Ok(result)
    }

    async fn bulk_merge_relations(
        &self,
        relations: &[GraphRelation],
    ) -> Result<BatchResult<GraphRelationId>, GraphError> {
        let mut result = BatchResult::default();
        for relation in relations {
            match self.merge_relation(relation).await {
                Ok(()) => result.accepted.push(relation.id.clone()),
                Err(err) => {
                    result.rejected.push((relation.id.clone(), err.to_string()));
                    result.aborting_error = Some(err);
                    break;
                }
            }
        }
        Ok(result)
    }

    async fn get_entity(&self, id: &GraphEntityId) -> Result<Option<GraphEntity>, GraphError> {
        Ok(self.state.lock().await.entities.get(id).cloned())
    }

    async fn find_entities(
        &self,
        entity_type: GraphEntityType,
        name: Option<&str>,
    ) -> Result<Vec<GraphEntity>, GraphError> {
        let state = self.state.lock().await;
        Ok(state
            .entities
            .values()
            .filter(|e| e.entity_type == entity_type)
            .filter(|e| name.map(|n| e.name == n).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn delete_entity(&self, id: &GraphEntityId) -> Result<(), GraphError> {
        let mut state = self.state.lock().await;
        state.entities.remove(id);
        state.relations.retain(|_, r| &r.source_id != id && &r.target_id != id);
        Ok(())
    }

    async fn outgoing_relations(&self, id: &GraphEntityId) -> Result<Vec<GraphRelation>, GraphError> {
        let state = self.state.lock().await;
        Ok(state.relations.values().filter(|r| &r.source_id == id).cloned().collect())
    }

    async fn schema_snapshot(&self) -> Result<SchemaSnapshot, GraphError> {
        let state = self.state.lock().await;
        let mut entity_labels: Vec<String> =
            state.entities.values().map(|e| format!("{:?}", e.entity_type)).collect();
        entity_labels.sort();
        entity_labels.dedup();

        let mut relationship_types: Vec<String> =
            state.relations.values().map(|r| r.relation_type.as_cypher_str().to_string()).collect();
        relationship_types.sort();
        relationship_types.dedup();

        let mut properties_by_label: HashMap<String, Vec<String>> = HashMap::new();
        for entity in state.entities.values() {
            let label = format!("{:?}", entity.entity_type);
            let props = properties_by_label.entry(label).or_default();
            for key in entity.properties.keys() {
                if !props.contains(key) {
                    props.push(key.clone());
                }
            }
        }

        Ok(SchemaSnapshot { entity_labels, relationship_types, properties_by_label })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperkg_core::{GraphEntityType, GraphRelationType};

    fn entity(id: &str) -> GraphEntity {
        GraphEntity {
            id: GraphEntityId::new(id),
            entity_type: GraphEntityType::Entity,
            name: id.to_string(),
            properties: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn merge_relation_requires_both_endpoints_to_exist() {
        let store = InMemoryGraphStore::new();
        store.merge_entity(&entity("a")).await.unwrap();
        let relation = GraphRelation {
            id: GraphRelationId::new("r1"),
            relation_type: GraphRelationType::Cites,
            source_id: GraphEntityId::new("a"),
            target_id: GraphEntityId::new("missing"),
            weight: None,
            properties: HashMap::new(),
        };
        let err = store.merge_relation(&relation).await.unwrap_err();
        assert!(matches!(err, GraphError::NotFound(_)));
    }

    #[tokio::test]
    async fn deleting_an_entity_removes_its_relations() {
        let store = InMemoryGraphStore::new();
        store.merge_entity(&entity("a")).await.unwrap();
        store.merge_entity(&entity("b")).await.unwrap();
        store
            .merge_relation(&GraphRelation {
                id: GraphRelationId::new("r1"),
                relation_type: GraphRelationType::Cites,
                source_id: GraphEntityId::new("a"),
                target_id: GraphEntityId::new("b"),
                weight: None,
                properties: HashMap::new(),
            })
            .await
            .unwrap();

        store.delete_entity(&GraphEntityId::new("a")).await.unwrap();
        assert!(store.outgoing_relations(&GraphEntityId::new("a")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_entities_filters_by_type_and_optional_name() {
        let store = InMemoryGraphStore::new();
        store.merge_entity(&entity("a")).await.unwrap();
        store
            .merge_entity(&GraphEntity {
                id: GraphEntityId::new("b"),
                entity_type: GraphEntityType::AiModel,
                name: "a".to_string(),
                properties: HashMap::new(),
            })
            .await
            .unwrap();

        let by_type = store.find_entities(GraphEntityType::Entity, None).await.unwrap();
        assert_eq!(by_type.len(), 1);
        assert_eq!(by_type[0].id, GraphEntityId::new("a"));

        let by_name = store.find_entities(GraphEntityType::AiModel, Some("a")).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, GraphEntityId::new("b"));

        let no_match = store.find_entities(GraphEntityType::AiModel, Some("nope")).await.unwrap();
        assert!(no_match.is_empty());
    }

    #[tokio::test]
    async fn bulk_merge_relations_stops_at_first_rejection_and_records_it() {
        let store = InMemoryGraphStore::new();
        store.merge_entity(&entity("a")).await.unwrap();
        store.merge_entity(&entity("b")).await.unwrap();
        let good = GraphRelation {
            id: GraphRelationId::new("r1"),
            relation_type: GraphRelationType::Cites,
            source_id: GraphEntityId::new("a"),
            target_id: GraphEntityId::new("b"),
            weight: None,
            properties: HashMap::new(),
        };
        let bad = GraphRelation {
            id: GraphRelationId::new("r2"),
            relation_type: GraphRelationType::Cites,
            source_id: GraphEntityId::new("a"),
            target_id: GraphEntityId::new("missing"),
            weight: None,
            properties: HashMap::new(),
        };
        let result = store.bulk_merge_relations(&[good, bad]).await.unwrap();
        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.rejected.len(), 1);
        assert!(result.aborting_error.is_some());
        assert!(!result.is_complete());
    }
}
