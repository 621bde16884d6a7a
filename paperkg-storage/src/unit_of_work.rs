//! Batches graph writes and flushes them in a fixed order: entity creates,
//! then relation creates, then updates, then deletes. Relations can only
//! reference entities that already exist, and deletes must never race
//! ahead of the writes that depend on what they remove.

use crate::graph_store::GraphError;
use crate::GraphStore;
use paperkg_core::{GraphEntity, GraphEntityId, GraphRelation};

#[derive(Debug, Default)]
pub struct UnitOfWork {
    entity_creates: Vec<GraphEntity>,
    relation_creates: Vec<GraphRelation>,
    entity_updates: Vec<GraphEntity>,
    entity_deletes: Vec<GraphEntityId>,
}

/// How far a [`UnitOfWork::commit`] got before either finishing or hitting
/// an error; lets a caller tell a partial commit apart from a clean one.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UnitOfWorkReport {
    pub entities_created: usize,
    pub relations_created: usize,
    pub entities_updated: usize,
    pub entities_deleted: usize,
}

/// One pending mutation, as returned by [`UnitOfWork::get_pending_operations`].
/// Mirrors the `{id, type, query, params}` shape spec.md describes, expressed
/// as a closed enum over this store's concrete mutation kinds rather than an
/// opaque query string, since `UnitOfWork` never constructs Cypher itself.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOperation {
    CreateEntity(GraphEntity),
    CreateRelation(GraphRelation),
    UpdateEntity(GraphEntity),
    DeleteEntity(GraphEntityId),
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_entity(&mut self, entity: GraphEntity) -> &mut Self {
        self.entity_creates.push(entity);
        self
    }

    pub fn create_relation(&mut self, relation: GraphRelation) -> &mut Self {
        self.relation_creates.push(relation);
        self
    }

    pub fn update_entity(&mut self, entity: GraphEntity) -> &mut Self {
        self.entity_updates.push(entity);
        self
    }

    pub fn delete_entity(&mut self, id: GraphEntityId) -> &mut Self {
        self.entity_deletes.push(id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entity_creates.is_empty()
            && self.relation_creates.is_empty()
            && self.entity_updates.is_empty()
            && self.entity_deletes.is_empty()
    }

    /// Whether any operation is still pending (`!is_empty()`).
    pub fn has_pending_operations(&self) -> bool {
        !self.is_empty()
    }

    /// Total number of pending operations across every stage.
    pub fn get_pending_count(&self) -> usize {
        self.entity_creates.len() + self.relation_creates.len() + self.entity_updates.len() + self.entity_deletes.len()
    }

    /// A defensive copy of every pending operation, in the same
    /// create-entities, create-relations, update, delete order `commit()`
    /// executes them in.
    pub fn get_pending_operations(&self) -> Vec<PendingOperation> {
        let mut ops = Vec::with_capacity(self.get_pending_count());
        ops.extend(self.entity_creates.iter().cloned().map(PendingOperation::CreateEntity));
        ops.extend(self.relation_creates.iter().cloned().map(PendingOperation::CreateRelation));
        ops.extend(self.entity_updates.iter().cloned().map(PendingOperation::UpdateEntity));
        ops.extend(self.entity_deletes.iter().cloned().map(PendingOperation::DeleteEntity));
        ops
    }

    /// Discard every pending operation without executing any of it.
    pub fn rollback(&mut self) {
        self.entity_creates.clear();
        self.relation_creates.clear();
        self.entity_updates.clear();
        self.entity_deletes.clear();
    }

    /// Flush creates, then relation creates, then updates, then deletes,
    /// against `store`, stopping at the first stage that fails.
    pub async fn commit(self, store: &dyn GraphStore) -> Result<UnitOfWorkReport, GraphError> {
        let mut report = UnitOfWorkReport::default();

        for entity in &self.entity_creates {
            store.merge_entity(entity).await?;
            report.entities_created += 1;
        }
        for relation in &self.relation_creates {
            store.merge_relation(relation).await?;
            report.relations_created += 1;
        }
        for entity in &self.entity_updates {
            store.merge_entity(entity).await?;
            report.entities_updated += 1;
        }
        for id in &self.entity_deletes {
            store.delete_entity(id).await?;
            report.entities_deleted += 1;
        }

        Ok(report)
    }
}
