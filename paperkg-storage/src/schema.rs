//! Caches the graph's schema snapshot so schema-aware callers (chiefly
//! Cypher generation) don't round-trip to the store on every prompt.

use crate::graph_store::{GraphError, SchemaSnapshot};
use crate::GraphStore;
use paperkg_core::TtlLruCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const CACHE_KEY: u8 = 0;
const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Wraps a [`GraphStore`] and keeps its [`SchemaSnapshot`] warm for up to
/// five minutes at a time, refreshing lazily on the next call after it
/// expires.
pub struct SchemaProvider {
    store: Arc<dyn GraphStore>,
    cache: Mutex<TtlLruCache<u8, SchemaSnapshot>>,
}

impl SchemaProvider {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self::with_ttl(store, DEFAULT_TTL)
    }

    pub fn with_ttl(store: Arc<dyn GraphStore>, ttl: Duration) -> Self {
        Self { store, cache: Mutex::new(TtlLruCache::new(1, ttl)) }
    }

    /// Return the cached snapshot, refreshing it from the store first if
    /// absent or stale.
    pub async fn schema(&self) -> Result<SchemaSnapshot, GraphError> {
        {
            let mut cache = self.cache.lock().await;
            if let Some(snapshot) = cache.get(&CACHE_KEY) {
                return Ok(snapshot.clone());
            }
        }
        let snapshot = self.store.schema_snapshot().await?;
        self.cache.lock().await.put(CACHE_KEY, snapshot.clone());
        Ok(snapshot)
    }

    /// Formats the current schema for embedding in an LLM prompt.
    pub async fn format_for_prompt(&self) -> Result<String, GraphError> {
        Ok(self.schema().await?.format_for_prompt())
    }

    /// Formats the current schema as a JSON dump, for callers that inject
    /// the schema into a prompt as structured data.
    pub async fn format_as_json(&self) -> Result<String, GraphError> {
        Ok(self.schema().await?.format_as_json())
    }

    /// Force the next [`Self::schema`] call to refetch from the store.
    pub async fn invalidate(&self) {
        self.cache.lock().await.invalidate(&CACHE_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryGraphStore;
    use async_trait::async_trait;
    use paperkg_core::PropertyMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Wraps an in-memory store to count `schema_snapshot` calls, so tests
    /// can assert on cache behavior without a real database.
    struct CountingStore {
        inner: InMemoryGraphStore,
        calls: AtomicU32,
    }

    #[async_trait]
    impl GraphStore for CountingStore {
        async fn run(
            &self,
            cypher: &str,
            params: PropertyMap,
        ) -> Result<crate::graph_store::QueryResult, GraphError> {
            self.inner.run(cypher, params).await
        }

        async fn run_write(
            &self,
            cypher: &str,
            params: PropertyMap,
        ) -> Result<crate::graph_store::QueryResult, GraphError> {
            self.inner.run_write(cypher, params).await
        }

        async fn merge_entity(&self, entity: &paperkg_core::GraphEntity) -> Result<(), GraphError> {
            self.inner.merge_entity(entity).await
        }

        async fn merge_relation(&self, relation: &paperkg_core::GraphRelation) -> Result<(), GraphError> {
            self.inner.merge_relation(relation).await
        }

        async fn bulk_merge_entities(
            &self,
            entities: &[paperkg_core::GraphEntity],
        ) -> Result<crate::graph_store::BatchResult<paperkg_core::GraphEntityId>, GraphError> {
            self.inner.bulk_merge_entities(entities).await
        }

        async fn bulk_merge_relations(
            &self,
            relations: &[paperkg_core::GraphRelation],
        ) -> Result<crate::graph_store::BatchResult<paperkg_core::GraphRelationId>, GraphError> {
            self.inner.bulk_merge_relations(relations).await
        }

        async fn get_entity(
            &self,
            id: &paperkg_core::GraphEntityId,
        ) -> Result<Option<paperkg_core::GraphEntity>, GraphError> {
            self.inner.get_entity(id).await
        }

        async fn find_entities(
            &self,
            entity_type: paperkg_core::GraphEntityType,
            name: Option<&str>,
        ) -> Result<Vec<paperkg_core::GraphEntity>, GraphError> {
            self.inner.find_entities(entity_type, name).await
        }

        async fn delete_entity(&self, id: &paperkg_core::GraphEntityId) -> Result<(), GraphError> {
            self.inner.delete_entity(id).await
        }

        async fn outgoing_relations(
            &self,
            id: &paperkg_core::GraphEntityId,
        ) -> Result<Vec<paperkg_core::GraphRelation>, GraphError> {
            self.inner.outgoing_relations(id).await
        }

        async fn schema_snapshot(&self) -> Result<SchemaSnapshot, GraphError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.schema_snapshot().await
        }
    }

    #[tokio::test]
    async fn repeated_calls_within_ttl_hit_the_cache_once() {
        let store = Arc::new(CountingStore { inner: InMemoryGraphStore::new(), calls: AtomicU32::new(0) });
        let provider = SchemaProvider::with_ttl(store.clone(), Duration::from_secs(60));

        provider.schema().await.unwrap();
        provider.schema().await.unwrap();
        provider.schema().await.unwrap();

        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_a_refetch() {
        let store = Arc::new(CountingStore { inner: InMemoryGraphStore::new(), calls: AtomicU32::new(0) });
        let provider = SchemaProvider::with_ttl(store.clone(), Duration::from_secs(60));

        provider.schema().await.unwrap();
        provider.invalidate().await;
        provider.schema().await.unwrap();

        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }
}
