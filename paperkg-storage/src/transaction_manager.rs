//! Read/write/batch transaction scopes over a [`GraphStore`], with the
//! retry helper applied uniformly so callers don't each re-implement
//! backoff around a flaky store.
//!
//! A caller of [`TransactionManager::read`] or [`TransactionManager::write`]
//! hands over a closure that receives the store and returns a future; the
//! manager re-runs that closure under [`execute_with_retry`] rather than
//! handing out a session object the caller would have to remember to
//! release — every exit path already releases because there is nothing to
//! hold open.

use crate::graph_store::GraphError;
use crate::retry::{execute_with_retry, RetryPolicy};
use crate::unit_of_work::UnitOfWork;
use crate::GraphStore;
use futures_util::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// One pending mutation in a [`TransactionManager::batch`] call.
///
/// `execute` receives the store and performs whatever writes this item
/// needs; items are sorted by descending `priority` before the batch runs,
/// and ties keep registration order (a stable sort).
pub struct BatchItem {
    pub id: String,
    pub priority: i32,
    execute: Box<dyn Fn(&dyn GraphStore) -> BoxFuture<'_, Result<(), GraphError>> + Send + Sync>,
}

impl BatchItem {
    pub fn new<F>(id: impl Into<String>, priority: i32, execute: F) -> Self
    where
        F: for<'a> Fn(&'a dyn GraphStore) -> BoxFuture<'a, Result<(), GraphError>> + Send + Sync + 'static,
    {
        Self { id: id.into(), priority, execute: Box::new(execute) }
    }
}

/// Outcome of a [`TransactionManager::batch`] call: the ids that committed
/// before a failure (or all of them, if none failed), the id/error pairs
/// that didn't, and the wall-clock duration of the whole call.
///
/// `aborting_error` mirrors `graph_store::BatchResult::aborting_error`: it
/// is `None` when every item succeeded, and otherwise holds the error that
/// stopped the batch, so a caller can distinguish "everything attempted,
/// nothing failed" from "we stopped partway through" without parsing
/// `failed`'s string payload.
#[derive(Debug, Default)]
pub struct BatchExecResult {
    pub successful: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub aborting_error: Option<GraphError>,
    pub duration_ms: u64,
}

impl BatchExecResult {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct TransactionManager {
    store: Arc<dyn GraphStore>,
    retry_policy: RetryPolicy,
}

impl TransactionManager {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store, retry_policy: RetryPolicy::default() }
    }

    pub fn with_retry_policy(store: Arc<dyn GraphStore>, retry_policy: RetryPolicy) -> Self {
        Self { store, retry_policy }
    }

    /// Run `work` against a read-oriented scope, retrying transient store
    /// failures per the configured [`RetryPolicy`].
    pub async fn read<T, F, Fut>(&self, work: F) -> Result<T, GraphError>
    where
        F: Fn(&dyn GraphStore) -> Fut,
        Fut: Future<Output = Result<T, GraphError>>,
    {
        let store = self.store.as_ref();
        execute_with_retry(&self.retry_policy, || work(store)).await
    }

    /// As [`Self::read`], for a write-oriented scope. The store trait
    /// doesn't distinguish read/write sessions structurally (every method
    /// already commits or rolls back its own statement), so the only
    /// behavioral difference today is intent at the call site; a real
    /// Bolt-backed implementation would route this through
    /// `getWriteSession()` instead of `getReadSession()`.
    pub async fn write<T, F, Fut>(&self, work: F) -> Result<T, GraphError>
    where
        F: Fn(&dyn GraphStore) -> Fut,
        Fut: Future<Output = Result<T, GraphError>>,
    {
        let store = self.store.as_ref();
        execute_with_retry(&self.retry_policy, || work(store)).await
    }

    /// Execute `items` in descending-priority order inside one logical
    /// batch. The first failure aborts the remainder; both the successful
    /// ids up to that point and the failed `{id, error}` pair are returned,
    /// so a caller can tell "everything committed" apart from "we stopped
    /// partway through" without the batch raising.
    pub async fn batch(&self, mut items: Vec<BatchItem>) -> BatchExecResult {
        let start = std::time::Instant::now();
        items.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut result = BatchExecResult::default();
        for item in items {
            match (item.execute)(self.store.as_ref()).await {
                Ok(()) => result.successful.push(item.id),
                Err(err) => {
                    result.failed.push((item.id, err.to_string()));
                    result.aborting_error = Some(err);
                    break;
                }
            }
        }
        result.duration_ms = start.elapsed().as_millis() as u64;
        result
    }

    /// A fresh [`UnitOfWork`] ready to accumulate pending mutations for a
    /// later `commit(store)` against this manager's store.
    pub fn create_unit_of_work(&self) -> UnitOfWork {
        UnitOfWork::new()
    }

    /// The store this manager wraps, for handing to a [`UnitOfWork::commit`].
    pub fn store(&self) -> &dyn GraphStore {
        self.store.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryGraphStore;
    use paperkg_core::{GraphEntity, GraphEntityId, GraphEntityType};
    use std::collections::HashMap;

    fn entity(id: &str) -> GraphEntity {
        GraphEntity { id: GraphEntityId::new(id), entity_type: GraphEntityType::Entity, name: id.to_string(), properties: HashMap::new() }
    }

    #[tokio::test]
    async fn read_and_write_pass_the_store_through() {
        let manager = TransactionManager::new(Arc::new(InMemoryGraphStore::new()));
        manager.write(|store| async move { store.merge_entity(&entity("a")).await }).await.unwrap();
        let found = manager.read(|store| async move { store.get_entity(&GraphEntityId::new("a")).await }).await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn batch_runs_in_descending_priority_order() {
        let manager = TransactionManager::new(Arc::new(InMemoryGraphStore::new()));
        let order = Arc::new(tokio::sync::Mutex::new(Vec::<String>::new()));

        let make_item = |id: &'static str, priority: i32, order: Arc<tokio::sync::Mutex<Vec<String>>>| {
            BatchItem::new(id, priority, move |store: &dyn GraphStore| {
                let order = order.clone();
                Box::pin(async move {
                    order.lock().await.push(id.to_string());
                    store.merge_entity(&entity(id)).await
                })
            })
        };

        let items = vec![
            make_item("low", 1, order.clone()),
            make_item("high", 10, order.clone()),
            make_item("mid", 5, order.clone()),
        ];

        let result = manager.batch(items).await;
        assert!(result.is_complete());
        assert_eq!(result.successful, vec!["high", "mid", "low"]);
        assert_eq!(*order.lock().await, vec!["high", "mid", "low"]);
    }

    #[tokio::test]
    async fn batch_stops_at_first_failure_but_keeps_prior_successes() {
        let manager = TransactionManager::new(Arc::new(InMemoryGraphStore::new()));
        let items = vec![
            BatchItem::new("ok", 10, |store: &dyn GraphStore| Box::pin(async move { store.merge_entity(&entity("ok")).await })),
            BatchItem::new("bad", 5, |_store: &dyn GraphStore| {
                Box::pin(async move { Err(GraphError::NotFound("missing".into())) })
            }),
            BatchItem::new("never-runs", 1, |store: &dyn GraphStore| Box::pin(async move { store.merge_entity(&entity("never-runs")).await })),
        ];

        let result = manager.batch(items).await;
        assert_eq!(result.successful, vec!["ok"]);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].0, "bad");
        assert!(matches!(result.aborting_error, Some(GraphError::NotFound(_))));
    }

    #[tokio::test]
    async fn batch_with_no_failures_has_no_aborting_error() {
        let manager = TransactionManager::new(Arc::new(InMemoryGraphStore::new()));
        let items = vec![BatchItem::new("ok", 1, |store: &dyn GraphStore| {
            Box::pin(async move { store.merge_entity(&entity("ok")).await })
        })];

        let result = manager.batch(items).await;
        assert!(result.is_complete());
        assert!(result.aborting_error.is_none());
    }

    #[tokio::test]
    async fn create_unit_of_work_commits_against_the_managers_own_store() {
        let manager = TransactionManager::new(Arc::new(InMemoryGraphStore::new()));
        let mut uow = manager.create_unit_of_work();
        uow.create_entity(entity("a"));
        assert!(uow.has_pending_operations());

        let report = uow.commit(manager.store()).await.unwrap();
        assert_eq!(report.entities_created, 1);

        let found = manager.read(|store| async move { store.get_entity(&GraphEntityId::new("a")).await }).await.unwrap();
        assert!(found.is_some());
    }
}
