//! Persistent alias→canonical mapping with a bounded, TTL-evicting cache in
//! front of it. The cache and its backing writes are this module's alone;
//! nothing else touches the alias store directly.

use async_trait::async_trait;
use paperkg_core::{normalize_alias_key, Alias, TtlLruCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Backing persistence for alias records, kept separate from the cache so
/// any store (the graph store under its own label, a relational table, an
/// in-memory fixture) can serve as the source of truth.
#[async_trait]
pub trait AliasRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Alias>, String>;
    async fn upsert(&self, alias: &Alias) -> Result<(), String>;
    /// Batch upsert primitive backing [`AliasTableManager::register_aliases`].
    /// A default single-item loop is provided for implementations that have
    /// no bulk primitive of their own; stores that do should override it.
    async fn upsert_many(&self, aliases: &[Alias]) -> Result<(), String> {
        for alias in aliases {
            self.upsert(alias).await?;
        }
        Ok(())
    }
    async fn delete(&self, key: &str) -> Result<(), String>;
    /// Most-recently-updated aliases first, up to `limit`.
    async fn recent(&self, limit: usize) -> Result<Vec<Alias>, String>;
}

pub const DEFAULT_MAX_CACHE_SIZE: usize = 10_000;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Owns the alias cache exclusively: every read checks the cache first and
/// every write goes through this manager's lock, so the LRU eviction
/// decision and the insertion happen under the same critical section.
pub struct AliasTableManager {
    repository: Arc<dyn AliasRepository>,
    cache: Mutex<TtlLruCache<String, Alias>>,
    max_cache_size: usize,
}

impl AliasTableManager {
    pub fn new(repository: Arc<dyn AliasRepository>) -> Self {
        Self::with_capacity(repository, DEFAULT_MAX_CACHE_SIZE, DEFAULT_CACHE_TTL)
    }

    pub fn with_capacity(repository: Arc<dyn AliasRepository>, max_cache_size: usize, cache_ttl: Duration) -> Self {
        Self { repository, cache: Mutex::new(TtlLruCache::new(max_cache_size, cache_ttl)), max_cache_size }
    }

    /// Bulk-load up to the cache's capacity of the most recently touched
    /// aliases, warming the cache before the first lookup.
    pub async fn load_cache(&self) -> Result<usize, String> {
        let recent = self.repository.recent(self.max_cache_size).await?;
        let count = recent.len();
        let mut cache = self.cache.lock().await;
        for alias in recent {
            cache.put(alias.key(), alias);
        }
        Ok(count)
    }

    /// Resolve `input` to its canonical form, if an alias mapping exists.
    /// Case-insensitivity is structural: the lookup key is always the
    /// lowercased, trimmed form.
    pub async fn resolve_alias(&self, input: &str) -> Result<Option<Alias>, String> {
        let key = normalize_alias_key(input);
        {
            let mut cache = self.cache.lock().await;
            if let Some(alias) = cache.get(&key) {
                return Ok(Some(alias.clone()));
            }
        }
        let fetched = self.repository.get(&key).await?;
        if let Some(alias) = &fetched {
            self.cache.lock().await.put(key, alias.clone());
        }
        Ok(fetched)
    }

    /// Register (or refresh) an alias mapping. Refreshes `updated_at` on
    /// re-registration.
    pub async fn register_alias(&self, mut alias: Alias) -> Result<(), String> {
        alias.updated_at = chrono::Utc::now();
        let key = alias.key();
        self.repository.upsert(&alias).await?;
        self.cache.lock().await.put(key, alias);
        Ok(())
    }

    /// Register (or refresh) a batch of aliases in one call, via the
    /// repository's batch upsert primitive, then warm the cache with each.
    pub async fn register_aliases(&self, batch: Vec<Alias>) -> Result<usize, String> {
        if batch.is_empty() {
            return Ok(0);
        }
        let now = chrono::Utc::now();
        let batch: Vec<Alias> = batch
            .into_iter()
            .map(|mut alias| {
                alias.updated_at = now;
                alias
            })
            .collect();
        self.repository.upsert_many(&batch).await?;
        let count = batch.len();
        let mut cache = self.cache.lock().await;
        for alias in batch {
            cache.put(alias.key(), alias);
        }
        Ok(count)
    }

    pub async fn delete_alias(&self, input: &str) -> Result<(), String> {
        let key = normalize_alias_key(input);
        self.repository.delete(&key).await?;
        self.cache.lock().await.invalidate(&key);
        Ok(())
    }

    pub async fn cache_stats(&self) -> paperkg_core::CacheStats {
        self.cache.lock().await.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperkg_test_utils::alias;
    use paperkg_core::AliasSource;
    use std::sync::Mutex as StdMutex;
    use std::collections::HashMap;

    struct InMemoryAliasRepository {
        rows: StdMutex<HashMap<String, Alias>>,
        batch_upsert_calls: std::sync::atomic::AtomicU32,
    }

    impl InMemoryAliasRepository {
        fn new() -> Self {
            Self { rows: StdMutex::new(HashMap::new()), batch_upsert_calls: std::sync::atomic::AtomicU32::new(0) }
        }
    }

    #[async_trait]
    impl AliasRepository for InMemoryAliasRepository {
        async fn get(&self, key: &str) -> Result<Option<Alias>, String> {
            Ok(self.rows.lock().unwrap().get(key).cloned())
        }

        async fn upsert(&self, alias: &Alias) -> Result<(), String> {
            self.rows.lock().unwrap().insert(alias.key(), alias.clone());
            Ok(())
        }

        async fn upsert_many(&self, aliases: &[Alias]) -> Result<(), String> {
            self.batch_upsert_calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let mut rows = self.rows.lock().unwrap();
            for alias in aliases {
                rows.insert(alias.key(), alias.clone());
            }
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), String> {
            self.rows.lock().unwrap().remove(key);
            Ok(())
        }

        async fn recent(&self, limit: usize) -> Result<Vec<Alias>, String> {
            let mut rows: Vec<Alias> = self.rows.lock().unwrap().values().cloned().collect();
            rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            rows.truncate(limit);
            Ok(rows)
        }
    }

    #[tokio::test]
    async fn resolve_is_case_insensitive() {
        let repo = Arc::new(InMemoryAliasRepository::new());
        let manager = AliasTableManager::new(repo);
        manager.register_alias(alias("GPT-4o", "GPT4", AliasSource::Rule)).await.unwrap();

        let lower = manager.resolve_alias("gpt-4o").await.unwrap().unwrap();
        let upper = manager.resolve_alias("GPT-4O").await.unwrap().unwrap();
        assert_eq!(lower.canonical, "GPT4");
        assert_eq!(upper.canonical, "GPT4");
    }

    #[tokio::test]
    async fn second_lookup_hits_the_cache() {
        let repo = Arc::new(InMemoryAliasRepository::new());
        let manager = AliasTableManager::new(repo);
        manager.register_alias(alias("gpt4o", "GPT4", AliasSource::Rule)).await.unwrap();

        manager.resolve_alias("gpt4o").await.unwrap();
        manager.resolve_alias("gpt4o").await.unwrap();
        let stats = manager.cache_stats().await;
        assert!(stats.hits >= 1);
    }

    #[tokio::test]
    async fn register_aliases_uses_the_batch_upsert_primitive() {
        let repo = Arc::new(InMemoryAliasRepository::new());
        let manager = AliasTableManager::new(repo.clone());

        let batch = vec![
            alias("gpt4-turbo", "GPT4", AliasSource::Rule),
            alias("gpt-4", "GPT4", AliasSource::Rule),
            alias("bert-base", "BERT", AliasSource::Rule),
        ];
        let count = manager.register_aliases(batch).await.unwrap();

        assert_eq!(count, 3);
        assert_eq!(repo.batch_upsert_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(manager.resolve_alias("gpt-4").await.unwrap().unwrap().canonical, "GPT4");
        assert_eq!(manager.resolve_alias("bert-base").await.unwrap().unwrap().canonical, "BERT");
    }

    #[tokio::test]
    async fn delete_removes_from_cache_and_store() {
        let repo = Arc::new(InMemoryAliasRepository::new());
        let manager = AliasTableManager::new(repo);
        manager.register_alias(alias("gpt4o", "GPT4", AliasSource::Rule)).await.unwrap();
        manager.delete_alias("gpt4o").await.unwrap();
        assert!(manager.resolve_alias("gpt4o").await.unwrap().is_none());
    }
}
