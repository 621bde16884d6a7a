//! LRU/TTL cache in front of [`crate::path_finder::find_paths`]. Owns its
//! own lock; nothing outside this module ever reaches into the underlying
//! `TtlLruCache` directly.

use crate::path_finder::{PathQuery, PathResult};
use chrono::{DateTime, Utc};
use paperkg_core::{CacheStats, TtlLruCache};
use std::time::Duration;
use tokio::sync::Mutex;

pub const DEFAULT_MAX_SIZE: usize = 500;
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, PartialEq)]
pub struct CachedPathResult {
    pub result: PathResult,
    pub from_cache: bool,
    pub cached_at: DateTime<Utc>,
}

/// Derive the cache key for a query: a canonical string over
/// `(startType, startName|*, endType, endName|*, sortedRelationTypes,
/// maxHops)`. Two queries that would walk the same traversal always
/// produce the same key, regardless of relation-type ordering.
pub fn cache_key(query: &PathQuery) -> String {
    let mut relation_types: Vec<&'static str> = query
        .relation_types
        .as_ref()
        .map(|types| types.iter().map(|t| t.as_cypher_str()).collect())
        .unwrap_or_default();
    relation_types.sort_unstable();

    format!(
        "{:?}:{}|{:?}:{}|[{}]|{}",
        query.start.entity_type,
        query.start.name.as_deref().unwrap_or("*"),
        query.end.entity_type,
        query.end.name.as_deref().unwrap_or("*"),
        relation_types.join(","),
        query.max_hops,
    )
}

/// Whether a cache key was produced for a query touching `name` as either
/// endpoint's name.
fn key_mentions_entity(key: &str, name: &str) -> bool {
    key.contains(&format!(":{name}|")) || key.contains(&format!(":{name}|[")) || key.ends_with(&format!(":{name}"))
}

/// Whether a cache key was produced for a query whose start or end type
/// renders as `type_label` (e.g. `"AiModel"`).
fn key_mentions_type(key: &str, type_label: &str) -> bool {
    key.starts_with(&format!("{type_label}:")) || key.contains(&format!("|{type_label}:"))
}

pub struct PathCache {
    cache: Mutex<TtlLruCache<String, (PathResult, DateTime<Utc>)>>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_SIZE, DEFAULT_TTL)
    }

    pub fn with_capacity(max_size: usize, ttl: Duration) -> Self {
        Self { cache: Mutex::new(TtlLruCache::new(max_size, ttl)) }
    }

    pub async fn get(&self, query: &PathQuery) -> Option<CachedPathResult> {
        let key = cache_key(query);
        let mut cache = self.cache.lock().await;
        cache.get(&key).map(|(result, cached_at)| CachedPathResult { result: result.clone(), from_cache: true, cached_at: *cached_at })
    }

    pub async fn set(&self, query: &PathQuery, result: PathResult) {
        let key = cache_key(query);
        self.cache.lock().await.put(key, (result, Utc::now()));
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.lock().await.stats()
    }

    pub async fn hit_rate(&self) -> f64 {
        self.stats().await.hit_rate()
    }

    /// Clear every entry, or (with `pattern`) every key containing that
    /// substring.
    pub async fn invalidate(&self, pattern: Option<&str>) {
        let mut cache = self.cache.lock().await;
        match pattern {
            None => cache.invalidate_all(),
            Some(p) => cache.retain(|key| !key.contains(p)),
        }
    }

    /// Drop every cached path whose start or end name is `name`.
    pub async fn invalidate_by_entity(&self, name: &str) {
        self.cache.lock().await.retain(|key| !key_mentions_entity(key, name));
    }

    /// Drop every cached path whose start or end type renders as
    /// `type_label` (the `{:?}` form of a [`paperkg_core::GraphEntityType`],
    /// e.g. `"AiModel"`).
    pub async fn invalidate_by_entity_type(&self, type_label: &str) {
        self.cache.lock().await.retain(|key| !key_mentions_type(key, type_label));
    }

    /// Populate the cache from `queries`, skipping any already cached and
    /// continuing past individual fetcher failures.
    pub async fn warm_up<F, Fut, E>(&self, queries: &[PathQuery], fetcher: F) -> usize
    where
        F: Fn(&PathQuery) -> Fut,
        Fut: std::future::Future<Output = Result<PathResult, E>>,
    {
        let mut warmed = 0;
        for query in queries {
            if self.get(query).await.is_some() {
                continue;
            }
            match fetcher(query).await {
                Ok(result) => {
                    self.set(query, result).await;
                    warmed += 1;
                }
                Err(_) => continue,
            }
        }
        warmed
    }
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_finder::EntityRef;
    use paperkg_core::{GraphEntityType, Path};

    fn query(start_name: &str, end_name: &str) -> PathQuery {
        PathQuery::new(
            EntityRef::named(GraphEntityType::AiModel, start_name),
            EntityRef::named(GraphEntityType::Concept, end_name),
            3,
        )
    }

    fn empty_result() -> PathResult {
        PathResult { paths: Vec::new(), statistics: Default::default() }
    }

    #[tokio::test]
    async fn miss_then_set_then_hit() {
        let cache = PathCache::new();
        let q = query("ModelA", "ConceptC");
        assert!(cache.get(&q).await.is_none());
        cache.set(&q, empty_result()).await;
        let hit = cache.get(&q).await.unwrap();
        assert!(hit.from_cache);
    }

    #[tokio::test]
    async fn distinct_queries_produce_distinct_keys() {
        assert_ne!(cache_key(&query("ModelA", "ConceptC")), cache_key(&query("ModelB", "ConceptC")));
    }

    #[tokio::test]
    async fn ttl_expiry_produces_a_miss() {
        let cache = PathCache::with_capacity(10, Duration::from_millis(10));
        let q = query("ModelA", "ConceptC");
        cache.set(&q, empty_result()).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get(&q).await.is_none());
    }

    #[tokio::test]
    async fn invalidate_by_entity_clears_only_matching_keys() {
        let cache = PathCache::new();
        let matching = query("ModelA", "ConceptC");
        let other = query("ModelB", "ConceptC");
        cache.set(&matching, empty_result()).await;
        cache.set(&other, empty_result()).await;

        cache.invalidate_by_entity("ModelA").await;

        assert!(cache.get(&matching).await.is_none());
        assert!(cache.get(&other).await.is_some());
    }

    #[tokio::test]
    async fn warm_up_skips_already_cached_and_tolerates_fetch_errors() {
        let cache = PathCache::new();
        let cached = query("ModelA", "ConceptC");
        cache.set(&cached, empty_result()).await;
        let failing = query("ModelFails", "ConceptC");
        let fresh = query("ModelFresh", "ConceptC");

        let queries = vec![cached.clone(), failing.clone(), fresh.clone()];
        let warmed = cache
            .warm_up(&queries, |q| {
                let name = q.start.name.clone().unwrap_or_default();
                async move {
                    if name == "ModelFails" {
                        Err::<PathResult, String>("boom".to_string())
                    } else {
                        Ok(PathResult { paths: Vec::new(), statistics: Default::default() })
                    }
                }
            })
            .await;

        assert_eq!(warmed, 1);
        assert!(cache.get(&fresh).await.is_some());
        assert!(cache.get(&failing).await.is_none());
    }

    #[test]
    fn hops_helper_sanity() {
        // Sanity check that the statistics helper type used in this
        // module's fixtures actually reflects hop count, since the cache
        // itself is opaque to path contents.
        let empty = Path { nodes: vec![], relations: vec![], score: None, total_weight: None };
        assert_eq!(empty.hops(), 0);
    }
}
