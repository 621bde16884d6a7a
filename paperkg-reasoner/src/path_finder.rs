//! Bounded breadth-first path finding: unweighted (hop-ascending), weighted
//! (total-weight-descending), and batched concurrent execution over
//! `(source, target)` pairs.

use crate::error::ReasonerError;
use paperkg_core::{GraphEntityType, GraphRelation, GraphRelationType, Path};
use paperkg_storage::GraphStore;
use std::collections::HashMap;
use std::sync::Arc;

/// Raw candidate paths are capped well above the 100 returned, so a dense
/// graph's combinatorial fan-out can't run away before the cycle filter
/// and final truncation get a chance to run.
const RAW_PATH_SAFETY_CAP: usize = 2_000;
/// Paths returned to a caller, after filtering and sorting.
pub const MAX_RESULT_PATHS: usize = 100;
/// Used when a relation carries neither an explicit weight nor a
/// `properties.confidence` entry.
pub const DEFAULT_RELATION_WEIGHT: f64 = 0.5;
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub entity_type: GraphEntityType,
    pub name: Option<String>,
}

impl EntityRef {
    pub fn new(entity_type: GraphEntityType, name: Option<impl Into<String>>) -> Self {
        Self { entity_type, name: name.map(Into::into) }
    }

    pub fn any(entity_type: GraphEntityType) -> Self {
        Self { entity_type, name: None }
    }

    pub fn named(entity_type: GraphEntityType, name: impl Into<String>) -> Self {
        Self { entity_type, name: Some(name.into()) }
    }
}

#[derive(Debug, Clone)]
pub struct PathQuery {
    pub start: EntityRef,
    pub end: EntityRef,
    pub max_hops: usize,
    pub relation_types: Option<Vec<GraphRelationType>>,
    pub exclude_relations: Option<Vec<GraphRelationType>>,
}

impl PathQuery {
    pub fn new(start: EntityRef, end: EntityRef, max_hops: usize) -> Self {
        Self { start, end, max_hops, relation_types: None, exclude_relations: None }
    }

    pub fn with_relation_types(mut self, types: Vec<GraphRelationType>) -> Self {
        self.relation_types = Some(types);
        self
    }

    pub fn with_exclude_relations(mut self, types: Vec<GraphRelationType>) -> Self {
        self.exclude_relations = Some(types);
        self
    }

    fn relation_allowed(&self, relation_type: GraphRelationType) -> bool {
        if let Some(allow) = &self.relation_types {
            if !allow.contains(&relation_type) {
                return false;
            }
        }
        if let Some(deny) = &self.exclude_relations {
            if deny.contains(&relation_type) {
                return false;
            }
        }
        true
    }

    fn matches_end(&self, entity: &paperkg_core::GraphEntity) -> bool {
        entity.entity_type == self.end.entity_type
            && self.end.name.as_deref().map(|n| n == entity.name).unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathStatistics {
    pub total: usize,
    pub min_hops: usize,
    pub max_hops: usize,
    pub avg_hops: f64,
    pub paths_by_hops: HashMap<usize, usize>,
}

impl PathStatistics {
    fn compute(paths: &[Path]) -> Self {
        if paths.is_empty() {
            return Self::default();
        }
        let mut paths_by_hops: HashMap<usize, usize> = HashMap::new();
        let mut min_hops = usize::MAX;
        let mut max_hops = 0;
        let mut sum = 0usize;
        for path in paths {
            let hops = path.hops();
            *paths_by_hops.entry(hops).or_insert(0) += 1;
            min_hops = min_hops.min(hops);
            max_hops = max_hops.max(hops);
            sum += hops;
        }
        Self { total: paths.len(), min_hops, max_hops, avg_hops: sum as f64 / paths.len() as f64, paths_by_hops }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathResult {
    pub paths: Vec<Path>,
    pub statistics: PathStatistics,
}

/// Expand every start entity up to `query.max_hops`, recording every
/// encounter of an end-matching entity (cycles included — the post-filter
/// below removes those). `relation_allowed`/`matches_end` are applied
/// during expansion so disallowed relation types never get walked at all.
async fn collect_raw_paths(store: &dyn GraphStore, query: &PathQuery) -> Result<Vec<Path>, ReasonerError> {
    let starts = store.find_entities(query.start.entity_type, query.start.name.as_deref()).await?;
    let mut raw = Vec::new();

    for start in starts {
        let mut frontier = vec![Path { nodes: vec![start.clone()], relations: Vec::new(), score: None, total_weight: None }];
        for _hop in 0..query.max_hops {
            if frontier.is_empty() {
                break;
            }
            let mut next_frontier = Vec::new();
            for path in frontier {
                let current = path.nodes.last().expect("path always has a head node");
                let relations = store.outgoing_relations(&current.id).await?;
                for relation in relations {
                    if !query.relation_allowed(relation.relation_type) {
                        continue;
                    }
                    let Some(target) = store.get_entity(&relation.target_id).await? else {
                        continue;
                    };
                    let mut nodes = path.nodes.clone();
                    nodes.push(target.clone());
                    let mut relations_so_far = path.relations.clone();
                    relations_so_far.push(relation);
                    let extended = Path { nodes, relations: relations_so_far, score: None, total_weight: None };

                    if query.matches_end(&target) {
                        raw.push(extended.clone());
                    }
                    next_frontier.push(extended);

                    if raw.len() >= RAW_PATH_SAFETY_CAP {
                        tracing::warn!(cap = RAW_PATH_SAFETY_CAP, "path expansion hit the raw-path safety cap, truncating early");
                        return Ok(raw);
                    }
                }
            }
            frontier = next_frontier;
        }
    }

    Ok(raw)
}

/// Unweighted path finding: every acyclic path up to `max_hops`, sorted by
/// hop count ascending and capped at [`MAX_RESULT_PATHS`].
pub async fn find_paths(store: &dyn GraphStore, query: &PathQuery) -> Result<PathResult, ReasonerError> {
    let mut paths: Vec<Path> = collect_raw_paths(store, query).await?.into_iter().filter(Path::is_acyclic).collect();
    paths.sort_by_key(Path::hops);
    paths.truncate(MAX_RESULT_PATHS);
    let statistics = PathStatistics::compute(&paths);
    Ok(PathResult { paths, statistics })
}

/// A relation's weight for [`find_weighted_paths`]; `None` falls back to
/// `properties.confidence` (default [`DEFAULT_RELATION_WEIGHT`] when
/// absent).
pub type WeightFn<'a> = dyn Fn(&GraphRelation) -> f64 + Send + Sync + 'a;

fn relation_weight(relation: &GraphRelation, weight_fn: Option<&WeightFn<'_>>) -> f64 {
    if let Some(f) = weight_fn {
        return f(relation);
    }
    relation.properties.get("confidence").and_then(|v| v.as_f64()).unwrap_or(DEFAULT_RELATION_WEIGHT)
}

/// Weighted path finding: same expansion as [`find_paths`], but each path
/// carries a `total_weight` (sum of per-relation weights) and results are
/// sorted by that total descending.
pub async fn find_weighted_paths(
    store: &dyn GraphStore,
    query: &PathQuery,
    weight_fn: Option<&WeightFn<'_>>,
) -> Result<PathResult, ReasonerError> {
    let mut paths: Vec<Path> = collect_raw_paths(store, query)
        .await?
        .into_iter()
        .filter(Path::is_acyclic)
        .map(|mut path| {
            let total: f64 = path.relations.iter().map(|r| relation_weight(r, weight_fn)).sum();
            path.total_weight = Some(total);
            path.score = Some(total);
            path
        })
        .collect();
    paths.sort_by(|a, b| {
        b.total_weight.unwrap_or(0.0).partial_cmp(&a.total_weight.unwrap_or(0.0)).unwrap_or(std::cmp::Ordering::Equal)
    });
    paths.truncate(MAX_RESULT_PATHS);
    let statistics = PathStatistics::compute(&paths);
    Ok(PathResult { paths, statistics })
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPair {
    pub source: EntityRef,
    pub target: EntityRef,
}

#[derive(Debug, Clone)]
pub struct BatchPathFailure {
    pub source: EntityRef,
    pub target: EntityRef,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchPathResult {
    pub successful: Vec<(PathPair, PathResult)>,
    pub failed: Vec<BatchPathFailure>,
}

/// Run `pairs` through [`find_paths`] in chunks of `max_concurrency`,
/// executing each pair in a chunk concurrently. A failing pair is recorded
/// in `failed` rather than aborting the rest of the batch.
pub async fn batch_find_paths(
    store: Arc<dyn GraphStore>,
    pairs: Vec<PathPair>,
    max_hops: usize,
    max_concurrency: usize,
) -> BatchPathResult {
    let chunk_size = max_concurrency.max(1);
    let mut result = BatchPathResult::default();

    for chunk in pairs.chunks(chunk_size) {
        let futures = chunk.iter().cloned().map(|pair| {
            let store = store.clone();
            async move {
                let query = PathQuery::new(pair.source.clone(), pair.target.clone(), max_hops);
                let outcome = find_paths(store.as_ref(), &query).await;
                (pair, outcome)
            }
        });
        for (pair, outcome) in futures_util::future::join_all(futures).await {
            match outcome {
                Ok(path_result) => result.successful.push((pair, path_result)),
                Err(err) => result.failed.push(BatchPathFailure { source: pair.source, target: pair.target, error: err.to_string() }),
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperkg_core::{GraphEntityId, GraphEntityType, GraphRelationId, GraphRelationType, PropertyValue};
    use paperkg_storage::InMemoryGraphStore;
    use paperkg_test_utils::graph_entity;

    fn relation(id: &str, ty: GraphRelationType, source: &str, target: &str, weight: Option<f64>) -> GraphRelation {
        GraphRelation {
            id: GraphRelationId::new(id),
            relation_type: ty,
            source_id: GraphEntityId::new(source),
            target_id: GraphEntityId::new(target),
            weight,
            properties: std::collections::HashMap::new(),
        }
    }

    async fn linear_chain() -> InMemoryGraphStore {
        let store = InMemoryGraphStore::new();
        store.merge_entity(&graph_entity("a", GraphEntityType::AiModel, "ModelA")).await.unwrap();
        store.merge_entity(&graph_entity("b", GraphEntityType::Technique, "TechB")).await.unwrap();
        store.merge_entity(&graph_entity("c", GraphEntityType::Concept, "ConceptC")).await.unwrap();
        store.merge_relation(&relation("r1", GraphRelationType::Uses, "a", "b", Some(1.0))).await.unwrap();
        store.merge_relation(&relation("r2", GraphRelationType::DerivedFrom, "b", "c", Some(1.0))).await.unwrap();
        store
    }

    #[tokio::test]
    async fn finds_a_two_hop_path_between_named_endpoints() {
        let store = linear_chain().await;
        let query = PathQuery::new(
            EntityRef::named(GraphEntityType::AiModel, "ModelA"),
            EntityRef::named(GraphEntityType::Concept, "ConceptC"),
            3,
        );
        let result = find_paths(&store, &query).await.unwrap();
        assert_eq!(result.paths.len(), 1);
        assert_eq!(result.paths[0].hops(), 2);
        assert_eq!(result.statistics.total, 1);
        assert_eq!(result.statistics.min_hops, 2);
        assert_eq!(result.statistics.max_hops, 2);
    }

    #[tokio::test]
    async fn exceeding_max_hops_finds_nothing() {
        let store = linear_chain().await;
        let query = PathQuery::new(
            EntityRef::named(GraphEntityType::AiModel, "ModelA"),
            EntityRef::named(GraphEntityType::Concept, "ConceptC"),
            1,
        );
        let result = find_paths(&store, &query).await.unwrap();
        assert!(result.paths.is_empty());
        assert_eq!(result.statistics.total, 0);
    }

    #[tokio::test]
    async fn cyclic_candidate_is_rejected_leaving_the_acyclic_one() {
        let store = InMemoryGraphStore::new();
        store.merge_entity(&graph_entity("1", GraphEntityType::Entity, "One")).await.unwrap();
        store.merge_entity(&graph_entity("2", GraphEntityType::Entity, "Two")).await.unwrap();
        store.merge_entity(&graph_entity("3", GraphEntityType::Entity, "Three")).await.unwrap();
        store.merge_relation(&relation("r1", GraphRelationType::Cites, "1", "2", None)).await.unwrap();
        // Back-edge: forms the cyclic candidate [1, 2, 1].
        store.merge_relation(&relation("r2", GraphRelationType::Cites, "2", "1", None)).await.unwrap();
        store.merge_relation(&relation("r3", GraphRelationType::Cites, "2", "3", None)).await.unwrap();

        let query = PathQuery::new(EntityRef::any(GraphEntityType::Entity), EntityRef::any(GraphEntityType::Entity), 3);
        let result = find_paths(&store, &query).await.unwrap();

        assert_eq!(result.statistics.total, 1);
        assert_eq!(result.statistics.min_hops, 2);
        assert_eq!(result.statistics.max_hops, 2);
        assert_eq!(result.statistics.avg_hops, 2.0);
        assert!(result.paths.iter().all(Path::is_acyclic));
    }

    #[tokio::test]
    async fn weighted_paths_sort_by_total_weight_descending() {
        let store = InMemoryGraphStore::new();
        store.merge_entity(&graph_entity("a", GraphEntityType::Entity, "A")).await.unwrap();
        store.merge_entity(&graph_entity("b", GraphEntityType::Entity, "B")).await.unwrap();
        store.merge_entity(&graph_entity("c", GraphEntityType::Entity, "C")).await.unwrap();

        let mut high_conf = std::collections::HashMap::new();
        high_conf.insert("confidence".to_string(), PropertyValue::Number(0.9));
        store
            .merge_relation(&GraphRelation {
                id: GraphRelationId::new("strong"),
                relation_type: GraphRelationType::Cites,
                source_id: GraphEntityId::new("a"),
                target_id: GraphEntityId::new("b"),
                weight: None,
                properties: high_conf,
            })
            .await
            .unwrap();
        store.merge_relation(&relation("weak", GraphRelationType::Cites, "a", "c", None)).await.unwrap();

        let query = PathQuery::new(EntityRef::named(GraphEntityType::Entity, "A"), EntityRef::any(GraphEntityType::Entity), 1);
        let result = find_weighted_paths(&store, &query, None).await.unwrap();

        assert_eq!(result.paths.len(), 2);
        assert_eq!(result.paths[0].nodes.last().unwrap().name, "B");
        assert!(result.paths[0].total_weight.unwrap() > result.paths[1].total_weight.unwrap());
        // "weak" has no properties.confidence, so it falls back to the default.
        assert_eq!(result.paths[1].total_weight, Some(DEFAULT_RELATION_WEIGHT));
    }

    #[tokio::test]
    async fn batch_find_paths_reports_per_pair_results_without_aborting() {
        let store = Arc::new(linear_chain().await);
        let pairs = vec![
            PathPair {
                source: EntityRef::named(GraphEntityType::AiModel, "ModelA"),
                target: EntityRef::named(GraphEntityType::Concept, "ConceptC"),
            },
            PathPair {
                source: EntityRef::named(GraphEntityType::AiModel, "NoSuchModel"),
                target: EntityRef::named(GraphEntityType::Concept, "ConceptC"),
            },
        ];
        let result = batch_find_paths(store, pairs, 3, DEFAULT_MAX_CONCURRENCY).await;
        assert_eq!(result.successful.len(), 2);
        assert!(result.failed.is_empty());
        let found_any = result.successful.iter().any(|(_, r)| !r.paths.is_empty());
        assert!(found_any);
    }
}
