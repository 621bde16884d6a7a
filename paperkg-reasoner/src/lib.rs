//! Multi-hop reasoning over the knowledge graph: bounded-depth path
//! finding between typed entities, cycle filtering, weighted ranking,
//! batched concurrent pair execution, and an LRU/TTL cache in front of all
//! of it.

mod error;
mod path_cache;
mod path_finder;

pub use error::ReasonerError;
pub use path_cache::{cache_key, CachedPathResult, PathCache, DEFAULT_MAX_SIZE, DEFAULT_TTL};
pub use path_finder::{
    batch_find_paths, find_paths, find_weighted_paths, BatchPathFailure, BatchPathResult, EntityRef, PathPair,
    PathQuery, PathResult, PathStatistics, WeightFn, DEFAULT_MAX_CONCURRENCY, DEFAULT_RELATION_WEIGHT,
    MAX_RESULT_PATHS,
};
