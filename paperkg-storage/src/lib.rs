//! Graph-store transaction boundary.
//!
//! [`GraphStore`] is the seam every subsystem that touches the knowledge
//! graph (ingestion sinks, normalization's alias writers, the reasoner, the
//! temporal recorder) writes through. Everything else in this crate —
//! [`UnitOfWork`] ordering, [`execute_with_retry`], and [`SchemaProvider`]
//! caching — builds on top of that one trait so a caller never has to know
//! whether it is really talking to a remote graph database or the in-memory
//! reference implementation used in tests.

mod graph_store;
mod in_memory;
mod retry;
mod schema;
mod transaction_manager;
mod unit_of_work;

pub use graph_store::{BatchResult, GraphError, GraphStore, QueryResult, SchemaSnapshot};
pub use in_memory::InMemoryGraphStore;
pub use retry::{execute_with_retry, RetryPolicy};
pub use schema::SchemaProvider;
pub use transaction_manager::{BatchExecResult, BatchItem, TransactionManager};
pub use unit_of_work::{PendingOperation, UnitOfWork, UnitOfWorkReport};
