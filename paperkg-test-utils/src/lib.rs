//! Shared fixtures, builders, and mock providers for PaperKG crate tests.
//!
//! Every other crate's test modules should reach for these rather than
//! hand-rolling their own `Paper`/`GraphEntity` literals or a bespoke mock
//! LLM provider, so fixture drift doesn't quietly change what "a paper"
//! looks like from one crate's tests to the next.

mod builders;
mod mock_llm;
mod strategies;

pub use builders::{alias, graph_entity, graph_relation, normalization_rule, paper, PaperBuilder};
pub use mock_llm::MockLlmProvider;
pub use strategies::{arb_graph_entity, arb_paper};
