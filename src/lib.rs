//! Symbol usage index and query engine.
//!
//! Ingests source files with tree-sitter, keeps an in-memory index of
//! symbol declarations and references, and answers "find all usages of
//! the symbol at this position" under a result cap and a cooperative
//! deadline.

pub mod engine;
pub mod error;
pub mod index;
pub mod indexer;
pub mod languages;
pub mod query;
pub mod server;
pub mod store;

pub use engine::{IndexSummary, UsageEngine, DEFAULT_MAX_RESULTS, DEFAULT_TIMEOUT_MS};
pub use error::{EngineError, Result};
pub use index::{IndexStats, Position, QueryResult, SymbolId, SymbolKind, UsageItem};
