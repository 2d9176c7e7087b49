//! Engine facade: one instance per codebase root, owning its own
//! SourceUnit store and symbol index. There is deliberately no ambient
//! global state; callers that serve several roots hold several engines.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::index::{IndexStats, Position, QueryResult, SymbolIndex};
use crate::indexer::FileWalker;
use crate::languages::LanguageRegistry;
use crate::query::{Deadline, UsageQueryEngine};
use crate::store::SourceUnitStore;

pub const DEFAULT_MAX_RESULTS: usize = 500;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexSummary {
    pub indexed: usize,
    pub failed: usize,
}

pub struct UsageEngine {
    root: PathBuf,
    registry: Arc<LanguageRegistry>,
    store: SourceUnitStore,
    index: SymbolIndex,
}

impl UsageEngine {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_registry(root, Arc::new(LanguageRegistry::new()))
    }

    pub fn with_registry(root: impl Into<PathBuf>, registry: Arc<LanguageRegistry>) -> Self {
        Self {
            root: root.into(),
            store: SourceUnitStore::new(registry.clone()),
            index: SymbolIndex::new(),
            registry,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &SourceUnitStore {
        &self.store
    }

    pub fn symbol_index(&self) -> &SymbolIndex {
        &self.index
    }

    /// Re-indexes a unit from in-memory text. On parse failure the
    /// previous unit and its index entries stay in place.
    pub fn update_text(&self, path: &str, text: &str) -> Result<()> {
        let unit = self.store.update(path, text)?;
        self.index.index_unit(&unit);
        Ok(())
    }

    /// Re-indexes a unit from the file-content provider (filesystem).
    pub fn update_file(&self, path: &str) -> Result<()> {
        let full = self.resolve_path(path);
        let text = fs::read_to_string(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EngineError::FileNotFound(path.to_string()),
            _ => EngineError::Io(e),
        })?;
        self.update_text(path, &text)
    }

    /// Drops a unit from both store and index.
    pub fn remove_file(&self, path: &str) {
        self.store.remove(path);
        self.index.remove_unit(path);
    }

    /// All parseable files under the engine root.
    pub fn source_files(&self) -> Result<Vec<PathBuf>> {
        FileWalker::new(self.registry.clone()).walk(&self.root)
    }

    /// Parses and indexes the given files in parallel. Each unit commits
    /// atomically on its own; files that fail to read or parse are
    /// counted and skipped, never aborting the rest of the ingest.
    pub fn index_files<F>(&self, files: &[PathBuf], progress: F) -> IndexSummary
    where
        F: Fn(&Path) + Sync,
    {
        let failed = AtomicUsize::new(0);

        files.par_iter().for_each(|file| {
            let key = self.unit_key(file);
            let outcome = fs::read_to_string(file)
                .map_err(EngineError::from)
                .and_then(|text| self.update_text(&key, &text));
            if let Err(e) = outcome {
                tracing::warn!(path = %key, error = %e, "skipping file");
                failed.fetch_add(1, Ordering::Relaxed);
            }
            progress(file);
        });

        let failed = failed.load(Ordering::Relaxed);
        IndexSummary {
            indexed: files.len() - failed,
            failed,
        }
    }

    pub fn index_root(&self) -> Result<IndexSummary> {
        let files = self.source_files()?;
        Ok(self.index_files(&files, |_| {}))
    }

    /// External entry point: 1-based line/column, bounded by a result
    /// cap and a cooperative deadline. A unit not yet in the store is
    /// loaded from the file-content provider first; provider failures
    /// are hard errors, everything else is a soft outcome in the result.
    pub fn find_usages(
        &self,
        path: &str,
        line: u32,
        column: u32,
        max_results: usize,
        timeout_ms: u64,
    ) -> Result<QueryResult> {
        if !self.store.contains(path) {
            self.update_file(path)?;
        }
        let deadline = Deadline::after_millis(timeout_ms);
        UsageQueryEngine::new(&self.store, &self.index).find_usages(
            path,
            Position::from_one_based(line, column),
            max_results,
            &deadline,
        )
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }

    /// Store/index key for a walked file: root-relative where possible.
    fn unit_key(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }
}
