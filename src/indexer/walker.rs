use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::WalkBuilder;

use crate::error::Result;
use crate::languages::LanguageRegistry;

/// Gitignore-aware walk over a codebase root, filtered to files some
/// registered grammar can parse.
pub struct FileWalker {
    registry: Arc<LanguageRegistry>,
}

impl FileWalker {
    pub fn new(registry: Arc<LanguageRegistry>) -> Self {
        Self { registry }
    }

    pub fn walk(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .build();

        for entry in walker.flatten() {
            let path = entry.path();
            if path.is_file() && self.is_supported(path) {
                files.push(path.to_path_buf());
            }
        }

        // Walk order is filesystem-dependent; sort for stable ingest order.
        files.sort();
        Ok(files)
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        self.registry.get_for_file(path).is_some()
    }
}
