//! SourceUnit store: latest known text + parsed form of each indexed file.
//!
//! Units are replaced wholesale on every re-parse, never patched, so a
//! reader holding an `Arc<SourceUnit>` always observes one consistent
//! version of (text, tree, occurrences).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::Result;
use crate::index::SymbolOccurrence;
use crate::indexer::{OccurrenceExtractor, Parser};
use crate::languages::LanguageRegistry;

/// One file's current state: monotonically versioned, immutable once built.
#[derive(Debug)]
pub struct SourceUnit {
    pub path: String,
    pub version: u64,
    pub text: String,
    pub tree: tree_sitter::Tree,
    /// Ordered by byte position; always consistent with `text`.
    pub occurrences: Vec<SymbolOccurrence>,
}

impl SourceUnit {
    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }

    pub fn line_text(&self, line: usize) -> Option<&str> {
        self.text.lines().nth(line)
    }

    /// Innermost occurrence whose span contains `byte`.
    pub fn occurrence_at(&self, byte: usize) -> Option<&SymbolOccurrence> {
        self.occurrences
            .iter()
            .filter(|o| o.contains_byte(byte))
            .min_by_key(|o| o.byte_len())
    }

    /// First occurrence (by position) fully inside the byte range.
    pub fn first_occurrence_in(&self, start: usize, end: usize) -> Option<&SymbolOccurrence> {
        self.occurrences
            .iter()
            .find(|o| start <= o.start_byte && o.end_byte <= end)
    }
}

pub struct SourceUnitStore {
    parser: Parser,
    extractor: OccurrenceExtractor,
    units: RwLock<HashMap<String, Arc<SourceUnit>>>,
}

impl SourceUnitStore {
    pub fn new(registry: Arc<LanguageRegistry>) -> Self {
        Self {
            parser: Parser::new(registry),
            extractor: OccurrenceExtractor::new(),
            units: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, path: &str) -> Option<Arc<SourceUnit>> {
        let units = self.units.read().unwrap();
        units.get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        let units = self.units.read().unwrap();
        units.contains_key(path)
    }

    /// Re-parses `text` and atomically replaces the unit for `path`,
    /// bumping its version. On parse failure the previous valid unit is
    /// retained and the error is returned to the caller.
    pub fn update(&self, path: &str, text: &str) -> Result<Arc<SourceUnit>> {
        // Parse outside the lock; only the swap is serialized.
        let parsed = self.parser.parse(path, text)?;
        let occurrences = self.extractor.extract(&parsed, path)?;

        let mut units = self.units.write().unwrap();
        let version = units.get(path).map(|u| u.version + 1).unwrap_or(1);
        let unit = Arc::new(SourceUnit {
            path: path.to_string(),
            version,
            text: parsed.source,
            tree: parsed.tree,
            occurrences,
        });
        units.insert(path.to_string(), unit.clone());

        tracing::debug!(path, version, "source unit updated");
        Ok(unit)
    }

    pub fn remove(&self, path: &str) -> Option<Arc<SourceUnit>> {
        let mut units = self.units.write().unwrap();
        units.remove(path)
    }

    pub fn paths(&self) -> Vec<String> {
        let units = self.units.read().unwrap();
        units.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let units = self.units.read().unwrap();
        units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
