//! Usage query orchestration: resolve the target symbol, gather its
//! candidate sites from the index, and emit a capped, ordered item list
//! under a cooperative deadline.

use crate::error::{EngineError, Result};
use crate::index::{Position, QueryResult, SymbolIndex, SymbolOccurrence, UsageItem};
use crate::query::deadline::Deadline;
use crate::query::resolver;
use crate::store::SourceUnitStore;

pub struct UsageQueryEngine<'a> {
    store: &'a SourceUnitStore,
    index: &'a SymbolIndex,
}

impl<'a> UsageQueryEngine<'a> {
    pub fn new(store: &'a SourceUnitStore, index: &'a SymbolIndex) -> Self {
        Self { store, index }
    }

    /// Finds every indexed usage of the symbol at `position`.
    ///
    /// Soft outcomes (nothing named at the position, symbol unknown to
    /// the index, deadline elapsed) are encoded in the `QueryResult`;
    /// only infrastructure failures (unit not present) are errors.
    pub fn find_usages(
        &self,
        path: &str,
        position: Position,
        max_results: usize,
        deadline: &Deadline,
    ) -> Result<QueryResult> {
        let unit = self
            .store
            .get(path)
            .ok_or_else(|| EngineError::FileNotFound(path.to_string()))?;

        let Some(target) = resolver::resolve_at(&unit, self.index, position) else {
            return Ok(QueryResult::unresolved());
        };

        let entry = match target.symbol_id {
            Some(id) => self.index.lookup(&id),
            None => self.index.lookup_by_name(&target.name),
        };
        let Some(entry) = entry else {
            // Resolved to a name the index has never seen: zero usages.
            return Ok(QueryResult {
                count: 0,
                symbol_text: Some(target.name),
                symbol_kind: Some(target.kind),
                items: Vec::new(),
                timed_out: false,
            });
        };

        // Candidate usages: every reference plus any declaration site
        // beyond the canonical one (multi-declaration languages). The
        // canonical declaration itself is not a usage.
        let mut candidates: Vec<&SymbolOccurrence> = entry
            .references
            .iter()
            .chain(entry.declarations.iter().skip(1))
            .collect();
        candidates.sort_by(|a, b| a.usage_sort_key().cmp(&b.usage_sort_key()));
        candidates.dedup_by(|a, b| a.path == b.path && a.start_byte == b.start_byte);

        let mut items = Vec::new();
        let mut timed_out = false;
        for occ in candidates {
            // Deadline first: it takes precedence when both limits
            // would fire on the same candidate.
            if deadline.expired() {
                timed_out = true;
                break;
            }
            if items.len() >= max_results {
                break;
            }
            if let Some(item) = self.usage_item(occ) {
                items.push(item);
            }
        }

        tracing::debug!(
            symbol = %entry.name,
            returned = items.len(),
            timed_out,
            "usage query answered"
        );

        Ok(QueryResult {
            count: items.len(),
            symbol_text: Some(target.name),
            symbol_kind: Some(target.kind),
            items,
            timed_out,
        })
    }

    /// Projects an occurrence into a result item, re-reading the owning
    /// unit's current line text for context. Occurrences pointing past
    /// the end of a since-shrunk unit are silently skipped.
    fn usage_item(&self, occ: &SymbolOccurrence) -> Option<UsageItem> {
        let owner = self.store.get(&occ.path)?;
        let line_text = owner.line_text(occ.start.line as usize)?;
        Some(UsageItem {
            file_path: occ.path.clone(),
            line: occ.start.one_based_line(),
            column: occ.start.one_based_column(),
            context: line_text.trim().to_string(),
        })
    }
}
