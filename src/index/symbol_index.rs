//! In-memory symbol index: declarations keyed by stable identity,
//! references aggregated by declared name.
//!
//! Name-keyed reference aggregation makes cross-file attachment
//! independent of unit indexing order: a declaration indexed after its
//! referencing units still picks up every previously indexed reference.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::index::models::{
    IndexStats, OccurrenceKind, Position, SymbolId, SymbolIndexEntry, SymbolKind, SymbolOccurrence,
};
use crate::query::resolver;
use crate::store::SourceUnit;

struct DeclRecord {
    name: String,
    kind: SymbolKind,
    occurrences: Vec<SymbolOccurrence>,
}

#[derive(Default)]
struct UnitEntries {
    version: u64,
    decl_ids: Vec<SymbolId>,
    ref_names: Vec<String>,
}

#[derive(Default)]
struct Inner {
    decls: HashMap<SymbolId, DeclRecord>,
    decl_ids_by_name: HashMap<String, Vec<SymbolId>>,
    refs_by_name: HashMap<String, Vec<SymbolOccurrence>>,
    units: HashMap<String, UnitEntries>,
}

#[derive(Default)]
pub struct SymbolIndex {
    inner: RwLock<Inner>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every entry attributed to `unit.path` with the unit's
    /// current occurrence list, as one atomic step from the perspective
    /// of concurrent readers. Cost is proportional to the occurrence
    /// count of this unit only.
    ///
    /// Units carry the store's monotonic version; a unit at or below the
    /// version already indexed for its path is superseded and ignored,
    /// so racing updates to one path settle on the newest version no
    /// matter which commit lands last.
    pub fn index_unit(&self, unit: &SourceUnit) {
        let mut inner = self.inner.write().unwrap();
        if let Some(prev) = inner.units.get(&unit.path) {
            if prev.version >= unit.version {
                tracing::debug!(
                    path = unit.path,
                    version = unit.version,
                    indexed = prev.version,
                    "superseded unit ignored"
                );
                return;
            }
        }
        purge_unit(&mut inner, &unit.path);

        let mut entries = UnitEntries {
            version: unit.version,
            ..UnitEntries::default()
        };
        for occ in &unit.occurrences {
            match occ.kind {
                OccurrenceKind::Declaration => {
                    let id = occ.declared_id();
                    let record = inner.decls.entry(id).or_insert_with(|| DeclRecord {
                        name: occ.name.clone(),
                        kind: occ.symbol_kind,
                        occurrences: Vec::new(),
                    });
                    record.occurrences.push(occ.clone());

                    let ids = inner.decl_ids_by_name.entry(occ.name.clone()).or_default();
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                    if !entries.decl_ids.contains(&id) {
                        entries.decl_ids.push(id);
                    }
                }
                OccurrenceKind::Reference => {
                    inner
                        .refs_by_name
                        .entry(occ.name.clone())
                        .or_default()
                        .push(occ.clone());
                    if !entries.ref_names.contains(&occ.name) {
                        entries.ref_names.push(occ.name.clone());
                    }
                }
            }
        }

        tracing::debug!(
            path = unit.path,
            declarations = entries.decl_ids.len(),
            "unit indexed"
        );
        inner.units.insert(unit.path.clone(), entries);
    }

    /// Drops every entry attributed to `path` (unit evicted or deleted).
    pub fn remove_unit(&self, path: &str) {
        let mut inner = self.inner.write().unwrap();
        purge_unit(&mut inner, path);
    }

    pub fn lookup(&self, id: &SymbolId) -> Option<SymbolIndexEntry> {
        let inner = self.inner.read().unwrap();
        let record = inner.decls.get(id)?;

        let mut declarations = record.occurrences.clone();
        declarations.sort_by(|a, b| a.usage_sort_key().cmp(&b.usage_sort_key()));

        let references = inner
            .refs_by_name
            .get(&record.name)
            .cloned()
            .unwrap_or_default();

        Some(SymbolIndexEntry {
            name: record.name.clone(),
            kind: record.kind,
            declarations,
            references,
        })
    }

    /// Entry for a name with no resolvable declaration: reference sites
    /// only. Returns None when the name is completely unknown.
    pub fn lookup_by_name(&self, name: &str) -> Option<SymbolIndexEntry> {
        let inner = self.inner.read().unwrap();
        let references = inner.refs_by_name.get(name)?.clone();
        Some(SymbolIndexEntry {
            name: name.to_string(),
            kind: SymbolKind::Unknown,
            declarations: Vec::new(),
            references,
        })
    }

    /// Resolves a referenced name to its declared identity. When several
    /// identities share the name, the one whose canonical declaration
    /// sorts first by (path, position) wins.
    pub fn resolve_declared(&self, name: &str) -> Option<(SymbolId, SymbolOccurrence, SymbolKind)> {
        let inner = self.inner.read().unwrap();
        let ids = inner.decl_ids_by_name.get(name)?;

        let mut best: Option<(SymbolId, &SymbolOccurrence, SymbolKind)> = None;
        for id in ids {
            let Some(record) = inner.decls.get(id) else {
                continue;
            };
            let Some(canonical) = record
                .occurrences
                .iter()
                .min_by(|a, b| a.usage_sort_key().cmp(&b.usage_sort_key()))
            else {
                continue;
            };
            let better = match &best {
                None => true,
                Some((_, occ, _)) => canonical.usage_sort_key() < occ.usage_sort_key(),
            };
            if better {
                best = Some((*id, canonical, record.kind));
            }
        }

        best.map(|(id, occ, kind)| (id, occ.clone(), kind))
    }

    /// Identity of the symbol at a position, if any. Resolution logic
    /// lives in the resolver; identity keys are minted and deduplicated
    /// here, so unchanged declarations always yield the same key.
    pub fn find_symbol_at(&self, unit: &SourceUnit, position: Position) -> Option<SymbolId> {
        resolver::resolve_at(unit, self, position).and_then(|target| target.symbol_id)
    }

    pub fn stats(&self) -> IndexStats {
        let inner = self.inner.read().unwrap();
        IndexStats {
            files: inner.units.len(),
            declarations: inner.decls.values().map(|r| r.occurrences.len()).sum(),
            references: inner.refs_by_name.values().map(|v| v.len()).sum(),
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap();
        *inner = Inner::default();
    }
}

fn purge_unit(inner: &mut Inner, path: &str) {
    let Some(prev) = inner.units.remove(path) else {
        return;
    };

    for id in prev.decl_ids {
        if let Some(record) = inner.decls.get_mut(&id) {
            record.occurrences.retain(|o| o.path != path);
            if record.occurrences.is_empty() {
                let name = record.name.clone();
                inner.decls.remove(&id);
                if let Some(ids) = inner.decl_ids_by_name.get_mut(&name) {
                    ids.retain(|x| *x != id);
                    if ids.is_empty() {
                        inner.decl_ids_by_name.remove(&name);
                    }
                }
            }
        }
    }

    for name in prev.ref_names {
        if let Some(refs) = inner.refs_by_name.get_mut(&name) {
            refs.retain(|o| o.path != path);
            if refs.is_empty() {
                inner.refs_by_name.remove(&name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::languages::LanguageRegistry;
    use crate::store::SourceUnitStore;

    fn create_store() -> SourceUnitStore {
        SourceUnitStore::new(Arc::new(LanguageRegistry::new()))
    }

    fn declared_id(unit: &SourceUnit, name: &str) -> SymbolId {
        unit.occurrences
            .iter()
            .find(|o| o.kind == OccurrenceKind::Declaration && o.name == name)
            .expect("declaration present")
            .declared_id()
    }

    // === Indexing & purge ===

    #[test]
    fn test_index_unit_and_lookup() {
        let store = create_store();
        let index = SymbolIndex::new();

        let unit = store
            .update("a.rs", "fn alpha() {}\nfn beta() {\n    alpha();\n}\n")
            .unwrap();
        index.index_unit(&unit);

        let entry = index.lookup(&declared_id(&unit, "alpha")).unwrap();
        assert_eq!(entry.name, "alpha");
        assert_eq!(entry.kind, SymbolKind::Function);
        assert_eq!(entry.declarations.len(), 1);
        assert_eq!(entry.references.len(), 1);
        assert_eq!(entry.canonical_declaration().unwrap().start.line, 0);
    }

    #[test]
    fn test_reindex_purges_stale_occurrences() {
        let store = create_store();
        let index = SymbolIndex::new();

        let unit = store.update("a.rs", "fn old_name() {}").unwrap();
        let old_id = declared_id(&unit, "old_name");
        index.index_unit(&unit);

        let unit = store.update("a.rs", "fn new_name() {}").unwrap();
        index.index_unit(&unit);

        assert!(index.lookup(&old_id).is_none());
        assert!(index.lookup(&declared_id(&unit, "new_name")).is_some());
    }

    #[test]
    fn test_index_unit_ignores_superseded_version() {
        let store = create_store();
        let index = SymbolIndex::new();

        let v1 = store.update("a.rs", "fn one() {}").unwrap();
        let v2 = store.update("a.rs", "fn two() {}").unwrap();

        // Commits landing in reverse: the older unit must not clobber
        // the newer one.
        index.index_unit(&v2);
        index.index_unit(&v1);

        assert!(index.lookup(&declared_id(&v1, "one")).is_none());
        assert!(index.lookup(&declared_id(&v2, "two")).is_some());
        assert_eq!(index.stats().declarations, 1);
    }

    #[test]
    fn test_reindex_idempotent() {
        let store = create_store();
        let index = SymbolIndex::new();
        let source = "fn alpha() {}\nfn beta() {\n    alpha();\n}\n";

        let unit = store.update("a.rs", source).unwrap();
        index.index_unit(&unit);
        let first = index.lookup(&declared_id(&unit, "alpha")).unwrap();

        let unit = store.update("a.rs", source).unwrap();
        index.index_unit(&unit);
        let second = index.lookup(&declared_id(&unit, "alpha")).unwrap();

        assert_eq!(first.declarations, second.declarations);
        assert_eq!(first.references, second.references);

        let stats = index.stats();
        assert_eq!(stats.files, 1);
    }

    #[test]
    fn test_identity_stable_across_reparse() {
        let store = create_store();
        let index = SymbolIndex::new();

        let unit = store.update("a.rs", "fn alpha() {}").unwrap();
        let id_before = declared_id(&unit, "alpha");
        index.index_unit(&unit);

        let unit = store.update("a.rs", "fn alpha() {}").unwrap();
        let id_after = declared_id(&unit, "alpha");
        index.index_unit(&unit);

        assert_eq!(id_before, id_after);
        assert!(index.lookup(&id_before).is_some());
    }

    #[test]
    fn test_remove_unit() {
        let store = create_store();
        let index = SymbolIndex::new();

        let unit = store.update("a.rs", "fn alpha() {}").unwrap();
        let id = declared_id(&unit, "alpha");
        index.index_unit(&unit);

        index.remove_unit("a.rs");
        assert!(index.lookup(&id).is_none());
        assert_eq!(index.stats().files, 0);
    }

    // === Cross-file aggregation ===

    #[test]
    fn test_references_aggregated_across_units() {
        let store = create_store();
        let index = SymbolIndex::new();

        let a = store
            .update("a.rs", "pub fn shared() {}\nfn local() {\n    shared();\n}\n")
            .unwrap();
        let b = store
            .update("b.rs", "fn user() {\n    shared();\n}\n")
            .unwrap();
        index.index_unit(&a);
        index.index_unit(&b);

        let entry = index.lookup(&declared_id(&a, "shared")).unwrap();
        assert_eq!(entry.references.len(), 2);
    }

    #[test]
    fn test_late_declaration_picks_up_existing_references() {
        let store = create_store();
        let index = SymbolIndex::new();

        // References indexed before any declaration exists.
        let b = store
            .update("b.rs", "fn user() {\n    shared();\n}\n")
            .unwrap();
        index.index_unit(&b);
        assert!(index.resolve_declared("shared").is_none());

        let a = store.update("a.rs", "pub fn shared() {}").unwrap();
        index.index_unit(&a);

        let entry = index.lookup(&declared_id(&a, "shared")).unwrap();
        assert_eq!(entry.references.len(), 1);
        assert_eq!(entry.references[0].path, "b.rs");
    }

    #[test]
    fn test_reindex_referencing_unit_purges_its_references() {
        let store = create_store();
        let index = SymbolIndex::new();

        let a = store.update("a.rs", "pub fn shared() {}").unwrap();
        let b = store
            .update("b.rs", "fn user() {\n    shared();\n}\n")
            .unwrap();
        index.index_unit(&a);
        index.index_unit(&b);

        let b = store.update("b.rs", "fn user() {}\n").unwrap();
        index.index_unit(&b);

        let entry = index.lookup(&declared_id(&a, "shared")).unwrap();
        assert!(entry.references.is_empty());
    }

    // === Resolution ===

    #[test]
    fn test_resolve_declared_canonical_is_first_by_path() {
        let store = create_store();
        let index = SymbolIndex::new();

        let b = store.update("b.rs", "pub fn dup() {}").unwrap();
        let a = store.update("a.rs", "pub fn dup() {}").unwrap();
        index.index_unit(&b);
        index.index_unit(&a);

        let (_, canonical, kind) = index.resolve_declared("dup").unwrap();
        assert_eq!(canonical.path, "a.rs");
        assert_eq!(kind, SymbolKind::Function);
        let _ = declared_id(&a, "dup");
    }

    #[test]
    fn test_lookup_by_name_references_only() {
        let store = create_store();
        let index = SymbolIndex::new();

        let unit = store
            .update("a.rs", "fn user() {\n    phantom();\n}\n")
            .unwrap();
        index.index_unit(&unit);

        let entry = index.lookup_by_name("phantom").unwrap();
        assert!(entry.declarations.is_empty());
        assert_eq!(entry.references.len(), 1);
        assert_eq!(entry.kind, SymbolKind::Unknown);

        assert!(index.lookup_by_name("never_mentioned").is_none());
    }

    #[test]
    fn test_find_symbol_at_mints_declared_identity() {
        let store = create_store();
        let index = SymbolIndex::new();

        let unit = store.update("a.rs", "fn alpha() {}").unwrap();
        index.index_unit(&unit);

        // Position inside the `alpha` identifier.
        let id = index.find_symbol_at(&unit, Position::new(0, 4)).unwrap();
        assert_eq!(id, declared_id(&unit, "alpha"));
    }

    #[test]
    fn test_stats_counts() {
        let store = create_store();
        let index = SymbolIndex::new();

        let unit = store
            .update("a.rs", "fn alpha() {}\nfn beta() {\n    alpha();\n}\n")
            .unwrap();
        index.index_unit(&unit);

        let stats = index.stats();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.declarations, 2);
        assert!(stats.references >= 1);
    }

    #[test]
    fn test_clear() {
        let store = create_store();
        let index = SymbolIndex::new();
        let unit = store.update("a.rs", "fn alpha() {}").unwrap();
        index.index_unit(&unit);

        index.clear();
        assert_eq!(index.stats().files, 0);
        assert!(index.lookup(&declared_id(&unit, "alpha")).is_none());
    }
}
