use std::collections::HashSet;
use std::ops::Range;

use tree_sitter::StreamingIterator;

use crate::error::{EngineError, Result};
use crate::index::{OccurrenceKind, Position, SymbolKind, SymbolOccurrence};
use crate::indexer::parser::ParsedUnit;

/// Harvests the flat, ordered occurrence list (declarations + references)
/// from a parsed unit. Output order is deterministic for identical input.
pub struct OccurrenceExtractor;

/// Declaration site captured by the grammar query, before conversion to
/// a `SymbolOccurrence`. `container` is the span of the whole construct
/// (fn item, class body, ...) and doubles as a lexical scope boundary.
struct RawDeclaration {
    name: String,
    kind: SymbolKind,
    name_range: Range<usize>,
    name_start: Position,
    name_end: Position,
    container: Range<usize>,
}

impl OccurrenceExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, parsed: &ParsedUnit, path: &str) -> Result<Vec<SymbolOccurrence>> {
        let declarations = self.collect_declarations(parsed, path)?;

        // Scope containers: named constructs that delimit a lexical scope.
        // Value-level declarations (locals, fields) never enclose others.
        let containers: Vec<(Range<usize>, String)> = declarations
            .iter()
            .filter(|d| d.kind.is_scope_container())
            .map(|d| (d.container.clone(), d.name.clone()))
            .collect();

        let decl_name_spans: HashSet<(usize, usize)> = declarations
            .iter()
            .map(|d| (d.name_range.start, d.name_range.end))
            .collect();

        let mut occurrences = Vec::with_capacity(declarations.len() * 2);

        for decl in &declarations {
            occurrences.push(SymbolOccurrence {
                path: path.to_string(),
                name: decl.name.clone(),
                kind: OccurrenceKind::Declaration,
                symbol_kind: decl.kind,
                start: decl.name_start,
                end: decl.name_end,
                start_byte: decl.name_range.start,
                end_byte: decl.name_range.end,
                scope: scope_names(&containers, &decl.name_range, Some(&decl.container)),
            });
        }

        self.collect_references(parsed, path, &decl_name_spans, &containers, &mut occurrences);

        occurrences.sort_by_key(|o| (o.start_byte, o.end_byte));
        Ok(occurrences)
    }

    fn collect_declarations(
        &self,
        parsed: &ParsedUnit,
        path: &str,
    ) -> Result<Vec<RawDeclaration>> {
        let query = parsed.grammar.cached_declarations_query().ok_or_else(|| {
            EngineError::ParseFailed {
                path: path.to_string(),
                message: format!("invalid declarations query for {}", parsed.language),
            }
        })?;

        let mut declarations = Vec::new();
        let mut cursor = tree_sitter::QueryCursor::new();
        let mut matches = cursor.matches(query, parsed.root_node(), parsed.source_bytes());

        while let Some(m) = matches.next() {
            let mut name_node: Option<tree_sitter::Node> = None;
            let mut container: Option<tree_sitter::Node> = None;
            let mut kind = SymbolKind::Unknown;

            for capture in m.captures {
                let capture_name = query.capture_names()[capture.index as usize];
                match capture_name {
                    "name" => name_node = Some(capture.node),
                    other => {
                        if let Some(k) = declaration_kind(other) {
                            kind = k;
                            container = Some(capture.node);
                        }
                    }
                }
            }

            if let (Some(name_node), Some(container)) = (name_node, container) {
                let name = parsed.node_text(&name_node);
                if name.is_empty() {
                    continue;
                }
                declarations.push(RawDeclaration {
                    name: name.to_string(),
                    kind,
                    name_range: name_node.byte_range(),
                    name_start: point_to_position(name_node.start_position()),
                    name_end: point_to_position(name_node.end_position()),
                    container: container.byte_range(),
                });
            }
        }

        Ok(declarations)
    }

    fn collect_references(
        &self,
        parsed: &ParsedUnit,
        path: &str,
        decl_name_spans: &HashSet<(usize, usize)>,
        containers: &[(Range<usize>, String)],
        occurrences: &mut Vec<SymbolOccurrence>,
    ) {
        let query_str = parsed.grammar.references_query();
        if query_str.trim().is_empty() {
            return;
        }

        let query = match parsed.grammar.cached_references_query() {
            Some(q) => q,
            None => {
                // References are optional; a broken query degrades recall
                // instead of failing the whole unit.
                tracing::warn!("invalid references query for {}", parsed.language);
                return;
            }
        };

        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut cursor = tree_sitter::QueryCursor::new();
        let mut matches = cursor.matches(query, parsed.root_node(), parsed.source_bytes());

        while let Some(m) = matches.next() {
            for capture in m.captures {
                let node = capture.node;
                let span = (node.start_byte(), node.end_byte());

                // A declaration's own name is not a reference to itself.
                if decl_name_spans.contains(&span) || !seen.insert(span) {
                    continue;
                }

                let name = parsed.node_text(&node);
                if name.is_empty() {
                    continue;
                }

                occurrences.push(SymbolOccurrence {
                    path: path.to_string(),
                    name: name.to_string(),
                    kind: OccurrenceKind::Reference,
                    symbol_kind: SymbolKind::Unknown,
                    start: point_to_position(node.start_position()),
                    end: point_to_position(node.end_position()),
                    start_byte: span.0,
                    end_byte: span.1,
                    scope: scope_names(containers, &node.byte_range(), None),
                });
            }
        }
    }
}

impl Default for OccurrenceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn point_to_position(point: tree_sitter::Point) -> Position {
    Position::new(point.row as u32, point.column as u32)
}

fn declaration_kind(capture_name: &str) -> Option<SymbolKind> {
    match capture_name {
        "function" => Some(SymbolKind::Function),
        "method" => Some(SymbolKind::Method),
        "struct" => Some(SymbolKind::Struct),
        "class" => Some(SymbolKind::Class),
        "interface" => Some(SymbolKind::Interface),
        "trait" => Some(SymbolKind::Trait),
        "enum" => Some(SymbolKind::Enum),
        "constant" => Some(SymbolKind::Constant),
        "variable" => Some(SymbolKind::Variable),
        "field" => Some(SymbolKind::Field),
        "module" => Some(SymbolKind::Module),
        "type_alias" => Some(SymbolKind::TypeAlias),
        _ => None,
    }
}

impl SymbolKind {
    /// Kinds whose construct delimits a lexical scope for identity minting.
    pub(crate) fn is_scope_container(&self) -> bool {
        matches!(
            self,
            SymbolKind::Function
                | SymbolKind::Method
                | SymbolKind::Struct
                | SymbolKind::Class
                | SymbolKind::Interface
                | SymbolKind::Trait
                | SymbolKind::Enum
                | SymbolKind::Module
        )
    }
}

/// Names of the containers enclosing `range`, outermost first.
/// `exclude` drops the occurrence's own construct so a declaration is
/// not scoped to itself.
fn scope_names(
    containers: &[(Range<usize>, String)],
    range: &Range<usize>,
    exclude: Option<&Range<usize>>,
) -> Vec<String> {
    let mut enclosing: Vec<&(Range<usize>, String)> = containers
        .iter()
        .filter(|(c, _)| c.start <= range.start && range.end <= c.end)
        .filter(|(c, _)| exclude != Some(c))
        .collect();

    // Outer containers start earlier (or span wider on equal starts).
    enclosing.sort_by_key(|(c, _)| (c.start, std::cmp::Reverse(c.end)));
    enclosing.into_iter().map(|(_, name)| name.clone()).collect()
}
