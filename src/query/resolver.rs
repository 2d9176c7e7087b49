//! Maps a (unit, position) to the symbol it refers to.
//!
//! Positions are clamped defensively: out-of-range lines and columns
//! resolve against the nearest valid offset instead of failing.

use crate::index::{OccurrenceKind, Position, SymbolId, SymbolIndex, SymbolKind, SymbolOccurrence};
use crate::store::SourceUnit;

/// Outcome of point resolution. `symbol_id` is absent for ad-hoc
/// targets (a token with no declared identity); usage search on such a
/// target legitimately returns few or zero results.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub symbol_id: Option<SymbolId>,
    pub name: String,
    pub kind: SymbolKind,
    pub declaration: Option<SymbolOccurrence>,
}

pub fn resolve_at(
    unit: &SourceUnit,
    index: &SymbolIndex,
    position: Position,
) -> Option<ResolvedTarget> {
    let (byte, point) = clamp_to_offset(&unit.text, position);

    // Fast path: the offset sits directly inside an occurrence span.
    if let Some(occ) = unit.occurrence_at(byte) {
        return Some(resolve_occurrence(index, occ));
    }

    let root = unit.tree.root_node();
    let node = root.descendant_for_point_range(point, point)?;

    // A non-leaf covering node means the point is in a structural gap
    // (whitespace between statements); there is nothing named there.
    if node.child_count() > 0 {
        return None;
    }

    // Walk upward through enclosing constructs; the nearest one whose
    // span carries an occurrence names the target (innermost wins by
    // construction). The file root itself never counts as enclosing.
    let mut current = node;
    while let Some(parent) = current.parent() {
        if parent.id() == root.id() {
            break;
        }
        if let Some(occ) = unit.first_occurrence_in(parent.start_byte(), parent.end_byte()) {
            return Some(resolve_occurrence(index, occ));
        }
        current = parent;
    }

    // Fallback: the raw leaf token as an unnamed ad-hoc symbol.
    let text = node.utf8_text(unit.text.as_bytes()).ok()?.trim();
    if text.is_empty() || !text.chars().any(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some(ResolvedTarget {
        symbol_id: None,
        name: text.to_string(),
        kind: SymbolKind::Unknown,
        declaration: None,
    })
}

fn resolve_occurrence(index: &SymbolIndex, occ: &SymbolOccurrence) -> ResolvedTarget {
    match occ.kind {
        OccurrenceKind::Declaration => ResolvedTarget {
            symbol_id: Some(occ.declared_id()),
            name: occ.name.clone(),
            kind: occ.symbol_kind,
            declaration: Some(occ.clone()),
        },
        OccurrenceKind::Reference => match index.resolve_declared(&occ.name) {
            Some((id, canonical, kind)) => ResolvedTarget {
                symbol_id: Some(id),
                name: occ.name.clone(),
                kind,
                declaration: Some(canonical),
            },
            None => ResolvedTarget {
                symbol_id: None,
                name: occ.name.clone(),
                kind: SymbolKind::Unknown,
                declaration: None,
            },
        },
    }
}

/// Clamps a position into the unit's text: line into `[0, line_count-1]`,
/// column into `[0, line_len]` (rounded down to a char boundary).
/// Returns the byte offset and the equivalent tree-sitter point.
pub(crate) fn clamp_to_offset(text: &str, position: Position) -> (usize, tree_sitter::Point) {
    let line_count = text.lines().count();
    if line_count == 0 {
        return (0, tree_sitter::Point::new(0, 0));
    }

    let line = (position.line as usize).min(line_count - 1);
    let mut line_start = 0;
    let mut content = "";
    for (i, raw) in text.split_inclusive('\n').enumerate() {
        if i == line {
            content = raw.trim_end_matches('\n').trim_end_matches('\r');
            break;
        }
        line_start += raw.len();
    }

    let mut column = (position.column as usize).min(content.len());
    while column > 0 && !content.is_char_boundary(column) {
        column -= 1;
    }

    (line_start + column, tree_sitter::Point::new(line, column))
}
