use std::fmt;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

/// A point in a source unit. Internal positions are 0-based; conversion
/// to and from the 1-based external convention happens at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Converts from the 1-based convention used by external callers.
    pub fn from_one_based(line: u32, column: u32) -> Self {
        Self {
            line: line.saturating_sub(1),
            column: column.saturating_sub(1),
        }
    }

    pub fn one_based_line(&self) -> u32 {
        self.line + 1
    }

    pub fn one_based_column(&self) -> u32 {
        self.column + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OccurrenceKind {
    Declaration,
    Reference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Struct,
    Class,
    Interface,
    Trait,
    Enum,
    Constant,
    Variable,
    Field,
    Module,
    TypeAlias,
    Unknown,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Struct => "struct",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Trait => "trait",
            SymbolKind::Enum => "enum",
            SymbolKind::Constant => "constant",
            SymbolKind::Variable => "variable",
            SymbolKind::Field => "field",
            SymbolKind::Module => "module",
            SymbolKind::TypeAlias => "type_alias",
            SymbolKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identity of a declared symbol.
///
/// Minted from a composite key (declaring path, lexical scope, name, kind)
/// so re-parsing unchanged code always produces the same identity. Never
/// derived from object or memory identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolId(u64);

impl SymbolId {
    pub fn mint(path: &str, scope: &[String], name: &str, kind: SymbolKind) -> Self {
        let mut key = String::with_capacity(path.len() + name.len() + 16);
        key.push_str(path);
        key.push('\0');
        for part in scope {
            key.push_str(part);
            key.push_str("::");
        }
        key.push('\0');
        key.push_str(name);
        key.push('\0');
        key.push_str(kind.as_str());
        Self(xxh3_64(key.as_bytes()))
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sid:{:016x}", self.0)
    }
}

/// A declaration or reference site of a symbol within one source unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolOccurrence {
    pub path: String,
    pub name: String,
    pub kind: OccurrenceKind,
    pub symbol_kind: SymbolKind,
    pub start: Position,
    pub end: Position,
    pub start_byte: usize,
    pub end_byte: usize,
    /// Names of the enclosing declarations, outermost first.
    pub scope: Vec<String>,
}

impl SymbolOccurrence {
    /// Identity for a declaration occurrence. References resolve their
    /// identity through the index instead.
    pub fn declared_id(&self) -> SymbolId {
        SymbolId::mint(&self.path, &self.scope, &self.name, self.symbol_kind)
    }

    pub fn contains_byte(&self, byte: usize) -> bool {
        self.start_byte <= byte && byte < self.end_byte
    }

    pub fn byte_len(&self) -> usize {
        self.end_byte.saturating_sub(self.start_byte)
    }

    /// Sort key for deterministic result ordering: unit path lexical
    /// order first, then position within the unit.
    pub fn usage_sort_key(&self) -> (&str, Position) {
        (self.path.as_str(), self.start)
    }
}

/// Aggregated view of one symbol identity: its declaration sites (first
/// is canonical) and every known reference site across indexed units.
#[derive(Debug, Clone)]
pub struct SymbolIndexEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub declarations: Vec<SymbolOccurrence>,
    pub references: Vec<SymbolOccurrence>,
}

impl SymbolIndexEntry {
    pub fn canonical_declaration(&self) -> Option<&SymbolOccurrence> {
        self.declarations.first()
    }
}

/// One usage site in a query answer. Context is the trimmed current
/// line text, re-read from the live store at answer time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageItem {
    pub file_path: String,
    /// 1-based
    pub line: u32,
    /// 1-based
    pub column: u32,
    pub context: String,
}

/// Result of a usage query.
///
/// `timed_out = true` with partial items is a distinct outcome from
/// "zero usages found" (count 0, timed_out false). Absent symbol fields
/// mean the position did not resolve to any named element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol_kind: Option<SymbolKind>,
    pub items: Vec<UsageItem>,
    pub timed_out: bool,
}

impl QueryResult {
    /// Success-with-no-target: the position resolved to nothing named.
    pub fn unresolved() -> Self {
        Self {
            count: 0,
            symbol_text: None,
            symbol_kind: None,
            items: Vec::new(),
            timed_out: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub files: usize,
    pub declarations: usize,
    pub references: usize,
}
