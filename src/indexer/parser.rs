use std::sync::Arc;

use crate::error::{EngineError, Result};
use crate::languages::{LanguageGrammar, LanguageRegistry};

/// Text → tree front half of the parser adapter. Deterministic for
/// identical input; rejects input whose tree contains syntax errors so
/// the store never replaces a valid unit with a half-parsed one.
pub struct Parser {
    registry: Arc<LanguageRegistry>,
}

impl Parser {
    pub fn new(registry: Arc<LanguageRegistry>) -> Self {
        Self { registry }
    }

    /// Parses `source` for the grammar registered for `path`'s extension.
    pub fn parse(&self, path: &str, source: &str) -> Result<ParsedUnit> {
        let grammar = self
            .registry
            .get_for_file(std::path::Path::new(path))
            .ok_or_else(|| EngineError::UnsupportedLanguage(path.to_string()))?;

        self.parse_source(path, source, grammar)
    }

    pub fn parse_source(
        &self,
        path: &str,
        source: &str,
        grammar: Arc<dyn LanguageGrammar>,
    ) -> Result<ParsedUnit> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&grammar.language())
            .map_err(|e| EngineError::ParseFailed {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| EngineError::ParseFailed {
                path: path.to_string(),
                message: "parser produced no tree".to_string(),
            })?;

        if tree.root_node().has_error() {
            return Err(EngineError::ParseFailed {
                path: path.to_string(),
                message: "source contains syntax errors".to_string(),
            });
        }

        Ok(ParsedUnit {
            tree,
            source: source.to_string(),
            language: grammar.name(),
            grammar,
        })
    }
}

pub struct ParsedUnit {
    pub tree: tree_sitter::Tree,
    pub source: String,
    pub language: &'static str,
    pub grammar: Arc<dyn LanguageGrammar>,
}

impl std::fmt::Debug for ParsedUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedUnit")
            .field("tree", &self.tree)
            .field("source", &self.source)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl ParsedUnit {
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn source_bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    pub fn node_text(&self, node: &tree_sitter::Node) -> &str {
        node.utf8_text(self.source_bytes()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_parser() -> Parser {
        Parser::new(Arc::new(LanguageRegistry::new()))
    }

    #[test]
    fn test_parse_rust_source() {
        let parser = create_parser();
        let parsed = parser.parse("main.rs", "fn main() {}").unwrap();
        assert_eq!(parsed.language, "rust");
        assert_eq!(parsed.root_node().kind(), "source_file");
    }

    #[test]
    fn test_parse_python_source() {
        let parser = create_parser();
        let parsed = parser.parse("app.py", "def run():\n    pass\n").unwrap();
        assert_eq!(parsed.language, "python");
    }

    #[test]
    fn test_parse_tsx_with_jsx_markup() {
        let parser = create_parser();
        let parsed = parser
            .parse("app.tsx", "function App() {\n    return <div>hello</div>;\n}\n")
            .unwrap();
        assert_eq!(parsed.language, "tsx");
        assert!(!parsed.root_node().has_error());
    }

    #[test]
    fn test_parse_unsupported_extension() {
        let parser = create_parser();
        let err = parser.parse("data.json", "{}").unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedLanguage(_)));
    }

    #[test]
    fn test_parse_rejects_syntax_errors() {
        let parser = create_parser();
        let err = parser.parse("bad.rs", "fn broken( {{{").unwrap_err();
        match err {
            EngineError::ParseFailed { path, .. } => assert_eq!(path, "bad.rs"),
            other => panic!("expected ParseFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_empty_source() {
        let parser = create_parser();
        let parsed = parser.parse("empty.rs", "").unwrap();
        assert_eq!(parsed.source, "");
    }

    #[test]
    fn test_parse_deterministic() {
        let parser = create_parser();
        let source = "fn alpha() {}\nfn beta() { alpha(); }\n";
        let a = parser.parse("x.rs", source).unwrap();
        let b = parser.parse("x.rs", source).unwrap();
        assert_eq!(
            a.root_node().to_sexp(),
            b.root_node().to_sexp()
        );
    }

    #[test]
    fn test_node_text() {
        let parser = create_parser();
        let source = "fn hello() {}";
        let parsed = parser.parse("t.rs", source).unwrap();
        assert_eq!(parsed.node_text(&parsed.root_node()), source);
    }
}
