use once_cell::sync::OnceCell;
use tree_sitter::Query;

use super::LanguageGrammar;

pub struct TypeScriptGrammar;

/// Same node shapes as TypeScript, parsed with the TSX variant of the
/// grammar so JSX markup does not fail the whole unit.
pub struct TsxGrammar;

// Static query caches, one pair per grammar variant
static TS_DECLARATIONS_QUERY: OnceCell<Query> = OnceCell::new();
static TS_REFERENCES_QUERY: OnceCell<Query> = OnceCell::new();
static TSX_DECLARATIONS_QUERY: OnceCell<Query> = OnceCell::new();
static TSX_REFERENCES_QUERY: OnceCell<Query> = OnceCell::new();

const DECLARATIONS_QUERY: &str = r#"
        (function_declaration
            name: (identifier) @name
        ) @function

        (class_declaration
            name: (type_identifier) @name
        ) @class

        (interface_declaration
            name: (type_identifier) @name
        ) @interface

        (enum_declaration
            name: (identifier) @name
        ) @enum

        (type_alias_declaration
            name: (type_identifier) @name
        ) @type_alias

        (method_definition
            name: (property_identifier) @name
        ) @method

        (variable_declarator
            name: (identifier) @name
        ) @variable

        (required_parameter
            pattern: (identifier) @name
        ) @variable
        "#;

const REFERENCES_QUERY: &str = r#"
        (identifier) @ident
        (type_identifier) @type
        (property_identifier) @field
        "#;

impl LanguageGrammar for TypeScriptGrammar {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["ts", "js"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    }

    fn declarations_query(&self) -> &str {
        DECLARATIONS_QUERY
    }

    fn references_query(&self) -> &str {
        REFERENCES_QUERY
    }

    fn cached_declarations_query(&self) -> Option<&'static Query> {
        TS_DECLARATIONS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.declarations_query()))
            .ok()
    }

    fn cached_references_query(&self) -> Option<&'static Query> {
        TS_REFERENCES_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.references_query()))
            .ok()
    }
}

impl LanguageGrammar for TsxGrammar {
    fn name(&self) -> &'static str {
        "tsx"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["tsx", "jsx"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TSX.into()
    }

    fn declarations_query(&self) -> &str {
        DECLARATIONS_QUERY
    }

    fn references_query(&self) -> &str {
        REFERENCES_QUERY
    }

    fn cached_declarations_query(&self) -> Option<&'static Query> {
        TSX_DECLARATIONS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.declarations_query()))
            .ok()
    }

    fn cached_references_query(&self) -> Option<&'static Query> {
        TSX_REFERENCES_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.references_query()))
            .ok()
    }
}
