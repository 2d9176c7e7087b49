use once_cell::sync::OnceCell;
use tree_sitter::Query;

use super::LanguageGrammar;

pub struct RustGrammar;

// Static query caches for Rust
static RUST_DECLARATIONS_QUERY: OnceCell<Query> = OnceCell::new();
static RUST_REFERENCES_QUERY: OnceCell<Query> = OnceCell::new();

impl LanguageGrammar for RustGrammar {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["rs"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    fn declarations_query(&self) -> &str {
        r#"
        (function_item
            name: (identifier) @name
        ) @function

        (struct_item
            name: (type_identifier) @name
        ) @struct

        (enum_item
            name: (type_identifier) @name
        ) @enum

        (trait_item
            name: (type_identifier) @name
        ) @trait

        (mod_item
            name: (identifier) @name
        ) @module

        (type_item
            name: (type_identifier) @name
        ) @type_alias

        (const_item
            name: (identifier) @name
        ) @constant

        (static_item
            name: (identifier) @name
        ) @constant

        (let_declaration
            pattern: (identifier) @name
        ) @variable

        (parameter
            pattern: (identifier) @name
        ) @variable

        (field_declaration
            name: (field_identifier) @name
        ) @field
        "#
    }

    fn references_query(&self) -> &str {
        r#"
        (identifier) @ident
        (type_identifier) @type
        (field_identifier) @field
        "#
    }

    fn cached_declarations_query(&self) -> Option<&'static Query> {
        RUST_DECLARATIONS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.declarations_query()))
            .ok()
    }

    fn cached_references_query(&self) -> Option<&'static Query> {
        RUST_REFERENCES_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.references_query()))
            .ok()
    }
}
