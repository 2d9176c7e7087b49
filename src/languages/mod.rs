pub mod python;
pub mod rust;
pub mod typescript;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tree_sitter::Query;

/// A pluggable language front end for the occurrence extractor.
///
/// Grammars are capabilities, not subclasses: a language registers a
/// tree-sitter grammar plus two S-expression queries describing where
/// symbols are declared and where they are referenced.
pub trait LanguageGrammar: Send + Sync {
    fn name(&self) -> &'static str;
    fn file_extensions(&self) -> &[&'static str];
    fn language(&self) -> tree_sitter::Language;

    /// Query capturing declaration sites. Each match carries a `@name`
    /// capture (the declared identifier) and a kind capture naming the
    /// enclosing construct (`@function`, `@struct`, ...).
    fn declarations_query(&self) -> &str;

    /// Query capturing reference sites (identifiers, type uses, field
    /// accesses). May be empty for declaration-only grammars.
    fn references_query(&self) -> &str {
        ""
    }

    /// Compiled declarations query, cached once per process.
    fn cached_declarations_query(&self) -> Option<&'static Query> {
        None
    }

    /// Compiled references query, cached once per process.
    fn cached_references_query(&self) -> Option<&'static Query> {
        None
    }
}

pub struct LanguageRegistry {
    languages: HashMap<String, Arc<dyn LanguageGrammar>>,
    extension_map: HashMap<String, String>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            languages: HashMap::new(),
            extension_map: HashMap::new(),
        };

        registry.register(Arc::new(rust::RustGrammar));
        registry.register(Arc::new(python::PythonGrammar));
        registry.register(Arc::new(typescript::TypeScriptGrammar));
        registry.register(Arc::new(typescript::TsxGrammar));

        registry
    }

    pub fn register(&mut self, grammar: Arc<dyn LanguageGrammar>) {
        let name = grammar.name().to_string();
        for ext in grammar.file_extensions() {
            self.extension_map.insert(ext.to_string(), name.clone());
        }
        self.languages.insert(name, grammar);
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn LanguageGrammar>> {
        self.languages.get(name).cloned()
    }

    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn LanguageGrammar>> {
        self.extension_map
            .get(ext)
            .and_then(|name| self.languages.get(name))
            .cloned()
    }

    pub fn get_for_file(&self, path: &Path) -> Option<Arc<dyn LanguageGrammar>> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.get_by_extension(ext))
    }

    pub fn supported_extensions(&self) -> Vec<&str> {
        self.extension_map.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
