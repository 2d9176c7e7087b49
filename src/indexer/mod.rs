pub mod extractor;
pub mod parser;
pub mod walker;

pub use extractor::OccurrenceExtractor;
pub use parser::{ParsedUnit, Parser};
pub use walker::FileWalker;
