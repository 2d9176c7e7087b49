use std::path::PathBuf;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::engine::UsageEngine;
use crate::error::Result;

#[derive(Parser)]
#[command(name = "usage-indexer")]
#[command(about = "Symbol usage index and query engine built on tree-sitter")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Index the current directory
    usage-indexer index

    # Find usages of the symbol at src/lib.rs line 42, column 8
    usage-indexer usages src/lib.rs 42 8

    # Re-ingest one file after an edit, then query it
    usage-indexer update src/lib.rs

    # Show index statistics
    usage-indexer stats

    # Serve line-delimited JSON requests on stdio
    usage-indexer serve
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Codebase root the engine is bound to
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index every supported source file under the root
    Index,

    /// Find usages of the symbol at a 1-based position
    Usages {
        /// File path, relative to the root
        path: String,

        /// 1-based line number
        line: u32,

        /// 1-based column number
        column: u32,

        /// Maximum number of usage items to return
        #[arg(long, default_value = "500")]
        max_results: usize,

        /// Query time budget in milliseconds
        #[arg(long, default_value = "10000")]
        timeout_ms: u64,
    },

    /// Re-ingest one file from disk
    Update {
        /// File path, relative to the root
        path: String,
    },

    /// Show index statistics
    Stats,

    /// Serve line-delimited JSON requests on stdio
    Serve,
}

pub fn index_root(engine: &UsageEngine) -> Result<()> {
    let files = engine.source_files()?;
    println!("Found {} files to index", files.len());

    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let summary = engine.index_files(&files, |_| bar.inc(1));
    bar.finish_and_clear();

    let stats = engine.stats();
    println!(
        "Indexed {} files ({} failed): {} declarations, {} references",
        summary.indexed, summary.failed, stats.declarations, stats.references
    );
    Ok(())
}

pub fn find_usages(
    engine: &UsageEngine,
    path: &str,
    line: u32,
    column: u32,
    max_results: usize,
    timeout_ms: u64,
) -> Result<()> {
    let result = engine.find_usages(path, line, column, max_results, timeout_ms)?;

    match &result.symbol_text {
        Some(name) => {
            let kind = result
                .symbol_kind
                .map(|k| k.as_str())
                .unwrap_or("unknown");
            println!("{} ({}) - {} usages", name, kind, result.count);
        }
        None => println!("No symbol at {}:{}:{}", path, line, column),
    }
    if result.timed_out {
        println!("(timed out; results are partial)");
    }
    for item in &result.items {
        println!(
            "{}:{}:{} - {}",
            item.file_path, item.line, item.column, item.context
        );
    }
    Ok(())
}

pub fn update_file(engine: &UsageEngine, path: &str) -> Result<()> {
    engine.update_file(path)?;
    println!("Updated {}", path);
    Ok(())
}

pub fn show_stats(engine: &UsageEngine) -> Result<()> {
    let stats = engine.stats();
    println!("Files: {}", stats.files);
    println!("Declarations: {}", stats.declarations);
    println!("References: {}", stats.references);
    Ok(())
}

pub async fn serve(engine: &UsageEngine) -> Result<()> {
    crate::server::serve_stdio(engine).await
}
