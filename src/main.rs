mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use usage_indexer::UsageEngine;

use usage_indexer::{engine, error, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "usage_indexer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Cli::parse();
    let engine = UsageEngine::new(&args.root);

    match args.command {
        Commands::Index => {
            cli::index_root(&engine)?;
        }
        Commands::Usages {
            path,
            line,
            column,
            max_results,
            timeout_ms,
        } => {
            // Cross-file usages need the whole root indexed, not just
            // the queried file.
            engine.index_root()?;
            cli::find_usages(&engine, &path, line, column, max_results, timeout_ms)?;
        }
        Commands::Update { path } => {
            cli::update_file(&engine, &path)?;
        }
        Commands::Stats => {
            engine.index_root()?;
            cli::show_stats(&engine)?;
        }
        Commands::Serve => {
            cli::index_root(&engine)?;
            cli::serve(&engine).await?;
        }
    }

    Ok(())
}
