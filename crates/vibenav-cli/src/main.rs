//! vibenav CLI
//!
//! Tag, index and query collected place reviews.

use anyhow::Result;
use clap::Parser;
use vibenav_core::error::exit_codes;
use vibenav_core::VibeError;

mod app;
mod commands;
mod output;
mod progress;

use app::{Cli, Commands};
use commands::{CommandFailed, Context};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let code = match run(cli).await {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            if let Some(failed) = e.downcast_ref::<CommandFailed>() {
                failed.code
            } else {
                eprintln!("Error: {:#}", e);
                e.downcast_ref::<VibeError>()
                    .map(VibeError::exit_code)
                    .unwrap_or(exit_codes::GENERAL_ERROR)
            }
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::new(cli.config.as_deref(), cli.format)?;

    let result = match cli.command {
        Commands::Tag(args) => commands::tag::run(args, &ctx).await,
        Commands::Index(args) => commands::index::run(args, &ctx).await,
        Commands::Search(args) => commands::search::run(args, &ctx).await,
        Commands::Query(args) => commands::query::run(args, &ctx).await,
        Commands::Ask(args) => commands::ask::run(args, &ctx).await,
        Commands::Profile(args) => commands::profile::run(args, &ctx).await,
        Commands::Cards(args) => commands::cards::run(args, &ctx),
        Commands::Chunk(args) => commands::chunk::run(args, &ctx),
        Commands::Status(args) => commands::status::run(args, &ctx),
    };

    ctx.log_metrics();
    result
}
