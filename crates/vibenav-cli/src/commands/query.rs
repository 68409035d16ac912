//! Query command
//!
//! Always prints a JSON body; failures are encoded as `{"error": ...}`.

use crate::app::{OutputFormat, QueryArgs};
use crate::commands::{join_words, print_json_error, CommandFailed, Context};
use crate::output::json::to_pretty;
use anyhow::Result;
use vibenav_core::error::exit_codes;
use vibenav_core::{QueryResponse, VibeError, VibeService};

pub async fn run(args: QueryArgs, ctx: &Context) -> Result<()> {
    let response = match answer(&args, ctx).await {
        Ok(response) => response,
        Err(e) => return Err(print_json_error(&e)),
    };

    match ctx.format {
        OutputFormat::Json => print!("{}", to_pretty(&response)),
        OutputFormat::Cli => print!("{}", to_pretty(&response.answer)),
    }

    if response.is_error() {
        // routed but the model never produced JSON vs. nothing to route to
        let code = if response.place_id.is_some() {
            exit_codes::GENERAL_ERROR
        } else {
            exit_codes::NOT_FOUND
        };
        return Err(CommandFailed { code }.into());
    }
    Ok(())
}

async fn answer(args: &QueryArgs, ctx: &Context) -> Result<QueryResponse, VibeError> {
    let query = join_words(&args.query, "query")?;
    let places_file = ctx.places_file(&args.places)?;
    let index_dir = ctx.index_dir(args.index_dir.as_ref());

    let mut config = ctx.config.clone();
    if let Some(selection) = args.selection {
        config.retrieval.selection = selection;
    }

    let service = VibeService::new(ctx.embedder(), ctx.llm(), config);
    service.load(&index_dir, &places_file).await?;
    service.query(&query, &args.tags).await
}
