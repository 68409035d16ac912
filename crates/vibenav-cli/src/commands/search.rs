//! Search command

use crate::app::SearchArgs;
use crate::commands::{join_words, Context};
use crate::output::{format_hits, FormatOptions};
use anyhow::Result;
use vibenav_core::search::{search_chunks, SearchMode, SearchOptions};
use vibenav_core::VectorIndex;

pub async fn run(args: SearchArgs, ctx: &Context) -> Result<()> {
    let query = join_words(&args.query, "query")?;
    let index = VectorIndex::load(&ctx.index_dir(args.index_dir.as_ref()))?;

    let mode = if args.mmr {
        SearchMode::Mmr {
            fetch_k: args.fetch_k.unwrap_or(ctx.config.retrieval.fetch_k),
            lambda: args.lambda.unwrap_or(ctx.config.retrieval.mmr_lambda),
        }
    } else {
        SearchMode::Similarity
    };
    let options = SearchOptions {
        limit: args.limit,
        mode,
        tags: args.tags,
    };

    let embedder = ctx.embedder();
    let hits = search_chunks(&index, embedder.as_ref(), &query, &options).await?;

    print!(
        "{}",
        format_hits(&hits, ctx.format, &FormatOptions { full: args.full })
    );
    Ok(())
}
