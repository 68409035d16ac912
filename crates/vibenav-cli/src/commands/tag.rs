//! Tag command

use crate::app::TagArgs;
use crate::commands::Context;
use crate::output::format_stats;
use anyhow::Result;
use vibenav_core::pipeline::{IndexingPipeline, PipelineOptions};
use vibenav_core::places::{load_places, save_places, tagged_path};
use vibenav_core::{TagClassifier, VibeProfiler};

pub async fn run(args: TagArgs, ctx: &Context) -> Result<()> {
    let mut places = load_places(&args.input)?;

    let embedder = ctx.embedder();
    let classifier =
        TagClassifier::new(ctx.llm()).with_retry(ctx.config.retry.tagging.policy());
    let profiler = VibeProfiler::new(ctx.llm()).with_retry(ctx.config.retry.tagging.policy());

    let mut pipeline = IndexingPipeline::new(embedder.as_ref()).with_classifier(&classifier);
    if args.profile {
        pipeline = pipeline.with_profiler(&profiler);
    }

    let options = PipelineOptions {
        workers: args.workers,
        profile: args.profile,
        chunking: ctx.config.chunking,
        ..Default::default()
    };

    eprintln!("Tagging {} places...", places.len());
    let stats = pipeline.enrich(&mut places, &options).await;

    let output = tagged_path(&args.input);
    save_places(&output, &places)?;

    print!("{}", format_stats(&stats, ctx.format));
    eprintln!("Saved tagged places to {}", output.display());
    Ok(())
}
