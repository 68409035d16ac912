//! Index command

use crate::app::IndexArgs;
use crate::commands::Context;
use crate::output::format_stats;
use crate::progress::ProgressReporter;
use anyhow::Result;
use vibenav_core::index::BuildProgress;
use vibenav_core::pipeline::{IndexingPipeline, PipelineOptions};
use vibenav_core::{TagClassifier, VibeProfiler};

pub async fn run(args: IndexArgs, ctx: &Context) -> Result<()> {
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
        classify: !args.no_classify,
        profile: args.profile,
        chunking: ctx.config.chunking,
        index_dir: ctx.index_dir(args.index_dir.as_ref()),
    };

    let reporter = ProgressReporter::new("Embedding");
    reporter.set_message(&format!("Indexing {}...", args.input.display()));
    let report: &(dyn Fn(BuildProgress) + Send + Sync) = &|p| reporter.update(p);

    let output = pipeline.run(&args.input, &options, Some(report)).await?;
    reporter.finish();

    print!("{}", format_stats(&output.stats, ctx.format));
    if let Some(tagged) = &output.tagged_file {
        eprintln!("Tagged places: {}", tagged.display());
    }
    eprintln!(
        "Vector index: {} ({} chunks, {} dims)",
        options.index_dir.display(),
        output.index.len(),
        output.index.dimensions()
    );
    Ok(())
}
