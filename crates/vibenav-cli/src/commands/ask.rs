//! Ask command

use crate::app::AskArgs;
use crate::commands::{join_words, print_json_error, Context};
use crate::output::json::to_pretty;
use anyhow::Result;
use vibenav_core::llm::PlaceAnswer;
use vibenav_core::{PlaceCatalog, PlaceQa, VibeError};

pub async fn run(args: AskArgs, ctx: &Context) -> Result<()> {
    match answer(&args, ctx).await {
        Ok(answer) => {
            print!("{}", to_pretty(&answer));
            Ok(())
        }
        Err(e) => Err(print_json_error(&e)),
    }
}

async fn answer(args: &AskArgs, ctx: &Context) -> Result<PlaceAnswer, VibeError> {
    let question = join_words(&args.question, "question")?;
    let catalog = PlaceCatalog::load(&ctx.places_file(&args.places)?)?;
    PlaceQa::new(ctx.llm())
        .with_retry(ctx.config.retry.qa.policy())
        .answer_by_name(&catalog, &args.place, &question)
        .await
}
