//! Cards command

use crate::app::CardsArgs;
use crate::commands::Context;
use crate::output::format_cards;
use anyhow::Result;
use vibenav_core::llm::vibe_cards;
use vibenav_core::places::load_places;

pub fn run(args: CardsArgs, ctx: &Context) -> Result<()> {
    let places = load_places(&ctx.places_file(&args.places)?)?;
    let cards = vibe_cards(&places);
    tracing::info!("{} of {} places have a vibe profile", cards.len(), places.len());

    print!("{}", format_cards(&cards, ctx.format));
    Ok(())
}
