//! Profile command

use crate::app::ProfileArgs;
use crate::commands::Context;
use crate::output::json::to_pretty;
use anyhow::Result;
use serde_json::json;
use vibenav_core::places::{load_places, save_places, tagged_path};
use vibenav_core::{VibeError, VibeProfiler};

pub async fn run(args: ProfileArgs, ctx: &Context) -> Result<()> {
    let mut places = load_places(&args.input)?;
    let profiler = VibeProfiler::new(ctx.llm()).with_retry(ctx.config.retry.tagging.policy());

    let wanted = args.name.as_deref().map(|n| n.trim().to_lowercase());
    if let Some(name) = &wanted {
        if !places.iter().any(|p| p.name.trim().to_lowercase() == *name) {
            return Err(VibeError::PlaceNotFound(name.clone()).into());
        }
    }

    let mut profiles = Vec::new();
    for place in places.iter_mut() {
        if let Some(name) = &wanted {
            if place.name.trim().to_lowercase() != *name {
                continue;
            }
        }
        eprintln!("Profiling {}...", place.name);
        if let Err(e) = profiler.annotate(place).await {
            tracing::warn!("Profiling failed for '{}': {}", place.name, e);
            place.processing_error = Some(format!("profile: {}", e));
        }
        profiles.push(json!({
            "name": place.name,
            "vibe_profile": place.vibe_profile,
            "quality_score": place.quality_score,
            "error": place.processing_error,
        }));
    }

    print!("{}", to_pretty(&profiles));

    if args.write {
        let output = tagged_path(&args.input);
        save_places(&output, &places)?;
        eprintln!("Saved profiles to {}", output.display());
    }
    Ok(())
}
