//! Status command

use crate::app::{OutputFormat, StatusArgs};
use crate::commands::Context;
use crate::output::json::to_pretty;
use anyhow::Result;
use serde_json::json;
use vibenav_core::VectorIndex;

pub fn run(args: StatusArgs, ctx: &Context) -> Result<()> {
    let index_dir = ctx.index_dir(args.index_dir.as_ref());

    if !index_dir.join("docstore.json").exists() {
        match ctx.format {
            OutputFormat::Json => print!(
                "{}",
                to_pretty(&json!({ "index_dir": index_dir, "loaded": false }))
            ),
            OutputFormat::Cli => println!(
                "No vector index at {} (run `vibenav index <places.json>`)",
                index_dir.display()
            ),
        }
        return Ok(());
    }

    let index = VectorIndex::load(&index_dir)?;
    let places: std::collections::HashSet<&str> = index
        .documents()
        .iter()
        .map(|d| d.metadata.place_id.as_str())
        .collect();

    match ctx.format {
        OutputFormat::Json => print!(
            "{}",
            to_pretty(&json!({
                "index_dir": index_dir,
                "loaded": true,
                "chunks": index.len(),
                "places": places.len(),
                "dimensions": index.dimensions(),
                "model": index.model(),
                "created_at": index.created_at().to_rfc3339(),
            }))
        ),
        OutputFormat::Cli => {
            println!("Index:      {}", index_dir.display());
            println!("Chunks:     {}", index.len());
            println!("Places:     {}", places.len());
            println!("Dimensions: {}", index.dimensions());
            println!("Model:      {}", index.model());
            println!("Created:    {}", index.created_at().to_rfc3339());
        }
    }
    Ok(())
}
