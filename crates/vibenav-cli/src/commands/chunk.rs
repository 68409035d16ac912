//! Chunk command (offline preview)

use crate::app::ChunkArgs;
use crate::commands::Context;
use crate::output::format_chunks;
use anyhow::Result;
use vibenav_core::index::{chunk_places, chunk_text, ChunkDocument, ChunkMetadata};
use vibenav_core::places::load_places;
use vibenav_core::{ChunkingConfig, ReviewSource, VibeError};

pub fn run(args: ChunkArgs, ctx: &Context) -> Result<()> {
    let chunking = ChunkingConfig {
        chunk_size: args.size.unwrap_or(ctx.config.chunking.chunk_size),
        chunk_overlap: args.overlap.unwrap_or(ctx.config.chunking.chunk_overlap),
    };
    if chunking.chunk_size == 0 || chunking.chunk_overlap >= chunking.chunk_size {
        return Err(VibeError::InvalidInput(format!(
            "overlap ({}) must be smaller than size ({})",
            chunking.chunk_overlap, chunking.chunk_size
        ))
        .into());
    }

    let chunks = match (&args.input, &args.text) {
        (Some(path), _) => chunk_places(&load_places(path)?, &chunking),
        (None, Some(text)) => text_chunks(text, &chunking),
        (None, None) => {
            return Err(
                VibeError::InvalidInput("pass a place file or --text".to_string()).into(),
            )
        }
    };

    print!("{}", format_chunks(&chunks, ctx.format));
    Ok(())
}

fn text_chunks(text: &str, chunking: &ChunkingConfig) -> Vec<ChunkDocument> {
    chunk_text(text, chunking.chunk_size, chunking.chunk_overlap)
        .into_iter()
        .enumerate()
        .map(|(i, text)| ChunkDocument {
            id: format!("text:0:{}", i),
            text,
            metadata: ChunkMetadata {
                place_id: "text".to_string(),
                source: "text".to_string(),
                city: String::new(),
                tags: Vec::new(),
                author: "Anonymous".to_string(),
                address: None,
                rating: None,
                reviews_count: None,
                coordinates: None,
                review_source: ReviewSource::Google,
                url: String::new(),
            },
        })
        .collect()
}
