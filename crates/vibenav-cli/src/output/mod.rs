//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use vibenav_core::index::ChunkDocument;
use vibenav_core::{PipelineStats, SearchHit, VibeCard};

/// Format options
pub struct FormatOptions {
    pub full: bool,
}

/// Format search hits
pub fn format_hits(hits: &[SearchHit], format: OutputFormat, options: &FormatOptions) -> String {
    match format {
        OutputFormat::Json => json::format_hits(hits, options),
        OutputFormat::Cli => terminal::format_hits(hits, options),
    }
}

/// Format a chunk preview
pub fn format_chunks(chunks: &[ChunkDocument], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_chunks(chunks),
        OutputFormat::Cli => terminal::format_chunks(chunks),
    }
}

/// Format pipeline counts
pub fn format_stats(stats: &PipelineStats, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(stats),
        OutputFormat::Cli => terminal::format_stats(stats),
    }
}

/// Format vibe cards
pub fn format_cards(cards: &[VibeCard], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(&serde_json::json!({
            "count": cards.len(),
            "places": cards,
        })),
        OutputFormat::Cli => terminal::format_cards(cards),
    }
}
