//! Terminal output formatter

use super::FormatOptions;
use vibenav_core::index::ChunkDocument;
use vibenav_core::{PipelineStats, SearchHit, VibeCard};

const PREVIEW_CHARS: usize = 160;

fn preview(text: &str) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", cut)
}

pub fn format_hits(hits: &[SearchHit], options: &FormatOptions) -> String {
    if hits.is_empty() {
        return "No matching reviews.\n".to_string();
    }

    let mut output = String::new();

    for hit in hits {
        let meta = &hit.document.metadata;
        let score_pct = (hit.score.max(0.0) * 100.0) as u32;
        output.push_str(&format!(
            "{:>3}% {} [{}] #{}\n",
            score_pct,
            meta.source,
            meta.review_source.as_str(),
            hit.document.id
        ));
        if !meta.tags.is_empty() {
            output.push_str(&format!("     tags: {}\n", meta.tags.join(", ")));
        }

        if options.full {
            for line in hit.document.text.lines() {
                output.push_str(&format!("     {}\n", line));
            }
            output.push_str(&format!("     {}\n", meta.url));
        } else {
            output.push_str(&format!("     {}\n", preview(&hit.document.text)));
        }
    }

    output
}

pub fn format_chunks(chunks: &[ChunkDocument]) -> String {
    let mut output = String::new();
    for chunk in chunks {
        output.push_str(&format!(
            "#{} ({} chars)\n  {}\n",
            chunk.id,
            chunk.text.chars().count(),
            preview(&chunk.text)
        ));
    }
    output.push_str(&format!("{} chunks\n", chunks.len()));
    output
}

pub fn format_stats(stats: &PipelineStats) -> String {
    format!(
        "Places:   {}\nTagged:   {}\nProfiled: {}\nFailed:   {}\nChunks:   {}\n",
        stats.places, stats.tagged, stats.profiled, stats.failed, stats.chunks
    )
}

pub fn format_cards(cards: &[VibeCard]) -> String {
    if cards.is_empty() {
        return "No profiled places (run `vibenav profile --write` first).\n".to_string();
    }

    let mut output = String::new();
    for card in cards {
        let rating = card
            .rating
            .map(|r| format!(" {:.1}*", r))
            .unwrap_or_default();
        output.push_str(&format!("{} {}{}\n", card.mood_emoji, card.name, rating));
        if let Some(address) = &card.address {
            output.push_str(&format!("  {}\n", address));
        }
        if !card.tags.is_empty() {
            output.push_str(&format!("  tags: {}\n", card.tags.join(", ")));
        }
        output.push_str(&format!("  {}\n", preview(&card.summary)));
        if !card.persona.is_empty() {
            output.push_str(&format!("  for: {}\n", card.persona));
        }
        if !card.pro_tip.is_empty() {
            output.push_str(&format!("  tip: {}\n", card.pro_tip));
        }
        for citation in &card.citations {
            output.push_str(&format!(
                "  [{}] {}\n",
                citation.source.as_str(),
                preview(&citation.text)
            ));
        }
        if let Some(score) = card.quality_score {
            output.push_str(&format!("  quality: {:.0}%\n", score));
        }
        output.push('\n');
    }
    output.push_str(&format!("{} cards\n", cards.len()));
    output
}
