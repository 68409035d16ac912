//! JSON output formatter

use super::FormatOptions;
use serde::Serialize;
use vibenav_core::index::ChunkDocument;
use vibenav_core::SearchHit;

/// Pretty JSON with a trailing newline
pub fn to_pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string()) + "\n"
}

pub fn format_hits(hits: &[SearchHit], options: &FormatOptions) -> String {
    let output: Vec<serde_json::Value> = hits
        .iter()
        .map(|h| {
            let meta = &h.document.metadata;
            let mut value = serde_json::json!({
                "id": h.document.id,
                "score": h.score,
                "place": meta.source,
                "source": meta.review_source,
                "author": meta.author,
                "tags": meta.tags,
                "url": meta.url,
            });
            if options.full {
                value["text"] = serde_json::Value::String(h.document.text.clone());
            }
            value
        })
        .collect();

    to_pretty(&output)
}

pub fn format_chunks(chunks: &[ChunkDocument]) -> String {
    to_pretty(chunks)
}
