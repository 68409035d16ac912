//! Review chunking for embedding

use lazy_static::lazy_static;
use regex::Regex;

/// Chunking configuration
pub const CHUNK_SIZE_CHARS: usize = 600;
pub const CHUNK_OVERLAP_CHARS: usize = 150;

lazy_static! {
    /// Decorative separator lines: five or more symbols, underscores or spaces
    static ref NOISE_LINE: Regex = Regex::new(r"^[_\W\s]{5,}$").unwrap();
}

/// Byte offsets of every char boundary, plus the end of the string
fn char_boundaries(s: &str) -> Vec<usize> {
    s.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(s.len()))
        .collect()
}

/// Split text into fixed-size overlapping windows, counted in characters.
///
/// Consecutive windows share exactly `overlap` characters; the final window
/// may be shorter. Callers must ensure `overlap < chunk_size`.
pub fn split_windows(content: &str, chunk_size: usize, overlap: usize) -> Vec<&str> {
    if content.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let bounds = char_boundaries(content);
    let char_count = bounds.len() - 1;
    if char_count <= chunk_size {
        return vec![content];
    }

    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut windows = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + chunk_size).min(char_count);
        windows.push(&content[bounds[start]..bounds[end]]);
        if end >= char_count {
            break;
        }
        start += step;
    }

    windows
}

/// Drop lines that consist mostly of symbol/whitespace noise
pub fn clean_text(text: &str) -> String {
    text.lines()
        .filter(|line| !NOISE_LINE.is_match(line.trim()))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Chunk review text: overlapping windows, noise-cleaned, empties dropped
pub fn chunk_text(content: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    split_windows(content, chunk_size, overlap)
        .into_iter()
        .map(clean_text)
        .filter(|chunk| !chunk.is_empty())
        .collect()
}
