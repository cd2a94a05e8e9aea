//! Delimiter-based corpus splitter.
//!
//! Splits the knowledge corpus into [`Passage`]s. Each delimiter-separated
//! section becomes one passage; sections longer than `chunk_size` are cut
//! into overlapping windows so context straddling a cut is not lost.
//!
//! # Algorithm
//!
//! 1. Split the text on the literal `delimiter`.
//! 2. Trim every section and drop the empty ones.
//! 3. A section of at most `chunk_size` characters is emitted as-is.
//! 4. A longer section is windowed: each window holds at most `chunk_size`
//!    characters and ends at the last whitespace inside it when one exists
//!    past the overlap region, otherwise at the hard limit.
//! 5. The next window starts `chunk_overlap` characters before the end of
//!    the previous one.
//!
//! Sizes are counted in `char`s, so multi-byte text is never cut inside a
//! code point. The output depends only on the input, so re-splitting an
//! unchanged corpus yields the same sequence.
//!
//! # Example
//!
//! ```rust
//! use faq_relay_core::chunk::{split_corpus, SplitOptions};
//!
//! let passages = split_corpus("Rule: no spam\n---\nRule: be kind", &SplitOptions::default());
//! assert_eq!(passages.len(), 2);
//! assert_eq!(passages[1].content, "Rule: be kind");
//! ```

use crate::models::Passage;

/// Default section delimiter.
pub const DEFAULT_DELIMITER: &str = "\n---\n";
/// Default maximum passage length, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1200;
/// Default overlap between consecutive windows, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Parameters for [`split_corpus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOptions {
    pub delimiter: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Split corpus text into passages.
///
/// # Guarantees
///
/// - No passage is empty or longer than `chunk_size` characters.
/// - Passages are ordered by `source_offset`.
/// - An empty or whitespace-only corpus yields no passages.
pub fn split_corpus(text: &str, opts: &SplitOptions) -> Vec<Passage> {
    let max_chars = opts.chunk_size.max(1);
    let overlap = opts.chunk_overlap.min(max_chars - 1);

    let mut passages = Vec::new();
    for (offset, section) in sections(text, &opts.delimiter) {
        let trimmed = section.trim();
        if trimmed.is_empty() {
            continue;
        }
        let base = offset + leading_ws_len(section);

        if trimmed.chars().count() <= max_chars {
            passages.push(Passage::new(trimmed, base));
        } else {
            window_section(trimmed, base, max_chars, overlap, &mut passages);
        }
    }
    passages
}

/// Yield `(byte_offset, section)` pairs for every delimiter-separated section.
fn sections<'a>(text: &'a str, delimiter: &str) -> Vec<(usize, &'a str)> {
    if delimiter.is_empty() {
        return vec![(0, text)];
    }
    let mut out = Vec::new();
    let mut start = 0;
    for (pos, _) in text.match_indices(delimiter) {
        out.push((start, &text[start..pos]));
        start = pos + delimiter.len();
    }
    out.push((start, &text[start..]));
    out
}

fn leading_ws_len(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

/// Cut an over-long section into overlapping windows.
fn window_section(
    section: &str,
    base: usize,
    max_chars: usize,
    overlap: usize,
    out: &mut Vec<Passage>,
) {
    // bounds[k] is the byte offset of char k; bounds[n] is section.len().
    let bounds: Vec<usize> = section
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(section.len()))
        .collect();
    let n = bounds.len() - 1;

    let mut start = 0;
    loop {
        let hard_end = (start + max_chars).min(n);
        let end = if hard_end < n {
            (start + overlap + 1..hard_end)
                .rev()
                .find(|&k| section[bounds[k]..].starts_with(char::is_whitespace))
                .unwrap_or(hard_end)
        } else {
            hard_end
        };

        let piece = &section[bounds[start]..bounds[end]];
        let content = piece.trim();
        if !content.is_empty() {
            out.push(Passage::new(
                content,
                base + bounds[start] + leading_ws_len(piece),
            ));
        }

        if end >= n {
            break;
        }
        start = (end - overlap).max(start + 1);
    }
}
