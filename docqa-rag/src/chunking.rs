//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`] — splits by character count, optionally with overlap
//! - [`RecursiveChunker`] — splits hierarchically by paragraphs, sentences, then words
//!
//! All sizes are counted in characters (Unicode scalar values), so a chunk
//! boundary never falls inside a multi-byte UTF-8 sequence.

use crate::document::TextChunk;

/// A strategy for splitting extracted document text into chunks.
///
/// Implementations are pure: the same text always yields the same chunks, in
/// document order, indexed from zero.
pub trait Chunker: Send + Sync {
    /// Split `text` into chunks.
    ///
    /// Returns an empty `Vec` if `text` is empty.
    fn chunk(&self, text: &str) -> Vec<TextChunk>;
}

/// Partition `text` into consecutive, non-overlapping pieces of `chunk_size`
/// characters. The last piece may be shorter.
///
/// A `chunk_size` of zero is treated as one.
///
/// ```
/// use docqa_rag::chunk_text;
///
/// assert_eq!(chunk_text("AAAA", 2), vec!["AA", "AA"]);
/// assert!(chunk_text("", 500).is_empty());
/// ```
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    split_by_chars(text, chunk_size, 0)
}

/// Splits text into fixed-size chunks by character count.
///
/// Splits may fall mid-word. With the default overlap of zero the chunks
/// concatenate back to the original text exactly.
///
/// # Example
///
/// ```rust
/// use docqa_rag::{Chunker, FixedSizeChunker};
///
/// let chunker = FixedSizeChunker::new(4).with_overlap(1);
/// let chunks = chunker.chunk("abcdefghij");
/// let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
/// assert_eq!(texts, ["abcd", "defg", "ghij"]);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a non-overlapping chunker producing `chunk_size`-character chunks.
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size: chunk_size.max(1), chunk_overlap: 0 }
    }

    /// Share `overlap` characters between consecutive chunks.
    ///
    /// The overlap is capped at `chunk_size - 1` so the chunker always makes
    /// progress.
    pub fn with_overlap(mut self, overlap: usize) -> Self {
        self.chunk_overlap = overlap.min(self.chunk_size - 1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, text: &str) -> Vec<TextChunk> {
        into_chunks(split_by_chars(text, self.chunk_size, self.chunk_overlap))
    }
}

/// Splits text hierarchically: paragraphs → sentences → words → characters.
///
/// Text is first split after paragraph separators (`\n\n`), and adjacent
/// segments are merged while they fit in `chunk_size`. A segment that is still
/// too long is split at sentence boundaries (`. `, `! `, `? `), then at spaces,
/// and finally by character count. Separators stay attached to the segment
/// they end, so without overlap the chunks concatenate back to the input.
/// Overlap only applies where a piece has to be cut by character count.
///
/// # Example
///
/// ```rust
/// use docqa_rag::{Chunker, RecursiveChunker};
///
/// let chunker = RecursiveChunker::new(20, 0);
/// let chunks = chunker.chunk("First paragraph.\n\nSecond paragraph.");
/// assert_eq!(chunks.len(), 2);
/// assert_eq!(chunks[1].text, "Second paragraph.");
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

const SEPARATORS: [&str; 5] = ["\n\n", ". ", "! ", "? ", " "];

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — characters shared between pieces cut by character count
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, text: &str) -> Vec<TextChunk> {
        if text.is_empty() {
            return Vec::new();
        }
        into_chunks(split_and_merge(text, self.chunk_size, self.chunk_overlap, &SEPARATORS))
    }
}

fn into_chunks(pieces: Vec<String>) -> Vec<TextChunk> {
    pieces.into_iter().enumerate().map(|(index, text)| TextChunk { index, text }).collect()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Character-based splitting with overlap.
///
/// Stops as soon as a chunk reaches the end of the text, so overlap never
/// produces a trailing chunk that is entirely contained in its predecessor.
fn split_by_chars(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let chunk_size = chunk_size.max(1);
    let step = chunk_size.saturating_sub(chunk_overlap).max(1);

    // Byte offset of every char start, plus the end of the text.
    let boundaries: Vec<usize> =
        text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let char_count = boundaries.len() - 1;

    let mut chunks = Vec::with_capacity(char_count.div_ceil(step));
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(char_count);
        chunks.push(text[boundaries[start]..boundaries[end]].to_string());
        if end == char_count {
            break;
        }
        start += step;
    }

    chunks
}

/// Split text by the first separator, then merge segments into chunks that
/// respect `chunk_size`. Segments that are still too long are split further
/// with the remaining separators.
fn split_and_merge(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Vec<String> {
    if char_len(text) <= chunk_size {
        return vec![text.to_string()];
    }
    let Some((separator, remaining)) = separators.split_first() else {
        return split_by_chars(text, chunk_size, chunk_overlap);
    };

    let mut chunks = Vec::new();
    let mut current = String::new();

    for segment in split_keeping_separator(text, separator) {
        if !current.is_empty() && char_len(&current) + char_len(segment) > chunk_size {
            let piece = std::mem::take(&mut current);
            flush_piece(&mut chunks, piece, chunk_size, chunk_overlap, remaining);
        }
        current.push_str(segment);
    }

    if !current.is_empty() {
        flush_piece(&mut chunks, current, chunk_size, chunk_overlap, remaining);
    }

    chunks
}

fn flush_piece(
    chunks: &mut Vec<String>,
    piece: String,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) {
    if char_len(&piece) > chunk_size {
        chunks.extend(split_and_merge(&piece, chunk_size, chunk_overlap, separators));
    } else {
        chunks.push(piece);
    }
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}
