//! Sentence-boundary-aware sliding-window chunker.
//!
//! Splits text into overlapping [`Chunk`]s of at most `chunk_size`
//! characters. Cuts prefer to land just after a sentence terminator so
//! that chunks rarely split mid-sentence.
//!
//! # Algorithm
//!
//! 1. Collapse every whitespace run to a single space and trim the ends.
//! 2. If the normalized text fits in one window, return it whole (or
//!    nothing, if it is empty).
//! 3. Otherwise slide a window of `chunk_size` characters from offset 0:
//!    - If the window ends before the text does, look for the rightmost
//!      occurrence inside the window of `". "`, `"! "`, `"? "`, `"\n"`,
//!      trying the markers in that order. The first marker with any match
//!      wins, even if a later marker sits closer to the window end. The
//!      cut is placed after the marker.
//!    - Emit the trimmed window if it is longer than [`MIN_CHUNK_CHARS`].
//!      Shorter fragments are dropped, not merged.
//!    - Step back by `overlap` for the next window (no overlap after the
//!      terminal window). If that would not move forward, advance by one.
//! 4. The loop is capped at `max_passes`; hitting the cap is an
//!    [`RagError::Internal`] failure, never a silent truncation.
//!
//! Lengths and offsets are measured in characters, not bytes.
//!
//! # Example
//!
//! ```rust
//! use positron_core::chunk::chunk_text;
//!
//! let text = "a".repeat(1500);
//! let chunks = chunk_text(&text, 1000, 200).unwrap();
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[1].len(), 700); // starts at offset 800
//! ```

use tracing::{debug, error};

use crate::error::{RagError, Result};
use crate::models::{Chunk, ChunkKind, ChunkMetadata};

/// Trimmed windows of this many characters or fewer are discarded.
pub const MIN_CHUNK_CHARS: usize = 10;

/// Default cap on window passes per call.
pub const DEFAULT_MAX_PASSES: usize = 1000;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_OVERLAP: usize = 200;

/// Cut markers in priority order.
const BOUNDARY_MARKERS: [&str; 4] = [". ", "! ", "? ", "\n"];

/// Collapse whitespace runs to single spaces and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Chunk `text` with the default pass cap.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    chunk_text_bounded(text, chunk_size, overlap, DEFAULT_MAX_PASSES)
}

/// Chunk `text`, failing with [`RagError::Internal`] after `max_passes`
/// window passes.
///
/// # Errors
///
/// - [`RagError::Configuration`] if `chunk_size` is zero.
/// - [`RagError::Internal`] if the pass cap is reached.
pub fn chunk_text_bounded(
    text: &str,
    chunk_size: usize,
    overlap: usize,
    max_passes: usize,
) -> Result<Vec<String>> {
    if chunk_size == 0 {
        return Err(RagError::Configuration(
            "chunk_size must be >= 1".to_string(),
        ));
    }

    let normalized = normalize_whitespace(text);
    let chars: Vec<char> = normalized.chars().collect();
    let len = chars.len();

    if len <= chunk_size {
        return Ok(if normalized.is_empty() {
            Vec::new()
        } else {
            vec![normalized]
        });
    }

    let markers: Vec<Vec<char>> = BOUNDARY_MARKERS
        .iter()
        .map(|m| m.chars().collect())
        .collect();

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut passes = 0usize;

    while start < len {
        passes += 1;
        if passes > max_passes {
            error!(max_passes, start, len, "chunker pass cap reached");
            return Err(RagError::Internal(format!(
                "chunker exceeded {} passes at offset {} of {}",
                max_passes, start, len
            )));
        }
        if passes % 100 == 0 {
            debug!(passes, start, len, "chunking progress");
        }

        let mut end = start.saturating_add(chunk_size).min(len);
        if end < len {
            if let Some(cut) = boundary_cut(&chars, &markers, start, end) {
                end = cut;
            }
        }

        let window: String = chars[start..end].iter().collect();
        let piece = window.trim();
        if piece.chars().count() > MIN_CHUNK_CHARS {
            chunks.push(piece.to_string());
        }

        let mut next = if end < len {
            end.saturating_sub(overlap)
        } else {
            end
        };
        if next <= start {
            next = start + 1;
        }
        start = next;
    }

    debug!(chunks = chunks.len(), passes, "chunking complete");
    Ok(chunks)
}

/// Position just after the highest-priority marker found in `[start, end)`.
fn boundary_cut(chars: &[char], markers: &[Vec<char>], start: usize, end: usize) -> Option<usize> {
    markers.iter().find_map(|marker| {
        rfind_within(chars, marker, start, end).map(|pos| pos + marker.len())
    })
}

/// Rightmost `needle` lying entirely inside `haystack[start..end]`.
fn rfind_within(haystack: &[char], needle: &[char], start: usize, end: usize) -> Option<usize> {
    if needle.is_empty() || end < start || end - start < needle.len() {
        return None;
    }
    let mut pos = end - needle.len();
    loop {
        if haystack[pos..pos + needle.len()] == *needle {
            return Some(pos);
        }
        if pos == start {
            return None;
        }
        pos -= 1;
    }
}

/// Configured chunker that attaches source metadata to each chunk.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
    max_passes: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP)
    }
}

impl Chunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn chunk(&self, text: &str) -> Result<Vec<String>> {
        chunk_text_bounded(text, self.chunk_size, self.overlap, self.max_passes)
    }

    /// Chunk plain text; every chunk is tagged `kind = text`.
    pub fn process_text(&self, text: &str, source: &str) -> Result<Vec<Chunk>> {
        self.tagged(text, ChunkMetadata::new(source, ChunkKind::Text))
    }

    /// Chunk text captured from a web page at `url`.
    pub fn process_web(&self, text: &str, url: &str) -> Result<Vec<Chunk>> {
        self.tagged(text, ChunkMetadata::new(url, ChunkKind::Web))
    }

    /// Chunk each page of a PDF independently.
    ///
    /// Pages are numbered from 1 in input order; empty pages produce no
    /// chunks but still consume a page number.
    pub fn process_pages(&self, pages: &[String], source: &str) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for (i, page_text) in pages.iter().enumerate() {
            if page_text.trim().is_empty() {
                continue;
            }
            let page = u32::try_from(i + 1)
                .map_err(|_| RagError::InvalidInput(format!("page number {} out of range", i + 1)))?;
            let meta = ChunkMetadata::new(source, ChunkKind::Pdf).with_page(page);
            chunks.extend(self.tagged(page_text, meta)?);
        }
        Ok(chunks)
    }

    fn tagged(&self, text: &str, metadata: ChunkMetadata) -> Result<Vec<Chunk>> {
        Ok(self
            .chunk(text)?
            .into_iter()
            .map(|text| Chunk {
                text,
                metadata: metadata.clone(),
            })
            .collect())
    }
}
