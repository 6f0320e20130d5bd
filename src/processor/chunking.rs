//! # Text Chunking Module
//!
//! Splits normalized record text into overlapping spans for the external
//! embedding collaborator. The splitter prefers natural boundaries in a
//! fixed order (section-header lines, then paragraph breaks, then sentence
//! ends) and only falls back to a hard character cut for pathologically
//! long single units.
//!
//! ## Invariants
//!
//! - Every chunk is an exact substring of the input.
//! - Each chunk records how many leading characters it shares with its
//!   predecessor, so concatenating chunk texts minus their overlaps
//!   reproduces the input byte-for-byte.
//! - Chunk boundaries never split a UTF-8 character.

use tracing::debug;

use crate::processor::config::ChunkOptions;
use crate::processor::error::ProcessError;

/// A chunk of text with its position and overlap bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// The chunk text, an exact substring of the input
    pub text: String,

    /// 0-based position of the chunk in the input
    pub index: usize,

    /// Characters shared with the previous chunk (0 for the first)
    pub overlap: usize,
}

/// Split text into chunks of at most `max_len` characters
pub fn chunk_text(text: &str, options: &ChunkOptions) -> Result<Vec<TextChunk>, ProcessError> {
    if options.max_len == 0 {
        return Err(ProcessError::InvalidOptions(
            "max_len must be positive".to_string(),
        ));
    }
    if options.overlap >= options.max_len {
        return Err(ProcessError::InvalidOptions(format!(
            "overlap {} must be smaller than max_len {}",
            options.overlap, options.max_len
        )));
    }

    let char_offsets: Vec<usize> = text.char_indices().map(|(offset, _)| offset).collect();
    let total = char_offsets.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let byte_at = |pos: usize| {
        if pos >= total {
            text.len()
        } else {
            char_offsets[pos]
        }
    };

    if total <= options.max_len {
        return Ok(vec![TextChunk {
            text: text.to_string(),
            index: 0,
            overlap: 0,
        }]);
    }

    let char_pos_of = |byte: usize| char_offsets.binary_search(&byte).unwrap_or(total);

    let mut headers: Vec<usize> = text
        .match_indices("\n## ")
        .map(|(offset, _)| char_pos_of(offset) + 1)
        .collect();
    let mut paragraphs: Vec<usize> = text
        .match_indices("\n\n")
        .map(|(offset, _)| char_pos_of(offset) + 2)
        .collect();
    let mut sentences: Vec<usize> = [". ", "! ", "? ", ".\n", "!\n", "?\n"]
        .iter()
        .flat_map(|pattern| {
            text.match_indices(pattern)
                .map(|(offset, _)| char_pos_of(offset) + 2)
        })
        .collect();
    headers.sort_unstable();
    paragraphs.sort_unstable();
    sentences.sort_unstable();

    // boundaries closer to the chunk start than this produce uselessly small
    // chunks and are skipped
    let min_advance = (options.max_len * 3 / 10).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut prev_end: usize = 0;
    loop {
        let shared = prev_end.saturating_sub(start);
        let remaining = total - start;
        if remaining <= options.max_len {
            chunks.push(TextChunk {
                text: text[byte_at(start)..].to_string(),
                index: chunks.len(),
                overlap: shared,
            });
            break;
        }

        let lo = start + min_advance;
        let hi = start + options.max_len;
        let end = best_break(&headers, lo, hi)
            .or_else(|| best_break(&paragraphs, lo, hi))
            .or_else(|| best_break(&sentences, lo, hi))
            .unwrap_or(hi);

        chunks.push(TextChunk {
            text: text[byte_at(start)..byte_at(end)].to_string(),
            index: chunks.len(),
            overlap: shared,
        });
        prev_end = end;
        start = end.saturating_sub(options.overlap).max(start + 1);
    }

    debug!("split {} chars into {} chunks", total, chunks.len());
    Ok(chunks)
}

/// Largest break position in `(lo, hi]`
fn best_break(breaks: &[usize], lo: usize, hi: usize) -> Option<usize> {
    breaks
        .iter()
        .rev()
        .find(|&&position| position > lo && position <= hi)
        .copied()
}
