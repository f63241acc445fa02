//! Character-window chunking with natural-boundary preference.
//!
//! This module encapsulates how DocLens turns extracted text into overlapping retrieval
//! chunks. Highlights:
//!
//! - Windows are bounded by a character budget; boundaries prefer, in order, paragraph
//!   breaks, line breaks, sentence terminators, commas, and spaces before falling back to
//!   a hard cut at the window edge.
//! - Chunks are verbatim substrings of the input. Joining consecutive chunks with their
//!   shared overlap removed reconstructs the original text exactly.
//! - Sizes are counted in characters, never bytes, so multi-byte input cannot be split
//!   inside a code point.
//! - Window starts advance strictly, so even a single giant token with no whitespace
//!   terminates.

/// Default chunk window size, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between consecutive chunks, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Split text into overlapping chunks of at most `chunk_size` characters.
///
/// Consecutive chunks share up to `overlap` characters; the overlap is clamped below the
/// chunk size. Empty input yields an empty vector, and input that already fits the window
/// yields exactly one chunk equal to the input.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    split_ranges(&chars, chunk_size, overlap)
        .into_iter()
        .map(|(start, end)| chars[start..end].iter().collect())
        .collect()
}

/// Compute the chunk windows as char-index ranges over the input.
///
/// Exposed separately so coverage tests can reason about positions instead of comparing
/// strings.
pub(crate) fn split_ranges(
    chars: &[char],
    chunk_size: usize,
    overlap: usize,
) -> Vec<(usize, usize)> {
    if chars.is_empty() {
        return Vec::new();
    }
    let chunk_size = chunk_size.max(1);
    if chars.len() <= chunk_size {
        return vec![(0, chars.len())];
    }
    let overlap = overlap.min(chunk_size - 1);

    let mut ranges = Vec::new();
    let mut start = 0;
    let mut previous_end = 0;
    loop {
        let window_end = (start + chunk_size).min(chars.len());
        // Boundaries before this point would only re-emit text the previous chunk
        // already covers beyond the declared overlap.
        let min_end = (previous_end + 1).max(start + 1).min(window_end);
        let end = if window_end == chars.len() {
            window_end
        } else {
            find_break(chars, min_end, window_end)
        };
        ranges.push((start, end));
        if end == chars.len() {
            break;
        }
        previous_end = end;
        start = end.saturating_sub(overlap).max(start + 1);
    }
    ranges
}

/// Pick the best split position in `[min_end, window_end]`, preferring natural boundaries.
fn find_break(chars: &[char], min_end: usize, window_end: usize) -> usize {
    debug_assert!(min_end >= 1 && min_end <= window_end);
    let checks: [fn(&[char], usize) -> bool; 5] = [
        breaks_paragraph,
        breaks_line,
        breaks_sentence,
        breaks_clause,
        breaks_word,
    ];
    for check in checks {
        let mut end = window_end;
        while end >= min_end {
            if check(chars, end) {
                return end;
            }
            end -= 1;
        }
    }
    window_end
}

fn breaks_paragraph(chars: &[char], end: usize) -> bool {
    end >= 2 && chars[end - 1] == '\n' && chars[end - 2] == '\n'
}

fn breaks_line(chars: &[char], end: usize) -> bool {
    chars[end - 1] == '\n'
}

fn breaks_sentence(chars: &[char], end: usize) -> bool {
    matches!(chars[end - 1], '.' | '!' | '?')
}

fn breaks_clause(chars: &[char], end: usize) -> bool {
    chars[end - 1] == ','
}

fn breaks_word(chars: &[char], end: usize) -> bool {
    chars[end - 1] == ' '
}
