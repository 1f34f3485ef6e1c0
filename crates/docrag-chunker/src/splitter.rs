//! Overlapping window splitter with boundary snapping.

use docrag_core::ChunkError;
use tracing::debug;

/// Split `text` into overlapping windows of at most `size` characters.
///
/// Each window after the first starts `overlap` characters before the
/// previous window's end. Window ends snap backwards to the nearest
/// paragraph, line, sentence, or word boundary within a tolerance band,
/// falling back to a hard cut when the window contains no boundary. Together
/// the windows cover the entire input with no gaps.
///
/// Fails with [`ChunkError::EmptyInput`] when `text` is empty or
/// whitespace-only and [`ChunkError::InvalidConfig`] unless `size > overlap`.
pub fn chunk(text: &str, size: usize, overlap: usize) -> Result<Vec<String>, ChunkError> {
    if text.trim().is_empty() {
        return Err(ChunkError::EmptyInput);
    }
    if size == 0 {
        return Err(ChunkError::InvalidConfig("size must be positive".to_string()));
    }
    if overlap >= size {
        return Err(ChunkError::InvalidConfig(format!(
            "overlap ({overlap}) must be smaller than size ({size})"
        )));
    }

    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < len {
        let hard_end = (start + size).min(len);
        let end = if hard_end < len {
            find_break_point(&chars, start, hard_end)
        } else {
            hard_end
        };

        chunks.push(chars[start..end].iter().collect());

        if end >= len {
            break;
        }
        // Step back by the overlap, but always advance by at least one
        // character so pathological inputs cannot loop forever.
        start = end.saturating_sub(overlap).max(start + 1);
    }

    debug!(
        chunks = chunks.len(),
        chars = len,
        size,
        overlap,
        "chunked text"
    );
    Ok(chunks)
}

/// Pick the cut position for a window spanning `[start, hard_end)`.
///
/// Scans backwards from `hard_end` through at most a quarter of the window,
/// preferring (in order) a paragraph break, a line break, a sentence end
/// followed by whitespace, then any whitespace. Returns `hard_end` when the
/// band holds no boundary at all.
fn find_break_point(chars: &[char], start: usize, hard_end: usize) -> usize {
    let window = hard_end - start;
    let lower = hard_end - (window / 4).min(hard_end - start - 1);

    // Cut positions are exclusive ends: a position `i` means the window
    // keeps chars[..i], so the boundary character stays in this window.
    let passes: [fn(&[char], usize) -> bool; 4] = [
        |c, i| i >= 2 && c[i - 1] == '\n' && c[i - 2] == '\n',
        |c, i| c[i - 1] == '\n',
        |c, i| matches!(c[i - 1], '.' | '!' | '?') && c.get(i).map_or(true, |n| n.is_whitespace()),
        |c, i| c[i - 1].is_whitespace(),
    ];

    for matches_boundary in passes {
        let mut i = hard_end;
        while i > lower {
            if matches_boundary(chars, i) {
                return i;
            }
            i -= 1;
        }
    }
    hard_end
}
