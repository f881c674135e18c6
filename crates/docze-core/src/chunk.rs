//! Paragraph-boundary text chunker.
//!
//! Splits extracted document text into pieces of at most `max_tokens`
//! (estimated at 4 characters per token). Paragraphs (`\n\n`) are kept
//! together where possible; a paragraph that is too long on its own is
//! hard-split at the last newline or space before the limit.
//!
//! # Example
//!
//! ```rust
//! use docze_core::chunk::chunk_text;
//!
//! let chunks = chunk_text("Hello world.\n\nSecond paragraph.", 700);
//! assert_eq!(chunks, vec!["Hello world.\n\nSecond paragraph."]);
//! ```

/// Approximate characters-per-token ratio.
const CHARS_PER_TOKEN: usize = 4;

/// Collapse runs of spaces and tabs, trim every line, and squeeze blank-line
/// runs down to a single paragraph break.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0usize;

    for line in text.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(&line);
        blank_run = 0;
    }

    out
}

/// Split `text` into chunks of at most `max_tokens` estimated tokens.
///
/// Blank input yields no chunks. Chunks never start or end with whitespace.
pub fn chunk_text(text: &str, max_tokens: usize) -> Vec<String> {
    let max_chars = (max_tokens * CHARS_PER_TOKEN).max(1);
    let mut chunks = Vec::new();
    let mut buf = String::new();

    for para in text.split("\n\n") {
        let para = para.trim();
        if para.is_empty() {
            continue;
        }

        let would_be = if buf.is_empty() {
            para.len()
        } else {
            buf.len() + 2 + para.len()
        };
        if would_be > max_chars && !buf.is_empty() {
            chunks.push(std::mem::take(&mut buf));
        }

        if para.len() > max_chars {
            hard_split(para, max_chars, &mut chunks);
        } else {
            if !buf.is_empty() {
                buf.push_str("\n\n");
            }
            buf.push_str(para);
        }
    }

    if !buf.is_empty() {
        chunks.push(buf);
    }

    chunks
}

fn hard_split(mut remaining: &str, max_chars: usize, chunks: &mut Vec<String>) {
    while !remaining.is_empty() {
        let mut split_at = snap_to_char_boundary(remaining, max_chars);
        if split_at < remaining.len() {
            if let Some(pos) = remaining[..split_at].rfind(['\n', ' ']) {
                if pos > 0 {
                    split_at = pos + 1;
                }
            }
        }
        if split_at == 0 {
            split_at = remaining
                .char_indices()
                .nth(1)
                .map(|(i, _)| i)
                .unwrap_or(remaining.len());
        }

        let piece = remaining[..split_at].trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }
        remaining = &remaining[split_at..];
    }
}

/// Snap a byte index back to the nearest valid UTF-8 char boundary.
fn snap_to_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_text_single_chunk() {
        assert_eq!(chunk_text("Hello, world!", 700), vec!["Hello, world!"]);
    }

    #[test]
    fn test_blank_text_has_no_chunks() {
        assert!(chunk_text("", 700).is_empty());
        assert!(chunk_text("  \n\n \n\n", 700).is_empty());
    }

    #[test]
    fn test_paragraphs_split_when_over_limit() {
        // 2 tokens = 8 chars; each paragraph fits alone but not together.
        let chunks = chunk_text("aaaaa\n\nbbbbb\n\nccccc", 2);
        assert_eq!(chunks, vec!["aaaaa", "bbbbb", "ccccc"]);
    }

    #[test]
    fn test_paragraphs_merge_when_under_limit() {
        let chunks = chunk_text("one\n\ntwo\n\nthree", 10);
        assert_eq!(chunks, vec!["one\n\ntwo\n\nthree"]);
    }

    #[test]
    fn test_long_paragraph_hard_split_on_spaces() {
        let text = "word ".repeat(50);
        let chunks = chunk_text(&text, 5);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 20, "chunk too long: {:?}", chunk);
            assert!(!chunk.starts_with(' ') && !chunk.ends_with(' '));
        }
        assert_eq!(chunks.join(" ").split(' ').count(), 50);
    }

    #[test]
    fn test_multibyte_never_splits_inside_char() {
        let text = "é".repeat(30);
        let chunks = chunk_text(&text, 2);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_normalize_whitespace() {
        let raw = "  Jane   Doe \t\n Engineer  \n\n\n\n  Skills:\tRust  ";
        assert_eq!(normalize_whitespace(raw), "Jane Doe\nEngineer\n\nSkills: Rust");
    }
}
