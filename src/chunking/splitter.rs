//! Recursive character splitting.
//!
//! Splits text on progressively finer separators (paragraph, line, word,
//! character) and merges the pieces back into overlapping windows.

use serde::{Deserialize, Serialize};

/// Separators tried in order; the empty string means per-character.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Configuration for the splitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitterConfig {
    /// Maximum window size in characters.
    pub chunk_size: usize,
    /// Characters of overlap between consecutive windows.
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            chunk_overlap: 200,
        }
    }
}

/// Recursive character splitter.
pub struct RecursiveSplitter {
    config: SplitterConfig,
}

impl RecursiveSplitter {
    pub fn new(config: SplitterConfig) -> Self {
        assert!(
            config.chunk_overlap < config.chunk_size,
            "chunk_overlap must be smaller than chunk_size"
        );
        Self { config }
    }

    /// Split text into overlapping windows of at most `chunk_size` characters.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        if char_len(trimmed) <= self.config.chunk_size {
            return vec![trimmed.to_string()];
        }

        let (sep, rest) = pick_separator(trimmed, &SEPARATORS);
        let pieces = self.decompose(trimmed, sep, rest);

        self.merge_pieces(pieces, sep)
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Break text into pieces no longer than `chunk_size`, recursing into
    /// finer separators for oversized pieces.
    fn decompose(&self, text: &str, sep: &str, finer: &[&'static str]) -> Vec<String> {
        let raw: Vec<String> = if sep.is_empty() {
            text.chars().map(|c| c.to_string()).collect()
        } else {
            text.split(sep)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        };

        let mut pieces = Vec::with_capacity(raw.len());
        for piece in raw {
            if char_len(&piece) <= self.config.chunk_size {
                pieces.push(piece);
            } else {
                let (next_sep, next_finer) = pick_separator(&piece, finer);
                pieces.extend(self.decompose(&piece, next_sep, next_finer));
            }
        }
        pieces
    }

    /// Greedily join pieces into windows, retaining a tail of up to
    /// `chunk_overlap` characters when a window fills up.
    fn merge_pieces(&self, pieces: Vec<String>, sep: &str) -> Vec<String> {
        let sep_len = char_len(sep);
        let mut chunks = Vec::new();
        let mut window: Vec<String> = Vec::new();
        let mut window_len = 0usize;

        for piece in pieces {
            let piece_len = char_len(&piece);
            let joined_len = window_len + piece_len + if window.is_empty() { 0 } else { sep_len };

            if joined_len > self.config.chunk_size && !window.is_empty() {
                chunks.push(window.join(sep));

                while !window.is_empty()
                    && (window_len > self.config.chunk_overlap
                        || window_len + piece_len + sep_len > self.config.chunk_size)
                {
                    let removed = window.remove(0);
                    window_len -= char_len(&removed);
                    if !window.is_empty() {
                        window_len -= sep_len;
                    }
                }
            }

            if !window.is_empty() {
                window_len += sep_len;
            }
            window.push(piece);
            window_len += piece_len;
        }

        if !window.is_empty() {
            chunks.push(window.join(sep));
        }

        chunks
    }
}

impl Default for RecursiveSplitter {
    fn default() -> Self {
        Self::new(SplitterConfig::default())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// First separator that occurs in the text; the empty string is the
/// last-resort per-character split.
fn pick_separator<'a>(text: &str, separators: &'a [&'static str]) -> (&'static str, &'a [&'static str]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() || text.contains(sep) {
            return (sep, &separators[i + 1..]);
        }
    }
    ("", &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_passes_through() {
        let splitter = RecursiveSplitter::default();
        let chunks = splitter.split_text("just a short caption");
        assert_eq!(chunks, vec!["just a short caption".to_string()]);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        let splitter = RecursiveSplitter::default();
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text("   \n  ").is_empty());
    }

    #[test]
    fn test_windows_respect_chunk_size() {
        let splitter = RecursiveSplitter::default();
        let text = (0..500)
            .map(|i| format!("caption line {} with some cooking chatter", i))
            .collect::<Vec<_>>()
            .join("\n");

        let chunks = splitter.split_text(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 1500);
        }
    }

    #[test]
    fn test_consecutive_windows_overlap() {
        let splitter = RecursiveSplitter::new(SplitterConfig {
            chunk_size: 10,
            chunk_overlap: 4,
        });

        let chunks = splitter.split_text("aaaa bbbb cccc dddd");
        assert_eq!(
            chunks,
            vec![
                "aaaa bbbb".to_string(),
                "bbbb cccc".to_string(),
                "cccc dddd".to_string()
            ]
        );
    }

    #[test]
    fn test_unbroken_run_splits_per_character() {
        let splitter = RecursiveSplitter::new(SplitterConfig {
            chunk_size: 10,
            chunk_overlap: 2,
        });

        let chunks = splitter.split_text(&"x".repeat(25));
        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 10);
        }
        // Overlap means the total across windows exceeds the input length.
        let total: usize = chunks.iter().map(|c| c.chars().count()).sum();
        assert!(total > 25);
    }

    #[test]
    fn test_paragraphs_split_before_lines() {
        let splitter = RecursiveSplitter::new(SplitterConfig {
            chunk_size: 30,
            chunk_overlap: 0,
        });

        let chunks = splitter.split_text("first paragraph here\n\nsecond paragraph here");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "first paragraph here");
        assert_eq!(chunks[1], "second paragraph here");
    }

    #[test]
    #[should_panic]
    fn test_overlap_must_be_smaller_than_size() {
        RecursiveSplitter::new(SplitterConfig {
            chunk_size: 10,
            chunk_overlap: 10,
        });
    }
}
