//! Overlapping word-window chunking.
//!
//! Source text is split on whitespace and regrouped into fixed-size windows that
//! overlap by a configurable number of words, so that sentences straddling a
//! window boundary stay retrievable from at least one chunk.

use crate::error::{KildeError, Result};

/// Validated word-window parameters.
///
/// `overlap` must be strictly less than `window`; the window advances by
/// `window - overlap` words per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingParams {
    window: usize,
    overlap: usize,
}

impl ChunkingParams {
    /// Create validated parameters.
    pub fn new(window: usize, overlap: usize) -> Result<Self> {
        if window == 0 {
            return Err(KildeError::Config(
                "chunking window must be at least 1 word".to_string(),
            ));
        }
        if overlap >= window {
            return Err(KildeError::Config(format!(
                "chunking overlap ({}) must be smaller than the window ({})",
                overlap, window
            )));
        }
        Ok(Self { window, overlap })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Words the window advances per step.
    pub fn step(&self) -> usize {
        self.window - self.overlap
    }
}

impl Default for ChunkingParams {
    fn default() -> Self {
        // Matches the default [chunking] settings section
        Self {
            window: 500,
            overlap: 100,
        }
    }
}

/// Split text into overlapping word-window chunks.
///
/// Empty input produces no chunks; input shorter than one window produces a
/// single chunk with all available words. Pure function of its inputs.
pub fn chunk_words(text: &str, params: &ChunkingParams) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let end = (start + params.window()).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += params.step();
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(window: usize, overlap: usize) -> ChunkingParams {
        ChunkingParams::new(window, overlap).unwrap()
    }

    #[test]
    fn test_window_arithmetic() {
        // window=3, overlap=1 -> step=2
        let chunks = chunk_words("the cat sat on the mat", &params(3, 1));
        assert_eq!(chunks, vec!["the cat sat", "sat on the", "the mat"]);
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(chunk_words("", &params(3, 1)).is_empty());
        assert!(chunk_words("   \n\t ", &params(3, 1)).is_empty());
    }

    #[test]
    fn test_short_input_yields_single_chunk() {
        let chunks = chunk_words("hello world", &params(10, 2));
        assert_eq!(chunks, vec!["hello world"]);
    }

    #[test]
    fn test_exact_window_length() {
        let chunks = chunk_words("a b c", &params(3, 1));
        assert_eq!(chunks, vec!["a b c"]);
    }

    #[test]
    fn test_zero_overlap() {
        let chunks = chunk_words("a b c d e f", &params(2, 0));
        assert_eq!(chunks, vec!["a b", "c d", "e f"]);
    }

    #[test]
    fn test_reassembly_is_lossless() {
        // Dropping each chunk's leading overlap reconstructs the token sequence
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let p = params(5, 2);
        let chunks = chunk_words(text, &p);

        let mut rebuilt: Vec<String> = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let words = chunk.split_whitespace().map(String::from);
            if i == 0 {
                rebuilt.extend(words);
            } else {
                rebuilt.extend(words.skip(p.overlap()));
            }
        }

        let original: Vec<String> = text.split_whitespace().map(String::from).collect();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(ChunkingParams::new(0, 0).is_err());
        assert!(ChunkingParams::new(3, 3).is_err());
        assert!(ChunkingParams::new(3, 5).is_err());
        assert!(ChunkingParams::new(1, 0).is_ok());
    }
}
