//! Text processing: synthesis chunking and caption sentence splitting.

pub mod chunker;
pub mod sentences;

pub use chunker::process_text;

/// A chunk of text submitted as one synthesis request.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// Position in narration order (0-indexed)
    pub index: usize,
    /// The text content
    pub text: String,
}

impl TextChunk {
    pub fn new(index: usize, text: String) -> Self {
        Self { index, text }
    }
}

/// Count whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
