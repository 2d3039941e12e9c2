//! Sentence-respecting chunking for synthesis requests.
//!
//! Sentences are never split: a sentence longer than the budget becomes a
//! chunk of its own and exceeds the budget.

use super::TextChunk;

/// Default maximum chunk size in characters.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 4096;

/// Sentence terminator used for splitting and re-appended to each sentence.
const TERMINATOR: char = '.';

/// Split text into chunks of whole sentences, each at most `max_chunk_size`
/// characters.
///
/// Sentences are joined with a single space and every sentence keeps a
/// trailing period. Empty sentences are dropped and empty input yields no
/// chunks.
pub fn segment(text: &str, max_chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in text.split(TERMINATOR) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }

        let sentence_len = sentence.chars().count();
        let separator = usize::from(!current.is_empty());

        if current_len + separator + sentence_len + 1 <= max_chunk_size {
            if separator == 1 {
                current.push(' ');
            }
            current_len += separator + sentence_len + 1;
        } else {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            current_len = sentence_len + 1;
        }
        current.push_str(sentence);
        current.push(TERMINATOR);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Chunk text and number the chunks in narration order.
pub fn process_text(text: &str, max_chunk_size: usize) -> Vec<TextChunk> {
    segment(text, max_chunk_size)
        .into_iter()
        .enumerate()
        .map(|(index, text)| TextChunk::new(index, text))
        .collect()
}
