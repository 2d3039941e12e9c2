//! Sentence splitting for captions using the seams library (dialog-aware).

use anyhow::{anyhow, Result};
use seams::sentence_detector::dialog_detector::SentenceDetectorDialog;
use std::sync::OnceLock;

/// Global detector instance (lazy initialization).
static DETECTOR: OnceLock<std::result::Result<SentenceDetectorDialog, String>> = OnceLock::new();

fn get_detector() -> Result<&'static SentenceDetectorDialog> {
    DETECTOR
        .get_or_init(|| SentenceDetectorDialog::new().map_err(|e| format!("{:?}", e)))
        .as_ref()
        .map_err(|e| anyhow!("Failed to initialize sentence detector: {}", e))
}

/// Split text into sentences with whitespace normalized. Empty sentences are
/// dropped.
pub fn split_into_sentences(text: &str) -> Result<Vec<String>> {
    let detector = get_detector()?;
    let sentences = detector
        .detect_sentences_borrowed(text)
        .map_err(|e| anyhow!("Sentence detection failed: {:?}", e))?;

    Ok(sentences
        .iter()
        .map(|s| s.normalize())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Re-split sentences longer than `max_words` words into consecutive pieces
/// of at most `max_words` words. `0` leaves the sentences untouched.
pub fn limit_words(sentences: Vec<String>, max_words: usize) -> Vec<String> {
    if max_words == 0 {
        return sentences;
    }

    let mut limited = Vec::with_capacity(sentences.len());
    for sentence in sentences {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        if words.len() <= max_words {
            limited.push(sentence);
            continue;
        }
        limited.extend(words.chunks(max_words).map(|piece| piece.join(" ")));
    }
    limited
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_into_sentences() {
        let sentences = split_into_sentences("First sentence. Second sentence.").unwrap();
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].contains("First"));
        assert!(sentences[1].contains("Second"));
    }

    #[test]
    fn test_split_empty_text() {
        assert!(split_into_sentences("").unwrap().is_empty());
    }

    #[test]
    fn test_limit_words_splits_long_sentences() {
        let sentences = vec![
            "one two three four five".to_string(),
            "short one".to_string(),
        ];
        let limited = limit_words(sentences, 2);
        assert_eq!(
            limited,
            vec!["one two", "three four", "five", "short one"]
        );
    }

    #[test]
    fn test_limit_words_zero_disables() {
        let sentences = vec!["a b c d e f g h i j k l".to_string()];
        assert_eq!(limit_words(sentences.clone(), 0), sentences);
    }

    #[test]
    fn test_limit_words_keeps_word_sequence() {
        let sentence = (1..=23).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        let limited = limit_words(vec![sentence.clone()], 10);
        assert_eq!(limited.len(), 3);
        assert!(limited.iter().all(|s| s.split_whitespace().count() <= 10));
        assert_eq!(limited.join(" "), sentence);
    }
}
