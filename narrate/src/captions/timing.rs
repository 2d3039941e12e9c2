//! Proportional caption timing.
//!
//! Backends report no per-word timing, so each segment gets a share of the
//! total narration duration proportional to its word count.

use crate::error::NarrateError;
use crate::text::word_count;

/// A caption segment with its time range in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Timestamp {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// Distribute `total_duration` across segments by word count.
///
/// The durations sum to `total_duration` up to floating point error. The
/// total must be positive so every segment with words gets a non-empty span.
pub fn allocate_durations(
    sentences: &[String],
    total_duration: f64,
) -> Result<Vec<f64>, NarrateError> {
    if !total_duration.is_finite() || total_duration <= 0.0 {
        return Err(NarrateError::Configuration(format!(
            "Invalid total duration: {}",
            total_duration
        )));
    }

    let words: Vec<usize> = sentences.iter().map(|s| word_count(s)).collect();
    let total_words: usize = words.iter().sum();
    if total_words == 0 {
        return Err(NarrateError::NoContent);
    }

    Ok(words
        .into_iter()
        .map(|w| w as f64 / total_words as f64 * total_duration)
        .collect())
}

/// Lay segments end to end starting at `initial_delay`.
pub fn build_timestamps(
    sentences: &[String],
    durations: &[f64],
    initial_delay: f64,
) -> Vec<Timestamp> {
    let mut start = initial_delay;
    sentences
        .iter()
        .zip(durations)
        .map(|(text, duration)| {
            let end = start + duration;
            let ts = Timestamp {
                text: text.clone(),
                start,
                end,
            };
            start = end;
            ts
        })
        .collect()
}
