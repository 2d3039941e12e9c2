//! Caption generation: sentence segments timed against the narration length.

pub mod lrc;
pub mod srt;
pub mod timing;

use std::path::{Path, PathBuf};

use crate::error::NarrateError;
use crate::text::sentences::{limit_words, split_into_sentences};
use crate::text::word_count;

pub use timing::{allocate_durations, build_timestamps, Timestamp};

/// Silence before the first caption, in seconds.
pub const DEFAULT_INITIAL_DELAY: f64 = 0.5;

/// Longest caption segment, in words.
pub const DEFAULT_MAX_WORDS_PER_CAPTION: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct CaptionOptions {
    pub initial_delay: f64,
    /// 0 keeps whole sentences
    pub max_words_per_caption: usize,
}

impl Default for CaptionOptions {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_words_per_caption: DEFAULT_MAX_WORDS_PER_CAPTION,
        }
    }
}

/// Paths of the caption files written for one narration.
#[derive(Debug, Clone)]
pub struct CaptionFiles {
    pub srt: PathBuf,
    pub lrc: PathBuf,
    pub count: usize,
}

/// Split text into caption segments. Segments without words are dropped so
/// every caption gets a non-zero duration.
pub fn caption_segments(text: &str, max_words: usize) -> anyhow::Result<Vec<String>> {
    let sentences = split_into_sentences(text)?;
    Ok(limit_words(sentences, max_words)
        .into_iter()
        .filter(|s| word_count(s) > 0)
        .collect())
}

/// Time caption segments across `total_duration` seconds of audio.
pub fn timestamps_for(
    text: &str,
    total_duration: f64,
    options: &CaptionOptions,
) -> anyhow::Result<Vec<Timestamp>> {
    let segments = caption_segments(text, options.max_words_per_caption)?;
    let durations = allocate_durations(&segments, total_duration)?;
    Ok(build_timestamps(&segments, &durations, options.initial_delay))
}

/// Write `<folder>/<name>.srt` and `<folder>/<name>.lrc` for the narrated text.
pub fn generate_captions(
    text: &str,
    total_duration: f64,
    options: &CaptionOptions,
    folder: &Path,
    name: &str,
) -> anyhow::Result<CaptionFiles> {
    let timestamps = timestamps_for(text, total_duration, options)?;
    log::info!(
        "Writing {} caption(s) over {:.2}s",
        timestamps.len(),
        total_duration
    );

    let srt = srt::write(folder, name, &timestamps)?;
    let lrc = lrc::write(folder, name, &timestamps)?;

    Ok(CaptionFiles {
        srt,
        lrc,
        count: timestamps.len(),
    })
}

/// The output folder must already exist; it is never created here.
fn write_document(
    folder: &Path,
    name: &str,
    extension: &str,
    content: &str,
) -> Result<PathBuf, NarrateError> {
    let path = folder.join(format!("{}.{}", name, extension));
    if !folder.is_dir() {
        return Err(NarrateError::filesystem(
            folder,
            std::io::Error::new(std::io::ErrorKind::NotFound, "output folder does not exist"),
        ));
    }
    std::fs::write(&path, content).map_err(|e| NarrateError::filesystem(&path, e))?;
    log::debug!("Wrote {}", path.display());
    Ok(path)
}
