//! Subtitle-style (`.srt`) caption rendering.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use super::{write_document, Timestamp};
use crate::error::NarrateError;

/// Format seconds as `HH:MM:SS,mmm`. Milliseconds are truncated and hours
/// are not wrapped.
pub fn format_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let whole = seconds.trunc() as u64;
    let millis = ((seconds.fract() * 1000.0) as u32).min(999);
    format!(
        "{:02}:{:02}:{:02},{:03}",
        whole / 3600,
        (whole % 3600) / 60,
        whole % 60,
        millis
    )
}

pub fn render(timestamps: &[Timestamp]) -> String {
    let mut doc = String::new();
    for (i, ts) in timestamps.iter().enumerate() {
        let _ = write!(
            doc,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_time(ts.start),
            format_time(ts.end),
            ts.text.trim()
        );
    }
    doc
}

/// Write `<folder>/<name>.srt`.
pub fn write(folder: &Path, name: &str, timestamps: &[Timestamp]) -> Result<PathBuf, NarrateError> {
    write_document(folder, name, "srt", &render(timestamps))
}
