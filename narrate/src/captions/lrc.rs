//! Lyric-style (`.lrc`) caption rendering. Only start times are encoded.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use super::{write_document, Timestamp};
use crate::error::NarrateError;

/// Format seconds as `MM:SS.cc` with total minutes and truncated centiseconds.
pub fn format_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let whole = seconds.trunc() as u64;
    let centis = ((seconds.fract() * 100.0) as u32).min(99);
    format!("{:02}:{:02}.{:02}", whole / 60, whole % 60, centis)
}

pub fn render(timestamps: &[Timestamp]) -> String {
    let mut doc = String::new();
    for ts in timestamps {
        let _ = writeln!(doc, "[{}] {}", format_time(ts.start), ts.text.trim());
    }
    doc
}

/// Write `<folder>/<name>.lrc`.
pub fn write(folder: &Path, name: &str, timestamps: &[Timestamp]) -> Result<PathBuf, NarrateError> {
    write_document(folder, name, "lrc", &render(timestamps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.5), "00:00.50");
        assert_eq!(format_time(65.129), "01:05.12");
        assert_eq!(format_time(3600.0), "60:00.00");
    }

    #[test]
    fn test_render_line() {
        let ts = vec![Timestamp {
            text: "text".to_string(),
            start: 0.5,
            end: 3.0,
        }];
        assert_eq!(render(&ts), "[00:00.50] text\n");
    }

    #[test]
    fn test_write_file() {
        let dir = TempDir::new().unwrap();
        let ts = vec![Timestamp {
            text: "Hello".to_string(),
            start: 1.0,
            end: 2.0,
        }];
        let path = write(dir.path(), "story", &ts).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "[00:01.00] Hello\n");
    }
}
