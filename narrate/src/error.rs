//! Error types for a narration run.

use std::path::PathBuf;
use thiserror::Error;
use tts_client::TtsError;

/// Run-level failures surfaced to the caller.
#[derive(Error, Debug)]
pub enum NarrateError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No audio produced: all {attempted} chunk(s) failed")]
    EmptyOutput { attempted: usize },

    #[error("No content: the text contains no words")]
    NoContent,

    #[error("Filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cancelled after {completed} of {total} chunk(s)")]
    Cancelled { completed: usize, total: usize },
}

impl NarrateError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// One chunk's synthesis failure, normalized across backends.
///
/// The backend's own error is kept as the source so the cause chain survives.
#[derive(Error, Debug)]
#[error("{backend} failed on chunk {chunk_index}: {source}")]
pub struct SynthesisFailure {
    pub backend: String,
    pub chunk_index: usize,
    #[source]
    pub source: TtsError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_synthesis_failure_keeps_cause() {
        let failure = SynthesisFailure {
            backend: "edge".to_string(),
            chunk_index: 3,
            source: TtsError::Timeout(30),
        };
        assert_eq!(
            failure.to_string(),
            "edge failed on chunk 3: Timed out after 30 seconds"
        );
        let cause = failure.source().unwrap();
        assert_eq!(cause.to_string(), "Timed out after 30 seconds");
    }

    #[test]
    fn test_filesystem_message() {
        let err = NarrateError::filesystem(
            "/readonly/out.srt",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied"),
        );
        assert_eq!(
            err.to_string(),
            "Filesystem error at /readonly/out.srt: permission denied"
        );
    }
}
