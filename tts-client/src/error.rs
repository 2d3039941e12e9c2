use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TtsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend not available: {0}")]
    Unavailable(String),

    #[error("{program} failed{}: {stderr}", .status.map(|c| format!(" (exit code {})", c)).unwrap_or_default())]
    Process {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("API error{}: {message}", .status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Model error: {0}")]
    Model(String),

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("No audio written to {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("Unreadable audio: {0}")]
    InvalidAudio(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TtsError>;
