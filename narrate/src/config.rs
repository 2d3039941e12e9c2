//! narrate configuration management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tts_client::BackendParams;

use crate::audio::{OutputFormat, DEFAULT_SAMPLE_RATE};
use crate::captions::{DEFAULT_INITIAL_DELAY, DEFAULT_MAX_WORDS_PER_CAPTION};
use crate::dispatch::DEFAULT_RETRY_ATTEMPTS;
use crate::error::NarrateError;
use crate::text::chunker::DEFAULT_MAX_CHUNK_SIZE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrateConfig {
    /// Backend id or alias (melo, xtts, google, edge)
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Maximum characters per synthesis request
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Write .srt and .lrc captions next to the audio
    #[serde(default)]
    pub captions: bool,

    #[serde(default)]
    pub format: OutputFormat,

    /// Seconds of silence assumed before the first caption
    #[serde(default = "default_initial_delay")]
    pub initial_delay: f64,

    /// Longest caption in words (0 keeps whole sentences)
    #[serde(default = "default_max_words_per_caption")]
    pub max_words_per_caption: usize,

    /// Concurrent backend calls
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Attempts per chunk before it is skipped
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Sample rate of the merged narration
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: PathBuf,

    /// Per-backend parameters
    #[serde(default)]
    pub backends: BackendParams,
}

fn default_backend() -> String {
    "google".to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_MAX_CHUNK_SIZE
}

fn default_initial_delay() -> f64 {
    DEFAULT_INITIAL_DELAY
}

fn default_max_words_per_caption() -> usize {
    DEFAULT_MAX_WORDS_PER_CAPTION
}

fn default_jobs() -> usize {
    1
}

fn default_retry_attempts() -> u32 {
    DEFAULT_RETRY_ATTEMPTS
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe() -> PathBuf {
    PathBuf::from("ffprobe")
}

impl Default for NarrateConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            chunk_size: default_chunk_size(),
            captions: false,
            format: OutputFormat::default(),
            initial_delay: default_initial_delay(),
            max_words_per_caption: default_max_words_per_caption(),
            jobs: default_jobs(),
            retry_attempts: default_retry_attempts(),
            sample_rate: default_sample_rate(),
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            backends: BackendParams::default(),
        }
    }
}

impl NarrateConfig {
    /// Get the config file path: <config dir>/cli-programs/narrate.toml
    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Could not determine the config directory")?;
        Ok(dir.join("cli-programs").join("narrate.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: NarrateConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        log::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Reject settings that would make a run meaningless.
    pub fn validate(&self) -> Result<(), NarrateError> {
        if self.chunk_size == 0 {
            return Err(NarrateError::Configuration(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.jobs == 0 {
            return Err(NarrateError::Configuration(
                "jobs must be at least 1".to_string(),
            ));
        }
        if self.sample_rate == 0 {
            return Err(NarrateError::Configuration(
                "sample_rate must be greater than 0".to_string(),
            ));
        }
        if !self.initial_delay.is_finite() || self.initial_delay < 0.0 {
            return Err(NarrateError::Configuration(format!(
                "initial_delay must be a non-negative number of seconds, got {}",
                self.initial_delay
            )));
        }
        Ok(())
    }
}
