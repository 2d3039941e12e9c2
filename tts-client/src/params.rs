//! Per-backend synthesis parameters with documented defaults.
//!
//! Every field is defaulted so a partial `[backends.*]` table in a config file
//! deserializes cleanly.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default timeout for one request to the Python model host.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Parameters for every backend variant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendParams {
    #[serde(default)]
    pub melo: MeloParams,

    #[serde(default)]
    pub xtts: XttsParams,

    #[serde(default)]
    pub google: GoogleParams,

    #[serde(default)]
    pub edge: EdgeParams,
}

/// MeloTTS (local neural model A)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeloParams {
    /// Speaking rate multiplier
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Melo language code (EN, ES, FR, ZH, JP, KR)
    #[serde(default = "default_melo_language")]
    pub language: String,

    /// Speaker id within the language's speaker table
    #[serde(default = "default_melo_speaker")]
    pub speaker: String,

    /// Torch device: auto, cpu, cuda, mps
    #[serde(default = "default_device")]
    pub device: String,

    /// Python interpreter that has MeloTTS installed
    #[serde(default = "default_python")]
    pub python: PathBuf,

    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

/// Coqui XTTS v2 (local neural model B)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XttsParams {
    #[serde(default = "default_speed")]
    pub speed: f32,

    #[serde(default = "default_xtts_language")]
    pub language: String,

    /// Coqui model name
    #[serde(default = "default_xtts_model")]
    pub model: String,

    /// Built-in speaker, used when no `speaker_wav` is given
    #[serde(default = "default_xtts_speaker")]
    pub speaker: String,

    /// Reference recording for voice cloning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_wav: Option<PathBuf>,

    #[serde(default = "default_python")]
    pub python: PathBuf,

    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

/// Google Translate TTS (cloud API)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleParams {
    /// IETF language tag understood by the endpoint
    #[serde(default = "default_google_lang")]
    pub lang: String,

    /// Top-level domain of the Google host (com, co.uk, com.au, ...)
    #[serde(default = "default_google_tld")]
    pub tld: String,

    /// Request the slower reading speed
    #[serde(default)]
    pub slow: bool,

    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

/// edge-tts command line tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeParams {
    /// Neural voice short name
    #[serde(default = "default_edge_voice")]
    pub voice: String,

    /// Rate adjustment in edge-tts syntax, e.g. "+10%"
    #[serde(default = "default_edge_rate")]
    pub rate: String,

    /// Path to the edge-tts executable (default: looked up on PATH)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli_path: Option<PathBuf>,
}

fn default_speed() -> f32 {
    1.0
}

fn default_device() -> String {
    "auto".to_string()
}

fn default_python() -> PathBuf {
    PathBuf::from("python3")
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_http_timeout() -> u64 {
    30
}

fn default_melo_language() -> String {
    "EN".to_string()
}

fn default_melo_speaker() -> String {
    "EN-BR".to_string()
}

fn default_xtts_language() -> String {
    "en".to_string()
}

fn default_xtts_model() -> String {
    "tts_models/multilingual/multi-dataset/xtts_v2".to_string()
}

fn default_xtts_speaker() -> String {
    "Ana Florence".to_string()
}

fn default_google_lang() -> String {
    "en".to_string()
}

fn default_google_tld() -> String {
    "us".to_string()
}

fn default_edge_voice() -> String {
    "pt-BR-ThalitaNeural".to_string()
}

fn default_edge_rate() -> String {
    "+0%".to_string()
}

impl Default for MeloParams {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            language: default_melo_language(),
            speaker: default_melo_speaker(),
            device: default_device(),
            python: default_python(),
            timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for XttsParams {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            language: default_xtts_language(),
            model: default_xtts_model(),
            speaker: default_xtts_speaker(),
            speaker_wav: None,
            python: default_python(),
            timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for GoogleParams {
    fn default() -> Self {
        Self {
            lang: default_google_lang(),
            tld: default_google_tld(),
            slow: false,
            timeout_secs: default_http_timeout(),
        }
    }
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            voice: default_edge_voice(),
            rate: default_edge_rate(),
            cli_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = BackendParams::default();
        assert_eq!(params.melo.speed, 1.0);
        assert_eq!(params.melo.language, "EN");
        assert_eq!(params.melo.speaker, "EN-BR");
        assert_eq!(params.xtts.language, "en");
        assert!(params.xtts.speaker_wav.is_none());
        assert_eq!(params.google.tld, "us");
        assert!(!params.google.slow);
        assert_eq!(params.edge.voice, "pt-BR-ThalitaNeural");
    }

    #[test]
    fn test_partial_table() {
        let toml_str = r#"
[melo]
speed = 1.25

[edge]
voice = "en-US-AriaNeural"
"#;
        let params: BackendParams = toml::from_str(toml_str).unwrap();
        assert_eq!(params.melo.speed, 1.25);
        assert_eq!(params.melo.speaker, "EN-BR");
        assert_eq!(params.edge.voice, "en-US-AriaNeural");
        assert_eq!(params.edge.rate, "+0%");
        assert_eq!(params.google, GoogleParams::default());
    }

    #[test]
    fn test_empty_table() {
        let params: BackendParams = toml::from_str("").unwrap();
        assert_eq!(params, BackendParams::default());
    }
}
