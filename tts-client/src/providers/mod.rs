//! Backend implementations and the static backend registry

mod edge;
mod google;
mod melo;
pub mod mock;
mod python_host;
mod xtts;

pub use edge::EdgeBackend;
pub use google::GoogleBackend;
pub use melo::MeloBackend;
pub use mock::MockBackend;
pub use xtts::XttsBackend;

use std::fmt;
use std::str::FromStr;

use crate::backend::TtsBackend;
use crate::error::{Result, TtsError};
use crate::params::BackendParams;

/// Supported backend variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Melo,
    Xtts,
    Google,
    Edge,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [Self::Melo, Self::Xtts, Self::Google, Self::Edge];

    /// Canonical identifier used on the command line and in config files
    pub fn id(&self) -> &'static str {
        match self {
            Self::Melo => "melo",
            Self::Xtts => "xtts",
            Self::Google => "google",
            Self::Edge => "edge",
        }
    }

    /// One-line description for listings
    pub fn description(&self) -> &'static str {
        match self {
            Self::Melo => "MeloTTS local model (Python host, wav)",
            Self::Xtts => "Coqui XTTS v2 local model with voice cloning (Python host, wav)",
            Self::Google => "Google Translate TTS cloud endpoint (mp3)",
            Self::Edge => "edge-tts command line tool (mp3)",
        }
    }
}

impl FromStr for BackendKind {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "melo" | "mello" | "melotts" => Ok(Self::Melo),
            "xtts" | "coqui" | "coqui-xtts" | "coqui_xtts" => Ok(Self::Xtts),
            "google" | "gtts" => Ok(Self::Google),
            "edge" | "edge-tts" | "edge_tts" => Ok(Self::Edge),
            _ => Err(TtsError::Config(format!(
                "Unknown backend: {} (expected one of: melo, xtts, google, edge)",
                s
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Create a backend instance from its kind and the configured parameters
pub fn create_backend(kind: BackendKind, params: &BackendParams) -> Result<Box<dyn TtsBackend>> {
    let backend: Box<dyn TtsBackend> = match kind {
        BackendKind::Melo => Box::new(MeloBackend::new(params.melo.clone())?),
        BackendKind::Xtts => Box::new(XttsBackend::new(params.xtts.clone())?),
        BackendKind::Google => Box::new(GoogleBackend::new(params.google.clone())?),
        BackendKind::Edge => Box::new(EdgeBackend::new(params.edge.clone())?),
    };
    backend.is_available()?;
    Ok(backend)
}
