//! Speech synthesis backends for the narrate workspace
//!
//! Provides a unified interface over interchangeable TTS engines:
//! - MeloTTS (local neural model, Python model host)
//! - Coqui XTTS v2 (local neural model, Python model host)
//! - Google Translate TTS (cloud endpoint)
//! - edge-tts (system command)

pub mod backend;
pub mod error;
pub mod params;
pub mod providers;

pub use backend::{SynthesisRequest, TtsBackend};
pub use error::{Result, TtsError};
pub use params::{BackendParams, EdgeParams, GoogleParams, MeloParams, XttsParams};
pub use providers::{BackendKind, MockBackend, create_backend};
