//! Coqui XTTS v2 backend
//!
//! Supports voice cloning from a reference recording. Like MeloTTS it runs in
//! a persistent Python model host.

use async_trait::async_trait;
use serde_json::json;

use super::python_host::ModelHost;
use crate::backend::{SynthesisRequest, TtsBackend};
use crate::error::{Result, TtsError};
use crate::params::XttsParams;

/// Local Coqui XTTS model
pub struct XttsBackend {
    params: XttsParams,
    host: ModelHost,
}

impl XttsBackend {
    pub fn new(params: XttsParams) -> Result<Self> {
        if !(params.speed > 0.0) {
            return Err(TtsError::Config(format!(
                "xtts speed must be positive, got {}",
                params.speed
            )));
        }

        if let Some(ref wav) = params.speaker_wav {
            if !wav.exists() {
                return Err(TtsError::Config(format!(
                    "xtts speaker_wav not found: {}",
                    wav.display()
                )));
            }
        }

        let host = ModelHost::new(
            "xtts",
            params.python.clone(),
            params.timeout_secs,
            json!({
                "engine": "xtts",
                "model": params.model,
            }),
        );

        Ok(Self { params, host })
    }
}

#[async_trait]
impl TtsBackend for XttsBackend {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<()> {
        self.host
            .synthesize(json!({
                "text": request.text,
                "output": request.output_path,
                "language": self.params.language,
                "speaker": self.params.speaker,
                "speaker_wav": self.params.speaker_wav,
                "speed": self.params.speed,
            }))
            .await
    }

    fn name(&self) -> &'static str {
        "xtts"
    }

    fn output_extension(&self) -> &'static str {
        "wav"
    }

    fn is_available(&self) -> Result<()> {
        which::which(self.host.python()).map_err(|_| {
            TtsError::Unavailable(format!(
                "Python interpreter not found: {} (set backends.xtts.python)",
                self.host.python().display()
            ))
        })?;
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        self.host.shutdown().await
    }
}
