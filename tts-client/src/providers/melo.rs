//! MeloTTS backend
//!
//! Runs MeloTTS inside a persistent Python model host so the model is loaded
//! once per run rather than once per chunk.

use async_trait::async_trait;
use serde_json::json;

use super::python_host::ModelHost;
use crate::backend::{SynthesisRequest, TtsBackend};
use crate::error::{Result, TtsError};
use crate::params::MeloParams;

/// Local MeloTTS model
pub struct MeloBackend {
    params: MeloParams,
    host: ModelHost,
}

impl MeloBackend {
    pub fn new(params: MeloParams) -> Result<Self> {
        if !(params.speed > 0.0) {
            return Err(TtsError::Config(format!(
                "melo speed must be positive, got {}",
                params.speed
            )));
        }

        let host = ModelHost::new(
            "melo",
            params.python.clone(),
            params.timeout_secs,
            json!({
                "engine": "melo",
                "language": params.language,
                "device": params.device,
            }),
        );

        Ok(Self { params, host })
    }
}

#[async_trait]
impl TtsBackend for MeloBackend {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<()> {
        self.host
            .synthesize(json!({
                "text": request.text,
                "output": request.output_path,
                "speaker": self.params.speaker,
                "speed": self.params.speed,
            }))
            .await
    }

    fn name(&self) -> &'static str {
        "melo"
    }

    fn output_extension(&self) -> &'static str {
        "wav"
    }

    fn is_available(&self) -> Result<()> {
        which::which(self.host.python()).map_err(|_| {
            TtsError::Unavailable(format!(
                "Python interpreter not found: {} (set backends.melo.python)",
                self.host.python().display()
            ))
        })?;
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        self.host.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive_speed() {
        let params = MeloParams {
            speed: 0.0,
            ..MeloParams::default()
        };
        assert!(matches!(MeloBackend::new(params), Err(TtsError::Config(_))));
    }

    #[test]
    fn test_missing_interpreter() {
        let params = MeloParams {
            python: "/nonexistent/bin/python3".into(),
            ..MeloParams::default()
        };
        let backend = MeloBackend::new(params).unwrap();
        assert!(matches!(backend.is_available(), Err(TtsError::Unavailable(_))));
        assert_eq!(backend.output_extension(), "wav");
    }
}
