//! edge-tts backend
//!
//! Shells out to the `edge-tts` command line tool.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

use crate::backend::{SynthesisRequest, TtsBackend};
use crate::error::{Result, TtsError};
use crate::params::EdgeParams;

/// Provider that runs the edge-tts executable per request
pub struct EdgeBackend {
    params: EdgeParams,
    cli_path: PathBuf,
}

impl EdgeBackend {
    /// Create a new edge-tts backend
    ///
    /// Returns an error if the executable is not found.
    pub fn new(params: EdgeParams) -> Result<Self> {
        let cli_path = match params.cli_path.clone() {
            Some(path) => {
                if !path.exists() {
                    return Err(TtsError::Unavailable(format!(
                        "edge-tts not found at specified path: {}",
                        path.display()
                    )));
                }
                path
            }
            None => which::which("edge-tts").map_err(|_| {
                TtsError::Unavailable(
                    "edge-tts not found. Install with: pip install edge-tts".into(),
                )
            })?,
        };

        Ok(Self { params, cli_path })
    }

    /// Arguments for one invocation. Values go after `=` so text or rates
    /// starting with `-` are not mistaken for flags.
    fn args(&self, request: &SynthesisRequest) -> Vec<String> {
        vec![
            format!("--voice={}", self.params.voice),
            format!("--rate={}", self.params.rate),
            format!("--text={}", request.text),
            format!("--write-media={}", request.output_path.display()),
        ]
    }
}

#[async_trait]
impl TtsBackend for EdgeBackend {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<()> {
        let output = Command::new(&self.cli_path)
            .args(self.args(request))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TtsError::Process {
                program: "edge-tts".into(),
                status: None,
                stderr: format!("Failed to execute: {}", e),
            })?;

        if !output.status.success() {
            return Err(TtsError::Process {
                program: "edge-tts".into(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "edge"
    }

    fn output_extension(&self) -> &'static str {
        "mp3"
    }

    fn is_available(&self) -> Result<()> {
        // Checked in constructor
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_explicit_path() {
        let params = EdgeParams {
            cli_path: Some("/nonexistent/edge-tts".into()),
            ..EdgeParams::default()
        };
        assert!(matches!(
            EdgeBackend::new(params),
            Err(TtsError::Unavailable(_))
        ));
    }

    #[test]
    fn test_args_use_equals_form() {
        let backend = EdgeBackend {
            params: EdgeParams {
                rate: "-10%".to_string(),
                ..EdgeParams::default()
            },
            cli_path: PathBuf::from("edge-tts"),
        };
        let request = SynthesisRequest::new("-5 degrees outside.", "/tmp/out.mp3");
        let args = backend.args(&request);
        assert_eq!(
            args,
            vec![
                "--voice=pt-BR-ThalitaNeural",
                "--rate=-10%",
                "--text=-5 degrees outside.",
                "--write-media=/tmp/out.mp3",
            ]
        );
    }
}
