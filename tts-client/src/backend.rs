use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::Result;

/// One unit of text to be rendered into an audio file
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    pub output_path: PathBuf,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            text: text.into(),
            output_path: output_path.into(),
        }
    }
}

/// Trait for speech synthesis backends
#[async_trait]
pub trait TtsBackend: Send + Sync {
    /// Render the request's text to an audio file at its output path
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<()>;

    /// Backend identifier for logs and failure reports
    fn name(&self) -> &'static str;

    /// File extension of the audio this backend writes
    fn output_extension(&self) -> &'static str;

    /// Check that external dependencies (executables, interpreters) are present
    fn is_available(&self) -> Result<()>;

    /// Release run-scoped resources such as loaded models
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}
