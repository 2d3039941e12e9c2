//! Routes chunk synthesis to the backend selected for the run.

use std::path::Path;
use std::sync::Arc;

use tts_client::{create_backend, BackendKind, BackendParams, SynthesisRequest, TtsBackend, TtsError};

use crate::error::{NarrateError, SynthesisFailure};

/// Default number of attempts per chunk (no retry).
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 1;

/// The backend resolved once at startup, shared by every chunk of the run.
#[derive(Clone)]
pub struct BackendDispatcher {
    backend: Arc<dyn TtsBackend>,
    retry_attempts: u32,
}

impl BackendDispatcher {
    /// Resolve a backend id or alias. Unknown ids and backends whose tools are
    /// missing fail here, before any synthesis.
    pub fn new(backend_id: &str, params: &BackendParams) -> Result<Self, NarrateError> {
        let kind: BackendKind = backend_id
            .parse()
            .map_err(|e: TtsError| NarrateError::Configuration(e.to_string()))?;
        Self::from_kind(kind, params)
    }

    fn from_kind(kind: BackendKind, params: &BackendParams) -> Result<Self, NarrateError> {
        let backend = create_backend(kind, params)
            .map_err(|e| NarrateError::Configuration(format!("{} backend: {}", kind, e)))?;
        log::info!("Using {} backend ({})", kind, kind.description());
        Ok(Self::with_backend(Arc::from(backend)))
    }

    pub fn with_backend(backend: Arc<dyn TtsBackend>) -> Self {
        Self {
            backend,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }

    /// Attempts per chunk; values below 1 are treated as 1.
    pub fn with_retries(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// File extension of the audio the backend writes.
    pub fn output_extension(&self) -> &'static str {
        self.backend.output_extension()
    }

    /// Synthesize one chunk into `destination`, retrying per configuration.
    pub async fn synthesize(
        &self,
        chunk_index: usize,
        text: &str,
        destination: &Path,
    ) -> Result<(), SynthesisFailure> {
        let request = SynthesisRequest::new(text, destination);
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            match self.backend.synthesize(&request).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    if attempt < self.retry_attempts {
                        log::warn!(
                            "Chunk {} failed (attempt {}/{}), retrying: {}",
                            chunk_index,
                            attempt,
                            self.retry_attempts,
                            e
                        );
                    }
                    last_error = Some(e);
                }
            }
        }

        let source = last_error
            .unwrap_or_else(|| TtsError::Model("no synthesis attempt was made".to_string()));
        Err(self.failure(chunk_index, source))
    }

    /// Wrap a backend error for a chunk.
    pub fn failure(&self, chunk_index: usize, source: TtsError) -> SynthesisFailure {
        SynthesisFailure {
            backend: self.backend.name().to_string(),
            chunk_index,
            source,
        }
    }

    /// Release backend resources such as a running model host.
    pub async fn shutdown(&self) {
        if let Err(e) = self.backend.shutdown().await {
            log::warn!("{} backend shutdown failed: {}", self.backend.name(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tts_client::MockBackend;

    #[test]
    fn test_unknown_backend_is_configuration_error() {
        let err = BackendDispatcher::new("festival", &BackendParams::default())
            .err()
            .unwrap();
        match err {
            NarrateError::Configuration(msg) => assert!(msg.contains("festival")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_writes_destination() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("chunk.wav");
        let dispatcher = BackendDispatcher::with_backend(Arc::new(MockBackend::always_succeeds()));

        dispatcher.synthesize(0, "Hello.", &dest).await.unwrap();
        assert!(dest.exists());
        assert_eq!(dispatcher.backend_name(), "mock");
        assert_eq!(dispatcher.output_extension(), "wav");
    }

    #[tokio::test]
    async fn test_failure_keeps_backend_error() {
        let dir = TempDir::new().unwrap();
        let dispatcher = BackendDispatcher::with_backend(Arc::new(
            MockBackend::always_fails().with_name("edge"),
        ));

        let failure = dispatcher
            .synthesize(4, "Hello.", &dir.path().join("c.wav"))
            .await
            .unwrap_err();
        assert_eq!(failure.chunk_index, 4);
        assert_eq!(failure.backend, "edge");
        assert_eq!(dispatcher.backend_name(), "edge");
        assert!(matches!(failure.source, TtsError::Model(_)));
    }

    #[tokio::test]
    async fn test_retries_until_exhausted() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(MockBackend::always_fails());
        let dispatcher = BackendDispatcher::with_backend(backend.clone()).with_retries(3);

        assert!(dispatcher
            .synthesize(0, "Hi.", &dir.path().join("c.wav"))
            .await
            .is_err());
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_still_attempts_once() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(MockBackend::always_succeeds());
        let dispatcher = BackendDispatcher::with_backend(backend.clone()).with_retries(0);

        dispatcher
            .synthesize(0, "Hi.", &dir.path().join("c.wav"))
            .await
            .unwrap();
        assert_eq!(backend.call_count(), 1);
    }
}
