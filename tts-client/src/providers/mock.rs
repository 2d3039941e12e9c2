//! Mock backend for testing
//!
//! Writes a short mono WAV per request. Every sample of a request's audio
//! equals the request text's character count, which lets tests check the
//! order in which chunks were merged. Failures are triggered by marker
//! substrings in the request text so they stay deterministic under
//! concurrent dispatch.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::{SynthesisRequest, TtsBackend};
use crate::error::{Result, TtsError};

/// A mock backend for testing failure isolation and merge order
pub struct MockBackend {
    /// Requests containing this text fail with a model error
    fail_marker: Option<String>,
    /// Requests containing this text succeed without writing a file
    silent_marker: Option<String>,
    /// Current call count
    call_count: AtomicUsize,
    /// Backend name for display
    name: &'static str,
}

impl MockBackend {
    /// Sample rate of the audio the mock writes.
    pub const SAMPLE_RATE: u32 = 24_000;

    /// Samples written per character of request text.
    pub const SAMPLES_PER_CHAR: usize = 10;

    /// Create a backend that always succeeds
    pub fn always_succeeds() -> Self {
        Self {
            fail_marker: None,
            silent_marker: None,
            call_count: AtomicUsize::new(0),
            name: "mock",
        }
    }

    /// Create a backend that fails every request
    pub fn always_fails() -> Self {
        Self {
            fail_marker: Some(String::new()),
            ..Self::always_succeeds()
        }
    }

    /// Create a backend that fails requests whose text contains `marker`
    pub fn fails_when_text_contains(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Self::always_succeeds()
        }
    }

    /// Create a backend that reports success but writes nothing for requests
    /// whose text contains `marker`
    pub fn silent_when_text_contains(marker: &str) -> Self {
        Self {
            silent_marker: Some(marker.to_string()),
            ..Self::always_succeeds()
        }
    }

    /// Get the number of times synthesize() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Set a custom backend name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Number of samples the mock writes for `text`
    pub fn samples_for(text: &str) -> usize {
        text.chars().count() * Self::SAMPLES_PER_CHAR
    }

    fn write_wav(request: &SynthesisRequest) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: Self::SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let value = request.text.chars().count().min(i16::MAX as usize) as i16;

        let mut writer = hound::WavWriter::create(&request.output_path, spec)
            .map_err(|e| TtsError::InvalidAudio(e.to_string()))?;
        for _ in 0..Self::samples_for(&request.text) {
            writer
                .write_sample(value)
                .map_err(|e| TtsError::InvalidAudio(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| TtsError::InvalidAudio(e.to_string()))
    }
}

#[async_trait]
impl TtsBackend for MockBackend {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<()> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(ref marker) = self.fail_marker {
            if request.text.contains(marker.as_str()) {
                return Err(TtsError::Model(format!(
                    "mock failure for {:?}",
                    request.text
                )));
            }
        }

        if let Some(ref marker) = self.silent_marker {
            if request.text.contains(marker.as_str()) {
                return Ok(());
            }
        }

        Self::write_wav(request)
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn output_extension(&self) -> &'static str {
        "wav"
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_always_succeeds_writes_wav() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.wav");
        let backend = MockBackend::always_succeeds();

        backend
            .synthesize(&SynthesisRequest::new("Hello.", &path))
            .await
            .unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, MockBackend::SAMPLE_RATE);
        let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), MockBackend::samples_for("Hello."));
        assert!(samples.iter().all(|&s| s == 6));
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_always_fails() {
        let dir = TempDir::new().unwrap();
        let backend = MockBackend::always_fails();

        for i in 0..3 {
            let path = dir.path().join(format!("{}.wav", i));
            let result = backend.synthesize(&SynthesisRequest::new("Hi.", &path)).await;
            assert!(matches!(result, Err(TtsError::Model(_))));
            assert!(!path.exists());
        }
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn test_markers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.wav");

        let failing = MockBackend::fails_when_text_contains("BAD");
        assert!(failing.synthesize(&SynthesisRequest::new("a BAD one.", &path)).await.is_err());
        assert!(failing.synthesize(&SynthesisRequest::new("a good one.", &path)).await.is_ok());

        let silent = MockBackend::silent_when_text_contains("QUIET");
        let quiet_path = dir.path().join("quiet.wav");
        silent
            .synthesize(&SynthesisRequest::new("QUIET please.", &quiet_path))
            .await
            .unwrap();
        assert!(!quiet_path.exists());
    }
}
