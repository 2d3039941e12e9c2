//! Per-chunk synthesis and ordered merge into one narration file.
//!
//! Chunks are synthesized into a private temp directory, up to `jobs` at a
//! time. Results are merged strictly in chunk order regardless of which call
//! finishes first. A failed chunk is logged and skipped; the run only fails
//! when nothing could be merged or the run is cancelled.

use anyhow::{Context, Result};
use futures_util::stream::{self, StreamExt};
use std::path::{Path, PathBuf};

use super::codec::AudioCodec;
use super::pcm::{PcmBuffer, DEFAULT_SAMPLE_RATE};
use crate::cancel::CancelToken;
use crate::dispatch::BackendDispatcher;
use crate::error::{NarrateError, SynthesisFailure};
use crate::text::TextChunk;
use tts_client::TtsError;

#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    /// Maximum backend calls in flight
    pub jobs: usize,
    pub sample_rate: u32,
    pub cancel: CancelToken,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            sample_rate: DEFAULT_SAMPLE_RATE,
            cancel: CancelToken::new(),
        }
    }
}

/// Result of one chunk, reported as soon as it is merged or skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkOutcome {
    Merged { index: usize, seconds: f64 },
    Failed { index: usize, message: String },
}

/// Summary of a completed assembly.
#[derive(Debug)]
pub struct AssemblyReport {
    pub output_path: PathBuf,
    /// Seconds of merged audio
    pub total_duration: f64,
    pub succeeded: usize,
    /// Indices of merged chunks, in order
    pub merged: Vec<usize>,
    pub failures: Vec<SynthesisFailure>,
}

/// Synthesize every chunk and write the merged narration to `output_path`.
///
/// Fails with [`NarrateError::EmptyOutput`] when no chunk produced audio and
/// with [`NarrateError::Cancelled`] when the token fires; neither writes an
/// output file.
pub async fn assemble<F>(
    chunks: &[TextChunk],
    dispatcher: &BackendDispatcher,
    codec: &dyn AudioCodec,
    output_path: &Path,
    options: &AssemblyOptions,
    mut on_outcome: F,
) -> Result<AssemblyReport>
where
    F: FnMut(&ChunkOutcome),
{
    let temp_dir = tempfile::Builder::new()
        .prefix("narrate-chunks-")
        .tempdir()
        .context("Failed to create temporary directory for audio chunks")?;
    let extension = dispatcher.output_extension();
    let total = chunks.len();

    let mut results = stream::iter(chunks.iter().map(|chunk| {
        let path = temp_dir
            .path()
            .join(format!("chunk_{:05}.{}", chunk.index, extension));
        let cancel = options.cancel.clone();
        async move {
            if cancel.is_cancelled() {
                return (chunk, path, None);
            }
            log::debug!(
                "Synthesizing chunk {} ({} chars)",
                chunk.index,
                chunk.text.chars().count()
            );
            let result = dispatcher.synthesize(chunk.index, &chunk.text, &path).await;
            (chunk, path, Some(result))
        }
    }))
    .buffered(options.jobs.max(1));

    let mut pcm = PcmBuffer::new(options.sample_rate);
    let mut merged = Vec::new();
    let mut failures = Vec::new();
    let mut completed = 0;

    while let Some((chunk, path, result)) = results.next().await {
        let Some(result) = result.filter(|_| !options.cancel.is_cancelled()) else {
            return Err(NarrateError::Cancelled { completed, total }.into());
        };

        let outcome = result.and_then(|()| {
            merge_chunk(codec, &path, &mut pcm).map_err(|e| dispatcher.failure(chunk.index, e))
        });
        completed += 1;

        let event = match outcome {
            Ok(seconds) => {
                merged.push(chunk.index);
                ChunkOutcome::Merged {
                    index: chunk.index,
                    seconds,
                }
            }
            Err(failure) => {
                log::warn!("Skipping chunk: {}", failure);
                if path.exists() {
                    let _ = std::fs::remove_file(&path);
                }
                let event = ChunkOutcome::Failed {
                    index: chunk.index,
                    message: failure.to_string(),
                };
                failures.push(failure);
                event
            }
        };
        on_outcome(&event);
    }
    drop(results);

    if pcm.is_empty() {
        return Err(NarrateError::EmptyOutput { attempted: total }.into());
    }

    log::info!(
        "Encoding {:.1}s of audio from {}/{} chunks to {}",
        pcm.duration_secs(),
        merged.len(),
        total,
        output_path.display()
    );
    codec
        .encode(&pcm, output_path)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    Ok(AssemblyReport {
        output_path: output_path.to_path_buf(),
        total_duration: pcm.duration_secs(),
        succeeded: merged.len(),
        merged,
        failures,
    })
}

/// Decode one chunk file into the accumulator and delete it. Returns the
/// seconds of audio added.
fn merge_chunk(codec: &dyn AudioCodec, path: &Path, pcm: &mut PcmBuffer) -> Result<f64, TtsError> {
    if !path.exists() {
        return Err(TtsError::MissingOutput(path.to_path_buf()));
    }

    let samples = codec
        .decode(path, pcm.sample_rate())
        .map_err(|e| TtsError::InvalidAudio(format!("{:#}", e)))?;
    if let Err(e) = std::fs::remove_file(path) {
        log::debug!("Could not remove {}: {}", path.display(), e);
    }
    if samples.is_empty() {
        return Err(TtsError::InvalidAudio(format!(
            "{} contains no audio",
            path.display()
        )));
    }

    pcm.append(&samples);
    Ok(samples.len() as f64 / pcm.sample_rate() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::codec::WavCodec;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tts_client::MockBackend;

    fn chunks(texts: &[&str]) -> Vec<TextChunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TextChunk::new(i, t.to_string()))
            .collect()
    }

    fn dispatcher(backend: MockBackend) -> BackendDispatcher {
        BackendDispatcher::with_backend(Arc::new(backend))
    }

    fn read_samples(path: &Path) -> Vec<i16> {
        hound::WavReader::open(path)
            .unwrap()
            .into_samples::<i16>()
            .map(|s| s.unwrap())
            .collect()
    }

    /// Expected merged samples for texts, by the mock's one-value-per-chunk scheme.
    fn expected_samples(texts: &[&str]) -> Vec<i16> {
        texts
            .iter()
            .flat_map(|t| {
                std::iter::repeat(t.chars().count() as i16).take(MockBackend::samples_for(t))
            })
            .collect()
    }

    #[tokio::test]
    async fn test_all_chunks_merged_in_order() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.wav");
        let texts = ["A.", "Bb.", "Ccc."];

        let report = assemble(
            &chunks(&texts),
            &dispatcher(MockBackend::always_succeeds()),
            &WavCodec,
            &output,
            &AssemblyOptions::default(),
            |_| {},
        )
        .await
        .unwrap();

        assert_eq!(report.succeeded, 3);
        assert_eq!(report.merged, vec![0, 1, 2]);
        assert!(report.failures.is_empty());
        assert_eq!(read_samples(&output), expected_samples(&texts));
        let expected_secs = expected_samples(&texts).len() as f64 / 24_000.0;
        assert!((report.total_duration - expected_secs).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_two_of_five_failing_keeps_the_rest_in_order() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.wav");
        let texts = ["A.", "FAIL bb.", "Ccc.", "FAIL dddd.", "Eeeee."];
        let mut events = Vec::new();

        let report = assemble(
            &chunks(&texts),
            &dispatcher(MockBackend::fails_when_text_contains("FAIL")),
            &WavCodec,
            &output,
            &AssemblyOptions::default(),
            |e| events.push(e.clone()),
        )
        .await
        .unwrap();

        assert_eq!(report.succeeded, 3);
        assert_eq!(report.merged, vec![0, 2, 4]);
        let failed: Vec<usize> = report.failures.iter().map(|f| f.chunk_index).collect();
        assert_eq!(failed, vec![1, 3]);
        assert_eq!(
            read_samples(&output),
            expected_samples(&["A.", "Ccc.", "Eeeee."])
        );

        assert_eq!(events.len(), 5);
        assert!(matches!(events[1], ChunkOutcome::Failed { index: 1, .. }));
        assert!(matches!(events[4], ChunkOutcome::Merged { index: 4, .. }));
    }

    #[tokio::test]
    async fn test_all_failing_is_empty_output_without_file() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.wav");

        let err = assemble(
            &chunks(&["a.", "b.", "c.", "d.", "e."]),
            &dispatcher(MockBackend::always_fails()),
            &WavCodec,
            &output,
            &AssemblyOptions::default(),
            |_| {},
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<NarrateError>(),
            Some(NarrateError::EmptyOutput { attempted: 5 })
        ));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_missing_file_is_a_chunk_failure() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.wav");

        let report = assemble(
            &chunks(&["QUIET one.", "Loud two."]),
            &dispatcher(MockBackend::silent_when_text_contains("QUIET")),
            &WavCodec,
            &output,
            &AssemblyOptions::default(),
            |_| {},
        )
        .await
        .unwrap();

        assert_eq!(report.merged, vec![1]);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0].source,
            TtsError::MissingOutput(_)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_jobs_preserve_order() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.wav");
        let texts = ["A.", "Bb.", "Ccc.", "Dddd.", "Eeeee.", "Ffffff.", "Ggggggg."];
        let options = AssemblyOptions {
            jobs: 4,
            ..AssemblyOptions::default()
        };

        let report = assemble(
            &chunks(&texts),
            &dispatcher(MockBackend::always_succeeds()),
            &WavCodec,
            &output,
            &options,
            |_| {},
        )
        .await
        .unwrap();

        assert_eq!(report.merged, (0..texts.len()).collect::<Vec<_>>());
        assert_eq!(read_samples(&output), expected_samples(&texts));
    }

    #[tokio::test]
    async fn test_cancelled_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.wav");
        let backend = Arc::new(MockBackend::always_succeeds());
        let options = AssemblyOptions::default();
        options.cancel.cancel();

        let err = assemble(
            &chunks(&["a.", "b.", "c."]),
            &BackendDispatcher::with_backend(backend.clone()),
            &WavCodec,
            &output,
            &options,
            |_| {},
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<NarrateError>(),
            Some(NarrateError::Cancelled { completed: 0, total: 3 })
        ));
        assert_eq!(backend.call_count(), 0);
        assert!(!output.exists());
    }
}
