//! In-memory PCM accumulator for one narration.

use anyhow::{Context, Result};
use std::path::Path;

/// Default sample rate of the merged narration.
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// Mono 16-bit PCM at a fixed sample rate.
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    sample_rate: u32,
    samples: Vec<i16>,
}

impl PcmBuffer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples: Vec::new(),
        }
    }

    pub fn append(&mut self, samples: &[i16]) {
        self.samples.extend_from_slice(samples);
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length of the buffered audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Write the buffer as a mono 16-bit WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer
            .finalize()
            .with_context(|| format!("Failed to finalize {}", path.display()))?;
        Ok(())
    }
}
