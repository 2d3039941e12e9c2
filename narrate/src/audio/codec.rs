//! Decoding backend audio to PCM and encoding the merged narration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use super::pcm::PcmBuffer;

/// Container of the final narration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp3,
    M4a,
    Wav,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::M4a => "m4a",
            OutputFormat::Wav => "wav",
        }
    }

    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("mp3") => Ok(OutputFormat::Mp3),
            Some("m4a") => Ok(OutputFormat::M4a),
            Some("wav") => Ok(OutputFormat::Wav),
            _ => anyhow::bail!("Unsupported output file: {}", path.display()),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Converts between audio files and mono 16-bit PCM.
pub trait AudioCodec: Send + Sync {
    /// Decode a file to mono samples at `sample_rate`.
    fn decode(&self, path: &Path, sample_rate: u32) -> Result<Vec<i16>>;

    /// Encode the buffer to `output`, choosing the container by extension.
    fn encode(&self, pcm: &PcmBuffer, output: &Path) -> Result<()>;
}

/// WAV-only codec backed by `hound`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavCodec;

impl AudioCodec for WavCodec {
    fn decode(&self, path: &Path, sample_rate: u32) -> Result<Vec<i16>> {
        let reader = hound::WavReader::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let spec = reader.spec();
        if spec.sample_rate != sample_rate {
            anyhow::bail!(
                "{} is {} Hz, expected {} Hz",
                path.display(),
                spec.sample_rate,
                sample_rate
            );
        }

        let interleaved: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Int, 16) => reader
                .into_samples::<i16>()
                .collect::<std::result::Result<_, _>>()?,
            (hound::SampleFormat::Int, bits) => {
                let shift = bits.saturating_sub(16);
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| scale_int(v, bits, shift)))
                    .collect::<std::result::Result<_, _>>()?
            }
            (hound::SampleFormat::Float, _) => reader
                .into_samples::<f32>()
                .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
                .collect::<std::result::Result<_, _>>()?,
        };

        Ok(downmix(&interleaved, spec.channels))
    }

    fn encode(&self, pcm: &PcmBuffer, output: &Path) -> Result<()> {
        match OutputFormat::from_path(output)? {
            OutputFormat::Wav => pcm.write_wav(output),
            other => anyhow::bail!("WAV codec cannot write {} output", other),
        }
    }
}

fn scale_int(value: i32, bits: u16, shift: u16) -> i16 {
    if bits < 16 {
        (value << (16 - bits)) as i16
    } else {
        (value >> shift) as i16
    }
}

fn downmix(interleaved: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

/// Codec that shells out to `ffmpeg` for any container it supports.
#[derive(Debug, Clone)]
pub struct FfmpegCodec {
    ffmpeg: PathBuf,
}

impl FfmpegCodec {
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Check that the configured ffmpeg runs.
    pub fn is_available(&self) -> bool {
        Command::new(&self.ffmpeg)
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn run(&self, cmd: &mut Command, what: &str) -> Result<Vec<u8>> {
        let output = cmd
            .output()
            .with_context(|| format!("Failed to run ffmpeg {}", what))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("ffmpeg {} failed: {}", what, stderr.trim());
        }
        Ok(output.stdout)
    }
}

impl AudioCodec for FfmpegCodec {
    fn decode(&self, path: &Path, sample_rate: u32) -> Result<Vec<i16>> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-v", "error", "-i"])
            .arg(path)
            .args(["-f", "s16le", "-acodec", "pcm_s16le", "-ac", "1", "-ar"])
            .arg(sample_rate.to_string())
            .arg("-");

        let bytes = self.run(&mut cmd, "decode")?;
        Ok(bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect())
    }

    fn encode(&self, pcm: &PcmBuffer, output: &Path) -> Result<()> {
        let codec_args: &[&str] = match OutputFormat::from_path(output)? {
            OutputFormat::Wav => return pcm.write_wav(output),
            OutputFormat::Mp3 => &["-c:a", "libmp3lame", "-b:a", "128k"],
            OutputFormat::M4a => &["-c:a", "aac", "-b:a", "128k", "-f", "mp4"],
        };

        let temp_dir = TempDir::new()?;
        let wav = temp_dir.path().join("narration.wav");
        pcm.write_wav(&wav)?;

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-y", "-v", "error", "-i"])
            .arg(&wav)
            .args(codec_args)
            .arg(output);
        self.run(&mut cmd, "encode")?;
        Ok(())
    }
}

/// Duration of an audio file in seconds.
///
/// WAV files are measured directly; anything else goes through ffprobe.
pub fn probe_duration_secs(ffprobe: &Path, audio_path: &Path) -> Result<f64> {
    if audio_path.extension().and_then(|e| e.to_str()) == Some("wav") {
        let reader = hound::WavReader::open(audio_path)
            .with_context(|| format!("Failed to open {}", audio_path.display()))?;
        return Ok(reader.duration() as f64 / reader.spec().sample_rate as f64);
    }

    let output = Command::new(ffprobe)
        .args([
            "-v",
            "quiet",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(audio_path)
        .output()
        .context("Failed to run ffprobe")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("ffprobe failed: {}", stderr);
    }

    let duration_str = String::from_utf8_lossy(&output.stdout);
    duration_str
        .trim()
        .parse()
        .context("Failed to parse duration")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_wav_decode_mono() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.wav");
        write_wav(&path, 1, 24_000, &[1, 2, 3]);
        assert_eq!(WavCodec.decode(&path, 24_000).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_wav_decode_downmixes_stereo() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.wav");
        write_wav(&path, 2, 24_000, &[10, 20, -4, 4]);
        assert_eq!(WavCodec.decode(&path, 24_000).unwrap(), vec![15, 0]);
    }

    #[test]
    fn test_wav_decode_rejects_other_rate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.wav");
        write_wav(&path, 1, 22_050, &[1]);
        assert!(WavCodec.decode(&path, 24_000).is_err());
    }

    #[test]
    fn test_wav_decode_garbage_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.wav");
        std::fs::write(&path, b"not audio").unwrap();
        assert!(WavCodec.decode(&path, 24_000).is_err());
    }

    #[test]
    fn test_wav_encode_only_wav() {
        let dir = TempDir::new().unwrap();
        let mut pcm = PcmBuffer::new(24_000);
        pcm.append(&[1, 2]);
        WavCodec.encode(&pcm, &dir.path().join("out.wav")).unwrap();
        assert!(WavCodec.encode(&pcm, &dir.path().join("out.mp3")).is_err());
        assert!(!dir.path().join("out.mp3").exists());
    }

    #[test]
    fn test_probe_wav_duration() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.wav");
        write_wav(&path, 1, 8_000, &[0; 12_000]);
        let secs = probe_duration_secs(Path::new("ffprobe"), &path).unwrap();
        assert!((secs - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_output_format_extension() {
        assert_eq!(OutputFormat::default(), OutputFormat::Mp3);
        assert_eq!(OutputFormat::M4a.extension(), "m4a");
        assert_eq!(OutputFormat::Wav.to_string(), "wav");
    }

    #[test]
    fn test_missing_ffmpeg_unavailable() {
        assert!(!FfmpegCodec::new("/nonexistent/ffmpeg").is_available());
    }
}
