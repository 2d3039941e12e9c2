//! Still-image video from a cover picture and a finished narration.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use crate::error::NarrateError;

/// Frame rate of the rendered video.
pub const VIDEO_FPS: u32 = 24;

/// ffmpeg arguments that loop `cover` over `audio` and stop when the audio ends.
pub fn video_args(cover: &Path, audio: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-v", "error", "-loop", "1", "-framerate"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(VIDEO_FPS.to_string().into());
    args.push("-i".into());
    args.push(cover.into());
    args.push("-i".into());
    args.push(audio.into());
    args.extend(
        [
            "-c:v",
            "libx264",
            "-tune",
            "stillimage",
            // yuv420p needs even dimensions
            "-vf",
            "scale=trunc(iw/2)*2:trunc(ih/2)*2",
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            "-b:a",
            "192k",
            "-shortest",
            "-movflags",
            "+faststart",
        ]
        .into_iter()
        .map(OsString::from),
    );
    args.push(output.into());
    args
}

/// Render `output` (MP4) with ffmpeg.
pub fn render_video(ffmpeg: &Path, cover: &Path, audio: &Path, output: &Path) -> Result<()> {
    for input in [cover, audio] {
        if !input.is_file() {
            return Err(NarrateError::filesystem(
                input,
                std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            )
            .into());
        }
    }

    log::info!(
        "Rendering {} from {} and {}",
        output.display(),
        cover.display(),
        audio.display()
    );
    let result = Command::new(ffmpeg)
        .args(video_args(cover, audio, output))
        .output()
        .with_context(|| format!("Failed to run {}", ffmpeg.display()))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        anyhow::bail!("ffmpeg video render failed: {}", stderr.trim());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_video_args() {
        let args = video_args(
            Path::new("cover.png"),
            Path::new("story.mp3"),
            Path::new("out/story.mp4"),
        );
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(&args[..8], ["-y", "-v", "error", "-loop", "1", "-framerate", "24", "-i"]);
        assert_eq!(args[8], "cover.png");
        assert_eq!(args[9..11], ["-i", "story.mp3"]);
        let pair = |flag: &str| {
            let at = args.iter().position(|a| a == flag).unwrap();
            args[at + 1].clone()
        };
        assert_eq!(pair("-c:v"), "libx264");
        assert_eq!(pair("-c:a"), "aac");
        assert_eq!(pair("-pix_fmt"), "yuv420p");
        assert!(args.contains(&"-shortest".to_string()));
        assert_eq!(args.last().unwrap(), "out/story.mp4");
    }

    #[test]
    fn test_missing_cover_is_filesystem_error() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("story.wav");
        std::fs::write(&audio, b"RIFF").unwrap();

        let err = render_video(
            Path::new("ffmpeg"),
            &dir.path().join("missing.png"),
            &audio,
            &dir.path().join("story.mp4"),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NarrateError>(),
            Some(NarrateError::Filesystem { .. })
        ));
        assert!(!dir.path().join("story.mp4").exists());
    }
}
