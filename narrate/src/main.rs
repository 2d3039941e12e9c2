//! narrate - Convert text, Markdown and PDF files to narrated audio with captions

mod audio;
mod cancel;
mod captions;
mod config;
mod dispatch;
mod error;
mod input;
mod prompt;
mod text;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tts_client::{BackendKind, BackendParams, TtsError};

use audio::assembler::AssemblyReport;
use audio::{AssemblyOptions, AudioCodec, ChunkOutcome, FfmpegCodec, OutputFormat, WavCodec};
use cancel::CancelToken;
use captions::{CaptionFiles, CaptionOptions};
use config::NarrateConfig;
use dispatch::BackendDispatcher;
use error::NarrateError;
use input::PageRange;
use text::TextChunk;

#[derive(Parser, Debug)]
#[command(name = "narrate")]
#[command(about = "Convert long-form text to narrated audio with synchronized captions", long_about = None)]
#[command(version)]
struct Args {
    /// Input file (.txt, .md or .pdf)
    input: Option<PathBuf>,

    /// Output folder
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Output base name (default: input file name without extension)
    #[arg(short, long)]
    name: Option<String>,

    /// Synthesis backend: melo, xtts, google, edge
    #[arg(short, long)]
    backend: Option<String>,

    /// Maximum characters per synthesis request
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Also write .srt and .lrc captions
    #[arg(long)]
    captions: bool,

    /// Skip interactive parameter prompts
    #[arg(long)]
    use_defaults: bool,

    /// PDF page range, 1-based (e.g., "3-10", "5", "3-")
    #[arg(long)]
    pages: Option<String>,

    /// Concurrent backend calls
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Attempts per chunk before it is skipped
    #[arg(long)]
    retries: Option<u32>,

    /// Abort the run after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Output audio format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Seconds before the first caption
    #[arg(long)]
    initial_delay: Option<f64>,

    /// Maximum words per caption (0 keeps whole sentences)
    #[arg(long)]
    caption_words: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Log level (error, warn, info, debug, trace); overrides -v
    #[arg(long)]
    log_level: Option<String>,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Regenerate captions for an existing narration
    Captions {
        /// Text file that was narrated
        text: PathBuf,

        /// Narrated audio file
        audio: PathBuf,

        /// Output folder (default: the audio file's folder)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output base name (default: audio file name without extension)
        #[arg(short, long)]
        name: Option<String>,

        /// PDF page range that was narrated
        #[arg(long)]
        pages: Option<String>,

        /// Seconds before the first caption
        #[arg(long)]
        initial_delay: Option<f64>,

        /// Maximum words per caption (0 keeps whole sentences)
        #[arg(long)]
        caption_words: Option<usize>,
    },
    /// Combine a cover image and a narration into an MP4
    Video {
        /// Cover image shown for the whole video
        cover: PathBuf,

        /// Narrated audio file
        audio: PathBuf,

        /// Output video (default: the audio path with an .mp4 extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List synthesis backends and their parameters
    Backends,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default backend
    SetBackend {
        /// Backend id (melo, xtts, google, edge)
        backend: String,
    },
    /// Set default chunk size
    SetChunkSize {
        /// Maximum characters per synthesis request
        value: usize,
    },
    /// Set default output format
    SetFormat {
        #[arg(value_enum)]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.log_level.as_deref())?;

    // Handle subcommands
    match &args.command {
        Some(Commands::Config { action }) => {
            return handle_config_command(action);
        }
        Some(Commands::Captions {
            text,
            audio,
            output,
            name,
            pages,
            initial_delay,
            caption_words,
        }) => {
            let mut config = NarrateConfig::load().context("Failed to load configuration")?;
            if let Some(delay) = initial_delay {
                config.initial_delay = *delay;
            }
            if let Some(words) = caption_words {
                config.max_words_per_caption = *words;
            }
            config.validate()?;

            let options = CaptionOptions {
                initial_delay: config.initial_delay,
                max_words_per_caption: config.max_words_per_caption,
            };
            let folder = output
                .clone()
                .or_else(|| {
                    audio
                        .parent()
                        .filter(|p| !p.as_os_str().is_empty())
                        .map(Path::to_path_buf)
                })
                .unwrap_or_else(|| PathBuf::from("."));
            let name = name.clone().unwrap_or_else(|| file_stem_or(audio, "narration"));
            return regenerate_captions(&config, text, audio, pages.as_deref(), &options, &folder, &name);
        }
        Some(Commands::Video {
            cover,
            audio,
            output,
        }) => {
            let config = NarrateConfig::load().context("Failed to load configuration")?;
            let output = output
                .clone()
                .unwrap_or_else(|| audio.with_extension("mp4"));
            audio::render_video(&config.ffmpeg, cover, audio, &output)?;
            eprintln!("Video: {}", output.display());
            return Ok(());
        }
        Some(Commands::Backends) => {
            return list_backends();
        }
        None => {}
    }

    let input = args
        .input
        .clone()
        .ok_or_else(|| anyhow::anyhow!("Input file is required. Run 'narrate --help' for usage."))?;

    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    run_narration(&args, &input).await
}

/// Initialize env_logger from the CLI flags, falling back to RUST_LOG.
fn init_logging(verbose: u8, log_level: Option<&str>) -> Result<()> {
    let level = match log_level {
        Some(level) => Some(
            LevelFilter::from_str(level)
                .map_err(|_| anyhow::anyhow!("Invalid log level: {}", level))?,
        ),
        None => match verbose {
            0 => None,
            1 => Some(LevelFilter::Info),
            2 => Some(LevelFilter::Debug),
            _ => Some(LevelFilter::Trace),
        },
    };

    let mut builder = match level {
        Some(level) => {
            let mut builder = env_logger::Builder::new();
            builder.filter_level(level);
            builder
        }
        None => env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")),
    };
    builder.format_timestamp(None).init();
    Ok(())
}

/// Narrate one input file.
async fn run_narration(args: &Args, input: &Path) -> Result<()> {
    let mut config = NarrateConfig::load().context("Failed to load configuration")?;
    apply_overrides(&mut config, args);
    config.validate()?;

    let kind: BackendKind = config
        .backend
        .parse()
        .map_err(|e: TtsError| NarrateError::Configuration(e.to_string()))?;

    if prompt::should_prompt(args.use_defaults) {
        eprintln!("Configuring {} backend (press Enter to keep a value)", kind);
        prompt::prompt_backend_params(kind, &mut config.backends)?;
    }

    let dispatcher =
        BackendDispatcher::new(&config.backend, &config.backends)?.with_retries(config.retry_attempts);
    let codec = select_codec(&config, &dispatcher)?;

    let pages = parse_pages(args.pages.as_deref())?;
    eprintln!("Reading {}", input.display());
    let text = input::read_input(input, pages)?;

    let chunks = text::process_text(&text, config.chunk_size);
    if chunks.is_empty() {
        return Err(NarrateError::NoContent.into());
    }
    eprintln!(
        "Total chunks: {} (max {} characters), backend: {}",
        chunks.len(),
        config.chunk_size,
        dispatcher.backend_name()
    );

    std::fs::create_dir_all(&args.output)
        .map_err(|e| NarrateError::filesystem(&args.output, e))?;
    let name = args
        .name
        .clone()
        .unwrap_or_else(|| file_stem_or(input, "narration"));
    let output_path = args
        .output
        .join(format!("{}.{}", name, config.format.extension()));

    let cancel = match args.timeout {
        Some(secs) => CancelToken::new().with_timeout(Duration::from_secs(secs)),
        None => CancelToken::new(),
    };
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupted, stopping after the chunks in flight");
                cancel.cancel();
            }
        })
    };

    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );

    let options = AssemblyOptions {
        jobs: config.jobs,
        sample_rate: config.sample_rate,
        cancel,
    };
    let mut failed = 0;
    let result = audio::assemble(
        &chunks,
        &dispatcher,
        codec.as_ref(),
        &output_path,
        &options,
        |outcome| {
            match outcome {
                ChunkOutcome::Merged { index, seconds } => {
                    log::debug!("Chunk {} merged ({:.1}s)", index, seconds);
                }
                ChunkOutcome::Failed { index, message } => {
                    failed += 1;
                    log::debug!("Chunk {} failed: {}", index, message);
                    pb.set_message(format!("{} failed", failed));
                }
            }
            pb.inc(1);
        },
    )
    .await;

    dispatcher.shutdown().await;
    interrupt.abort();
    pb.finish_and_clear();

    let report = result?;

    eprintln!(
        "\nCompleted: {}, Failed: {}",
        report.succeeded,
        report.failures.len()
    );
    for failure in &report.failures {
        eprintln!("  {}", error_chain(failure));
    }
    eprintln!(
        "Output: {} ({:.1}s)",
        report.output_path.display(),
        report.total_duration
    );

    if config.captions {
        let options = CaptionOptions {
            initial_delay: config.initial_delay,
            max_words_per_caption: config.max_words_per_caption,
        };
        let files = caption_narration(&report, &chunks, &options, &args.output, &name)?;
        eprintln!(
            "Captions: {} and {} ({} entries)",
            files.srt.display(),
            files.lrc.display(),
            files.count
        );
    }

    Ok(())
}

/// Caption the chunks that made it into the narration.
///
/// Runs after the audio is written; a failure here leaves the audio in place.
fn caption_narration(
    report: &AssemblyReport,
    chunks: &[TextChunk],
    options: &CaptionOptions,
    folder: &Path,
    name: &str,
) -> Result<CaptionFiles> {
    let narrated: Vec<&str> = report
        .merged
        .iter()
        .filter_map(|&index| chunks.get(index))
        .map(|chunk| chunk.text.as_str())
        .collect();
    captions::generate_captions(
        &narrated.join(" "),
        report.total_duration,
        options,
        folder,
        name,
    )
    .context("Audio was written but captions could not be generated")
}

/// CLI flags take precedence over the config file.
fn apply_overrides(config: &mut NarrateConfig, args: &Args) {
    if let Some(ref backend) = args.backend {
        config.backend = backend.clone();
    }
    if let Some(size) = args.chunk_size {
        config.chunk_size = size;
    }
    if args.captions {
        config.captions = true;
    }
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    if let Some(retries) = args.retries {
        config.retry_attempts = retries;
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    if let Some(delay) = args.initial_delay {
        config.initial_delay = delay;
    }
    if let Some(words) = args.caption_words {
        config.max_words_per_caption = words;
    }
}

/// Pick the codec for decoding backend output and writing the narration.
///
/// ffmpeg is preferred. Without it only WAV backends writing WAV output work,
/// and only when the backend's sample rate matches the configured one.
fn select_codec(config: &NarrateConfig, dispatcher: &BackendDispatcher) -> Result<Box<dyn AudioCodec>> {
    let ffmpeg = FfmpegCodec::new(&config.ffmpeg);
    if ffmpeg.is_available() {
        return Ok(Box::new(ffmpeg));
    }

    if config.format == OutputFormat::Wav && dispatcher.output_extension() == "wav" {
        log::warn!(
            "{} not found; reading backend audio as WAV at {} Hz",
            config.ffmpeg.display(),
            config.sample_rate
        );
        return Ok(Box::new(WavCodec));
    }

    Err(NarrateError::Configuration(format!(
        "ffmpeg not found at '{}'. It is needed to decode {} audio and write {} output.",
        config.ffmpeg.display(),
        dispatcher.output_extension(),
        config.format
    ))
    .into())
}

fn parse_pages(pages: Option<&str>) -> Result<Option<PageRange>> {
    Ok(pages.map(PageRange::from_str).transpose()?)
}

fn file_stem_or(path: &Path, fallback: &str) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Render an error with every underlying cause.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source().and_then(|s| s.source());
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Write captions for an audio file narrated earlier.
fn regenerate_captions(
    config: &NarrateConfig,
    text_path: &Path,
    audio_path: &Path,
    pages: Option<&str>,
    options: &CaptionOptions,
    folder: &Path,
    name: &str,
) -> Result<()> {
    let text = input::read_input(text_path, parse_pages(pages)?)?;
    let duration = audio::probe_duration_secs(&config.ffprobe, audio_path)
        .with_context(|| format!("Failed to read the duration of {}", audio_path.display()))?;
    eprintln!("Audio duration: {:.2}s", duration);

    let files = captions::generate_captions(&text, duration, options, folder, name)?;
    eprintln!(
        "Captions: {} and {} ({} entries)",
        files.srt.display(),
        files.lrc.display(),
        files.count
    );
    Ok(())
}

fn list_backends() -> Result<()> {
    #[derive(Serialize)]
    struct Section<'a> {
        backends: &'a BackendParams,
    }

    let config = NarrateConfig::load().context("Failed to load configuration")?;
    println!("Backends:");
    for kind in BackendKind::ALL {
        let marker = if config.backend.parse::<BackendKind>().ok() == Some(kind) {
            "*"
        } else {
            " "
        };
        println!(" {} {:<8} {}", marker, kind.id(), kind.description());
    }
    println!();
    println!("Parameters (set in {}):", NarrateConfig::config_path()?.display());
    println!(
        "{}",
        toml::to_string_pretty(&Section {
            backends: &config.backends
        })?
    );
    Ok(())
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    let mut config = NarrateConfig::load()?;

    match action {
        ConfigAction::Show => {
            let path = NarrateConfig::config_path()?;
            println!("Config file: {}", path.display());
            println!();
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::SetBackend { backend } => {
            let kind: BackendKind = backend
                .parse()
                .map_err(|e: TtsError| NarrateError::Configuration(e.to_string()))?;
            config.backend = kind.id().to_string();
            config.save()?;
            println!("Default backend set to: {}", kind);
        }
        ConfigAction::SetChunkSize { value } => {
            let updated = NarrateConfig {
                chunk_size: *value,
                ..config
            };
            updated.validate()?;
            updated.save()?;
            println!("Default chunk size set to: {}", value);
        }
        ConfigAction::SetFormat { format } => {
            config.format = *format;
            config.save()?;
            println!("Default format set to: {}", format);
        }
    }

    Ok(())
}
