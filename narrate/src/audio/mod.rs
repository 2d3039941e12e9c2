//! Audio handling: PCM accumulation, codecs, narration assembly and cover videos.

pub mod assembler;
pub mod codec;
mod pcm;
pub mod video;

pub use assembler::{assemble, AssemblyOptions, ChunkOutcome};
pub use codec::{probe_duration_secs, AudioCodec, FfmpegCodec, OutputFormat, WavCodec};
pub use pcm::DEFAULT_SAMPLE_RATE;
pub use video::render_video;
