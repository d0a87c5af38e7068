//! Video encoding: run-wide encoder settings and the ffmpeg backend.

pub mod ffmpeg;
pub mod spec;

pub use ffmpeg::{EncodeReport, FfmpegEncoder, FfmpegOpts, VideoEncoder};
pub use spec::EncodingSpec;
