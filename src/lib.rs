//! QuoteReel turns an ordered list of quotes into a slideshow video.
//!
//! Each record is rendered to a 1920x1080 slide on the CPU, stored as a numbered frame file,
//! and the whole sequence is handed to the system `ffmpeg`:
//!
//! - Load records with [`load_quotes`]
//! - Prepare a [`SlideRendererFactory`] for the chosen [`SlideStyle`]
//! - Drive a [`Pipeline`] with any [`VideoEncoder`] (usually [`FfmpegEncoder`])
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod encode;
pub mod foundation;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod sequence;

pub use crate::foundation::core::{Canvas, Fps, Rgba8};
pub use crate::foundation::error::{QuoteReelError, QuoteReelResult};

pub use crate::encode::{EncodeReport, EncodingSpec, FfmpegEncoder, FfmpegOpts, VideoEncoder};
pub use crate::model::quote::{QuoteRecord, load_quotes, parse_quotes};
pub use crate::pipeline::{
    OutputLayout, Pipeline, PipelineConfig, PipelineReport, PipelineState, RenderThreading,
    render_video,
};
pub use crate::render::fonts::{FontConfig, FontSet};
pub use crate::render::slide::{SlideRenderer, SlideRendererFactory};
pub use crate::render::style::{BackdropStyle, PanelStyle, SlideStyle, TextStyle};
pub use crate::render::{FrameRGBA, FrameRenderer, RendererFactory};
pub use crate::sequence::{FrameFormat, FrameSequence, FrameStore};
