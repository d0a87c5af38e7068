//! Run configuration and the render-store-encode orchestrator.

pub mod config;
pub mod orchestrator;

pub use config::{OutputLayout, PipelineConfig, RenderThreading};
pub use orchestrator::{Pipeline, PipelineReport, PipelineState, render_video};
