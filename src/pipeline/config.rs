//! Run configuration.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::encode::{EncodingSpec, FfmpegOpts};
use crate::foundation::core::Canvas;
use crate::foundation::error::{QuoteReelError, QuoteReelResult};
use crate::render::fonts::FontConfig;
use crate::render::style::SlideStyle;
use crate::sequence::{FrameFormat, FrameStore};

/// Where a run writes its frames and its video.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OutputLayout {
    /// Root output directory.
    pub output_dir: PathBuf,
    /// Directory holding `quote_NNN` frame files.
    pub frames_dir: PathBuf,
    /// Final video file.
    pub output_path: PathBuf,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self::under("output")
    }
}

impl OutputLayout {
    /// Default layout below `root`: `root/screenshots/` and `root/rumi_quotes.mp4`.
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let output_dir = root.into();
        Self {
            frames_dir: output_dir.join("screenshots"),
            output_path: output_dir.join("rumi_quotes.mp4"),
            output_dir,
        }
    }
}

/// Threading and chunking controls for slide rendering.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderThreading {
    /// Render a chunk of slides concurrently when `true`.
    pub parallel: bool,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
    /// Slides rendered per parallel batch.
    pub chunk_size: usize,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            threads: None,
            chunk_size: 8,
        }
    }
}

/// Everything a run needs, passed explicitly to each stage.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Output locations.
    pub layout: OutputLayout,
    /// Frame size.
    pub canvas: Canvas,
    /// Slide template.
    pub style: SlideStyle,
    /// Encoder settings.
    pub encoding: EncodingSpec,
    /// Frame file format.
    pub frames: FrameFormat,
    /// Render threading.
    pub threading: RenderThreading,
    /// Remove `quote_NNN` files from earlier runs before rendering.
    pub clear_stale_frames: bool,
    /// ffmpeg executable and timeout.
    pub ffmpeg: FfmpegOpts,
    /// Font files.
    pub fonts: FontConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            layout: OutputLayout::default(),
            canvas: Canvas::default(),
            style: SlideStyle::default(),
            encoding: EncodingSpec::default(),
            frames: FrameFormat::default(),
            threading: RenderThreading::default(),
            clear_stale_frames: true,
            ffmpeg: FfmpegOpts::default(),
            fonts: FontConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file; omitted fields take their defaults.
    pub fn from_path(path: &Path) -> QuoteReelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))
            .map_err(|e| QuoteReelError::config(format!("{e:#}")))?;
        Self::from_json(&text)
            .map_err(|e| QuoteReelError::config(format!("{}: {e}", path.display())))
    }

    /// Parse a JSON config document.
    pub fn from_json(text: &str) -> QuoteReelResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| QuoteReelError::config(format!("malformed config: {e}")))
    }

    /// Check every setting before any work starts.
    pub fn validate(&self) -> QuoteReelResult<()> {
        self.canvas.validate()?;
        self.style.validate()?;
        self.encoding.validate()?;

        if self.layout.frames_dir.as_os_str().is_empty() {
            return Err(QuoteReelError::config("frames_dir must not be empty"));
        }
        if self.layout.output_path.file_name().is_none() {
            return Err(QuoteReelError::config(format!(
                "output_path '{}' does not name a file",
                self.layout.output_path.display()
            )));
        }
        if self.threading.threads == Some(0) {
            return Err(QuoteReelError::config(
                "render threading 'threads' must be >= 1 when set",
            ));
        }
        if self.threading.chunk_size == 0 {
            return Err(QuoteReelError::config(
                "render threading 'chunk_size' must be >= 1",
            ));
        }
        if self.ffmpeg.timeout_secs == Some(0) {
            return Err(QuoteReelError::config("ffmpeg timeout_secs must be >= 1"));
        }
        if self.ffmpeg.binary.as_os_str().is_empty() {
            return Err(QuoteReelError::config("ffmpeg binary must not be empty"));
        }
        Ok(())
    }

    /// Frame store for this layout and format.
    pub fn frame_store(&self) -> FrameStore {
        FrameStore::new(&self.layout.frames_dir, self.frames)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/config.rs"]
mod tests;
