//! The render-store-encode state machine.

use std::path::Path;

use rayon::prelude::*;

use crate::encode::{EncodeReport, FfmpegEncoder, VideoEncoder};
use crate::foundation::error::{QuoteReelError, QuoteReelResult};
use crate::model::quote::{QuoteRecord, validate_records};
use crate::pipeline::config::PipelineConfig;
use crate::render::slide::SlideRendererFactory;
use crate::render::{FrameRGBA, FrameRenderer, RendererFactory};
use crate::sequence::{FrameSequence, FrameStore};

/// Where a run currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// Not started.
    Idle,
    /// Validating the record list.
    LoadingRecords,
    /// Rendering (or storing) the frame with this index.
    RenderingFrames(usize),
    /// Frames complete, encoder running.
    Encoding,
    /// Video written.
    Done,
    /// Aborted at the named stage.
    Failed {
        /// Stage of the error that stopped the run.
        stage: &'static str,
    },
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::LoadingRecords => f.write_str("loading records"),
            Self::RenderingFrames(i) => write!(f, "rendering frame {i}"),
            Self::Encoding => f.write_str("encoding"),
            Self::Done => f.write_str("done"),
            Self::Failed { stage } => write!(f, "failed ({stage})"),
        }
    }
}

/// Outcome of a successful run.
#[derive(Clone, Debug)]
pub struct PipelineReport {
    /// Stored frames in playback order.
    pub frames: FrameSequence,
    /// Encoder result.
    pub video: EncodeReport,
    /// Final state (always [`PipelineState::Done`]).
    pub state: PipelineState,
}

/// Render every record to a frame file, then encode the sequence.
///
/// The first error aborts the run; frames after a failing record are never written and the
/// encoder is not invoked.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    state: PipelineState,
}

impl Pipeline {
    /// Validate `config` and create an idle pipeline.
    pub fn new(config: PipelineConfig) -> QuoteReelResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: PipelineState::Idle,
        })
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn transition(&mut self, next: PipelineState) {
        if self.state == next {
            return;
        }
        match next {
            PipelineState::RenderingFrames(_) => tracing::debug!(state = %next, "pipeline state"),
            _ => tracing::info!(state = %next, "pipeline state"),
        }
        self.state = next;
    }

    /// Drive `records` through render, store, and encode.
    #[tracing::instrument(skip_all, fields(records = records.len()))]
    pub fn run<F, E>(
        &mut self,
        records: &[QuoteRecord],
        factory: &F,
        encoder: &E,
    ) -> QuoteReelResult<PipelineReport>
    where
        F: RendererFactory,
        E: VideoEncoder + ?Sized,
    {
        match self.run_stages(records, factory, encoder) {
            Ok(report) => Ok(report),
            Err(e) => {
                self.transition(PipelineState::Failed { stage: e.stage() });
                tracing::error!(error = %e, "pipeline failed");
                Err(e)
            }
        }
    }

    fn run_stages<F, E>(
        &mut self,
        records: &[QuoteRecord],
        factory: &F,
        encoder: &E,
    ) -> QuoteReelResult<PipelineReport>
    where
        F: RendererFactory,
        E: VideoEncoder + ?Sized,
    {
        self.transition(PipelineState::LoadingRecords);
        validate_records(records)?;

        let frames = self.render_frames(records, factory)?;

        self.transition(PipelineState::Encoding);
        frames.verify_on_disk()?;
        let video = encoder.encode(
            &frames,
            &self.config.encoding,
            &self.config.layout.output_path,
        )?;

        self.transition(PipelineState::Done);
        Ok(PipelineReport {
            frames,
            video,
            state: self.state,
        })
    }

    /// Render and store all records, in order, without encoding.
    pub fn render_frames<F: RendererFactory>(
        &mut self,
        records: &[QuoteRecord],
        factory: &F,
    ) -> QuoteReelResult<FrameSequence> {
        let store = self.config.frame_store();
        store.prepare()?;
        if self.config.clear_stale_frames {
            store.clear_stale()?;
        }

        let mut sequence = FrameSequence::new(&store);
        if self.config.threading.parallel {
            self.render_parallel(records, factory, &store, &mut sequence)?;
        } else {
            let mut renderer = factory.create()?;
            for (i, record) in records.iter().enumerate() {
                self.transition(PipelineState::RenderingFrames(i));
                let frame = renderer.render(i, record)?;
                self.store_frame(&store, &mut sequence, i, &frame)?;
            }
        }

        let next = store.path_for(sequence.len());
        if next.exists() {
            tracing::warn!(
                path = %next.display(),
                "frame from an earlier run follows the sequence; the encoder stops at frame {}",
                sequence.len()
            );
        }
        Ok(sequence)
    }

    fn render_parallel<F: RendererFactory>(
        &mut self,
        records: &[QuoteRecord],
        factory: &F,
        store: &FrameStore,
        sequence: &mut FrameSequence,
    ) -> QuoteReelResult<()> {
        let pool = build_thread_pool(self.config.threading.threads)?;
        let chunk_size = self.config.threading.chunk_size.max(1);

        for (chunk_idx, chunk) in records.chunks(chunk_size).enumerate() {
            let base = chunk_idx * chunk_size;
            self.transition(PipelineState::RenderingFrames(base));

            let rendered: Vec<QuoteReelResult<FrameRGBA>> = pool.install(|| {
                chunk
                    .par_iter()
                    .enumerate()
                    .map_init(
                        || factory.create(),
                        |renderer, (offset, record)| {
                            let index = base + offset;
                            match renderer {
                                Ok(r) => r.render(index, record),
                                Err(e) => Err(QuoteReelError::render(
                                    index,
                                    format!("renderer setup failed: {e}"),
                                )),
                            }
                        },
                    )
                    .collect()
            });

            for (offset, frame) in rendered.into_iter().enumerate() {
                let index = base + offset;
                self.transition(PipelineState::RenderingFrames(index));
                self.store_frame(store, sequence, index, &frame?)?;
            }
        }
        Ok(())
    }

    fn store_frame(
        &self,
        store: &FrameStore,
        sequence: &mut FrameSequence,
        index: usize,
        frame: &FrameRGBA,
    ) -> QuoteReelResult<()> {
        if frame.canvas() != self.config.canvas {
            return Err(QuoteReelError::render(
                index,
                format!(
                    "renderer produced {}x{}, expected {}x{}",
                    frame.width, frame.height, self.config.canvas.width, self.config.canvas.height
                ),
            ));
        }
        let path = store.store(index, frame)?;
        sequence.push(index, path)
    }
}

fn build_thread_pool(threads: Option<usize>) -> QuoteReelResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(QuoteReelError::config(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| QuoteReelError::config(format!("failed to build rayon thread pool: {e}")))
}

/// Render `records` with the slide renderer and encode with the system ffmpeg.
///
/// ffmpeg, fonts, and the background are all checked before the first frame is rendered.
/// Relative background paths resolve against `assets_root`.
pub fn render_video(
    config: PipelineConfig,
    records: &[QuoteRecord],
    assets_root: &Path,
) -> QuoteReelResult<PipelineReport> {
    let mut pipeline = Pipeline::new(config)?;
    let cfg = pipeline.config();
    let encoder = FfmpegEncoder::locate(cfg.ffmpeg.clone())?;
    let factory = SlideRendererFactory::prepare(cfg.canvas, &cfg.style, &cfg.fonts, assets_root)?;
    pipeline.run(records, &factory, &encoder)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/orchestrator.rs"]
mod tests;
