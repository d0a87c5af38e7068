//! Slide rasterization: style template, fonts, text layout, backdrops, and the CPU renderer.

pub mod backdrop;
pub mod fonts;
pub mod frame;
pub mod slide;
pub mod style;
pub mod text;

use crate::foundation::error::QuoteReelResult;
use crate::model::quote::QuoteRecord;

pub use frame::FrameRGBA;

/// Turns one record into one frame.
///
/// Implementations must be deterministic for a fixed style and record. A failure must carry
/// the record index (`QuoteReelError::Render`).
pub trait FrameRenderer {
    /// Render record `index`.
    fn render(&mut self, index: usize, record: &QuoteRecord) -> QuoteReelResult<FrameRGBA>;
}

/// Builds renderers, one per sequential run or one per parallel worker.
pub trait RendererFactory: Sync {
    /// Renderer type produced by this factory.
    type Renderer: FrameRenderer;

    /// Create a fresh renderer.
    fn create(&self) -> QuoteReelResult<Self::Renderer>;
}
