//! The CPU slide renderer.

use std::path::Path;
use std::sync::Arc;

use crate::foundation::core::Canvas;
use crate::foundation::error::{QuoteReelError, QuoteReelResult};
use crate::model::quote::QuoteRecord;
use crate::render::backdrop::{Backdrop, create_backdrop};
use crate::render::fonts::{FontConfig, FontSet};
use crate::render::frame::{FrameRGBA, image_paint_from_premul};
use crate::render::style::{PanelStyle, SlideStyle, TextStyle};
use crate::render::text::{
    ShapedText, TextBox, TextLayoutEngine, layout_slide_text, visible_line_width,
};
use crate::render::{FrameRenderer, RendererFactory};

/// Everything a slide renderer needs, resolved once per run and shared across workers.
#[derive(Clone, Debug)]
pub struct SlideRendererFactory {
    canvas: Canvas,
    text: TextStyle,
    fonts: Arc<FontSet>,
    backdrop: Arc<dyn Backdrop>,
}

impl SlideRendererFactory {
    /// Validate the style, resolve fonts, and decode the backdrop.
    #[tracing::instrument(skip_all, fields(backdrop = style.backdrop.kind_name()))]
    pub fn prepare(
        canvas: Canvas,
        style: &SlideStyle,
        fonts: &FontConfig,
        assets_root: &Path,
    ) -> QuoteReelResult<Self> {
        canvas.validate()?;
        style.validate()?;
        let fonts = FontSet::resolve(fonts)?;
        let backdrop = create_backdrop(&style.backdrop, canvas, assets_root)?;
        Ok(Self::from_parts(style.text.clone(), fonts, backdrop))
    }

    /// Assemble a factory from already-prepared parts.
    pub fn from_parts(text: TextStyle, fonts: FontSet, backdrop: Arc<dyn Backdrop>) -> Self {
        Self {
            canvas: backdrop.canvas(),
            text,
            fonts: Arc::new(fonts),
            backdrop,
        }
    }

    /// Fonts used by every renderer from this factory.
    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }
}

impl RendererFactory for SlideRendererFactory {
    type Renderer = SlideRenderer;

    fn create(&self) -> QuoteReelResult<SlideRenderer> {
        let pixels = self.backdrop.pixels();
        let backdrop_paint =
            image_paint_from_premul(pixels.as_slice(), self.canvas.width, self.canvas.height)?;
        Ok(SlideRenderer {
            canvas: self.canvas,
            text: self.text.clone(),
            fonts: Arc::clone(&self.fonts),
            panel: self.backdrop.panel().cloned(),
            backdrop_paint,
            engine: TextLayoutEngine::new(),
        })
    }
}

/// CPU slide renderer: backdrop, optional panel, then the centered text block.
///
/// Holds a text layout engine and is meant to be reused for many records.
pub struct SlideRenderer {
    canvas: Canvas,
    text: TextStyle,
    fonts: Arc<FontSet>,
    panel: Option<PanelStyle>,
    backdrop_paint: vello_cpu::Image,
    engine: TextLayoutEngine,
}

impl SlideRenderer {
    fn text_box(&self) -> TextBox {
        let inset = self.text.padding_px + self.panel.as_ref().map_or(0.0, |p| p.padding_px);
        let w = self.canvas.width as f32;
        let h = self.canvas.height as f32;
        TextBox {
            max_width: self.text.max_width_px.min(w - 2.0 * inset),
            max_height: h - 2.0 * inset,
        }
    }

    fn draw(&mut self, record: &QuoteRecord) -> QuoteReelResult<FrameRGBA> {
        let w: u16 = self
            .canvas
            .width
            .try_into()
            .map_err(|_| QuoteReelError::config("canvas width exceeds u16"))?;
        let h: u16 = self
            .canvas
            .height
            .try_into()
            .map_err(|_| QuoteReelError::config("canvas height exceeds u16"))?;

        let author_line = record.attribution_line();
        let bounds = self.text_box();
        let text = layout_slide_text(
            &mut self.engine,
            &self.fonts,
            &self.text,
            record.text.trim(),
            &author_line,
            bounds,
        )?;

        let canvas_w = f32::from(w);
        let canvas_h = f32::from(h);
        let top = (canvas_h - text.height()) / 2.0;

        let mut ctx = vello_cpu::RenderContext::new(w, h);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);

        ctx.set_paint(self.backdrop_paint.clone());
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(w),
            f64::from(h),
        ));

        if let Some(panel) = &self.panel {
            let half_w = f64::from(text.width()) / 2.0 + f64::from(panel.padding_px);
            let half_h = f64::from(text.height()) / 2.0 + f64::from(panel.padding_px);
            let (cx, cy) = (f64::from(canvas_w) / 2.0, f64::from(canvas_h) / 2.0);
            let rect = vello_cpu::kurbo::RoundedRect::new(
                cx - half_w,
                cy - half_h,
                cx + half_w,
                cy + half_h,
                f64::from(panel.corner_radius_px),
            );
            let c = panel.color;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
            ctx.fill_path(&vello_cpu::kurbo::Shape::to_path(&rect, 0.1));
        }

        draw_centered_lines(&mut ctx, &text.quote, canvas_w, top);
        draw_centered_lines(
            &mut ctx,
            &text.author,
            canvas_w,
            top + text.quote.height() + text.gap,
        );

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);

        FrameRGBA::new(
            self.canvas.width,
            self.canvas.height,
            pixmap.data_as_u8_slice().to_vec(),
        )
    }
}

fn draw_centered_lines(
    ctx: &mut vello_cpu::RenderContext,
    shaped: &ShapedText,
    canvas_w: f32,
    top: f32,
) {
    for line in shaped.layout.lines() {
        let dx = ((canvas_w - visible_line_width(line.metrics())) / 2.0).max(0.0);
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };

            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));

            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x + dx,
                y: g.y + top,
            });
            ctx.glyph_run(&shaped.font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

impl FrameRenderer for SlideRenderer {
    #[tracing::instrument(skip(self, record))]
    fn render(&mut self, index: usize, record: &QuoteRecord) -> QuoteReelResult<FrameRGBA> {
        self.draw(record).map_err(|e| e.at_record(index))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/slide.rs"]
mod tests;
