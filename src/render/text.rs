//! Quote and attribution layout with wrap-then-shrink fitting.

use std::collections::HashMap;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{QuoteReelError, QuoteReelResult};
use crate::render::fonts::{FontSet, LoadedFont};
use crate::render::style::TextStyle;

/// RGBA8 brush color carried through Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Stateful helper for building Parley text layouts from raw font bytes.
///
/// Each distinct font is registered with the font collection once and reused afterwards.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    families: HashMap<String, String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    /// Construct a new layout engine with fresh Parley contexts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    fn family_for(&mut self, font: &LoadedFont) -> QuoteReelResult<String> {
        if let Some(name) = self.families.get(&font.origin) {
            return Ok(name.clone());
        }

        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(font.bytes.as_ref().clone()),
            None,
        );
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            QuoteReelError::config(format!("no font families registered from '{}'", font.origin))
        })?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| QuoteReelError::config("registered font family has no name"))?
            .to_string();

        self.families.insert(font.origin.clone(), name.clone());
        Ok(name)
    }

    /// Shape and lay out plain text, wrapping at `max_width_px`.
    ///
    /// The text is never interpreted as markup. Words longer than the wrap width break at
    /// arbitrary points instead of overflowing.
    pub fn layout_plain(
        &mut self,
        text: &str,
        font: &LoadedFont,
        run: RunStyle,
        max_width_px: Option<f32>,
    ) -> QuoteReelResult<parley::Layout<TextBrushRgba8>> {
        if !run.size_px.is_finite() || run.size_px <= 0.0 {
            return Err(QuoteReelError::config("text size_px must be finite and > 0"));
        }
        if !run.line_height.is_finite() || run.line_height <= 0.0 {
            return Err(QuoteReelError::config(
                "text line_height must be finite and > 0",
            ));
        }

        let family_name = self.family_for(font)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(run.size_px));
        builder.push_default(parley::style::StyleProperty::LineHeight(
            parley::style::LineHeight::FontSizeRelative(run.line_height),
        ));
        builder.push_default(parley::style::StyleProperty::OverflowWrap(
            parley::style::OverflowWrap::Anywhere,
        ));
        builder.push_default(parley::style::StyleProperty::Brush(run.brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(max_width_px);
        layout.align(
            max_width_px,
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );
        Ok(layout)
    }
}

/// Size, spacing, and color of one text run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunStyle {
    /// Font size in pixels.
    pub size_px: f32,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
    /// Fill color.
    pub brush: TextBrushRgba8,
}

/// Visible width of a line, excluding trailing whitespace.
pub fn visible_line_width(metrics: &parley::layout::LineMetrics) -> f32 {
    (metrics.advance - metrics.trailing_whitespace).max(0.0)
}

/// One laid-out run of text with the face needed to rasterize it.
pub struct ShapedText {
    /// Positioned glyph layout.
    pub layout: parley::Layout<TextBrushRgba8>,
    /// Rasterizer font handle.
    pub font: vello_cpu::peniko::FontData,
}

impl ShapedText {
    /// Widest visible line.
    pub fn width(&self) -> f32 {
        self.layout
            .lines()
            .map(|line| visible_line_width(line.metrics()))
            .fold(0.0, f32::max)
    }

    /// Total height of all lines.
    pub fn height(&self) -> f32 {
        self.layout.height()
    }

    /// Number of wrapped lines.
    pub fn line_count(&self) -> usize {
        self.layout.len()
    }
}

/// Quote and attribution laid out together at a common scale.
pub struct SlideText {
    /// Quote body.
    pub quote: ShapedText,
    /// `- author` line.
    pub author: ShapedText,
    /// Gap between the two runs after scaling.
    pub gap: f32,
    /// Shrink factor applied to the configured sizes (1.0 = none).
    pub scale: f32,
}

impl SlideText {
    /// Width of the text block.
    pub fn width(&self) -> f32 {
        self.quote.width().max(self.author.width())
    }

    /// Height of the text block.
    pub fn height(&self) -> f32 {
        self.quote.height() + self.gap + self.author.height()
    }
}

/// Area the text block must fit into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextBox {
    /// Wrap width.
    pub max_width: f32,
    /// Available height.
    pub max_height: f32,
}

/// Shrink step applied by the fit policy.
pub const SHRINK_STEP: f32 = 0.9;

// Glyph advances are fractional; tolerate sub-pixel overshoot at the wrap width.
const WIDTH_EPSILON: f32 = 0.5;

/// Try `build` at scale 1.0, then keep shrinking by [`SHRINK_STEP`] until `fits` accepts
/// the result or the scale would drop below `min_scale`.
///
/// Returns `Ok(None)` when nothing fits.
pub fn shrink_to_fit<T>(
    min_scale: f32,
    mut build: impl FnMut(f32) -> QuoteReelResult<T>,
    fits: impl Fn(&T) -> bool,
) -> QuoteReelResult<Option<T>> {
    let mut scale = 1.0f32;
    loop {
        let candidate = build(scale)?;
        if fits(&candidate) {
            return Ok(Some(candidate));
        }
        let next = scale * SHRINK_STEP;
        if next < min_scale - 1e-6 {
            return Ok(None);
        }
        scale = next;
    }
}

/// Lay out a quote and attribution so that the block fits `bounds`.
///
/// Both runs wrap at `bounds.max_width`; when the block is too tall (or a line still
/// overflows the width) both font sizes shrink together. Failing to fit at
/// `style.min_scale` is an error.
pub fn layout_slide_text(
    engine: &mut TextLayoutEngine,
    fonts: &FontSet,
    style: &TextStyle,
    quote: &str,
    author_line: &str,
    bounds: TextBox,
) -> QuoteReelResult<SlideText> {
    if bounds.max_width <= 0.0 || bounds.max_height <= 0.0 {
        return Err(QuoteReelError::config("text area is empty; reduce padding"));
    }

    let author_face = fonts.author_face(style.author_italic);
    let quote_font = fonts.regular.font_data();
    let author_font = author_face.font_data();

    let fitted = shrink_to_fit(
        style.min_scale,
        |scale| {
            let quote_layout = engine.layout_plain(
                quote,
                &fonts.regular,
                RunStyle {
                    size_px: style.quote_size_px * scale,
                    line_height: style.line_height,
                    brush: style.quote_color.into(),
                },
                Some(bounds.max_width),
            )?;
            let author_layout = engine.layout_plain(
                author_line,
                author_face,
                RunStyle {
                    size_px: style.author_size_px * scale,
                    line_height: style.line_height,
                    brush: style.author_color.into(),
                },
                Some(bounds.max_width),
            )?;
            Ok(SlideText {
                quote: ShapedText {
                    layout: quote_layout,
                    font: quote_font.clone(),
                },
                author: ShapedText {
                    layout: author_layout,
                    font: author_font.clone(),
                },
                gap: style.block_gap_px * scale,
                scale,
            })
        },
        |text: &SlideText| {
            text.height() <= bounds.max_height && text.width() <= bounds.max_width + WIDTH_EPSILON
        },
    )?;

    let text = fitted.ok_or_else(|| {
        QuoteReelError::config(format!(
            "text does not fit {:.0}x{:.0} even at {:.0}% size",
            bounds.max_width,
            bounds.max_height,
            style.min_scale * 100.0
        ))
    })?;
    if text.scale < 1.0 {
        tracing::debug!(scale = text.scale, "shrunk text to fit");
    }
    Ok(text)
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
