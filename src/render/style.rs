//! Slide template: text sizes, colors, and backdrop choice.

use std::path::PathBuf;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{QuoteReelError, QuoteReelResult};

/// Typography and layout of the text block, shared by every slide in a run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// Quote font size in pixels before any shrink-to-fit.
    pub quote_size_px: f32,
    /// Quote color.
    pub quote_color: Rgba8,
    /// Attribution font size in pixels before any shrink-to-fit.
    pub author_size_px: f32,
    /// Attribution color.
    pub author_color: Rgba8,
    /// Use the italic face for the attribution when one is available.
    pub author_italic: bool,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
    /// Vertical gap between quote and attribution.
    pub block_gap_px: f32,
    /// Line wrap width for both text runs.
    pub max_width_px: f32,
    /// Minimum distance between the text block and the canvas edge.
    pub padding_px: f32,
    /// Smallest shrink factor the fit policy may apply before giving up.
    pub min_scale: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            quote_size_px: 40.0,
            quote_color: Rgba8::rgb(255, 255, 255),
            author_size_px: 24.0,
            author_color: Rgba8::rgb(0xff, 0xd7, 0x00),
            author_italic: true,
            line_height: 1.4,
            block_gap_px: 32.0,
            max_width_px: 800.0,
            padding_px: 32.0,
            min_scale: 0.4,
        }
    }
}

impl TextStyle {
    /// Check sizes and factors are finite and positive.
    pub fn validate(&self) -> QuoteReelResult<()> {
        fn positive(name: &str, v: f32) -> QuoteReelResult<()> {
            if !v.is_finite() || v <= 0.0 {
                return Err(QuoteReelError::config(format!(
                    "text style {name} must be finite and > 0"
                )));
            }
            Ok(())
        }
        fn non_negative(name: &str, v: f32) -> QuoteReelResult<()> {
            if !v.is_finite() || v < 0.0 {
                return Err(QuoteReelError::config(format!(
                    "text style {name} must be finite and >= 0"
                )));
            }
            Ok(())
        }

        positive("quote_size_px", self.quote_size_px)?;
        positive("author_size_px", self.author_size_px)?;
        positive("max_width_px", self.max_width_px)?;
        positive("line_height", self.line_height)?;
        non_negative("block_gap_px", self.block_gap_px)?;
        non_negative("padding_px", self.padding_px)?;
        if !(self.min_scale > 0.0 && self.min_scale <= 1.0) {
            return Err(QuoteReelError::config(
                "text style min_scale must be in (0, 1]",
            ));
        }
        Ok(())
    }
}

/// Semi-transparent panel drawn behind the text block.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PanelStyle {
    /// Panel fill; the alpha channel sets its transparency.
    pub color: Rgba8,
    /// Space between the text block and the panel edge.
    pub padding_px: f32,
    /// Corner radius.
    pub corner_radius_px: f32,
}

impl Default for PanelStyle {
    fn default() -> Self {
        Self {
            color: Rgba8::rgba(0, 0, 0, 0xa6),
            padding_px: 48.0,
            corner_radius_px: 24.0,
        }
    }
}

/// Background treatment, chosen once for the whole run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackdropStyle {
    /// Linear gradient over the full canvas, text directly on top.
    Gradient {
        /// Color at the start of the gradient line.
        start: Rgba8,
        /// Color at the end of the gradient line.
        end: Rgba8,
        /// Direction in degrees, CSS convention (0 = bottom to top, 90 = left to right).
        angle_deg: f32,
    },
    /// Full-bleed background image with a panel behind the text.
    Photo {
        /// Background image (PNG, JPEG, or SVG), relative to the assets root.
        source: PathBuf,
        /// Panel behind the text.
        #[serde(default)]
        panel: PanelStyle,
    },
}

impl Default for BackdropStyle {
    fn default() -> Self {
        Self::Gradient {
            start: Rgba8::rgb(0x1a, 0x1a, 0x1a),
            end: Rgba8::rgb(0x4a, 0x4a, 0x4a),
            angle_deg: 135.0,
        }
    }
}

impl BackdropStyle {
    /// Photo variant with the default panel.
    pub fn photo(source: impl Into<PathBuf>) -> Self {
        Self::Photo {
            source: source.into(),
            panel: PanelStyle::default(),
        }
    }

    /// Short name for logs and CLI output.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Gradient { .. } => "gradient",
            Self::Photo { .. } => "photo",
        }
    }

    /// Panel drawn behind the text, if this variant has one.
    pub fn panel(&self) -> Option<&PanelStyle> {
        match self {
            Self::Gradient { .. } => None,
            Self::Photo { panel, .. } => Some(panel),
        }
    }
}

/// Complete slide template: background plus text.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SlideStyle {
    /// Background variant.
    pub backdrop: BackdropStyle,
    /// Text typography and layout.
    pub text: TextStyle,
}

impl SlideStyle {
    /// Validate the text style and the variant-specific settings.
    pub fn validate(&self) -> QuoteReelResult<()> {
        self.text.validate()?;
        match &self.backdrop {
            BackdropStyle::Gradient { angle_deg, .. } => {
                if !angle_deg.is_finite() {
                    return Err(QuoteReelError::config("gradient angle must be finite"));
                }
            }
            BackdropStyle::Photo { source, panel } => {
                if source.as_os_str().is_empty() {
                    return Err(QuoteReelError::config(
                        "photo backdrop requires a background image path",
                    ));
                }
                if !panel.padding_px.is_finite() || panel.padding_px < 0.0 {
                    return Err(QuoteReelError::config(
                        "panel padding_px must be finite and >= 0",
                    ));
                }
                if !panel.corner_radius_px.is_finite() || panel.corner_radius_px < 0.0 {
                    return Err(QuoteReelError::config(
                        "panel corner_radius_px must be finite and >= 0",
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/style.rs"]
mod tests;
