//! Slide backgrounds, rasterized once per run and shared across renderers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{QuoteReelError, QuoteReelResult};
use crate::foundation::math::premultiply_rgba8_in_place;
use crate::render::style::{BackdropStyle, PanelStyle};

/// Canvas-sized background shared by every slide in a run.
///
/// Implementations rasterize once up front; renderers only read the pixels.
pub trait Backdrop: Send + Sync + std::fmt::Debug {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Canvas the pixels cover.
    fn canvas(&self) -> Canvas;

    /// Premultiplied RGBA8 pixels, `canvas().rgba_len()` bytes.
    fn pixels(&self) -> &Arc<Vec<u8>>;

    /// Panel to draw behind the text block, if any.
    fn panel(&self) -> Option<&PanelStyle> {
        None
    }
}

/// Linear gradient across the whole canvas.
#[derive(Clone)]
pub struct GradientBackdrop {
    canvas: Canvas,
    pixels: Arc<Vec<u8>>,
}

impl std::fmt::Debug for GradientBackdrop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GradientBackdrop")
            .field("canvas", &self.canvas)
            .finish()
    }
}

impl GradientBackdrop {
    /// Rasterize a gradient from `start` to `end`.
    ///
    /// `angle_deg` follows CSS `linear-gradient`: 0 runs bottom to top, 90 left to right,
    /// 135 from the top-left corner to the bottom-right one.
    pub fn new(canvas: Canvas, start: Rgba8, end: Rgba8, angle_deg: f32) -> Self {
        let (w, h) = (canvas.width as usize, canvas.height as usize);
        let rad = f64::from(angle_deg).to_radians();
        let (dx, dy) = (rad.sin(), -rad.cos());
        let half_len = 0.5 * ((w as f64) * dx.abs() + (h as f64) * dy.abs());
        let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);

        let mut pixels = Vec::with_capacity(canvas.rgba_len());
        for y in 0..h {
            let py = y as f64 + 0.5 - cy;
            for x in 0..w {
                let px = x as f64 + 0.5 - cx;
                let t = if half_len > 0.0 {
                    ((px * dx + py * dy) / (2.0 * half_len) + 0.5).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                pixels.extend_from_slice(&start.lerp(end, t as f32).to_premul());
            }
        }

        Self {
            canvas,
            pixels: Arc::new(pixels),
        }
    }
}

impl Backdrop for GradientBackdrop {
    fn name(&self) -> &'static str {
        "gradient"
    }

    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn pixels(&self) -> &Arc<Vec<u8>> {
        &self.pixels
    }
}

/// Background image scaled to cover the canvas, with a panel behind the text.
#[derive(Clone)]
pub struct PhotoBackdrop {
    canvas: Canvas,
    source: PathBuf,
    pixels: Arc<Vec<u8>>,
    panel: PanelStyle,
}

impl std::fmt::Debug for PhotoBackdrop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoBackdrop")
            .field("canvas", &self.canvas)
            .field("source", &self.source)
            .field("panel", &self.panel)
            .finish()
    }
}

impl PhotoBackdrop {
    /// Read and decode `source` once (PNG, JPEG, or SVG).
    #[tracing::instrument(skip(panel))]
    pub fn load(canvas: Canvas, source: &Path, panel: PanelStyle) -> QuoteReelResult<Self> {
        let bytes = std::fs::read(source)
            .with_context(|| format!("read background '{}'", source.display()))
            .map_err(|e| QuoteReelError::input(format!("{e:#}")))?;
        Self::from_bytes(canvas, source, &bytes, panel)
    }

    /// Decode already-read background bytes; `source` is used for format detection and errors.
    pub fn from_bytes(
        canvas: Canvas,
        source: &Path,
        bytes: &[u8],
        panel: PanelStyle,
    ) -> QuoteReelResult<Self> {
        let pixels = if is_svg(source, bytes) {
            rasterize_svg_cover(bytes, canvas)
        } else {
            decode_raster_cover(bytes, canvas)
        }
        .map_err(|e| {
            QuoteReelError::input(format!(
                "background '{}' could not be decoded: {e:#}",
                source.display()
            ))
        })?;

        tracing::debug!(source = %source.display(), "decoded background");
        Ok(Self {
            canvas,
            source: source.to_path_buf(),
            pixels: Arc::new(pixels),
            panel,
        })
    }
}

impl Backdrop for PhotoBackdrop {
    fn name(&self) -> &'static str {
        "photo"
    }

    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn pixels(&self) -> &Arc<Vec<u8>> {
        &self.pixels
    }

    fn panel(&self) -> Option<&PanelStyle> {
        Some(&self.panel)
    }
}

fn is_svg(source: &Path, bytes: &[u8]) -> bool {
    let by_ext = source
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    by_ext || bytes.trim_ascii_start().starts_with(b"<")
}

/// Scale that makes `(w, h)` cover `canvas`, plus the offset that centers the overflow.
fn cover_fit(w: f64, h: f64, canvas: Canvas) -> (f64, f64, f64) {
    let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
    let scale = (cw / w).max(ch / h);
    let tx = (cw - w * scale) / 2.0;
    let ty = (ch - h * scale) / 2.0;
    (scale, tx, ty)
}

fn decode_raster_cover(bytes: &[u8], canvas: Canvas) -> anyhow::Result<Vec<u8>> {
    let img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    anyhow::ensure!(w > 0 && h > 0, "image has zero size");

    let (scale, _, _) = cover_fit(f64::from(w), f64::from(h), canvas);
    let sw = ((f64::from(w) * scale).ceil() as u32).max(canvas.width);
    let sh = ((f64::from(h) * scale).ceil() as u32).max(canvas.height);
    let scaled = if (sw, sh) == (w, h) {
        rgba
    } else {
        image::imageops::resize(&rgba, sw, sh, image::imageops::FilterType::Triangle)
    };

    let x = (sw - canvas.width) / 2;
    let y = (sh - canvas.height) / 2;
    let cropped = image::imageops::crop_imm(&scaled, x, y, canvas.width, canvas.height).to_image();

    let mut out = cropped.into_raw();
    premultiply_rgba8_in_place(&mut out);
    Ok(out)
}

fn rasterize_svg_cover(bytes: &[u8], canvas: Canvas) -> anyhow::Result<Vec<u8>> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    let size = tree.size();
    anyhow::ensure!(
        size.width() > 0.0 && size.height() > 0.0,
        "svg has invalid width/height"
    );

    let mut pixmap = resvg::tiny_skia::Pixmap::new(canvas.width, canvas.height)
        .context("allocate svg pixmap")?;
    let (scale, tx, ty) = cover_fit(f64::from(size.width()), f64::from(size.height()), canvas);
    let xform = resvg::tiny_skia::Transform::from_row(
        scale as f32,
        0.0,
        0.0,
        scale as f32,
        tx as f32,
        ty as f32,
    );
    resvg::render(&tree, xform, &mut pixmap.as_mut());
    Ok(pixmap.data().to_vec())
}

/// Build the run's backdrop; relative photo paths resolve against `assets_root`.
pub fn create_backdrop(
    style: &BackdropStyle,
    canvas: Canvas,
    assets_root: &Path,
) -> QuoteReelResult<Arc<dyn Backdrop>> {
    canvas.validate()?;
    match style {
        BackdropStyle::Gradient {
            start,
            end,
            angle_deg,
        } => Ok(Arc::new(GradientBackdrop::new(
            canvas, *start, *end, *angle_deg,
        ))),
        BackdropStyle::Photo { source, panel } => {
            let path = if source.is_absolute() {
                source.clone()
            } else {
                assets_root.join(source)
            };
            Ok(Arc::new(PhotoBackdrop::load(canvas, &path, panel.clone())?))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/backdrop.rs"]
mod tests;
