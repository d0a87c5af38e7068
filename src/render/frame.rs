//! Premultiplied RGBA frames.

use std::sync::Arc;

use crate::foundation::core::Canvas;
use crate::foundation::error::{QuoteReelError, QuoteReelResult};
use crate::foundation::math::flatten_premul_over_bg_in_place;

/// A rendered slide as RGBA8 pixels.
///
/// Pixels are **premultiplied alpha**, tightly packed, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 bytes.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Wrap premultiplied bytes, checking the length against the dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> QuoteReelResult<Self> {
        let expected = Canvas { width, height }.rgba_len();
        if data.len() != expected {
            return Err(QuoteReelError::config(format!(
                "frame data is {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Canvas this frame covers.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Opaque RGBA8 copy with alpha flattened over `bg`.
    pub fn to_opaque_rgba8(&self, bg: [u8; 3]) -> Vec<u8> {
        let mut out = self.data.clone();
        flatten_premul_over_bg_in_place(&mut out, bg);
        out
    }
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> QuoteReelResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| QuoteReelError::config("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| QuoteReelError::config("pixmap height exceeds u16"))?;
    let expected = Canvas { width, height }.rgba_len();
    if bytes.len() != expected {
        return Err(QuoteReelError::config("pixmap byte len mismatch"));
    }
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

pub(crate) fn image_paint_from_premul(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> QuoteReelResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
