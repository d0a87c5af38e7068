//! Encoder settings shared by every slide in a run.

use crate::foundation::core::Fps;
use crate::foundation::error::{QuoteReelError, QuoteReelResult};

/// Encoder settings, fixed for the whole run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EncodingSpec {
    /// How long each slide stays on screen.
    pub seconds_per_slide: f64,
    /// Output frame rate; each slide is duplicated to fill its duration.
    pub output_fps: u32,
    /// ffmpeg video encoder name.
    pub codec: String,
    /// Output pixel format.
    pub pixel_format: String,
    /// Encoder speed/quality preset.
    pub preset: String,
    /// Constant rate factor (0-51, lower is better).
    pub crf: u8,
}

impl Default for EncodingSpec {
    fn default() -> Self {
        Self {
            seconds_per_slide: 5.0,
            output_fps: 30,
            codec: "libx264".to_string(),
            pixel_format: "yuv420p".to_string(),
            preset: "medium".to_string(),
            crf: 23,
        }
    }
}

/// Highest CRF accepted by the x264/x265 family.
pub const MAX_CRF: u8 = 51;

/// Shortest accepted slide duration in seconds.
pub const MIN_SECONDS_PER_SLIDE: f64 = 0.001;
/// Longest accepted slide duration in seconds.
pub const MAX_SECONDS_PER_SLIDE: f64 = 86_400.0;

// Slide durations must be a fraction of seconds with a denominator up to this bound
// (covers every millisecond value and thirds, sixths, sevenths, ...).
const MAX_SLIDE_DENOMINATOR: u64 = 1000;
const SLIDE_FRACTION_TOLERANCE: f64 = 1e-9;

/// Best rational `num / den` for `secs` with `den <= MAX_SLIDE_DENOMINATOR`, if it is
/// within tolerance.
fn slide_fraction(secs: f64) -> Option<(u64, u64)> {
    let close = |h: u64, k: u64| (h as f64 / k as f64 - secs).abs() <= SLIDE_FRACTION_TOLERANCE;

    // Continued-fraction convergents h/k.
    let (mut h_prev, mut h) = (0u64, 1u64);
    let (mut k_prev, mut k) = (1u64, 0u64);
    let mut rest = secs;
    loop {
        let a = rest.floor();
        if !(0.0..=MAX_SECONDS_PER_SLIDE).contains(&a) {
            return None;
        }
        let a = a as u64;
        let (h_next, k_next) = (a * h + h_prev, a * k + k_prev);
        if k_next > MAX_SLIDE_DENOMINATOR {
            break;
        }
        (h_prev, h) = (h, h_next);
        (k_prev, k) = (k, k_next);

        let frac = rest - a as f64;
        if close(h, k) || frac < 1e-12 {
            break;
        }
        rest = 1.0 / frac;
    }
    (k != 0 && h != 0 && close(h, k)).then_some((h, k))
}

impl EncodingSpec {
    /// Reject values ffmpeg would choke on or that make no sense for a slideshow.
    pub fn validate(&self) -> QuoteReelResult<()> {
        if !self.seconds_per_slide.is_finite() || self.seconds_per_slide <= 0.0 {
            return Err(QuoteReelError::config(
                "seconds_per_slide must be finite and > 0",
            ));
        }
        if !(MIN_SECONDS_PER_SLIDE..=MAX_SECONDS_PER_SLIDE).contains(&self.seconds_per_slide) {
            return Err(QuoteReelError::config(format!(
                "seconds_per_slide must be between {MIN_SECONDS_PER_SLIDE} and \
                 {MAX_SECONDS_PER_SLIDE}, got {}",
                self.seconds_per_slide
            )));
        }
        if slide_fraction(self.seconds_per_slide).is_none() {
            return Err(QuoteReelError::config(format!(
                "seconds_per_slide {} is not a fraction with denominator <= \
                 {MAX_SLIDE_DENOMINATOR}",
                self.seconds_per_slide
            )));
        }
        if self.output_fps == 0 {
            return Err(QuoteReelError::config("output fps must be non-zero"));
        }
        for (name, value) in [
            ("codec", &self.codec),
            ("pixel_format", &self.pixel_format),
            ("preset", &self.preset),
        ] {
            if value.is_empty() || value.chars().any(char::is_whitespace) {
                return Err(QuoteReelError::config(format!(
                    "encoding {name} must be a single non-empty token"
                )));
            }
        }
        if self.crf > MAX_CRF {
            return Err(QuoteReelError::config(format!(
                "crf must be <= {MAX_CRF}, got {}",
                self.crf
            )));
        }
        Ok(())
    }

    /// Input frame rate: one still per `seconds_per_slide`, as an exact reduced fraction.
    pub fn input_rate(&self) -> QuoteReelResult<Fps> {
        let (secs_num, secs_den) = slide_fraction(self.seconds_per_slide).ok_or_else(|| {
            QuoteReelError::config(format!(
                "seconds_per_slide {} has no exact frame-rate fraction",
                self.seconds_per_slide
            ))
        })?;
        let to_u32 = |v: u64| {
            u32::try_from(v)
                .map_err(|_| QuoteReelError::config("seconds_per_slide fraction overflows u32"))
        };
        Fps::new(to_u32(secs_den)?, to_u32(secs_num)?)
    }

    /// Length of a video with `frames` slides.
    pub fn expected_duration_secs(&self, frames: usize) -> f64 {
        frames as f64 * self.seconds_per_slide
    }

    /// Output frame count for `frames` slides at `output_fps`.
    pub fn expected_output_frames(&self, frames: usize) -> u64 {
        (self.expected_duration_secs(frames) * f64::from(self.output_fps)).round() as u64
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/spec.rs"]
mod tests;
