//! Numbered frame files and the ordered sequence handed to the encoder.

use std::path::{Path, PathBuf};

use crate::foundation::error::{QuoteReelError, QuoteReelResult};
use crate::render::FrameRGBA;

/// Prefix shared by every frame file name.
pub const FRAME_PREFIX: &str = "quote_";

/// Image container for frame files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// Baseline JPEG.
    Jpeg,
}

impl FrameFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// Writes frames to `<dir>/quote_NNN.<ext>`.
#[derive(Clone, Debug)]
pub struct FrameStore {
    dir: PathBuf,
    format: FrameFormat,
}

impl FrameStore {
    /// Store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>, format: FrameFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    /// Frames directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Frame file format.
    pub fn format(&self) -> FrameFormat {
        self.format
    }

    /// Path of frame `index`; zero-padded to three digits, wider past 999.
    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(format!(
            "{FRAME_PREFIX}{index:03}.{}",
            self.format.extension()
        ))
    }

    /// Printf-style pattern addressing every frame, for the encoder.
    pub fn pattern(&self) -> PathBuf {
        self.dir
            .join(format!("{FRAME_PREFIX}%03d.{}", self.format.extension()))
    }

    /// Create the frames directory if needed.
    pub fn prepare(&self) -> QuoteReelResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            QuoteReelError::storage(&self.dir, format!("create frames directory: {e}"))
        })
    }

    fn is_frame_file(&self, name: &str) -> bool {
        let Some(rest) = name.strip_prefix(FRAME_PREFIX) else {
            return false;
        };
        let Some((digits, ext)) = rest.split_once('.') else {
            return false;
        };
        !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && ext == self.format.extension()
    }

    /// Remove frame files left by an earlier run; other files are untouched.
    ///
    /// Returns how many files were removed. A missing directory counts as empty.
    pub fn clear_stale(&self) -> QuoteReelResult<usize> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(QuoteReelError::storage(
                    &self.dir,
                    format!("list frames directory: {e}"),
                ));
            }
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| {
                QuoteReelError::storage(&self.dir, format!("list frames directory: {e}"))
            })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !self.is_frame_file(name) || !entry.path().is_file() {
                continue;
            }
            let path = entry.path();
            std::fs::remove_file(&path)
                .map_err(|e| QuoteReelError::storage(&path, format!("remove stale frame: {e}")))?;
            removed += 1;
        }

        if removed > 0 {
            tracing::warn!(removed, dir = %self.dir.display(), "removed stale frames");
        }
        Ok(removed)
    }

    /// Flatten `frame` over black and write it as frame `index`.
    pub fn store(&self, index: usize, frame: &FrameRGBA) -> QuoteReelResult<PathBuf> {
        let path = self.path_for(index);
        let rgba = frame.to_opaque_rgba8([0, 0, 0]);
        let img = image::RgbaImage::from_raw(frame.width, frame.height, rgba)
            .ok_or_else(|| QuoteReelError::storage(&path, "frame buffer size mismatch"))?;
        let rgb = image::DynamicImage::ImageRgba8(img).to_rgb8();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                QuoteReelError::storage(parent, format!("create frames directory: {e}"))
            })?;
        }
        rgb.save_with_format(&path, self.format.image_format())
            .map_err(|e| QuoteReelError::storage(&path, format!("write frame: {e}")))?;

        tracing::info!(index, path = %path.display(), "stored frame");
        Ok(path)
    }
}

/// Ordered, gap-free list of stored frame files.
#[derive(Clone, Debug)]
pub struct FrameSequence {
    pattern: PathBuf,
    paths: Vec<PathBuf>,
}

impl FrameSequence {
    /// Empty sequence for frames addressed by `store`'s pattern.
    pub fn new(store: &FrameStore) -> Self {
        Self {
            pattern: store.pattern(),
            paths: Vec::new(),
        }
    }

    /// Append frame `index`; it must be exactly the next index.
    pub fn push(&mut self, index: usize, path: PathBuf) -> QuoteReelResult<()> {
        let expected = self.paths.len();
        if index != expected {
            return Err(QuoteReelError::storage(
                path,
                format!("frame {index} is out of order; expected frame {expected}"),
            ));
        }
        self.paths.push(path);
        Ok(())
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// No frames yet.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Frame paths in index order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Encoder input pattern.
    pub fn pattern(&self) -> &Path {
        &self.pattern
    }

    /// Check that every frame is still on disk.
    pub fn verify_on_disk(&self) -> QuoteReelResult<()> {
        if self.paths.is_empty() {
            return Err(QuoteReelError::storage(
                &self.pattern,
                "frame sequence is empty",
            ));
        }
        for path in &self.paths {
            if !path.is_file() {
                return Err(QuoteReelError::storage(path, "frame file is missing"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/store.rs"]
mod tests;
