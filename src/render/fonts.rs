//! Font resolution from configured files or the system font database.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{QuoteReelError, QuoteReelResult};

/// Optional font files; anything left unset is looked up in the system font database.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Face used for the quote (and the attribution when no italic face exists).
    pub regular: Option<PathBuf>,
    /// Face used for the attribution.
    pub italic: Option<PathBuf>,
    /// Weight requested when the quote face comes from the system database.
    ///
    /// The closest installed weight wins, so a family without a light face yields its
    /// regular one.
    pub quote_weight: u16,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            regular: None,
            italic: None,
            quote_weight: 300,
        }
    }
}

/// Font bytes plus enough identity to register and rasterize them.
#[derive(Clone)]
pub struct LoadedFont {
    /// Raw font file bytes.
    pub bytes: Arc<Vec<u8>>,
    /// Face index inside a collection file.
    pub index: u32,
    /// Family name reported by the font database (or the file name for explicit paths).
    pub family: String,
    /// Where the bytes came from; also the cache key for layout registration.
    pub origin: String,
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont")
            .field("bytes_len", &self.bytes.len())
            .field("index", &self.index)
            .field("family", &self.family)
            .field("origin", &self.origin)
            .finish()
    }
}

impl LoadedFont {
    /// Read a font file from disk.
    pub fn from_path(path: &Path) -> QuoteReelResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read font '{}'", path.display()))
            .map_err(|e| QuoteReelError::input(format!("{e:#}")))?;
        let family = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(Self {
            bytes: Arc::new(bytes),
            index: 0,
            family,
            origin: path.display().to_string(),
        })
    }

    /// Rasterizer handle for these bytes.
    pub fn font_data(&self) -> vello_cpu::peniko::FontData {
        vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(self.bytes.as_ref().clone()),
            self.index,
        )
    }
}

/// Faces used by every slide in a run.
#[derive(Clone, Debug)]
pub struct FontSet {
    /// Quote face.
    pub regular: LoadedFont,
    /// Attribution face, when an italic one was found or configured.
    pub italic: Option<LoadedFont>,
}

impl FontSet {
    /// Resolve the configured faces, falling back to the system font database.
    #[tracing::instrument(skip(cfg))]
    pub fn resolve(cfg: &FontConfig) -> QuoteReelResult<Self> {
        let explicit_regular = cfg.regular.as_deref().map(LoadedFont::from_path).transpose()?;
        let explicit_italic = cfg.italic.as_deref().map(LoadedFont::from_path).transpose()?;

        if let (Some(regular), Some(italic)) = (&explicit_regular, &explicit_italic) {
            return Ok(Self {
                regular: regular.clone(),
                italic: Some(italic.clone()),
            });
        }

        let db = system_font_db();
        let regular = match explicit_regular {
            Some(f) => f,
            None => query_system_font(&db, usvg::fontdb::Style::Normal, cfg.quote_weight).ok_or_else(|| {
                QuoteReelError::input(
                    "no usable font: configure fonts.regular or install a system sans-serif font",
                )
            })?,
        };
        let italic = match explicit_italic {
            Some(f) => Some(f),
            None => {
                let found = query_system_font(
                    &db,
                    usvg::fontdb::Style::Italic,
                    usvg::fontdb::Weight::NORMAL.0,
                );
                if found.is_none() {
                    tracing::warn!("no italic face found; attribution uses the regular face");
                }
                found
            }
        };

        tracing::debug!(regular = %regular.family, italic = ?italic.as_ref().map(|f| &f.family), "resolved fonts");
        Ok(Self { regular, italic })
    }

    /// Face for the attribution line.
    pub fn author_face(&self, want_italic: bool) -> &LoadedFont {
        match (&self.italic, want_italic) {
            (Some(italic), true) => italic,
            _ => &self.regular,
        }
    }
}

fn system_font_db() -> usvg::fontdb::Database {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    db
}

const PREFERRED_FAMILIES: &[&str] = &[
    "Arial",
    "Helvetica",
    "Liberation Sans",
    "DejaVu Sans",
    "Noto Sans",
    "Open Sans",
];

fn query_system_font(
    db: &usvg::fontdb::Database,
    style: usvg::fontdb::Style,
    weight: u16,
) -> Option<LoadedFont> {
    use usvg::fontdb::{Family, Query, Stretch, Weight};

    let mut families: Vec<Family<'_>> = PREFERRED_FAMILIES.iter().map(|f| Family::Name(f)).collect();
    families.push(Family::SansSerif);

    let query = Query {
        families: &families,
        weight: Weight(weight),
        stretch: Stretch::Normal,
        style,
    };

    let id = match db.query(&query) {
        Some(id) => id,
        // Italic is optional; only the regular face falls back to "anything installed".
        None if style == usvg::fontdb::Style::Normal => db.faces().next()?.id,
        None => return None,
    };

    let face = db.face(id)?;
    if style != usvg::fontdb::Style::Normal && face.style != style {
        return None;
    }
    let family = face
        .families
        .first()
        .map(|(name, _)| name.clone())
        .unwrap_or_else(|| "unknown".to_string());
    let (bytes, index) = db.with_face_data(id, |data, index| (data.to_vec(), index))?;

    Some(LoadedFont {
        bytes: Arc::new(bytes),
        index,
        origin: format!("system:{family}:{style:?}:{}", face.weight.0),
        family,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/fonts.rs"]
mod tests;
