use std::fs;
use std::hash::BuildHasherDefault;
use std::path::Path;

use rustc_hash::FxHasher;

use crate::error::{FontLoadError, UnknownGlyphError};
use crate::glyph::Glyph;
use crate::{bdf, psf2};

pub(crate) type GlyphMap = hashbrown::HashMap<char, Glyph, BuildHasherDefault<FxHasher>>;

/// 5x7 proportional font compiled into the binary.
const BUILTIN: &str = include_str!("../fonts/heatmap-5x7.bdf");

/// A loaded bitmap font. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Font {
    glyphs: GlyphMap,
    width: u32,
    height: u32,
}

impl Font {
    pub fn new(
        width: u32,
        height: u32,
        glyphs: impl IntoIterator<Item = (char, Glyph)>,
    ) -> Result<Self, FontLoadError> {
        Self::from_glyphs(width, height, glyphs.into_iter().collect())
    }

    pub(crate) fn from_glyphs(
        width: u32,
        height: u32,
        glyphs: GlyphMap,
    ) -> Result<Self, FontLoadError> {
        if glyphs.is_empty() {
            return Err(FontLoadError::Empty);
        }
        Ok(Self {
            glyphs,
            width,
            height,
        })
    }

    /// The embedded 5x7 font.
    pub fn builtin() -> Result<Self, FontLoadError> {
        bdf::parse(BUILTIN)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FontLoadError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| FontLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded {} bytes of font data from {}", data.len(), path.display());
        Self::from_bytes(&data)
    }

    /// Parses PSF2 or BDF data, detected from the content.
    pub fn from_bytes(data: &[u8]) -> Result<Self, FontLoadError> {
        if data.starts_with(&psf2::MAGIC) {
            return psf2::parse(data);
        }
        let text = String::from_utf8_lossy(data);
        if text.trim_start().starts_with("STARTFONT") {
            return bdf::parse(&text);
        }
        Err(FontLoadError::UnknownFormat)
    }

    /// Cell width of the font.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Cell height of the font.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn get(&self, c: char) -> Option<&Glyph> {
        self.glyphs.get(&c)
    }

    pub fn glyph(&self, c: char) -> Result<&Glyph, UnknownGlyphError> {
        self.get(c).ok_or(UnknownGlyphError { ch: c })
    }
}
