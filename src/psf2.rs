//! PSF2 console font parser.
//!
//! Header layout (all fields little-endian `u32`): magic, version, header
//! size, flags, glyph count, bytes per glyph, height, width. Glyph bitmaps
//! follow the header. When bit 0 of the flags is set, a Unicode table
//! follows the glyphs: for each glyph, UTF-8 characters mapped to it,
//! optional `0xFE`-prefixed multi-codepoint sequences, then `0xFF`.

use crate::error::FontLoadError;
use crate::font::{Font, GlyphMap};
use crate::glyph::{stride, Glyph};

pub(crate) const MAGIC: [u8; 4] = [0x72, 0xb5, 0x4a, 0x86];

const HEADER_LEN: usize = 8 * 4;
const HAS_UNICODE_TABLE: u32 = 0x01;
const SEPARATOR: u8 = 0xFF;
const START_SEQUENCE: u8 = 0xFE;

struct Header {
    headersize: u32,
    flags: u32,
    length: u32,
    charsize: u32,
    height: u32,
    width: u32,
}

impl Header {
    fn read(bytes: &[u8]) -> Result<Self, FontLoadError> {
        let header = bytes.get(0..HEADER_LEN).ok_or(FontLoadError::UnexpectedEnd)?;
        if header[0..4] != MAGIC {
            return Err(FontLoadError::BadMagic);
        }
        let field = |index: usize| {
            let start = index * 4;
            u32::from_le_bytes([
                header[start],
                header[start + 1],
                header[start + 2],
                header[start + 3],
            ])
        };
        Ok(Self {
            headersize: field(2),
            flags: field(3),
            length: field(4),
            charsize: field(5),
            height: field(6),
            width: field(7),
        })
    }

    fn glyphs_end(&self) -> Option<usize> {
        (self.charsize as usize)
            .checked_mul(self.length as usize)?
            .checked_add(self.headersize as usize)
    }
}

pub(crate) fn parse(bytes: &[u8]) -> Result<Font, FontLoadError> {
    let header = Header::read(bytes)?;

    if (header.headersize as usize) < HEADER_LEN {
        return Err(FontLoadError::Malformed {
            line: 0,
            reason: format!("header size {} is smaller than the header", header.headersize),
        });
    }
    let expected = stride(header.width) * header.height as usize;
    if header.charsize as usize != expected {
        return Err(FontLoadError::BitmapSize {
            expected,
            actual: header.charsize as usize,
        });
    }

    let glyphs_end = header.glyphs_end().ok_or(FontLoadError::UnexpectedEnd)?;
    if glyphs_end > bytes.len() {
        return Err(FontLoadError::UnexpectedEnd);
    }

    let glyph = |index: u32| -> Result<Glyph, FontLoadError> {
        let offset = header.headersize as usize + index as usize * header.charsize as usize;
        let data = &bytes[offset..offset + header.charsize as usize];
        Glyph::new(header.width, header.height, header.width, data.to_vec())
    };

    let mut glyphs = GlyphMap::default();
    if header.flags & HAS_UNICODE_TABLE != 0 {
        for (c, index) in unicode_table(&bytes[glyphs_end..], header.length)? {
            if !glyphs.contains_key(&c) {
                glyphs.insert(c, glyph(index)?);
            }
        }
    } else {
        for index in 0..header.length {
            if let Some(c) = char::from_u32(index) {
                glyphs.insert(c, glyph(index)?);
            }
        }
    }

    Font::from_glyphs(header.width, header.height, glyphs)
}

/// Maps characters to glyph indices. Only single-codepoint entries are kept.
fn unicode_table(mut table: &[u8], length: u32) -> Result<Vec<(char, u32)>, FontLoadError> {
    let mut entries = Vec::new();
    let mut index = 0;
    let mut in_sequence = false;
    while index < length {
        let (&lead, rest) = table.split_first().ok_or(FontLoadError::UnexpectedEnd)?;
        match lead {
            SEPARATOR => {
                index += 1;
                in_sequence = false;
                table = rest;
            }
            START_SEQUENCE => {
                in_sequence = true;
                table = rest;
            }
            _ => {
                let len = utf8_len(lead).ok_or_else(|| FontLoadError::Malformed {
                    line: 0,
                    reason: format!("invalid UTF-8 lead byte {lead:#04x} in unicode table"),
                })?;
                let encoded = table.get(..len).ok_or(FontLoadError::UnexpectedEnd)?;
                let c = std::str::from_utf8(encoded)
                    .ok()
                    .and_then(|s| s.chars().next())
                    .ok_or_else(|| FontLoadError::Malformed {
                        line: 0,
                        reason: "invalid UTF-8 in unicode table".to_string(),
                    })?;
                if !in_sequence {
                    entries.push((c, index));
                }
                table = &table[len..];
            }
        }
    }
    Ok(entries)
}

fn utf8_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC0..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF7 => Some(4),
        _ => None,
    }
}
