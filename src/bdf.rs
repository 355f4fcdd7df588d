//! Glyph Bitmap Distribution Format (BDF 2.1) parser.
//!
//! Every glyph is placed into the font cell described by `FONTBOUNDINGBOX`
//! (or `FONT_ASCENT` + `FONT_DESCENT` when present) relative to the
//! baseline, so glyphs with a short bounding box keep their vertical
//! position.

use crate::error::FontLoadError;
use crate::font::{Font, GlyphMap};
use crate::glyph::{stride, Glyph};

#[derive(Debug, Clone, Copy, Default)]
struct BoundingBox {
    width: u32,
    height: u32,
    x: i32,
    y: i32,
}

#[derive(Default)]
struct Char {
    encoding: Option<i64>,
    dwidth: Option<u32>,
    bbx: Option<BoundingBox>,
    bitmap: Vec<Vec<u8>>,
}

struct Parser<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    line: usize,
}

impl<'a> Parser<'a> {
    fn next(&mut self) -> Option<(&'a str, &'a str)> {
        for (index, line) in self.lines.by_ref() {
            self.line = index + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            return Some(match line.split_once(char::is_whitespace) {
                Some((keyword, rest)) => (keyword, rest.trim()),
                None => (line, ""),
            });
        }
        None
    }

    fn malformed(&self, reason: impl Into<String>) -> FontLoadError {
        FontLoadError::Malformed {
            line: self.line,
            reason: reason.into(),
        }
    }

    fn numbers<T: std::str::FromStr, const N: usize>(
        &self,
        keyword: &str,
        args: &str,
    ) -> Result<[T; N], FontLoadError> {
        let values = args
            .split_whitespace()
            .take(N)
            .map(str::parse)
            .collect::<Result<Vec<T>, _>>()
            .map_err(|_| self.malformed(format!("invalid {keyword} arguments '{args}'")))?;
        values
            .try_into()
            .map_err(|_| self.malformed(format!("{keyword} expects {N} values")))
    }
}

pub(crate) fn parse(text: &str) -> Result<Font, FontLoadError> {
    let mut parser = Parser {
        lines: text.lines().enumerate(),
        line: 0,
    };

    match parser.next() {
        Some(("STARTFONT", _)) => {}
        Some(_) => return Err(parser.malformed("expected STARTFONT")),
        None => return Err(FontLoadError::UnexpectedEnd),
    }

    let mut cell: Option<BoundingBox> = None;
    let mut ascent: Option<i32> = None;
    let mut descent: Option<i32> = None;
    let mut chars = Vec::new();

    loop {
        let (keyword, args) = parser.next().ok_or(FontLoadError::UnexpectedEnd)?;
        match keyword {
            "FONTBOUNDINGBOX" => {
                let [width, height, x, y] = parser.numbers::<i32, 4>(keyword, args)?;
                if width < 0 || height < 0 {
                    return Err(parser.malformed("negative FONTBOUNDINGBOX size"));
                }
                cell = Some(BoundingBox {
                    width: width as u32,
                    height: height as u32,
                    x,
                    y,
                });
            }
            "FONT_ASCENT" => ascent = Some(parser.numbers::<i32, 1>(keyword, args)?[0]),
            "FONT_DESCENT" => descent = Some(parser.numbers::<i32, 1>(keyword, args)?[0]),
            "STARTCHAR" => chars.push(parse_char(&mut parser)?),
            "ENDFONT" => break,
            _ => {}
        }
    }

    let cell = cell.ok_or_else(|| parser.malformed("missing FONTBOUNDINGBOX"))?;
    let (height, top) = match (ascent, descent) {
        (Some(ascent), Some(descent)) if ascent + descent > 0 => {
            ((ascent + descent) as u32, ascent)
        }
        _ => (cell.height, cell.height as i32 + cell.y),
    };

    let mut glyphs = GlyphMap::default();
    for c in chars {
        let ch = c.encoding.and_then(|e| u32::try_from(e).ok()).and_then(char::from_u32);
        let Some(ch) = ch else {
            continue;
        };
        let bbx = c.bbx.unwrap_or_default();
        // glyphs reaching left of the origin are shifted right, never clipped
        let left = bbx.x.max(0);
        let width = (left + bbx.width as i32) as u32;
        let advance = c.dwidth.unwrap_or(width);
        // row of the cell holding the first bitmap row
        let first_row = top - (bbx.y + bbx.height as i32);
        let glyph = Glyph::from_fn(width, height, advance, |x, y| {
            let gx = x as i32 - left;
            let gy = y as i32 - first_row;
            if gx < 0 || gy < 0 || gx >= bbx.width as i32 || gy >= bbx.height as i32 {
                return false;
            }
            c.bitmap
                .get(gy as usize)
                .and_then(|row| row.get(gx as usize >> 3))
                .is_some_and(|byte| byte & (0x80 >> (gx & 7)) != 0)
        });
        glyphs.insert(ch, glyph);
    }

    log::debug!("parsed BDF font: {} glyphs, {}x{} cell", glyphs.len(), cell.width, height);
    Font::from_glyphs(cell.width, height, glyphs)
}

fn parse_char(parser: &mut Parser<'_>) -> Result<Char, FontLoadError> {
    let mut c = Char::default();
    loop {
        let (keyword, args) = parser.next().ok_or(FontLoadError::UnexpectedEnd)?;
        match keyword {
            "ENCODING" => c.encoding = Some(parser.numbers::<i64, 1>(keyword, args)?[0]),
            "DWIDTH" => {
                let [x, _] = parser.numbers::<i32, 2>(keyword, args)?;
                c.dwidth = Some(x.max(0) as u32);
            }
            "BBX" => {
                let [width, height, x, y] = parser.numbers::<i32, 4>(keyword, args)?;
                if width < 0 || height < 0 {
                    return Err(parser.malformed("negative BBX size"));
                }
                c.bbx = Some(BoundingBox {
                    width: width as u32,
                    height: height as u32,
                    x,
                    y,
                });
            }
            "BITMAP" => {
                let bbx = c.bbx.ok_or_else(|| parser.malformed("BITMAP before BBX"))?;
                for _ in 0..bbx.height {
                    let (row, _) = parser.next().ok_or(FontLoadError::UnexpectedEnd)?;
                    c.bitmap.push(hex_row(parser, row, bbx.width)?);
                }
            }
            "ENDCHAR" => return Ok(c),
            "STARTCHAR" | "ENDFONT" => {
                return Err(parser.malformed(format!("unterminated glyph before {keyword}")));
            }
            _ => {}
        }
    }
}

fn hex_row(parser: &Parser<'_>, row: &str, width: u32) -> Result<Vec<u8>, FontLoadError> {
    if row.len() % 2 != 0 || row.len() / 2 < stride(width) {
        return Err(parser.malformed(format!("bitmap row '{row}' is too short for width {width}")));
    }
    (0..row.len())
        .step_by(2)
        .map(|i| {
            row.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| parser.malformed(format!("invalid hex in bitmap row '{row}'")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "\
STARTFONT 2.1
FONT -test-small
SIZE 5 75 75
FONTBOUNDINGBOX 3 5 0 -1
STARTPROPERTIES 2
FONT_ASCENT 4
FONT_DESCENT 1
ENDPROPERTIES
CHARS 3
STARTCHAR A
ENCODING 65
DWIDTH 4 0
BBX 3 4 0 0
BITMAP
40
A0
E0
A0
ENDCHAR
STARTCHAR period
ENCODING 46
DWIDTH 2 0
BBX 1 1 0 0
BITMAP
80
ENDCHAR
STARTCHAR unencoded
ENCODING -1
BBX 1 1 0 0
BITMAP
80
ENDCHAR
ENDFONT
";

    #[test]
    fn parses_cell_and_glyphs() {
        let font = parse(SMALL).unwrap();
        assert_eq!(font.width(), 3);
        assert_eq!(font.height(), 5);
        assert_eq!(font.len(), 2);

        let a = font.glyph('A').unwrap();
        assert_eq!(a.advance(), 4);
        assert_eq!(a.height(), 5);
        assert!(a.get(1, 0));
        assert!(a.get(0, 1) && a.get(2, 1));
        assert_eq!(a.lit_pixels(), 1 + 2 + 3 + 2);
        // descender row stays empty
        assert_eq!(a.bottom_row(), Some(3));
    }

    #[test]
    fn places_glyph_on_baseline() {
        let font = parse(SMALL).unwrap();
        let period = font.glyph('.').unwrap();
        assert_eq!(period.width(), 1);
        assert_eq!(period.advance(), 2);
        assert!(period.get(0, 3));
        assert_eq!(period.lit_pixels(), 1);
    }

    #[test]
    fn negative_x_offset_keeps_every_column() {
        let text = SMALL.replace("BBX 3 4 0 0", "BBX 3 4 -1 0");
        let font = parse(&text).unwrap();
        let a = font.glyph('A').unwrap();
        assert_eq!(a.width(), 3);
        assert_eq!(a.lit_pixels(), 8);
        assert!(a.get(0, 1) && a.get(2, 1));
    }

    #[test]
    fn positive_x_offset_pads_left() {
        let text = SMALL.replacen("BBX 1 1 0 0", "BBX 1 1 2 0", 1);
        let font = parse(&text).unwrap();
        let period = font.glyph('.').unwrap();
        assert_eq!(period.width(), 3);
        assert!(period.get(2, 3));
        assert_eq!(period.lit_pixels(), 1);
    }

    #[test]
    fn dwidth_defaults_to_bbx() {
        let text = SMALL.replace("DWIDTH 4 0\n", "");
        let font = parse(&text).unwrap();
        assert_eq!(font.glyph('A').unwrap().advance(), 3);
    }

    #[test]
    fn reports_line_of_bad_hex() {
        let text = SMALL.replace("A0\nE0", "A0\nZZ");
        match parse(&text) {
            Err(FontLoadError::Malformed { line, .. }) => assert_eq!(line, 17),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_truncated_font() {
        let text = &SMALL[..SMALL.find("ENDCHAR").unwrap()];
        assert!(matches!(parse(text), Err(FontLoadError::UnexpectedEnd)));
    }

    #[test]
    fn requires_bounding_box() {
        let text = SMALL.replace("FONTBOUNDINGBOX 3 5 0 -1\n", "");
        assert!(matches!(parse(&text), Err(FontLoadError::Malformed { .. })));
    }

    #[test]
    fn falls_back_to_bounding_box_without_ascent() {
        let text = SMALL.replace("FONT_ASCENT 4\n", "");
        let font = parse(&text).unwrap();
        assert_eq!(font.height(), 5);
        assert!(font.glyph('A').unwrap().get(1, 0));
    }
}
