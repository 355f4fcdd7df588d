//! Text to heatmap-cell rasterization.

use std::fmt;

use crate::error::RenderError;
use crate::font::Font;
use crate::glyph::Glyph;

/// Rows of the heatmap, Sunday through Saturday.
pub const DAYS_PER_WEEK: u32 = 7;

/// Week columns a trailing twelve month heatmap shows.
pub const VISIBLE_WEEKS: u32 = 53;

/// A (week, day) cell of the heatmap. `day` is always below [`DAYS_PER_WEEK`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoordinate {
    pub week: u32,
    pub day: u32,
}

impl GridCoordinate {
    pub fn new(week: u32, day: u32) -> Self {
        debug_assert!(day < DAYS_PER_WEEK);
        Self { week, day }
    }
}

impl fmt::Display for GridCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "week {}, day {}", self.week, self.day)
    }
}

/// How a space in the message affects horizontal placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Spacing {
    /// A space consumes its glyph's advance, or the cell width when the font
    /// has no space glyph.
    #[default]
    Advance,
    /// A space consumes nothing and the surrounding words merge.
    Collapse,
}

#[derive(Clone)]
struct Placement<'a> {
    offset: u32,
    glyph: &'a Glyph,
}

/// A fully validated message, ready to be walked as grid coordinates.
#[derive(Clone)]
pub struct Raster<'a> {
    placements: Vec<Placement<'a>>,
    weeks: u32,
}

/// Lays `text` out with `font`.
///
/// Every character is resolved before anything is returned, so an unknown
/// character fails the whole message. Placement uses the cumulative advance
/// of the preceding characters.
pub fn rasterize<'a>(
    font: &'a Font,
    text: &str,
    spacing: Spacing,
) -> Result<Raster<'a>, RenderError> {
    let mut placements = Vec::new();
    let mut offset = 0u32;
    let mut weeks = 0u32;
    for c in text.chars() {
        if c == ' ' {
            if spacing == Spacing::Advance {
                offset += font.get(' ').map_or(font.width(), Glyph::advance);
            }
            continue;
        }
        let glyph = font.glyph(c)?;
        if let Some(bottom) = glyph.bottom_row() {
            if bottom >= DAYS_PER_WEEK {
                return Err(RenderError::GlyphTooTall {
                    ch: c,
                    rows: bottom + 1,
                });
            }
        }
        placements.push(Placement { offset, glyph });
        weeks = weeks.max(offset + glyph.width());
        offset += glyph.advance();
    }
    Ok(Raster { placements, weeks })
}

impl<'a> Raster<'a> {
    pub fn iter(&self) -> Coordinates<'_> {
        Coordinates {
            placements: &self.placements,
            index: 0,
            x: 0,
            y: 0,
        }
    }

    /// Number of lit cells.
    pub fn len(&self) -> usize {
        self.placements.iter().map(|p| p.glyph.lit_pixels()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Week columns spanned by the drawing.
    pub fn weeks(&self) -> u32 {
        self.weeks
    }

    /// Draws the heatmap as text, one line per day.
    pub fn preview(&self) -> String {
        let mut grid = vec![vec![' '; self.weeks as usize]; DAYS_PER_WEEK as usize];
        for coord in self.iter() {
            grid[coord.day as usize][coord.week as usize] = '█';
        }
        grid.into_iter()
            .map(|row| row.into_iter().collect::<String>().trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'r, 'a> IntoIterator for &'r Raster<'a> {
    type Item = GridCoordinate;
    type IntoIter = Coordinates<'r>;

    fn into_iter(self) -> Coordinates<'r> {
        self.iter()
    }
}

/// Lit cells in character order, then top to bottom, left to right.
#[derive(Clone)]
pub struct Coordinates<'r> {
    placements: &'r [Placement<'r>],
    index: usize,
    x: u32,
    y: u32,
}

impl Iterator for Coordinates<'_> {
    type Item = GridCoordinate;

    fn next(&mut self) -> Option<GridCoordinate> {
        loop {
            let placement = self.placements.get(self.index)?;
            let glyph = placement.glyph;
            if self.y >= glyph.height().min(DAYS_PER_WEEK) {
                self.index += 1;
                self.x = 0;
                self.y = 0;
                continue;
            }
            if self.x >= glyph.width() {
                self.x = 0;
                self.y += 1;
                continue;
            }
            let (x, y) = (self.x, self.y);
            self.x += 1;
            if glyph.get(x, y) {
                return Some(GridCoordinate::new(placement.offset + x, y));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font() -> Font {
        Font::builtin().unwrap()
    }

    #[test]
    fn emits_one_coordinate_per_lit_pixel() {
        let font = font();
        for message in ["A", "Hello, world!", "  2024  ", "greenwall"] {
            let raster = rasterize(&font, message, Spacing::Advance).unwrap();
            let expected: usize = message
                .chars()
                .filter(|&c| c != ' ')
                .map(|c| font.glyph(c).unwrap().lit_pixels())
                .sum();
            assert_eq!(raster.iter().count(), expected, "{message}");
            assert_eq!(raster.len(), expected, "{message}");
        }
    }

    #[test]
    fn single_glyph_stays_in_first_column_block() {
        let a = Glyph::new(3, 5, 4, vec![0x40, 0xA0, 0xE0, 0xA0, 0xA0]).unwrap();
        let font = Font::new(3, 5, [('A', a)]).unwrap();
        let raster = rasterize(&font, "A", Spacing::Advance).unwrap();
        let coords: Vec<_> = raster.iter().collect();
        assert_eq!(coords.len(), 10);
        // a 3-wide glyph spans weeks 0..3 with no offset
        assert_eq!(coords.iter().map(|c| c.week).max(), Some(2));
        assert_eq!(coords.iter().map(|c| c.week).min(), Some(0));
        assert_eq!(coords.iter().map(|c| c.day).min(), Some(0));
        assert_eq!(coords.iter().map(|c| c.day).max(), Some(4));
        assert_eq!(coords[0], GridCoordinate::new(1, 0));
    }

    #[test]
    fn single_column_glyph_has_week_zero() {
        let bar = Glyph::from_fn(1, 5, 2, |_, y| y != 2);
        let font = Font::new(1, 5, [('|', bar)]).unwrap();
        let raster = rasterize(&font, "|", Spacing::Advance).unwrap();
        assert!(raster.iter().all(|c| c.week == 0));
        let days: Vec<_> = raster.iter().map(|c| c.day).collect();
        assert_eq!(days, [0, 1, 3, 4]);
    }

    #[test]
    fn order_is_character_then_row_then_column() {
        let font = font();
        let raster = rasterize(&font, "II", Spacing::Advance).unwrap();
        let coords: Vec<_> = raster.iter().collect();
        let (first, second) = coords.split_at(coords.len() / 2);
        assert!(first.iter().all(|c| c.week < 6));
        assert!(second.iter().all(|c| c.week >= 6));
        assert!(first.windows(2).all(|w| (w[0].day, w[0].week) < (w[1].day, w[1].week)));
    }

    #[test]
    fn uses_cumulative_advance() {
        let font = font();
        // '!' advances 2, so the following glyph starts in column 2
        let raster = rasterize(&font, "!I", Spacing::Advance).unwrap();
        let min_i = raster.iter().filter(|c| c.week > 0).map(|c| c.week).min();
        assert_eq!(min_i, Some(3));
        assert_eq!(raster.weeks(), 2 + 5);
    }

    #[test]
    fn spaces_reserve_width_unless_collapsed() {
        let font = font();
        let spaced = rasterize(&font, "A A", Spacing::Advance).unwrap();
        let collapsed = rasterize(&font, "A A", Spacing::Collapse).unwrap();
        assert_eq!(spaced.weeks(), 6 + 4 + 5);
        assert_eq!(collapsed.weeks(), 6 + 5);
        assert_eq!(spaced.len(), collapsed.len());
        let joined = rasterize(&font, "AA", Spacing::Advance).unwrap();
        assert_eq!(collapsed.preview(), joined.preview());
    }

    #[test]
    fn space_without_glyph_uses_cell_width() {
        let dot = Glyph::from_fn(1, 1, 2, |_, _| true);
        let font = Font::new(3, 1, [('.', dot)]).unwrap();
        let raster = rasterize(&font, ". .", Spacing::Advance).unwrap();
        let weeks: Vec<_> = raster.iter().map(|c| c.week).collect();
        assert_eq!(weeks, [0, 5]);
    }

    #[test]
    fn unknown_glyph_fails_whole_message() {
        let font = font();
        let err = rasterize(&font, "ok€", Spacing::Advance).err().unwrap();
        assert_eq!(err, RenderError::UnknownGlyph(crate::UnknownGlyphError { ch: '€' }));
    }

    #[test]
    fn rejects_glyph_below_last_row() {
        let tall = Glyph::from_fn(2, 8, 3, |_, y| y == 7);
        let short = Glyph::from_fn(2, 8, 3, |_, y| y == 6);
        let font = Font::new(2, 8, [('t', tall), ('s', short)]).unwrap();
        assert_eq!(
            rasterize(&font, "st", Spacing::Advance).err(),
            Some(RenderError::GlyphTooTall { ch: 't', rows: 8 })
        );
        assert_eq!(rasterize(&font, "s", Spacing::Advance).unwrap().len(), 2);
    }

    #[test]
    fn iteration_is_restartable() {
        let font = font();
        let raster = rasterize(&font, "Hi", Spacing::Advance).unwrap();
        let first: Vec<_> = raster.iter().collect();
        let second: Vec<_> = (&raster).into_iter().collect();
        assert_eq!(first, second);

        let mut it = raster.iter();
        it.next();
        let resumed = it.clone();
        assert_eq!(it.collect::<Vec<_>>(), resumed.collect::<Vec<_>>());
    }

    #[test]
    fn preview_draws_rows() {
        let font = font();
        let raster = rasterize(&font, "T", Spacing::Advance).unwrap();
        let preview = raster.preview();
        let lines: Vec<_> = preview.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "█████");
        assert_eq!(lines[6], "  █");
    }

    #[test]
    fn empty_message_has_no_cells() {
        let font = font();
        let raster = rasterize(&font, "   ", Spacing::Advance).unwrap();
        assert!(raster.is_empty());
        assert_eq!(raster.weeks(), 0);
        assert_eq!(raster.iter().next(), None);
    }
}
