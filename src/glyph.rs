use crate::error::FontLoadError;

/// Number of bytes a packed row of `width` pixels occupies.
#[inline]
pub(crate) fn stride(width: u32) -> usize {
    (width as usize + 7) / 8
}

/// A single character bitmap.
///
/// Rows are stored top to bottom, each packed most-significant-bit first and
/// padded to a whole number of bytes, which is the layout shared by PSF2
/// glyph data and BDF `BITMAP` sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    width: u32,
    height: u32,
    advance: u32,
    bitmap: Box<[u8]>,
}

impl Glyph {
    pub fn new(
        width: u32,
        height: u32,
        advance: u32,
        bitmap: Vec<u8>,
    ) -> Result<Self, FontLoadError> {
        let expected = stride(width)
            .checked_mul(height as usize)
            .ok_or(FontLoadError::UnexpectedEnd)?;
        if bitmap.len() != expected {
            return Err(FontLoadError::BitmapSize {
                expected,
                actual: bitmap.len(),
            });
        }
        Ok(Self {
            width,
            height,
            advance,
            bitmap: bitmap.into_boxed_slice(),
        })
    }

    /// Builds a glyph by sampling `lit` at every pixel.
    pub fn from_fn(
        width: u32,
        height: u32,
        advance: u32,
        mut lit: impl FnMut(u32, u32) -> bool,
    ) -> Self {
        let row_bytes = stride(width);
        let mut bitmap = vec![0u8; row_bytes * height as usize];
        for y in 0..height {
            for x in 0..width {
                if lit(x, y) {
                    bitmap[y as usize * row_bytes + (x as usize >> 3)] |= BITS[x as usize & 7];
                }
            }
        }
        Self {
            width,
            height,
            advance,
            bitmap: bitmap.into_boxed_slice(),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Horizontal distance to the origin of the next glyph.
    #[inline]
    pub fn advance(&self) -> u32 {
        self.advance
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let byte = self.bitmap[y as usize * stride(self.width) + (x as usize >> 3)];
        byte & BITS[x as usize & 7] != 0
    }

    pub fn rows(&self) -> RowIter<'_> {
        RowIter {
            data: &self.bitmap,
            width: self.width as usize,
        }
    }

    pub fn lit_pixels(&self) -> usize {
        self.rows().flatten().filter(|&lit| lit).count()
    }

    /// Index of the lowest row holding a lit pixel.
    pub fn bottom_row(&self) -> Option<u32> {
        self.rows()
            .rposition(|mut row| row.any(|lit| lit))
            .map(|row| row as u32)
    }
}

#[derive(Clone)]
pub struct RowIter<'a> {
    data: &'a [u8],
    width: usize,
}

impl<'a> RowIter<'a> {
    #[inline]
    fn advance(&self) -> usize {
        (self.width + 7) / 8
    }
}

impl<'a> Iterator for RowIter<'a> {
    type Item = ColumnIter<'a>;
    #[inline]
    fn next(&mut self) -> Option<ColumnIter<'a>> {
        let advance = self.advance();
        if advance == 0 || self.data.len() < advance {
            return None;
        }
        let (next, rest) = self.data.split_at(advance);
        self.data = rest;
        Some(ColumnIter {
            data: next,
            bit: 0,
            width: self.width,
        })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len(), Some(self.len()))
    }
}

impl ExactSizeIterator for RowIter<'_> {
    #[inline]
    fn len(&self) -> usize {
        match self.advance() {
            0 => 0,
            advance => self.data.len() / advance,
        }
    }
}

impl<'a> DoubleEndedIterator for RowIter<'a> {
    #[inline]
    fn next_back(&mut self) -> Option<ColumnIter<'a>> {
        let advance = self.advance();
        if advance == 0 || self.data.len() < advance {
            return None;
        }
        let (rest, next) = self.data.split_at(self.data.len() - advance);
        self.data = rest;
        Some(ColumnIter {
            data: next,
            bit: 0,
            width: self.width,
        })
    }
}

#[derive(Clone)]
pub struct ColumnIter<'a> {
    data: &'a [u8],
    bit: usize,
    width: usize,
}

impl<'a> Iterator for ColumnIter<'a> {
    type Item = bool;

    #[inline]
    fn next(&mut self) -> Option<bool> {
        if self.bit >= self.width {
            return None;
        }

        let result = self.data[self.bit >> 3] & BITS[self.bit & 7] != 0;

        self.bit += 1;

        Some(result)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len(), Some(self.len()))
    }
}

impl ExactSizeIterator for ColumnIter<'_> {
    #[inline]
    fn len(&self) -> usize {
        self.width - self.bit
    }
}

const BITS: [u8; 8] = [
    1 << 7,
    1 << 6,
    1 << 5,
    1 << 4,
    1 << 3,
    1 << 2,
    1 << 1,
    1 << 0,
];
