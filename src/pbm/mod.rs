//! Monochrome bitmaps and the row streams the scanner consumes.
//!
//! A pixel is stored as one byte holding `0` (white) or `1` (black), the same
//! convention netpbm uses for its `bit` rows. `Bitmap` owns a whole image and
//! is used for features; the image under search is only ever seen one row at a
//! time through a [`RowSource`].

use crate::util::{PbmGrepError, PbmGrepResult};
use std::io::BufRead;

#[cfg(feature = "image-io")]
pub mod io;
mod reader;

pub use reader::{PbmFormat, PbmReader};

/// Sequential access to the rows of a bitmap.
///
/// Implementors yield exactly `height()` rows of `width()` pixels each, top
/// to bottom.
pub trait RowSource {
    /// Returns the image width in pixels.
    fn width(&self) -> usize;

    /// Returns the image height in pixels.
    fn height(&self) -> usize;

    /// Reads the next row into `row`, which must hold `width()` pixels.
    fn read_row(&mut self, row: &mut [u8]) -> PbmGrepResult<()>;
}

/// Owned 1-bit image with one byte per pixel, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    bits: Vec<u8>,
    width: usize,
    height: usize,
}

impl Bitmap {
    /// Creates a bitmap from row-major pixels; any nonzero byte is black.
    pub fn new(bits: Vec<u8>, width: usize, height: usize) -> PbmGrepResult<Self> {
        if width == 0 || height == 0 {
            return Err(PbmGrepError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(PbmGrepError::InvalidDimensions { width, height })?;
        if bits.len() != needed {
            return Err(PbmGrepError::InvalidInput(
                "pixel buffer length does not match width * height",
            ));
        }
        let bits = bits.into_iter().map(|b| u8::from(b != 0)).collect();
        Ok(Self {
            bits,
            width,
            height,
        })
    }

    /// Creates an all-white bitmap.
    pub fn blank(width: usize, height: usize) -> PbmGrepResult<Self> {
        let len = width
            .checked_mul(height)
            .ok_or(PbmGrepError::InvalidDimensions { width, height })?;
        Self::new(vec![0; len], width, height)
    }

    /// Reads a complete PBM image (plain or raw) into memory.
    pub fn read<R: BufRead>(reader: R) -> PbmGrepResult<Self> {
        let mut pbm = PbmReader::new(reader)?;
        let width = pbm.width();
        let height = pbm.height();
        let len = width
            .checked_mul(height)
            .ok_or(PbmGrepError::InvalidDimensions { width, height })?;
        let mut bits = vec![0u8; len];
        for row in bits.chunks_exact_mut(width) {
            pbm.read_row(row)?;
        }
        Self::new(bits, width, height)
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns all pixels in row-major order.
    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    /// Returns row `y`, or `None` past the bottom edge.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.bits.get(start..start + self.width)
    }

    /// Returns the pixel at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.bits.get(y * self.width + x).copied()
    }

    /// Sets the pixel at `(x, y)`; out-of-bounds writes are rejected.
    pub fn set(&mut self, x: usize, y: usize, black: bool) -> PbmGrepResult<()> {
        if x >= self.width || y >= self.height {
            return Err(PbmGrepError::InvalidInput("pixel outside the bitmap"));
        }
        self.bits[y * self.width + x] = u8::from(black);
        Ok(())
    }

    /// Copies `other` into this bitmap with its top-left corner at `(x, y)`.
    pub fn paste(&mut self, other: &Bitmap, x: usize, y: usize) -> PbmGrepResult<()> {
        let fits_x = x
            .checked_add(other.width)
            .is_some_and(|end| end <= self.width);
        let fits_y = y
            .checked_add(other.height)
            .is_some_and(|end| end <= self.height);
        if !fits_x || !fits_y {
            return Err(PbmGrepError::InvalidInput("pasted bitmap does not fit"));
        }
        for (dy, src) in other.bits.chunks_exact(other.width).enumerate() {
            let start = (y + dy) * self.width + x;
            self.bits[start..start + other.width].copy_from_slice(src);
        }
        Ok(())
    }

    /// Returns a row source that streams this bitmap top to bottom.
    pub fn rows(&self) -> BitmapRows<'_> {
        BitmapRows {
            bitmap: self,
            next: 0,
        }
    }
}

/// Row stream over an in-memory [`Bitmap`].
pub struct BitmapRows<'a> {
    bitmap: &'a Bitmap,
    next: usize,
}

impl RowSource for BitmapRows<'_> {
    fn width(&self) -> usize {
        self.bitmap.width
    }

    fn height(&self) -> usize {
        self.bitmap.height
    }

    fn read_row(&mut self, row: &mut [u8]) -> PbmGrepResult<()> {
        let src = self.bitmap.row(self.next).ok_or(PbmGrepError::StreamRead {
            row: self.next,
            reason: "no rows left".to_string(),
        })?;
        if row.len() != src.len() {
            return Err(PbmGrepError::RowLength {
                expected: src.len(),
                got: row.len(),
            });
        }
        row.copy_from_slice(src);
        self.next += 1;
        Ok(())
    }
}
