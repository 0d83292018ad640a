//! Row codec: packs a row of pixels into 32-bit words.
//!
//! A packed row stores one word for every horizontal window start
//! `x = column * 32 + offset`. The word holds pixels `x ..= x + 31` with pixel
//! `x` in the most significant bit, so the words at `offset == 0` are the
//! plain boundary-aligned words and every other offset is the same row shifted
//! left by `offset` pixels. Words are laid out offset-major, which keeps the
//! `cols32` words a feature compares against contiguous in memory.

use crate::util::{PbmGrepError, PbmGrepResult};

/// Pixels per packed word.
pub const WORD_BITS: usize = 32;

/// One image row in sliding-window packed form.
#[derive(Clone, Debug)]
pub struct PackedRow {
    words: Vec<u32>,
    width: usize,
    cols32: usize,
}

impl PackedRow {
    /// Allocates an all-zero packed row for rows of `width` pixels.
    pub fn new(width: usize) -> Self {
        let cols32 = width / WORD_BITS;
        Self {
            words: vec![0; cols32 * WORD_BITS],
            width,
            cols32,
        }
    }

    /// Returns the row width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the number of whole words per row.
    pub fn cols32(&self) -> usize {
        self.cols32
    }

    /// Returns the word starting at pixel `column * 32 + offset`.
    pub fn word(&self, offset: usize, column: usize) -> Option<u32> {
        if offset >= WORD_BITS || column >= self.cols32 {
            return None;
        }
        Some(self.words[offset * self.cols32 + column])
    }

    /// Returns `len` consecutive words at `offset`, starting at `column`.
    pub fn window(&self, offset: usize, column: usize, len: usize) -> Option<&[u32]> {
        if offset >= WORD_BITS || column.checked_add(len)? > self.cols32 {
            return None;
        }
        let start = offset * self.cols32 + column;
        self.words.get(start..start + len)
    }

    /// Re-packs this row from `bits`, one byte per pixel.
    ///
    /// The accumulator is primed with the first 31 pixels and then emits one
    /// word per shifted-in pixel. Windows that run past the right edge see
    /// white pixels.
    pub fn pack(&mut self, bits: &[u8]) -> PbmGrepResult<()> {
        if bits.len() != self.width {
            return Err(PbmGrepError::RowLength {
                expected: self.width,
                got: bits.len(),
            });
        }
        let pixel = |x: usize| bits.get(x).map_or(0, |&b| u32::from(b != 0));

        let mut acc = 0u32;
        for x in 0..WORD_BITS - 1 {
            acc = (acc << 1) | pixel(x);
        }
        for start in 0..self.cols32 * WORD_BITS {
            acc = (acc << 1) | pixel(start + WORD_BITS - 1);
            let (column, offset) = (start / WORD_BITS, start % WORD_BITS);
            self.words[offset * self.cols32 + column] = acc;
        }
        Ok(())
    }
}

/// Packs the first `cols32 * 32` pixels of `bits` into boundary-aligned words.
///
/// Equivalent to the `offset == 0` words of a [`PackedRow`].
pub fn pack_aligned(bits: &[u8], cols32: usize) -> PbmGrepResult<Vec<u32>> {
    let needed = cols32 * WORD_BITS;
    if bits.len() < needed {
        return Err(PbmGrepError::RowLength {
            expected: needed,
            got: bits.len(),
        });
    }
    Ok(bits[..needed]
        .chunks_exact(WORD_BITS)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0u32, |acc, &b| (acc << 1) | u32::from(b != 0))
        })
        .collect())
}
