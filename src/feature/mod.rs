//! Features: the rectangular bit patterns searched for.
//!
//! A feature is packed once at load time into `rows * cols32` boundary-aligned
//! words. Its signature, the leftmost word of its bottom row, is what the
//! [`FeatureIndex`] keys on.

use crate::codec::{pack_aligned, WORD_BITS};
use crate::pbm::Bitmap;
use crate::scan::RowRing;
use crate::trace::trace_event;
use crate::util::{PbmGrepError, PbmGrepResult};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub mod index;
mod set;

pub use index::{FeatureId, FeatureIndex};
pub use set::FeatureSet;

/// An immutable template bitmap in packed form.
#[derive(Clone, Debug)]
pub struct Feature {
    label: String,
    rows: usize,
    cols: usize,
    cols32: usize,
    words: Vec<u32>,
    signature: u32,
}

impl Feature {
    /// Packs a bitmap into a feature.
    ///
    /// The width must be a positive multiple of 32 pixels.
    pub fn from_bitmap(label: impl Into<String>, bitmap: &Bitmap) -> PbmGrepResult<Self> {
        let label = label.into();
        let cols = bitmap.width();
        let rows = bitmap.height();
        if cols < WORD_BITS {
            return Err(PbmGrepError::FeatureTooNarrow { label, width: cols });
        }
        if cols % WORD_BITS != 0 {
            return Err(PbmGrepError::FeatureWidthUnaligned { label, width: cols });
        }
        let cols32 = cols / WORD_BITS;

        let mut words = Vec::with_capacity(rows * cols32);
        for y in 0..rows {
            let row = bitmap.row(y).ok_or(PbmGrepError::InvalidDimensions {
                width: cols,
                height: rows,
            })?;
            words.extend(pack_aligned(row, cols32)?);
        }
        let signature = words[(rows - 1) * cols32];

        Ok(Self {
            label,
            rows,
            cols,
            cols32,
            words,
            signature,
        })
    }

    /// Loads a feature from a PBM file; the path becomes its label.
    ///
    /// With the `image-io` feature, files that are not PBM are decoded with
    /// the `image` crate instead. Every failure, including an invalid width,
    /// is reported as [`PbmGrepError::Load`] carrying the path.
    pub fn load<P: AsRef<Path>>(path: P) -> PbmGrepResult<Self> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let load_error = |err: PbmGrepError| PbmGrepError::Load {
            path: label.clone(),
            reason: match err {
                PbmGrepError::InvalidHeader { reason } => reason,
                PbmGrepError::ImageIo { reason } => reason,
                other => other.to_string(),
            },
        };
        let io_error = |err: std::io::Error| PbmGrepError::Load {
            path: label.clone(),
            reason: err.to_string(),
        };

        let mut reader = BufReader::new(File::open(path).map_err(io_error)?);
        let is_pbm = matches!(reader.fill_buf().map_err(io_error)?, [b'P', b'1' | b'4', ..]);
        let bitmap = if is_pbm {
            Bitmap::read(reader)
        } else {
            load_foreign(path)
        };
        let bitmap = bitmap.map_err(load_error)?;

        let feature = Self::from_bitmap(label.clone(), &bitmap).map_err(load_error)?;
        trace_event!(
            "feature_loaded",
            label = feature.label.as_str(),
            rows = feature.rows,
            cols = feature.cols,
            signature = feature.signature
        );
        Ok(feature)
    }

    /// Returns the label reported on a match.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the height in pixels.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the width in pixels.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the width in packed words.
    pub fn cols32(&self) -> usize {
        self.cols32
    }

    /// Returns the packed words of row `y`.
    pub fn row_words(&self, y: usize) -> Option<&[u32]> {
        if y >= self.rows {
            return None;
        }
        let start = y * self.cols32;
        self.words.get(start..start + self.cols32)
    }

    /// Returns the leftmost packed word of the bottom row.
    pub fn signature(&self) -> u32 {
        self.signature
    }

    /// Tests the feature against the ring with its bottom row on image row `y`
    /// and its left edge on pixel `column * 32 + offset`.
    ///
    /// Returns `false` for any window that is not fully held by the ring.
    pub fn matches(&self, ring: &RowRing, offset: usize, column: usize, y: usize) -> bool {
        if y + 1 < self.rows || self.rows > ring.cycle_rows() {
            return false;
        }
        let top = y + 1 - self.rows;
        self.words
            .chunks_exact(self.cols32)
            .enumerate()
            .all(|(dy, expected)| {
                ring.row(top + dy)
                    .and_then(|row| row.window(offset, column, self.cols32))
                    .is_some_and(|window| window == expected)
            })
    }
}

#[cfg(feature = "image-io")]
fn load_foreign(path: &Path) -> PbmGrepResult<Bitmap> {
    crate::pbm::io::load_bitmap_image(path)
}

#[cfg(not(feature = "image-io"))]
fn load_foreign(_path: &Path) -> PbmGrepResult<Bitmap> {
    Err(PbmGrepError::InvalidHeader {
        reason: "not a PBM bitmap (expected P1 or P4)".to_string(),
    })
}
