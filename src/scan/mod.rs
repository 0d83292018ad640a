//! Streaming scan over a bitmap.
//!
//! Rows are packed into a [`RowRing`] as they arrive. After each row every
//! window start of that row is looked up in the feature index by its packed
//! word, and only the features indexed under that word are compared in full.
//! The scan stops at the first confirmed match.

use crate::codec::WORD_BITS;
use crate::feature::{FeatureId, FeatureSet};
use crate::pbm::RowSource;
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::{PbmGrepError, PbmGrepResult};

mod ring;

pub use ring::RowRing;

/// Default upper bound on the image width in pixels.
pub const MAX_WIDTH: usize = 8192;

/// Scan configuration.
#[derive(Clone, Debug)]
pub struct ScanConfig {
    /// Images wider than this are rejected before any row is read.
    pub max_width: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_width: MAX_WIDTH,
        }
    }
}

/// A confirmed match, in pixel coordinates of its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    /// Left edge of the match.
    pub x: usize,
    /// Top edge of the match.
    pub y: usize,
    /// Width of the matched feature.
    pub width: usize,
    /// Height of the matched feature.
    pub height: usize,
    /// The feature that matched.
    pub feature: FeatureId,
}

impl Match {
    /// Formats the tab-separated report line (without a trailing newline).
    pub fn to_tsv(&self, features: &FeatureSet) -> String {
        let label = features.get(self.feature).map_or("", |f| f.label());
        format!(
            "{}\t{}\t{}\t{}\t{}",
            self.x, self.y, self.width, self.height, label
        )
    }
}

/// Terminal state of a scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A feature matched; nothing after it was examined.
    Found(Match),
    /// Every row was consumed without a match.
    Exhausted {
        /// Number of rows read.
        rows: usize,
    },
}

/// Row-by-row matcher.
///
/// Feed rows with [`Scanner::push_row`] until it returns a match or the image
/// ends. Once a match is returned the scanner refuses further rows.
pub struct Scanner<'a> {
    features: &'a FeatureSet,
    ring: RowRing,
    finished: bool,
}

impl<'a> Scanner<'a> {
    /// Prepares a scanner for an image `width` pixels wide.
    pub fn new(features: &'a FeatureSet, width: usize, cfg: &ScanConfig) -> PbmGrepResult<Self> {
        if width > cfg.max_width {
            return Err(PbmGrepError::StreamTooWide {
                width,
                max: cfg.max_width,
            });
        }
        let ring = RowRing::new(width, features.cycle_rows())?;
        Ok(Self {
            features,
            ring,
            finished: false,
        })
    }

    /// Returns the ring of recent rows.
    pub fn ring(&self) -> &RowRing {
        &self.ring
    }

    /// Returns how many rows have been consumed.
    pub fn rows_seen(&self) -> usize {
        self.ring.rows_seen()
    }

    /// Returns true once a match has been reported.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Consumes the next image row and returns the first match ending on it.
    pub fn push_row(&mut self, bits: &[u8]) -> PbmGrepResult<Option<Match>> {
        if self.finished {
            return Err(PbmGrepError::ScanFinished);
        }
        let y = self.ring.push(bits)?;
        let found = self.search_row(y);
        self.finished = found.is_some();
        Ok(found)
    }

    fn search_row(&self, y: usize) -> Option<Match> {
        let row = self.ring.row(y)?;
        let cols32 = row.cols32();
        let index = self.features.index();
        for column in 0..cols32 {
            for offset in 0..WORD_BITS {
                let signature = row.word(offset, column)?;
                for &id in index.lookup(signature) {
                    let feature = &self.features[id];
                    // The right-hand bound is exclusive: a feature never
                    // reaches the last packed column of the image.
                    if y + 1 < feature.rows() || column + feature.cols32() >= cols32 {
                        continue;
                    }
                    trace_debug!(
                        "candidate",
                        row = y,
                        column = column,
                        offset = offset,
                        feature = id.index()
                    );
                    if feature.matches(&self.ring, offset, column, y) {
                        return Some(Match {
                            x: column * WORD_BITS + offset,
                            y: y + 1 - feature.rows(),
                            width: feature.cols(),
                            height: feature.rows(),
                            feature: id,
                        });
                    }
                }
            }
        }
        None
    }
}

/// Streams every row of `source` through a [`Scanner`].
///
/// Returns at the first match; the remaining rows are left unread.
pub fn scan<S: RowSource>(
    features: &FeatureSet,
    source: &mut S,
    cfg: &ScanConfig,
) -> PbmGrepResult<ScanOutcome> {
    let width = source.width();
    let height = source.height();
    let _span = trace_span!(
        "scan",
        width = width,
        height = height,
        cycle_rows = features.cycle_rows()
    )
    .entered();

    let mut scanner = Scanner::new(features, width, cfg)?;
    let mut bits = vec![0u8; width];
    for _ in 0..height {
        source.read_row(&mut bits)?;
        if let Some(found) = scanner.push_row(&bits)? {
            trace_event!(
                "found",
                x = found.x,
                y = found.y,
                feature = found.feature.index()
            );
            return Ok(ScanOutcome::Found(found));
        }
    }

    trace_event!("exhausted", rows = height);
    Ok(ScanOutcome::Exhausted { rows: height })
}
