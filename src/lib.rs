//! pbmgrep finds rectangular bit patterns in a streamed monochrome bitmap.
//!
//! Features are packed into 32-bit words once and indexed by the leftmost
//! word of their bottom row. The image is read one row at a time into a ring
//! as tall as the tallest feature, so memory stays bounded however long the
//! image is. The scan stops at the first exact match.

pub mod codec;
pub mod feature;
pub mod pbm;
pub mod scan;
mod trace;
pub mod util;

pub use codec::{PackedRow, WORD_BITS};
pub use feature::{Feature, FeatureId, FeatureIndex, FeatureSet};
pub use pbm::{Bitmap, BitmapRows, PbmFormat, PbmReader, RowSource};
pub use scan::{scan, Match, RowRing, ScanConfig, ScanOutcome, Scanner, MAX_WIDTH};
pub use util::{PbmGrepError, PbmGrepResult};
