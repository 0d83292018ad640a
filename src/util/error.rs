//! Error types for pbmgrep.

use thiserror::Error;

/// Result alias for pbmgrep operations.
pub type PbmGrepResult<T> = std::result::Result<T, PbmGrepError>;

/// Errors that can occur while loading features or scanning a bitmap stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PbmGrepError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Width or height is zero or overflows the addressable size.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The bitmap header could not be parsed.
    #[error("invalid bitmap header: {reason}")]
    InvalidHeader { reason: String },
    /// A row handed to the codec does not match the expected width.
    #[error("row length mismatch: expected {expected} pixels, got {got}")]
    RowLength { expected: usize, got: usize },
    /// The image is wider than the configured maximum.
    #[error("image is too wide ({width} > {max} pixels)")]
    StreamTooWide { width: usize, max: usize },
    /// A row of the image stream is malformed or truncated.
    #[error("failed to read row {row}: {reason}")]
    StreamRead { row: usize, reason: String },
    /// A feature file could not be opened or parsed.
    #[error("cannot load feature {path}: {reason}")]
    Load { path: String, reason: String },
    /// A feature narrower than one packed word.
    #[error("feature {label} is {width} pixels wide, at least 32 are required")]
    FeatureTooNarrow { label: String, width: usize },
    /// A feature whose width is not a whole number of packed words.
    #[error("feature {label} is {width} pixels wide, not a multiple of 32")]
    FeatureWidthUnaligned { label: String, width: usize },
    /// No features were supplied to build the index from.
    #[error("at least one feature is required")]
    NoFeatures,
    /// Rows were pushed after the scan reached a terminal state.
    #[error("scan already finished")]
    ScanFinished,
    /// Image decoding through the `image` crate failed.
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
}
