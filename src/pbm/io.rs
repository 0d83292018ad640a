//! Loading features from raster formats other than PBM via the `image` crate.
//!
//! Available when the `image-io` feature is enabled. Pixels are converted to
//! luma and thresholded: anything darker than mid-grey becomes black.

use crate::pbm::Bitmap;
use crate::util::{PbmGrepError, PbmGrepResult};
use std::path::Path;

const BLACK_BELOW: u8 = 128;

/// Converts a grayscale image buffer into a bitmap.
pub fn bitmap_from_gray_image(img: &image::GrayImage) -> PbmGrepResult<Bitmap> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let bits = img
        .as_raw()
        .iter()
        .map(|&luma| u8::from(luma < BLACK_BELOW))
        .collect();
    Bitmap::new(bits, width, height)
}

/// Loads an image from disk and thresholds it into a bitmap.
pub fn load_bitmap_image<P: AsRef<Path>>(path: P) -> PbmGrepResult<Bitmap> {
    let img = image::open(path).map_err(|err| PbmGrepError::ImageIo {
        reason: err.to_string(),
    })?;
    bitmap_from_gray_image(&img.to_luma8())
}
