// SPDX-License-Identifier: GPL-3.0-only

//! Image to pixel-sequence packing

use super::types::{Pixel, PixelSequence};
use crate::errors::{MsdError, MsdResult};
use image::{DynamicImage, RgbImage};

/// Pack a decoded image into device layout
///
/// The image must already be 8-bit RGB; converting alpha or grayscale inputs
/// is the caller's job (see `DynamicImage::to_rgb8`).
pub fn pack(image: &DynamicImage) -> MsdResult<PixelSequence> {
    match image {
        DynamicImage::ImageRgb8(rgb) => Ok(pack_rgb(rgb)),
        other => {
            let color = other.color();
            Err(MsdError::InvalidImageFormat(format!(
                "expected 3-channel 8-bit RGB, got {:?} with {} channel(s)",
                color,
                color.channel_count()
            )))
        }
    }
}

/// Pack an RGB buffer in row-major order
pub fn pack_rgb(image: &RgbImage) -> PixelSequence {
    let (width, height) = image.dimensions();
    PixelSequence {
        width,
        height,
        pixels: image.pixels().map(|p| Pixel::from(p.0)).collect(),
    }
}
