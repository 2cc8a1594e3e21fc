// SPDX-License-Identifier: GPL-3.0-only

//! Mean squared luma difference between two RGB images
//!
//! # Pipeline Stages
//!
//! 1. **Pack**: flatten each image into row-major `Pixel` records
//! 2. **Execute**: upload both sequences, run the per-pixel kernel, read back
//! 3. **Reduce**: mean of the squared differences on the host
//!
//! Dimensions and emptiness are checked before packing so nothing is
//! allocated on the device for inputs that cannot be compared.

pub mod executor;
pub mod kernel;
pub mod packer;
pub mod reducer;
pub mod types;

pub use executor::DeviceExecutor;
pub use kernel::{luma, luma_diff};
pub use packer::{pack, pack_rgb};
pub use reducer::reduce;
pub use types::{DiffSequence, MsdReport, Pixel, PixelSequence};

use crate::errors::{MsdError, MsdResult};
use crate::gpu::ComputeEnvironment;
use image::{DynamicImage, GenericImageView};
use std::time::Instant;
use tracing::{debug, info};

/// Reject image pairs that cannot be compared
fn check_dimensions(image1: &DynamicImage, image2: &DynamicImage) -> MsdResult<()> {
    let (w1, h1) = image1.dimensions();
    let (w2, h2) = image2.dimensions();
    if (w1, h1) != (w2, h2) {
        return Err(MsdError::SizeMismatch(format!(
            "{}x{} vs {}x{}",
            w1, h1, w2, h2
        )));
    }
    if w1 == 0 || h1 == 0 {
        return Err(MsdError::EmptyInput);
    }
    Ok(())
}

/// Mean squared luma difference of two equally-sized 8-bit RGB images
pub fn compute_msd(
    env: &ComputeEnvironment,
    image1: &DynamicImage,
    image2: &DynamicImage,
) -> MsdResult<f64> {
    check_dimensions(image1, image2)?;

    let seq1 = pack(image1)?;
    let seq2 = pack(image2)?;
    debug!(pixels = seq1.len(), "Packed input images");

    let diffs = DeviceExecutor::new(env).run(seq1, seq2)?;
    reduce(&diffs)
}

/// [`compute_msd`] with wall-clock timing
pub fn measure_msd(
    env: &ComputeEnvironment,
    image1: &DynamicImage,
    image2: &DynamicImage,
) -> MsdResult<MsdReport> {
    let start = Instant::now();
    let msd = compute_msd(env, image1, image2)?;
    let elapsed = start.elapsed();

    let (width, height) = image1.dimensions();
    let report = MsdReport {
        msd,
        elapsed,
        pixel_count: width as usize * height as usize,
        backend: env.kind(),
    };

    info!(
        msd = report.msd,
        elapsed_ms = report.elapsed.as_secs_f64() * 1000.0,
        pixels = report.pixel_count,
        backend = %report.backend,
        "MSD computed"
    );

    Ok(report)
}
