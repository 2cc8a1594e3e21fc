// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Comparing two images
//! - Listing compute adapters

use image::DynamicImage;
use luma_msd::gpu::enumerate_adapters;
use luma_msd::{ComputeEnvironment, Config, MsdError, MsdResult, measure_msd};
use std::path::Path;
use tracing::info;

/// Decode an image and normalize it to 8-bit RGB
fn load_rgb(path: &Path) -> MsdResult<DynamicImage> {
    let image = image::open(path)
        .map_err(|e| MsdError::Image(format!("{}: {}", path.display(), e)))?;
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}

/// Compare two images and print the MSD and the time taken
pub fn compare(
    image1: &Path,
    image2: &Path,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    // Device setup happens before loading so a missing GPU fails fast
    let env = ComputeEnvironment::new_blocking(config)?;
    info!(device = %env.description(), "Compute environment ready");

    let image1 = load_rgb(image1)?;
    let image2 = load_rgb(image2)?;

    let report = measure_msd(&env, &image1, &image2)?;

    println!("MSD = {:.*}", config.precision, report.msd);
    println!("Time Taken: {:.3}s", report.elapsed.as_secs_f64());

    Ok(())
}

/// List all compute adapters visible to wgpu
pub fn list_devices(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let adapters = enumerate_adapters();

    if json {
        println!("{}", serde_json::to_string_pretty(&adapters)?);
        return Ok(());
    }

    if adapters.is_empty() {
        println!("No GPU adapters found. The CPU backend will be used.");
        return Ok(());
    }

    println!("Available adapters:");
    println!();
    for adapter in &adapters {
        println!("  [{}] {}", adapter.index, adapter.name);
        println!(
            "      Backend: {}, Type: {}",
            adapter.backend, adapter.device_type
        );
        if !adapter.driver.is_empty() {
            println!("      Driver: {}", adapter.driver);
        }
        if !adapter.supported {
            println!("      Unsupported: no 64-bit float shaders");
        }
    }

    Ok(())
}
