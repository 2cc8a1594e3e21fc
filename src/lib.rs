// SPDX-License-Identifier: GPL-3.0-only

//! Luma MSD - mean squared luma difference between two RGB images
//!
//! Both images are packed into fixed-layout pixel records, a per-pixel
//! compute kernel computes the squared difference of their truncated BT.601
//! luma, and the host reduces the results to their mean.
//!
//! # Architecture
//!
//! - [`gpu`]: Compute environment (wgpu device or CPU thread pool)
//! - [`shaders`]: Kernel source, pixel schema and compiled pipeline
//! - [`pipelines`]: Packing, dispatch and reduction
//! - [`config`]: Runtime configuration
//! - [`errors`]: Error types
//!
//! # Example
//!
//! ```no_run
//! use luma_msd::{ComputeEnvironment, Config, compute_msd};
//!
//! let env = ComputeEnvironment::new_blocking(&Config::default())?;
//! let a: image::DynamicImage = image::open("image0.png")?.to_rgb8().into();
//! let b: image::DynamicImage = image::open("image1.png")?.to_rgb8().into();
//! let msd = compute_msd(&env, &a, &b)?;
//! println!("MSD = {:.3}", msd);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod constants;
pub mod errors;
pub mod gpu;
pub mod pipelines;
pub mod shaders;

// Re-export commonly used types
pub use config::{BackendPreference, Config, PowerPreference};
pub use errors::{MsdError, MsdResult};
pub use gpu::{BackendKind, ComputeEnvironment};
pub use pipelines::msd::{
    DeviceExecutor, DiffSequence, MsdReport, Pixel, PixelSequence, compute_msd, measure_msd,
};
