// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline-wide constants

/// BT.601 luma weights for red, green and blue
///
/// Applied in `f64` and summed left to right before truncating toward zero.
/// Both backends use this exact order so edge pixels truncate identically.
pub const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// Largest squared luma difference for 8-bit channels (255²)
pub const MAX_DIFF_8BIT: i32 = 255 * 255;

/// Invocations per workgroup for the luma difference kernel
pub const WORKGROUP_SIZE: u32 = 64;

/// Decimal places used when printing the MSD
pub const DEFAULT_PRECISION: usize = 3;

/// Environment variable names read by [`crate::config::Config::from_env`]
pub mod env {
    /// Backend preference: `auto`, `gpu` or `cpu`
    pub const BACKEND: &str = "MSD_BACKEND";
    /// Adapter index as listed by `luma-msd devices`
    pub const ADAPTER: &str = "MSD_ADAPTER";
    /// Power preference: `high` or `low`
    pub const POWER: &str = "MSD_POWER";
    /// Thread count for the CPU backend
    pub const THREADS: &str = "MSD_THREADS";
}
