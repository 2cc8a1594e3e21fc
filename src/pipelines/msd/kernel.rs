// SPDX-License-Identifier: GPL-3.0-only

//! Host implementation of the luma difference kernel
//!
//! Mirrors `luma_diff.wgsl`: the weighted sum is evaluated in `f64` in the
//! same operation order, cast to `i32` with truncation toward zero, and the
//! difference is squared with 32-bit wrapping arithmetic.

use super::types::Pixel;
use crate::constants::LUMA_WEIGHTS;
use rayon::prelude::*;

/// Truncated BT.601 luma of one pixel
///
/// `((0.299 * r) + (0.587 * g)) + (0.114 * b)` in double precision, then
/// truncated. A sum that is an exact integer on paper can land just below it
/// in `f64` and truncate one lower, e.g. `(0, 72, 24)` gives 44.
#[inline]
pub fn luma(p: &Pixel) -> i32 {
    let [wr, wg, wb] = LUMA_WEIGHTS;
    (wr * f64::from(p.x) + wg * f64::from(p.y) + wb * f64::from(p.z)) as i32
}

/// Squared luma difference of two pixels
#[inline]
pub fn luma_diff(a: &Pixel, b: &Pixel) -> i32 {
    let delta = luma(a).wrapping_sub(luma(b));
    delta.wrapping_mul(delta)
}

/// Apply [`luma_diff`] to every index in parallel on the current rayon pool
///
/// Both slices must have the same length.
pub fn par_luma_diff(a: &[Pixel], b: &[Pixel]) -> Vec<i32> {
    debug_assert_eq!(a.len(), b.len());
    a.par_iter()
        .zip(b.par_iter())
        .map(|(p1, p2)| luma_diff(p1, p2))
        .collect()
}
