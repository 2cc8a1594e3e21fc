// SPDX-License-Identifier: GPL-3.0-only

//! Host-side mean of the per-pixel differences

use super::types::DiffSequence;
use crate::errors::{MsdError, MsdResult};

/// Arithmetic mean of `diffs` as `f64`
///
/// The sum is accumulated exactly in `i64` and divided once, so uniform
/// inputs reduce to their exact value.
pub fn reduce(diffs: &DiffSequence) -> MsdResult<f64> {
    if diffs.is_empty() {
        return Err(MsdError::EmptyInput);
    }
    let sum: i64 = diffs.as_slice().iter().map(|&d| i64::from(d)).sum();
    Ok(sum as f64 / diffs.len() as f64)
}
