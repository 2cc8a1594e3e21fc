// SPDX-License-Identifier: GPL-3.0-only

//! Host-side data model shared with the kernel

use crate::gpu::BackendKind;
use crate::shaders::{PIXEL_SCHEMA, schema_size};
use std::mem::{offset_of, size_of};
use std::time::Duration;

/// One packed RGB pixel
///
/// Byte-for-byte identical to the kernel's `Pixel` struct: three `i32`
/// channels in schema order, no padding.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Pixel {
    /// Red
    pub x: i32,
    /// Green
    pub y: i32,
    /// Blue
    pub z: i32,
}

const _: () = {
    assert!(size_of::<Pixel>() == schema_size());
    assert!(PIXEL_SCHEMA.len() == 3);
    assert!(offset_of!(Pixel, x) == 0);
    assert!(offset_of!(Pixel, y) == PIXEL_SCHEMA[0].size);
    assert!(offset_of!(Pixel, z) == PIXEL_SCHEMA[0].size + PIXEL_SCHEMA[1].size);
};

impl Pixel {
    pub const fn new(r: i32, g: i32, b: i32) -> Self {
        Self { x: r, y: g, z: b }
    }
}

impl From<[u8; 3]> for Pixel {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(i32::from(r), i32::from(g), i32::from(b))
    }
}

/// Row-major pixels of one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSequence {
    pub(super) width: u32,
    pub(super) height: u32,
    pub(super) pixels: Vec<Pixel>,
}

impl PixelSequence {
    /// Wrap pixels scanned left-to-right, top-to-bottom
    ///
    /// Returns `None` when `pixels.len() != width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<Pixel>) -> Option<Self> {
        if (width as usize).checked_mul(height as usize) != Some(pixels.len()) {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn as_slice(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Raw bytes in device layout
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

/// Per-pixel squared luma differences, index-aligned with the inputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSequence(Vec<i32>);

impl DiffSequence {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }
}

impl From<Vec<i32>> for DiffSequence {
    fn from(diffs: Vec<i32>) -> Self {
        Self(diffs)
    }
}

/// Result of one timed MSD computation
#[derive(Debug, Clone, PartialEq)]
pub struct MsdReport {
    /// Mean squared luma difference
    pub msd: f64,
    /// Wall time for pack, dispatch, readback and reduction
    pub elapsed: Duration,
    /// Pixels compared
    pub pixel_count: usize,
    /// Backend the kernel ran on
    pub backend: BackendKind,
}
