// SPDX-License-Identifier: GPL-3.0-only

//! Image comparison pipelines
//!
//! ```text
//! ┌──────────┐     ┌─────────────┐     ┌──────────────────────────┐     ┌─────────┐
//! │ Image 1  │ ──▶ │ PixelPacker │ ──▶ │      DeviceExecutor      │ ──▶ │ Reducer │ ──▶ MSD
//! │ Image 2  │ ──▶ │ PixelPacker │ ──▶ │ upload → kernel → fetch  │     │ (mean)  │
//! └──────────┘     └─────────────┘     └──────────────────────────┘     └─────────┘
//! ```
//!
//! Each stage runs to completion before the next begins. The kernel is the
//! only parallel stage.
//!
//! # Modules
//!
//! - [`msd`]: Mean squared luma difference

pub mod msd;
