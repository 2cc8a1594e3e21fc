// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the MSD pipeline

use std::fmt;

/// Result type alias using MsdError
pub type MsdResult<T> = Result<T, MsdError>;

/// Errors raised while computing the mean squared luma difference
///
/// Every failure is fatal for the computation that raised it; nothing here is
/// retried.
#[derive(Debug, Clone, PartialEq)]
pub enum MsdError {
    /// No usable compute adapter or device could be created
    DeviceUnavailable(String),
    /// The kernel source failed to build; carries the compiler diagnostics
    KernelCompileError(String),
    /// The two inputs do not have the same size
    SizeMismatch(String),
    /// The inputs contain no pixels
    EmptyInput,
    /// Buffer allocation, upload or readback failed
    TransferError(String),
    /// The image is not 3-channel 8-bit RGB
    InvalidImageFormat(String),
    /// Image decoding failed
    Image(String),
    /// Invalid configuration value
    Config(String),
}

impl fmt::Display for MsdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MsdError::DeviceUnavailable(msg) => write!(f, "Compute device unavailable: {}", msg),
            MsdError::KernelCompileError(msg) => write!(f, "Kernel compilation failed:\n{}", msg),
            MsdError::SizeMismatch(msg) => write!(f, "Size mismatch: {}", msg),
            MsdError::EmptyInput => write!(f, "Input images contain no pixels"),
            MsdError::TransferError(msg) => write!(f, "Device transfer failed: {}", msg),
            MsdError::InvalidImageFormat(msg) => write!(f, "Invalid image format: {}", msg),
            MsdError::Image(msg) => write!(f, "Image error: {}", msg),
            MsdError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for MsdError {}

impl From<image::ImageError> for MsdError {
    fn from(err: image::ImageError) -> Self {
        MsdError::Image(err.to_string())
    }
}

impl From<wgpu::BufferAsyncError> for MsdError {
    fn from(err: wgpu::BufferAsyncError) -> Self {
        MsdError::TransferError(format!("Failed to map buffer: {}", err))
    }
}

impl From<wgpu::PollError> for MsdError {
    fn from(err: wgpu::PollError) -> Self {
        MsdError::TransferError(format!("Device poll failed: {}", err))
    }
}
