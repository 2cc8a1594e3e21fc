// SPDX-License-Identifier: GPL-3.0-only

//! Kernel dispatch over packed pixel sequences
//!
//! The executor validates its inputs before touching the device, then either
//! runs the wgpu pipeline (upload, dispatch, blocking readback) or maps the
//! host kernel over the CPU pool.

use super::kernel;
use super::types::{DiffSequence, Pixel, PixelSequence};
use crate::constants::WORKGROUP_SIZE;
use crate::errors::{MsdError, MsdResult};
use crate::gpu::{ComputeBackend, ComputeEnvironment, CpuContext, GpuContext};
use crate::shaders::{LumaDiffParams, compute_dispatch_size, dispatch_grid, read_buffer_async};
use std::mem::size_of;
use tracing::debug;
use wgpu::util::DeviceExt;

/// Check the two sequences can be compared, returning the pixel count
///
/// Runs before any buffer is allocated.
pub fn validate_inputs(seq1: &PixelSequence, seq2: &PixelSequence) -> MsdResult<usize> {
    if seq1.len() != seq2.len() {
        return Err(MsdError::SizeMismatch(format!(
            "{} pixels vs {} pixels",
            seq1.len(),
            seq2.len()
        )));
    }
    if seq1.is_empty() {
        return Err(MsdError::EmptyInput);
    }
    Ok(seq1.len())
}

/// Runs the luma difference kernel in a [`ComputeEnvironment`]
///
/// Holds no state of its own; every `run` allocates and releases its buffers.
pub struct DeviceExecutor<'a> {
    env: &'a ComputeEnvironment,
}

impl<'a> DeviceExecutor<'a> {
    pub fn new(env: &'a ComputeEnvironment) -> Self {
        Self { env }
    }

    /// Compute the squared luma difference of every pixel pair
    ///
    /// Fails with [`MsdError::SizeMismatch`] or [`MsdError::EmptyInput`]
    /// before any device work, and with [`MsdError::TransferError`] when a
    /// buffer cannot be allocated, uploaded or read back.
    pub fn run(&self, seq1: PixelSequence, seq2: PixelSequence) -> MsdResult<DiffSequence> {
        let len = validate_inputs(&seq1, &seq2)?;
        debug!(pixels = len, backend = %self.env.kind(), "Dispatching luma difference kernel");

        let diffs = match self.env.backend() {
            ComputeBackend::Gpu(ctx) => run_gpu(ctx, &seq1, &seq2)?,
            ComputeBackend::Cpu(ctx) => run_cpu(ctx, &seq1, &seq2),
        };

        debug_assert_eq!(diffs.len(), len);
        Ok(DiffSequence::from(diffs))
    }
}

fn run_cpu(ctx: &CpuContext, seq1: &PixelSequence, seq2: &PixelSequence) -> Vec<i32> {
    ctx.pool
        .install(|| kernel::par_luma_diff(seq1.as_slice(), seq2.as_slice()))
}

/// Reject inputs the device cannot hold before allocating anything
fn check_device_limits(limits: &wgpu::Limits, input_bytes: u64) -> MsdResult<()> {
    let max_binding = u64::from(limits.max_storage_buffer_binding_size);
    let max_buffer = limits.max_buffer_size;
    let max = max_binding.min(max_buffer);
    if input_bytes > max {
        return Err(MsdError::TransferError(format!(
            "input buffer of {} bytes exceeds device limit of {} bytes",
            input_bytes, max
        )));
    }
    Ok(())
}

fn run_gpu(ctx: &GpuContext, seq1: &PixelSequence, seq2: &PixelSequence) -> MsdResult<Vec<i32>> {
    let device = &ctx.device;
    let len = u32::try_from(seq1.len()).map_err(|_| {
        MsdError::TransferError(format!(
            "{} pixels exceeds the 32-bit dispatch range",
            seq1.len()
        ))
    })?;

    let input_bytes = seq1.len() as u64 * size_of::<Pixel>() as u64;
    let output_bytes = seq1.len() as u64 * size_of::<i32>() as u64;
    check_device_limits(&ctx.limits, input_bytes)?;

    let workgroups = compute_dispatch_size(len, WORKGROUP_SIZE);
    let max_per_dim = ctx.limits.max_compute_workgroups_per_dimension;
    let (groups_x, groups_y) = dispatch_grid(workgroups, max_per_dim);
    if groups_y > max_per_dim {
        return Err(MsdError::TransferError(format!(
            "{} workgroups exceed the device dispatch grid",
            workgroups
        )));
    }

    debug!(
        input_bytes,
        output_bytes, groups_x, groups_y, "Allocating luma difference buffers"
    );

    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let image1_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("luma_diff_image1_buffer"),
        contents: seq1.as_bytes(),
        usage: wgpu::BufferUsages::STORAGE,
    });

    let image2_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("luma_diff_image2_buffer"),
        contents: seq2.as_bytes(),
        usage: wgpu::BufferUsages::STORAGE,
    });

    let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("luma_diff_output_buffer"),
        size: output_bytes,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });

    // Staging buffer for readback
    let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("luma_diff_staging_buffer"),
        size: output_bytes,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("luma_diff_params_buffer"),
        contents: bytemuck::bytes_of(&LumaDiffParams::new(len)),
        usage: wgpu::BufferUsages::UNIFORM,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("luma_diff_bind_group"),
        layout: &ctx.kernel.bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: image1_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: image2_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: output_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: params_buffer.as_entire_binding(),
            },
        ],
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("luma_diff_encoder"),
    });

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("luma_diff_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&ctx.kernel.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(groups_x, groups_y, 1);
    }

    // Same submission as the dispatch; the in-order queue fences the copy
    encoder.copy_buffer_to_buffer(&output_buffer, 0, &staging_buffer, 0, output_bytes);

    ctx.queue.submit(std::iter::once(encoder.finish()));

    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());
    if let Some(error) = out_of_memory.or(validation) {
        return Err(MsdError::TransferError(error.to_string()));
    }

    let bytes = pollster::block_on(read_buffer_async(device, &staging_buffer))?;
    if bytes.len() as u64 != output_bytes {
        return Err(MsdError::TransferError(format!(
            "read back {} bytes, expected {}",
            bytes.len(),
            output_bytes
        )));
    }

    Ok(bytes
        .chunks_exact(size_of::<i32>())
        .map(bytemuck::pod_read_unaligned::<i32>)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(pixels: &[(i32, i32, i32)]) -> PixelSequence {
        let pixels: Vec<Pixel> = pixels.iter().map(|&(r, g, b)| Pixel::new(r, g, b)).collect();
        PixelSequence::new(pixels.len() as u32, 1, pixels).unwrap()
    }

    #[test]
    fn test_validate_rejects_size_mismatch() {
        let a = seq(&[(0, 0, 0), (1, 1, 1)]);
        let b = seq(&[(0, 0, 0)]);
        assert!(matches!(
            validate_inputs(&a, &b),
            Err(MsdError::SizeMismatch(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty() {
        let a = seq(&[]);
        let b = seq(&[]);
        assert_eq!(validate_inputs(&a, &b), Err(MsdError::EmptyInput));
    }

    #[test]
    fn test_check_device_limits() {
        let limits = wgpu::Limits::downlevel_defaults();
        let max = u64::from(limits.max_storage_buffer_binding_size);
        assert!(check_device_limits(&limits, max).is_ok());
        assert!(matches!(
            check_device_limits(&limits, max + 1),
            Err(MsdError::TransferError(_))
        ));
    }

    #[test]
    fn test_cpu_run_matches_scenario() {
        let env = ComputeEnvironment::cpu(Some(2)).unwrap();
        let a = seq(&[(0, 0, 0), (255, 255, 255)]);
        let b = seq(&[(0, 0, 0), (0, 0, 0)]);
        let diffs = DeviceExecutor::new(&env).run(a, b).unwrap();
        assert_eq!(diffs.as_slice(), &[0, 65025]);
    }
}
