// SPDX-License-Identifier: GPL-3.0-only

//! Dispatch sizing and buffer readback shared by compute kernels

use crate::errors::{MsdError, MsdResult};

/// Helper for async buffer readback (map, poll, read, unmap)
///
/// # Arguments
/// * `device` - The wgpu device for polling
/// * `buffer` - The buffer to read from (must be MAP_READ)
///
/// # Returns
/// The buffer contents as a Vec<u8>
pub async fn read_buffer_async(device: &wgpu::Device, buffer: &wgpu::Buffer) -> MsdResult<Vec<u8>> {
    let slice = buffer.slice(..);
    let (sender, receiver) = futures::channel::oneshot::channel();

    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    device.poll(wgpu::PollType::wait_indefinitely())?;

    receiver
        .await
        .map_err(|_| MsdError::TransferError("Failed to receive buffer mapping".to_string()))??;

    let data = slice.get_mapped_range().to_vec();
    buffer.unmap();

    Ok(data)
}

/// Number of workgroups needed to cover `len` invocations
#[inline]
pub fn compute_dispatch_size(len: u32, workgroup_size: u32) -> u32 {
    len.div_ceil(workgroup_size)
}

/// Fold a 1-D workgroup count into an `(x, y)` grid
///
/// Devices cap the workgroup count per dimension, so counts above
/// `max_per_dimension` spill into `y`. The kernel flattens the grid back with
/// `gid.y * groups.x * WORKGROUP_SIZE + gid.x` and skips indices past the end.
pub fn dispatch_grid(workgroups: u32, max_per_dimension: u32) -> (u32, u32) {
    if workgroups <= max_per_dimension {
        (workgroups, 1)
    } else {
        (max_per_dimension, workgroups.div_ceil(max_per_dimension))
    }
}
