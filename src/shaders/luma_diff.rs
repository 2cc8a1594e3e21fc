// SPDX-License-Identifier: GPL-3.0-only

//! Compiled squared-luma-difference compute pipeline

use super::gpu_utils::{self, BindingKind};
use crate::errors::{MsdError, MsdResult};
use tracing::{debug, info};

/// Name of the kernel entry point in `luma_diff.wgsl`
pub const LUMA_DIFF_ENTRY_POINT: &str = "luma_diff";

/// Uniform parameters for the kernel
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LumaDiffParams {
    /// Number of pixels; invocations at or past this index do nothing
    pub len: u32,
    pub _padding: [u32; 3],
}

impl LumaDiffParams {
    pub fn new(len: u32) -> Self {
        Self {
            len,
            _padding: [0; 3],
        }
    }
}

/// The luma difference kernel compiled for one device
///
/// Bindings:
/// - 0: image 1 pixels (storage, read-only)
/// - 1: image 2 pixels (storage, read-only)
/// - 2: squared differences (storage, read-write)
/// - 3: [`LumaDiffParams`] (uniform)
#[derive(Debug)]
pub struct LumaDiffPipeline {
    pub(crate) pipeline: wgpu::ComputePipeline,
    pub(crate) bind_group_layout: wgpu::BindGroupLayout,
}

impl LumaDiffPipeline {
    /// Compile the kernel against `device`
    ///
    /// Validation errors raised while building the shader module or pipeline
    /// are captured and returned as [`MsdError::KernelCompileError`] with the
    /// compiler messages attached.
    pub async fn new(device: &wgpu::Device) -> MsdResult<Self> {
        info!("Compiling luma difference kernel");
        let source = super::luma_diff_source();

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("luma_diff_shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let bind_group_layout = gpu_utils::create_layout(
            device,
            "luma_diff_bind_group_layout",
            &[
                BindingKind::StorageRead,
                BindingKind::StorageRead,
                BindingKind::StorageReadWrite,
                BindingKind::Uniform,
            ],
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("luma_diff_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = gpu_utils::create_pipeline(
            device,
            "luma_diff_pipeline",
            &pipeline_layout,
            &shader,
            LUMA_DIFF_ENTRY_POINT,
        );

        if let Some(error) = device.pop_error_scope().await {
            let info = shader.get_compilation_info().await;
            let diagnostics = format_diagnostics(&info.messages);
            return Err(MsdError::KernelCompileError(if diagnostics.is_empty() {
                error.to_string()
            } else {
                diagnostics
            }));
        }

        debug!(entry_point = LUMA_DIFF_ENTRY_POINT, "Luma difference kernel ready");

        Ok(Self {
            pipeline,
            bind_group_layout,
        })
    }
}

/// One line per compiler message, with its source position when known
fn format_diagnostics(messages: &[wgpu::CompilationMessage]) -> String {
    messages
        .iter()
        .map(|m| match &m.location {
            Some(loc) => format!(
                "{:?} at {}:{}: {}",
                m.message_type, loc.line_number, loc.line_position, m.message
            ),
            None => format!("{:?}: {}", m.message_type, m.message),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
