// SPDX-License-Identifier: GPL-3.0-only

//! Compute environment setup
//!
//! The [`ComputeEnvironment`] is created once by the entry point and passed by
//! reference to every MSD computation. It owns either a wgpu device and queue
//! with the compiled kernel, or a rayon thread pool for the CPU backend.
//! Callers sharing one environment across threads must serialize access.

use crate::config::{BackendPreference, Config};
use crate::errors::{MsdError, MsdResult};
use crate::shaders::LumaDiffPipeline;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// Which backend an environment runs kernels on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Gpu,
    Cpu,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Gpu => write!(f, "GPU"),
            BackendKind::Cpu => write!(f, "CPU"),
        }
    }
}

/// Information about the created GPU device
#[derive(Debug, Clone)]
pub struct GpuDeviceInfo {
    /// Name of the GPU adapter
    pub adapter_name: String,
    /// Backend being used (Vulkan, Metal, DX12, etc.)
    pub backend: wgpu::Backend,
    /// Adapter class (discrete, integrated, software)
    pub device_type: wgpu::DeviceType,
}

/// Adapter summary as printed by `luma-msd devices`
#[derive(Debug, Clone, Serialize)]
pub struct AdapterSummary {
    pub index: usize,
    pub name: String,
    pub backend: String,
    pub device_type: String,
    pub driver: String,
    /// Whether the kernel can run on this adapter
    pub supported: bool,
}

/// wgpu device, queue and the compiled kernel
#[derive(Debug)]
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub info: GpuDeviceInfo,
    pub limits: wgpu::Limits,
    pub kernel: LumaDiffPipeline,
}

/// Thread pool the CPU backend dispatches into
#[derive(Debug)]
pub struct CpuContext {
    pub pool: rayon::ThreadPool,
}

/// The context kernels are dispatched into
#[derive(Debug)]
pub enum ComputeBackend {
    Gpu(GpuContext),
    Cpu(CpuContext),
}

/// Process-wide compute context
#[derive(Debug)]
pub struct ComputeEnvironment {
    backend: ComputeBackend,
}

impl ComputeEnvironment {
    /// Create the environment described by `config`
    ///
    /// With [`BackendPreference::Auto`] a missing GPU is not fatal: the
    /// environment falls back to the CPU backend. A kernel that fails to
    /// compile is always fatal.
    pub async fn new(config: &Config) -> MsdResult<Self> {
        match config.backend {
            BackendPreference::Gpu => Ok(Self::from_gpu(create_gpu_context(config).await?)),
            BackendPreference::Cpu => Self::cpu(config.cpu_threads),
            BackendPreference::Auto => match create_gpu_context(config).await {
                Ok(ctx) => Ok(Self::from_gpu(ctx)),
                Err(MsdError::DeviceUnavailable(reason)) => {
                    warn!(%reason, "No usable GPU, falling back to CPU backend");
                    Self::cpu(config.cpu_threads)
                }
                Err(e) => Err(e),
            },
        }
    }

    /// Blocking wrapper around [`ComputeEnvironment::new`]
    pub fn new_blocking(config: &Config) -> MsdResult<Self> {
        pollster::block_on(Self::new(config))
    }

    /// CPU-backed environment with an optional fixed thread count
    pub fn cpu(threads: Option<usize>) -> MsdResult<Self> {
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|i| format!("msd-cpu-{}", i));
        if let Some(threads) = threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| MsdError::DeviceUnavailable(format!("Failed to start CPU pool: {}", e)))?;

        info!(threads = pool.current_num_threads(), "CPU compute backend ready");

        Ok(Self {
            backend: ComputeBackend::Cpu(CpuContext { pool }),
        })
    }

    fn from_gpu(ctx: GpuContext) -> Self {
        Self {
            backend: ComputeBackend::Gpu(ctx),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self.backend {
            ComputeBackend::Gpu(_) => BackendKind::Gpu,
            ComputeBackend::Cpu(_) => BackendKind::Cpu,
        }
    }

    /// Human-readable description of the active device
    pub fn description(&self) -> String {
        match &self.backend {
            ComputeBackend::Gpu(ctx) => format!("{} ({:?})", ctx.info.adapter_name, ctx.info.backend),
            ComputeBackend::Cpu(ctx) => format!("CPU ({} threads)", ctx.pool.current_num_threads()),
        }
    }

    pub fn gpu(&self) -> Option<&GpuContext> {
        match &self.backend {
            ComputeBackend::Gpu(ctx) => Some(ctx),
            ComputeBackend::Cpu(_) => None,
        }
    }

    pub fn backend(&self) -> &ComputeBackend {
        &self.backend
    }
}

/// Backends to probe; `WGPU_BACKEND` narrows the set
fn instance_backends() -> wgpu::Backends {
    wgpu::Backends::from_env().unwrap_or(wgpu::Backends::PRIMARY)
}

fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: instance_backends(),
        ..Default::default()
    })
}

/// List the adapters wgpu can see, in the order `--adapter` indexes them
pub fn enumerate_adapters() -> Vec<AdapterSummary> {
    let instance = create_instance();
    instance
        .enumerate_adapters(instance_backends())
        .into_iter()
        .enumerate()
        .map(|(index, adapter)| {
            let info = adapter.get_info();
            AdapterSummary {
                index,
                name: info.name,
                backend: format!("{:?}", info.backend),
                device_type: format!("{:?}", info.device_type),
                driver: info.driver,
                supported: adapter.features().contains(REQUIRED_FEATURES),
            }
        })
        .collect()
}

/// Device features the kernel needs; luma is evaluated in `f64`
pub const REQUIRED_FEATURES: wgpu::Features = wgpu::Features::SHADER_F64;

/// Reject adapters that cannot run the kernel
///
/// Reported as [`MsdError::DeviceUnavailable`] so that
/// [`BackendPreference::Auto`] falls back to the CPU backend.
fn check_adapter_features(adapter_name: &str, features: wgpu::Features) -> MsdResult<()> {
    if features.contains(REQUIRED_FEATURES) {
        Ok(())
    } else {
        Err(MsdError::DeviceUnavailable(format!(
            "Adapter {} lacks required features {:?}",
            adapter_name, REQUIRED_FEATURES
        )))
    }
}

/// Create a wgpu device and queue and compile the kernel on it
pub async fn create_gpu_context(config: &Config) -> MsdResult<GpuContext> {
    info!(
        adapter_index = ?config.adapter_index,
        power = ?config.power_preference,
        "Creating GPU device for compute"
    );

    let instance = create_instance();

    let adapter = match config.adapter_index {
        Some(index) => instance
            .enumerate_adapters(instance_backends())
            .into_iter()
            .nth(index)
            .ok_or_else(|| {
                MsdError::DeviceUnavailable(format!("No adapter with index {}", index))
            })?,
        None => instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference.to_wgpu(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| {
                MsdError::DeviceUnavailable(format!("Failed to find suitable GPU adapter: {}", e))
            })?,
    };

    let adapter_info = adapter.get_info();
    let adapter_limits = adapter.limits();

    check_adapter_features(&adapter_info.name, adapter.features())?;

    info!(
        adapter = %adapter_info.name,
        backend = ?adapter_info.backend,
        device_type = ?adapter_info.device_type,
        "GPU adapter selected for compute"
    );

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("luma_msd_device"),
            required_features: REQUIRED_FEATURES,
            required_limits: adapter_limits.clone(),
            memory_hints: wgpu::MemoryHints::Performance,
            ..Default::default()
        })
        .await
        .map_err(|e| MsdError::DeviceUnavailable(format!("Failed to create GPU device: {}", e)))?;

    debug!(
        max_storage_binding = adapter_limits.max_storage_buffer_binding_size,
        max_buffer = adapter_limits.max_buffer_size,
        max_workgroups = adapter_limits.max_compute_workgroups_per_dimension,
        "Device limits"
    );

    let kernel = LumaDiffPipeline::new(&device).await?;

    let info = GpuDeviceInfo {
        adapter_name: adapter_info.name.clone(),
        backend: adapter_info.backend,
        device_type: adapter_info.device_type,
    };

    Ok(GpuContext {
        device,
        queue,
        info,
        limits: adapter_limits,
        kernel,
    })
}
