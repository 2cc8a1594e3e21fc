// SPDX-License-Identifier: GPL-3.0-only

//! Runtime configuration
//!
//! Defaults are overridden by `MSD_*` environment variables and then by
//! command-line flags. There is no configuration file.

use crate::constants::{self, DEFAULT_PRECISION};
use crate::errors::{MsdError, MsdResult};
use serde::{Deserialize, Serialize};

/// Which compute backend the environment should use
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// Use a GPU adapter when one is available, otherwise the CPU backend
    #[default]
    Auto,
    /// Require a GPU adapter
    Gpu,
    /// Always use the CPU backend
    Cpu,
}

impl BackendPreference {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "gpu" => Some(Self::Gpu),
            "cpu" => Some(Self::Cpu),
            _ => None,
        }
    }
}

/// GPU adapter power preference
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PowerPreference {
    /// Prefer a discrete GPU
    #[default]
    High,
    /// Prefer an integrated GPU
    Low,
}

impl PowerPreference {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn to_wgpu(self) -> wgpu::PowerPreference {
        match self {
            Self::High => wgpu::PowerPreference::HighPerformance,
            Self::Low => wgpu::PowerPreference::LowPower,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Compute backend preference
    pub backend: BackendPreference,
    /// Adapter index from `luma-msd devices`; `None` lets wgpu choose
    pub adapter_index: Option<usize>,
    /// Power preference used when `adapter_index` is not set
    pub power_preference: PowerPreference,
    /// Worker threads for the CPU backend; `None` uses rayon's default
    pub cpu_threads: Option<usize>,
    /// Decimal places for printed results
    pub precision: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendPreference::default(), // Auto
            adapter_index: None,
            power_preference: PowerPreference::default(), // High
            cpu_threads: None,
            precision: DEFAULT_PRECISION,
        }
    }
}

impl Config {
    /// Default configuration with `MSD_*` environment overrides applied
    pub fn from_env() -> MsdResult<Self> {
        Self::default().with_overrides(std::env::vars())
    }

    /// Apply `MSD_*` key/value overrides, ignoring unrelated keys
    pub fn with_overrides<I, K, V>(mut self, vars: I) -> MsdResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let value = value.as_ref();
            match key.as_ref() {
                constants::env::BACKEND => {
                    self.backend = BackendPreference::parse(value).ok_or_else(|| {
                        invalid(constants::env::BACKEND, value, "auto, gpu or cpu")
                    })?;
                }
                constants::env::ADAPTER => {
                    self.adapter_index = Some(value.trim().parse().map_err(|_| {
                        invalid(constants::env::ADAPTER, value, "an adapter index")
                    })?);
                }
                constants::env::POWER => {
                    self.power_preference = PowerPreference::parse(value)
                        .ok_or_else(|| invalid(constants::env::POWER, value, "high or low"))?;
                }
                constants::env::THREADS => {
                    let threads: usize = value.trim().parse().map_err(|_| {
                        invalid(constants::env::THREADS, value, "a positive integer")
                    })?;
                    if threads == 0 {
                        return Err(invalid(
                            constants::env::THREADS,
                            value,
                            "a positive integer",
                        ));
                    }
                    self.cpu_threads = Some(threads);
                }
                _ => {}
            }
        }
        Ok(self)
    }
}

fn invalid(key: &str, value: &str, expected: &str) -> MsdError {
    MsdError::Config(format!("{}={:?}: expected {}", key, value, expected))
}
