// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use luma_msd::{BackendPreference, Config, PowerPreference};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "luma-msd")]
#[command(about = "Mean squared luma difference between two RGB images")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two images of identical dimensions
    Compare {
        /// First image
        image1: PathBuf,

        /// Second image
        image2: PathBuf,

        /// Compute backend (overrides MSD_BACKEND)
        #[arg(short, long, value_enum)]
        backend: Option<BackendPreference>,

        /// Adapter index from 'luma-msd devices' (overrides MSD_ADAPTER)
        #[arg(short, long)]
        adapter: Option<usize>,

        /// GPU power preference (overrides MSD_POWER)
        #[arg(long, value_enum)]
        power: Option<PowerPreference>,

        /// CPU backend worker threads (overrides MSD_THREADS)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Decimal places to print
        #[arg(short, long)]
        precision: Option<usize>,
    },

    /// List available compute adapters
    Devices {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=luma_msd=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compare {
            image1,
            image2,
            backend,
            adapter,
            power,
            threads,
            precision,
        } => {
            let mut config = Config::from_env()?;
            if let Some(backend) = backend {
                config.backend = backend;
            }
            if adapter.is_some() {
                config.adapter_index = adapter;
            }
            if let Some(power) = power {
                config.power_preference = power;
            }
            if threads.is_some() {
                config.cpu_threads = threads;
            }
            if let Some(precision) = precision {
                config.precision = precision;
            }
            cli::compare(&image1, &image2, &config)
        }
        Commands::Devices { json } => cli::list_devices(json),
    }
}
