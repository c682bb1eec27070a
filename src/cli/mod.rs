//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod config;
mod upscale;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// How progress is shown while upscaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProgressMode {
    /// Progress bar lines on stderr
    Console,
    /// One JSON object per update on stderr
    Json,
    /// No progress output
    None,
}

/// finescale - Detail-preserving image upscaler
#[derive(Parser)]
#[command(name = "fscale")]
#[command(about = "finescale - Denoise, Lanczos-resample and sharpen PNG images")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upscale a PNG image
    Upscale {
        /// Input PNG file
        input: PathBuf,

        /// Output PNG file.
        /// If omitted: {input_stem}_x{scale}.png next to the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Scale factor (any positive number, default: 2)
        #[arg(short, long, default_value = "2", value_parser = parse_scale)]
        scale: f64,

        /// Configuration file (default: discover fscale.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Progress display
        #[arg(long, value_enum, default_value = "console")]
        progress: ProgressMode,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Process rows on the calling thread only
        #[arg(long)]
        serial: bool,

        /// Number of worker threads for row processing (default: all cores)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Configuration file (default: discover fscale.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Parse a scale factor, rejecting values the pipeline cannot use.
fn parse_scale(value: &str) -> Result<f64, String> {
    let scale: f64 = value.parse().map_err(|_| format!("'{}' is not a number", value))?;
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err(format!("scale must be a positive finite number, got {}", value))
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins over the `-v` count.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Upscale { input, output, scale, config, progress, no_color, serial, jobs } => {
            upscale::run_upscale(upscale::UpscaleArgs {
                input: &input,
                output: output.as_deref(),
                scale,
                config: config.as_deref(),
                progress,
                no_color,
                serial,
                jobs,
            })
        }
        Commands::Config { config } => config::run_config(config.as_deref()),
    }
}
