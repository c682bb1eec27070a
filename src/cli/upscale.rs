//! Upscale command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::config::loader::load_config;
use crate::output::{default_output_path, upscale_file, OutputError};
use crate::progress::{format_duration, ConsoleProgress, JsonProgress, NullProgress, ProgressSink};

use super::{ProgressMode, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Arguments of the upscale command
pub struct UpscaleArgs<'a> {
    pub input: &'a Path,
    pub output: Option<&'a Path>,
    pub scale: f64,
    pub config: Option<&'a Path>,
    pub progress: ProgressMode,
    pub no_color: bool,
    pub serial: bool,
    pub jobs: Option<usize>,
}

/// Execute the upscale command
pub fn run_upscale(args: UpscaleArgs<'_>) -> ExitCode {
    let mut config = match load_config(args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };
    if args.serial {
        config = config.serial();
    }

    if let Some(jobs) = args.jobs {
        if jobs == 0 {
            eprintln!("Error: --jobs must be at least 1");
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global() {
            tracing::warn!(error = %e, "could not size the thread pool");
        }
    }

    let use_colors = !args.no_color && std::env::var_os("NO_COLOR").is_none();
    let sink: Box<dyn ProgressSink> = match args.progress {
        ProgressMode::Console => Box::new(ConsoleProgress::new().with_colors(use_colors)),
        ProgressMode::Json => Box::new(JsonProgress::new()),
        ProgressMode::None => Box::new(NullProgress::new()),
    };

    let output = args
        .output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(args.input, args.scale));

    match upscale_file(args.input, &output, args.scale, &config, sink.as_ref()) {
        Ok(summary) => {
            let status = if use_colors { "\x1b[32m✓\x1b[0m" } else { "✓" };
            println!(
                "{} {} ({}x{}) in {}",
                status,
                output.display(),
                summary.width,
                summary.height,
                format_duration(summary.elapsed.as_millis() as u64)
            );
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(OutputError::UnsupportedFormat(path)) => {
            eprintln!("Error: {} is not a PNG image", path.display());
            ExitCode::from(EXIT_INVALID_ARGS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
