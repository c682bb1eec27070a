//! Config command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::config::loader::{find_config, load_config, to_toml};

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Print the effective configuration
pub fn run_config(config_path: Option<&Path>) -> ExitCode {
    let source = config_path.map(Path::to_path_buf).or_else(find_config);

    let config = match load_config(source.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    match to_toml(&config) {
        Ok(text) => {
            match &source {
                Some(path) => println!("# {}", path.display()),
                None => println!("# defaults (no fscale.toml found)"),
            }
            print!("{}", text);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: failed to render config: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
