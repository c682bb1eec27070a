//! fscale - Command-line tool for upscaling PNG images

use std::process::ExitCode;

use finescale::cli;

fn main() -> ExitCode {
    cli::run()
}
