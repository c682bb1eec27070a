//! finescale - Detail-preserving image upscaler
//!
//! This library provides functionality to:
//! - Denoise the luma of an RGBA image with an edge-preserving bilateral filter
//! - Rescale it by any positive factor with separable Lanczos resampling
//! - Restore crispness with thresholded unsharp masking and contrast normalization
//! - Report progress to pluggable sinks, optionally from a background thread
//!
//! The entry point is [`pipeline::upscale`]; [`output::upscale_file`] wraps it
//! for PNG files and [`worker::spawn`] runs it off the calling thread.

pub mod cli;
pub mod color;
pub mod config;
pub mod denoise;
pub mod enhance;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod resample;
pub mod window;
pub mod worker;

pub use config::UpscaleConfig;
pub use error::UpscaleError;
pub use pipeline::{upscale, UpscaleOutput, UpscaleRequest};
pub use progress::{ProgressSink, ProgressUpdate};
