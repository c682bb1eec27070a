//! Error types for the upscaling pipeline

use thiserror::Error;

/// Error returned when an upscale run cannot produce a result.
///
/// Numerical degeneracies (zero weight sums, flat images, empty histograms)
/// are not errors; each stage resolves them with a defined fallback.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum UpscaleError {
    /// Width or height is zero
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    EmptyImage { width: usize, height: usize },
    /// Pixel buffer length doesn't match width * height * 4
    #[error("pixel buffer: expected {expected} bytes, got {got}")]
    BufferSizeMismatch { expected: usize, got: usize },
    /// Scale factor is zero, negative, or not finite
    #[error("scale factor must be a positive finite number, got {0}")]
    InvalidScale(f64),
    /// Scaled dimensions round down to zero
    #[error("scaled image would be empty ({width}x{height})")]
    EmptyOutput { width: usize, height: usize },
    /// Scaled image buffers would not fit in the address space
    #[error("scaled image would be too large ({width}x{height})")]
    OutputTooLarge { width: f64, height: f64 },
    /// Tunable parameters failed validation
    #[error("invalid configuration:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    InvalidConfig(Vec<String>),
    /// A stage produced NaN or infinite samples
    #[error("{stage} produced non-finite samples")]
    NonFinite { stage: &'static str },
    /// Background worker terminated without delivering a result
    #[error("worker failed: {0}")]
    Worker(String),
}
