//! Upscale orchestration
//!
//! [`upscale`] validates a request, then runs the stages in order:
//!
//! 1. widen to floats and split into luma/chroma
//! 2. bilateral denoise of the luma plane
//! 3. separable Lanczos resampling of the recomposed RGBA buffer
//! 4. edge enhancement and contrast normalization
//! 5. quantization back to 8-bit RGBA
//!
//! Progress is reported at fixed milestones (see [`Milestone`]) plus a
//! continuous range while resampling. A failed run never reports progress
//! past the point it failed at and returns no pixels.

use std::mem;
use std::time::{Duration, Instant};

use crate::color;
use crate::config::UpscaleConfig;
use crate::denoise::denoise;
use crate::enhance::enhance;
use crate::error::UpscaleError;
use crate::progress::{ProgressGate, ProgressSink};
use crate::resample::resample;

/// Largest float working buffer a run may allocate, in bytes.
const MAX_BUFFER_BYTES: usize = isize::MAX as usize;

/// Share of the progress range covered by resampling.
const RESAMPLE_SPAN: f32 = 45.0;

/// An 8-bit RGBA image and the factor to scale it by.
#[derive(Debug, Clone, PartialEq)]
pub struct UpscaleRequest {
    pub width: usize,
    pub height: usize,
    pub scale: f64,
    /// Row-major interleaved RGBA, `width * height * 4` bytes
    pub pixels: Vec<u8>,
}

impl UpscaleRequest {
    pub fn new(width: usize, height: usize, scale: f64, pixels: Vec<u8>) -> Self {
        Self { width, height, scale, pixels }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct UpscaleOutput {
    pub width: usize,
    pub height: usize,
    /// Row-major interleaved RGBA, `width * height * 4` bytes
    pub pixels: Vec<u8>,
    /// Wall-clock time of the run
    pub elapsed: Duration,
}

/// Fixed progress checkpoints of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    Starting,
    Denoise,
    PrepareResample,
    Resample,
    Enhance,
    Finalize,
    Done,
}

impl Milestone {
    /// Percent reported when the milestone is reached.
    pub fn percent(self) -> f32 {
        match self {
            Milestone::Starting => 0.0,
            Milestone::Denoise => 5.0,
            Milestone::PrepareResample | Milestone::Resample => 18.0,
            Milestone::Enhance => 68.0,
            Milestone::Finalize => 88.0,
            Milestone::Done => 100.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Milestone::Starting => "Starting…",
            Milestone::Denoise => "Running adaptive denoise…",
            Milestone::PrepareResample => "Preparing high-fidelity resampling…",
            Milestone::Resample => "Performing progressive Lanczos scaling…",
            Milestone::Enhance => "Enhancing edges & micro-contrast…",
            Milestone::Finalize => "Finalizing color & output…",
            Milestone::Done => "Done.",
        }
    }
}

/// Output dimensions for a scale factor, rounding half away from zero.
pub fn target_dimensions(width: usize, height: usize, scale: f64) -> (usize, usize) {
    let scaled = |len: usize| (len as f64 * scale).round() as usize;
    (scaled(width), scaled(height))
}

/// Per-run state threaded through the stages.
pub struct JobContext<'a> {
    pub config: &'a UpscaleConfig,
    progress: ProgressGate<'a>,
    started: Instant,
}

impl<'a> JobContext<'a> {
    pub fn new(config: &'a UpscaleConfig, sink: &'a dyn ProgressSink) -> Self {
        Self { config, progress: ProgressGate::new(sink), started: Instant::now() }
    }

    /// Report reaching `milestone`.
    pub fn milestone(&self, milestone: Milestone) {
        self.progress.report(milestone.percent(), Some(milestone.label()));
    }

    /// Report a resampling fraction in `[0, 1]`.
    pub fn resample_progress(&self, fraction: f32) {
        let percent = Milestone::Resample.percent() + RESAMPLE_SPAN * fraction;
        self.progress.report(percent, Some(Milestone::Resample.label()));
    }

    /// Run one stage, logging its duration.
    pub fn stage<T>(&self, name: &'static str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        tracing::debug!(stage = name, elapsed_ms = start.elapsed().as_millis() as u64, "stage finished");
        result
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Check a request and configuration, returning the output dimensions.
pub fn validate(request: &UpscaleRequest, config: &UpscaleConfig) -> Result<(usize, usize), UpscaleError> {
    let UpscaleRequest { width, height, scale, .. } = *request;

    if width == 0 || height == 0 {
        return Err(UpscaleError::EmptyImage { width, height });
    }

    let got = request.pixels.len();
    match width.checked_mul(height).and_then(|n| n.checked_mul(4)) {
        Some(expected) if expected == got => {}
        Some(expected) => return Err(UpscaleError::BufferSizeMismatch { expected, got }),
        None => return Err(UpscaleError::BufferSizeMismatch { expected: usize::MAX, got }),
    }

    if !(scale.is_finite() && scale > 0.0) {
        return Err(UpscaleError::InvalidScale(scale));
    }

    let scaled_width = (width as f64 * scale).round();
    let scaled_height = (height as f64 * scale).round();
    let too_large = UpscaleError::OutputTooLarge { width: scaled_width, height: scaled_height };
    if scaled_width >= usize::MAX as f64 || scaled_height >= usize::MAX as f64 {
        return Err(too_large);
    }

    let (new_width, new_height) = target_dimensions(width, height, scale);
    if new_width == 0 || new_height == 0 {
        return Err(UpscaleError::EmptyOutput { width: new_width, height: new_height });
    }

    // The resampling intermediate spans the larger extent on each axis
    let buffer_bytes = new_width
        .max(width)
        .checked_mul(new_height.max(height))
        .and_then(|n| n.checked_mul(4 * mem::size_of::<f32>()));
    if !matches!(buffer_bytes, Some(bytes) if bytes <= MAX_BUFFER_BYTES) {
        return Err(too_large);
    }

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(UpscaleError::InvalidConfig(errors));
    }

    Ok((new_width, new_height))
}

/// Fail with [`UpscaleError::NonFinite`] if any sample is NaN or infinite.
pub fn ensure_finite(samples: &[f32], stage: &'static str) -> Result<(), UpscaleError> {
    if samples.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(UpscaleError::NonFinite { stage })
    }
}

/// Upscale an RGBA image.
///
/// Validation happens before the first progress notification, so an invalid
/// request fails without reporting anything. On success the last update is
/// always 100 % with label `Done.`.
///
/// # Example
///
/// ```
/// use finescale::config::UpscaleConfig;
/// use finescale::pipeline::{upscale, UpscaleRequest};
/// use finescale::progress::NullProgress;
///
/// let request = UpscaleRequest::new(2, 2, 2.0, vec![128; 16]);
/// let output = upscale(&request, &UpscaleConfig::default(), &NullProgress).unwrap();
/// assert_eq!((output.width, output.height), (4, 4));
/// assert_eq!(output.pixels.len(), 4 * 4 * 4);
/// ```
pub fn upscale(
    request: &UpscaleRequest,
    config: &UpscaleConfig,
    sink: &dyn ProgressSink,
) -> Result<UpscaleOutput, UpscaleError> {
    let (new_width, new_height) = validate(request, config)?;
    let (width, height) = (request.width, request.height);
    let parallel = config.parallel;

    let ctx = JobContext::new(config, sink);
    tracing::debug!(width, height, new_width, new_height, parallel, "upscale started");
    ctx.milestone(Milestone::Starting);

    let rgba = color::to_float(&request.pixels);

    ctx.milestone(Milestone::Denoise);
    let denoised = ctx.stage("denoise", || {
        let mut planes = color::decompose(&rgba, width, height);
        planes.y = denoise(&planes.y, width, height, &ctx.config.denoise, parallel);
        planes.recompose()
    });
    drop(rgba);

    ctx.milestone(Milestone::PrepareResample);
    let scaled = ctx.stage("resample", || {
        resample(
            &denoised,
            width,
            height,
            new_width,
            new_height,
            &ctx.config.resample,
            parallel,
            &mut |fraction| ctx.resample_progress(fraction),
        )
    });
    drop(denoised);
    ensure_finite(&scaled, "resample")?;

    ctx.milestone(Milestone::Enhance);
    let enhanced = ctx.stage("enhance", || {
        enhance(&scaled, new_width, new_height, &ctx.config.enhance, parallel)
    });
    drop(scaled);
    ensure_finite(&enhanced, "enhance")?;

    ctx.milestone(Milestone::Finalize);
    let pixels = color::to_rgba8(&enhanced);
    ctx.milestone(Milestone::Done);

    let elapsed = ctx.elapsed();
    tracing::info!(
        width = new_width,
        height = new_height,
        elapsed_ms = elapsed.as_millis() as u64,
        "upscale finished"
    );

    Ok(UpscaleOutput { width: new_width, height: new_height, pixels, elapsed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RecordingProgress;

    fn checker(width: usize, height: usize) -> Vec<u8> {
        let mut pixels = Vec::with_capacity(width * height * 4);
        for y in 0..height {
            for x in 0..width {
                let v = if (x + y) % 2 == 0 { 40 } else { 210 };
                pixels.extend_from_slice(&[v, v / 2, 255 - v, 255]);
            }
        }
        pixels
    }

    #[test]
    fn test_target_dimensions_rounding() {
        assert_eq!(target_dimensions(4, 4, 2.0), (8, 8));
        assert_eq!(target_dimensions(3, 5, 1.5), (5, 8));
        assert_eq!(target_dimensions(10, 10, 0.25), (3, 3));
        assert_eq!(target_dimensions(1, 1, 0.4), (0, 0));
    }

    #[test]
    fn test_validate_empty_image() {
        let request = UpscaleRequest::new(0, 3, 2.0, Vec::new());
        assert_eq!(
            validate(&request, &UpscaleConfig::default()),
            Err(UpscaleError::EmptyImage { width: 0, height: 3 })
        );
    }

    #[test]
    fn test_validate_buffer_mismatch() {
        let request = UpscaleRequest::new(2, 2, 2.0, vec![0; 15]);
        assert_eq!(
            validate(&request, &UpscaleConfig::default()),
            Err(UpscaleError::BufferSizeMismatch { expected: 16, got: 15 })
        );
    }

    #[test]
    fn test_validate_overflowing_dimensions() {
        let request = UpscaleRequest::new(usize::MAX, 2, 2.0, vec![0; 4]);
        assert!(matches!(
            validate(&request, &UpscaleConfig::default()),
            Err(UpscaleError::BufferSizeMismatch { got: 4, .. })
        ));
    }

    #[test]
    fn test_validate_bad_scale() {
        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let request = UpscaleRequest::new(1, 1, scale, vec![0; 4]);
            assert!(matches!(
                validate(&request, &UpscaleConfig::default()),
                Err(UpscaleError::InvalidScale(_))
            ));
        }
    }

    #[test]
    fn test_validate_empty_output() {
        let request = UpscaleRequest::new(1, 1, 0.4, vec![0; 4]);
        assert_eq!(
            validate(&request, &UpscaleConfig::default()),
            Err(UpscaleError::EmptyOutput { width: 0, height: 0 })
        );
    }

    #[test]
    fn test_validate_rejects_unrepresentable_scale() {
        let request = UpscaleRequest::new(1, 1, 1e20, vec![10, 20, 30, 255]);
        assert!(matches!(
            validate(&request, &UpscaleConfig::default()),
            Err(UpscaleError::OutputTooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_overflowing_buffer() {
        // Each side fits in usize, the float buffer does not
        let scale = (1u64 << 33) as f64;
        let request = UpscaleRequest::new(1, 1, scale, vec![0; 4]);
        assert!(matches!(
            validate(&request, &UpscaleConfig::default()),
            Err(UpscaleError::OutputTooLarge { .. })
        ));
    }

    #[test]
    fn test_huge_scale_fails_without_progress() {
        let recorder = RecordingProgress::new();
        let request = UpscaleRequest::new(1, 1, 1e20, vec![10, 20, 30, 255]);
        assert!(upscale(&request, &UpscaleConfig::default(), &recorder).is_err());
        assert!(recorder.updates().is_empty());
    }

    #[test]
    fn test_negative_contrast_config_fails_cleanly() {
        let mut config = UpscaleConfig::default();
        config.enhance.contrast_strength = -1.0;
        let recorder = RecordingProgress::new();
        let request = UpscaleRequest::new(4, 4, 2.0, checker(4, 4));
        assert!(matches!(upscale(&request, &config, &recorder), Err(UpscaleError::InvalidConfig(_))));
        assert!(recorder.updates().is_empty());
    }

    #[test]
    fn test_validate_invalid_config() {
        let mut config = UpscaleConfig::default();
        config.resample.support = 0;
        let request = UpscaleRequest::new(1, 1, 2.0, vec![0; 4]);
        assert!(matches!(validate(&request, &config), Err(UpscaleError::InvalidConfig(e)) if e.len() == 1));
    }

    #[test]
    fn test_invalid_request_reports_nothing() {
        let recorder = RecordingProgress::new();
        let request = UpscaleRequest::new(2, 2, 2.0, vec![0; 3]);
        assert!(upscale(&request, &UpscaleConfig::default(), &recorder).is_err());
        assert!(recorder.updates().is_empty());
    }

    #[test]
    fn test_milestones_in_order() {
        let recorder = RecordingProgress::new();
        let request = UpscaleRequest::new(6, 5, 2.0, checker(6, 5));
        upscale(&request, &UpscaleConfig::default(), &recorder).unwrap();

        let updates = recorder.updates();
        let first = updates.first().unwrap();
        assert_eq!((first.percent, first.label), (0.0, Some("Starting…")));
        let last = updates.last().unwrap();
        assert_eq!((last.percent, last.label), (100.0, Some("Done.")));

        let milestone_labels: Vec<&str> = updates
            .iter()
            .filter_map(|u| u.label)
            .filter(|l| *l != Milestone::Resample.label())
            .collect();
        assert_eq!(
            milestone_labels,
            vec![
                "Starting…",
                "Running adaptive denoise…",
                "Preparing high-fidelity resampling…",
                "Enhancing edges & micro-contrast…",
                "Finalizing color & output…",
                "Done.",
            ]
        );

        let resampling: Vec<f32> = updates
            .iter()
            .filter(|u| u.label == Some(Milestone::Resample.label()))
            .map(|u| u.percent)
            .collect();
        assert!(!resampling.is_empty());
        assert!(resampling.iter().all(|p| (18.0..=63.0).contains(p)));
        assert_eq!(*resampling.last().unwrap(), 63.0);
    }

    #[test]
    fn test_progress_is_non_decreasing() {
        let recorder = RecordingProgress::new();
        let request = UpscaleRequest::new(30, 40, 1.7, checker(30, 40));
        upscale(&request, &UpscaleConfig::default(), &recorder).unwrap();
        let percents = recorder.percents();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
    }

    #[test]
    fn test_downscale_is_allowed() {
        let request = UpscaleRequest::new(8, 6, 0.5, checker(8, 6));
        let output = upscale(&request, &UpscaleConfig::default(), &RecordingProgress::new()).unwrap();
        assert_eq!((output.width, output.height), (4, 3));
        assert_eq!(output.pixels.len(), 4 * 3 * 4);
    }

    #[test]
    fn test_alpha_survives() {
        let request = UpscaleRequest::new(3, 3, 2.0, [10, 200, 90, 77].repeat(9));
        let output = upscale(&request, &UpscaleConfig::default(), &RecordingProgress::new()).unwrap();
        assert!(output.pixels.chunks_exact(4).all(|px| px[3] == 77));
    }

    #[test]
    fn test_ensure_finite() {
        assert!(ensure_finite(&[0.0, 255.0, -3.0], "enhance").is_ok());
        assert_eq!(
            ensure_finite(&[1.0, f32::NAN], "enhance"),
            Err(UpscaleError::NonFinite { stage: "enhance" })
        );
        assert!(ensure_finite(&[f32::INFINITY], "resample").is_err());
    }
}
