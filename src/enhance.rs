//! Edge enhancement and contrast normalization on luma.
//!
//! The enhancer works on the Y plane only and reuses the input chroma and
//! alpha unchanged:
//!
//! 1. Blur Y with a separable Gaussian (clamp-to-edge).
//! 2. Re-add the detail `Y - blur`, boosted strongly on edges and weakly on
//!    flat texture, then damp the result back toward `Y`.
//! 3. Clip around the mean by a multiple of the standard deviation and widen
//!    the spread slightly.
//! 4. Stretch the histogram so the darkest and brightest tails map to 0 and 255.

use serde::{Deserialize, Serialize};

use crate::color::{decompose, recompose};
use crate::window::{convolve_axis, Axis};

/// Number of histogram buckets (one per 8-bit luma level).
const HISTOGRAM_BUCKETS: usize = 256;

/// Largest accepted blur radius.
pub const MAX_BLUR_RADIUS: u32 = 64;

/// Floor applied to the variance before taking its square root.
const MIN_VARIANCE: f64 = 1e-5;

/// Tunables for [`enhance`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceParams {
    /// Radius of the Gaussian blur in pixels
    pub blur_radius: u32,
    /// Sigma of the Gaussian blur
    pub blur_sigma: f32,
    /// Detail magnitude above which a pixel counts as an edge
    pub detail_threshold: f32,
    /// Detail gain on edges
    pub strong_boost: f32,
    /// Detail gain on flat texture
    pub weak_boost: f32,
    /// Fraction pulled back toward the unsharpened value
    pub damping: f32,
    /// Contrast widening strength
    pub contrast_strength: f64,
    /// Lower bound for the standard deviation used in clipping
    pub min_std: f64,
    /// Multiplier of `contrast_strength` in the clipping window
    pub std_spread: f64,
    /// Share of pixels treated as the dark tail of the histogram stretch
    pub low_clip_ratio: f64,
}

impl Default for EnhanceParams {
    fn default() -> Self {
        Self {
            blur_radius: 2,
            blur_sigma: 1.2,
            detail_threshold: 2.0,
            strong_boost: 0.85,
            weak_boost: 0.4,
            damping: 0.12,
            contrast_strength: 0.1,
            min_std: 28.0,
            std_spread: 2.2,
            low_clip_ratio: 0.05,
        }
    }
}

impl EnhanceParams {
    /// Check the parameters, returning one message per invalid field.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(self.blur_sigma > 0.0 && self.blur_sigma.is_finite()) {
            errors.push("enhance.blur_sigma must be a positive number".to_string());
        }
        if !(self.detail_threshold >= 0.0 && self.detail_threshold.is_finite()) {
            errors.push("enhance.detail_threshold must be a non-negative number".to_string());
        }
        if self.blur_radius > MAX_BLUR_RADIUS {
            errors.push(format!("enhance.blur_radius must be at most {}", MAX_BLUR_RADIUS));
        }
        for (name, value) in [("strong_boost", self.strong_boost as f64), ("weak_boost", self.weak_boost as f64)] {
            if !value.is_finite() {
                errors.push(format!("enhance.{} must be a finite number", name));
            }
        }
        // Negative values would invert the clipping window
        for (name, value) in [
            ("contrast_strength", self.contrast_strength),
            ("min_std", self.min_std),
            ("std_spread", self.std_spread),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                errors.push(format!("enhance.{} must be a non-negative number", name));
            }
        }
        if !(0.0..=1.0).contains(&self.damping) {
            errors.push("enhance.damping must be within 0.0..=1.0".to_string());
        }
        if !(0.0..0.5).contains(&self.low_clip_ratio) {
            errors.push("enhance.low_clip_ratio must be within 0.0..0.5".to_string());
        }
        errors
    }
}

/// Sharpen and contrast-normalize an interleaved RGBA float buffer.
///
/// # Panics
///
/// Panics if `rgba.len() != width * height * 4`.
pub fn enhance(
    rgba: &[f32],
    width: usize,
    height: usize,
    params: &EnhanceParams,
    parallel: bool,
) -> Vec<f32> {
    let planes = decompose(rgba, width, height);

    let blurred = gaussian_blur(&planes.y, width, height, params.blur_radius, params.blur_sigma, parallel);
    let sharpened = sharpen(&planes.y, &blurred, params);
    let normalized = contrast_normalize(&sharpened, params);

    recompose(&normalized, &planes.cb, &planes.cr, Some(&planes.alpha))
}

/// Half of a symmetric Gaussian kernel: `kernel[i]` is the weight at offset
/// `±i`. The full `2 * radius + 1` window sums to one.
pub fn gaussian_half_kernel(radius: u32, sigma: f32) -> Vec<f32> {
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..=radius).map(|i| (-((i * i) as f32) / denom).exp()).collect();
    let sum: f32 = kernel.iter().enumerate().map(|(i, &v)| if i == 0 { v } else { 2.0 * v }).sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

/// Separable Gaussian blur of a planar channel, horizontal then vertical.
pub fn gaussian_blur(
    plane: &[f32],
    width: usize,
    height: usize,
    radius: u32,
    sigma: f32,
    parallel: bool,
) -> Vec<f32> {
    let half = gaussian_half_kernel(radius, sigma);
    let kernel: Vec<f32> = half.iter().rev().chain(half.iter().skip(1)).copied().collect();

    let temp = convolve_axis(plane, width, height, &kernel, Axis::Horizontal, parallel);
    convolve_axis(&temp, width, height, &kernel, Axis::Vertical, parallel)
}

/// Re-add boosted detail to `original` and damp toward the original.
pub fn sharpen(original: &[f32], blurred: &[f32], params: &EnhanceParams) -> Vec<f32> {
    original
        .iter()
        .zip(blurred)
        .map(|(&orig, &soft)| {
            let detail = orig - soft;
            let boost = if detail.abs() > params.detail_threshold {
                params.strong_boost
            } else {
                params.weak_boost
            };
            let value = orig + boost * detail;
            value + params.damping * (orig - value)
        })
        .collect()
}

/// Mean and population standard deviation, with the variance floored.
pub fn mean_std(data: &[f32]) -> (f64, f64) {
    if data.is_empty() {
        return (0.0, MIN_VARIANCE.sqrt());
    }
    let n = data.len() as f64;
    let mean = data.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = data.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.max(MIN_VARIANCE).sqrt())
}

/// Clip around the mean, widen the spread, then stretch the histogram.
pub fn contrast_normalize(data: &[f32], params: &EnhanceParams) -> Vec<f32> {
    let strength = params.contrast_strength;
    let (mean, std) = mean_std(data);
    let target_std = std.max(params.min_std) * (1.0 + strength * params.std_spread);
    let min_range = mean - target_std;
    let max_range = mean + target_std;

    let mut adjusted: Vec<f32> = data
        .iter()
        .map(|&v| {
            let clipped = (v as f64).clamp(min_range, max_range);
            let widened = mean + (clipped - mean) * (1.0 + strength);
            widened.clamp(0.0, 255.0) as f32
        })
        .collect();

    if params.low_clip_ratio > 0.0 {
        stretch_histogram(&mut adjusted, params.low_clip_ratio);
    }
    adjusted
}

/// Build the 256-bucket histogram of rounded, clamped values.
pub fn histogram(data: &[f32]) -> [u32; HISTOGRAM_BUCKETS] {
    let mut buckets = [0u32; HISTOGRAM_BUCKETS];
    for &v in data {
        let bucket = v.round().clamp(0.0, 255.0) as usize;
        buckets[bucket] += 1;
    }
    buckets
}

/// Find the `(low, high)` stretch bounds of a histogram.
///
/// `low` is the first bucket whose cumulative count from the bottom reaches
/// `floor(total * ratio)`. `high` is the first bucket from the top whose
/// cumulative count reaches `total - floor(total * (1 - ratio))`.
pub fn stretch_bounds(buckets: &[u32; HISTOGRAM_BUCKETS], total: usize, ratio: f64) -> (usize, usize) {
    let lower_target = (total as f64 * ratio).floor() as u64;
    let upper_target = (total as f64 * (1.0 - ratio)).floor() as u64;
    let top_target = (total as u64).saturating_sub(upper_target);

    let mut cumulative = 0u64;
    let mut low = 0;
    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count as u64;
        if cumulative >= lower_target {
            low = i;
            break;
        }
    }

    cumulative = 0;
    let mut high = HISTOGRAM_BUCKETS - 1;
    for (i, &count) in buckets.iter().enumerate().rev() {
        cumulative += count as u64;
        if cumulative >= top_target {
            high = i;
            break;
        }
    }

    (low, high)
}

/// Linearly map `[low, high]` to `[0, 255]` in place.
///
/// Planes whose bounds are at most one level apart are left untouched.
fn stretch_histogram(data: &mut [f32], ratio: f64) {
    let buckets = histogram(data);
    let (low, high) = stretch_bounds(&buckets, data.len(), ratio);
    if high <= low + 1 {
        return;
    }

    let low = low as f32;
    let scale = 255.0 / (high as f32 - low);
    for v in data.iter_mut() {
        *v = ((*v - low) * scale).clamp(0.0, 255.0);
    }
}
