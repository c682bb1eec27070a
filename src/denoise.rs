//! Edge-preserving bilateral denoise of the luma plane.
//!
//! Every output sample is a weighted average over its clamped 3x3
//! neighborhood. The weight of a neighbor is the product of a fixed spatial
//! Gaussian and a range term `exp(-(neighbor - center)^2 / (2 * range_sigma^2))`,
//! so neighbors across a strong edge contribute almost nothing. The filtered
//! plane is then blended back with the original to limit smoothing.

use serde::{Deserialize, Serialize};

use crate::window::{clamp_index, for_each_row, weighted_reduce};

/// Default spatial sigma of the 3x3 Gaussian.
pub const DEFAULT_SPATIAL_SIGMA: f32 = 1.25;

/// Default range sigma (in 0-255 luma units).
pub const DEFAULT_RANGE_SIGMA: f32 = 12.0;

/// Default share of the filtered plane in the final blend.
pub const DEFAULT_BLEND: f32 = 0.35;

/// Tunables for [`denoise`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseParams {
    /// Sigma of the spatial Gaussian over the 3x3 offsets
    pub spatial_sigma: f32,
    /// Sigma of the intensity-similarity term
    pub range_sigma: f32,
    /// Weight of the filtered result; `1 - blend` goes to the original
    pub blend: f32,
}

impl Default for DenoiseParams {
    fn default() -> Self {
        Self {
            spatial_sigma: DEFAULT_SPATIAL_SIGMA,
            range_sigma: DEFAULT_RANGE_SIGMA,
            blend: DEFAULT_BLEND,
        }
    }
}

impl DenoiseParams {
    /// Check the parameters, returning one message per invalid field.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(self.spatial_sigma > 0.0 && self.spatial_sigma.is_finite()) {
            errors.push("denoise.spatial_sigma must be a positive number".to_string());
        }
        if !(self.range_sigma > 0.0 && self.range_sigma.is_finite()) {
            errors.push("denoise.range_sigma must be a positive number".to_string());
        }
        if !(0.0..=1.0).contains(&self.blend) {
            errors.push("denoise.blend must be within 0.0..=1.0".to_string());
        }
        errors
    }
}

/// Normalized 3x3 spatial Gaussian, row-major over offsets -1..=1.
pub fn spatial_kernel(sigma: f32) -> [f32; 9] {
    let denom = 2.0 * sigma * sigma;
    let mut kernel = [0.0f32; 9];
    let mut sum = 0.0f32;
    let mut k = 0;
    for dy in -1i32..=1 {
        for dx in -1i32..=1 {
            let dist_sq = (dx * dx + dy * dy) as f32;
            let value = (-dist_sq / denom).exp();
            kernel[k] = value;
            sum += value;
            k += 1;
        }
    }
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

/// Bilateral-filter a luma plane and blend it with the original.
///
/// # Panics
///
/// Panics if `y.len() != width * height`.
pub fn denoise(
    y: &[f32],
    width: usize,
    height: usize,
    params: &DenoiseParams,
    parallel: bool,
) -> Vec<f32> {
    assert_eq!(y.len(), width * height);

    let spatial = spatial_kernel(params.spatial_sigma);
    let range_denom = 2.0 * params.range_sigma * params.range_sigma;
    let blend = params.blend;

    let mut out = vec![0.0f32; y.len()];
    for_each_row(&mut out, width, parallel, |row_y, row| {
        let rows = [
            clamp_index(row_y as isize - 1, height),
            row_y,
            clamp_index(row_y as isize + 1, height),
        ];
        for (x, dst) in row.iter_mut().enumerate() {
            let cols = [
                clamp_index(x as isize - 1, width),
                x,
                clamp_index(x as isize + 1, width),
            ];
            let center = y[row_y * width + x];
            let neighborhood = rows.iter().flat_map(|&ny| cols.iter().map(move |&nx| ny * width + nx));
            let samples = neighborhood.zip(spatial.iter()).map(|(idx, &spatial_weight)| {
                let neighbor = y[idx];
                let diff = neighbor - center;
                let range_weight = (-(diff * diff) / range_denom).exp();
                (neighbor, spatial_weight * range_weight)
            });
            let filtered = weighted_reduce(samples, center);
            *dst = center * (1.0 - blend) + filtered * blend;
        }
    });

    out
}
