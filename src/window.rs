//! Windowed weighted reduction shared by every filter stage.
//!
//! The denoiser, the resampler and the Gaussian blur all compute an output
//! sample as a weighted average over a small neighborhood. This module owns
//! the pieces they have in common:
//!
//! - clamp-to-edge coordinate handling ([`clamp_index`])
//! - weighted averaging with a pass-through fallback ([`weighted_reduce`])
//! - normalization of resampling taps with single-tap and uniform fallbacks
//!   ([`normalize_taps`])
//! - a clamped 1-D convolution along either image axis ([`convolve_axis`])
//! - a row driver that runs rows sequentially or on the rayon pool
//!   ([`for_each_row`])

use rayon::prelude::*;

/// One source sample contributing to a destination sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tap {
    /// Source coordinate along the filtered axis
    pub index: usize,
    /// Contribution weight
    pub weight: f32,
}

impl Tap {
    pub fn new(index: usize, weight: f32) -> Self {
        Self { index, weight }
    }
}

/// Image axis a 1-D pass runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Along rows (x varies)
    Horizontal,
    /// Along columns (y varies)
    Vertical,
}

/// Clamp a possibly out-of-range coordinate to `[0, len)`.
///
/// `len` must be non-zero.
#[inline]
pub fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

/// Weighted average of `(value, weight)` pairs.
///
/// Returns `fallback` when the weights do not sum to a positive number, so
/// a neighborhood whose weights all vanish passes its center through.
#[inline]
pub fn weighted_reduce<I>(samples: I, fallback: f32) -> f32
where
    I: IntoIterator<Item = (f32, f32)>,
{
    let mut sum = 0.0f32;
    let mut weight_sum = 0.0f32;
    for (value, weight) in samples {
        sum += value * weight;
        weight_sum += weight;
    }
    if weight_sum > 0.0 {
        sum / weight_sum
    } else {
        fallback
    }
}

/// Normalize candidate taps so their weights sum to one.
///
/// - No candidates: a single tap of weight 1 at `fallback_index`.
/// - Weights summing to exactly zero: uniform weights over the candidates.
pub fn normalize_taps(candidates: Vec<Tap>, fallback_index: usize) -> Vec<Tap> {
    if candidates.is_empty() {
        return vec![Tap::new(fallback_index, 1.0)];
    }

    let sum: f32 = candidates.iter().map(|t| t.weight).sum();
    if sum == 0.0 {
        let uniform = 1.0 / candidates.len() as f32;
        return candidates.into_iter().map(|t| Tap::new(t.index, uniform)).collect();
    }

    candidates.into_iter().map(|t| Tap::new(t.index, t.weight / sum)).collect()
}

/// Convolve a planar channel with a symmetric odd-length kernel along one axis.
///
/// Out-of-range neighbors are clamped to the nearest edge sample. Each output
/// is divided by the sum of the taps it used.
///
/// # Panics
///
/// Panics if `kernel` has even length or `src.len() != width * height`.
pub fn convolve_axis(
    src: &[f32],
    width: usize,
    height: usize,
    kernel: &[f32],
    axis: Axis,
    parallel: bool,
) -> Vec<f32> {
    assert_eq!(kernel.len() % 2, 1, "kernel length must be odd");
    assert_eq!(src.len(), width * height);

    let radius = (kernel.len() / 2) as isize;
    let mut out = vec![0.0f32; src.len()];

    for_each_row(&mut out, width, parallel, |y, row| {
        for (x, dst) in row.iter_mut().enumerate() {
            let taps = (-radius..=radius).zip(kernel.iter()).map(|(k, &weight)| {
                let idx = match axis {
                    Axis::Horizontal => y * width + clamp_index(x as isize + k, width),
                    Axis::Vertical => clamp_index(y as isize + k, height) * width + x,
                };
                (src[idx], weight)
            });
            *dst = weighted_reduce(taps, src[y * width + x]);
        }
    });

    out
}

/// Run `f(row_index, row)` over every `row_len`-sized row of `out`.
///
/// Rows are independent, so the parallel path yields the same bytes as the
/// sequential one.
pub fn for_each_row<F>(out: &mut [f32], row_len: usize, parallel: bool, f: F)
where
    F: Fn(usize, &mut [f32]) + Send + Sync,
{
    if row_len == 0 {
        return;
    }
    if parallel {
        out.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| f(y, row));
    } else {
        out.chunks_mut(row_len).enumerate().for_each(|(y, row)| f(y, row));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_index() {
        assert_eq!(clamp_index(-3, 5), 0);
        assert_eq!(clamp_index(0, 5), 0);
        assert_eq!(clamp_index(4, 5), 4);
        assert_eq!(clamp_index(9, 5), 4);
        assert_eq!(clamp_index(7, 1), 0);
    }

    #[test]
    fn test_weighted_reduce_average() {
        let v = weighted_reduce([(10.0, 1.0), (20.0, 3.0)], 0.0);
        assert!((v - 17.5).abs() < 1e-6);
    }

    #[test]
    fn test_weighted_reduce_zero_weights_falls_back() {
        let v = weighted_reduce([(10.0, 0.0), (20.0, 0.0)], 42.0);
        assert_eq!(v, 42.0);
    }

    #[test]
    fn test_normalize_taps_sums_to_one() {
        let taps = normalize_taps(vec![Tap::new(0, 2.0), Tap::new(1, 6.0)], 0);
        assert_eq!(taps[0], Tap::new(0, 0.25));
        assert_eq!(taps[1], Tap::new(1, 0.75));
    }

    #[test]
    fn test_normalize_taps_empty_uses_fallback_index() {
        let taps = normalize_taps(Vec::new(), 3);
        assert_eq!(taps, vec![Tap::new(3, 1.0)]);
    }

    #[test]
    fn test_normalize_taps_zero_sum_is_uniform() {
        let taps = normalize_taps(vec![Tap::new(2, 0.5), Tap::new(3, -0.5)], 0);
        assert_eq!(taps, vec![Tap::new(2, 0.5), Tap::new(3, 0.5)]);
    }

    #[test]
    fn test_convolve_axis_constant_plane_unchanged() {
        let src = vec![7.0f32; 5 * 3];
        let kernel = [0.25, 0.5, 0.25];
        for axis in [Axis::Horizontal, Axis::Vertical] {
            let out = convolve_axis(&src, 5, 3, &kernel, axis, false);
            assert!(out.iter().all(|&v| (v - 7.0).abs() < 1e-6));
        }
    }

    #[test]
    fn test_convolve_axis_clamps_edges() {
        // Row [0, 0, 8]; right edge sees 8 twice through clamping
        let src = vec![0.0, 0.0, 8.0];
        let out = convolve_axis(&src, 3, 1, &[0.25, 0.5, 0.25], Axis::Horizontal, false);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 2.0).abs() < 1e-6);
        assert!((out[2] - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_convolve_axis_vertical_matches_transposed_horizontal() {
        let src = vec![1.0, 2.0, 3.0, 4.0];
        let kernel = [0.2, 0.6, 0.2];
        let vertical = convolve_axis(&src, 1, 4, &kernel, Axis::Vertical, false);
        let horizontal = convolve_axis(&src, 4, 1, &kernel, Axis::Horizontal, false);
        assert_eq!(vertical, horizontal);
    }

    #[test]
    fn test_parallel_rows_match_sequential() {
        let src: Vec<f32> = (0..64 * 48).map(|i| ((i * 37) % 255) as f32).collect();
        let kernel = [0.1, 0.2, 0.4, 0.2, 0.1];
        let a = convolve_axis(&src, 64, 48, &kernel, Axis::Vertical, false);
        let b = convolve_axis(&src, 64, 48, &kernel, Axis::Vertical, true);
        assert_eq!(a, b);
    }
}
