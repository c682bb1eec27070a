//! Separable Lanczos resampling of RGBA float buffers.
//!
//! Resampling runs as two 1-D passes: rows are rescaled to the new width
//! first (producing a `new_width x height` intermediate), then columns are
//! rescaled to the new height. Per-axis weight lists are computed once and
//! reused for every row or column.
//!
//! # Kernel
//!
//! ```text
//! L(x) = 1                          x == 0
//!      = sinc(x) * sinc(x / a)      0 < |x| < a
//!      = 0                          |x| >= a
//! ```
//!
//! All four channels are filtered identically; alpha is not premultiplied.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::window::{clamp_index, for_each_row, normalize_taps, Tap};

/// Default Lanczos support radius.
pub const DEFAULT_SUPPORT: u32 = 3;

/// Largest accepted support radius.
pub const MAX_SUPPORT: u32 = 16;

/// Rows of the horizontal pass between two progress reports.
const HORIZONTAL_BAND: usize = 24;

/// Rows of the vertical pass between two progress reports.
const VERTICAL_BAND: usize = 12;

/// Tunables for [`resample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleParams {
    /// Lanczos support radius `a`
    pub support: u32,
}

impl Default for ResampleParams {
    fn default() -> Self {
        Self { support: DEFAULT_SUPPORT }
    }
}

impl ResampleParams {
    /// Check the parameters, returning one message per invalid field.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.support == 0 || self.support > MAX_SUPPORT {
            errors.push(format!("resample.support must be within 1..={}", MAX_SUPPORT));
        }
        errors
    }
}

/// Evaluate the Lanczos kernel with support `a` at `x`.
pub fn lanczos(x: f64, a: f64) -> f64 {
    if x == 0.0 {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }
    let pi_x = PI * x;
    let pi_x_over_a = pi_x / a;
    (pi_x.sin() / pi_x) * (pi_x_over_a.sin() / pi_x_over_a)
}

/// Compute the normalized weight list of every destination coordinate.
///
/// Destination `i` maps to the continuous source position
/// `center = (i + 0.5) / scale`; each source index `j` in
/// `[floor(center - a), ceil(center + a)]` that lies inside the source is
/// weighted by `L(center - j - 0.5)`.
///
/// Every returned list sums to one and only references indices in
/// `[0, src_len)`.
///
/// # Panics
///
/// Panics if `src_len` is zero.
pub fn weights(src_len: usize, dst_len: usize, support: u32) -> Vec<Vec<Tap>> {
    assert!(src_len > 0, "source axis must be non-empty");

    let scale = dst_len as f64 / src_len as f64;
    let a = support as f64;

    (0..dst_len)
        .map(|i| {
            let center = (i as f64 + 0.5) / scale;
            let left = (center - a).floor() as isize;
            let right = (center + a).ceil() as isize;

            let candidates = (left..=right)
                .filter(|&j| j >= 0 && (j as usize) < src_len)
                .filter_map(|j| {
                    let weight = lanczos(center - j as f64 - 0.5, a);
                    (weight != 0.0).then(|| Tap::new(j as usize, weight as f32))
                })
                .collect();

            let fallback = clamp_index((center - 0.5).round() as isize, src_len);
            normalize_taps(candidates, fallback)
        })
        .collect()
}

/// Resample an interleaved RGBA float buffer to `new_width x new_height`.
///
/// `on_progress` receives non-decreasing fractions in `[0, 1]`: the
/// horizontal pass covers the first half, the vertical pass the second, and
/// `1.0` is always reported last.
///
/// # Panics
///
/// Panics if any dimension is zero or `src.len() != width * height * 4`.
pub fn resample(
    src: &[f32],
    width: usize,
    height: usize,
    new_width: usize,
    new_height: usize,
    params: &ResampleParams,
    parallel: bool,
    on_progress: &mut dyn FnMut(f32),
) -> Vec<f32> {
    assert!(width > 0 && height > 0 && new_width > 0 && new_height > 0);
    assert_eq!(src.len(), width * height * 4);

    let taps_x = weights(width, new_width, params.support);
    let taps_y = weights(height, new_height, params.support);

    let temp = horizontal_pass(src, width, height, new_width, &taps_x, parallel, on_progress);
    let out = vertical_pass(&temp, new_width, new_height, &taps_y, parallel, on_progress);
    on_progress(1.0);
    out
}

fn horizontal_pass(
    src: &[f32],
    width: usize,
    height: usize,
    new_width: usize,
    taps_x: &[Vec<Tap>],
    parallel: bool,
    on_progress: &mut dyn FnMut(f32),
) -> Vec<f32> {
    let src_row_len = width * 4;
    let row_len = new_width * 4;
    let mut temp = vec![0.0f32; row_len * height];

    for (band_index, band) in temp.chunks_mut(row_len * HORIZONTAL_BAND).enumerate() {
        let first_row = band_index * HORIZONTAL_BAND;
        on_progress(0.5 * first_row as f32 / height as f32);

        for_each_row(band, row_len, parallel, |offset, row| {
            let y = first_row + offset;
            let src_row = &src[y * src_row_len..(y + 1) * src_row_len];
            for (px, taps) in row.chunks_exact_mut(4).zip(taps_x) {
                for tap in taps {
                    let s = &src_row[tap.index * 4..tap.index * 4 + 4];
                    for c in 0..4 {
                        px[c] += s[c] * tap.weight;
                    }
                }
            }
        });
    }

    temp
}

fn vertical_pass(
    temp: &[f32],
    new_width: usize,
    new_height: usize,
    taps_y: &[Vec<Tap>],
    parallel: bool,
    on_progress: &mut dyn FnMut(f32),
) -> Vec<f32> {
    let row_len = new_width * 4;
    let mut out = vec![0.0f32; row_len * new_height];

    for (band_index, band) in out.chunks_mut(row_len * VERTICAL_BAND).enumerate() {
        let first_row = band_index * VERTICAL_BAND;
        on_progress(0.5 + 0.5 * first_row as f32 / new_height as f32);

        for_each_row(band, row_len, parallel, |offset, row| {
            let y = first_row + offset;
            for tap in &taps_y[y] {
                let src_row = &temp[tap.index * row_len..(tap.index + 1) * row_len];
                for (dst, &s) in row.iter_mut().zip(src_row) {
                    *dst += s * tap.weight;
                }
            }
        });
    }

    out
}
