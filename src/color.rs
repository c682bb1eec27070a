//! Color transforms between interleaved RGBA and planar luma/chroma
//!
//! Uses the full-range (0-255) BT.601 matrix. Nothing here clamps: values may
//! leave [0, 255] transiently and are only clamped by [`to_rgba8`].

/// Chroma offset for full-range Cb/Cr.
const CHROMA_OFFSET: f32 = 128.0;

/// Opaque alpha used when recomposing without an alpha plane.
const OPAQUE: f32 = 255.0;

/// Planar Y, Cb, Cr and alpha channels of one image, each `width * height` long.
#[derive(Debug, Clone, PartialEq)]
pub struct YcbcrPlanes {
    pub y: Vec<f32>,
    pub cb: Vec<f32>,
    pub cr: Vec<f32>,
    pub alpha: Vec<f32>,
}

impl YcbcrPlanes {
    /// Number of pixels per plane.
    pub fn len(&self) -> usize {
        self.y.len()
    }

    /// Whether the planes hold no pixels.
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Recompose into an interleaved RGBA float buffer.
    pub fn recompose(&self) -> Vec<f32> {
        recompose(&self.y, &self.cb, &self.cr, Some(&self.alpha))
    }
}

/// Luma of one RGB triple.
#[inline]
pub fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Convert one RGB triple to (Y, Cb, Cr).
#[inline]
pub fn rgb_to_ycbcr(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let y = luma(r, g, b);
    let cb = -0.168736 * r - 0.331264 * g + 0.5 * b + CHROMA_OFFSET;
    let cr = 0.5 * r - 0.418688 * g - 0.081312 * b + CHROMA_OFFSET;
    (y, cb, cr)
}

/// Convert one (Y, Cb, Cr) triple back to RGB.
#[inline]
pub fn ycbcr_to_rgb(y: f32, cb: f32, cr: f32) -> (f32, f32, f32) {
    let u = cb - CHROMA_OFFSET;
    let v = cr - CHROMA_OFFSET;
    let r = y + 1.402 * v;
    let g = y - 0.344136 * u - 0.714136 * v;
    let b = y + 1.772 * u;
    (r, g, b)
}

/// Split an interleaved RGBA float buffer into planar Y/Cb/Cr/alpha.
///
/// # Panics
///
/// Panics if `rgba.len() != width * height * 4`.
pub fn decompose(rgba: &[f32], width: usize, height: usize) -> YcbcrPlanes {
    let size = width * height;
    assert_eq!(rgba.len(), size * 4, "rgba buffer does not match {width}x{height}");

    let mut planes = YcbcrPlanes {
        y: Vec::with_capacity(size),
        cb: Vec::with_capacity(size),
        cr: Vec::with_capacity(size),
        alpha: Vec::with_capacity(size),
    };

    for px in rgba.chunks_exact(4) {
        let (y, cb, cr) = rgb_to_ycbcr(px[0], px[1], px[2]);
        planes.y.push(y);
        planes.cb.push(cb);
        planes.cr.push(cr);
        planes.alpha.push(px[3]);
    }

    planes
}

/// Merge planar Y/Cb/Cr (and optional alpha) back into interleaved RGBA floats.
///
/// Missing alpha defaults to fully opaque.
///
/// # Panics
///
/// Panics if the planes have different lengths.
pub fn recompose(y: &[f32], cb: &[f32], cr: &[f32], alpha: Option<&[f32]>) -> Vec<f32> {
    let size = y.len();
    assert_eq!(cb.len(), size);
    assert_eq!(cr.len(), size);
    if let Some(alpha) = alpha {
        assert_eq!(alpha.len(), size);
    }

    let mut out = Vec::with_capacity(size * 4);
    for i in 0..size {
        let (r, g, b) = ycbcr_to_rgb(y[i], cb[i], cr[i]);
        out.push(r);
        out.push(g);
        out.push(b);
        out.push(alpha.map_or(OPAQUE, |a| a[i]));
    }
    out
}

/// Widen 8-bit samples to floats.
pub fn to_float(pixels: &[u8]) -> Vec<f32> {
    pixels.iter().map(|&v| v as f32).collect()
}

/// Quantize one float sample: add 0.5, truncate, clamp to [0, 255].
#[inline]
pub fn quantize(value: f32) -> u8 {
    // `as` truncates toward zero and saturates
    (value + 0.5).clamp(0.0, 255.0) as u8
}

/// Quantize a float working buffer to 8-bit samples.
pub fn to_rgba8(samples: &[f32]) -> Vec<u8> {
    samples.iter().map(|&v| quantize(v)).collect()
}
