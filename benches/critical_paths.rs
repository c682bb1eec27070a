//! Criterion benchmarks for finescale critical paths
//!
//! Benchmarks the core performance-critical operations:
//! - Denoise: bilateral filter over the luma plane
//! - Resample: separable Lanczos weights and passes
//! - Enhance: blur, sharpen and contrast normalization
//! - Pipeline: full upscale, parallel and serial

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use finescale::config::UpscaleConfig;
use finescale::denoise::{denoise, DenoiseParams};
use finescale::enhance::{enhance, EnhanceParams};
use finescale::pipeline::{upscale, UpscaleRequest};
use finescale::progress::NullProgress;
use finescale::resample::{resample, weights, ResampleParams, DEFAULT_SUPPORT};

// =============================================================================
// Test Data Generators
// =============================================================================

/// Generate an RGBA byte image with gradients and texture
fn make_rgba8(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let t = ((x * 31 + y * 17) % 64) as u8;
            pixels.extend_from_slice(&[(x % 192) as u8 + t, (y % 192) as u8 + t, t * 3, 255]);
        }
    }
    pixels
}

/// Generate the float working buffer of the same image
fn make_rgba_f32(width: usize, height: usize) -> Vec<f32> {
    make_rgba8(width, height).into_iter().map(f32::from).collect()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_denoise(c: &mut Criterion) {
    let mut group = c.benchmark_group("denoise");
    let params = DenoiseParams::default();

    for size in [64, 256].iter() {
        let plane: Vec<f32> = make_rgba_f32(*size, *size).into_iter().step_by(4).collect();
        group.throughput(Throughput::Elements((*size * *size) as u64));
        group.bench_with_input(BenchmarkId::new("serial", size), &plane, |b, plane| {
            b.iter(|| denoise(black_box(plane), *size, *size, &params, false))
        });
        group.bench_with_input(BenchmarkId::new("parallel", size), &plane, |b, plane| {
            b.iter(|| denoise(black_box(plane), *size, *size, &params, true))
        });
    }

    group.finish();
}

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");
    let params = ResampleParams::default();

    group.bench_function("weights_512_to_1280", |b| {
        b.iter(|| weights(black_box(512), black_box(1280), DEFAULT_SUPPORT))
    });

    for size in [64, 128].iter() {
        let src = make_rgba_f32(*size, *size);
        let target = size * 5 / 2;
        group.throughput(Throughput::Elements((target * target) as u64));
        group.bench_with_input(BenchmarkId::new("x2.5", size), &src, |b, src| {
            b.iter(|| resample(black_box(src), *size, *size, target, target, &params, true, &mut |_| {}))
        });
    }

    group.finish();
}

fn bench_enhance(c: &mut Criterion) {
    let mut group = c.benchmark_group("enhance");
    let params = EnhanceParams::default();

    for size in [128, 256].iter() {
        let src = make_rgba_f32(*size, *size);
        group.throughput(Throughput::Elements((*size * *size) as u64));
        group.bench_with_input(BenchmarkId::new("enhance", size), &src, |b, src| {
            b.iter(|| enhance(black_box(src), *size, *size, &params, true))
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);

    let request = UpscaleRequest::new(96, 96, 2.0, make_rgba8(96, 96));
    let parallel = UpscaleConfig::default();
    let serial = UpscaleConfig::default().serial();

    group.bench_function("upscale_96_x2_parallel", |b| {
        b.iter(|| upscale(black_box(&request), &parallel, &NullProgress))
    });
    group.bench_function("upscale_96_x2_serial", |b| {
        b.iter(|| upscale(black_box(&request), &serial, &NullProgress))
    });

    group.finish();
}

criterion_group!(benches, bench_denoise, bench_resample, bench_enhance, bench_pipeline);

criterion_main!(benches);
