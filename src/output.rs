//! PNG input/output and output path generation

use image::{ImageFormat, RgbaImage};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::UpscaleConfig;
use crate::error::UpscaleError;
use crate::pipeline::{UpscaleOutput, UpscaleRequest};
use crate::progress::ProgressSink;
use crate::worker;

/// Error type for file-level operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OutputError {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    /// Input is not a PNG file
    #[error("{} is not a PNG image", .0.display())]
    UnsupportedFormat(PathBuf),
    /// Pixel buffer cannot form an image of the stated size
    #[error("cannot build a {width}x{height} image from the pixel buffer")]
    InvalidDimensions { width: usize, height: usize },
    /// The upscale itself failed
    #[error(transparent)]
    Pipeline(#[from] UpscaleError),
}

/// Load a PNG file as 8-bit RGBA.
///
/// The format is detected from the file contents, not its extension.
pub fn load_png(path: &Path) -> Result<RgbaImage, OutputError> {
    let reader = image::io::Reader::open(path)?.with_guessed_format()?;
    if reader.format() != Some(ImageFormat::Png) {
        return Err(OutputError::UnsupportedFormat(path.to_path_buf()));
    }
    Ok(reader.decode()?.to_rgba8())
}

/// Save an RGBA image to a PNG file, creating parent directories.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Build a pipeline request from a decoded image.
pub fn to_request(image: RgbaImage, scale: f64) -> UpscaleRequest {
    let (width, height) = (image.width() as usize, image.height() as usize);
    UpscaleRequest::new(width, height, scale, image.into_raw())
}

/// Wrap pipeline output into an image buffer.
pub fn to_image(output: UpscaleOutput) -> Result<RgbaImage, OutputError> {
    let invalid = OutputError::InvalidDimensions { width: output.width, height: output.height };
    let (Ok(width), Ok(height)) = (u32::try_from(output.width), u32::try_from(output.height)) else {
        return Err(invalid);
    };
    RgbaImage::from_raw(width, height, output.pixels).ok_or(invalid)
}

/// Default output path: `<stem>_x<scale>.png` next to the input.
///
/// Whole scale factors print without a fraction (`photo_x2.png`).
pub fn default_output_path(input: &Path, scale: f64) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let file_name = format!("{}_x{}.png", stem, scale);
    let parent = input.parent().unwrap_or(Path::new(""));
    if parent.as_os_str().is_empty() {
        PathBuf::from(file_name)
    } else {
        parent.join(file_name)
    }
}

/// Upscale a PNG file into another PNG file.
///
/// The pipeline runs on a background worker; its progress is forwarded to
/// `sink` from the calling thread. Returns the run metadata; `pixels` of the
/// result are empty since they were moved into the written image.
pub fn upscale_file(
    input: &Path,
    output: &Path,
    scale: f64,
    config: &UpscaleConfig,
    sink: &dyn ProgressSink,
) -> Result<UpscaleOutput, OutputError> {
    let request = to_request(load_png(input)?, scale);
    tracing::debug!(input = %input.display(), width = request.width, height = request.height, "loaded input");

    let handle = worker::spawn(request, config.clone());
    let result = handle.wait(|update| sink.report(update))?;
    let summary = UpscaleOutput {
        width: result.width,
        height: result.height,
        pixels: Vec::new(),
        elapsed: result.elapsed,
    };

    save_png(&to_image(result)?, output)?;
    tracing::debug!(output = %output.display(), "saved output");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{NullProgress, RecordingProgress};
    use image::Rgba;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_default_output_path_whole_scale() {
        let path = default_output_path(Path::new("photo.png"), 2.0);
        assert_eq!(path, PathBuf::from("photo_x2.png"));
    }

    #[test]
    fn test_default_output_path_fractional_scale() {
        let path = default_output_path(Path::new("shots/photo.png"), 1.5);
        assert_eq!(path, PathBuf::from("shots/photo_x1.5.png"));
    }

    #[test]
    fn test_save_png_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.png");

        let mut image = RgbaImage::new(2, 2);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255])); // Red
        image.put_pixel(1, 0, Rgba([0, 255, 0, 255])); // Green
        image.put_pixel(0, 1, Rgba([0, 0, 255, 255])); // Blue
        image.put_pixel(1, 1, Rgba([0, 0, 0, 0])); // Transparent

        save_png(&image, &path).unwrap();
        let loaded = load_png(&path).unwrap();
        assert_eq!(loaded, image);
    }

    #[test]
    fn test_save_png_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/dirs/test.png");

        save_png(&RgbaImage::new(1, 1), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_load_png_rejects_other_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fake.png");
        std::fs::write(&path, b"definitely not an image").unwrap();

        assert!(matches!(load_png(&path), Err(OutputError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_png_missing_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(load_png(&dir.path().join("missing.png")), Err(OutputError::Io(_))));
    }

    #[test]
    fn test_request_round_trip_through_image() {
        let image = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 4]));
        let request = to_request(image.clone(), 2.0);
        assert_eq!((request.width, request.height, request.scale), (3, 2, 2.0));

        let output = UpscaleOutput {
            width: 3,
            height: 2,
            pixels: request.pixels,
            elapsed: Duration::ZERO,
        };
        assert_eq!(to_image(output).unwrap(), image);
    }

    #[test]
    fn test_to_image_rejects_short_buffer() {
        let output = UpscaleOutput { width: 2, height: 2, pixels: vec![0; 3], elapsed: Duration::ZERO };
        assert!(matches!(to_image(output), Err(OutputError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_upscale_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out/in_x3.png");
        save_png(&RgbaImage::from_pixel(4, 3, Rgba([120, 80, 200, 255])), &input).unwrap();

        let summary = upscale_file(&input, &output, 3.0, &UpscaleConfig::default(), &NullProgress).unwrap();
        assert_eq!((summary.width, summary.height), (12, 9));

        let written = load_png(&output).unwrap();
        assert_eq!(written.dimensions(), (12, 9));
    }

    #[test]
    fn test_upscale_file_forwards_worker_progress() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.png");
        save_png(&RgbaImage::from_pixel(5, 5, Rgba([30, 60, 90, 255])), &input).unwrap();

        let recorder = RecordingProgress::new();
        upscale_file(&input, &dir.path().join("o.png"), 2.0, &UpscaleConfig::default(), &recorder).unwrap();

        let updates = recorder.updates();
        assert_eq!(updates.first().map(|u| u.label), Some(Some("Starting…")));
        assert_eq!(updates.last().map(|u| (u.percent, u.label)), Some((100.0, Some("Done."))));
        assert!(updates.windows(2).all(|w| w[0].percent <= w[1].percent));
    }

    #[test]
    fn test_upscale_file_pipeline_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.png");
        save_png(&RgbaImage::new(2, 2), &input).unwrap();

        let result = upscale_file(&input, &dir.path().join("o.png"), 0.0, &UpscaleConfig::default(), &NullProgress);
        assert!(matches!(result, Err(OutputError::Pipeline(UpscaleError::InvalidScale(_)))));
    }
}
