use super::{ImageResizer, ResizeSpec};
use crate::models::{FitMode, DEFAULT_MAX_DIMENSION, DEFAULT_MAX_OUTPUT_PIXELS};
use crate::{Error, Result};
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

const LETTERBOX: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Resizes with Lanczos3 and encodes PNG at the best compression level.
///
/// Every resample is checked against a per-side limit and a pixel budget
/// before any buffer is allocated. The budget covers both the output and the
/// resampler's intermediate, which is as wide as the sampled source and as
/// tall as the output.
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    max_dimension: u32,
    max_pixels: u64,
}

impl ImageProcessor {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_DIMENSION, DEFAULT_MAX_OUTPUT_PIXELS)
    }

    pub fn with_limits(max_dimension: u32, max_pixels: u64) -> Self {
        Self {
            max_dimension,
            max_pixels,
        }
    }

    fn check_budget(&self, sample_width: u32, width: u32, height: u32) -> Result<()> {
        let output = u64::from(width) * u64::from(height);
        let intermediate = u64::from(sample_width) * u64::from(height);
        if width > self.max_dimension
            || height > self.max_dimension
            || output.max(intermediate) > self.max_pixels
        {
            return Err(Error::OutputTooLarge {
                width,
                height,
                max_pixels: self.max_pixels,
            });
        }
        Ok(())
    }

    fn apply_fit(&self, image: DynamicImage, spec: ResizeSpec) -> Result<DynamicImage> {
        let (src_w, src_h) = image.dimensions();
        if src_w == 0 || src_h == 0 {
            return Err(Error::Invariant("Decoded image has no pixels".to_string()));
        }
        let (width, height) = fit_dimensions(src_w, src_h, spec);

        let resized = match spec.fit {
            FitMode::Cover => {
                // Crop in source space so nothing larger than the target is ever built.
                let (x, y, crop_w, crop_h) = cover_crop(src_w, src_h, spec);
                self.check_budget(crop_w, width, height)?;
                image
                    .crop_imm(x, y, crop_w, crop_h)
                    .resize_exact(width, height, FilterType::Lanczos3)
            }
            FitMode::Fill => {
                self.check_budget(src_w, width, height)?;
                image.resize_exact(width, height, FilterType::Lanczos3)
            }
            FitMode::Contain => {
                self.check_budget(src_w, width, height)?;
                let scaled = image.resize(width, height, FilterType::Lanczos3).to_rgba8();
                let mut canvas = RgbaImage::from_pixel(width, height, LETTERBOX);
                let x = (width - scaled.width()) / 2;
                let y = (height - scaled.height()) / 2;
                imageops::overlay(&mut canvas, &scaled, i64::from(x), i64::from(y));
                DynamicImage::ImageRgba8(canvas)
            }
            FitMode::Inside | FitMode::Outside => {
                if (width, height) == (src_w, src_h) {
                    image
                } else {
                    self.check_budget(src_w, width, height)?;
                    image.resize_exact(width, height, FilterType::Lanczos3)
                }
            }
        };
        Ok(resized)
    }

    fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, PngFilter::Adaptive);
        image.write_with_encoder(encoder)?;
        Ok(buffer)
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageResizer for ImageProcessor {
    fn resize(&self, image_data: &[u8], spec: ResizeSpec) -> Result<Vec<u8>> {
        let image = image::load_from_memory(image_data)?;
        let resized = self.apply_fit(image, spec)?;
        Self::encode_png(&resized)
    }
}

/// Output canvas dimensions for a `src_w`x`src_h` source under `spec`.
///
/// `cover`, `contain` and `fill` always land on the exact target. `inside`
/// and `outside` keep the source aspect ratio and only ever shrink or grow
/// respectively. Results saturate at `u32::MAX`.
pub fn fit_dimensions(src_w: u32, src_h: u32, spec: ResizeSpec) -> (u32, u32) {
    let (w, h) = (u64::from(src_w), u64::from(src_h));
    let (tw, th) = (u64::from(spec.width), u64::from(spec.height));

    match spec.fit {
        FitMode::Cover | FitMode::Contain | FitMode::Fill => (spec.width, spec.height),
        FitMode::Inside => {
            if w <= tw && h <= th {
                (src_w, src_h)
            } else if tw * h <= th * w {
                (spec.width, narrow((h * tw).saturating_add(w / 2) / w))
            } else {
                (narrow((w * th).saturating_add(h / 2) / h), spec.height)
            }
        }
        FitMode::Outside => {
            if w >= tw && h >= th {
                (src_w, src_h)
            } else if tw * h >= th * w {
                (spec.width, narrow((h * tw).div_ceil(w)))
            } else {
                (narrow((w * th).div_ceil(h)), spec.height)
            }
        }
    }
}

/// Centred source region `(x, y, width, height)` with the target aspect ratio.
///
/// Scaling this region to the target is what `cover` produces.
pub fn cover_crop(src_w: u32, src_h: u32, spec: ResizeSpec) -> (u32, u32, u32, u32) {
    let (w, h) = (u64::from(src_w), u64::from(src_h));
    let (tw, th) = (u64::from(spec.width), u64::from(spec.height));

    let (crop_w, crop_h) = if w * th > h * tw {
        let crop_w = narrow((h * tw).saturating_add(th / 2) / th).min(src_w);
        (crop_w, src_h)
    } else {
        let crop_h = narrow((w * th).saturating_add(tw / 2) / tw).min(src_h);
        (src_w, crop_h)
    };
    ((src_w - crop_w) / 2, (src_h - crop_h) / 2, crop_w, crop_h)
}

fn narrow(value: u64) -> u32 {
    u32::try_from(value.max(1)).unwrap_or(u32::MAX)
}
