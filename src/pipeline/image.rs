//! In-process generation pipeline built on the image crate.
//!
//! Runs the configured processor chain (`colorspace`, `autocrop`,
//! `scale_and_crop`, `filters`) in order, then encodes honoring the
//! resolved quality and extension. An empty extension mirrors the source
//! format. Decoding and encoding run on the blocking pool.
//!
//! The external tool paths carried by the settings are for pipelines that
//! shell out; this one does everything in-process and ignores them.

use super::GenerationPipeline;
use crate::models::Dimensions;
use crate::settings::EffectiveSettings;
use crate::{Error, Result};
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops::FilterType, DynamicImage, ImageFormat};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Default)]
pub struct ImagePipeline;

impl ImagePipeline {
    pub fn new() -> Self {
        Self
    }

    fn render(
        data: Vec<u8>,
        size: Dimensions,
        options: &[String],
        settings: &EffectiveSettings,
        format: ImageFormat,
    ) -> Result<Vec<u8>> {
        let mut img = image::load_from_memory(&data)?;
        let has = |opt: &str| options.iter().any(|o| o == opt);

        for processor in &settings.processors {
            img = match processor.as_str() {
                "colorspace" => {
                    if has("bw") {
                        DynamicImage::ImageLuma8(img.to_luma8())
                    } else {
                        img
                    }
                }
                "autocrop" => {
                    if has("autocrop") {
                        trim_uniform_border(img)
                    } else {
                        img
                    }
                }
                "scale_and_crop" => scale_and_crop(img, size, has("crop"), has("upscale")),
                "filters" => apply_filters(img, options),
                other => {
                    return Err(Error::Configuration(format!(
                        "Unknown processor '{}'",
                        other
                    )))
                }
            };
        }

        encode(img, format, settings.quality)
    }
}

fn output_format(source: &Path, extension: &str) -> Result<ImageFormat> {
    if extension.is_empty() {
        Ok(ImageFormat::from_path(source).unwrap_or(ImageFormat::Jpeg))
    } else {
        ImageFormat::from_extension(extension).ok_or_else(|| {
            Error::Configuration(format!("Unsupported thumbnail extension '{}'", extension))
        })
    }
}

/// Scale to the requested box; with `crop`, cover the box and center-crop to
/// it exactly. Without `upscale`, a source smaller than the box is left at
/// its own size.
fn scale_and_crop(img: DynamicImage, size: Dimensions, crop: bool, upscale: bool) -> DynamicImage {
    let (sw, sh) = (img.width(), img.height());
    let (w, h) = (size.width(), size.height());

    if crop {
        let (tw, th) = if upscale {
            (w, h)
        } else {
            (w.min(sw), h.min(sh))
        };
        img.resize_to_fill(tw, th, FilterType::Lanczos3)
    } else if upscale || sw > w || sh > h {
        img.resize(w, h, FilterType::Lanczos3)
    } else {
        img
    }
}

/// Trim near-white borders.
fn trim_uniform_border(img: DynamicImage) -> DynamicImage {
    const THRESHOLD: u8 = 247;

    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    let is_white = |x: u32, y: u32| rgb.get_pixel(x, y).0.iter().all(|&c| c >= THRESHOLD);

    let mut left = 0;
    while left < w && (0..h).all(|y| is_white(left, y)) {
        left += 1;
    }
    if left == w {
        // Uniformly white; nothing to anchor a crop on.
        return img;
    }
    let mut right = w;
    while right > left && (0..h).all(|y| is_white(right - 1, y)) {
        right -= 1;
    }
    let mut top = 0;
    while top < h && (left..right).all(|x| is_white(x, top)) {
        top += 1;
    }
    let mut bottom = h;
    while bottom > top && (left..right).all(|x| is_white(x, bottom - 1)) {
        bottom -= 1;
    }

    if left == 0 && top == 0 && right == w && bottom == h {
        img
    } else {
        img.crop_imm(left, top, right - left, bottom - top)
    }
}

fn apply_filters(mut img: DynamicImage, options: &[String]) -> DynamicImage {
    for option in options {
        img = match option.as_str() {
            "detail" => {
                let kernel = [0.0, -1.0, 0.0, -1.0, 10.0, -1.0, 0.0, -1.0, 0.0].map(|v| v / 6.0);
                img.filter3x3(&kernel)
            }
            "sharpen" => img.unsharpen(2.0, 2),
            // Handled by the other processors or opaque naming tokens.
            _ => img,
        };
    }
    img
}

fn encode(img: DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            let img = if img.color().has_alpha() {
                DynamicImage::ImageRgb8(img.to_rgb8())
            } else {
                img
            };
            let encoder = JpegEncoder::new_with_quality(std::io::Cursor::new(&mut out), quality);
            img.write_with_encoder(encoder)?;
        }
        _ => img.write_to(&mut std::io::Cursor::new(&mut out), format)?,
    }
    Ok(out)
}

#[async_trait]
impl GenerationPipeline for ImagePipeline {
    async fn generate(
        &self,
        source: &Path,
        size: Dimensions,
        options: &[String],
        settings: &EffectiveSettings,
    ) -> Result<Vec<u8>> {
        let data = match tokio::fs::read(source).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::SourceNotFound(source.display().to_string()))
            }
            Err(e) => return Err(Error::Io(e)),
        };

        debug!(source = %source.display(), %size, "rendering thumbnail");

        let format = output_format(source, &settings.extension)?;
        let options = options.to_vec();
        let settings = settings.clone();
        tokio::task::spawn_blocking(move || Self::render(data, size, &options, &settings, format))
            .await
            .map_err(|e| Error::Generation(format!("Render task join error: {}", e)))?
    }
}
