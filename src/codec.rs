//! Raster image conversion
//!
//! Decodes any format the `image` crate understands into a pixel buffer at the
//! image's intrinsic size and re-encodes it to the target format. Lossy targets
//! use a fixed quality of 0.9.

use crate::{OutputFormat, ToolError};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::{WebPEncoder, WebPQuality};
use image::{ColorType, DynamicImage, ImageEncoder};
use serde::Serialize;
use std::path::Path;

pub const ENCODE_QUALITY: f32 = 0.9;

fn quality_percent() -> u8 {
    (ENCODE_QUALITY * 100.0).round() as u8
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertedImage {
    pub name: String,
    pub source_name: String,
    #[serde(skip)]
    pub data: Vec<u8>,
    pub size: usize,
    pub source_size: usize,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

impl ConvertedImage {
    /// Percentage saved relative to the source file; negative when it grew.
    pub fn savings_percent(&self) -> f64 {
        if self.source_size == 0 {
            return 0.0;
        }
        (1.0 - self.size as f64 / self.source_size as f64) * 100.0
    }
}

/// Replaces the final extension of `original` with the target's, once.
///
/// `photo.jpeg` -> `photo.webp`, `archive.tar.png` -> `archive.tar.webp`,
/// `README` -> `README.webp`.
pub fn output_file_name(original: &str, format: OutputFormat) -> String {
    let stem = match original.rfind('.') {
        Some(dot) => {
            let extension = &original[dot + 1..];
            if !extension.is_empty() && !extension.contains('/') {
                &original[..dot]
            } else {
                original
            }
        }
        None => original,
    };
    format!("{stem}.{}", format.extension())
}

/// Whether `path` names a file the converter should accept.
pub fn is_image_path(path: &Path) -> bool {
    image::ImageFormat::from_path(path).is_ok()
}

pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ToolError> {
    if bytes.is_empty() {
        return Err(ToolError::DecodeError("input is empty".to_string()));
    }
    image::load_from_memory(bytes).map_err(|e| ToolError::DecodeError(e.to_string()))
}

pub fn encode_image(image: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>, ToolError> {
    let (width, height) = (image.width(), image.height());
    let mut data = Vec::new();

    match format {
        OutputFormat::Webp => {
            let rgba = image.to_rgba8();
            // image 0.24 only exposes lossy WebP through the deprecated quality API.
            #[allow(deprecated)]
            let encoder =
                WebPEncoder::new_with_quality(&mut data, WebPQuality::lossy(quality_percent()));
            encoder
                .encode(rgba.as_raw(), width, height, ColorType::Rgba8)
                .map_err(|e| ToolError::EncodeError(e.to_string()))?;
        }
        OutputFormat::Jpeg => {
            let rgb = image.to_rgb8();
            JpegEncoder::new_with_quality(&mut data, quality_percent())
                .encode(rgb.as_raw(), width, height, ColorType::Rgb8)
                .map_err(|e| ToolError::EncodeError(e.to_string()))?;
        }
        OutputFormat::Png => {
            let rgba = image.to_rgba8();
            PngEncoder::new(&mut data)
                .write_image(rgba.as_raw(), width, height, ColorType::Rgba8)
                .map_err(|e| ToolError::EncodeError(e.to_string()))?;
        }
    }

    if data.is_empty() {
        return Err(ToolError::EncodeError(format!(
            "{} encoder produced no data",
            format.mime_type()
        )));
    }
    Ok(data)
}

pub fn convert_image(
    bytes: &[u8],
    file_name: &str,
    format: OutputFormat,
) -> Result<ConvertedImage, ToolError> {
    let image = decode_image(bytes)?;
    let data = encode_image(&image, format)?;

    Ok(ConvertedImage {
        name: output_file_name(file_name, format),
        source_name: file_name.to_string(),
        size: data.len(),
        source_size: bytes.len(),
        width: image.width(),
        height: image.height(),
        format,
        data,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, RgbImage};

    pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(img.as_raw(), width, height, ColorType::Rgb8)
            .unwrap();
        bytes
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("photo.jpeg", OutputFormat::Webp), "photo.webp");
        assert_eq!(output_file_name("archive.tar.png", OutputFormat::Webp), "archive.tar.webp");
        assert_eq!(output_file_name("README", OutputFormat::Webp), "README.webp");
        assert_eq!(output_file_name("shot.PNG", OutputFormat::Jpeg), "shot.jpg");
        assert_eq!(output_file_name("dir.v1/file", OutputFormat::Png), "dir.v1/file.png");
        assert_eq!(output_file_name("name.", OutputFormat::Webp), "name..webp");
    }

    #[test]
    fn test_extension_substituted_exactly_once() {
        for name in ["a.png", "b.jpg", "c.gif", "d.webp.png"] {
            let out = output_file_name(name, OutputFormat::Webp);
            let stem = &name[..name.rfind('.').unwrap()];
            assert_eq!(out.strip_suffix(".webp"), Some(stem));
        }
    }

    #[test]
    fn test_convert_png_to_webp_keeps_dimensions() {
        let png = sample_png(37, 21);
        let converted = convert_image(&png, "banner.png", OutputFormat::Webp).unwrap();
        assert_eq!(converted.name, "banner.webp");
        assert_eq!((converted.width, converted.height), (37, 21));
        assert!(converted.size > 0);
        assert_eq!(converted.size, converted.data.len());
        assert_eq!(converted.source_size, png.len());

        let decoded = image::load_from_memory(&converted.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (37, 21));
    }

    #[test]
    fn test_convert_to_jpeg_and_png() {
        let png = sample_png(8, 8);
        for format in [OutputFormat::Jpeg, OutputFormat::Png] {
            let converted = convert_image(&png, "icon.png", format).unwrap();
            assert!(converted.size > 0);
            assert!(converted.name.ends_with(format.extension()));
        }
    }

    #[test]
    fn test_undecodable_input() {
        assert!(matches!(
            convert_image(b"definitely not an image", "x.png", OutputFormat::Webp),
            Err(ToolError::DecodeError(_))
        ));
        assert!(matches!(
            convert_image(&[], "x.png", OutputFormat::Webp),
            Err(ToolError::DecodeError(_))
        ));
    }

    #[test]
    fn test_is_image_path() {
        assert!(is_image_path(Path::new("a/b/photo.jpg")));
        assert!(is_image_path(Path::new("photo.PNG")));
        assert!(!is_image_path(Path::new("notes.txt")));
        assert!(!is_image_path(Path::new("no_extension")));
    }
}
