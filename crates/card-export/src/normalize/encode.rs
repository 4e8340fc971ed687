//! Re-encoding to the canonical raster form

use crate::types::{ExportError, Result};
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbImage};

/// JPEG quality used for every normalized image
pub const JPEG_QUALITY: u8 = 100;

/// A baseline JPEG at the source's native resolution
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalImage {
    pub jpeg: Bytes,
    pub width_px: u32,
    pub height_px: u32,
}

/// Decode any supported raster format and re-encode it as JPEG.
///
/// Transparent pixels are composited onto white, since JPEG has no alpha.
pub fn to_canonical_jpeg(bytes: &[u8]) -> Result<CanonicalImage> {
    let decoded = image::load_from_memory(bytes).map_err(|e| ExportError::Decode(e.to_string()))?;
    let rgb = flatten_onto_white(&decoded);
    let (width_px, height_px) = rgb.dimensions();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .write_image(rgb.as_raw(), width_px, height_px, ExtendedColorType::Rgb8)
        .map_err(|e| ExportError::Encode(e.to_string()))?;

    Ok(CanonicalImage {
        jpeg: Bytes::from(jpeg),
        width_px,
        height_px,
    })
}

fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_png_becomes_jpeg_at_native_size() {
        let png = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 56, image::Rgb([200, 10, 10]))),
            ImageFormat::Png,
        );
        let canonical = to_canonical_jpeg(&png).unwrap();

        assert_eq!((canonical.width_px, canonical.height_px), (40, 56));
        assert_eq!(&canonical.jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(
            image::guess_format(&canonical.jpeg).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_transparency_is_flattened_onto_white() {
        let png = encode(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0]))),
            ImageFormat::Png,
        );
        let canonical = to_canonical_jpeg(&png).unwrap();
        let decoded = image::load_from_memory(&canonical.jpeg).unwrap().to_rgb8();
        let pixel = decoded.get_pixel(4, 4).0;
        assert!(pixel.iter().all(|&c| c > 245));
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        assert!(matches!(
            to_canonical_jpeg(b"definitely not an image"),
            Err(ExportError::Decode(_))
        ));
    }
}
