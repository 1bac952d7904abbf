use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, RgbImage, codecs::jpeg::JpegEncoder};
use tracing::debug;

use crate::components::common::{Config, ThumbnailError};

/// Moves thumbnails between base64 text and RGB rasters.
///
/// Image compression itself is delegated to the `image` crate.
#[derive(Debug, Clone, Copy)]
pub struct PayloadCodec {
    quality: u8,
}

impl PayloadCodec {
    pub fn new(config: &Config) -> Self {
        Self {
            quality: config.quality.clamp(1, 100),
        }
    }

    /// Decode a base64 payload into an RGB raster.
    pub fn decode(
        &self,
        payload: &str,
    ) -> Result<RgbImage, ThumbnailError> {
        self.decode_image(&self.decode_bytes(payload)?)
    }

    /// Decode a base64 payload into the compressed image bytes.
    pub fn decode_bytes(
        &self,
        payload: &str,
    ) -> Result<Vec<u8>, ThumbnailError> {
        let bytes = STANDARD.decode(payload)?;
        debug!("decoded {} thumbnail bytes", bytes.len());
        Ok(bytes)
    }

    /// Decompress image bytes into an RGB raster.
    pub fn decode_image(
        &self,
        bytes: &[u8],
    ) -> Result<RgbImage, ThumbnailError> {
        let image =
            image::load_from_memory(bytes).map_err(ThumbnailError::Format)?;
        Ok(to_rgb(image))
    }

    /// Compress a raster to JPG bytes.
    ///
    /// Takes the raster by reference so the same image can be encoded once
    /// per output block.
    pub fn encode(
        &self,
        image: &RgbImage,
    ) -> Result<Vec<u8>, ThumbnailError> {
        let mut buf = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buf, self.quality);
        image.write_with_encoder(encoder).map_err(ThumbnailError::Encode)?;
        debug!(
            "encoded {}x{} thumbnail at quality {} -> {} bytes",
            image.width(),
            image.height(),
            self.quality,
            buf.len()
        );
        Ok(buf)
    }
}

/// Convert any decoded image to 8-bit RGB. Already-RGB images pass through.
pub fn to_rgb(image: DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, Rgba, RgbaImage};
    use std::io::Cursor;

    fn codec() -> PayloadCodec {
        PayloadCodec::new(&Config::default())
    }

    #[test]
    fn encode_then_decode_keeps_dimensions() {
        let image = RgbImage::from_pixel(10, 7, Rgb([200, 30, 30]));
        let jpg = codec().encode(&image).unwrap();
        assert!(!jpg.is_empty());
        let decoded = codec().decode(&STANDARD.encode(&jpg)).unwrap();
        assert_eq!(decoded.dimensions(), (10, 7));
    }

    #[test]
    fn encoding_is_repeatable() {
        let image = RgbImage::from_pixel(12, 12, Rgb([0, 128, 255]));
        let first = codec().encode(&image).unwrap();
        let second = codec().encode(&image).unwrap();
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn decodes_png_with_alpha_to_rgb() {
        let rgba = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 128]));
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(rgba)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        let decoded = codec().decode(&STANDARD.encode(&png)).unwrap();
        assert_eq!(decoded.dimensions(), (4, 4));
        assert_eq!(decoded.get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn rgb_conversion_is_idempotent() {
        let image = RgbImage::from_pixel(3, 3, Rgb([1, 2, 3]));
        let once = to_rgb(DynamicImage::ImageRgb8(image.clone()));
        let twice = to_rgb(DynamicImage::ImageRgb8(once.clone()));
        assert_eq!(once, image);
        assert_eq!(twice, once);
    }

    #[test]
    fn invalid_base64_is_a_decode_error() {
        let err = codec().decode("not base64!").unwrap_err();
        assert!(matches!(err, ThumbnailError::Decode(_)));
    }

    #[test]
    fn non_image_bytes_are_a_format_error() {
        let err = codec().decode(&STANDARD.encode(b"G28 G1 X0")).unwrap_err();
        assert!(matches!(err, ThumbnailError::Format(_)));
    }
}
