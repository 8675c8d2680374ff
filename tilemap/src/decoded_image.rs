//! This module contains decoded raster images of map tiles.

use tilemap_types::Size;

use crate::error::TileMapError;
use crate::tile_schema::TileKey;

/// An image that has been loaded into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Raw bytes of the image, in RGBA order.
    bytes: Vec<u8>,
    /// Width and height of the image.
    dimensions: Size<u32>,
}

impl DecodedImage {
    /// Decode an image from a byte slice.
    ///
    /// Attempts to guess the format of the image from the data. Non-RGBA images (indexed, RGB,
    /// grayscale) will be converted to RGBA.
    pub fn decode(bytes: &[u8]) -> Result<Self, TileMapError> {
        let decoded = image::load_from_memory(bytes)?;
        let rgba = decoded.to_rgba8();
        let dimensions = Size::new(rgba.width(), rgba.height());

        Ok(Self {
            bytes: rgba.into_raw(),
            dimensions,
        })
    }

    /// Create a DecodedImage from a buffer of raw, already decoded RGBA pixels.
    pub fn from_raw(bytes: Vec<u8>, dimensions: Size<u32>) -> Result<Self, TileMapError> {
        let expected = dimensions.width() as usize * dimensions.height() as usize * 4;
        if bytes.len() != expected {
            return Err(TileMapError::Generic(format!(
                "invalid image buffer size: expected {expected} bytes, got {}",
                bytes.len()
            )));
        }

        Ok(Self { bytes, dimensions })
    }

    /// RGBA pixels, row by row.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Width of the image in pixels.
    pub fn width(&self) -> u32 {
        self.dimensions.width()
    }

    /// Height of the image in pixels.
    pub fn height(&self) -> u32 {
        self.dimensions.height()
    }
}

/// Decoded image of a map tile together with the key it was loaded for.
///
/// Tile images are immutable. The map shares them through `Arc`, so the cache and any number of
/// paint operations use the same pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileImage {
    key: TileKey,
    image: DecodedImage,
}

impl TileImage {
    /// Creates a new tile image.
    pub fn new(key: TileKey, image: DecodedImage) -> Self {
        Self { key, image }
    }

    /// Key of the tile.
    pub fn key(&self) -> TileKey {
        self.key
    }

    /// Pixel data of the tile.
    pub fn image(&self) -> &DecodedImage {
        &self.image
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use assert_matches::assert_matches;
    use image::{ImageBuffer, ImageOutputFormat, Rgb, RgbImage};

    use super::*;

    #[test]
    fn decode_rgb_png() {
        let source: RgbImage = ImageBuffer::from_fn(4, 2, |x, _| Rgb([x as u8 * 10, 20, 30]));
        let mut png = Cursor::new(Vec::new());
        source
            .write_to(&mut png, ImageOutputFormat::Png)
            .expect("failed to encode png");

        let decoded = DecodedImage::decode(png.get_ref()).unwrap();
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 2);
        assert_eq!(decoded.bytes().len(), 4 * 2 * 4);
        assert_eq!(&decoded.bytes()[4..8], &[10, 20, 30, 255]);
    }

    #[test]
    fn decode_garbage() {
        assert_matches!(
            DecodedImage::decode(b"<html>not found</html>"),
            Err(TileMapError::ImageDecode(_))
        );
    }

    #[test]
    fn from_raw_checks_buffer_size() {
        assert!(DecodedImage::from_raw(vec![0; 16], Size::new(2, 2)).is_ok());
        assert!(DecodedImage::from_raw(vec![0; 15], Size::new(2, 2)).is_err());
    }
}
