//! Provides platform specific logic and [`PlatformService`] to access it.

use async_trait::async_trait;
use bytes::Bytes;

use crate::decoded_image::DecodedImage;
use crate::error::TileMapError;

/// User agent sent with HTTP requests unless configured otherwise.
pub const DEFAULT_USER_AGENT: &str = concat!("tilemap/", env!("CARGO_PKG_VERSION"));

/// Service providing network access and image decoding in a generic way.
#[async_trait]
pub trait PlatformService {
    /// Loads a byte array from the given url.
    ///
    /// Responses with a non-success HTTP status are reported as errors.
    async fn load_bytes_from_url(&self, url: &str) -> Result<Bytes, TileMapError>;

    /// Decodes an image from raw byte data.
    ///
    /// Raw bytes may contain the image in PNG or JPEG format.
    async fn decode_image(&self, image_data: Bytes) -> Result<DecodedImage, TileMapError>;
}

pub mod native;

/// Default implementation of the [`PlatformService`] for the current platform.
pub type PlatformServiceImpl = native::NativePlatformService;
