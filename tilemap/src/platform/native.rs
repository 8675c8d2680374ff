use async_trait::async_trait;
use bytes::Bytes;

use crate::decoded_image::DecodedImage;
use crate::error::TileMapError;
use crate::platform::PlatformService;

/// Platform service based on `reqwest` HTTP client.
#[derive(Debug, Clone)]
pub struct NativePlatformService {
    http_client: reqwest::Client,
}

impl NativePlatformService {
    /// Creates a new service sending the given user agent with every request.
    ///
    /// Public tile servers (e.g. OpenStreetMap) reject requests without a meaningful user agent.
    pub fn new(user_agent: &str) -> Result<Self, TileMapError> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl PlatformService for NativePlatformService {
    async fn load_bytes_from_url(&self, url: &str) -> Result<Bytes, TileMapError> {
        let response = self.http_client.get(url).send().await?;
        if !response.status().is_success() {
            log::info!("Failed to load {url}: {}", response.status());
            return Err(TileMapError::IO(format!(
                "server responded with {}",
                response.status()
            )));
        }

        Ok(response.bytes().await?)
    }

    async fn decode_image(&self, image_data: Bytes) -> Result<DecodedImage, TileMapError> {
        tokio::task::spawn_blocking(move || DecodedImage::decode(&image_data))
            .await
            .map_err(|err| TileMapError::Generic(format!("image decoding task failed: {err}")))?
    }
}
