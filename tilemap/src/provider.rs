//! Tile providers load raster tiles for the map.

use async_trait::async_trait;
use maybe_sync::{MaybeSend, MaybeSync};

use crate::decoded_image::TileImage;
use crate::error::TileMapError;
use crate::platform::{PlatformService, PlatformServiceImpl};
use crate::style::StyleTable;
use crate::tile_schema::TileKey;

/// Provider of tiles for a [`TileMap`](crate::TileMap).
///
/// The map calls `load` from background tasks, many tiles at a time. A failure is reported for the
/// one tile only, as [`TileMapError::TileUnavailable`]. Providers do not retry: the map requests
/// the tile again on the next redraw that needs it.
#[async_trait]
pub trait TileProvider: MaybeSend + MaybeSync {
    /// Loads and decodes the tile with the given key.
    async fn load(&self, key: TileKey) -> Result<TileImage, TileMapError>;
}

/// Raster tile provider that loads tiles one by one with REST HTTP GET requests of the form
/// `{base}/{z}/{x}/{y}.png`, where `base` comes from the [`StyleTable`].
///
/// ```no_run
/// use tilemap::provider::{RestTileProvider, TileProvider};
/// use tilemap::{StyleId, StyleTable, TileIndex, TileKey};
///
/// # async fn load() -> Result<(), tilemap::error::TileMapError> {
/// let provider = RestTileProvider::new(StyleTable::default(), "my-app/1.0")?;
/// let tile = provider
///     .load(TileKey::new(TileIndex::new(3, 5, 3), StyleId::Osm))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct RestTileProvider {
    styles: StyleTable,
    platform_service: PlatformServiceImpl,
}

impl RestTileProvider {
    /// Creates a new instance of the provider.
    pub fn new(styles: StyleTable, user_agent: &str) -> Result<Self, TileMapError> {
        Ok(Self {
            styles,
            platform_service: PlatformServiceImpl::new(user_agent)?,
        })
    }

    /// Style table used to build tile URLs.
    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    async fn load_inner(&self, key: TileKey) -> Result<TileImage, TileMapError> {
        let url = self.styles.tile_url(&key);

        log::info!("Loading {url}");
        let data = self.platform_service.load_bytes_from_url(&url).await?;
        let image = self.platform_service.decode_image(data).await?;

        Ok(TileImage::new(key, image))
    }
}

#[async_trait]
impl TileProvider for RestTileProvider {
    async fn load(&self, key: TileKey) -> Result<TileImage, TileMapError> {
        self.load_inner(key)
            .await
            .map_err(|err| TileMapError::TileUnavailable {
                key,
                reason: err.to_string(),
            })
    }
}
