use std::sync::Arc;

use tilemap_types::GeoBoundingBox;
use tokio::sync::{mpsc, watch};

use super::scheduler::{RedrawScheduler, SchedulerChannels, SchedulerState};
use super::TileMap;
use crate::async_runtime;
use crate::cache::TileCache;
use crate::config::TileMapConfig;
use crate::error::TileMapError;
use crate::provider::{RestTileProvider, TileProvider};
use crate::render::TileSurface;
use crate::style::StyleTable;
use crate::tile_schema::TileSchema;
use crate::view::ViewportState;

/// Convenience type to initialize a [`TileMap`].
///
/// ```no_run
/// use tilemap::render::MemorySurface;
/// use tilemap::tilemap_types::GeoBoundingBox;
/// use tilemap::{TileMapBuilder, TileMapConfig};
///
/// # async fn build() -> Result<(), tilemap::error::TileMapError> {
/// let surface = MemorySurface::new();
/// let mut map = TileMapBuilder::new(TileMapConfig::default())
///     .with_bounding_box(GeoBoundingBox::new(8.0, 8.4, 53.05, 53.25)?)
///     .build(surface.clone())?;
///
/// let report = map.redraw().wait().await?;
/// println!("{} tiles loaded", report.fetched);
/// # Ok(())
/// # }
/// ```
pub struct TileMapBuilder {
    config: TileMapConfig,
    bbox: GeoBoundingBox,
    schema: TileSchema,
    provider: Option<Arc<dyn TileProvider>>,
}

impl Default for TileMapBuilder {
    fn default() -> Self {
        Self::new(TileMapConfig::default())
    }
}

impl TileMapBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(config: TileMapConfig) -> Self {
        Self {
            config,
            bbox: GeoBoundingBox::WORLD,
            schema: TileSchema::default(),
            provider: None,
        }
    }

    /// Sets the initially shown extent.
    ///
    /// Defaults to the whole world.
    pub fn with_bounding_box(mut self, bbox: GeoBoundingBox) -> Self {
        self.bbox = bbox;
        self
    }

    /// Sets the tile schema.
    ///
    /// Defaults to the standard Web Mercator schema with zoom levels 0 to 18.
    pub fn with_tile_schema(mut self, schema: TileSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Replaces the default REST provider with a custom one.
    pub fn with_provider(mut self, provider: impl TileProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Creates the map drawing on the given surface and requests its first redraw.
    ///
    /// The redraw scheduler of the map is spawned on the current tokio runtime, so this method
    /// must be called from within one.
    pub fn build(self, surface: impl TileSurface + 'static) -> Result<TileMap, TileMapError> {
        let Self {
            config,
            bbox,
            schema,
            provider,
        } = self;

        config.validate()?;
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(TileMapError::Configuration(
                "tile map must be built inside a tokio runtime".into(),
            ));
        }

        let provider: Arc<dyn TileProvider> = match provider {
            Some(provider) => provider,
            None => Arc::new(RestTileProvider::new(
                StyleTable::with_overrides(&config.styles),
                &config.user_agent,
            )?),
        };

        let cache = Arc::new(
            config
                .cache_capacity
                .map(TileCache::bounded)
                .unwrap_or_default(),
        );

        let view = ViewportState::new(
            bbox,
            config.style,
            config.viewport,
            config.base_zoom_offset,
            &schema,
        );

        let (requests_sender, requests) = mpsc::unbounded_channel();
        let (state_sender, state) = watch::channel(SchedulerState::Idle);
        let (reports_sender, reports) = watch::channel(None);

        let scheduler = RedrawScheduler::new(
            schema.clone(),
            provider,
            cache.clone(),
            Box::new(surface),
            config.debounce(),
            config.tile_margin,
            SchedulerChannels {
                requests,
                state: state_sender,
                reports: reports_sender,
            },
        );
        async_runtime::spawn(scheduler.run());

        log::debug!(
            "Tile map created with style {} at zoom {}",
            view.style(),
            view.zoom()
        );

        let mut map = TileMap {
            view,
            schema,
            cache,
            generation: 0,
            requests: requests_sender,
            state,
            reports,
        };
        map.redraw();

        Ok(map)
    }
}
