//! Tilemap is a slippy map engine. It shows a geographic extent using pre-rendered raster tiles
//! loaded over the network, projecting coordinates to tile indices with Web Mercator math, caching
//! loaded tiles and redrawing asynchronously, so changing the view never blocks.
//!
//! # Quick start
//!
//! ```no_run
//! use tilemap::render::MemorySurface;
//! use tilemap::tilemap_types::GeoBoundingBox;
//! use tilemap::{TileMapBuilder, TileMapConfig};
//!
//! # async fn run() -> Result<(), tilemap::error::TileMapError> {
//! let surface = MemorySurface::new();
//! let mut map = TileMapBuilder::new(TileMapConfig::default())
//!     .with_bounding_box(GeoBoundingBox::new(8.0, 8.4, 53.05, 53.25)?)
//!     .build(surface.clone())?;
//!
//! map.set_style("ocm")?;
//! let report = map.set_base_zoom_offset(-1).wait().await?;
//! println!("zoom {}: {} tiles loaded", report.zoom, report.fetched);
//! # Ok(())
//! # }
//! ```
//!
//! # Main components
//!
//! * [`TileMap`] owns the [`ViewportState`]: the shown extent, style, viewport size and the zoom
//!   level derived from them. Every change is sent to the redraw scheduler of the map.
//! * The redraw scheduler waits until the viewport settles, then computes the [`TileRange`] of the
//!   view with a margin around it, paints what is already in the [`TileCache`] and loads the rest
//!   with a [`TileProvider`](provider::TileProvider).
//! * Tiles are painted on a [`TileSurface`](render::TileSurface) provided by the host. Tiles of
//!   other zoom levels or styles are moved below the current ones instead of being removed, and
//!   all map tiles stay below the host's own content.
//! * [`Geocoder`](geocoder::Geocoder) implementations turn place names into extents to show.

pub(crate) mod async_runtime;
pub mod cache;
mod config;
pub mod decoded_image;
pub mod error;
pub mod geocoder;
mod map;
pub mod platform;
pub mod provider;
pub mod render;
pub mod style;
pub mod tile_schema;
mod view;

pub use cache::TileCache;
pub use config::{TileMapConfig, MAX_TILE_MARGIN};
pub use map::{PassReport, PassStatus, RedrawHandle, SchedulerState, TileMap, TileMapBuilder};
pub use style::{StyleId, StyleTable};
pub use tile_schema::{TileIndex, TileKey, TileRange, TileSchema};
pub use view::ViewportState;

// Reexport tilemap_types
pub use tilemap_types;
