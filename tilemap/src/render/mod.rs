//! Rendering output of the map.
//!
//! The map does not draw pixels itself. For every tile it decides to show it emits a
//! [`TilePlacement`] to the host's [`TileSurface`], together with the tile's position in the stack
//! of map tiles. The host draws its own content (markers, tracks, etc.) on the same surface; map
//! tiles must always stay below that content.

use std::sync::Arc;

use maybe_sync::MaybeSend;
use serde::{Deserialize, Serialize};
use tilemap_types::GeoBoundingBox;

use crate::decoded_image::TileImage;
use crate::error::TileMapError;
use crate::tile_schema::TileKey;

mod memory;
pub use memory::{MemorySurface, SurfaceItem};

/// Z-order band of a map tile. Every tile of the [`ZBand::Stale`] band is drawn below every tile
/// of the [`ZBand::Current`] band, and both are drawn below the host's own content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ZBand {
    /// Tile of another zoom level or style than the current view. Kept on the surface so that the
    /// map has no holes while new tiles are loading.
    Stale,
    /// Tile of the current zoom level and style.
    Current,
}

/// A map tile together with its band, as known to the draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlacedTile {
    /// Key of the tile.
    pub key: TileKey,
    /// Band the tile belongs to.
    pub band: ZBand,
}

/// Directive to draw a tile on the surface.
#[derive(Debug, Clone)]
pub struct TilePlacement {
    /// Tile to draw.
    pub tile: Arc<TileImage>,
    /// Geographic quad covered by the tile.
    pub quad: GeoBoundingBox,
    /// Band of the tile.
    pub band: ZBand,
    /// Position in the stack of map tiles, counting from the bottom. The tile is inserted at this
    /// position; if the tile is already on the surface, it is moved there.
    pub position: usize,
}

impl TilePlacement {
    /// Key of the placed tile.
    pub fn key(&self) -> TileKey {
        self.tile.key()
    }
}

/// Drawing surface provided by the host application.
///
/// All methods are called from the redraw scheduler of the map, one at a time. Once the host
/// tears the surface down, every method should return [`TileMapError::ClosedSurface`]: this
/// aborts the current redraw pass of the map.
pub trait TileSurface: MaybeSend {
    /// Draws a tile at the given position of the map tile stack.
    fn place(&mut self, placement: TilePlacement) -> Result<(), TileMapError>;

    /// Reorders the map tiles already on the surface to match `order` (bottom to top) and updates
    /// their bands.
    fn restack(&mut self, order: &[PlacedTile]) -> Result<(), TileMapError>;

    /// Makes all the changes done so far visible on the display.
    fn flush(&mut self) -> Result<(), TileMapError>;
}
