use std::sync::Arc;

use parking_lot::Mutex;
use tilemap_types::GeoBoundingBox;

use super::{PlacedTile, TilePlacement, TileSurface, ZBand};
use crate::decoded_image::TileImage;
use crate::error::TileMapError;
use crate::tile_schema::TileKey;

/// Item of a [`MemorySurface`] stack.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceItem {
    /// Map tile.
    Tile(TileKey, ZBand),
    /// Content added by the host with [`MemorySurface::add_user_content`].
    UserContent(String),
}

/// Surface that keeps the drawn stack in memory instead of displaying it.
///
/// Useful for headless rendering and for inspecting what a map would draw. Clones of the surface
/// share the same stack, so a clone can be given to the map while the original is used to inspect
/// the result.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    state: Arc<Mutex<SurfaceState>>,
}

#[derive(Debug, Default)]
struct SurfaceState {
    tiles: Vec<DrawnTile>,
    user_content: Vec<String>,
    flushes: usize,
    closed: bool,
}

#[derive(Debug)]
struct DrawnTile {
    tile: Arc<TileImage>,
    quad: GeoBoundingBox,
    band: ZBand,
}

impl MemorySurface {
    /// Creates an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item of host content on top of the surface.
    pub fn add_user_content(&self, name: impl Into<String>) {
        self.state.lock().user_content.push(name.into());
    }

    /// Tears down the surface. All following draw calls fail with
    /// [`TileMapError::ClosedSurface`].
    pub fn close(&self) {
        self.state.lock().closed = true;
    }

    /// Returns true if the surface was closed.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Map tiles on the surface, from bottom to top.
    pub fn tiles(&self) -> Vec<PlacedTile> {
        self.state
            .lock()
            .tiles
            .iter()
            .map(|drawn| PlacedTile {
                key: drawn.tile.key(),
                band: drawn.band,
            })
            .collect()
    }

    /// Geographic quad of the tile, if the tile is on the surface.
    pub fn tile_quad(&self, key: &TileKey) -> Option<GeoBoundingBox> {
        self.state
            .lock()
            .tiles
            .iter()
            .find(|drawn| drawn.tile.key() == *key)
            .map(|drawn| drawn.quad)
    }

    /// The whole stack of the surface, from bottom to top.
    pub fn stack(&self) -> Vec<SurfaceItem> {
        let state = self.state.lock();
        state
            .tiles
            .iter()
            .map(|drawn| SurfaceItem::Tile(drawn.tile.key(), drawn.band))
            .chain(state.user_content.iter().cloned().map(SurfaceItem::UserContent))
            .collect()
    }

    /// Number of times the surface was flushed to the display.
    pub fn flush_count(&self) -> usize {
        self.state.lock().flushes
    }
}

impl SurfaceState {
    fn check_open(&self) -> Result<(), TileMapError> {
        if self.closed {
            Err(TileMapError::ClosedSurface)
        } else {
            Ok(())
        }
    }
}

impl TileSurface for MemorySurface {
    fn place(&mut self, placement: TilePlacement) -> Result<(), TileMapError> {
        let mut state = self.state.lock();
        state.check_open()?;

        let key = placement.key();
        state.tiles.retain(|drawn| drawn.tile.key() != key);

        let position = placement.position.min(state.tiles.len());
        state.tiles.insert(
            position,
            DrawnTile {
                tile: placement.tile,
                quad: placement.quad,
                band: placement.band,
            },
        );

        Ok(())
    }

    fn restack(&mut self, order: &[PlacedTile]) -> Result<(), TileMapError> {
        let mut state = self.state.lock();
        state.check_open()?;

        let mut remaining = std::mem::take(&mut state.tiles);
        let mut restacked = Vec::with_capacity(remaining.len());
        for placed in order {
            if let Some(pos) = remaining
                .iter()
                .position(|drawn| drawn.tile.key() == placed.key)
            {
                let mut drawn = remaining.remove(pos);
                drawn.band = placed.band;
                restacked.push(drawn);
            }
        }

        // Tiles unknown to the caller go below everything else.
        remaining.append(&mut restacked);
        state.tiles = remaining;

        Ok(())
    }

    fn flush(&mut self) -> Result<(), TileMapError> {
        let mut state = self.state.lock();
        state.check_open()?;
        state.flushes += 1;

        Ok(())
    }
}
