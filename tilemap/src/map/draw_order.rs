use crate::render::{PlacedTile, ZBand};
use crate::style::StyleId;
use crate::tile_schema::TileKey;

/// Order in which map tiles are stacked on the surface, from bottom to top.
///
/// Tiles are never removed. At the beginning of every redraw pass the tiles that do not match the
/// pass zoom and style are moved into the [`ZBand::Stale`] band below all current tiles. Newly
/// painted tiles go to the top of the map stack, which is still below the host content.
#[derive(Debug, Default)]
pub(crate) struct DrawOrder {
    placed: Vec<PlacedTile>,
}

impl DrawOrder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Classifies all placed tiles against the zoom and style of a new pass. Returns true if
    /// the order or a band of any tile changed.
    pub(crate) fn begin_pass(&mut self, zoom: u32, style: StyleId) -> bool {
        let band_of = |key: &TileKey| {
            if key.zoom() == zoom && key.style == style {
                ZBand::Current
            } else {
                ZBand::Stale
            }
        };

        let mut changed = false;
        let (mut stale, current): (Vec<_>, Vec<_>) = self
            .placed
            .iter()
            .map(|placed| {
                let band = band_of(&placed.key);
                changed |= band != placed.band;
                PlacedTile {
                    key: placed.key,
                    band,
                }
            })
            .partition(|placed| placed.band == ZBand::Stale);

        stale.extend(current);
        changed |= stale
            .iter()
            .zip(&self.placed)
            .any(|(new, old)| new.key != old.key);

        self.placed = stale;
        changed
    }

    /// Returns true if the tile is placed in the current band.
    pub(crate) fn is_current(&self, key: &TileKey) -> bool {
        self.placed
            .iter()
            .any(|placed| placed.key == *key && placed.band == ZBand::Current)
    }

    /// Position the tile would get if it was placed now.
    pub(crate) fn top_position(&self, key: &TileKey) -> usize {
        let already_placed = self.placed.iter().any(|placed| placed.key == *key);
        self.placed.len() - usize::from(already_placed)
    }

    /// Puts the tile to the top of the map stack as a current tile and returns its position.
    pub(crate) fn place(&mut self, key: TileKey) -> usize {
        self.placed.retain(|placed| placed.key != key);
        self.placed.push(PlacedTile {
            key,
            band: ZBand::Current,
        });

        self.placed.len() - 1
    }

    pub(crate) fn placed(&self) -> &[PlacedTile] {
        &self.placed
    }
}
