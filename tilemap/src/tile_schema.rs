//! [`TileSchema`] is used by the map to calculate [tile indices](TileIndex) needed for a given
//! geographic extent.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use tilemap_types::web_mercator::{
    lat_to_tile_y, lat_to_world_y, lon_to_tile_x, lon_to_world_x, tile_x_to_lon, tile_y_to_lat,
    tiles_per_axis,
};
use tilemap_types::{GeoBoundingBox, Size};

use crate::style::StyleId;

const ZOOM_TOLERANCE: f64 = 1e-6;

/// Tile index.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileIndex {
    /// X index.
    pub x: i32,
    /// Y index.
    pub y: i32,
    /// Z index.
    pub z: u32,
}

impl TileIndex {
    /// Create a new index instance.
    pub fn new(x: i32, y: i32, z: u32) -> Self {
        Self { x, y, z }
    }
}

/// Unique identifier of a raster tile: its position in the tile grid and the style it is drawn
/// with.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileKey {
    /// Position of the tile.
    pub index: TileIndex,
    /// Style of the tile.
    pub style: StyleId,
}

impl TileKey {
    /// Creates a new key.
    pub fn new(index: TileIndex, style: StyleId) -> Self {
        Self { index, style }
    }

    /// Zoom level of the tile.
    pub fn zoom(&self) -> u32 {
        self.index.z
    }
}

impl Display for TileKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.style, self.index.z, self.index.x, self.index.y
        )
    }
}

/// Rectangular range of tile indices of one zoom level. Both bounds are inclusive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRange {
    /// Zoom level.
    pub z: u32,
    /// Western-most column.
    pub x_min: i32,
    /// Eastern-most column.
    pub x_max: i32,
    /// Northern-most row.
    pub y_min: i32,
    /// Southern-most row.
    pub y_max: i32,
}

impl TileRange {
    /// Returns true if the index is inside the range.
    pub fn contains(&self, index: TileIndex) -> bool {
        index.z == self.z
            && (self.x_min..=self.x_max).contains(&index.x)
            && (self.y_min..=self.y_max).contains(&index.y)
    }

    /// Number of columns in the range.
    pub fn width(&self) -> usize {
        (self.x_max - self.x_min + 1).max(0) as usize
    }

    /// Number of rows in the range.
    pub fn height(&self) -> usize {
        (self.y_max - self.y_min + 1).max(0) as usize
    }

    /// Number of tiles in the range.
    pub fn len(&self) -> usize {
        self.width() * self.height()
    }

    /// Returns true if the range contains no tiles.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grows the range by `margin` tiles on every side, keeping it inside the tile grid.
    pub fn expand(&self, margin: u32) -> Self {
        let margin = i32::try_from(margin).unwrap_or(i32::MAX);
        let max_index = max_index(self.z);
        Self {
            z: self.z,
            x_min: self.x_min.saturating_sub(margin).clamp(0, max_index),
            x_max: self.x_max.saturating_add(margin).clamp(0, max_index),
            y_min: self.y_min.saturating_sub(margin).clamp(0, max_index),
            y_max: self.y_max.saturating_add(margin).clamp(0, max_index),
        }
    }

    /// Iterates over the indices of the range row by row, starting from the north-west corner.
    pub fn iter(&self) -> impl Iterator<Item = TileIndex> {
        let Self {
            z,
            x_min,
            x_max,
            y_min,
            y_max,
        } = *self;
        (y_min..=y_max).flat_map(move |y| (x_min..=x_max).map(move |x| TileIndex::new(x, y, z)))
    }
}

/// Tile schema specifies how tile indices are calculated for the map extent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TileSchema {
    /// Width and height of a single tile in pixels.
    pub tile_size: u32,
    /// Lowest zoom level of the schema.
    pub min_zoom: u32,
    /// Highest zoom level of the schema.
    pub max_zoom: u32,
}

impl Default for TileSchema {
    fn default() -> Self {
        Self::web(18)
    }
}

impl TileSchema {
    /// Standard Web Mercator based tile schema with 256 pixel tiles (used, for example, by OSM).
    pub fn web(max_zoom: u32) -> Self {
        Self {
            tile_size: 256,
            min_zoom: 0,
            max_zoom,
        }
    }

    /// Selects the zoom level for showing `bbox` in a viewport of the given pixel size.
    ///
    /// The selected level is the smallest one at which the box spans at least as many tiles as
    /// are needed to fill the viewport along both axes. If the axes require different levels, the
    /// lower one is taken so that the whole box stays visible. The result is then shifted by
    /// `base_zoom_offset` (negative values give coarser tiles) and kept inside the schema's zoom
    /// range.
    pub fn select_zoom(
        &self,
        bbox: &GeoBoundingBox,
        viewport: Size<u32>,
        base_zoom_offset: i32,
    ) -> u32 {
        let tiles_x = (viewport.width() as f64 / self.tile_size as f64)
            .ceil()
            .max(1.0);
        let tiles_y = (viewport.height() as f64 / self.tile_size as f64)
            .ceil()
            .max(1.0);

        let span_x = lon_to_world_x(bbox.max_lon()) - lon_to_world_x(bbox.min_lon());
        let span_y = lat_to_world_y(bbox.min_lat()) - lat_to_world_y(bbox.max_lat());

        let zoom = zoom_for_span(tiles_x, span_x).min(zoom_for_span(tiles_y, span_y));
        let zoom = self.clamp_zoom(zoom);

        self.clamp_zoom(zoom as f64 + base_zoom_offset as f64)
    }

    /// Range of tiles of the `zoom` level covering the bounding box.
    ///
    /// The range never goes outside of the tile grid, so boxes touching the anti-meridian or the
    /// southern map edge do not produce nonexistent tiles.
    pub fn tile_range(&self, bbox: &GeoBoundingBox, zoom: u32) -> TileRange {
        let (mut x_min, mut x_max) = (
            lon_to_tile_x(bbox.min_lon(), zoom),
            lon_to_tile_x(bbox.max_lon(), zoom),
        );
        let (mut y_min, mut y_max) = (
            lat_to_tile_y(bbox.max_lat(), zoom),
            lat_to_tile_y(bbox.min_lat(), zoom),
        );

        if x_min > x_max {
            std::mem::swap(&mut x_min, &mut x_max);
        }
        if y_min > y_max {
            std::mem::swap(&mut y_min, &mut y_max);
        }

        let max_index = max_index(zoom);
        TileRange {
            z: zoom,
            x_min: x_min.clamp(0, max_index),
            x_max: x_max.clamp(0, max_index),
            y_min: y_min.clamp(0, max_index),
            y_max: y_max.clamp(0, max_index),
        }
    }

    /// Geographic extent of the tile.
    pub fn tile_bbox(&self, index: TileIndex) -> Option<GeoBoundingBox> {
        if index.z < self.min_zoom || index.z > self.max_zoom {
            return None;
        }

        let max_index = max_index(index.z);
        if !(0..=max_index).contains(&index.x) || !(0..=max_index).contains(&index.y) {
            return None;
        }

        let west = tile_x_to_lon(index.x as f64, index.z);
        let east = tile_x_to_lon(index.x as f64 + 1.0, index.z);
        let north = tile_y_to_lat(index.y as f64, index.z);
        let south = tile_y_to_lat(index.y as f64 + 1.0, index.z);

        GeoBoundingBox::new(west, east, south, north).ok()
    }

    fn clamp_zoom(&self, zoom: f64) -> u32 {
        if zoom.is_nan() {
            return self.max_zoom;
        }

        zoom.clamp(self.min_zoom as f64, self.max_zoom as f64) as u32
    }
}

fn max_index(zoom: u32) -> i32 {
    tiles_per_axis(zoom) as i32 - 1
}

fn zoom_for_span(needed_tiles: f64, span: f64) -> f64 {
    if span <= 0.0 {
        return f64::INFINITY;
    }

    ((needed_tiles / span).log2() - ZOOM_TOLERANCE).ceil()
}
