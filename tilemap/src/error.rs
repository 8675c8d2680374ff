//! Error types used by the crate.

use image::ImageError;
use thiserror::Error;
use tilemap_types::TileMapTypesError;

use crate::tile_schema::TileKey;

/// Tilemap error type.
#[derive(Debug, Error)]
pub enum TileMapError {
    /// Style identifier is not one of the known tile providers.
    #[error("unknown map style '{0}'")]
    InvalidStyle(String),
    /// A single tile could not be loaded or decoded.
    #[error("tile {key} is unavailable: {reason}")]
    TileUnavailable {
        /// Key of the failed tile.
        key: TileKey,
        /// Description of the failure.
        reason: String,
    },
    /// Geocoder could not find the requested place.
    #[error("place '{0}' not found")]
    PlaceNotFound(String),
    /// Rendering surface was torn down by the host.
    #[error("map surface is closed")]
    ClosedSurface,
    /// Invalid geographic input.
    #[error("invalid bounding box: {0}")]
    InvalidBoundingBox(#[from] TileMapTypesError),
    /// Network I/O error.
    #[error("failed to load data: {0}")]
    IO(String),
    /// Image decoding error.
    #[error("image decode error: {0:?}")]
    ImageDecode(#[from] ImageError),
    /// Invalid engine configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The redraw scheduler of the map is not running anymore.
    #[error("redraw scheduler stopped")]
    SchedulerStopped,
    /// Generic error - details are inside.
    #[error("{0}")]
    Generic(String),
}

impl From<reqwest::Error> for TileMapError {
    fn from(value: reqwest::Error) -> Self {
        Self::IO(value.to_string())
    }
}

impl From<serde_json::Error> for TileMapError {
    fn from(value: serde_json::Error) -> Self {
        Self::Configuration(value.to_string())
    }
}
