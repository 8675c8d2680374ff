//! See [`GeoBoundingBox`].

use serde::{Deserialize, Serialize};

use crate::error::TileMapTypesError;

/// Rectangle in geographic coordinates (degrees).
///
/// A valid box always has `min_lon <= max_lon` and `min_lat <= max_lat`, with longitudes in
/// `[-180, 180]` and latitudes in `[-90, 90]`. Use [`GeoBoundingBox::from_corners`] to build a box
/// from two arbitrary corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBoundingBox", into = "RawBoundingBox")]
pub struct GeoBoundingBox {
    min_lon: f64,
    max_lon: f64,
    min_lat: f64,
    max_lat: f64,
}

#[derive(Serialize, Deserialize)]
struct RawBoundingBox {
    min_lon: f64,
    max_lon: f64,
    min_lat: f64,
    max_lat: f64,
}

impl GeoBoundingBox {
    /// The whole world as covered by Web-Mercator tiles.
    pub const WORLD: GeoBoundingBox = GeoBoundingBox {
        min_lon: -180.0,
        max_lon: 180.0,
        min_lat: -crate::web_mercator::MAX_LATITUDE,
        max_lat: crate::web_mercator::MAX_LATITUDE,
    };

    /// Creates a new bounding box, checking that the values are valid.
    pub fn new(
        min_lon: f64,
        max_lon: f64,
        min_lat: f64,
        max_lat: f64,
    ) -> Result<Self, TileMapTypesError> {
        check_lon(min_lon)?;
        check_lon(max_lon)?;
        check_lat(min_lat)?;
        check_lat(max_lat)?;

        if min_lon > max_lon {
            return Err(TileMapTypesError::InvertedAxis {
                min: min_lon,
                max: max_lon,
            });
        }

        if min_lat > max_lat {
            return Err(TileMapTypesError::InvertedAxis {
                min: min_lat,
                max: max_lat,
            });
        }

        Ok(Self {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        })
    }

    /// Creates a bounding box spanning two corners given as `(lon, lat)` in any order.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Result<Self, TileMapTypesError> {
        Self::new(a.0.min(b.0), a.0.max(b.0), a.1.min(b.1), a.1.max(b.1))
    }

    /// Western edge.
    pub fn min_lon(&self) -> f64 {
        self.min_lon
    }

    /// Eastern edge.
    pub fn max_lon(&self) -> f64 {
        self.max_lon
    }

    /// Southern edge.
    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    /// Northern edge.
    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    /// Longitude span in degrees.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Latitude span in degrees.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Center of the box as `(lon, lat)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Returns true if the point `(lon, lat)` is inside the box or on its border.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Returns true if the boxes have at least one common point.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_lon <= other.max_lon
            && self.max_lon >= other.min_lon
            && self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
    }

    /// Corners of the box starting from the north-west one, clockwise, as `(lon, lat)`.
    pub fn into_quadrangle(self) -> [(f64, f64); 4] {
        [
            (self.min_lon, self.max_lat),
            (self.max_lon, self.max_lat),
            (self.max_lon, self.min_lat),
            (self.min_lon, self.min_lat),
        ]
    }
}

fn check_lon(lon: f64) -> Result<(), TileMapTypesError> {
    if !lon.is_finite() {
        return Err(TileMapTypesError::NotFinite);
    }

    if !(-180.0..=180.0).contains(&lon) {
        return Err(TileMapTypesError::LongitudeOutOfRange(lon));
    }

    Ok(())
}

fn check_lat(lat: f64) -> Result<(), TileMapTypesError> {
    if !lat.is_finite() {
        return Err(TileMapTypesError::NotFinite);
    }

    if !(-90.0..=90.0).contains(&lat) {
        return Err(TileMapTypesError::LatitudeOutOfRange(lat));
    }

    Ok(())
}

impl TryFrom<RawBoundingBox> for GeoBoundingBox {
    type Error = TileMapTypesError;

    fn try_from(value: RawBoundingBox) -> Result<Self, Self::Error> {
        Self::new(value.min_lon, value.max_lon, value.min_lat, value.max_lat)
    }
}

impl From<GeoBoundingBox> for RawBoundingBox {
    fn from(value: GeoBoundingBox) -> Self {
        Self {
            min_lon: value.min_lon,
            max_lon: value.max_lon,
            min_lat: value.min_lat,
            max_lat: value.max_lat,
        }
    }
}
