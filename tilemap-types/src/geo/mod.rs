//! Geometries in geographic coordinates (longitude and latitude in degrees) and their mapping to
//! the Web-Mercator tile grid.

pub mod bounding_box;
pub mod web_mercator;
