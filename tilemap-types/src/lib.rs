//! Geographic primitives used by the `tilemap` engine.
//!
//! * [`GeoBoundingBox`] is a validated rectangle in longitude/latitude degrees.
//! * [`Size`] is a width/height pair, used for viewport pixel dimensions.
//! * [`web_mercator`] contains the tile math of the standard slippy-map tiling: conversion
//!   between geographic coordinates and tile indices for a given zoom level.

pub mod error;
pub mod geo;
mod size;

pub use error::TileMapTypesError;
pub use geo::bounding_box::GeoBoundingBox;
pub use geo::web_mercator;
pub use size::Size;
