//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TileMapTypesError {
    /// A coordinate is not a finite number.
    #[error("coordinate is not a finite number")]
    NotFinite,
    /// Longitude is outside of `[-180, 180]`.
    #[error("longitude {0} is out of range")]
    LongitudeOutOfRange(f64),
    /// Latitude is outside of `[-90, 90]`.
    #[error("latitude {0} is out of range")]
    LatitudeOutOfRange(f64),
    /// Minimum of an axis is greater than its maximum.
    #[error("minimum {min} is greater than maximum {max}")]
    InvertedAxis {
        /// Minimum value of the axis.
        min: f64,
        /// Maximum value of the axis.
        max: f64,
    },
}
