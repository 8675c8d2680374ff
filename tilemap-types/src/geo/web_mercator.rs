//! Tile math of the Web-Mercator slippy-map tiling.
//!
//! The world is covered by `2^zoom` tiles along each axis. Tile `x` grows eastwards from the
//! anti-meridian, tile `y` grows southwards from the northern edge at [`MAX_LATITUDE`].
//!
//! Besides integer tile indices the module works with "world" coordinates: the position of a
//! point on the map as a fraction of the whole map extent, both axes in `[0, 1]`.

use std::f64::consts::PI;

/// Highest latitude representable in Web-Mercator (the map is a square).
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Number of tiles along one axis at the given zoom level.
pub fn tiles_per_axis(zoom: u32) -> f64 {
    2f64.powi(zoom as i32)
}

/// Horizontal world coordinate of the longitude, `0` at `-180°`, `1` at `180°`.
pub fn lon_to_world_x(lon: f64) -> f64 {
    (lon + 180.0) / 360.0
}

/// Vertical world coordinate of the latitude, `0` at the northern edge, `1` at the southern.
///
/// Latitudes beyond [`MAX_LATITUDE`] are clamped, so poles map to the map edges instead of
/// producing infinite values.
pub fn lat_to_world_y(lat: f64) -> f64 {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    ((1.0 - lat.to_radians().tan().asinh() / PI) / 2.0).clamp(0.0, 1.0)
}

/// X index of the tile containing the longitude.
pub fn lon_to_tile_x(lon: f64, zoom: u32) -> i32 {
    (tiles_per_axis(zoom) * lon_to_world_x(lon)).floor() as i32
}

/// Y index of the tile containing the latitude.
pub fn lat_to_tile_y(lat: f64, zoom: u32) -> i32 {
    (tiles_per_axis(zoom) * lat_to_world_y(lat)).floor() as i32
}

/// Longitude of the western edge of the tile column `x`.
///
/// Fractional values are accepted, so `x + 1.0` gives the eastern edge of the column.
pub fn tile_x_to_lon(x: f64, zoom: u32) -> f64 {
    x / tiles_per_axis(zoom) * 360.0 - 180.0
}

/// Latitude of the northern edge of the tile row `y`.
///
/// Fractional values are accepted, so `y + 1.0` gives the southern edge of the row.
pub fn tile_y_to_lat(y: f64, zoom: u32) -> f64 {
    (PI * (1.0 - 2.0 * y / tiles_per_axis(zoom)))
        .sinh()
        .atan()
        .to_degrees()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn known_tiles() {
        assert_eq!(lon_to_tile_x(0.0, 0), 0);
        assert_eq!(lat_to_tile_y(0.0, 0), 0);
        assert_eq!(lon_to_tile_x(8.0, 12), 2139);
        assert_eq!(lon_to_tile_x(8.4, 12), 2143);
        assert_eq!(lat_to_tile_y(53.25, 12), 1329);
        assert_eq!(lat_to_tile_y(53.05, 12), 1333);
    }

    #[test]
    fn tile_edges() {
        assert_abs_diff_eq!(tile_x_to_lon(0.0, 3), -180.0);
        assert_abs_diff_eq!(tile_x_to_lon(8.0, 3), 180.0);
        assert_abs_diff_eq!(tile_x_to_lon(4.0, 3), 0.0);
        assert_abs_diff_eq!(tile_y_to_lat(0.0, 5), MAX_LATITUDE, epsilon = 1e-9);
        assert_abs_diff_eq!(tile_y_to_lat(16.0, 5), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tile_y_to_lat(32.0, 5), -MAX_LATITUDE, epsilon = 1e-9);
    }

    #[test]
    fn poles_produce_finite_indices() {
        for zoom in 0..=18 {
            let max = tiles_per_axis(zoom) as i32;
            let north = lat_to_tile_y(90.0, zoom);
            let south = lat_to_tile_y(-90.0, zoom);
            assert_eq!(north, 0);
            assert!(south == max || south == max - 1, "zoom {zoom}: {south}");
        }
    }

    #[test]
    fn round_trip_within_one_tile() {
        for zoom in [0, 1, 5, 10, 15, 18] {
            let tile_width = 360.0 / tiles_per_axis(zoom);
            let mut lon = -179.9;
            while lon < 180.0 {
                let back = tile_x_to_lon(lon_to_tile_x(lon, zoom) as f64, zoom);
                assert!(back <= lon + 1e-9 && lon - back < tile_width, "{lon} -> {back}");
                lon += 7.3;
            }

            let mut lat = -84.9;
            while lat < 85.0 {
                let y = lat_to_tile_y(lat, zoom) as f64;
                let north = tile_y_to_lat(y, zoom);
                let south = tile_y_to_lat(y + 1.0, zoom);
                assert!(lat <= north + 1e-9 && lat >= south - 1e-9, "{lat}: {south}..{north}");
                lat += 3.7;
            }
        }
    }

    #[test]
    fn projection_is_monotonic() {
        for zoom in [0, 4, 12, 18] {
            let mut prev_x = lon_to_tile_x(-180.0, zoom);
            let mut prev_y = lat_to_tile_y(-90.0, zoom);
            for step in 1..=2000 {
                let t = step as f64 / 2000.0;
                let x = lon_to_tile_x(-180.0 + 360.0 * t, zoom);
                let y = lat_to_tile_y(-90.0 + 180.0 * t, zoom);
                assert!(x >= prev_x);
                assert!(y <= prev_y);
                prev_x = x;
                prev_y = y;
            }
        }
    }
}
