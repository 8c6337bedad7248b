use crate::core::constants::{MAX_LATITUDE, TILE_SIZE};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Side length in pixels of the full world raster at `zoom`.
pub fn world_size(zoom: u8) -> f64 {
    TILE_SIZE as f64 * 2_f64.powi(zoom as i32)
}

/// Number of tiles per world side at `zoom`.
pub fn tiles_per_side(zoom: u8) -> i64 {
    1_i64 << zoom
}

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are finite and the latitude is in range.
    /// Longitude is wrapped conceptually and accepted as-is.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite() && self.lat >= -90.0 && self.lat <= 90.0
    }

    /// Clamps latitude to the projectable Mercator range
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
    }

    /// Wraps longitude to [-180, 180] range
    pub fn wrap_lng(lng: f64) -> f64 {
        let wrapped = lng % 360.0;
        if wrapped > 180.0 {
            wrapped - 360.0
        } else if wrapped < -180.0 {
            wrapped + 360.0
        } else {
            wrapped
        }
    }

    /// Rounds both coordinates to `decimals` digits.
    pub fn rounded(&self, decimals: i32) -> LatLng {
        let factor = 10_f64.powi(decimals);
        LatLng::new(
            (self.lat * factor).round() / factor,
            (self.lng * factor).round() / factor,
        )
    }

    /// Projects to the slippy-tile grid at `zoom`: the containing tile
    /// plus the position inside that tile in pixels.
    pub fn to_tile(&self, zoom: u8) -> TilePixel {
        let n = tiles_per_side(zoom) as f64;
        let lat_rad = Self::clamp_lat(self.lat).to_radians();

        let xf = (self.lng + 180.0) / 360.0 * n;
        let yf = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;

        let tile = TileCoord::wrapped(
            xf.floor() as i64,
            (yf.floor() as i64).clamp(0, tiles_per_side(zoom) - 1) as u32,
            zoom,
        );
        TilePixel {
            tile,
            pixel_x: ((xf - xf.floor()) * TILE_SIZE as f64).round() as u32,
            pixel_y: ((yf - yf.floor()) * TILE_SIZE as f64).round() as u32,
        }
    }

    /// Projects to world-pixel coordinates at `zoom` (the same formula
    /// scaled to the full world raster). Seeds the viewport.
    pub fn to_world_pixel(&self, zoom: u8) -> Point {
        let size = world_size(zoom);
        let lat_rad = Self::clamp_lat(self.lat).to_radians();

        let x = (self.lng + 180.0) / 360.0 * size;
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * size;
        Point::new(x, y)
    }

    /// Inverse Mercator: recovers the geographic coordinate at a
    /// world-pixel position. Round-trips `to_world_pixel` within
    /// floating-point epsilon.
    pub fn from_world_pixel(point: Point, zoom: u8) -> Self {
        let size = world_size(zoom);
        let lng = point.x / size * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * point.y / size)).sinh().atan().to_degrees();
        Self::new(lat, lng)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a point in screen or world-pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a tile coordinate in the slippy map tile system.
/// `x` is always stored wrapped into `[0, 2^z)`; `y` is never wrapped
/// because a Mercator map has no vertical wraparound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Builds a key from a possibly out-of-range horizontal index,
    /// wrapping it into `[0, 2^z)`.
    pub fn wrapped(x: i64, y: u32, z: u8) -> Self {
        let n = tiles_per_side(z);
        Self {
            x: x.rem_euclid(n) as u32,
            y,
            z,
        }
    }

    /// Checks that both indices are inside the grid for this zoom
    pub fn is_valid(&self) -> bool {
        let n = tiles_per_side(self.z) as u32;
        self.x < n && self.y < n
    }
}

/// A tile index plus the pixel position inside that tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TilePixel {
    pub tile: TileCoord,
    pub pixel_x: u32,
    pub pixel_y: u32,
}
