use crate::core::constants::{MAX_ZOOM, MIN_ZOOM};
use crate::core::geo::{world_size, LatLng, Point};
use serde::{Deserialize, Serialize};

/// The current view of the map: a world-pixel center, an integer zoom
/// level, and the viewport size in screen pixels.
///
/// Fields are private so the wrap/clamp invariants hold at every
/// mutation site:
/// - `0 <= center.x < world_size(zoom)`: the world wraps horizontally;
/// - `size.y/2 <= center.y <= world_size(zoom) - size.y/2`: no
///   vertical wrap; when the world is shorter than the viewport the
///   center snaps to the middle of the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    center: Point,
    zoom: u8,
    size: Point,
    min_zoom: u8,
    max_zoom: u8,
}

impl Viewport {
    /// Creates a viewport centered on a geographic coordinate.
    pub fn new(center: LatLng, zoom: u8, size: Point) -> Self {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        let mut viewport = Self {
            center: center.to_world_pixel(zoom),
            zoom,
            size,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        };
        viewport.normalize();
        viewport
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn size(&self) -> Point {
        self.size
    }

    pub fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    /// Side length of the world raster at the current zoom
    pub fn world_size(&self) -> f64 {
        world_size(self.zoom)
    }

    /// Sets the zoom limits, clamping the current zoom into them
    pub fn set_zoom_limits(&mut self, min_zoom: u8, max_zoom: u8) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        if self.zoom < min_zoom || self.zoom > max_zoom {
            self.zoom = self.zoom.clamp(min_zoom, max_zoom);
            self.normalize();
        }
    }

    /// Updates the viewport size from the host's measured container
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
        self.normalize();
    }

    /// The geographic coordinate currently centered in the viewport
    pub fn center_lat_lng(&self) -> LatLng {
        LatLng::from_world_pixel(self.center, self.zoom)
    }

    /// Converts a viewport-local pixel to a world-pixel coordinate
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new(
            self.center.x - self.size.x / 2.0 + screen.x,
            self.center.y - self.size.y / 2.0 + screen.y,
        )
    }

    /// Converts a world-pixel coordinate to a viewport-local pixel
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(
            world.x - self.center.x + self.size.x / 2.0,
            world.y - self.center.y + self.size.y / 2.0,
        )
    }

    /// Moves the center by a world-pixel offset, then wraps/clamps.
    pub fn pan_by(&mut self, offset: Point) {
        self.center = self.center.add(&offset);
        self.normalize();
    }

    /// Changes zoom so the world point under `focus` (viewport-local
    /// pixels) stays under `focus` afterwards. Returns the scale factor
    /// `2^(new - old)` so callers can rescale anchors held outside the
    /// viewport; `1.0` means the zoom did not change.
    pub fn zoom_at(&mut self, target: u8, focus: Point) -> f64 {
        let target = target.clamp(self.min_zoom, self.max_zoom);
        if target == self.zoom {
            return 1.0;
        }

        let scale = 2_f64.powi(target as i32 - self.zoom as i32);
        let world_pointer = self.screen_to_world(focus);

        self.zoom = target;
        self.center = Point::new(
            world_pointer.x * scale - focus.x + self.size.x / 2.0,
            world_pointer.y * scale - focus.y + self.size.y / 2.0,
        );
        self.normalize();
        scale
    }

    /// Re-establishes the wrap/clamp invariants after a mutation.
    fn normalize(&mut self) {
        let world = self.world_size();
        self.center.x = self.center.x.rem_euclid(world);

        let half_height = self.size.y / 2.0;
        if world < self.size.y {
            self.center.y = world / 2.0;
        } else {
            self.center.y = self.center.y.clamp(half_height, world - half_height);
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::default(), MIN_ZOOM, Point::new(800.0, 600.0))
    }
}

/// An independent world-pixel point pinning a geographic location.
/// It is not re-derived from lat/lng on every frame, so a zoom change
/// must rescale it by `2^(new - old)` to stay geographically fixed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerAnchor {
    world: Point,
}

impl MarkerAnchor {
    pub fn from_lat_lng(position: LatLng, zoom: u8) -> Self {
        Self {
            world: position.to_world_pixel(zoom),
        }
    }

    pub fn world(&self) -> Point {
        self.world
    }

    /// Rescales the anchor after a zoom change
    pub fn rescale(&mut self, scale: f64) {
        self.world = self.world.multiply(scale);
    }

    /// Viewport-local pixel position of the anchor
    pub fn screen_position(&self, viewport: &Viewport) -> Point {
        viewport.world_to_screen(self.world)
    }
}
