//! Engine-wide constants derived from common web-map conventions.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Extra margin around the viewport, in pixels, inside which missing
/// tiles are requested (one tile on every side).
pub const LOAD_BUFFER_PX: f64 = 256.0;

/// Extra margin around the viewport, in pixels, outside which cached
/// tiles are evicted (two tiles on every side).
pub const PRUNE_BUFFER_PX: f64 = 512.0;

/// Lowest zoom level the engine will navigate to.
pub const MIN_ZOOM: u8 = 1;

/// Highest zoom level the engine will navigate to.
pub const MAX_ZOOM: u8 = 19;

/// Zoom level used when the host supplies an invalid one.
pub const DEFAULT_ZOOM: u8 = 15;

/// Pan distance in pixels for one arrow-key press.
pub const KEYBOARD_PAN_STEP: f64 = 80.0;

/// Continuous-zoom factor applied to wheel deltaY during a pinch
/// gesture. Empirically tuned; distinct from the discrete one-notch
/// wheel step on purpose.
pub const PINCH_ZOOM_RATE: f64 = 0.01;

/// Decimal digits kept on geographic coordinates in emitted events.
pub const COORD_EMIT_DECIMALS: i32 = 6;

/// Latitudes beyond this cannot be projected on a Mercator map.
pub const MAX_LATITUDE: f64 = 85.0511287798;

/// Radius, in tiles around the center tile, of the one-shot grid
/// loaded before the map becomes interactive (1 -> 3x3).
pub const STATIC_GRID_RADIUS: i64 = 1;
