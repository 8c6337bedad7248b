use crate::core::geo::Point;
use crate::core::viewport::Viewport;
use crate::tiles::cache::TileEntry;

/// The contract between the engine and the presentation layer. The
/// engine hands over geometry; the sink owns pixels, styling, layout,
/// and markup. Paints may arrive as often as once per input event, so
/// implementations should be cheap and idempotent (coalescing to one
/// paint per animation frame is the sink's business).
pub trait RenderSink {
    /// Paint the given tiles for the current view. Entries carry their
    /// world-pixel top-left; `Viewport::world_to_screen` converts to
    /// sink coordinates.
    fn paint_tiles(&mut self, viewport: &Viewport, tiles: &[&TileEntry]);

    /// Place the marker icon at a viewport-local pixel position.
    fn place_marker(&mut self, screen: Point);
}
