use crate::core::constants::{LOAD_BUFFER_PX, PRUNE_BUFFER_PX, STATIC_GRID_RADIUS, TILE_SIZE};
use crate::core::geo::{tiles_per_side, Point, TileCoord};
use crate::core::viewport::Viewport;
use crate::tiles::loader::{FetchResult, TileLoader};
use crate::tiles::source::TileSource;
use fxhash::FxHashMap;
use std::sync::Arc;

/// Load state of a cached tile. Geometry is known from the moment the
/// entry exists; the resource arrives later, or never.
#[derive(Debug, Clone)]
pub enum TileState {
    Loading,
    Ready(Arc<Vec<u8>>),
}

/// A materialized (or materializing) tile and its world-pixel geometry.
/// The top-left corner is stored once at request time so pruning never
/// re-derives it from a transform.
#[derive(Debug, Clone)]
pub struct TileEntry {
    pub coord: TileCoord,
    pub state: TileState,
    pub world_left: f64,
    pub world_top: f64,
}

impl TileEntry {
    pub fn is_ready(&self) -> bool {
        matches!(self.state, TileState::Ready(_))
    }

    /// True when the tile's bounding box touches `[min, max]`
    pub fn intersects(&self, min: Point, max: Point) -> bool {
        let tile = TILE_SIZE as f64;
        self.world_left <= max.x
            && self.world_left + tile >= min.x
            && self.world_top <= max.y
            && self.world_top + tile >= min.y
    }
}

/// What became of one completed fetch once it reached the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The resource materialized into its entry
    Inserted,
    /// The fetch failed; the entry was dropped and the gap will
    /// self-heal on a later viewport update
    Failed,
    /// The result outlived the zoom (or the pruning) that wanted it and
    /// was discarded without touching the cache
    Stale,
}

/// Keyed store of tile entries, kept consistent with the viewport:
/// missing tiles inside a one-tile buffer are requested, entries
/// outside a two-tile buffer are evicted. Eviction is purely spatial
/// (an entry's fitness is "is it still near what the user can see"),
/// never recency- or count-based.
pub struct TileCache {
    entries: FxHashMap<TileCoord, TileEntry>,
    source: Box<dyn TileSource>,
    loader: TileLoader,
    epoch: u64,
}

impl TileCache {
    pub fn new(source: Box<dyn TileSource>, loader: TileLoader) -> Self {
        Self {
            entries: FxHashMap::default(),
            source,
            loader,
            epoch: 0,
        }
    }

    /// Zoom epoch of the requests currently considered live
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &TileEntry> {
        self.entries.values()
    }

    /// Entries whose resource has arrived, for handing to the painter
    pub fn ready_entries(&self) -> Vec<&TileEntry> {
        self.entries.values().filter(|e| e.is_ready()).collect()
    }

    pub fn contains(&self, coord: &TileCoord) -> bool {
        self.entries.contains_key(coord)
    }

    /// Requests every tile missing from the viewport plus a one-tile
    /// buffer on each side. X indices wrap around the world seam; the Y
    /// range is clamped to the grid. Returns the number of fetches
    /// issued.
    pub fn load_visible(&mut self, viewport: &Viewport) -> usize {
        let center = viewport.center();
        let half = viewport.size().multiply(0.5);
        let min = Point::new(
            center.x - half.x - LOAD_BUFFER_PX,
            center.y - half.y - LOAD_BUFFER_PX,
        );
        let max = Point::new(
            center.x + half.x + LOAD_BUFFER_PX,
            center.y + half.y + LOAD_BUFFER_PX,
        );
        self.request_range(viewport.zoom(), min, max)
    }

    /// Requests the fixed one-shot grid around the viewport center
    /// (`STATIC_GRID_RADIUS` = 1 -> 3x3) used by the non-interactive
    /// mode. Returns the number of fetches issued.
    pub fn load_static_grid(&mut self, viewport: &Viewport) -> usize {
        let tile = TILE_SIZE as f64;
        let center = viewport.center();
        let span = STATIC_GRID_RADIUS as f64 * tile;
        let center_left = (center.x / tile).floor() * tile;
        let center_top = (center.y / tile).floor() * tile;
        let min = Point::new(center_left - span, center_top - span);
        // the far edge of the center tile, minus a hair so the range
        // stays exactly (2*radius + 1) tiles wide
        let max = Point::new(
            center_left + span + tile - 1.0,
            center_top + span + tile - 1.0,
        );
        self.request_range(viewport.zoom(), min, max)
    }

    fn request_range(&mut self, zoom: u8, min: Point, max: Point) -> usize {
        let tile = TILE_SIZE as f64;
        let n = tiles_per_side(zoom);

        let x0 = (min.x / tile).floor() as i64;
        let x1 = (max.x / tile).floor() as i64;
        let y0 = ((min.y / tile).floor() as i64).max(0);
        let y1 = ((max.y / tile).floor() as i64).min(n - 1);

        let mut requested = 0;
        for x in x0..=x1 {
            for y in y0..=y1 {
                let coord = TileCoord::wrapped(x, y as u32, zoom);
                if self.entries.contains_key(&coord) {
                    continue;
                }
                self.entries.insert(
                    coord,
                    TileEntry {
                        coord,
                        state: TileState::Loading,
                        world_left: x as f64 * tile,
                        world_top: y as f64 * tile,
                    },
                );
                self.loader.request(self.source.url(coord), coord, self.epoch);
                requested += 1;
            }
        }
        requested
    }

    /// Evicts every entry whose bounding box no longer intersects the
    /// viewport expanded by a two-tile buffer.
    pub fn prune(&mut self, viewport: &Viewport) {
        let center = viewport.center();
        let half = viewport.size().multiply(0.5);
        let min = Point::new(
            center.x - half.x - PRUNE_BUFFER_PX,
            center.y - half.y - PRUNE_BUFFER_PX,
        );
        let max = Point::new(
            center.x + half.x + PRUNE_BUFFER_PX,
            center.y + half.y + PRUNE_BUFFER_PX,
        );
        self.entries.retain(|_, entry| entry.intersects(min, max));
    }

    /// Load-then-prune; the single call sites make after any viewport
    /// mutation.
    pub fn update_visible(&mut self, viewport: &Viewport) -> usize {
        let requested = self.load_visible(viewport);
        self.prune(viewport);
        requested
    }

    /// Drops every entry and bumps the zoom epoch. Tile keys are
    /// meaningless across zoom levels, and in-flight loads for the old
    /// epoch are cancelled-by-ignoring when they resolve.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
        self.epoch += 1;
    }

    /// Materializes one completed fetch, or discards it if it went
    /// stale while in flight.
    pub fn apply_result(&mut self, result: FetchResult) -> ApplyOutcome {
        if result.epoch != self.epoch {
            log::debug!(
                "dropping stale tile {:?} (epoch {} != {})",
                result.coord,
                result.epoch,
                self.epoch
            );
            return ApplyOutcome::Stale;
        }
        if !self.entries.contains_key(&result.coord) {
            // pruned while in flight
            return ApplyOutcome::Stale;
        }
        match result.data {
            Ok(bytes) => {
                if let Some(entry) = self.entries.get_mut(&result.coord) {
                    entry.state = TileState::Ready(Arc::new(bytes));
                }
                ApplyOutcome::Inserted
            }
            Err(err) => {
                log::warn!("tile {:?} failed to load: {}", result.coord, err);
                self.entries.remove(&result.coord);
                ApplyOutcome::Failed
            }
        }
    }

    /// Drains the loader and applies every completion.
    pub fn pump(&mut self) -> Vec<ApplyOutcome> {
        self.loader
            .drain()
            .into_iter()
            .map(|result| self.apply_result(result))
            .collect()
    }
}
