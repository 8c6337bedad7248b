//! Prelude module for common tilekit types and traits
//!
//! Re-exports the most commonly used types, traits, and functions for
//! easy importing with `use tilekit::prelude::*;`

pub use crate::core::{
    builder::MapBuilder,
    constants::{DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM, TILE_SIZE},
    geo::{world_size, LatLng, Point, TileCoord, TilePixel},
    map::{EventManager, Map, MapMode, MapOptions},
    viewport::{MarkerAnchor, Viewport},
};

pub use crate::input::{
    controller::{Action, InteractionController},
    events::{InputEvent, KeyCode, MapEvent, PointerButton, PointerId},
};

pub use crate::render::RenderSink;

pub use crate::tiles::{
    cache::{ApplyOutcome, TileCache, TileEntry, TileState},
    loader::{FetchResult, HttpFetcher, TileFetcher, TileLoader},
    source::{TileProvider, TileSource},
};

pub use crate::{Error as MapError, Result};

pub use std::sync::Arc;

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
