//! # tilekit
//!
//! An interactive slippy-tile map engine: pure Web-Mercator coordinate
//! math, a world-pixel viewport with wrap/clamp invariants, a
//! viewport-driven tile cache fed by unordered asynchronous fetches,
//! and a pan/zoom interaction state machine.
//!
//! The engine never owns pixels. Painting, marker icons, styling, and
//! markup belong to the presentation layer behind the [`RenderSink`]
//! contract; the engine hands it geometry and tells it when to repaint.

pub mod core;
pub mod input;
pub mod render;
pub mod tiles;

pub mod prelude;

pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    builder::MapBuilder,
    geo::{LatLng, Point, TileCoord},
    map::{Map, MapMode, MapOptions},
    viewport::{MarkerAnchor, Viewport},
};

pub use crate::input::{
    controller::InteractionController,
    events::{InputEvent, MapEvent},
};

pub use crate::render::RenderSink;

pub use crate::tiles::{
    cache::{TileCache, TileEntry},
    loader::{TileFetcher, TileLoader},
    source::{TileProvider, TileSource},
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("all {requested} tiles of the initial grid failed to load")]
    AllTilesFailed { requested: usize },
}

/// Error type alias for convenience
pub type Error = MapError;
