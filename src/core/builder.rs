//! Map builder for fluent API configuration

use crate::core::geo::Point;
use crate::core::map::{Map, MapOptions};
use crate::render::RenderSink;
use crate::tiles::loader::TileFetcher;
use crate::tiles::source::TileProvider;
use crate::Result;
use std::sync::Arc;

/// Builder for creating and configuring [`Map`] instances.
pub struct MapBuilder {
    options: MapOptions,
    fetcher: Option<Arc<dyn TileFetcher>>,
    sink: Option<Box<dyn RenderSink>>,
}

impl MapBuilder {
    pub fn new() -> Self {
        Self {
            options: MapOptions::default(),
            fetcher: None,
            sink: None,
        }
    }

    /// Initial center. Required; NaN coordinates fail `build`.
    pub fn center(mut self, lat: f64, lng: f64) -> Self {
        self.options.lat = lat;
        self.options.lng = lng;
        self
    }

    /// Initial zoom. Out-of-range values fall back to the default.
    pub fn zoom(mut self, zoom: u8) -> Self {
        self.options.zoom = zoom;
        self
    }

    pub fn provider(mut self, provider: TileProvider) -> Self {
        self.options.provider = provider;
        self
    }

    /// Viewport size from the hosting container's measured pixels
    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.options.size = Point::new(width, height);
        self
    }

    pub fn show_marker(mut self, show: bool) -> Self {
        self.options.show_marker = show;
        self
    }

    pub fn zoom_limits(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.options.min_zoom = min_zoom;
        self.options.max_zoom = max_zoom;
        self
    }

    /// Substitute the tile fetcher (deterministic sources, tests)
    pub fn fetcher(mut self, fetcher: Arc<dyn TileFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Attach the presentation layer at construction time
    pub fn render_sink(mut self, sink: Box<dyn RenderSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<Map> {
        let mut map = match self.fetcher {
            Some(fetcher) => Map::with_fetcher(self.options, fetcher)?,
            None => Map::new(self.options)?,
        };
        if let Some(sink) = self.sink {
            map.set_render_sink(sink);
        }
        Ok(map)
    }
}

impl Default for MapBuilder {
    fn default() -> Self {
        Self::new()
    }
}
