use crate::core::constants::{COORD_EMIT_DECIMALS, DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM};
use crate::core::geo::{LatLng, Point};
use crate::core::viewport::{MarkerAnchor, Viewport};
use crate::input::controller::{Action, InteractionController};
use crate::input::events::{InputEvent, MapEvent, PointerId};
use crate::render::RenderSink;
use crate::tiles::cache::{ApplyOutcome, TileCache};
use crate::tiles::loader::{TileFetcher, TileLoader};
use crate::tiles::source::TileProvider;
use crate::{MapError, Result};
use std::collections::VecDeque;
use std::sync::Arc;

/// Construction inputs supplied by the host. `lat`/`lng` are required
/// and must be finite; an out-of-range zoom silently falls back to the
/// default; `size` is the hosting container's measured size in pixels.
#[derive(Debug, Clone)]
pub struct MapOptions {
    pub lat: f64,
    pub lng: f64,
    pub zoom: u8,
    pub provider: TileProvider,
    pub show_marker: bool,
    pub size: Point,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            lat: 0.0,
            lng: 0.0,
            zoom: DEFAULT_ZOOM,
            provider: TileProvider::Osm,
            show_marker: false,
            size: Point::new(800.0, 600.0),
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

/// Presentation mode of the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMode {
    /// One-shot 3x3 grid, no interaction
    Static,
    /// Pan/zoom session driven by the interaction controller
    Interactive,
}

/// Event listener callback type
pub type EventCallback = Box<dyn Fn(&MapEvent) + Send + Sync>;

/// Listener registry with queued dispatch: emissions queue up during a
/// mutation and are delivered in order once the mutation settles.
#[derive(Default)]
pub struct EventManager {
    listeners: Vec<(String, EventCallback)>,
    queue: VecDeque<MapEvent>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one event kind
    /// (`"ready" | "error" | "move" | "deactivate"`).
    pub fn on<F>(&mut self, event_type: &str, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.listeners.push((event_type.to_string(), Box::new(callback)));
    }

    pub fn emit(&mut self, event: MapEvent) {
        self.queue.push_back(event);
    }

    /// Delivers every queued event and returns them
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        let events: Vec<_> = self.queue.drain(..).collect();
        for event in &events {
            for (kind, callback) in &self.listeners {
                if kind == event.name() {
                    callback(event);
                }
            }
        }
        events
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }
}

/// Progress of the one-shot grid load
struct InitialLoad {
    outstanding: usize,
    failed: usize,
    total: usize,
}

/// The host-facing widget: composes the viewport, the tile cache, and
/// the interaction controller, and talks to the presentation layer
/// through [`RenderSink`]. All mutation happens synchronously inside
/// `handle_input`/`pump` calls on the host's thread.
pub struct Map {
    viewport: Viewport,
    cache: TileCache,
    controller: InteractionController,
    events: EventManager,
    marker: Option<MarkerAnchor>,
    mode: MapMode,
    initial: Option<InitialLoad>,
    sink: Option<Box<dyn RenderSink>>,
}

impl Map {
    /// Creates a map over the default HTTP fetcher.
    pub fn new(options: MapOptions) -> Result<Self> {
        Self::build(options, TileLoader::with_http())
    }

    /// Creates a map with a custom fetcher (deterministic sources,
    /// tests, offline hosts).
    pub fn with_fetcher(options: MapOptions, fetcher: Arc<dyn TileFetcher>) -> Result<Self> {
        Self::build(options, TileLoader::new(fetcher))
    }

    fn build(options: MapOptions, loader: TileLoader) -> Result<Self> {
        let center = LatLng::new(options.lat, options.lng);
        if !center.is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "lat={}, lng={}",
                options.lat, options.lng
            ))
            .into());
        }

        let zoom = if (options.min_zoom..=options.max_zoom).contains(&options.zoom) {
            options.zoom
        } else {
            DEFAULT_ZOOM.clamp(options.min_zoom, options.max_zoom)
        };

        let mut viewport = Viewport::new(center, zoom, options.size);
        viewport.set_zoom_limits(options.min_zoom, options.max_zoom);

        let marker = options
            .show_marker
            .then(|| MarkerAnchor::from_lat_lng(center, viewport.zoom()));

        Ok(Self {
            viewport,
            cache: TileCache::new(Box::new(options.provider), loader),
            controller: InteractionController::new(),
            events: EventManager::new(),
            marker,
            mode: MapMode::Static,
            initial: None,
            sink: None,
        })
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn mode(&self) -> MapMode {
        self.mode
    }

    pub fn marker(&self) -> Option<&MarkerAnchor> {
        self.marker.as_ref()
    }

    /// The pointer currently holding a drag, which the host should
    /// mirror with platform pointer capture.
    pub fn captured_pointer(&self) -> Option<PointerId> {
        self.controller.captured_pointer()
    }

    /// Register a listener for `"ready"`, `"error"`, `"move"`, or
    /// `"deactivate"`.
    pub fn on<F>(&mut self, event_type: &str, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.events.on(event_type, callback);
    }

    /// Attach the presentation layer.
    pub fn set_render_sink(&mut self, sink: Box<dyn RenderSink>) {
        self.sink = Some(sink);
        self.paint();
    }

    /// Requests the one-shot 3x3 grid around the center. Must be called
    /// from within a tokio runtime. Completion is observed via `pump`:
    /// `ready` once the set settles, `error` if every tile failed.
    pub fn load_initial_grid(&mut self) {
        let total = self.cache.load_static_grid(&self.viewport);
        self.initial = Some(InitialLoad {
            outstanding: total,
            failed: 0,
            total,
        });
    }

    /// Switches to the interactive pan/zoom session, filling the
    /// buffered viewport beyond the static grid.
    pub fn activate(&mut self) {
        if self.mode == MapMode::Interactive {
            return;
        }
        self.mode = MapMode::Interactive;
        self.cache.update_visible(&self.viewport);
        self.paint();
    }

    /// Tears the interactive session down: the capture is released, the
    /// controller returns to Idle, and the marker keeps its
    /// world-derived position for the non-interactive presentation.
    pub fn deactivate(&mut self) {
        if self.mode == MapMode::Static {
            return;
        }
        self.mode = MapMode::Static;
        self.controller.reset();
        self.events.emit(MapEvent::Deactivate);
        self.events.process_events();
    }

    /// Feeds one raw input event through the controller and applies the
    /// resulting actions. Ignored while non-interactive, except for
    /// container resizes which always apply.
    pub fn handle_input(&mut self, event: InputEvent) {
        if let InputEvent::Resize { size } = event {
            self.viewport.set_size(size);
            if self.mode == MapMode::Interactive {
                self.cache.update_visible(&self.viewport);
            }
            self.paint();
            return;
        }
        if self.mode != MapMode::Interactive {
            return;
        }

        let actions = self.controller.handle_event(&event, &self.viewport);
        for action in actions {
            self.apply_action(action);
        }
        self.events.process_events();
    }

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::Pan { offset, commit } => {
                self.viewport.pan_by(offset);
                self.cache.update_visible(&self.viewport);
                self.paint();
                if commit {
                    self.emit_moved();
                }
            }
            Action::EndDrag => {
                self.emit_moved();
            }
            Action::ZoomTo { target, focus } => {
                let scale = self.viewport.zoom_at(target, focus);
                if scale == 1.0 {
                    return;
                }
                if let Some(marker) = &mut self.marker {
                    marker.rescale(scale);
                }
                // keys are zoom-specific: everything cached is now
                // meaningless, and in-flight loads go stale
                self.cache.invalidate_all();
                self.initial = None;
                self.cache.update_visible(&self.viewport);
                self.paint();
                self.emit_moved();
            }
            Action::Deactivate => {
                self.deactivate();
            }
        }
    }

    /// Drains completed tile fetches into the cache, settles the
    /// one-shot grid policy, and repaints when anything materialized.
    /// Hosts call this once per event-loop turn (or timer tick).
    pub fn pump(&mut self) {
        let outcomes = self.cache.pump();
        if outcomes.is_empty() {
            return;
        }

        let mut materialized = false;
        for outcome in &outcomes {
            match outcome {
                ApplyOutcome::Inserted => {
                    materialized = true;
                    if let Some(initial) = &mut self.initial {
                        initial.outstanding = initial.outstanding.saturating_sub(1);
                    }
                }
                ApplyOutcome::Failed => {
                    if let Some(initial) = &mut self.initial {
                        initial.outstanding = initial.outstanding.saturating_sub(1);
                        initial.failed += 1;
                    }
                }
                ApplyOutcome::Stale => {}
            }
        }

        if let Some(initial) = &self.initial {
            if initial.outstanding == 0 {
                let all_failed = initial.failed == initial.total;
                let total = initial.total;
                self.initial = None;
                if all_failed {
                    self.events.emit(MapEvent::Error {
                        message: MapError::AllTilesFailed { requested: total }.to_string(),
                    });
                } else {
                    let center = self.rounded_center();
                    self.events.emit(MapEvent::Ready {
                        lat: center.lat,
                        lng: center.lng,
                        zoom: self.viewport.zoom(),
                    });
                }
            }
        }

        if materialized {
            self.paint();
        }
        self.events.process_events();
    }

    fn rounded_center(&self) -> LatLng {
        self.viewport.center_lat_lng().rounded(COORD_EMIT_DECIMALS)
    }

    fn emit_moved(&mut self) {
        let center = self.rounded_center();
        self.events.emit(MapEvent::Moved {
            lat: center.lat,
            lng: center.lng,
            zoom: self.viewport.zoom(),
        });
    }

    fn paint(&mut self) {
        if let Some(sink) = &mut self.sink {
            let tiles = self.cache.ready_entries();
            sink.paint_tiles(&self.viewport, &tiles);
            if let Some(marker) = &self.marker {
                sink.place_marker(marker.screen_position(&self.viewport));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::events::{KeyCode, PointerButton};
    use crate::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct OkFetcher;

    #[async_trait]
    impl TileFetcher for OkFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(vec![0u8; 8])
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl TileFetcher for FailingFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            Err("HTTP 503 for tile".into())
        }
    }

    fn nyc_options() -> MapOptions {
        MapOptions {
            lat: 40.7484,
            lng: -73.9857,
            zoom: 15,
            ..MapOptions::default()
        }
    }

    fn collected(map: &mut Map, kind: &str) -> Arc<Mutex<Vec<MapEvent>>> {
        let sink = Arc::new(Mutex::new(Vec::new()));
        let clone = Arc::clone(&sink);
        map.on(kind, move |event| clone.lock().unwrap().push(event.clone()));
        sink
    }

    async fn settle(map: &mut Map) {
        for _ in 0..100 {
            map.pump();
            if map.cache().entries().all(|e| e.is_ready()) && !map.cache().is_empty() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
    }

    #[test]
    fn test_nan_coordinates_are_fatal() {
        let options = MapOptions {
            lat: f64::NAN,
            ..nyc_options()
        };
        assert!(Map::with_fetcher(options, Arc::new(OkFetcher)).is_err());
    }

    #[test]
    fn test_invalid_zoom_falls_back_to_default() {
        let options = MapOptions {
            zoom: 42,
            ..nyc_options()
        };
        let map = Map::with_fetcher(options, Arc::new(OkFetcher)).unwrap();
        assert_eq!(map.viewport().zoom(), DEFAULT_ZOOM);
    }

    #[tokio::test]
    async fn test_ready_after_initial_grid() {
        let mut map = Map::with_fetcher(nyc_options(), Arc::new(OkFetcher)).unwrap();
        let ready = collected(&mut map, "ready");

        map.load_initial_grid();
        settle(&mut map).await;

        let events = ready.lock().unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            MapEvent::Ready { lat, lng, zoom } => {
                assert!((lat - 40.7484).abs() < 1e-4);
                assert!((lng + 73.9857).abs() < 1e-4);
                assert_eq!(*zoom, 15);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_all_tiles_failing_escalates() {
        let mut map = Map::with_fetcher(nyc_options(), Arc::new(FailingFetcher)).unwrap();
        let errors = collected(&mut map, "error");
        let ready = collected(&mut map, "ready");

        map.load_initial_grid();
        for _ in 0..100 {
            map.pump();
            if !errors.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        assert_eq!(errors.lock().unwrap().len(), 1);
        assert!(ready.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drag_emits_move_on_release() {
        let mut map = Map::with_fetcher(nyc_options(), Arc::new(OkFetcher)).unwrap();
        let moves = collected(&mut map, "move");
        map.activate();

        map.handle_input(InputEvent::PointerPress {
            pointer: 1,
            button: PointerButton::Primary,
            position: Point::new(400.0, 300.0),
        });
        map.handle_input(InputEvent::PointerMove {
            pointer: 1,
            position: Point::new(360.0, 290.0),
        });
        assert!(moves.lock().unwrap().is_empty());

        map.handle_input(InputEvent::PointerRelease {
            pointer: 1,
            position: Point::new(360.0, 290.0),
        });

        let events = moves.lock().unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            MapEvent::Moved { lat, lng, zoom } => {
                // content dragged 40px west and 10px north: the view
                // center moved east and south
                assert!(*lng > -73.9857);
                assert!(*lat < 40.7484);
                assert_eq!(*zoom, 15);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_keyboard_pan_commits_each_press() {
        let mut map = Map::with_fetcher(nyc_options(), Arc::new(OkFetcher)).unwrap();
        let moves = collected(&mut map, "move");
        map.activate();

        let start = map.viewport().center();
        for _ in 0..3 {
            map.handle_input(InputEvent::KeyPress {
                key: KeyCode::ArrowRight,
            });
        }
        assert_eq!(moves.lock().unwrap().len(), 3);
        assert!((map.viewport().center().x - start.x - 240.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_zoom_invalidates_and_rescales_marker() {
        let options = MapOptions {
            show_marker: true,
            ..nyc_options()
        };
        let mut map = Map::with_fetcher(options, Arc::new(OkFetcher)).unwrap();
        map.activate();
        settle(&mut map).await;

        let marker_before = map.marker().unwrap().world();
        let epoch_before = map.cache().epoch();

        map.handle_input(InputEvent::KeyPress { key: KeyCode::Plus });

        assert_eq!(map.viewport().zoom(), 16);
        assert_eq!(map.cache().epoch(), epoch_before + 1);
        let marker_after = map.marker().unwrap().world();
        assert!((marker_after.x - marker_before.x * 2.0).abs() < 1e-9);
        assert!((marker_after.y - marker_before.y * 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_escape_deactivates() {
        let mut map = Map::with_fetcher(nyc_options(), Arc::new(OkFetcher)).unwrap();
        let deactivations = collected(&mut map, "deactivate");
        map.activate();

        map.handle_input(InputEvent::KeyPress {
            key: KeyCode::Escape,
        });
        assert_eq!(map.mode(), MapMode::Static);
        assert_eq!(deactivations.lock().unwrap().len(), 1);

        // input is inert until the next activation
        map.handle_input(InputEvent::KeyPress {
            key: KeyCode::ArrowLeft,
        });
        assert_eq!(deactivations.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_results_never_complete_the_grid() {
        let mut map = Map::with_fetcher(nyc_options(), Arc::new(OkFetcher)).unwrap();
        let ready = collected(&mut map, "ready");
        map.load_initial_grid();
        map.activate();

        // zooming before the grid settles abandons the one-shot policy
        map.handle_input(InputEvent::KeyPress { key: KeyCode::Plus });
        settle(&mut map).await;

        assert!(ready.lock().unwrap().is_empty());
        // every surviving entry belongs to the new zoom
        assert!(map.cache().entries().all(|e| e.coord.z == 16));
    }

    #[test]
    fn test_event_manager_dispatch_order() {
        let mut events = EventManager::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        events.on("move", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        events.emit(MapEvent::Moved {
            lat: 0.0,
            lng: 0.0,
            zoom: 15,
        });
        events.emit(MapEvent::Deactivate);
        assert_eq!(events.pending_events(), 2);
        let delivered = events.process_events();
        assert_eq!(delivered.len(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(events.pending_events(), 0);
    }
}
