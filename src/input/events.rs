use crate::core::geo::Point;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Host-assigned identifier of one pointing device / touch contact
pub type PointerId = u64;

/// Pointer button types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Secondary,
    Auxiliary,
}

/// Keyboard key codes the engine reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Plus,
    Minus,
    Escape,
    Other(u32),
}

/// Raw input events fed to the interaction controller. Positions are
/// viewport-local pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerPress {
        pointer: PointerId,
        button: PointerButton,
        position: Point,
    },
    PointerMove {
        pointer: PointerId,
        position: Point,
    },
    PointerRelease {
        pointer: PointerId,
        position: Point,
    },
    /// Scroll wheel. `pinch` is set when the host reports the event as
    /// a proxied trackpad pinch gesture rather than a discrete notch.
    Wheel {
        delta_y: f64,
        pinch: bool,
        position: Point,
    },
    KeyPress {
        key: KeyCode,
    },
    /// The hosting container was measured to a new size
    Resize {
        size: Point,
    },
}

impl InputEvent {
    /// Gets the position associated with this event, if any
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::PointerPress { position, .. } => Some(*position),
            InputEvent::PointerMove { position, .. } => Some(*position),
            InputEvent::PointerRelease { position, .. } => Some(*position),
            InputEvent::Wheel { position, .. } => Some(*position),
            _ => None,
        }
    }

    pub fn is_pointer_event(&self) -> bool {
        matches!(
            self,
            InputEvent::PointerPress { .. }
                | InputEvent::PointerMove { .. }
                | InputEvent::PointerRelease { .. }
                | InputEvent::Wheel { .. }
        )
    }

    pub fn is_keyboard_event(&self) -> bool {
        matches!(self, InputEvent::KeyPress { .. })
    }
}

/// Events the map emits to its host. Coordinates are rounded to six
/// decimal digits before emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum MapEvent {
    /// The initial non-interactive tile set finished loading
    Ready { lat: f64, lng: f64, zoom: u8 },
    /// Fatal input or every tile of the one-shot grid failed
    Error { message: String },
    /// The center changed after a pan or zoom
    #[serde(rename = "move")]
    Moved { lat: f64, lng: f64, zoom: u8 },
    /// Escape was pressed while interactive; the host decides what
    /// non-interactive presentation to return to
    Deactivate,
}

impl MapEvent {
    /// Listener-registry name of this event kind
    pub fn name(&self) -> &'static str {
        match self {
            MapEvent::Ready { .. } => "ready",
            MapEvent::Error { .. } => "error",
            MapEvent::Moved { .. } => "move",
            MapEvent::Deactivate => "deactivate",
        }
    }

    /// JSON payload for host consumers
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
