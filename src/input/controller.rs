use crate::core::constants::{KEYBOARD_PAN_STEP, PINCH_ZOOM_RATE};
use crate::core::geo::Point;
use crate::core::viewport::Viewport;
use crate::input::events::{InputEvent, KeyCode, PointerButton, PointerId};

/// What the host should do in response to an input event. The
/// controller owns the state machine; the map applies the mutations so
/// wrap/clamp, cache refresh, and event emission stay in one place.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Move the center by a world-pixel offset. `commit` asks the host
    /// to emit a `move` event immediately (keyboard pans do; drag moves
    /// wait for the release).
    Pan { offset: Point, commit: bool },
    /// The drag ended: release the capture and emit `move`
    EndDrag,
    /// Zoom to `target`, keeping the world point under `focus` fixed
    ZoomTo { target: u8, focus: Point },
    /// Escape: hand control back to the non-interactive presentation
    Deactivate,
}

/// Drag phase of the interaction state machine
#[derive(Debug, Clone, PartialEq)]
enum DragState {
    Idle,
    Dragging {
        /// The captured pointer; events from any other pointer are
        /// ignored until this one releases
        pointer: PointerId,
        /// Screen position and world center snapshotted at press time
        press_screen: Point,
        press_center: Point,
        /// Screen position at the previous move event
        last_screen: Point,
    },
}

/// Translates raw pointer/wheel/keyboard input into actions. Two
/// states, Idle and Dragging; dragging is exclusive to one captured
/// pointer. Wheel zoom keeps two distinct paths: a discrete one-notch
/// step, and a continuous accumulator for pinch gestures proxied
/// through wheel events.
pub struct InteractionController {
    state: DragState,
    /// Fractional zoom accumulated by pinch events; `None` until the
    /// first pinch (or until re-seeded by a discrete zoom)
    zoom_accum: Option<f64>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
            zoom_accum: None,
        }
    }

    /// The pointer currently holding the drag, if any. The host should
    /// mirror this with platform pointer capture so move/release events
    /// keep routing here when the pointer leaves the viewport bounds.
    pub fn captured_pointer(&self) -> Option<PointerId> {
        match self.state {
            DragState::Dragging { pointer, .. } => Some(pointer),
            DragState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Screen position and world center snapshotted when the current
    /// drag was pressed, if one is active. Hosts use this to tell a
    /// click from a drag at release time.
    pub fn drag_origin(&self) -> Option<(Point, Point)> {
        match self.state {
            DragState::Dragging {
                press_screen,
                press_center,
                ..
            } => Some((press_screen, press_center)),
            DragState::Idle => None,
        }
    }

    /// Teardown: back to Idle, capture dropped, accumulator cleared.
    pub fn reset(&mut self) {
        self.state = DragState::Idle;
        self.zoom_accum = None;
    }

    /// Feeds one event through the state machine.
    pub fn handle_event(&mut self, event: &InputEvent, viewport: &Viewport) -> Vec<Action> {
        match *event {
            InputEvent::PointerPress {
                pointer,
                button,
                position,
            } => {
                if button != PointerButton::Primary {
                    return Vec::new();
                }
                match self.state {
                    // a second simultaneous press is ignored; the first
                    // pointer keeps the capture until it releases
                    DragState::Dragging { .. } => Vec::new(),
                    DragState::Idle => {
                        self.state = DragState::Dragging {
                            pointer,
                            press_screen: position,
                            press_center: viewport.center(),
                            last_screen: position,
                        };
                        Vec::new()
                    }
                }
            }
            InputEvent::PointerMove { pointer, position } => match self.state {
                DragState::Dragging {
                    pointer: captured,
                    ref mut last_screen,
                    ..
                } if captured == pointer => {
                    let delta = position.subtract(last_screen);
                    *last_screen = position;
                    // the world moves against the pointer
                    vec![Action::Pan {
                        offset: delta.multiply(-1.0),
                        commit: false,
                    }]
                }
                _ => Vec::new(),
            },
            InputEvent::PointerRelease { pointer, .. } => match self.state {
                DragState::Dragging {
                    pointer: captured, ..
                } if captured == pointer => {
                    self.state = DragState::Idle;
                    vec![Action::EndDrag]
                }
                _ => Vec::new(),
            },
            InputEvent::Wheel {
                delta_y,
                pinch,
                position,
            } => self.handle_wheel(delta_y, pinch, position, viewport),
            InputEvent::KeyPress { key } => self.handle_key(key, viewport),
            // size changes are the host's business
            InputEvent::Resize { .. } => Vec::new(),
        }
    }

    fn handle_wheel(
        &mut self,
        delta_y: f64,
        pinch: bool,
        position: Point,
        viewport: &Viewport,
    ) -> Vec<Action> {
        if delta_y == 0.0 {
            return Vec::new();
        }
        let current = viewport.zoom();
        let (min, max) = (viewport.min_zoom(), viewport.max_zoom());

        let target = if pinch {
            // continuous path: accumulate the empirically tuned factor,
            // bounded so a long gesture can't run far past the limits
            let accum = self.zoom_accum.get_or_insert(current as f64);
            *accum = (*accum - delta_y * PINCH_ZOOM_RATE).clamp(min as f64, max as f64);
            accum.round() as u8
        } else {
            // discrete path: one level per notch
            let stepped = if delta_y < 0.0 {
                current.saturating_add(1)
            } else {
                current.saturating_sub(1)
            };
            let target = stepped.clamp(min, max);
            self.zoom_accum = Some(target as f64);
            target
        };

        if target == current {
            return Vec::new();
        }
        vec![Action::ZoomTo {
            target,
            focus: position,
        }]
    }

    fn handle_key(&mut self, key: KeyCode, viewport: &Viewport) -> Vec<Action> {
        let pan = |x: f64, y: f64| {
            vec![Action::Pan {
                offset: Point::new(x, y),
                commit: true,
            }]
        };
        match key {
            KeyCode::ArrowLeft => pan(-KEYBOARD_PAN_STEP, 0.0),
            KeyCode::ArrowRight => pan(KEYBOARD_PAN_STEP, 0.0),
            KeyCode::ArrowUp => pan(0.0, -KEYBOARD_PAN_STEP),
            KeyCode::ArrowDown => pan(0.0, KEYBOARD_PAN_STEP),
            KeyCode::Plus | KeyCode::Minus => {
                let current = viewport.zoom();
                let stepped = if key == KeyCode::Plus {
                    current.saturating_add(1)
                } else {
                    current.saturating_sub(1)
                };
                let target = stepped.clamp(viewport.min_zoom(), viewport.max_zoom());
                if target == current {
                    return Vec::new();
                }
                self.zoom_accum = Some(target as f64);
                // keyboard zoom anchors at the viewport center
                let size = viewport.size();
                vec![Action::ZoomTo {
                    target,
                    focus: Point::new(size.x / 2.0, size.y / 2.0),
                }]
            }
            KeyCode::Escape => {
                self.reset();
                vec![Action::Deactivate]
            }
            KeyCode::Other(_) => Vec::new(),
        }
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;

    fn viewport() -> Viewport {
        Viewport::new(
            LatLng::new(40.7484, -73.9857),
            15,
            Point::new(800.0, 600.0),
        )
    }

    fn press(pointer: PointerId, x: f64, y: f64) -> InputEvent {
        InputEvent::PointerPress {
            pointer,
            button: PointerButton::Primary,
            position: Point::new(x, y),
        }
    }

    fn move_to(pointer: PointerId, x: f64, y: f64) -> InputEvent {
        InputEvent::PointerMove {
            pointer,
            position: Point::new(x, y),
        }
    }

    fn release(pointer: PointerId, x: f64, y: f64) -> InputEvent {
        InputEvent::PointerRelease {
            pointer,
            position: Point::new(x, y),
        }
    }

    #[test]
    fn test_drag_lifecycle() {
        let mut controller = InteractionController::new();
        let viewport = viewport();

        assert!(controller.handle_event(&press(1, 100.0, 100.0), &viewport).is_empty());
        assert_eq!(controller.captured_pointer(), Some(1));
        assert_eq!(
            controller.drag_origin(),
            Some((Point::new(100.0, 100.0), viewport.center()))
        );

        let actions = controller.handle_event(&move_to(1, 110.0, 95.0), &viewport);
        assert_eq!(
            actions,
            vec![Action::Pan {
                offset: Point::new(-10.0, 5.0),
                commit: false,
            }]
        );

        // deltas are relative to the previous move, not the press
        let actions = controller.handle_event(&move_to(1, 115.0, 95.0), &viewport);
        assert_eq!(
            actions,
            vec![Action::Pan {
                offset: Point::new(-5.0, 0.0),
                commit: false,
            }]
        );

        let actions = controller.handle_event(&release(1, 115.0, 95.0), &viewport);
        assert_eq!(actions, vec![Action::EndDrag]);
        assert!(!controller.is_dragging());
    }

    #[test]
    fn test_second_press_is_ignored() {
        let mut controller = InteractionController::new();
        let viewport = viewport();

        controller.handle_event(&press(1, 100.0, 100.0), &viewport);
        controller.handle_event(&press(2, 300.0, 300.0), &viewport);
        assert_eq!(controller.captured_pointer(), Some(1));

        // moves and releases from the second pointer do nothing
        assert!(controller.handle_event(&move_to(2, 320.0, 310.0), &viewport).is_empty());
        assert!(controller.handle_event(&release(2, 320.0, 310.0), &viewport).is_empty());
        assert!(controller.is_dragging());

        assert_eq!(
            controller.handle_event(&release(1, 100.0, 100.0), &viewport),
            vec![Action::EndDrag]
        );
    }

    #[test]
    fn test_secondary_button_does_not_drag() {
        let mut controller = InteractionController::new();
        let viewport = viewport();
        let event = InputEvent::PointerPress {
            pointer: 1,
            button: PointerButton::Secondary,
            position: Point::new(10.0, 10.0),
        };
        controller.handle_event(&event, &viewport);
        assert!(!controller.is_dragging());
    }

    #[test]
    fn test_notch_wheel_steps_one_level() {
        let mut controller = InteractionController::new();
        let viewport = viewport();

        let zoom_in = InputEvent::Wheel {
            delta_y: -3.0,
            pinch: false,
            position: Point::new(200.0, 150.0),
        };
        assert_eq!(
            controller.handle_event(&zoom_in, &viewport),
            vec![Action::ZoomTo {
                target: 16,
                focus: Point::new(200.0, 150.0),
            }]
        );

        let zoom_out = InputEvent::Wheel {
            delta_y: 3.0,
            pinch: false,
            position: Point::new(200.0, 150.0),
        };
        assert_eq!(
            controller.handle_event(&zoom_out, &viewport),
            vec![Action::ZoomTo {
                target: 14,
                focus: Point::new(200.0, 150.0),
            }]
        );
    }

    #[test]
    fn test_pinch_accumulates_before_stepping() {
        let mut controller = InteractionController::new();
        let mut viewport = viewport();
        let pinch = |dy: f64| InputEvent::Wheel {
            delta_y: dy,
            pinch: true,
            position: Point::new(400.0, 300.0),
        };

        // -40 accumulates 0.4 of a level: not enough to cross
        assert!(controller.handle_event(&pinch(-40.0), &viewport).is_empty());

        // another -40 reaches 15.8, which rounds to 16
        let actions = controller.handle_event(&pinch(-40.0), &viewport);
        assert_eq!(actions.len(), 1);
        match actions[0] {
            Action::ZoomTo { target, focus } => {
                assert_eq!(target, 16);
                viewport.zoom_at(target, focus);
            }
            _ => panic!("expected a zoom"),
        }

        // drifting on keeps the accumulator continuous
        assert!(controller.handle_event(&pinch(-10.0), &viewport).is_empty());
    }

    #[test]
    fn test_pinch_accumulator_clamps_at_limits() {
        let mut controller = InteractionController::new();
        let mut viewport = viewport();
        viewport.set_zoom_limits(15, 16);
        let pinch = |dy: f64| InputEvent::Wheel {
            delta_y: dy,
            pinch: true,
            position: Point::new(400.0, 300.0),
        };

        // a huge gesture cannot run past max_zoom
        let actions = controller.handle_event(&pinch(-1000.0), &viewport);
        assert_eq!(actions.len(), 1);
        match actions[0] {
            Action::ZoomTo { target, focus } => {
                assert_eq!(target, 16);
                viewport.zoom_at(target, focus);
            }
            _ => panic!("expected a zoom"),
        }

        // one gentle reverse tick is enough to start coming back
        let actions = controller.handle_event(&pinch(60.0), &viewport);
        assert_eq!(
            actions,
            vec![Action::ZoomTo {
                target: 15,
                focus: Point::new(400.0, 300.0),
            }]
        );
    }

    #[test]
    fn test_arrow_keys_pan_fixed_step() {
        let mut controller = InteractionController::new();
        let viewport = viewport();
        let cases = [
            (KeyCode::ArrowLeft, Point::new(-80.0, 0.0)),
            (KeyCode::ArrowRight, Point::new(80.0, 0.0)),
            (KeyCode::ArrowUp, Point::new(0.0, -80.0)),
            (KeyCode::ArrowDown, Point::new(0.0, 80.0)),
        ];
        for (key, offset) in cases {
            assert_eq!(
                controller.handle_event(&InputEvent::KeyPress { key }, &viewport),
                vec![Action::Pan {
                    offset,
                    commit: true,
                }]
            );
        }
    }

    #[test]
    fn test_plus_minus_zoom_at_center() {
        let mut controller = InteractionController::new();
        let viewport = viewport();
        assert_eq!(
            controller.handle_event(&InputEvent::KeyPress { key: KeyCode::Plus }, &viewport),
            vec![Action::ZoomTo {
                target: 16,
                focus: Point::new(400.0, 300.0),
            }]
        );
        assert_eq!(
            controller.handle_event(
                &InputEvent::KeyPress {
                    key: KeyCode::Minus
                },
                &viewport
            ),
            vec![Action::ZoomTo {
                target: 14,
                focus: Point::new(400.0, 300.0),
            }]
        );
    }

    #[test]
    fn test_zoom_at_limit_is_noop() {
        let mut controller = InteractionController::new();
        let mut viewport = viewport();
        viewport.set_zoom_limits(15, 15);
        assert!(controller
            .handle_event(&InputEvent::KeyPress { key: KeyCode::Plus }, &viewport)
            .is_empty());
        assert!(controller
            .handle_event(
                &InputEvent::Wheel {
                    delta_y: -3.0,
                    pinch: false,
                    position: Point::new(0.0, 0.0),
                },
                &viewport
            )
            .is_empty());
    }

    #[test]
    fn test_escape_deactivates_and_resets() {
        let mut controller = InteractionController::new();
        let viewport = viewport();
        controller.handle_event(&press(1, 100.0, 100.0), &viewport);
        let actions = controller.handle_event(
            &InputEvent::KeyPress {
                key: KeyCode::Escape,
            },
            &viewport,
        );
        assert_eq!(actions, vec![Action::Deactivate]);
        assert!(!controller.is_dragging());
        assert_eq!(controller.captured_pointer(), None);
    }
}
