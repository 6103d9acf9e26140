//! Pointer gesture detection.
//!
//! Each element runs one explicit state machine:
//!
//! ```text
//!            enter                down
//!   Idle ─────────────▶ Hovering ─────────▶ Pressing
//!    ▲      leave          ▲  up (inside)      │ move past threshold
//!    └─────────────────────┤                   ▼ (drag enabled)
//!         up (outside)     └──────────────── Dragging
//! ```
//!
//! While pressing or dragging the pointer is captured: leave and enter only
//! flip the inside flag. `cancel` ends a press or drag as a release outside.
//! Events the table does not cover are ignored.
//!
//! `whileHover` follows the inside flag in every state, so a press or drag
//! that leaves the element drops it while keeping `whileTap` and `whileDrag`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::types::{LayerId, LayerSet, Vector2};

/// Kind of pointer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerEventKind {
    #[serde(rename = "pointerEnter", alias = "enter")]
    Enter,
    #[serde(rename = "pointerLeave", alias = "leave")]
    Leave,
    #[serde(rename = "pointerDown", alias = "down")]
    Down,
    #[serde(rename = "pointerMove", alias = "move")]
    Move,
    #[serde(rename = "pointerUp", alias = "up")]
    Up,
    #[serde(rename = "pointerCancel", alias = "cancel")]
    Cancel,
}

/// Pointer input in the element's parent coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    #[serde(rename = "event")]
    pub kind: PointerEventKind,
    #[serde(flatten)]
    pub position: Vector2,
}

impl PointerEvent {
    pub fn new(kind: PointerEventKind, position: Vector2) -> Self {
        Self { kind, position }
    }

    pub fn enter(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Enter, Vector2::new(x, y))
    }

    pub fn leave(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Leave, Vector2::new(x, y))
    }

    pub fn down(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Down, Vector2::new(x, y))
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Move, Vector2::new(x, y))
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Up, Vector2::new(x, y))
    }

    pub fn cancel(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Cancel, Vector2::new(x, y))
    }
}

/// Interaction state of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureState {
    #[default]
    Idle,
    Hovering,
    Pressing,
    Dragging,
}

/// A state change produced by one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureTransition {
    pub from: GestureState,
    pub to: GestureState,
}

/// Explicit gesture state machine for one element.
#[derive(Debug, Clone)]
pub struct GestureStateMachine {
    state: GestureState,
    inside: bool,
    drag_enabled: bool,
    drag_threshold: f64,
    press_origin: Option<Vector2>,
}

impl GestureStateMachine {
    pub fn new(drag_enabled: bool, drag_threshold: f64) -> Self {
        Self {
            state: GestureState::Idle,
            inside: false,
            drag_enabled,
            drag_threshold,
            press_origin: None,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Whether the pointer is over the element.
    pub fn is_inside(&self) -> bool {
        self.inside
    }

    /// Pointer position of the press that is in progress.
    pub fn press_origin(&self) -> Option<Vector2> {
        self.press_origin
    }

    /// Feed one pointer event. Returns the state change, if any.
    pub fn handle(&mut self, event: &PointerEvent) -> Option<GestureTransition> {
        use GestureState::*;
        use PointerEventKind as K;

        let from = self.state;
        let to = match (from, event.kind) {
            (Idle, K::Enter) => {
                self.inside = true;
                Hovering
            }
            (Hovering, K::Leave) => {
                self.inside = false;
                Idle
            }
            (Hovering, K::Down) => {
                self.press_origin = Some(event.position);
                Pressing
            }
            (Pressing | Dragging, K::Up) => {
                self.press_origin = None;
                if self.inside { Hovering } else { Idle }
            }
            (Pressing | Dragging, K::Cancel) => {
                self.press_origin = None;
                self.inside = false;
                Idle
            }
            (Pressing, K::Move) if self.drag_enabled && self.travel(event.position) > self.drag_threshold => {
                Dragging
            }
            (Pressing | Dragging, K::Enter) => {
                self.inside = true;
                return None;
            }
            (Pressing | Dragging, K::Leave) => {
                self.inside = false;
                return None;
            }
            (_, K::Move) => return None,
            (state, kind) => {
                warn!(?state, ?kind, "pointer event ignored");
                return None;
            }
        };

        debug!(?from, ?to, "gesture state changed");
        self.state = to;
        Some(GestureTransition { from, to })
    }

    fn travel(&self, position: Vector2) -> f64 {
        self.press_origin
            .map_or(0.0, |origin| (position - origin).length())
    }

    /// Layers that contribute to the resolved frame in the current state.
    pub fn active_layers(&self) -> LayerSet {
        let mut layers = match self.state {
            GestureState::Idle | GestureState::Hovering => LayerSet::empty(),
            GestureState::Pressing => LayerSet::empty().with(LayerId::WhileTap),
            GestureState::Dragging => LayerSet::empty().with(LayerId::WhileTap).with(LayerId::WhileDrag),
        };
        layers.insert(LayerId::Animate);
        if self.inside {
            layers.insert(LayerId::WhileHover);
        }
        layers
    }
}
