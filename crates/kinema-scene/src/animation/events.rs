//! Motion events for lifecycle callbacks.
//!
//! Controllers push an event whenever a transition run starts, ends or is
//! cancelled, and whenever the gesture machine changes state. Events are
//! polled after each tick.
//!
//! # Usage
//!
//! ```ignore
//! controller.tick(now, &mut renderer);
//!
//! for event in controller.drain_events() {
//!     match event {
//!         MotionEvent::Transition(TransitionEvent::Ended { layer, .. }) => {
//!             println!("{layer} finished");
//!         }
//!         MotionEvent::Gesture(GestureEvent::StateChanged { from, to, .. }) => {
//!             println!("{from:?} -> {to:?}");
//!         }
//!         _ => {}
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::gesture::GestureState;
use super::types::{AnimationId, ElementHandle, LayerId, Vector2};

/// Event emitted when a transition run changes state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransitionEvent {
    /// Run was scheduled.
    Started {
        run_id: AnimationId,
        element: ElementHandle,
        /// Layer whose activation started the run.
        layer: LayerId,
    },
    /// Run completed its final iteration.
    Ended {
        run_id: AnimationId,
        element: ElementHandle,
        layer: LayerId,
    },
    /// Run was cancelled (layer deactivated, property claimed or unmount).
    Cancelled {
        run_id: AnimationId,
        element: ElementHandle,
        layer: LayerId,
    },
}

impl TransitionEvent {
    pub fn element(&self) -> ElementHandle {
        match self {
            Self::Started { element, .. }
            | Self::Ended { element, .. }
            | Self::Cancelled { element, .. } => *element,
        }
    }

    pub fn run_id(&self) -> AnimationId {
        match self {
            Self::Started { run_id, .. }
            | Self::Ended { run_id, .. }
            | Self::Cancelled { run_id, .. } => *run_id,
        }
    }

    pub fn layer(&self) -> LayerId {
        match self {
            Self::Started { layer, .. } | Self::Ended { layer, .. } | Self::Cancelled { layer, .. } => {
                *layer
            }
        }
    }
}

/// Event emitted by the gesture machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GestureEvent {
    StateChanged {
        element: ElementHandle,
        from: GestureState,
        to: GestureState,
    },
    /// A drag session began; `origin` is the offset at that moment.
    DragStarted {
        element: ElementHandle,
        origin: Vector2,
    },
    /// A drag session ended; `offset` is the last proposed offset.
    DragEnded {
        element: ElementHandle,
        offset: Vector2,
    },
}

impl GestureEvent {
    pub fn element(&self) -> ElementHandle {
        match self {
            Self::StateChanged { element, .. }
            | Self::DragStarted { element, .. }
            | Self::DragEnded { element, .. } => *element,
        }
    }
}

/// Wrapper enum for both transition and gesture events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MotionEvent {
    Transition(TransitionEvent),
    Gesture(GestureEvent),
}

impl MotionEvent {
    pub fn element(&self) -> ElementHandle {
        match self {
            Self::Transition(e) => e.element(),
            Self::Gesture(e) => e.element(),
        }
    }

    /// Check if this is a "started" event.
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Transition(TransitionEvent::Started { .. }))
    }

    /// Check if this is an "ended" event.
    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Transition(TransitionEvent::Ended { .. }))
    }

    /// Check if this is a "cancelled" event.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Transition(TransitionEvent::Cancelled { .. }))
    }
}

impl From<TransitionEvent> for MotionEvent {
    fn from(event: TransitionEvent) -> Self {
        Self::Transition(event)
    }
}

impl From<GestureEvent> for MotionEvent {
    fn from(event: GestureEvent) -> Self {
        Self::Gesture(event)
    }
}

/// Queue for collecting motion events during a tick.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<MotionEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: impl Into<MotionEvent>) {
        self.events.push_back(event.into());
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Pop the next event from the queue.
    pub fn pop(&mut self) -> Option<MotionEvent> {
        self.events.pop_front()
    }

    /// Drain all events from the queue, returning an iterator.
    pub fn drain(&mut self) -> impl Iterator<Item = MotionEvent> + '_ {
        self.events.drain(..)
    }

    /// Peek at the next event without removing it.
    pub fn peek(&self) -> Option<&MotionEvent> {
        self.events.front()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Get events for a specific element.
    pub fn events_for_element(&self, element: ElementHandle) -> Vec<&MotionEvent> {
        self.events
            .iter()
            .filter(|e| e.element() == element)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_event_accessors() {
        let event = TransitionEvent::Ended {
            run_id: AnimationId(2),
            element: ElementHandle(7),
            layer: LayerId::WhileHover,
        };

        assert_eq!(event.element(), ElementHandle(7));
        assert_eq!(event.run_id(), AnimationId(2));
        assert_eq!(event.layer(), LayerId::WhileHover);
    }

    #[test]
    fn test_event_kind_predicates() {
        let started = MotionEvent::from(TransitionEvent::Started {
            run_id: AnimationId(1),
            element: ElementHandle(1),
            layer: LayerId::Animate,
        });
        assert!(started.is_started());
        assert!(!started.is_ended());
        assert!(!started.is_cancelled());

        let cancelled = MotionEvent::from(TransitionEvent::Cancelled {
            run_id: AnimationId(1),
            element: ElementHandle(1),
            layer: LayerId::Animate,
        });
        assert!(cancelled.is_cancelled());

        let gesture = MotionEvent::from(GestureEvent::StateChanged {
            element: ElementHandle(1),
            from: GestureState::Idle,
            to: GestureState::Hovering,
        });
        assert!(!gesture.is_started());
        assert!(!gesture.is_ended());
    }

    #[test]
    fn test_event_queue_operations() {
        let mut queue = EventQueue::new();
        assert!(queue.is_empty());

        queue.push(TransitionEvent::Started {
            run_id: AnimationId(1),
            element: ElementHandle(1),
            layer: LayerId::Animate,
        });
        queue.push(GestureEvent::DragStarted {
            element: ElementHandle(2),
            origin: Vector2::ZERO,
        });
        assert_eq!(queue.len(), 2);
        assert!(queue.peek().is_some_and(|e| e.is_started()));

        let event = queue.pop().unwrap();
        assert!(matches!(event, MotionEvent::Transition(TransitionEvent::Started { .. })));

        let event = queue.pop().unwrap();
        assert!(matches!(event, MotionEvent::Gesture(GestureEvent::DragStarted { .. })));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_event_queue_drain_and_filter() {
        let mut queue = EventQueue::new();
        for element in [1, 2, 1] {
            queue.push(GestureEvent::DragEnded {
                element: ElementHandle(element),
                offset: Vector2::ZERO,
            });
        }

        assert_eq!(queue.events_for_element(ElementHandle(1)).len(), 2);
        assert_eq!(queue.events_for_element(ElementHandle(3)).len(), 0);

        let events: Vec<_> = queue.drain().collect();
        assert_eq!(events.len(), 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_event_serialization() {
        let event = MotionEvent::from(GestureEvent::StateChanged {
            element: ElementHandle(3),
            from: GestureState::Hovering,
            to: GestureState::Pressing,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "gesture");
        assert_eq!(json["type"], "state_changed");
    }
}
