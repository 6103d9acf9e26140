//! Drag constraint solving.
//!
//! A drag session turns raw pointer positions into a proposed element offset:
//! pointer delta, then axis restriction, then direction lock, then clamping
//! to the declared bounds.

use serde::Deserialize;

use super::types::{Axis, Vector2};
use crate::error::{MotionError, Result};

/// Axes an element may be dragged along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragAxis {
    #[default]
    Both,
    X,
    Y,
}

impl DragAxis {
    pub fn allows(&self, axis: Axis) -> bool {
        match self {
            Self::Both => true,
            Self::X => axis == Axis::X,
            Self::Y => axis == Axis::Y,
        }
    }
}

/// Bounds on the drag offset. A missing bound leaves that side open.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct DragConstraints {
    pub left: Option<f64>,
    pub right: Option<f64>,
    pub top: Option<f64>,
    pub bottom: Option<f64>,
}

impl DragConstraints {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
            top: Some(top),
            bottom: Some(bottom),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, bound) in [
            ("left", self.left),
            ("right", self.right),
            ("top", self.top),
            ("bottom", self.bottom),
        ] {
            if let Some(v) = bound {
                if !v.is_finite() {
                    return Err(MotionError::InvalidConstraint(format!(
                        "{name} must be finite, got {v}"
                    )));
                }
            }
        }
        if let (Some(left), Some(right)) = (self.left, self.right) {
            if left > right {
                return Err(MotionError::InvalidConstraint(format!(
                    "left ({left}) is greater than right ({right})"
                )));
            }
        }
        if let (Some(top), Some(bottom)) = (self.top, self.bottom) {
            if top > bottom {
                return Err(MotionError::InvalidConstraint(format!(
                    "top ({top}) is greater than bottom ({bottom})"
                )));
            }
        }
        Ok(())
    }
}

fn clamp_axis(value: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let value = min.map_or(value, |min| value.max(min));
    max.map_or(value, |max| value.min(max))
}

/// Clamp x into `[left, right]` and y into `[top, bottom]`.
pub fn clamp_offset(offset: Vector2, constraints: &DragConstraints) -> Vector2 {
    Vector2::new(
        clamp_axis(offset.x, constraints.left, constraints.right),
        clamp_axis(offset.y, constraints.top, constraints.bottom),
    )
}

/// Everything an element declares about dragging.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragConfig {
    pub axis: DragAxis,
    pub constraints: DragConstraints,
    pub direction_lock: bool,
    pub snap_to_origin: bool,
}

/// Per-session axis choice for direction-locked drags.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DirectionLock {
    #[default]
    Undecided,
    /// Movement is confined to `axis`; the other axis stays at `held`.
    Locked { axis: Axis, held: f64 },
}

/// One drag gesture, from drag start to release.
#[derive(Debug, Clone)]
pub struct DragSession {
    /// Element offset when the drag started.
    pub origin: Vector2,
    /// Pointer position when the drag started.
    pub pointer_start: Vector2,
    pub lock: DirectionLock,
    config: DragConfig,
    lock_threshold: f64,
    offset: Vector2,
}

impl DragSession {
    pub fn new(origin: Vector2, pointer_start: Vector2, config: DragConfig, lock_threshold: f64) -> Self {
        Self {
            origin,
            pointer_start,
            lock: DirectionLock::Undecided,
            config,
            lock_threshold,
            offset: clamp_offset(origin, &config.constraints),
        }
    }

    /// Last proposed offset.
    pub fn offset(&self) -> Vector2 {
        self.offset
    }

    /// Offset for a pointer position. Feeding the same position twice yields
    /// the same offset.
    pub fn propose(&mut self, pointer: Vector2) -> Vector2 {
        let delta = pointer - self.pointer_start;

        if self.config.direction_lock && self.lock == DirectionLock::Undecided {
            if delta.x.abs().max(delta.y.abs()) <= self.lock_threshold {
                return self.offset;
            }
            let axis = if delta.y.abs() > delta.x.abs() {
                Axis::Y
            } else {
                Axis::X
            };
            let held = self.origin.get(axis.other());
            tracing::debug!(?axis, held, "drag direction locked");
            self.lock = DirectionLock::Locked { axis, held };
        }

        let mut candidate = self.origin + delta;
        for axis in [Axis::X, Axis::Y] {
            if !self.config.axis.allows(axis) {
                candidate = candidate.with(axis, self.origin.get(axis));
            }
        }
        if let DirectionLock::Locked { axis, held } = self.lock {
            candidate = candidate.with(axis.other(), held);
        }

        self.offset = clamp_offset(candidate, &self.config.constraints);
        self.offset
    }
}
