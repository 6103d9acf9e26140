//! Property-based tests for keyframe sampling and drag geometry.

use kinema_scene::animation::{
    Color, DirectionLock, DragConfig, DragConstraints, DragSession, KeyframePosition, PropertyValue,
    Vector2, clamp_offset, interpolate, interpolate_at,
};
use proptest::prelude::*;

// ===== Strategy definitions =====

fn coordinate() -> impl Strategy<Value = f64> {
    -5000.0f64..5000.0
}

fn vector() -> impl Strategy<Value = Vector2> {
    (coordinate(), coordinate()).prop_map(|(x, y)| Vector2::new(x, y))
}

fn color() -> impl Strategy<Value = Color> {
    (0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0).prop_map(|(r, g, b, a)| Color::rgba(r, g, b, a))
}

/// Sequences of one to eight keyframes, all of the same kind.
fn sequence() -> impl Strategy<Value = Vec<PropertyValue>> {
    prop_oneof![
        prop::collection::vec(coordinate().prop_map(PropertyValue::Number), 1..8),
        prop::collection::vec(vector().prop_map(PropertyValue::Vector2), 1..8),
        prop::collection::vec(color().prop_map(PropertyValue::Color), 1..8),
    ]
}

/// Bounds with `left <= right` and `top <= bottom`.
fn constraints() -> impl Strategy<Value = DragConstraints> {
    (coordinate(), 0.0f64..3000.0, coordinate(), 0.0f64..3000.0)
        .prop_map(|(left, width, top, height)| DragConstraints::new(left, top, left + width, top + height))
}

fn locked_session(bounds: DragConstraints) -> DragSession {
    DragSession::new(
        Vector2::ZERO,
        Vector2::ZERO,
        DragConfig {
            constraints: bounds,
            direction_lock: true,
            ..DragConfig::default()
        },
        10.0,
    )
}

// ===== Keyframe sampling =====

proptest! {
    /// Progress 0 and 1 land exactly on the first and last keyframe.
    #[test]
    fn prop_endpoints_are_exact(seq in sequence()) {
        prop_assert_eq!(interpolate(&seq, 0.0).unwrap(), seq[0]);
        prop_assert_eq!(interpolate(&seq, 1.0).unwrap(), seq[seq.len() - 1]);
    }

    /// Every segment starts exactly on its keyframe.
    #[test]
    fn prop_segment_starts_are_exact(seq in sequence()) {
        for (segment, expected) in seq.iter().enumerate().take(seq.len().saturating_sub(1)) {
            let value = interpolate_at(&seq, KeyframePosition { segment, fraction: 0.0 }).unwrap();
            prop_assert_eq!(value, *expected);
        }
    }

    /// Out-of-range progress is clamped onto the sequence.
    #[test]
    fn prop_progress_outside_unit_range_clamps(seq in sequence(), over in 1.0f64..10.0) {
        prop_assert_eq!(interpolate(&seq, -over).unwrap(), seq[0]);
        prop_assert_eq!(interpolate(&seq, over).unwrap(), seq[seq.len() - 1]);
    }
}

// ===== Drag geometry =====

proptest! {
    /// Clamped offsets always lie inside valid bounds.
    #[test]
    fn prop_clamp_stays_in_bounds(bounds in constraints(), offset in vector()) {
        prop_assert!(bounds.validate().is_ok());
        let clamped = clamp_offset(offset, &bounds);
        prop_assert!(clamped.x >= bounds.left.unwrap() && clamped.x <= bounds.right.unwrap());
        prop_assert!(clamped.y >= bounds.top.unwrap() && clamped.y <= bounds.bottom.unwrap());
        prop_assert_eq!(clamp_offset(clamped, &bounds), clamped);
    }

    /// Proposing the same pointer twice yields the same offset.
    #[test]
    fn prop_repeated_pointer_is_idempotent(
        bounds in constraints(),
        path in prop::collection::vec(vector(), 0..6),
        pointer in vector(),
    ) {
        let mut session = locked_session(bounds);
        for step in path {
            session.propose(step);
        }
        let first = session.propose(pointer);
        let second = session.propose(pointer);
        prop_assert_eq!(first, second);
    }

    /// Once an axis is chosen it holds for the rest of the drag.
    #[test]
    fn prop_lock_never_changes(
        bounds in constraints(),
        path in prop::collection::vec(vector(), 1..8),
    ) {
        let mut session = locked_session(bounds);
        let mut chosen = DirectionLock::Undecided;
        for step in path {
            session.propose(step);
            if chosen == DirectionLock::Undecided {
                chosen = session.lock;
            }
            prop_assert_eq!(session.lock, chosen);
        }
    }
}
