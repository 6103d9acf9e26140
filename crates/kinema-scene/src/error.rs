//! Error types for the motion engine.

use thiserror::Error;

use crate::animation::types::{ElementHandle, ValueKind};

/// Result type for motion engine operations.
pub type Result<T> = std::result::Result<T, MotionError>;

/// Errors that can occur while declaring, mounting or rendering motion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    /// Two values that must share a tag do not (adjacent keyframes, a
    /// property declared with different kinds across layers, or a value that
    /// contradicts a known property's kind).
    #[error("type mismatch{}: expected {expected}, found {found}", property_suffix(.property))]
    TypeMismatch {
        property: Option<String>,
        expected: ValueKind,
        found: ValueKind,
    },

    /// Drag bounds are malformed.
    #[error("invalid drag constraint: {0}")]
    InvalidConstraint(String),

    /// The render target cannot apply a resolved property.
    #[error("unknown property `{0}`")]
    UnknownProperty(String),

    /// A keyframe sequence has no values.
    #[error("empty keyframe sequence for `{0}`")]
    EmptyKeyframes(String),

    /// Transition parameters are out of range.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Easing parameters are out of range or the name is not recognised.
    #[error("invalid easing: {0}")]
    InvalidEasing(String),

    /// A declared value could not be understood.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// An element with this handle is already mounted.
    #[error("element {0} is already mounted")]
    AlreadyMounted(ElementHandle),

    /// No element with this handle is mounted.
    #[error("element {0} is not mounted")]
    NotMounted(ElementHandle),
}

impl MotionError {
    /// Attach a property name to an error that was raised without one
    /// (a [`MotionError::TypeMismatch`] with no property, or an
    /// [`MotionError::EmptyKeyframes`] with an empty name). Other errors are
    /// returned unchanged.
    pub fn for_property(self, name: &str) -> Self {
        match self {
            Self::EmptyKeyframes(n) if n.is_empty() => Self::EmptyKeyframes(name.to_string()),
            Self::TypeMismatch {
                property: None,
                expected,
                found,
            } => Self::TypeMismatch {
                property: Some(name.to_string()),
                expected,
                found,
            },
            other => other,
        }
    }
}

fn property_suffix(property: &Option<String>) -> String {
    match property {
        Some(name) => format!(" for `{name}`"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_display() {
        let err = MotionError::TypeMismatch {
            property: None,
            expected: ValueKind::Number,
            found: ValueKind::Color,
        };
        assert_eq!(err.to_string(), "type mismatch: expected number, found color");

        let named = err.for_property("x");
        assert_eq!(
            named.to_string(),
            "type mismatch for `x`: expected number, found color"
        );
    }

    #[test]
    fn test_for_property_keeps_existing_name() {
        let err = MotionError::TypeMismatch {
            property: Some("y".to_string()),
            expected: ValueKind::Number,
            found: ValueKind::Vector2,
        };
        assert_eq!(err.clone().for_property("x"), err);

        let other = MotionError::UnknownProperty("glow".to_string());
        assert_eq!(other.clone().for_property("x"), other);

        let unnamed = MotionError::EmptyKeyframes(String::new());
        assert_eq!(
            unnamed.for_property("opacity"),
            MotionError::EmptyKeyframes("opacity".to_string())
        );
    }
}
