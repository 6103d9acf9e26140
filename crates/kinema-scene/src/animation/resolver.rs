//! Resolved frames and the rendering seam.
//!
//! A `ResolvedFrame` is the only thing an element hands to the outside world
//! per tick. The rendering collaborator implements `RenderTarget`; it may
//! refuse individual properties, and every refusal is passed on to an
//! `ErrorReporter`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::types::{Color, ElementHandle, PropertyValue, Vector2};
use crate::error::MotionError;

/// Property values for one element at one tick, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedFrame(BTreeMap<String, PropertyValue>);

impl ResolvedFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(PropertyValue::as_number)
    }

    pub fn color(&self, name: &str) -> Option<Color> {
        self.get(name).and_then(PropertyValue::as_color)
    }

    pub fn vector2(&self, name: &str) -> Option<Vector2> {
        self.get(name).and_then(PropertyValue::as_vector2)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, PropertyValue)> for ResolvedFrame {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ResolvedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{name}={value}")?;
            first = false;
        }
        Ok(())
    }
}

/// Receiver of resolved frames.
///
/// Returns one error per property it could not apply. An empty vector means
/// the whole frame was applied.
pub trait RenderTarget {
    fn apply(&mut self, element: ElementHandle, frame: &ResolvedFrame) -> Vec<MotionError>;
}

impl<F> RenderTarget for F
where
    F: FnMut(ElementHandle, &ResolvedFrame) -> Vec<MotionError>,
{
    fn apply(&mut self, element: ElementHandle, frame: &ResolvedFrame) -> Vec<MotionError> {
        self(element, frame)
    }
}

/// Render target that records every frame it receives.
///
/// Properties listed with [`FrameLog::rejecting`] are refused with
/// [`MotionError::UnknownProperty`]; the rest of the frame is still recorded.
#[derive(Debug, Default)]
pub struct FrameLog {
    frames: Vec<(ElementHandle, ResolvedFrame)>,
    rejected: BTreeSet<String>,
}

impl FrameLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            frames: Vec::new(),
            rejected: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn frames(&self) -> &[(ElementHandle, ResolvedFrame)] {
        &self.frames
    }

    pub fn last_for(&self, element: ElementHandle) -> Option<&ResolvedFrame> {
        self.frames
            .iter()
            .rev()
            .find(|(e, _)| *e == element)
            .map(|(_, f)| f)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl RenderTarget for FrameLog {
    fn apply(&mut self, element: ElementHandle, frame: &ResolvedFrame) -> Vec<MotionError> {
        let mut accepted = ResolvedFrame::new();
        let mut errors = Vec::new();
        for (name, value) in frame.iter() {
            if self.rejected.contains(name) {
                errors.push(MotionError::UnknownProperty(name.to_string()));
            } else {
                accepted.insert(name, *value);
            }
        }
        self.frames.push((element, accepted));
        errors
    }
}

/// Sink for errors that do not stop a tick.
pub trait ErrorReporter {
    fn report(&mut self, element: ElementHandle, error: &MotionError);
}

/// Reports through `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&mut self, element: ElementHandle, error: &MotionError) {
        tracing::warn!(%element, %error, "motion error");
    }
}

/// Keeps every reported error, for inspection.
#[derive(Debug, Default, Clone)]
pub struct CollectingReporter {
    pub errors: Vec<(ElementHandle, MotionError)>,
}

impl ErrorReporter for CollectingReporter {
    fn report(&mut self, element: ElementHandle, error: &MotionError) {
        self.errors.push((element, error.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> ResolvedFrame {
        [
            ("x".to_string(), PropertyValue::Number(400.0)),
            ("glow".to_string(), PropertyValue::Number(1.0)),
            ("backgroundColor".to_string(), PropertyValue::Color(Color::BLACK)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_frame_accessors() {
        let f = frame();
        assert_eq!(f.len(), 3);
        assert_eq!(f.number("x"), Some(400.0));
        assert_eq!(f.color("backgroundColor"), Some(Color::BLACK));
        assert_eq!(f.number("backgroundColor"), None);
        assert!(f.vector2("x").is_none());
        assert!(!f.contains("y"));
    }

    #[test]
    fn test_frame_display_is_ordered() {
        assert_eq!(
            frame().to_string(),
            "backgroundColor=#000000ff glow=1.000 x=400.000"
        );
    }

    #[test]
    fn test_frame_log_rejects_per_property() {
        let mut log = FrameLog::rejecting(["glow"]);
        let errors = log.apply(ElementHandle(1), &frame());

        assert_eq!(errors, vec![MotionError::UnknownProperty("glow".to_string())]);
        let applied = log.last_for(ElementHandle(1)).unwrap();
        assert_eq!(applied.len(), 2);
        assert!(!applied.contains("glow"));
        assert!(log.last_for(ElementHandle(2)).is_none());
    }

    #[test]
    fn test_closure_render_target() {
        let mut seen = 0;
        {
            let mut target = |_: ElementHandle, f: &ResolvedFrame| {
                seen += f.len();
                Vec::<MotionError>::new()
            };
            assert!(target.apply(ElementHandle(3), &frame()).is_empty());
        }
        assert_eq!(seen, 3);
    }

    #[test]
    fn test_collecting_reporter() {
        let mut reporter = CollectingReporter::default();
        reporter.report(ElementHandle(9), &MotionError::UnknownProperty("glow".into()));
        assert_eq!(reporter.errors.len(), 1);
        LogReporter.report(ElementHandle(9), &MotionError::UnknownProperty("glow".into()));
    }
}
