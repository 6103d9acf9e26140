//! Interpolation of property values and keyframe sequences.
//!
//! A keyframe sequence of `n` values is spread over `n - 1` equal segments of
//! the unit interval. Sampling at a segment boundary returns the keyframe
//! itself, bit for bit, so timelines land exactly on their declared values.
//!
//! # Color Space Handling
//!
//! Colors are declared as straight-alpha sRGB. They are decoded to linear
//! light and premultiplied before mixing, then encoded back, so a fade from
//! transparent does not pass through grey.

use super::types::{Color, PropertyValue, ValueKind, Vector2};
use crate::error::{MotionError, Result};

/// Trait for types that can be interpolated between two values.
///
/// When t = 0.0, returns self. When t = 1.0, returns to. Factors outside the
/// unit interval extrapolate where the type allows it.
pub trait Interpolate: Sized {
    fn interpolate(&self, to: &Self, t: f64) -> Self;
}

#[inline]
fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

impl Interpolate for f64 {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        lerp(*self, *to, t)
    }
}

impl Interpolate for Vector2 {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        Vector2::new(lerp(self.x, to.x, t), lerp(self.y, to.y, t))
    }
}

impl Interpolate for Color {
    /// Mix in linear-light premultiplied space. The factor is clamped since
    /// channels cannot leave `[0, 1]`.
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0) as f32;
        let from = self.to_linear_premultiplied();
        let to = to.to_linear_premultiplied();
        let mut mixed = [0.0f32; 4];
        for (i, channel) in mixed.iter_mut().enumerate() {
            *channel = from[i] + (to[i] - from[i]) * t;
        }
        Color::from_linear_premultiplied(mixed)
    }
}

impl PropertyValue {
    /// Interpolate towards a value of the same kind.
    pub fn try_interpolate(&self, to: &Self, t: f64) -> Result<Self> {
        match (self, to) {
            (Self::Number(a), Self::Number(b)) => Ok(Self::Number(a.interpolate(b, t))),
            (Self::Color(a), Self::Color(b)) => Ok(Self::Color(a.interpolate(b, t))),
            (Self::Vector2(a), Self::Vector2(b)) => Ok(Self::Vector2(a.interpolate(b, t))),
            _ => Err(MotionError::TypeMismatch {
                property: None,
                expected: self.kind(),
                found: to.kind(),
            }),
        }
    }
}

/// Check that a named sequence is non-empty and that every adjacent pair
/// shares a kind.
pub fn validate_sequence(name: &str, seq: &[PropertyValue]) -> Result<()> {
    if seq.is_empty() {
        return Err(MotionError::EmptyKeyframes(name.to_string()));
    }
    check_adjacent_kinds(seq).map_err(|e| e.for_property(name))
}

fn check_adjacent_kinds(seq: &[PropertyValue]) -> Result<()> {
    for pair in seq.windows(2) {
        if pair[0].kind() != pair[1].kind() {
            return Err(MotionError::TypeMismatch {
                property: None,
                expected: pair[0].kind(),
                found: pair[1].kind(),
            });
        }
    }
    Ok(())
}

/// A point on a keyframe sequence: the segment index and how far through it.
///
/// `fraction` is usually in `[0, 1]`. Springs and back curves push it outside;
/// numbers and vectors then continue along the segment, colors clamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyframePosition {
    pub segment: usize,
    pub fraction: f64,
}

impl KeyframePosition {
    /// Spread whole-sequence progress over the `len - 1` equal segments.
    /// Progress below 0 or above 1 lands on the first or last segment.
    pub fn from_progress(progress: f64, len: usize) -> Self {
        let segments = len.saturating_sub(1).max(1);
        let progress = match progress {
            p if p.is_nan() => 0.0,
            p if p.is_infinite() => p.clamp(0.0, 1.0),
            p => p,
        };
        let scaled = progress * segments as f64;
        let segment = if scaled <= 0.0 {
            0
        } else {
            (scaled.floor() as usize).min(segments - 1)
        };
        Self {
            segment,
            fraction: scaled - segment as f64,
        }
    }
}

/// Sample a keyframe sequence at normalized time `t`.
///
/// `t` is clamped to `[0, 1]` (NaN reads as 0). A single keyframe is returned
/// for every `t`.
pub fn interpolate(seq: &[PropertyValue], t: f64) -> Result<PropertyValue> {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    interpolate_at(seq, KeyframePosition::from_progress(t, seq.len()))
}

/// Sample a keyframe sequence at a segment position.
///
/// Fractions of exactly 0 and 1 return the segment's keyframes unchanged.
pub fn interpolate_at(seq: &[PropertyValue], position: KeyframePosition) -> Result<PropertyValue> {
    let Some(first) = seq.first().copied() else {
        return Err(MotionError::EmptyKeyframes(String::new()));
    };
    check_adjacent_kinds(seq)?;
    if seq.len() == 1 {
        return Ok(first);
    }

    let segment = position.segment.min(seq.len() - 2);
    let (from, to) = (seq[segment], seq[segment + 1]);
    let mut fraction = if position.fraction.is_nan() {
        0.0
    } else {
        position.fraction
    };
    if from.kind() == ValueKind::Color {
        fraction = fraction.clamp(0.0, 1.0);
    }

    if fraction == 0.0 {
        Ok(from)
    } else if fraction == 1.0 {
        Ok(to)
    } else {
        from.try_interpolate(&to, fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 0.0001;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn numbers(values: &[f64]) -> Vec<PropertyValue> {
        values.iter().map(|v| PropertyValue::Number(*v)).collect()
    }

    fn number_at(seq: &[PropertyValue], t: f64) -> f64 {
        interpolate(seq, t).unwrap().as_number().unwrap()
    }

    #[test]
    fn test_f64_interpolation() {
        let from = 0.0_f64;
        let to = 100.0_f64;

        assert!(approx_eq(from.interpolate(&to, 0.0), 0.0));
        assert!(approx_eq(from.interpolate(&to, 0.25), 25.0));
        assert!(approx_eq(from.interpolate(&to, 0.75), 75.0));
        assert!(approx_eq(from.interpolate(&to, 1.0), 100.0));
    }

    #[test]
    fn test_vector_interpolation() {
        let from = Vector2::new(0.0, 10.0);
        let to = Vector2::new(100.0, -10.0);
        let mid = from.interpolate(&to, 0.5);
        assert!(approx_eq(mid.x, 50.0));
        assert!(approx_eq(mid.y, 0.0));
    }

    #[test]
    fn test_single_keyframe_is_constant() {
        let seq = numbers(&[42.0]);
        for t in [-1.0, 0.0, 0.3, 1.0, 7.0] {
            assert_eq!(number_at(&seq, t), 42.0);
        }
    }

    #[test]
    fn test_endpoints_are_exact() {
        let seq = numbers(&[0.1, 0.7, 0.3]);
        assert_eq!(interpolate(&seq, 0.0).unwrap(), seq[0]);
        assert_eq!(interpolate(&seq, 1.0).unwrap(), seq[2]);
        assert_eq!(interpolate(&seq, 0.5).unwrap(), seq[1]);
    }

    #[test]
    fn test_equal_segments() {
        let seq = numbers(&[0.0, 800.0, 800.0, 0.0, 0.0]);
        assert_eq!(number_at(&seq, 0.125), 400.0);
        assert_eq!(number_at(&seq, 0.25), 800.0);
        assert_eq!(number_at(&seq, 0.4), 800.0);
        assert!(approx_eq(number_at(&seq, 0.625), 400.0));
        assert_eq!(number_at(&seq, 0.9), 0.0);
    }

    #[test]
    fn test_time_is_clamped() {
        let seq = numbers(&[10.0, 20.0]);
        assert_eq!(number_at(&seq, -0.5), 10.0);
        assert_eq!(number_at(&seq, 1.5), 20.0);
        assert_eq!(number_at(&seq, f64::NAN), 10.0);
    }

    #[test]
    fn test_mismatched_neighbours() {
        let seq = vec![
            PropertyValue::Number(0.0),
            PropertyValue::Color(Color::BLACK),
        ];
        let err = interpolate(&seq, 0.5).unwrap_err();
        assert_eq!(
            err,
            MotionError::TypeMismatch {
                property: None,
                expected: ValueKind::Number,
                found: ValueKind::Color,
            }
        );
    }

    #[test]
    fn test_empty_sequence() {
        assert!(matches!(
            interpolate(&[], 0.5),
            Err(MotionError::EmptyKeyframes(_))
        ));
        assert_eq!(
            validate_sequence("x", &[]),
            Err(MotionError::EmptyKeyframes("x".to_string()))
        );
    }

    #[test]
    fn test_validate_sequence_names_property() {
        let seq = vec![
            PropertyValue::Number(0.0),
            PropertyValue::Vector2(Vector2::ZERO),
        ];
        match validate_sequence("scale", &seq) {
            Err(MotionError::TypeMismatch { property, .. }) => {
                assert_eq!(property.as_deref(), Some("scale"))
            }
            other => panic!("expected type mismatch, got {other:?}"),
        }
        assert!(validate_sequence("x", &numbers(&[0.0, 1.0])).is_ok());
    }

    #[test]
    fn test_color_mixes_in_linear_light() {
        let seq = vec![
            PropertyValue::Color(Color::BLACK),
            PropertyValue::Color(Color::rgba(1.0, 1.0, 1.0, 1.0)),
        ];
        let mid = interpolate(&seq, 0.5).unwrap().as_color().unwrap();
        // Linear 0.5 encodes to roughly 0.735 in sRGB.
        assert!((mid.r - 0.735).abs() < 0.01, "got {}", mid.r);
        assert!((mid.a - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_fade_from_transparent_keeps_hue() {
        let green = Color::from_css("green").unwrap();
        let seq = vec![
            PropertyValue::Color(Color::TRANSPARENT),
            PropertyValue::Color(green),
        ];
        let mid = interpolate(&seq, 0.5).unwrap().as_color().unwrap();
        assert!((mid.a - 0.5).abs() < 1e-4);
        assert!((mid.g - green.g).abs() < 0.01);
        assert!(mid.r.abs() < 1e-4);
    }

    fn number_at_position(seq: &[PropertyValue], segment: usize, fraction: f64) -> f64 {
        interpolate_at(seq, KeyframePosition { segment, fraction })
            .unwrap()
            .as_number()
            .unwrap()
    }

    #[test]
    fn test_position_from_progress() {
        assert_eq!(
            KeyframePosition::from_progress(0.25, 5),
            KeyframePosition { segment: 1, fraction: 0.0 }
        );
        assert_eq!(
            KeyframePosition::from_progress(1.0, 5),
            KeyframePosition { segment: 3, fraction: 1.0 }
        );
        assert_eq!(KeyframePosition::from_progress(f64::NAN, 3).fraction, 0.0);
        assert_eq!(KeyframePosition::from_progress(f64::INFINITY, 3).fraction, 1.0);

        let under = KeyframePosition::from_progress(-0.2, 2);
        assert_eq!(under.segment, 0);
        assert!(approx_eq(under.fraction, -0.2));
    }

    #[test]
    fn test_segment_fraction_is_local() {
        let seq = numbers(&[0.0, 800.0, 800.0, 0.0, 0.0]);
        assert_eq!(number_at_position(&seq, 0, 0.5), 400.0);
        assert_eq!(number_at_position(&seq, 1, 0.0), 800.0);
        assert_eq!(number_at_position(&seq, 2, 1.0), 0.0);
        assert_eq!(number_at_position(&seq, 9, 1.0), 0.0);
    }

    #[test]
    fn test_overshoot_extrapolates_numbers() {
        let seq = numbers(&[0.0, 100.0]);
        let over = interpolate_at(&seq, KeyframePosition::from_progress(1.1, 2)).unwrap();
        assert!(approx_eq(over.as_number().unwrap(), 110.0));
        let under = interpolate_at(&seq, KeyframePosition::from_progress(-0.2, 2)).unwrap();
        assert!(approx_eq(under.as_number().unwrap(), -20.0));

        let multi = numbers(&[0.0, 50.0, 100.0]);
        let over = interpolate_at(&multi, KeyframePosition::from_progress(1.1, 3)).unwrap();
        assert!(approx_eq(over.as_number().unwrap(), 110.0));

        // A back curve inside a middle segment overshoots that segment.
        assert!(approx_eq(number_at_position(&multi, 0, 1.2), 60.0));
    }

    #[test]
    fn test_overshoot_clamps_colors() {
        let seq = vec![
            PropertyValue::Color(Color::BLACK),
            PropertyValue::Color(Color::rgba(1.0, 0.0, 0.0, 1.0)),
        ];
        let over = interpolate_at(&seq, KeyframePosition::from_progress(1.3, 2)).unwrap();
        assert_eq!(over, seq[1]);
        let under = interpolate_at(&seq, KeyframePosition { segment: 0, fraction: -0.4 }).unwrap();
        assert_eq!(under, seq[0]);
    }
}
