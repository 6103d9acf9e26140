//! Easing functions for transition timing.
//!
//! This module implements the CSS timing functions plus the named curves
//! motion declarations use:
//! - Linear
//! - Ease, EaseIn, EaseOut, EaseInOut (standard CSS curves)
//! - CircIn/Out/InOut, BackIn/Out/InOut, Anticipate
//! - CubicBezier (custom bezier curves)
//! - Steps (stepped animations)
//! - Custom (any `Fn(f64) -> f64`, for callers that bring their own curve)
//!
//! # Usage
//!
//! ```
//! use kinema_scene::animation::easing::EasingFunction;
//!
//! let ease = EasingFunction::EaseInOut;
//! let progress = ease.evaluate(0.5);
//!
//! let custom = EasingFunction::cubic_bezier(0.4, 0.0, 0.2, 1.0).unwrap();
//! let progress = custom.evaluate(0.5);
//! ```

use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

use crate::error::{MotionError, Result};

/// Position for stepped animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPosition {
    /// Jump at the start of each interval (CSS `jump-start` / `start`).
    Start,
    /// Jump at the end of each interval (CSS `jump-end` / `end`).
    #[default]
    End,
}

/// User supplied easing curve.
#[derive(Clone)]
pub struct CustomEasing(Arc<dyn Fn(f64) -> f64 + Send + Sync>);

impl CustomEasing {
    pub fn new(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for CustomEasing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomEasing(..)")
    }
}

impl PartialEq for CustomEasing {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Easing function for transition timing.
///
/// Easing functions map a linear progress value (0.0 to 1.0) to an eased
/// output value, controlling the rate of change over time.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(try_from = "RawEasing")]
pub enum EasingFunction {
    /// Linear interpolation (no easing).
    Linear,

    /// CSS `ease`, `cubic-bezier(0.25, 0.1, 0.25, 1.0)`.
    Ease,

    /// `cubic-bezier(0.42, 0, 1, 1)`.
    EaseIn,

    /// `cubic-bezier(0, 0, 0.58, 1)`.
    EaseOut,

    /// `cubic-bezier(0.42, 0, 0.58, 1)`.
    #[default]
    EaseInOut,

    /// Quarter circle, slow start.
    CircIn,
    CircOut,
    CircInOut,

    /// Pulls back below 0 before accelerating.
    BackIn,
    /// Overshoots 1 before settling, `cubic-bezier(0.33, 1.53, 0.69, 0.99)`.
    BackOut,
    BackInOut,

    /// Back-in for the first half, exponential ease-out for the second.
    Anticipate,

    /// Custom cubic bezier curve.
    /// x values must be in [0, 1], y values can be any float.
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },

    /// Stepped animation with discrete jumps.
    Steps { count: u32, position: StepPosition },

    /// Caller supplied curve.
    Custom(CustomEasing),
}

impl EasingFunction {
    /// Evaluate the easing function at the given progress.
    ///
    /// Input is clamped to `[0, 1]`. Output may leave that range for the
    /// back curves and for bezier curves with out-of-range y values.
    pub fn evaluate(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            Self::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Self::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Self::CircIn => circ_in(t),
            Self::CircOut => reverse(circ_in, t),
            Self::CircInOut => mirror(circ_in, t),
            Self::BackIn => back_in(t),
            Self::BackOut => back_out(t),
            Self::BackInOut => mirror(back_in, t),
            Self::Anticipate => anticipate(t),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(*x1, *y1, *x2, *y2, t),
            Self::Steps { count, position } => stepped(*count, *position, t),
            Self::Custom(f) => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else {
                    (f.0)(t)
                }
            }
        }
    }

    /// Create a custom cubic bezier easing function.
    ///
    /// Fails with [`MotionError::InvalidEasing`] if x1 or x2 are outside [0, 1].
    pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
            return Err(MotionError::InvalidEasing(format!(
                "bezier x values must be in [0, 1], got {x1} and {x2}"
            )));
        }
        if !y1.is_finite() || !y2.is_finite() {
            return Err(MotionError::InvalidEasing(
                "bezier y values must be finite".to_string(),
            ));
        }
        Ok(Self::CubicBezier { x1, y1, x2, y2 })
    }

    /// Create a stepped easing function.
    ///
    /// Fails with [`MotionError::InvalidEasing`] if steps is 0.
    pub fn steps(steps: u32, position: StepPosition) -> Result<Self> {
        if steps == 0 {
            return Err(MotionError::InvalidEasing(
                "steps must be at least 1".to_string(),
            ));
        }
        Ok(Self::Steps {
            count: steps,
            position,
        })
    }

    /// Wrap a caller supplied curve.
    pub fn custom(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self::Custom(CustomEasing::new(f))
    }

    /// Look up a named curve (`"linear"`, `"easeOut"`, `"backInOut"`, ...).
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name {
            "linear" => Self::Linear,
            "ease" => Self::Ease,
            "easeIn" => Self::EaseIn,
            "easeOut" => Self::EaseOut,
            "easeInOut" => Self::EaseInOut,
            "circIn" => Self::CircIn,
            "circOut" => Self::CircOut,
            "circInOut" => Self::CircInOut,
            "backIn" => Self::BackIn,
            "backOut" => Self::BackOut,
            "backInOut" => Self::BackInOut,
            "anticipate" => Self::Anticipate,
            other => {
                return Err(MotionError::InvalidEasing(format!(
                    "unknown easing `{other}`"
                )));
            }
        })
    }
}

/// Declaration form: a curve name or four bezier control values.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawEasing {
    Named(String),
    Bezier([f64; 4]),
}

impl TryFrom<RawEasing> for EasingFunction {
    type Error = MotionError;

    fn try_from(raw: RawEasing) -> Result<Self> {
        match raw {
            RawEasing::Named(name) => Self::from_name(&name),
            RawEasing::Bezier([x1, y1, x2, y2]) => Self::cubic_bezier(x1, y1, x2, y2),
        }
    }
}

/// Play an ease-in curve backwards to get its ease-out twin.
#[inline]
fn reverse(f: fn(f64) -> f64, t: f64) -> f64 {
    1.0 - f(1.0 - t)
}

/// Join an ease-in curve with its reversed twin at the midpoint.
#[inline]
fn mirror(f: fn(f64) -> f64, t: f64) -> f64 {
    if t <= 0.5 {
        f(2.0 * t) / 2.0
    } else {
        (2.0 - f(2.0 * (1.0 - t))) / 2.0
    }
}

fn circ_in(t: f64) -> f64 {
    1.0 - (1.0 - t * t).max(0.0).sqrt()
}

fn back_out(t: f64) -> f64 {
    cubic_bezier(0.33, 1.53, 0.69, 0.99, t)
}

fn back_in(t: f64) -> f64 {
    reverse(back_out, t)
}

fn anticipate(t: f64) -> f64 {
    let t = t * 2.0;
    if t < 1.0 {
        0.5 * back_in(t)
    } else {
        0.5 * (2.0 - 2f64.powf(-10.0 * (t - 1.0)))
    }
}

/// Evaluate a cubic bezier curve at time t.
///
/// Uses Newton-Raphson iteration to find the curve parameter for the input
/// progress, then evaluates the y coordinate at that point.
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, progress: f64) -> f64 {
    if progress <= 0.0 {
        return 0.0;
    }
    if progress >= 1.0 {
        return 1.0;
    }

    let t = solve_bezier_x(x1, x2, progress);
    bezier_y(y1, y2, t)
}

/// Solve for t in the bezier x equation using Newton-Raphson iteration.
fn solve_bezier_x(x1: f64, x2: f64, target_x: f64) -> f64 {
    let mut t = target_x;

    for _ in 0..8 {
        let x = bezier_x(x1, x2, t) - target_x;
        if x.abs() < 1e-7 {
            break;
        }

        let dx = bezier_x_derivative(x1, x2, t);
        if dx.abs() < 1e-7 {
            break;
        }

        t -= x / dx;
        t = t.clamp(0.0, 1.0);
    }

    t
}

/// x(t) = 3(1-t)²t·x1 + 3(1-t)t²·x2 + t³
#[inline]
fn bezier_x(x1: f64, x2: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    let mt = 1.0 - t;
    let mt2 = mt * mt;

    3.0 * mt2 * t * x1 + 3.0 * mt * t2 * x2 + t3
}

#[inline]
fn bezier_y(y1: f64, y2: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    let mt = 1.0 - t;
    let mt2 = mt * mt;

    3.0 * mt2 * t * y1 + 3.0 * mt * t2 * y2 + t3
}

/// dx/dt = 3(1-t)²·x1 + 6(1-t)t·(x2-x1) + 3t²·(1-x2)
#[inline]
fn bezier_x_derivative(x1: f64, x2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * x1 + 6.0 * mt * t * (x2 - x1) + 3.0 * t * t * (1.0 - x2)
}

fn stepped(steps: u32, position: StepPosition, t: f64) -> f64 {
    if steps == 0 {
        return t;
    }

    let steps_f = steps as f64;

    match position {
        StepPosition::Start => (t * steps_f).ceil() / steps_f,
        StepPosition::End => (t * steps_f).floor() / steps_f,
    }
}
