//! Core motion types and data structures.
//!
//! This module defines the fundamental types for the motion engine:
//! - `PropertyValue`: tagged union of every animatable value
//! - `Color`, `Vector2`: the non-scalar value payloads
//! - `LayerId` / `LayerSet`: gesture layers and their precedence
//! - `AnimationId`, `AnimationState`, `ElementHandle`: runtime identities

use palette::{FromColor, LinSrgba, Srgba};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{MotionError, Result};

/// Unique identifier for one scheduled transition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnimationId(pub u64);

impl AnimationId {
    /// Generate a new unique animation ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for AnimationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque handle of a renderable element, owned by the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementHandle(pub u64);

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Current state of a scheduled run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationState {
    /// Run has been created but its delay has not elapsed.
    #[default]
    Pending,
    /// Run is actively progressing.
    Running,
    /// Run has completed all iterations.
    Finished,
    /// Run was cancelled before completion.
    Cancelled,
}

/// One of the two drag axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// The property name driven by this axis while dragging.
    pub fn property(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }
}

/// 2D vector used for pointer positions, drag offsets and vector properties.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component along an axis.
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Copy with one component replaced.
    pub fn with(mut self, axis: Axis, value: f64) -> Self {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
        }
        self
    }

    /// Euclidean length.
    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Add for Vector2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vector2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Straight-alpha sRGB color with components in `[0, 1]`.
///
/// Values are stored gamma-encoded, exactly as declared, so a color passed in
/// is the color handed to the renderer. Interpolation decodes to linear light
/// (see [`crate::animation::interpolate`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse any CSS color string (`"green"`, `"#0f08"`, `"rgb(0 128 0)"`, ...).
    pub fn from_css(input: &str) -> Result<Self> {
        let parsed = csscolorparser::parse(input)
            .map_err(|e| MotionError::InvalidValue(format!("color `{input}`: {e}")))?;
        Ok(Self::rgba(
            parsed.r as f32,
            parsed.g as f32,
            parsed.b as f32,
            parsed.a as f32,
        ))
    }

    /// Decode to linear light, premultiplied by alpha.
    pub fn to_linear_premultiplied(&self) -> [f32; 4] {
        let lin: LinSrgba = LinSrgba::from_color(Srgba::new(self.r, self.g, self.b, self.a));
        [
            lin.red * lin.alpha,
            lin.green * lin.alpha,
            lin.blue * lin.alpha,
            lin.alpha,
        ]
    }

    /// Encode from linear-light premultiplied components.
    pub fn from_linear_premultiplied(c: [f32; 4]) -> Self {
        let a = c[3].clamp(0.0, 1.0);
        let (r, g, b) = if a > 0.0001 {
            (c[0] / a, c[1] / a, c[2] / a)
        } else {
            (0.0, 0.0, 0.0)
        };
        let srgb: Srgba = Srgba::from_color(LinSrgba::new(r, g, b, a));
        Self::rgba(
            srgb.red.clamp(0.0, 1.0),
            srgb.green.clamp(0.0, 1.0),
            srgb.blue.clamp(0.0, 1.0),
            srgb.alpha,
        )
    }

    /// `#rrggbbaa` representation.
    pub fn to_hex(&self) -> String {
        let byte = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            byte(self.r),
            byte(self.g),
            byte(self.b),
            byte(self.a)
        )
    }
}

/// Tag of a [`PropertyValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Number,
    Color,
    Vector2,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Number => "number",
            Self::Color => "color",
            Self::Vector2 => "vector2",
        })
    }
}

/// Every value the engine can animate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    /// Scalar (`x`, `rotate` in degrees, `scale`, `opacity`, ...).
    Number(f64),
    /// Straight-alpha sRGB color.
    Color(Color),
    /// Two-component value.
    Vector2(Vector2),
}

impl PropertyValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Number(_) => ValueKind::Number,
            Self::Color(_) => ValueKind::Color,
            Self::Vector2(_) => ValueKind::Vector2,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_vector2(&self) -> Option<Vector2> {
        match self {
            Self::Vector2(v) => Some(*v),
            _ => None,
        }
    }

    /// Fail with [`MotionError::TypeMismatch`] unless `self` is of kind `expected`.
    pub fn expect_kind(&self, expected: ValueKind) -> Result<()> {
        if self.kind() == expected {
            Ok(())
        } else {
            Err(MotionError::TypeMismatch {
                property: None,
                expected,
                found: self.kind(),
            })
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v:.3}"),
            Self::Color(c) => f.write_str(&c.to_hex()),
            Self::Vector2(v) => write!(f, "({:.3}, {:.3})", v.x, v.y),
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<Color> for PropertyValue {
    fn from(c: Color) -> Self {
        Self::Color(c)
    }
}

impl From<Vector2> for PropertyValue {
    fn from(v: Vector2) -> Self {
        Self::Vector2(v)
    }
}

/// A well-known property with a fixed kind and a rest value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnownProperty {
    pub kind: ValueKind,
    /// Value the property has when no layer sets it.
    pub rest: PropertyValue,
}

/// Look up a well-known property by name.
///
/// Unknown names are still animatable; they simply have no rest value and
/// accept any kind.
pub fn known_property(name: &str) -> Option<KnownProperty> {
    let number = |rest: f64| KnownProperty {
        kind: ValueKind::Number,
        rest: PropertyValue::Number(rest),
    };
    let color = |rest: Color| KnownProperty {
        kind: ValueKind::Color,
        rest: PropertyValue::Color(rest),
    };
    match name {
        "x" | "y" | "rotate" | "borderRadius" => Some(number(0.0)),
        "scale" | "scaleX" | "scaleY" | "opacity" => Some(number(1.0)),
        "backgroundColor" | "borderColor" => Some(color(Color::TRANSPARENT)),
        "color" => Some(color(Color::BLACK)),
        "originXY" => Some(KnownProperty {
            kind: ValueKind::Vector2,
            rest: PropertyValue::Vector2(Vector2::new(0.5, 0.5)),
        }),
        _ => None,
    }
}

/// Named style layer. The derived ordering is the resolution precedence:
/// a later variant overrides an earlier one for the properties both define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerId {
    Initial,
    Animate,
    WhileHover,
    WhileTap,
    WhileDrag,
}

impl LayerId {
    pub const ALL: [LayerId; 5] = [
        Self::Initial,
        Self::Animate,
        Self::WhileHover,
        Self::WhileTap,
        Self::WhileDrag,
    ];

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Initial => "initial",
            Self::Animate => "animate",
            Self::WhileHover => "whileHover",
            Self::WhileTap => "whileTap",
            Self::WhileDrag => "whileDrag",
        })
    }
}

/// Small set of layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayerSet(u8);

impl LayerSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn with(mut self, layer: LayerId) -> Self {
        self.insert(layer);
        self
    }

    pub fn insert(&mut self, layer: LayerId) {
        self.0 |= layer.bit();
    }

    pub fn contains(&self, layer: LayerId) -> bool {
        self.0 & layer.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Layers in ascending precedence.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = LayerId> {
        let set = *self;
        LayerId::ALL.into_iter().filter(move |l| set.contains(*l))
    }

    /// Layers in `self` that are not in `other`.
    pub fn difference(&self, other: &LayerSet) -> LayerSet {
        LayerSet(self.0 & !other.0)
    }
}
