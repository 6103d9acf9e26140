//! Motion declarations.
//!
//! A `MotionDeclaration` is the immutable description of how one element
//! moves: its gesture layers, static style, drag behaviour and transitions.
//! Declarations are read from JSON or assembled with the builder methods and
//! checked once, at mount.
//!
//! # Example JSON
//!
//! ```json
//! {
//!   "drag": true,
//!   "whileDrag": { "scale": 0.8 },
//!   "dragConstraints": { "left": 0, "top": 0, "right": 1000, "bottom": 500 },
//!   "dragDirectionLock": "true",
//!   "whileHover": { "backgroundColor": "green" },
//!   "whileTap": { "scale": 0.8 },
//!   "initial": { "x": 0, "y": 0 },
//!   "animate": {
//!     "x": [0, 800, 800, 0, 0],
//!     "y": [0, 0, 300, 300, 0],
//!     "rotate": [0, 360, -360, 0]
//!   },
//!   "transition": { "duration": 4, "delay": 1 }
//! }
//! ```

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

use super::constraint::{DragAxis, DragConfig, DragConstraints};
use super::interpolate::validate_sequence;
use super::transition::TransitionSpec;
use super::types::{Color, LayerId, PropertyValue, ValueKind, Vector2, known_property};
use crate::error::{MotionError, Result};

/// Ordered, non-empty list of values for one property.
///
/// A single value means "animate to this target from wherever the property
/// is now".
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawKeyframes")]
pub struct KeyframeSequence(Vec<PropertyValue>);

impl KeyframeSequence {
    pub fn new(values: Vec<PropertyValue>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[PropertyValue] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Kind of the first keyframe.
    pub fn kind(&self) -> Option<ValueKind> {
        self.0.first().map(PropertyValue::kind)
    }
}

impl From<PropertyValue> for KeyframeSequence {
    fn from(value: PropertyValue) -> Self {
        Self(vec![value])
    }
}

impl From<f64> for KeyframeSequence {
    fn from(value: f64) -> Self {
        Self(vec![PropertyValue::Number(value)])
    }
}

impl From<Vec<PropertyValue>> for KeyframeSequence {
    fn from(values: Vec<PropertyValue>) -> Self {
        Self(values)
    }
}

impl From<Vec<f64>> for KeyframeSequence {
    fn from(values: Vec<f64>) -> Self {
        Self(values.into_iter().map(PropertyValue::Number).collect())
    }
}

/// A value as written in a declaration: a number, a CSS color or `{x, y}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Number(f64),
    Text(String),
    Vector(Vector2),
}

impl TryFrom<RawValue> for PropertyValue {
    type Error = MotionError;

    fn try_from(raw: RawValue) -> Result<Self> {
        match raw {
            RawValue::Number(n) => Ok(Self::Number(n)),
            RawValue::Text(s) => Color::from_css(&s).map(Self::Color),
            RawValue::Vector(v) => Ok(Self::Vector2(v)),
        }
    }
}

/// Arrays are tried first so `[0, 100]` stays a two-keyframe sequence.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawKeyframes {
    Sequence(Vec<RawValue>),
    Single(RawValue),
}

impl TryFrom<RawKeyframes> for KeyframeSequence {
    type Error = MotionError;

    fn try_from(raw: RawKeyframes) -> Result<Self> {
        let values = match raw {
            RawKeyframes::Sequence(vs) => vs
                .into_iter()
                .map(PropertyValue::try_from)
                .collect::<Result<Vec<_>>>()?,
            RawKeyframes::Single(v) => vec![PropertyValue::try_from(v)?],
        };
        Ok(Self(values))
    }
}

/// Properties one gesture layer sets, with an optional transition override.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GestureLayer {
    #[serde(default)]
    pub transition: Option<TransitionSpec>,
    #[serde(flatten)]
    pub properties: BTreeMap<String, KeyframeSequence>,
}

impl GestureLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, keyframes: impl Into<KeyframeSequence>) -> Self {
        self.properties.insert(name.into(), keyframes.into());
        self
    }

    pub fn with_transition(mut self, transition: TransitionSpec) -> Self {
        self.transition = Some(transition);
        self
    }

    pub fn get(&self, name: &str) -> Option<&KeyframeSequence> {
        self.properties.get(name)
    }
}

/// Immutable motion description of one element.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MotionDeclaration {
    pub initial: Option<GestureLayer>,
    pub animate: Option<GestureLayer>,
    pub while_hover: Option<GestureLayer>,
    pub while_tap: Option<GestureLayer>,
    pub while_drag: Option<GestureLayer>,
    /// Static values used when no layer sets a property.
    #[serde(deserialize_with = "deserialize_style")]
    pub style: BTreeMap<String, PropertyValue>,
    /// `None` when dragging is disabled.
    #[serde(deserialize_with = "deserialize_drag")]
    pub drag: Option<DragAxis>,
    pub drag_constraints: Option<DragConstraints>,
    #[serde(deserialize_with = "deserialize_flag")]
    pub drag_direction_lock: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub drag_snap_to_origin: bool,
    /// Element-wide transition, used by layers without their own.
    pub transition: Option<TransitionSpec>,
}

fn deserialize_style<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, PropertyValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, RawValue>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(name, value)| {
            PropertyValue::try_from(value)
                .map(|v| (name, v))
                .map_err(serde::de::Error::custom)
        })
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Text(String),
}

fn parse_flag(text: &str) -> Option<bool> {
    match text {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match RawFlag::deserialize(deserializer)? {
        RawFlag::Bool(b) => Ok(b),
        RawFlag::Text(s) => parse_flag(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("expected a boolean, got `{s}`"))),
    }
}

fn deserialize_drag<'de, D>(deserializer: D) -> std::result::Result<Option<DragAxis>, D::Error>
where
    D: Deserializer<'de>,
{
    match RawFlag::deserialize(deserializer)? {
        RawFlag::Bool(true) => Ok(Some(DragAxis::Both)),
        RawFlag::Bool(false) => Ok(None),
        RawFlag::Text(s) => match s.as_str() {
            "x" => Ok(Some(DragAxis::X)),
            "y" => Ok(Some(DragAxis::Y)),
            other => match parse_flag(other) {
                Some(true) => Ok(Some(DragAxis::Both)),
                Some(false) => Ok(None),
                None => Err(serde::de::Error::custom(format!(
                    "drag must be a boolean, \"x\" or \"y\", got `{other}`"
                ))),
            },
        },
    }
}

impl MotionDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON declaration format.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MotionError::InvalidValue(e.to_string()))
    }

    pub fn with_layer(mut self, id: LayerId, layer: GestureLayer) -> Self {
        *self.layer_slot(id) = Some(layer);
        self
    }

    pub fn with_style(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.style.insert(name.into(), value.into());
        self
    }

    pub fn with_drag(mut self, axis: DragAxis) -> Self {
        self.drag = Some(axis);
        self
    }

    pub fn with_drag_constraints(mut self, constraints: DragConstraints) -> Self {
        self.drag_constraints = Some(constraints);
        self
    }

    pub fn with_direction_lock(mut self, enabled: bool) -> Self {
        self.drag_direction_lock = enabled;
        self
    }

    pub fn with_snap_to_origin(mut self, enabled: bool) -> Self {
        self.drag_snap_to_origin = enabled;
        self
    }

    pub fn with_transition(mut self, transition: TransitionSpec) -> Self {
        self.transition = Some(transition);
        self
    }

    fn layer_slot(&mut self, id: LayerId) -> &mut Option<GestureLayer> {
        match id {
            LayerId::Initial => &mut self.initial,
            LayerId::Animate => &mut self.animate,
            LayerId::WhileHover => &mut self.while_hover,
            LayerId::WhileTap => &mut self.while_tap,
            LayerId::WhileDrag => &mut self.while_drag,
        }
    }

    pub fn layer(&self, id: LayerId) -> Option<&GestureLayer> {
        match id {
            LayerId::Initial => self.initial.as_ref(),
            LayerId::Animate => self.animate.as_ref(),
            LayerId::WhileHover => self.while_hover.as_ref(),
            LayerId::WhileTap => self.while_tap.as_ref(),
            LayerId::WhileDrag => self.while_drag.as_ref(),
        }
    }

    /// Transition for a layer activation: the layer's own, else the
    /// element's, else `fallback`.
    pub fn transition_for(&self, id: LayerId, fallback: &TransitionSpec) -> TransitionSpec {
        self.layer(id)
            .and_then(|layer| layer.transition.as_ref())
            .or(self.transition.as_ref())
            .unwrap_or(fallback)
            .clone()
    }

    /// Transition used when a property returns to its rest value.
    pub fn rest_transition(&self, fallback: &TransitionSpec) -> TransitionSpec {
        self.transition.as_ref().unwrap_or(fallback).clone()
    }

    /// Drag behaviour, `None` when dragging is disabled.
    pub fn drag_config(&self) -> Option<DragConfig> {
        self.drag.map(|axis| DragConfig {
            axis,
            constraints: self.drag_constraints.unwrap_or_default(),
            direction_lock: self.drag_direction_lock,
            snap_to_origin: self.drag_snap_to_origin,
        })
    }

    /// Every property name any layer or the style mentions.
    pub fn property_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.style.keys().map(String::as_str).collect();
        for id in LayerId::ALL {
            if let Some(layer) = self.layer(id) {
                names.extend(layer.properties.keys().map(String::as_str));
            }
        }
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Check the declaration before mounting.
    ///
    /// Every sequence must be non-empty and single-kinded, a property must
    /// keep one kind across all layers and the style, known properties must
    /// use their fixed kind, and transitions and drag bounds must be in range.
    pub fn validate(&self) -> Result<()> {
        let mut seen: BTreeMap<String, ValueKind> = BTreeMap::new();
        for (name, value) in &self.style {
            record_kind(&mut seen, name, value.kind())?;
        }
        for id in LayerId::ALL {
            let Some(layer) = self.layer(id) else {
                continue;
            };
            for (name, seq) in &layer.properties {
                validate_sequence(name, seq.values())?;
                if let Some(kind) = seq.kind() {
                    record_kind(&mut seen, name, kind)?;
                }
            }
            if let Some(transition) = &layer.transition {
                transition.validate()?;
            }
        }
        if let Some(transition) = &self.transition {
            transition.validate()?;
        }
        if let Some(constraints) = &self.drag_constraints {
            constraints.validate()?;
        }
        Ok(())
    }
}

fn record_kind(seen: &mut BTreeMap<String, ValueKind>, name: &str, found: ValueKind) -> Result<()> {
    let expected = match known_property(name) {
        Some(known) => Some(known.kind),
        None => seen.get(name).copied(),
    };
    if let Some(expected) = expected {
        if expected != found {
            return Err(MotionError::TypeMismatch {
                property: Some(name.to_string()),
                expected,
                found,
            });
        }
    }
    seen.entry(name.to_string()).or_insert(found);
    Ok(())
}
