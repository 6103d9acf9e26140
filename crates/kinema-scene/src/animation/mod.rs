//! Declarative motion for mounted elements.
//!
//! This module provides:
//! - **Interpolation**: keyframe sequences of numbers, colors and vectors
//! - **Transitions**: tweens and springs with delay and repetition
//! - **Drag constraints**: clamping and per-session direction lock
//! - **Gestures**: hover, press and drag as an explicit state machine
//! - **Controller**: layer resolution into one frame per tick
//!
//! # Architecture
//!
//! ```text
//! MotionController (one per element)
//!   ├── GestureStateMachine   pointer events -> active layers
//!   ├── TransitionScheduler   runs -> eased progress
//!   ├── DragSession           pointer travel -> clamped offset
//!   └── tracks                property -> run | static | drag
//!
//! RenderTarget
//!   └── receives one ResolvedFrame per element per changed tick
//! ```

pub mod constraint;
pub mod controller;
pub mod easing;
pub mod events;
pub mod gesture;
pub mod interpolate;
pub mod resolver;
pub mod schema;
pub mod spring;
pub mod transition;
pub mod types;

pub use constraint::{DragAxis, DragConfig, DragConstraints, DragSession, DirectionLock, clamp_offset};
pub use controller::{MotionController, TickReport};
pub use easing::{CustomEasing, EasingFunction, StepPosition};
pub use events::{EventQueue, GestureEvent, MotionEvent, TransitionEvent};
pub use gesture::{GestureState, GestureStateMachine, GestureTransition, PointerEvent, PointerEventKind};
pub use interpolate::{Interpolate, KeyframePosition, interpolate, interpolate_at};
pub use resolver::{CollectingReporter, ErrorReporter, FrameLog, LogReporter, RenderTarget, ResolvedFrame};
pub use schema::{GestureLayer, KeyframeSequence, MotionDeclaration};
pub use spring::{Spring, SpringParams};
pub use transition::{
    ContinuityMode, KeyframeSample, RepeatCount, RepeatType, RunSample, TransitionKind, TransitionScheduler,
    TransitionSpec,
};
pub use types::{
    AnimationId, AnimationState, Axis, Color, ElementHandle, LayerId, LayerSet, PropertyValue, ValueKind, Vector2,
};
