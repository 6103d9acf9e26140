//! Declarative motion engine.
//!
//! Elements are mounted into a [`MotionScene`] with an immutable
//! [`MotionDeclaration`]. Each tick resolves gesture layers, transitions and
//! drag input into one [`ResolvedFrame`] per element and hands it to a
//! [`RenderTarget`].

pub mod animation;
pub mod error;
pub mod scene;
pub mod settings;

pub use animation::{
    ElementHandle, MotionController, MotionDeclaration, MotionEvent, PointerEvent, PropertyValue,
    RenderTarget, ResolvedFrame,
};
pub use error::{MotionError, Result};
pub use scene::{MotionScene, SceneTickReport};
pub use settings::MotionSettings;
