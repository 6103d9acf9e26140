//! Engine settings derived from `kinema.toml`.

use kinema_config::KinemaConfig;

use crate::animation::easing::EasingFunction;
use crate::animation::transition::TransitionSpec;

/// Thresholds and defaults shared by every controller in a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionSettings {
    /// Pointer travel in pixels before a press becomes a drag.
    pub drag_threshold: f64,
    /// Pointer travel in pixels before a direction-locked drag picks an axis.
    pub direction_lock_threshold: f64,
    /// Transition for layers and rest returns that declare none.
    pub default_transition: TransitionSpec,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self::from(&KinemaConfig::default())
    }
}

impl From<&KinemaConfig> for MotionSettings {
    fn from(config: &KinemaConfig) -> Self {
        let easing = EasingFunction::from_name(&config.transition.easing).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to the default easing");
            EasingFunction::default()
        });
        let mut default_transition = TransitionSpec::tween(config.transition.duration, easing);
        if let Err(e) = default_transition.validate() {
            tracing::warn!(error = %e, "falling back to the default transition");
            default_transition = TransitionSpec::default();
        }

        Self {
            drag_threshold: config.gesture.drag_threshold,
            direction_lock_threshold: config.gesture.direction_lock_threshold,
            default_transition,
        }
    }
}
