//! Kinema configuration system
//!
//! This crate provides centralized configuration management for the motion
//! engine and its demo runner, loading settings from `kinema.toml` with
//! environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors raised while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for [`KinemaConfig`].
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration structure for Kinema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KinemaConfig {
    /// Pointer gesture thresholds
    pub gesture: GestureConfig,
    /// Transition used when a declaration does not provide one
    pub transition: TransitionDefaults,
    /// Headless demo runner settings
    pub demo: DemoConfig,
    /// Logging settings
    pub log: LogConfig,
}

/// Pointer gesture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Pointer travel in pixels before a press becomes a drag
    pub drag_threshold: f64,
    /// Pointer travel in pixels before a direction-locked drag picks an axis
    pub direction_lock_threshold: f64,
}

/// Default transition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionDefaults {
    /// Tween duration in seconds
    pub duration: f64,
    /// Easing curve name (linear, easeIn, easeOut, easeInOut, circOut, backOut, ...)
    pub easing: String,
}

/// Demo runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Path to a declaration JSON file (built-in demo when unset)
    pub declaration: Option<PathBuf>,
    /// Path to a pointer script JSON file (built-in script when unset)
    pub script: Option<PathBuf>,
    /// Simulated frames per second
    pub frame_rate: f64,
    /// Simulated session length in seconds
    pub duration: f64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 3.0,
            direction_lock_threshold: 10.0,
        }
    }
}

impl Default for TransitionDefaults {
    fn default() -> Self {
        Self {
            duration: 0.3,
            easing: "easeInOut".to_string(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            declaration: None,
            script: None,
            frame_rate: 60.0,
            duration: 8.0,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl KinemaConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from `kinema.toml` in the current directory,
    /// or return the default configuration if the file is missing or invalid
    pub fn load_or_default() -> Self {
        Self::load_or_default_from("kinema.toml")
    }

    /// Load configuration from `path`, falling back to defaults.
    ///
    /// A missing file is silent. Any other failure is logged before the
    /// defaults are used.
    pub fn load_or_default_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config file ignored, using defaults");
                Self::default()
            }
        }
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        if let Ok(val) = std::env::var("KINEMA_DRAG_THRESHOLD") {
            if let Ok(px) = val.parse::<f64>() {
                self.gesture.drag_threshold = px;
            }
        }
        if let Ok(val) = std::env::var("KINEMA_DIRECTION_LOCK_THRESHOLD") {
            if let Ok(px) = val.parse::<f64>() {
                self.gesture.direction_lock_threshold = px;
            }
        }

        if let Ok(val) = std::env::var("KINEMA_TRANSITION_DURATION") {
            if let Ok(secs) = val.parse::<f64>() {
                self.transition.duration = secs;
            }
        }
        if let Ok(easing) = std::env::var("KINEMA_TRANSITION_EASING") {
            self.transition.easing = easing;
        }

        if let Ok(path) = std::env::var("KINEMA_DECLARATION") {
            self.demo.declaration = Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("KINEMA_SCRIPT") {
            self.demo.script = Some(PathBuf::from(path));
        }
        if let Ok(val) = std::env::var("KINEMA_FRAME_RATE") {
            if let Ok(fps) = val.parse::<f64>() {
                self.demo.frame_rate = fps;
            }
        }
        if let Ok(val) = std::env::var("KINEMA_DEMO_DURATION") {
            if let Ok(secs) = val.parse::<f64>() {
                self.demo.duration = secs;
            }
        }

        if let Ok(filter) = std::env::var("KINEMA_LOG") {
            self.log.filter = filter;
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from kinema.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}
