//! Headless motion runner.
//!
//! Mounts one element from a declaration, replays a pointer script against it
//! at a fixed frame rate and prints every applied frame as a JSON line.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use kinema_config::KinemaConfig;
use kinema_scene::{
    ElementHandle, MotionDeclaration, MotionError, MotionScene, MotionSettings, PointerEvent,
    RenderTarget, ResolvedFrame,
};
use serde::Deserialize;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_DECLARATION: &str = include_str!("../demos/app.json");
const DEMO_SCRIPT: &str = include_str!("../demos/session.json");

const ELEMENT: ElementHandle = ElementHandle(1);

/// One scripted pointer event, delivered before the first tick at or after `at`.
#[derive(Debug, Deserialize)]
struct ScriptStep {
    at: f64,
    #[serde(flatten)]
    event: PointerEvent,
}

/// Prints each applied frame to stdout.
#[derive(Debug, Default)]
struct StdoutTarget {
    now: f64,
    frames: usize,
}

impl RenderTarget for StdoutTarget {
    fn apply(&mut self, element: ElementHandle, frame: &ResolvedFrame) -> Vec<MotionError> {
        let line = serde_json::json!({
            "t": self.now,
            "element": element,
            "frame": frame,
        });
        match serde_json::to_string(&line) {
            Ok(line) => {
                println!("{line}");
                self.frames += 1;
                Vec::new()
            }
            Err(e) => vec![MotionError::InvalidValue(e.to_string())],
        }
    }
}

fn read_or(path: Option<&Path>, fallback: &'static str) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => Ok(fallback.to_string()),
    }
}

fn main() -> Result<()> {
    // The filter lives in the config, so loading logs through a plain stderr subscriber.
    let config = tracing::subscriber::with_default(
        tracing_subscriber::fmt().with_writer(std::io::stderr).finish(),
        KinemaConfig::load,
    );

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter)))
        .init();

    let demo = &config.demo;
    ensure!(
        demo.frame_rate.is_finite() && demo.frame_rate > 0.0,
        "frame rate must be positive, got {}",
        demo.frame_rate
    );

    let declaration = read_or(demo.declaration.as_deref(), DEMO_DECLARATION)?;
    let declaration =
        MotionDeclaration::from_json(&declaration).context("failed to parse declaration")?;
    let script = read_or(demo.script.as_deref(), DEMO_SCRIPT)?;
    let mut script: Vec<ScriptStep> =
        serde_json::from_str(&script).context("failed to parse pointer script")?;
    script.sort_by(|a, b| a.at.total_cmp(&b.at));

    let settings = MotionSettings::from(&config);
    let mut scene = MotionScene::new(StdoutTarget::default(), settings);
    scene
        .mount(ELEMENT, declaration, 0.0)
        .context("failed to mount element")?;

    let step = 1.0 / demo.frame_rate;
    let frames = (demo.duration / step).ceil() as u64;
    info!(frames, frame_rate = demo.frame_rate, "running motion script");

    let mut pending = script.into_iter().peekable();
    let mut errors = 0;
    for i in 1..=frames {
        let now = i as f64 * step;
        while let Some(next) = pending.next_if(|s| s.at <= now) {
            scene.pointer(ELEMENT, next.event)?;
        }
        scene.renderer_mut().now = now;
        let report = scene.tick(now);
        errors += report.errors().count();

        for event in scene.drain_events() {
            debug!(now, ?event, "motion event");
        }
    }

    let finished = scene.unmount(ELEMENT)?;
    let cancelled = finished.iter().filter(|e| e.is_cancelled()).count();
    info!(
        frames = scene.renderer().frames,
        errors,
        cancelled,
        "motion script finished"
    );
    Ok(())
}
