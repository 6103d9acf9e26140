//! Transition parameters and the per-element run scheduler.
//!
//! This module provides:
//! - `TransitionSpec`: how a layer activation moves its properties (tween or
//!   spring, delay, repeat, continuity)
//! - `TransitionScheduler`: the clock-driven registry of active runs
//!
//! A run only produces a position on the timeline (a keyframe segment and the
//! eased fraction through it). Mapping that position onto values is the
//! interpolator's job, so every property claimed by one activation shares the
//! same run and stays in phase.
//!
//! # Example
//!
//! ```
//! use kinema_scene::animation::easing::EasingFunction;
//! use kinema_scene::animation::transition::{RepeatCount, TransitionSpec};
//!
//! // 4 s linear tween after a 1 s delay, played three times in total
//! let spec = TransitionSpec::tween(4.0, EasingFunction::Linear)
//!     .with_delay(1.0)
//!     .with_repeat(RepeatCount::Finite(2));
//! assert!(spec.validate().is_ok());
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use super::easing::EasingFunction;
use super::events::{EventQueue, TransitionEvent};
use super::interpolate::KeyframePosition;
use super::spring::{Spring, SpringParams};
use super::types::{AnimationId, AnimationState, ElementHandle, LayerId};
use crate::error::{MotionError, Result};

/// Progress curve of a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionKind {
    /// Fixed-duration curve.
    Tween {
        /// Seconds per iteration.
        duration: f64,
        easing: EasingFunction,
    },
    /// Physical spring; an iteration lasts until the spring settles.
    Spring(SpringParams),
}

/// Number of extra iterations after the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatCount {
    #[default]
    Once,
    Finite(u32),
    Infinite,
}

impl RepeatCount {
    /// Total number of iterations, `None` when unbounded.
    pub fn total_iterations(&self) -> Option<u64> {
        match self {
            Self::Once => Some(1),
            Self::Finite(n) => Some(*n as u64 + 1),
            Self::Infinite => None,
        }
    }
}

/// How repeated iterations are oriented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepeatType {
    /// Every iteration starts over from the first keyframe.
    #[default]
    Loop,
    /// Odd iterations play backwards in time.
    Reverse,
    /// Odd iterations swap their endpoints but keep the curve direction.
    Mirror,
}

/// Whether a run starts from the property's currently rendered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContinuityMode {
    /// Single targets start from the current value, sequences from their
    /// first keyframe.
    #[default]
    Auto,
    Always,
    Never,
}

impl ContinuityMode {
    /// Resolve for a sequence of the given length.
    pub fn applies(&self, sequence_len: usize) -> bool {
        match self {
            Self::Auto => sequence_len == 1,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Specification for one layer activation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawTransition")]
pub struct TransitionSpec {
    pub kind: TransitionKind,
    /// Seconds before the first iteration. Negative starts part way in.
    pub delay: f64,
    pub repeat: RepeatCount,
    pub repeat_type: RepeatType,
    /// Seconds between iterations.
    pub repeat_delay: f64,
    pub continuity: ContinuityMode,
}

impl Default for TransitionSpec {
    fn default() -> Self {
        Self::tween(0.3, EasingFunction::EaseInOut)
    }
}

impl TransitionSpec {
    pub fn tween(duration: f64, easing: EasingFunction) -> Self {
        Self {
            kind: TransitionKind::Tween { duration, easing },
            delay: 0.0,
            repeat: RepeatCount::Once,
            repeat_type: RepeatType::Loop,
            repeat_delay: 0.0,
            continuity: ContinuityMode::Auto,
        }
    }

    pub fn spring(params: SpringParams) -> Self {
        Self {
            kind: TransitionKind::Spring(params),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_repeat(mut self, repeat: RepeatCount) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_repeat_type(mut self, repeat_type: RepeatType) -> Self {
        self.repeat_type = repeat_type;
        self
    }

    pub fn with_repeat_delay(mut self, repeat_delay: f64) -> Self {
        self.repeat_delay = repeat_delay;
        self
    }

    pub fn with_continuity(mut self, continuity: ContinuityMode) -> Self {
        self.continuity = continuity;
        self
    }

    /// Fail with [`MotionError::InvalidTransition`] on out-of-range timing.
    pub fn validate(&self) -> Result<()> {
        match &self.kind {
            TransitionKind::Tween { duration, .. } => {
                if !duration.is_finite() || *duration < 0.0 {
                    return Err(MotionError::InvalidTransition(format!(
                        "duration must be finite and >= 0, got {duration}"
                    )));
                }
            }
            TransitionKind::Spring(params) => params.validate()?,
        }
        if !self.delay.is_finite() {
            return Err(MotionError::InvalidTransition(format!(
                "delay must be finite, got {}",
                self.delay
            )));
        }
        if !self.repeat_delay.is_finite() || self.repeat_delay < 0.0 {
            return Err(MotionError::InvalidTransition(format!(
                "repeatDelay must be finite and >= 0, got {}",
                self.repeat_delay
            )));
        }
        Ok(())
    }

    /// Whether this activation should start from the current value.
    pub fn continuity_for(&self, sequence_len: usize) -> bool {
        self.continuity.applies(sequence_len)
    }
}

/// Declaration form of a transition object.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransition {
    #[serde(rename = "type")]
    kind: Option<String>,
    duration: Option<f64>,
    delay: Option<f64>,
    ease: Option<EasingFunction>,
    repeat: Option<RawRepeat>,
    repeat_type: Option<RepeatType>,
    repeat_delay: Option<f64>,
    stiffness: Option<f64>,
    damping: Option<f64>,
    mass: Option<f64>,
    rest_delta: Option<f64>,
    rest_speed: Option<f64>,
    continuity: Option<ContinuityMode>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRepeat {
    Count(f64),
    Named(String),
}

impl TryFrom<RawRepeat> for RepeatCount {
    type Error = MotionError;

    fn try_from(raw: RawRepeat) -> Result<Self> {
        match raw {
            RawRepeat::Count(n) if n.is_infinite() && n > 0.0 => Ok(Self::Infinite),
            RawRepeat::Count(n) if n.is_finite() && n >= 0.0 => {
                let n = n.floor();
                if n == 0.0 {
                    Ok(Self::Once)
                } else {
                    Ok(Self::Finite(n.min(u32::MAX as f64) as u32))
                }
            }
            RawRepeat::Count(n) => Err(MotionError::InvalidTransition(format!(
                "repeat must be >= 0, got {n}"
            ))),
            RawRepeat::Named(s) if s == "Infinity" || s.eq_ignore_ascii_case("infinite") => {
                Ok(Self::Infinite)
            }
            RawRepeat::Named(s) => Err(MotionError::InvalidTransition(format!(
                "unknown repeat `{s}`"
            ))),
        }
    }
}

impl TryFrom<RawTransition> for TransitionSpec {
    type Error = MotionError;

    fn try_from(raw: RawTransition) -> Result<Self> {
        let defaults = SpringParams::default();
        let has_spring_fields =
            raw.stiffness.is_some() || raw.damping.is_some() || raw.mass.is_some();
        let is_spring = match raw.kind.as_deref() {
            Some("spring") => true,
            Some("tween") | Some("keyframes") => false,
            Some(other) => {
                return Err(MotionError::InvalidTransition(format!(
                    "unknown transition type `{other}`"
                )));
            }
            None => has_spring_fields,
        };

        let kind = if is_spring {
            TransitionKind::Spring(SpringParams {
                stiffness: raw.stiffness.unwrap_or(defaults.stiffness),
                damping: raw.damping.unwrap_or(defaults.damping),
                mass: raw.mass.unwrap_or(defaults.mass),
                rest_delta: raw.rest_delta.unwrap_or(defaults.rest_delta),
                rest_speed: raw.rest_speed.unwrap_or(defaults.rest_speed),
            })
        } else {
            TransitionKind::Tween {
                duration: raw.duration.unwrap_or(0.3),
                easing: raw.ease.unwrap_or_default(),
            }
        };

        let spec = Self {
            kind,
            delay: raw.delay.unwrap_or(0.0),
            repeat: raw.repeat.map(RepeatCount::try_from).transpose()?.unwrap_or_default(),
            repeat_type: raw.repeat_type.unwrap_or_default(),
            repeat_delay: raw.repeat_delay.unwrap_or(0.0),
            continuity: raw.continuity.unwrap_or_default(),
        };
        spec.validate()?;
        Ok(spec)
    }
}

/// Progress of a run at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSample {
    /// Eased progress. Springs and back curves may leave `[0, 1]`.
    pub progress: f64,
    /// Zero-based iteration.
    pub iteration: u64,
    /// True once the final iteration has finished.
    pub complete: bool,
}

#[derive(Debug, Clone)]
struct ScheduledRun {
    spec: TransitionSpec,
    spring: Option<Spring>,
    start: f64,
    layer: LayerId,
}

impl ScheduledRun {
    /// Seconds per iteration.
    fn span(&self) -> f64 {
        match (&self.spec.kind, &self.spring) {
            (TransitionKind::Tween { duration, .. }, _) => *duration,
            (TransitionKind::Spring(_), Some(spring)) => spring.settle_time(),
            (TransitionKind::Spring(_), None) => 0.0,
        }
    }

    fn curve(&self, u: f64) -> f64 {
        match (&self.spec.kind, &self.spring) {
            (TransitionKind::Tween { easing, .. }, _) => easing.evaluate(u),
            (TransitionKind::Spring(_), Some(spring)) => spring.position(u * spring.settle_time()),
            (TransitionKind::Spring(_), None) => 1.0,
        }
    }

    fn oriented(&self, iteration: u64, u: f64) -> f64 {
        let odd = iteration % 2 == 1;
        match self.spec.repeat_type {
            RepeatType::Reverse if odd => self.curve(1.0 - u),
            RepeatType::Mirror if odd => 1.0 - self.curve(u),
            _ => self.curve(u),
        }
    }

    /// Iteration and linear time fraction at `now`.
    fn timeline(&self, now: f64) -> Timeline {
        let elapsed = now - self.start - self.spec.delay;
        if elapsed < 0.0 {
            return Timeline {
                iteration: 0,
                time: 0.0,
                complete: false,
            };
        }

        let span = self.span();
        let period = span + self.spec.repeat_delay;
        let total = self.spec.repeat.total_iterations();

        if period <= 0.0 {
            // Zero-length iterations finish the moment they start.
            return Timeline {
                iteration: total.map_or(0, |t| t - 1),
                time: 1.0,
                complete: total.is_some(),
            };
        }

        let iteration = (elapsed / period).floor() as u64;
        if let Some(total) = total {
            if iteration >= total {
                return Timeline {
                    iteration: total - 1,
                    time: 1.0,
                    complete: true,
                };
            }
        }

        let local = elapsed - iteration as f64 * period;
        let time = if span <= 0.0 || local >= span {
            1.0
        } else {
            local / span
        };
        let is_last = total.is_some_and(|t| iteration + 1 == t);
        Timeline {
            iteration,
            time,
            complete: is_last && time >= 1.0,
        }
    }

    fn sample(&self, now: f64) -> RunSample {
        let Timeline {
            iteration,
            time,
            complete,
        } = self.timeline(now);
        RunSample {
            progress: self.oriented(iteration, time),
            iteration,
            complete,
        }
    }

    /// Position on a sequence of `len` keyframes.
    ///
    /// Tweens over three or more keyframes split time evenly across the
    /// segments and ease each segment on its own. Springs and two-keyframe
    /// runs map eased whole-run progress onto the sequence.
    fn keyframe_sample(&self, now: f64, len: usize) -> KeyframeSample {
        let timeline = self.timeline(now);
        let per_segment = len > 2 && matches!(self.spec.kind, TransitionKind::Tween { .. });
        let position = if per_segment {
            self.segment_position(timeline, len - 1)
        } else {
            KeyframePosition::from_progress(self.oriented(timeline.iteration, timeline.time), len)
        };
        KeyframeSample {
            position,
            iteration: timeline.iteration,
            complete: timeline.complete,
        }
    }

    fn segment_position(&self, timeline: Timeline, segments: usize) -> KeyframePosition {
        let odd = timeline.iteration % 2 == 1;
        let (time, mirrored) = match self.spec.repeat_type {
            RepeatType::Reverse if odd => (1.0 - timeline.time, false),
            RepeatType::Mirror if odd => (timeline.time, true),
            _ => (timeline.time, false),
        };
        let scaled = time * segments as f64;
        let segment = (scaled.floor() as usize).min(segments - 1);
        let eased = self.curve(scaled - segment as f64);
        if mirrored {
            // Walk the sequence backwards, easing each segment forwards.
            KeyframePosition {
                segment: segments - 1 - segment,
                fraction: 1.0 - eased,
            }
        } else {
            KeyframePosition {
                segment,
                fraction: eased,
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Timeline {
    iteration: u64,
    /// Uneased fraction of the current iteration.
    time: f64,
    complete: bool,
}

/// Where a run stands on a keyframe sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyframeSample {
    pub position: KeyframePosition,
    pub iteration: u64,
    pub complete: bool,
}

/// Clock-driven registry of an element's transition runs.
#[derive(Debug)]
pub struct TransitionScheduler {
    element: ElementHandle,
    runs: BTreeMap<AnimationId, ScheduledRun>,
}

impl TransitionScheduler {
    pub fn new(element: ElementHandle) -> Self {
        Self {
            element,
            runs: BTreeMap::new(),
        }
    }

    /// Schedule a run starting at `now`.
    pub fn start(
        &mut self,
        spec: TransitionSpec,
        now: f64,
        layer: LayerId,
        events: &mut EventQueue,
    ) -> Result<AnimationId> {
        spec.validate()?;
        let spring = match &spec.kind {
            TransitionKind::Spring(params) => Some(Spring::new(*params)?),
            TransitionKind::Tween { .. } => None,
        };
        let id = AnimationId::new();
        debug!(element = %self.element, run = id.0, %layer, "run started");
        self.runs.insert(
            id,
            ScheduledRun {
                spec,
                spring,
                start: now,
                layer,
            },
        );
        events.push(TransitionEvent::Started {
            run_id: id,
            element: self.element,
            layer,
        });
        Ok(id)
    }

    /// Sample a run. `None` once it has been cancelled or collected.
    pub fn sample(&self, id: AnimationId, now: f64) -> Option<RunSample> {
        self.runs.get(&id).map(|run| run.sample(now))
    }

    /// Sample a run against a sequence of `len` keyframes.
    pub fn sample_keyframes(&self, id: AnimationId, now: f64, len: usize) -> Option<KeyframeSample> {
        self.runs.get(&id).map(|run| run.keyframe_sample(now, len))
    }

    pub fn progress(&self, id: AnimationId, now: f64) -> Option<f64> {
        self.sample(id, now).map(|s| s.progress)
    }

    /// True when the run finished or no longer exists.
    pub fn is_complete(&self, id: AnimationId, now: f64) -> bool {
        self.sample(id, now).is_none_or(|s| s.complete)
    }

    pub fn state(&self, id: AnimationId, now: f64) -> AnimationState {
        let Some(run) = self.runs.get(&id) else {
            return AnimationState::Cancelled;
        };
        if now - run.start - run.spec.delay < 0.0 {
            AnimationState::Pending
        } else if run.sample(now).complete {
            AnimationState::Finished
        } else {
            AnimationState::Running
        }
    }

    /// Cancel a run. Returns false if it was already gone.
    pub fn cancel(&mut self, id: AnimationId, events: &mut EventQueue) -> bool {
        match self.runs.remove(&id) {
            Some(run) => {
                debug!(element = %self.element, run = id.0, layer = %run.layer, "run cancelled");
                events.push(TransitionEvent::Cancelled {
                    run_id: id,
                    element: self.element,
                    layer: run.layer,
                });
                true
            }
            None => false,
        }
    }

    /// Collect runs that completed by `now`, emitting `Ended` for each.
    pub fn advance(&mut self, now: f64, events: &mut EventQueue) -> Vec<AnimationId> {
        let finished: Vec<AnimationId> = self
            .runs
            .iter()
            .filter(|(_, run)| run.sample(now).complete)
            .map(|(id, _)| *id)
            .collect();

        for id in &finished {
            if let Some(run) = self.runs.remove(id) {
                debug!(element = %self.element, run = id.0, layer = %run.layer, "run ended");
                events.push(TransitionEvent::Ended {
                    run_id: *id,
                    element: self.element,
                    layer: run.layer,
                });
            }
        }
        finished
    }

    /// Cancel every run.
    pub fn clear(&mut self, events: &mut EventQueue) {
        let ids: Vec<AnimationId> = self.runs.keys().copied().collect();
        for id in ids {
            self.cancel(id, events);
        }
    }

    /// Ids of every run not yet collected.
    pub fn ids(&self) -> impl Iterator<Item = AnimationId> + '_ {
        self.runs.keys().copied()
    }

    /// True while any run is still in flight at `now`.
    pub fn has_active(&self, now: f64) -> bool {
        self.runs.values().any(|run| !run.sample(now).complete)
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 0.0001;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn scheduler() -> (TransitionScheduler, EventQueue) {
        (TransitionScheduler::new(ElementHandle(1)), EventQueue::new())
    }

    fn linear(duration: f64) -> TransitionSpec {
        TransitionSpec::tween(duration, EasingFunction::Linear)
    }

    #[test]
    fn test_delay_holds_progress_at_zero() {
        let (mut s, mut events) = scheduler();
        let id = s
            .start(linear(4.0).with_delay(1.0), 0.0, LayerId::Animate, &mut events)
            .unwrap();

        assert_eq!(s.progress(id, 0.5), Some(0.0));
        assert_eq!(s.state(id, 0.5), AnimationState::Pending);
        assert!(approx_eq(s.progress(id, 3.0).unwrap(), 0.5));
        assert_eq!(s.state(id, 3.0), AnimationState::Running);
        assert_eq!(s.progress(id, 5.0), Some(1.0));
        assert!(s.is_complete(id, 5.0));
    }

    #[test]
    fn test_negative_delay_starts_part_way() {
        let (mut s, mut events) = scheduler();
        let id = s
            .start(linear(2.0).with_delay(-1.0), 10.0, LayerId::Animate, &mut events)
            .unwrap();
        assert!(approx_eq(s.progress(id, 10.0).unwrap(), 0.5));
    }

    #[test]
    fn test_default_easing_applies_to_whole_run() {
        let (mut s, mut events) = scheduler();
        let id = s
            .start(TransitionSpec::tween(1.0, EasingFunction::EaseInOut), 0.0, LayerId::Animate, &mut events)
            .unwrap();
        assert!(s.progress(id, 0.25).unwrap() < 0.25);
        assert!(approx_eq(s.progress(id, 0.5).unwrap(), 0.5));
    }

    #[test]
    fn test_loop_repeat() {
        let (mut s, mut events) = scheduler();
        let id = s
            .start(
                linear(1.0).with_repeat(RepeatCount::Finite(2)),
                0.0,
                LayerId::Animate,
                &mut events,
            )
            .unwrap();

        let sample = s.sample(id, 1.25).unwrap();
        assert_eq!(sample.iteration, 1);
        assert!(approx_eq(sample.progress, 0.25));
        assert!(!sample.complete);

        let last = s.sample(id, 2.5).unwrap();
        assert_eq!(last.iteration, 2);
        assert!(!last.complete);

        let done = s.sample(id, 3.5).unwrap();
        assert!(done.complete);
        assert_eq!(done.progress, 1.0);
    }

    #[test]
    fn test_reverse_and_mirror() {
        let (mut s, mut events) = scheduler();
        let ease = EasingFunction::EaseIn;
        let reverse = s
            .start(
                TransitionSpec::tween(1.0, ease.clone())
                    .with_repeat(RepeatCount::Finite(1))
                    .with_repeat_type(RepeatType::Reverse),
                0.0,
                LayerId::Animate,
                &mut events,
            )
            .unwrap();
        let mirror = s
            .start(
                TransitionSpec::tween(1.0, ease.clone())
                    .with_repeat(RepeatCount::Finite(1))
                    .with_repeat_type(RepeatType::Mirror),
                0.0,
                LayerId::Animate,
                &mut events,
            )
            .unwrap();

        // Second iteration, a quarter of the way in.
        let r = s.progress(reverse, 1.25).unwrap();
        let m = s.progress(mirror, 1.25).unwrap();
        assert!(approx_eq(r, ease.evaluate(0.75)));
        assert!(approx_eq(m, 1.0 - ease.evaluate(0.25)));

        // Both end back at the start.
        assert_eq!(s.progress(reverse, 2.0), Some(0.0));
        assert_eq!(s.progress(mirror, 2.0), Some(0.0));
    }

    fn position(s: &TransitionScheduler, id: AnimationId, now: f64, len: usize) -> KeyframePosition {
        s.sample_keyframes(id, now, len).unwrap().position
    }

    #[test]
    fn test_easing_restarts_in_every_segment() {
        let (mut s, mut events) = scheduler();
        let ease = EasingFunction::EaseInOut;
        let id = s
            .start(TransitionSpec::tween(4.0, ease.clone()).with_delay(1.0), 0.0, LayerId::Animate, &mut events)
            .unwrap();

        // Five keyframes, four one-second segments.
        let start = position(&s, id, 1.0, 5);
        assert_eq!(start.segment, 0);
        assert_eq!(start.fraction, 0.0);

        let quarter = position(&s, id, 1.25, 5);
        assert_eq!(quarter.segment, 0);
        assert!(approx_eq(quarter.fraction, ease.evaluate(0.25)));

        let middle = position(&s, id, 1.5, 5);
        assert!(approx_eq(middle.fraction, 0.5));

        let second = position(&s, id, 2.25, 5);
        assert_eq!(second.segment, 1);
        assert!(approx_eq(second.fraction, ease.evaluate(0.25)));

        let end = s.sample_keyframes(id, 5.0, 5).unwrap();
        assert_eq!(end.position, KeyframePosition { segment: 3, fraction: 1.0 });
        assert!(end.complete);
    }

    #[test]
    fn test_two_keyframes_ease_the_whole_run() {
        let (mut s, mut events) = scheduler();
        let ease = EasingFunction::EaseInOut;
        let id = s
            .start(TransitionSpec::tween(2.0, ease.clone()), 0.0, LayerId::Animate, &mut events)
            .unwrap();
        let p = position(&s, id, 0.5, 2);
        assert_eq!(p.segment, 0);
        assert!(approx_eq(p.fraction, ease.evaluate(0.25)));
        assert_eq!(p.fraction, s.progress(id, 0.5).unwrap());
    }

    #[test]
    fn test_reverse_and_mirror_over_segments() {
        let (mut s, mut events) = scheduler();
        let ease = EasingFunction::EaseIn;
        let spec = |repeat_type| {
            TransitionSpec::tween(2.0, ease.clone())
                .with_repeat(RepeatCount::Finite(1))
                .with_repeat_type(repeat_type)
        };
        let reverse = s.start(spec(RepeatType::Reverse), 0.0, LayerId::Animate, &mut events).unwrap();
        let mirror = s.start(spec(RepeatType::Mirror), 0.0, LayerId::Animate, &mut events).unwrap();

        // Second iteration, a quarter in: time runs backwards through segment 1.
        let r = position(&s, reverse, 2.5, 3);
        assert_eq!(r.segment, 1);
        assert!(approx_eq(r.fraction, ease.evaluate(0.5)));

        // Mirror walks from the last keyframe with the curve played forwards.
        let m = position(&s, mirror, 2.5, 3);
        assert_eq!(m.segment, 1);
        assert!(approx_eq(m.fraction, 1.0 - ease.evaluate(0.5)));

        for id in [reverse, mirror] {
            let end = s.sample_keyframes(id, 4.0, 3).unwrap();
            assert_eq!(end.position, KeyframePosition { segment: 0, fraction: 0.0 });
            assert!(end.complete);
        }
    }

    #[test]
    fn test_spring_maps_whole_run_onto_sequence() {
        let (mut s, mut events) = scheduler();
        let id = s
            .start(TransitionSpec::spring(SpringParams::default()), 0.0, LayerId::Animate, &mut events)
            .unwrap();
        let progress = s.progress(id, 0.1).unwrap();
        assert_eq!(position(&s, id, 0.1, 3), KeyframePosition::from_progress(progress, 3));
    }

    #[test]
    fn test_repeat_delay_holds_end_of_iteration() {
        let (mut s, mut events) = scheduler();
        let id = s
            .start(
                linear(1.0)
                    .with_repeat(RepeatCount::Finite(1))
                    .with_repeat_delay(0.5),
                0.0,
                LayerId::Animate,
                &mut events,
            )
            .unwrap();

        assert_eq!(s.progress(id, 1.2), Some(1.0));
        assert!(!s.is_complete(id, 1.2));
        assert!(approx_eq(s.progress(id, 2.0).unwrap(), 0.5));
        assert!(s.is_complete(id, 2.5));
    }

    #[test]
    fn test_infinite_never_completes() {
        let (mut s, mut events) = scheduler();
        let id = s
            .start(
                linear(0.5).with_repeat(RepeatCount::Infinite),
                0.0,
                LayerId::Animate,
                &mut events,
            )
            .unwrap();
        assert!(!s.is_complete(id, 1_000.0));
        assert!(s.advance(1_000.0, &mut events).is_empty());
        assert!(s.has_active(1_000.0));
    }

    #[test]
    fn test_zero_duration_jumps_to_end() {
        let (mut s, mut events) = scheduler();
        let id = s.start(linear(0.0), 2.0, LayerId::Animate, &mut events).unwrap();
        assert_eq!(s.progress(id, 2.0), Some(1.0));
        assert!(s.is_complete(id, 2.0));
    }

    #[test]
    fn test_spring_run_ends_exactly_at_one() {
        let (mut s, mut events) = scheduler();
        let id = s
            .start(TransitionSpec::spring(SpringParams::default()), 0.0, LayerId::WhileTap, &mut events)
            .unwrap();
        assert!(!s.is_complete(id, 0.1));
        assert_eq!(s.progress(id, 20.0), Some(1.0));
        assert!(s.is_complete(id, 20.0));
    }

    #[test]
    fn test_cancel_stops_samples_and_emits() {
        let (mut s, mut events) = scheduler();
        let id = s.start(linear(1.0), 0.0, LayerId::WhileHover, &mut events).unwrap();
        events.clear();

        assert!(s.cancel(id, &mut events));
        assert!(s.sample(id, 0.5).is_none());
        assert!(!s.cancel(id, &mut events));
        assert_eq!(events.len(), 1);
        assert!(events.pop().unwrap().is_cancelled());
    }

    #[test]
    fn test_advance_collects_finished_runs() {
        let (mut s, mut events) = scheduler();
        let short = s.start(linear(0.5), 0.0, LayerId::Animate, &mut events).unwrap();
        let long = s.start(linear(2.0), 0.0, LayerId::Animate, &mut events).unwrap();
        events.clear();

        let finished = s.advance(1.0, &mut events);
        assert_eq!(finished, vec![short]);
        assert!(events.pop().unwrap().is_ended());
        assert!(s.sample(long, 1.0).is_some());
        assert_eq!(s.len(), 1);

        s.clear(&mut events);
        assert!(s.is_empty());
    }

    #[test]
    fn test_invalid_specs_are_rejected() {
        let (mut s, mut events) = scheduler();
        assert!(matches!(
            s.start(linear(-1.0), 0.0, LayerId::Animate, &mut events),
            Err(MotionError::InvalidTransition(_))
        ));
        assert!(linear(f64::INFINITY).validate().is_err());
        assert!(linear(1.0).with_delay(f64::NAN).validate().is_err());
        assert!(events.is_empty());
    }

    #[test]
    fn test_deserialize_declaration_form() {
        let spec: TransitionSpec =
            serde_json::from_str(r#"{"duration": 4, "delay": 1}"#).unwrap();
        assert_eq!(
            spec.kind,
            TransitionKind::Tween {
                duration: 4.0,
                easing: EasingFunction::EaseInOut
            }
        );
        assert_eq!(spec.delay, 1.0);

        let spec: TransitionSpec = serde_json::from_str(
            r#"{"duration": 1, "ease": "linear", "repeat": "Infinity", "repeatType": "mirror"}"#,
        )
        .unwrap();
        assert_eq!(spec.repeat, RepeatCount::Infinite);
        assert_eq!(spec.repeat_type, RepeatType::Mirror);

        let spring: TransitionSpec =
            serde_json::from_str(r#"{"type": "spring", "stiffness": 300, "damping": 20}"#).unwrap();
        match spring.kind {
            TransitionKind::Spring(p) => {
                assert_eq!(p.stiffness, 300.0);
                assert_eq!(p.mass, 1.0);
            }
            other => panic!("expected spring, got {other:?}"),
        }

        let implied: TransitionSpec = serde_json::from_str(r#"{"damping": 5}"#).unwrap();
        assert!(matches!(implied.kind, TransitionKind::Spring(_)));

        assert!(serde_json::from_str::<TransitionSpec>(r#"{"duration": -2}"#).is_err());
        assert!(serde_json::from_str::<TransitionSpec>(r#"{"type": "inertia"}"#).is_err());
    }

    #[test]
    fn test_continuity_modes() {
        assert!(ContinuityMode::Auto.applies(1));
        assert!(!ContinuityMode::Auto.applies(3));
        assert!(ContinuityMode::Always.applies(3));
        assert!(!ContinuityMode::Never.applies(1));
    }
}
