//! Per-element motion controller.
//!
//! The controller owns everything that changes while an element is mounted:
//! its gesture machine, its run scheduler, one track per property and the
//! live drag session. The declaration is shared and only read.
//!
//! # Tick order
//!
//! ```text
//! tick(now)
//!   1. drain queued pointer events through the gesture machine
//!      (drag start detaches x/y, drag end holds or snaps them)
//!   2. diff active layers: hand off what deactivated, claim what activated
//!   3. sample every track (run + keyframes, static value or drag offset)
//!   4. merge over the last frame so no property disappears
//!   5. collect finished runs
//!   6. apply the frame unless it equals the last one applied
//! ```

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::constraint::{DragConfig, DragSession};
use super::events::{EventQueue, GestureEvent, MotionEvent};
use super::gesture::{GestureState, GestureStateMachine, PointerEvent, PointerEventKind};
use super::interpolate::interpolate_at;
use super::resolver::{ErrorReporter, LogReporter, RenderTarget, ResolvedFrame};
use super::schema::MotionDeclaration;
use super::transition::TransitionScheduler;
use super::types::{
    AnimationId, Axis, ElementHandle, LayerId, LayerSet, PropertyValue, Vector2, known_property,
};
use crate::error::{MotionError, Result};
use crate::settings::MotionSettings;

/// Who currently decides a property's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Layer(LayerId),
    /// Returning to, or holding, the rest value.
    Rest,
    Drag,
}

#[derive(Debug, Clone)]
enum TrackSource {
    Run {
        run: AnimationId,
        keyframes: Vec<PropertyValue>,
    },
    Static(PropertyValue),
    Drag(Axis),
}

#[derive(Debug, Clone)]
struct Track {
    owner: Owner,
    source: TrackSource,
}

/// Outcome of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Gesture state the frame was resolved in.
    pub state: GestureState,
    /// Whether a frame was handed to the renderer.
    pub emitted: bool,
    /// Errors isolated during the tick. Each was also passed to the reporter.
    pub errors: Vec<MotionError>,
}

/// Drives one mounted element.
pub struct MotionController {
    element: ElementHandle,
    declaration: Arc<MotionDeclaration>,
    settings: MotionSettings,
    gesture: GestureStateMachine,
    scheduler: TransitionScheduler,
    active: LayerSet,
    tracks: BTreeMap<String, Track>,
    rest: BTreeMap<String, PropertyValue>,
    drag: Option<DragConfig>,
    drag_session: Option<DragSession>,
    pending: VecDeque<PointerEvent>,
    last_frame: ResolvedFrame,
    last_emitted: Option<ResolvedFrame>,
    events: EventQueue,
    reporter: Box<dyn ErrorReporter>,
}

impl std::fmt::Debug for MotionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionController")
            .field("element", &self.element)
            .field("state", &self.gesture.state())
            .field("active", &self.active)
            .field("tracks", &self.tracks.len())
            .finish()
    }
}

impl MotionController {
    /// Validate a declaration, apply its first frame and start the `animate`
    /// layer at `now`. Errors go to a [`LogReporter`].
    pub fn mount(
        element: ElementHandle,
        declaration: Arc<MotionDeclaration>,
        settings: MotionSettings,
        now: f64,
        renderer: &mut dyn RenderTarget,
    ) -> Result<Self> {
        Self::mount_with_reporter(
            element,
            declaration,
            settings,
            now,
            renderer,
            Box::new(LogReporter),
        )
    }

    pub fn mount_with_reporter(
        element: ElementHandle,
        declaration: Arc<MotionDeclaration>,
        settings: MotionSettings,
        now: f64,
        renderer: &mut dyn RenderTarget,
        reporter: Box<dyn ErrorReporter>,
    ) -> Result<Self> {
        declaration.validate()?;
        settings.default_transition.validate()?;

        let rest = rest_values(&declaration);
        let first = first_frame(&declaration, &rest);
        let tracks = first
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    Track {
                        owner: Owner::Rest,
                        source: TrackSource::Static(*value),
                    },
                )
            })
            .collect();
        let drag = declaration.drag_config();

        let mut controller = Self {
            element,
            gesture: GestureStateMachine::new(drag.is_some(), settings.drag_threshold),
            scheduler: TransitionScheduler::new(element),
            declaration,
            settings,
            active: LayerSet::empty(),
            tracks,
            rest,
            drag,
            drag_session: None,
            pending: VecDeque::new(),
            last_frame: ResolvedFrame::new(),
            last_emitted: None,
            events: EventQueue::new(),
            reporter,
        };

        debug!(%element, properties = first.len(), "element mounted");
        let mut errors = renderer.apply(element, &first);
        controller.last_emitted = Some(first.clone());
        controller.last_frame = first;
        controller.update_layers(now, &mut errors);
        controller.report_all(&errors);
        Ok(controller)
    }

    pub fn element(&self) -> ElementHandle {
        self.element
    }

    pub fn declaration(&self) -> &Arc<MotionDeclaration> {
        &self.declaration
    }

    pub fn gesture_state(&self) -> GestureState {
        self.gesture.state()
    }

    /// Layers resolved into the last frame.
    pub fn active_layers(&self) -> LayerSet {
        self.active
    }

    /// The most recently resolved frame.
    pub fn last_frame(&self) -> &ResolvedFrame {
        &self.last_frame
    }

    /// True while a run is in flight or a drag is in progress.
    pub fn is_animating(&self, now: f64) -> bool {
        self.drag_session.is_some() || self.scheduler.has_active(now)
    }

    /// Take every event emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<MotionEvent> {
        self.events.drain().collect()
    }

    /// Queue pointer input for the next tick. Events with a NaN or infinite
    /// position are dropped.
    pub fn on_pointer(&mut self, event: PointerEvent) {
        if !event.position.is_finite() {
            warn!(element = %self.element, ?event, "pointer event with non-finite position dropped");
            return;
        }
        trace!(element = %self.element, ?event, "pointer event queued");
        self.pending.push_back(event);
    }

    pub fn on_pointer_enter(&mut self, position: Vector2) {
        self.on_pointer(PointerEvent::new(PointerEventKind::Enter, position));
    }

    pub fn on_pointer_leave(&mut self, position: Vector2) {
        self.on_pointer(PointerEvent::new(PointerEventKind::Leave, position));
    }

    pub fn on_pointer_down(&mut self, position: Vector2) {
        self.on_pointer(PointerEvent::new(PointerEventKind::Down, position));
    }

    pub fn on_pointer_move(&mut self, position: Vector2) {
        self.on_pointer(PointerEvent::new(PointerEventKind::Move, position));
    }

    pub fn on_pointer_up(&mut self, position: Vector2) {
        self.on_pointer(PointerEvent::new(PointerEventKind::Up, position));
    }

    pub fn on_pointer_cancel(&mut self, position: Vector2) {
        self.on_pointer(PointerEvent::new(PointerEventKind::Cancel, position));
    }

    /// Resolve and apply one frame.
    pub fn tick(&mut self, now: f64, renderer: &mut dyn RenderTarget) -> TickReport {
        let mut errors = Vec::new();

        self.drain_pointer_events(now, &mut errors);
        self.update_layers(now, &mut errors);
        self.release_orphan_runs(now);

        let frame = self.sample_tracks(now, &mut errors);
        self.scheduler.advance(now, &mut self.events);

        let emitted = self.last_emitted.as_ref() != Some(&frame);
        if emitted {
            trace!(element = %self.element, %frame, "applying frame");
            errors.extend(renderer.apply(self.element, &frame));
            self.last_emitted = Some(frame.clone());
        }
        self.last_frame = frame;

        self.report_all(&errors);
        TickReport {
            state: self.gesture.state(),
            emitted,
            errors,
        }
    }

    /// Cancel every run and drop queued input. Returns the final events.
    pub fn unmount(mut self) -> Vec<MotionEvent> {
        self.pending.clear();
        self.drag_session = None;
        self.scheduler.clear(&mut self.events);
        debug!(element = %self.element, "element unmounted");
        self.events.drain().collect()
    }

    fn report_all(&mut self, errors: &[MotionError]) {
        for error in errors {
            self.reporter.report(self.element, error);
        }
    }

    fn current_value(&self, name: &str) -> Option<PropertyValue> {
        self.last_frame
            .get(name)
            .copied()
            .or_else(|| self.rest.get(name).copied())
    }

    fn current_number(&self, name: &str) -> f64 {
        self.current_value(name)
            .and_then(|v| v.as_number())
            .unwrap_or(0.0)
    }

    fn is_dragged(&self, name: &str) -> bool {
        self.drag_session.is_some() && self.tracks.get(name).is_some_and(|t| t.owner == Owner::Drag)
    }

    fn drain_pointer_events(&mut self, now: f64, errors: &mut Vec<MotionError>) {
        while let Some(event) = self.pending.pop_front() {
            match self.gesture.handle(&event) {
                Some(transition) => {
                    self.events.push(GestureEvent::StateChanged {
                        element: self.element,
                        from: transition.from,
                        to: transition.to,
                    });
                    if transition.to == GestureState::Dragging {
                        self.begin_drag(event.position);
                    } else if transition.from == GestureState::Dragging {
                        self.end_drag(now, errors);
                    }
                }
                None if event.kind == PointerEventKind::Move => {
                    if let Some(session) = self.drag_session.as_mut() {
                        session.propose(event.position);
                    }
                }
                None => {}
            }
        }
    }

    fn begin_drag(&mut self, pointer: Vector2) {
        let Some(config) = self.drag else {
            return;
        };
        let origin = Vector2::new(self.current_number("x"), self.current_number("y"));
        let start = self.gesture.press_origin().unwrap_or(pointer);
        let mut session = DragSession::new(
            origin,
            start,
            config,
            self.settings.direction_lock_threshold,
        );
        session.propose(pointer);

        for axis in [Axis::X, Axis::Y] {
            if config.axis.allows(axis) {
                self.tracks.insert(
                    axis.property().to_string(),
                    Track {
                        owner: Owner::Drag,
                        source: TrackSource::Drag(axis),
                    },
                );
            }
        }
        debug!(element = %self.element, ?origin, "drag started");
        self.events.push(GestureEvent::DragStarted {
            element: self.element,
            origin,
        });
        self.drag_session = Some(session);
    }

    fn end_drag(&mut self, now: f64, errors: &mut Vec<MotionError>) {
        let Some(session) = self.drag_session.take() else {
            return;
        };
        let offset = session.offset();
        let config = self.drag.unwrap_or_default();
        debug!(element = %self.element, ?offset, "drag ended");
        self.events.push(GestureEvent::DragEnded {
            element: self.element,
            offset,
        });

        let axes: Vec<Axis> = [Axis::X, Axis::Y]
            .into_iter()
            .filter(|a| config.axis.allows(*a))
            .collect();

        let mut snap_run = None;
        if config.snap_to_origin {
            let spec = self
                .declaration
                .rest_transition(&self.settings.default_transition);
            match self
                .scheduler
                .start(spec, now, LayerId::WhileDrag, &mut self.events)
            {
                Ok(run) => snap_run = Some(run),
                Err(e) => errors.push(e),
            }
        }

        for axis in axes {
            let name = axis.property();
            let held = PropertyValue::Number(offset.get(axis));
            let source = match snap_run {
                Some(run) => TrackSource::Run {
                    run,
                    keyframes: vec![
                        held,
                        self.rest
                            .get(name)
                            .copied()
                            .unwrap_or(PropertyValue::Number(0.0)),
                    ],
                },
                None => TrackSource::Static(held),
            };
            self.tracks.insert(
                name.to_string(),
                Track {
                    owner: Owner::Rest,
                    source,
                },
            );
        }
    }

    fn update_layers(&mut self, now: f64, errors: &mut Vec<MotionError>) {
        let next = self.gesture.active_layers();
        if next == self.active {
            return;
        }
        let decl = Arc::clone(&self.declaration);
        let added = next.difference(&self.active);
        let removed = self.active.difference(&next);

        if let Some(top_removed) = removed.iter().next_back() {
            let mut reentry: BTreeMap<LayerId, Vec<String>> = BTreeMap::new();
            let mut to_rest = Vec::new();
            for (name, track) in &self.tracks {
                let Owner::Layer(owner) = track.owner else {
                    continue;
                };
                if !removed.contains(owner) {
                    continue;
                }
                match highest_declaring(&decl, next, name) {
                    Some(layer) if added.contains(layer) => {}
                    Some(layer) => reentry.entry(layer).or_default().push(name.clone()),
                    None => to_rest.push(name.clone()),
                }
            }
            for (layer, names) in reentry {
                self.start_layer_run(&decl, layer, &names, true, now, errors);
            }
            self.return_to_rest(&decl, &to_rest, top_removed, now, errors);
        }

        for layer in added.iter() {
            let names: Vec<String> = decl
                .layer(layer)
                .map(|l| {
                    l.properties
                        .keys()
                        .filter(|name| highest_declaring(&decl, next, name) == Some(layer))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            self.start_layer_run(&decl, layer, &names, false, now, errors);
        }

        debug!(element = %self.element, ?next, "active layers changed");
        self.active = next;
    }

    /// Start one run for `layer` driving `names`. With `force_continuity`
    /// every property starts from its current value.
    fn start_layer_run(
        &mut self,
        decl: &MotionDeclaration,
        layer: LayerId,
        names: &[String],
        force_continuity: bool,
        now: f64,
        errors: &mut Vec<MotionError>,
    ) {
        let Some(gesture_layer) = decl.layer(layer) else {
            return;
        };
        let claimed: Vec<&String> = names.iter().filter(|n| !self.is_dragged(n)).collect();
        if claimed.is_empty() {
            return;
        }

        let spec = decl.transition_for(layer, &self.settings.default_transition);
        let run = match self.scheduler.start(spec.clone(), now, layer, &mut self.events) {
            Ok(run) => run,
            Err(e) => {
                errors.push(e);
                return;
            }
        };

        for name in claimed {
            let Some(seq) = gesture_layer.get(name) else {
                continue;
            };
            let continuity = force_continuity || spec.continuity_for(seq.len());
            let keyframes = self.keyframes_from_current(name, seq.values(), continuity, errors);
            self.tracks.insert(
                name.clone(),
                Track {
                    owner: Owner::Layer(layer),
                    source: TrackSource::Run { run, keyframes },
                },
            );
        }
    }

    fn keyframes_from_current(
        &self,
        name: &str,
        seq: &[PropertyValue],
        continuity: bool,
        errors: &mut Vec<MotionError>,
    ) -> Vec<PropertyValue> {
        if !continuity {
            return seq.to_vec();
        }
        let (Some(current), Some(first)) = (self.current_value(name), seq.first()) else {
            return seq.to_vec();
        };
        if let Err(e) = current.expect_kind(first.kind()) {
            errors.push(e.for_property(name));
            return seq.to_vec();
        }
        match seq {
            [target] => vec![current, *target],
            [_, rest @ ..] => std::iter::once(current).chain(rest.iter().copied()).collect(),
            [] => Vec::new(),
        }
    }

    fn return_to_rest(
        &mut self,
        decl: &MotionDeclaration,
        names: &[String],
        layer: LayerId,
        now: f64,
        errors: &mut Vec<MotionError>,
    ) {
        let mut animated = Vec::new();
        for name in names {
            match (self.current_value(name), self.rest.get(name).copied()) {
                (Some(current), Some(rest)) if current.kind() == rest.kind() => {
                    animated.push((name.clone(), vec![current, rest]));
                }
                (_, Some(rest)) => animated.push((name.clone(), vec![rest])),
                (Some(current), None) => {
                    self.tracks.insert(
                        name.clone(),
                        Track {
                            owner: Owner::Rest,
                            source: TrackSource::Static(current),
                        },
                    );
                }
                (None, None) => {
                    self.tracks.remove(name);
                }
            }
        }
        if animated.is_empty() {
            return;
        }

        let spec = decl.rest_transition(&self.settings.default_transition);
        let run = match self.scheduler.start(spec, now, layer, &mut self.events) {
            Ok(run) => Some(run),
            Err(e) => {
                errors.push(e);
                None
            }
        };
        for (name, keyframes) in animated {
            let source = match (run, keyframes.last()) {
                (Some(run), _) => TrackSource::Run { run, keyframes },
                (None, Some(rest)) => TrackSource::Static(*rest),
                (None, None) => continue,
            };
            self.tracks.insert(
                name,
                Track {
                    owner: Owner::Rest,
                    source,
                },
            );
        }
    }

    /// Cancel runs no track reads from any more.
    fn release_orphan_runs(&mut self, now: f64) {
        let referenced: BTreeSet<AnimationId> = self
            .tracks
            .values()
            .filter_map(|t| match t.source {
                TrackSource::Run { run, .. } => Some(run),
                _ => None,
            })
            .collect();
        let orphans: Vec<AnimationId> = self
            .scheduler
            .ids()
            .filter(|id| !referenced.contains(id) && !self.scheduler.is_complete(*id, now))
            .collect();
        for id in orphans {
            self.scheduler.cancel(id, &mut self.events);
        }
    }

    fn sample_tracks(&mut self, now: f64, errors: &mut Vec<MotionError>) -> ResolvedFrame {
        let mut frame = self.last_frame.clone();
        let scheduler = &self.scheduler;
        let drag_offset = self.drag_session.as_ref().map(DragSession::offset);

        for (name, track) in self.tracks.iter_mut() {
            let sampled = match &track.source {
                TrackSource::Static(value) => Ok(Some((*value, false))),
                TrackSource::Drag(axis) => {
                    Ok(drag_offset.map(|o| (PropertyValue::Number(o.get(*axis)), false)))
                }
                TrackSource::Run { run, keyframes } => match scheduler.sample_keyframes(
                    *run,
                    now,
                    keyframes.len(),
                ) {
                    Some(sample) => interpolate_at(keyframes, sample.position)
                        .map(|value| Some((value, sample.complete)))
                        .map_err(|e| e.for_property(name)),
                    None => Ok(None),
                },
            };

            match sampled {
                Ok(Some((value, complete))) => {
                    if complete {
                        track.source = TrackSource::Static(value);
                    }
                    frame.insert(name.as_str(), value);
                }
                held => {
                    if let Err(e) = held {
                        errors.push(e);
                    }
                    // Hold whatever was last resolved.
                    if let Some(value) = frame.get(name).copied() {
                        track.source = TrackSource::Static(value);
                    }
                }
            }
        }
        frame
    }
}

/// Highest layer in `active` that declares `name`.
fn highest_declaring(decl: &MotionDeclaration, active: LayerSet, name: &str) -> Option<LayerId> {
    active
        .iter()
        .rev()
        .find(|layer| decl.layer(*layer).is_some_and(|l| l.get(name).is_some()))
}

/// Value each property returns to when no layer sets it: the last
/// `initial` keyframe, else the style value, else the known rest value.
fn rest_values(decl: &MotionDeclaration) -> BTreeMap<String, PropertyValue> {
    decl.property_names()
        .into_iter()
        .filter_map(|name| {
            let value = decl
                .initial
                .as_ref()
                .and_then(|l| l.get(name))
                .and_then(|seq| seq.values().last().copied())
                .or_else(|| decl.style.get(name).copied())
                .or_else(|| known_property(name).map(|k| k.rest))?;
            Some((name.to_string(), value))
        })
        .collect()
}

/// Frame applied at mount: `initial`, else style, else the first keyframe of
/// an `animate` sequence, else the rest value, else an `animate` target.
fn first_frame(decl: &MotionDeclaration, rest: &BTreeMap<String, PropertyValue>) -> ResolvedFrame {
    let mut frame = ResolvedFrame::new();
    for name in decl.property_names() {
        let declared = decl
            .initial
            .as_ref()
            .and_then(|l| l.get(name))
            .and_then(|seq| seq.values().last().copied())
            .or_else(|| decl.style.get(name).copied());
        let animate = decl.animate.as_ref().and_then(|l| l.get(name));
        let value = declared
            .or_else(|| animate.filter(|seq| seq.len() > 1).and_then(|seq| seq.values().first().copied()))
            .or_else(|| rest.get(name).copied())
            .or_else(|| animate.and_then(|seq| seq.values().first().copied()));
        if let Some(value) = value {
            frame.insert(name, value);
        }
    }
    frame
}
