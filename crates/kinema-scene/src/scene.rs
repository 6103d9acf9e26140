//! Registry of mounted elements.
//!
//! `MotionScene` owns the render target and one [`MotionController`] per
//! mounted element. Every element is ticked on its own: errors from one
//! element are collected in the report and never stop its siblings.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::animation::controller::{MotionController, TickReport};
use crate::animation::events::MotionEvent;
use crate::animation::gesture::PointerEvent;
use crate::animation::resolver::{ErrorReporter, RenderTarget};
use crate::animation::schema::MotionDeclaration;
use crate::animation::types::ElementHandle;
use crate::error::{MotionError, Result};
use crate::settings::MotionSettings;

/// Per-element outcome of one scene tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneTickReport {
    pub elements: BTreeMap<ElementHandle, TickReport>,
}

impl SceneTickReport {
    /// Number of elements that applied a frame.
    pub fn emitted(&self) -> usize {
        self.elements.values().filter(|r| r.emitted).count()
    }

    /// Every isolated error, tagged with its element.
    pub fn errors(&self) -> impl Iterator<Item = (ElementHandle, &MotionError)> {
        self.elements
            .iter()
            .flat_map(|(handle, report)| report.errors.iter().map(move |e| (*handle, e)))
    }

    pub fn get(&self, handle: ElementHandle) -> Option<&TickReport> {
        self.elements.get(&handle)
    }
}

pub struct MotionScene<R: RenderTarget> {
    renderer: R,
    settings: MotionSettings,
    elements: BTreeMap<ElementHandle, MotionController>,
}

impl<R: RenderTarget> MotionScene<R> {
    pub fn new(renderer: R, settings: MotionSettings) -> Self {
        Self {
            renderer,
            settings,
            elements: BTreeMap::new(),
        }
    }

    pub fn settings(&self) -> &MotionSettings {
        &self.settings
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Mount an element and apply its first frame.
    pub fn mount(
        &mut self,
        handle: ElementHandle,
        declaration: impl Into<Arc<MotionDeclaration>>,
        now: f64,
    ) -> Result<()> {
        if self.elements.contains_key(&handle) {
            return Err(MotionError::AlreadyMounted(handle));
        }
        let controller = MotionController::mount(
            handle,
            declaration.into(),
            self.settings.clone(),
            now,
            &mut self.renderer,
        )?;
        self.elements.insert(handle, controller);
        Ok(())
    }

    /// Like [`MotionScene::mount`], with errors sent to `reporter`.
    pub fn mount_with_reporter(
        &mut self,
        handle: ElementHandle,
        declaration: impl Into<Arc<MotionDeclaration>>,
        now: f64,
        reporter: Box<dyn ErrorReporter>,
    ) -> Result<()> {
        if self.elements.contains_key(&handle) {
            return Err(MotionError::AlreadyMounted(handle));
        }
        let controller = MotionController::mount_with_reporter(
            handle,
            declaration.into(),
            self.settings.clone(),
            now,
            &mut self.renderer,
            reporter,
        )?;
        self.elements.insert(handle, controller);
        Ok(())
    }

    /// Tear an element down. Returns its final events.
    pub fn unmount(&mut self, handle: ElementHandle) -> Result<Vec<MotionEvent>> {
        self.elements
            .remove(&handle)
            .map(MotionController::unmount)
            .ok_or(MotionError::NotMounted(handle))
    }

    /// Queue pointer input for an element.
    pub fn pointer(&mut self, handle: ElementHandle, event: PointerEvent) -> Result<()> {
        self.elements
            .get_mut(&handle)
            .map(|c| c.on_pointer(event))
            .ok_or(MotionError::NotMounted(handle))
    }

    /// Tick every element in handle order.
    pub fn tick(&mut self, now: f64) -> SceneTickReport {
        let renderer = &mut self.renderer;
        let elements = self
            .elements
            .iter_mut()
            .map(|(handle, controller)| (*handle, controller.tick(now, &mut *renderer)))
            .collect();
        SceneTickReport { elements }
    }

    pub fn is_mounted(&self, handle: ElementHandle) -> bool {
        self.elements.contains_key(&handle)
    }

    pub fn controller(&self, handle: ElementHandle) -> Option<&MotionController> {
        self.elements.get(&handle)
    }

    /// True while any element has a run in flight or a drag in progress.
    pub fn is_animating(&self, now: f64) -> bool {
        self.elements.values().any(|c| c.is_animating(now))
    }

    /// Events from every element since the last call, in handle order.
    pub fn drain_events(&mut self) -> Vec<MotionEvent> {
        self.elements
            .values_mut()
            .flat_map(|c| c.drain_events())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
