//! Per-frame behaviours layered on a single target.
//!
//! Each target owns a [`ControllerStack`]. Every tick runs the controllers
//! newest first; a controller that reports [`ControllerStatus::Finished`] is
//! removed and the ones beneath it keep running.

use crate::geometry::BorderBounds;
use crate::scene::{ComponentId, SceneGraph};
use std::fmt;

/// Outcome of one controller tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerStatus {
    Continue,
    Finished,
}

/// A per-frame behaviour applied to one target.
pub trait Controller: fmt::Debug {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Advance one frame.
    fn tick(
        &mut self,
        scene: &mut dyn SceneGraph,
        target: ComponentId,
        bounds: &BorderBounds,
    ) -> ControllerStatus;
}

/// Ordered controllers of one target, newest on top.
#[derive(Debug, Default)]
pub struct ControllerStack {
    controllers: Vec<Box<dyn Controller>>,
}

impl ControllerStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a controller on top.
    pub fn push(&mut self, controller: Box<dyn Controller>) {
        self.controllers.push(controller);
    }

    /// Remove every controller with the given name.
    pub fn remove_named(&mut self, name: &str) -> usize {
        let before = self.controllers.len();
        self.controllers.retain(|c| c.name() != name);
        before - self.controllers.len()
    }

    /// Whether a controller with this name is installed.
    pub fn contains(&self, name: &str) -> bool {
        self.controllers.iter().any(|c| c.name() == name)
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Run every controller once, newest first, dropping finished ones.
    pub fn tick(&mut self, scene: &mut dyn SceneGraph, target: ComponentId, bounds: &BorderBounds) {
        let mut index = self.controllers.len();
        while index > 0 {
            index -= 1;
            if self.controllers[index].tick(scene, target, bounds) == ControllerStatus::Finished {
                let finished = self.controllers.remove(index);
                log::debug!("Controller {} finished on {}", finished.name(), target);
            }
        }
    }
}
