//! Gesture primitives and per-gesture state.
//!
//! Raw touches are turned into drag and rotate gestures outside this crate.
//! The engine receives lifecycle-tagged [`GestureEvent`]s and keeps one
//! [`GestureState`] per active gesture id, so concurrent fingers on
//! different shapes never share state.

mod drag;
mod filter;
mod inertia;
mod rotate;

pub use drag::DragMachine;
pub use filter::InterestFilter;
pub use inertia::{InertiaController, InertiaState};
pub use rotate::RotateMachine;

use crate::geometry::BorderBounds;
use crate::scene::{ComponentId, SceneGraph};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Identifier the recognizer assigns to one gesture.
pub type GestureId = u64;

/// Lifecycle of a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GesturePhase {
    Started,
    /// Resumed after being interrupted by another gesture on the same target.
    Resumed,
    Updated,
    Canceled,
    Ended,
}

impl GesturePhase {
    /// Whether this phase opens a gesture.
    pub fn is_start(self) -> bool {
        matches!(self, Self::Started | Self::Resumed)
    }

    /// Whether this phase closes a gesture.
    pub fn is_final(self) -> bool {
        matches!(self, Self::Canceled | Self::Ended)
    }
}

/// Recognized gesture primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureKind {
    Drag,
    Rotate,
}

/// A cursor position at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorSample {
    pub position: Point,
    /// Milliseconds on a monotonic clock.
    pub time_ms: f64,
}

/// Event delivered by the gesture recognizer.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureEvent {
    pub id: GestureId,
    pub kind: GestureKind,
    pub phase: GesturePhase,
    /// Component that was hit.
    pub original_target: ComponentId,
    /// World-space translation since the previous event.
    pub translation: Vec2,
    /// Rotation since the previous event in degrees, clockwise.
    pub rotation_degrees: f64,
    /// Pivot for the rotation in world space.
    pub pivot: Point,
    /// Cursor sample for velocity tracking.
    pub cursor: Option<CursorSample>,
    /// Set by an upstream collision guard: skip the transform this tick.
    pub aborted: bool,
}

impl GestureEvent {
    /// A drag event.
    pub fn drag(
        id: GestureId,
        phase: GesturePhase,
        target: ComponentId,
        translation: Vec2,
    ) -> Self {
        Self {
            id,
            kind: GestureKind::Drag,
            phase,
            original_target: target,
            translation,
            rotation_degrees: 0.0,
            pivot: Point::ZERO,
            cursor: None,
            aborted: false,
        }
    }

    /// A rotate event.
    pub fn rotate(
        id: GestureId,
        phase: GesturePhase,
        target: ComponentId,
        pivot: Point,
        degrees: f64,
    ) -> Self {
        Self {
            id,
            kind: GestureKind::Rotate,
            phase,
            original_target: target,
            translation: Vec2::ZERO,
            rotation_degrees: degrees,
            pivot,
            cursor: None,
            aborted: false,
        }
    }

    /// Attach a cursor sample.
    pub fn with_cursor(mut self, position: Point, time_ms: f64) -> Self {
        self.cursor = Some(CursorSample { position, time_ms });
        self
    }

    /// Attach the coupled translation of a rotate gesture.
    pub fn with_translation(mut self, translation: Vec2) -> Self {
        self.translation = translation;
        self
    }

    /// Mark this tick as aborted.
    pub fn aborted(mut self) -> Self {
        self.aborted = true;
        self
    }
}

/// Event as seen by a processor: the component it is registered on is
/// the current target.
#[derive(Debug, Clone, Copy)]
pub struct RoutedEvent<'a> {
    pub event: &'a GestureEvent,
    pub current_target: ComponentId,
}

/// Recent cursor samples for velocity estimation.
#[derive(Debug, Clone, Default)]
pub struct VelocityTracker {
    samples: VecDeque<CursorSample>,
}

/// Samples older than this are discarded regardless of the query window.
const MAX_SAMPLE_AGE_MS: f64 = 1_000.0;

impl VelocityTracker {
    /// Record a cursor sample.
    pub fn push(&mut self, sample: CursorSample) {
        if let Some(last) = self.samples.back() {
            if sample.time_ms < last.time_ms {
                self.samples.clear();
            }
        }
        self.samples.push_back(sample);
        while let Some(front) = self.samples.front() {
            if sample.time_ms - front.time_ms > MAX_SAMPLE_AGE_MS {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Average per-sample displacement over the last `window_ms`.
    ///
    /// This is the per-tick velocity inertia starts from.
    pub fn velocity(&self, window_ms: f64) -> Vec2 {
        let Some(last) = self.samples.back() else {
            return Vec2::ZERO;
        };
        let in_window: Vec<&CursorSample> = self
            .samples
            .iter()
            .filter(|s| last.time_ms - s.time_ms <= window_ms)
            .collect();
        if in_window.len() < 2 {
            return Vec2::ZERO;
        }
        let first = in_window[0];
        (last.position - first.position) / (in_window.len() - 1) as f64
    }

    /// Drop all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// State of one active manipulation.
#[derive(Debug, Clone)]
pub struct GestureState {
    pub kind: GestureKind,
    /// Component the transforms are applied to.
    pub target: ComponentId,
    /// Most recent event.
    pub last_event: GestureEvent,
    /// Whether the last tick was aborted by a guard.
    pub aborted: bool,
    /// Viewport bounds captured when the gesture started.
    pub bounds: BorderBounds,
    pub velocity: VelocityTracker,
}

impl GestureState {
    /// Begin tracking a gesture.
    pub fn new(target: ComponentId, event: &GestureEvent, bounds: BorderBounds) -> Self {
        let mut velocity = VelocityTracker::default();
        if let Some(sample) = event.cursor {
            velocity.push(sample);
        }
        Self {
            kind: event.kind,
            target,
            last_event: event.clone(),
            aborted: event.aborted,
            bounds,
            velocity,
        }
    }

    /// Fold a new event into the state.
    pub fn record(&mut self, event: &GestureEvent) {
        if let Some(sample) = event.cursor {
            self.velocity.push(sample);
        }
        self.aborted = event.aborted;
        self.last_event = event.clone();
    }
}

/// Nearest ancestor-or-self that is registered as clampable.
pub fn clamp_target(scene: &dyn SceneGraph, component: ComponentId) -> Option<ComponentId> {
    scene
        .path_to_root(component)
        .into_iter()
        .find(|&id| scene.capabilities(id).is_some_and(|caps| caps.clampable))
}

/// Snap a component back inside `bounds`.
///
/// The clamp applies to the nearest clampable ancestor-or-self. Exempt
/// components and components without a clampable ancestor are left alone.
/// Returns the component that was moved.
pub fn clamp_into(
    scene: &mut dyn SceneGraph,
    component: ComponentId,
    bounds: &BorderBounds,
) -> Option<ComponentId> {
    let target = clamp_target(scene, component)?;
    if scene.capabilities(target).is_some_and(|caps| caps.clamp_exempt) {
        log::debug!("Clamp skipped for exempt component {}", target);
        return None;
    }
    let center = match scene.center(target) {
        Ok(center) => center,
        Err(e) => {
            log::warn!("Clamp failed for {}: {}", target, e);
            return None;
        }
    };
    let corrected = bounds.clamp(center)?;
    match scene.set_center(target, corrected) {
        Ok(()) => Some(target),
        Err(e) => {
            log::warn!("Clamp failed for {}: {}", target, e);
            None
        }
    }
}
