//! Post-drag momentum.
//!
//! Damping is applied once per tick, so the glide distance depends on the
//! frame rate. [`InertiaState::step`] is the only place that advances the
//! simulation, so a time-scaled variant can replace it without touching
//! callers.

use super::clamp_into;
use crate::config::ManipulationConfig;
use crate::controller::{Controller, ControllerStatus};
use crate::geometry::BorderBounds;
use crate::scene::{ComponentId, SceneGraph};
use kurbo::Vec2;

/// Velocity and decay parameters of one glide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertiaState {
    /// World-space displacement per tick.
    pub velocity: Vec2,
    /// Per-tick multiplier in (0, 1).
    pub damping: f64,
    /// Both components below this stop the glide.
    pub epsilon: f64,
}

impl InertiaState {
    /// Velocity at release: pre-damped and capped at `max_velocity`.
    pub fn from_release(release: Vec2, config: &ManipulationConfig) -> Self {
        let mut velocity = release * config.pre_damping;
        let speed = velocity.hypot();
        if speed > config.max_velocity && speed > 0.0 {
            velocity = velocity * (config.max_velocity / speed);
        }
        Self {
            velocity,
            damping: config.damping,
            epsilon: config.epsilon,
        }
    }

    /// Whether the glide has come to rest.
    pub fn is_settled(&self) -> bool {
        self.velocity.x.abs() < self.epsilon && self.velocity.y.abs() < self.epsilon
    }

    /// Advance one tick and return the displacement to apply.
    pub fn step(&mut self) -> Vec2 {
        self.velocity = self.velocity * self.damping;
        self.velocity
    }

    /// Stop immediately.
    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
    }

    /// Upper bound on ticks before a controller with this state finishes,
    /// counting the tick that detects rest.
    pub fn max_ticks(&self) -> usize {
        let speed = self.velocity.hypot();
        if speed < self.epsilon {
            return 1;
        }
        let steps = ((self.epsilon / speed).ln() / self.damping.ln()).ceil();
        steps.max(0.0) as usize + 2
    }
}

/// Controller gliding a target after a drag ends.
#[derive(Debug, Clone)]
pub struct InertiaController {
    state: InertiaState,
}

impl InertiaController {
    /// Name used on the controller stack.
    pub const NAME: &'static str = "inertia";

    /// Build a controller, or `None` when the release is already at rest.
    pub fn new(state: InertiaState) -> Option<Self> {
        (!state.is_settled()).then_some(Self { state })
    }

    /// Current glide state.
    pub fn state(&self) -> &InertiaState {
        &self.state
    }
}

impl Controller for InertiaController {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn tick(
        &mut self,
        scene: &mut dyn SceneGraph,
        target: ComponentId,
        bounds: &BorderBounds,
    ) -> ControllerStatus {
        let center = match scene.center(target) {
            Ok(center) => center,
            Err(e) => {
                log::warn!("Inertia target {} unavailable: {}", target, e);
                return ControllerStatus::Finished;
            }
        };

        if self.state.is_settled() || bounds.would_cross(center, self.state.velocity) {
            self.state.stop();
            clamp_into(scene, target, bounds);
            return ControllerStatus::Finished;
        }

        let delta = self.state.step();
        if let Err(e) = scene.translate(target, delta) {
            log::warn!("Inertia move failed for {}: {}", target, e);
            return ControllerStatus::Finished;
        }
        ControllerStatus::Continue
    }
}
