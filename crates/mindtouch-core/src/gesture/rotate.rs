//! Border-constrained rotation.

use super::{GestureEvent, GesturePhase, GestureState, clamp_into};
use crate::scene::{SceneGraph, SceneResult};
use kurbo::Vec2;

/// Rotation lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotatePhase {
    #[default]
    Idle,
    Rotating,
}

/// Rotates a target about the gesture pivot.
///
/// Rotate gestures carry a small coupled translation that keeps the pivot
/// under the fingers; draggable targets apply it too.
#[derive(Debug, Clone, Copy, Default)]
pub struct RotateMachine {
    phase: RotatePhase,
}

impl RotateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RotatePhase {
        self.phase
    }

    /// Apply one lifecycle event to `state.target`.
    pub fn on_event(
        &mut self,
        scene: &mut dyn SceneGraph,
        state: &GestureState,
        event: &GestureEvent,
    ) -> SceneResult<()> {
        let target = state.target;
        match event.phase {
            GesturePhase::Started | GesturePhase::Resumed => {
                scene.bring_to_front(target)?;
                self.phase = RotatePhase::Rotating;
            }
            GesturePhase::Updated => {
                self.phase = RotatePhase::Rotating;
                if event.aborted {
                    log::debug!("Rotate tick aborted on {}", target);
                    return Ok(());
                }
                let Some(caps) = scene.capabilities(target) else {
                    return Ok(());
                };
                if !caps.rotatable {
                    log::debug!("Rotate ignored: {} is not rotatable", target);
                    return Ok(());
                }
                scene.rotate_about(target, event.pivot, event.rotation_degrees)?;
                if caps.draggable && event.translation != Vec2::ZERO {
                    scene.translate(target, event.translation)?;
                }
            }
            GesturePhase::Canceled | GesturePhase::Ended => {
                clamp_into(scene, target, &state.bounds);
                self.phase = RotatePhase::Idle;
            }
        }
        Ok(())
    }
}
