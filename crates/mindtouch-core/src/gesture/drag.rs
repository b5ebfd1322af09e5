//! Border-constrained drag.

use super::{GestureEvent, GesturePhase, GestureState, clamp_into};
use crate::scene::{SceneGraph, SceneResult};

/// Drag lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging,
}

/// Translates a target and keeps its clampable ancestor on screen.
///
/// Border contact snaps the center exactly onto the bound, which gives
/// drags a slightly sticky feel at the edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct DragMachine {
    phase: DragPhase,
}

impl DragMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DragPhase {
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
                self.phase = DragPhase::Dragging;
            }
            GesturePhase::Updated => {
                if self.phase == DragPhase::Idle {
                    log::debug!("Drag update on {} without start", target);
                    self.phase = DragPhase::Dragging;
                }
                if event.aborted {
                    log::debug!("Drag tick aborted on {}", target);
                    return Ok(());
                }
                if !scene.capabilities(target).is_some_and(|caps| caps.draggable) {
                    log::debug!("Drag ignored: {} is not draggable", target);
                    return Ok(());
                }
                scene.translate(target, event.translation)?;
                clamp_into(scene, target, &state.bounds);
            }
            GesturePhase::Canceled | GesturePhase::Ended => {
                clamp_into(scene, target, &state.bounds);
                self.phase = DragPhase::Idle;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BorderBounds;
    use crate::scene::{ComponentKind, Outline, Scene};
    use kurbo::{Affine, Point, Rect, Vec2};

    fn setup() -> (Scene, crate::scene::ComponentId, BorderBounds) {
        let scene_rect = Rect::new(0.0, 0.0, 200.0, 200.0);
        let mut scene = Scene::new(scene_rect);
        let node = scene.add_node(Point::new(100.0, 100.0), Outline::circle(10.0)).unwrap();
        (scene, node, BorderBounds::from_viewport(scene_rect, 0.0))
    }

    fn run(
        scene: &mut Scene,
        machine: &mut DragMachine,
        state: &mut GestureState,
        event: GestureEvent,
    ) {
        state.record(&event);
        machine.on_event(scene, state, &event).unwrap();
    }

    #[test]
    fn test_drag_translates_and_raises() {
        let (mut scene, node, bounds) = setup();
        let other = scene.add_node(Point::new(20.0, 20.0), Outline::circle(5.0)).unwrap();
        let start = GestureEvent::drag(1, GesturePhase::Started, node, Vec2::ZERO);
        let mut state = GestureState::new(node, &start, bounds);
        let mut machine = DragMachine::new();

        run(&mut scene, &mut machine, &mut state, start);
        assert_eq!(machine.phase(), DragPhase::Dragging);
        assert_eq!(scene.children(scene.canvas()), vec![other, node]);

        run(
            &mut scene,
            &mut machine,
            &mut state,
            GestureEvent::drag(1, GesturePhase::Updated, node, Vec2::new(15.0, -5.0)),
        );
        assert_eq!(scene.center(node).unwrap(), Point::new(115.0, 95.0));

        run(
            &mut scene,
            &mut machine,
            &mut state,
            GestureEvent::drag(1, GesturePhase::Ended, node, Vec2::ZERO),
        );
        assert_eq!(machine.phase(), DragPhase::Idle);
    }

    #[test]
    fn test_drag_sticks_to_border() {
        let (mut scene, node, bounds) = setup();
        let start = GestureEvent::drag(1, GesturePhase::Started, node, Vec2::ZERO);
        let mut state = GestureState::new(node, &start, bounds);
        let mut machine = DragMachine::new();
        run(&mut scene, &mut machine, &mut state, start);

        run(
            &mut scene,
            &mut machine,
            &mut state,
            GestureEvent::drag(1, GesturePhase::Updated, node, Vec2::new(150.0, 130.0)),
        );
        assert_eq!(scene.center(node).unwrap(), Point::new(200.0, 200.0));

        run(
            &mut scene,
            &mut machine,
            &mut state,
            GestureEvent::drag(1, GesturePhase::Updated, node, Vec2::new(-30.0, 10.0)),
        );
        assert_eq!(scene.center(node).unwrap(), Point::new(170.0, 200.0));
    }

    #[test]
    fn test_aborted_tick_skips_transform_only() {
        let (mut scene, node, bounds) = setup();
        let start = GestureEvent::drag(1, GesturePhase::Started, node, Vec2::ZERO);
        let mut state = GestureState::new(node, &start, bounds);
        let mut machine = DragMachine::new();
        run(&mut scene, &mut machine, &mut state, start);

        run(
            &mut scene,
            &mut machine,
            &mut state,
            GestureEvent::drag(1, GesturePhase::Updated, node, Vec2::new(10.0, 0.0)).aborted(),
        );
        assert!(state.aborted);
        assert_eq!(scene.center(node).unwrap(), Point::new(100.0, 100.0));

        run(
            &mut scene,
            &mut machine,
            &mut state,
            GestureEvent::drag(1, GesturePhase::Updated, node, Vec2::new(10.0, 0.0)),
        );
        assert!(!state.aborted);
        assert_eq!(scene.center(node).unwrap(), Point::new(110.0, 100.0));
    }

    #[test]
    fn test_cancel_clamps_without_translating() {
        let (mut scene, node, bounds) = setup();
        let start = GestureEvent::drag(1, GesturePhase::Started, node, Vec2::ZERO);
        let mut state = GestureState::new(node, &start, bounds);
        let mut machine = DragMachine::new();
        run(&mut scene, &mut machine, &mut state, start);

        // Something outside the engine pushed the node off-screen.
        scene.translate(node, Vec2::new(-300.0, 0.0)).unwrap();
        run(
            &mut scene,
            &mut machine,
            &mut state,
            GestureEvent::drag(1, GesturePhase::Canceled, node, Vec2::new(50.0, 50.0)),
        );
        assert_eq!(scene.center(node).unwrap(), Point::new(0.0, 100.0));
    }

    #[test]
    fn test_decoration_target_is_not_moved() {
        let (mut scene, node, bounds) = setup();
        let svg = scene
            .add(ComponentKind::SvgDecoration, node, None, Affine::IDENTITY)
            .unwrap();
        let start = GestureEvent::drag(1, GesturePhase::Started, svg, Vec2::ZERO);
        let mut state = GestureState::new(svg, &start, bounds);
        let mut machine = DragMachine::new();
        run(&mut scene, &mut machine, &mut state, start);
        run(
            &mut scene,
            &mut machine,
            &mut state,
            GestureEvent::drag(1, GesturePhase::Updated, svg, Vec2::new(5.0, 5.0)),
        );
        assert_eq!(scene.center(node).unwrap(), Point::new(100.0, 100.0));
    }
}
