//! Gesture routing and per-frame driving.
//!
//! The engine owns processor registrations, the state of every active
//! gesture, and the controller stacks of gliding targets. Hosts feed it
//! recognized gesture events and call [`ManipulationEngine::tick`] once per
//! frame. Neither call returns errors: failures are logged and the
//! interactive loop keeps going.

use crate::config::{ConfigError, ManipulationConfig};
use crate::controller::ControllerStack;
use crate::geometry::BorderBounds;
use crate::gesture::{
    DragMachine, GestureEvent, GestureId, GestureKind, GesturePhase, GestureState,
    InertiaController, InertiaState, InterestFilter, RotateMachine, RoutedEvent, clamp_into,
};
use crate::relation::RelationUpdater;
use crate::scene::{ComponentId, SceneGraph, SceneResult};
use std::collections::{HashMap, HashSet};

/// A gesture processor registered on a component.
#[derive(Debug, Clone, PartialEq)]
pub struct Processor {
    pub kind: GestureKind,
    pub filter: InterestFilter,
}

#[derive(Debug, Clone, Copy)]
enum Machine {
    Drag(DragMachine),
    Rotate(RotateMachine),
}

#[derive(Debug, Clone)]
struct ActiveGesture {
    state: GestureState,
    machine: Machine,
}

/// Routes gesture events to constrained drag/rotate behaviour.
#[derive(Debug, Default)]
pub struct ManipulationEngine {
    config: ManipulationConfig,
    processors: HashMap<ComponentId, Vec<Processor>>,
    inertia_targets: HashSet<ComponentId>,
    /// Components kept on screen by [`ManipulationEngine::clamp_all`].
    clampables: Vec<ComponentId>,
    gestures: HashMap<GestureId, ActiveGesture>,
    pending_aborts: HashSet<GestureId>,
    controllers: HashMap<ComponentId, ControllerStack>,
    relations: RelationUpdater,
}

impl ManipulationEngine {
    /// Create an engine with the given tuning.
    pub fn new(config: ManipulationConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ManipulationConfig {
        &self.config
    }

    /// Replace the tuning; running glides keep their parameters.
    ///
    /// Out-of-range values are rejected and the current tuning stays.
    pub fn set_config(&mut self, config: ManipulationConfig) -> Result<(), ConfigError> {
        if let Err(e) = config.validate() {
            log::warn!("Rejected manipulation config: {}", e);
            return Err(e);
        }
        self.config = config;
        Ok(())
    }

    /// Register a processor on a component.
    pub fn register(&mut self, component: ComponentId, kind: GestureKind, filter: InterestFilter) {
        self.processors
            .entry(component)
            .or_default()
            .push(Processor { kind, filter });
    }

    /// Register a plain drag processor (menus, overlays).
    pub fn register_drag(&mut self, component: ComponentId) {
        self.register(component, GestureKind::Drag, InterestFilter::Any);
        self.register_clampable(component);
    }

    /// Register a plain rotate processor.
    pub fn register_rotate(&mut self, component: ComponentId) {
        self.register(component, GestureKind::Rotate, InterestFilter::Any);
        self.register_clampable(component);
    }

    /// Let drags on this component glide after release.
    pub fn enable_inertia(&mut self, component: ComponentId) {
        self.inertia_targets.insert(component);
    }

    /// Add a component to the clamp-all registry.
    pub fn register_clampable(&mut self, component: ComponentId) {
        if !self.clampables.contains(&component) {
            self.clampables.push(component);
        }
    }

    /// Standard idea-node behaviour.
    ///
    /// Topmost nodes drag and rotate their whole subtree; nested nodes drag
    /// on their own. Edges never start node drags.
    pub fn install_node_behaviors(&mut self, node: ComponentId) {
        self.register(node, GestureKind::Drag, InterestFilter::topmost_node_drag());
        self.register(node, GestureKind::Drag, InterestFilter::nested_node_drag());
        self.register(node, GestureKind::Rotate, InterestFilter::topmost_node_drag());
        self.enable_inertia(node);
        self.register_clampable(node);
    }

    /// Forget everything registered on a component.
    pub fn unregister(&mut self, component: ComponentId) {
        self.processors.remove(&component);
        self.inertia_targets.remove(&component);
        self.clampables.retain(|&c| c != component);
        self.controllers.remove(&component);
        self.gestures.retain(|_, g| g.state.target != component);
    }

    /// Skip the transform of the next update of a gesture.
    pub fn abort(&mut self, gesture: GestureId) {
        if self.gestures.contains_key(&gesture) {
            self.pending_aborts.insert(gesture);
        }
    }

    /// Whether a gesture is in flight.
    pub fn is_active(&self, gesture: GestureId) -> bool {
        self.gestures.contains_key(&gesture)
    }

    /// Number of gestures in flight.
    pub fn active_gestures(&self) -> usize {
        self.gestures.len()
    }

    /// Whether a target is currently gliding.
    pub fn has_inertia(&self, target: ComponentId) -> bool {
        self.controllers
            .get(&target)
            .is_some_and(|stack| stack.contains(InertiaController::NAME))
    }

    /// Controller stack of a target, created on demand.
    pub fn controllers_mut(&mut self, target: ComponentId) -> &mut ControllerStack {
        self.controllers.entry(target).or_default()
    }

    /// Current clamp bounds for a scene.
    pub fn bounds(&self, scene: &dyn SceneGraph) -> BorderBounds {
        BorderBounds::from_viewport(scene.viewport(), self.config.border_margin)
    }

    /// Find the component whose processor takes this event.
    ///
    /// Walks from the original target up to the root; the first component
    /// with an accepting processor of the right kind wins.
    pub fn route(&self, scene: &dyn SceneGraph, event: &GestureEvent) -> Option<ComponentId> {
        scene.path_to_root(event.original_target).into_iter().find(|&component| {
            self.processors.get(&component).is_some_and(|processors| {
                let routed = RoutedEvent {
                    event,
                    current_target: component,
                };
                processors
                    .iter()
                    .any(|p| p.kind == event.kind && p.filter.accepts(scene, &routed))
            })
        })
    }

    /// Process one gesture event.
    pub fn handle(&mut self, scene: &mut dyn SceneGraph, event: &GestureEvent) {
        let routed = self.route(scene, event);
        let mut event = event.clone();
        if event.phase == GesturePhase::Updated && self.pending_aborts.remove(&event.id) {
            event.aborted = true;
        }

        let mut active = match self.gestures.remove(&event.id) {
            Some(mut active) if event.phase != GesturePhase::Started => {
                if routed.is_some_and(|t| t != active.state.target) {
                    log::debug!(
                        "Gesture {} rerouted to {:?}; keeping {}",
                        event.id,
                        routed,
                        active.state.target
                    );
                }
                let transforms =
                    matches!(event.phase, GesturePhase::Updated | GesturePhase::Resumed);
                if routed.is_none() && transforms {
                    log::debug!(
                        "Gesture {} no longer accepted; skipping {:?}",
                        event.id,
                        event.phase
                    );
                    event.aborted = true;
                }
                if event.phase == GesturePhase::Resumed {
                    active.state.bounds = self.bounds(scene);
                }
                active.state.record(&event);
                active
            }
            _ => match routed {
                Some(target) if !event.phase.is_final() => self.begin(scene, target, &event),
                _ => {
                    log::debug!(
                        "Ignoring {:?} {:?} for {}",
                        event.kind,
                        event.phase,
                        event.original_target
                    );
                    return;
                }
            },
        };

        let target = active.state.target;
        if let Err(e) = Self::apply(&mut active, scene, &event) {
            log::warn!("Gesture {} on {} failed: {}", event.id, target, e);
        }
        self.relations.refresh_node(scene, event.phase, target);

        if event.phase.is_final() {
            self.pending_aborts.remove(&event.id);
            if event.phase == GesturePhase::Ended && active.state.kind == GestureKind::Drag {
                self.start_inertia(&active.state);
            }
        } else {
            self.gestures.insert(event.id, active);
        }
    }

    fn begin(
        &mut self,
        scene: &mut dyn SceneGraph,
        target: ComponentId,
        event: &GestureEvent,
    ) -> ActiveGesture {
        if let Some(stack) = self.controllers.get_mut(&target) {
            if stack.remove_named(InertiaController::NAME) > 0 {
                log::debug!("Touch stopped inertia on {}", target);
            }
        }
        let state = GestureState::new(target, event, self.bounds(scene));
        let machine = match event.kind {
            GestureKind::Drag => Machine::Drag(DragMachine::new()),
            GestureKind::Rotate => Machine::Rotate(RotateMachine::new()),
        };
        ActiveGesture { state, machine }
    }

    fn apply(
        active: &mut ActiveGesture,
        scene: &mut dyn SceneGraph,
        event: &GestureEvent,
    ) -> SceneResult<()> {
        match &mut active.machine {
            Machine::Drag(machine) => machine.on_event(scene, &active.state, event),
            Machine::Rotate(machine) => machine.on_event(scene, &active.state, event),
        }
    }

    fn start_inertia(&mut self, state: &GestureState) {
        if !self.config.inertia_enabled || !self.inertia_targets.contains(&state.target) {
            return;
        }
        let release = state.velocity.velocity(self.config.velocity_window_ms);
        let inertia = InertiaState::from_release(release, &self.config);
        if let Some(controller) = InertiaController::new(inertia) {
            log::debug!("Inertia on {} from {:?}", state.target, inertia.velocity);
            self.controllers_mut(state.target).push(Box::new(controller));
        }
    }

    /// Advance every controller stack by one frame.
    pub fn tick(&mut self, scene: &mut dyn SceneGraph) {
        let bounds = self.bounds(scene);
        for (&target, stack) in self.controllers.iter_mut() {
            if !scene.contains(target) {
                log::debug!("Dropping controllers of removed component {}", target);
                *stack = ControllerStack::new();
                continue;
            }
            stack.tick(scene, target, &bounds);
            self.relations.refresh_node(scene, GesturePhase::Updated, target);
        }
        self.controllers.retain(|_, stack| !stack.is_empty());
    }

    /// Snap every registered clampable component back on screen.
    ///
    /// Used after viewport changes. Returns the components that moved.
    pub fn clamp_all(&mut self, scene: &mut dyn SceneGraph) -> Vec<ComponentId> {
        let bounds = self.bounds(scene);
        self.clampables.retain(|&c| scene.contains(c));
        let mut moved = Vec::new();
        for &component in &self.clampables {
            if let Some(target) = clamp_into(scene, component, &bounds) {
                self.relations.refresh_node(scene, GesturePhase::Ended, target);
                moved.push(target);
            }
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::connect;
    use crate::scene::{Capabilities, ComponentKind, Outline, Scene};
    use kurbo::{Affine, Point, Rect, Vec2};

    fn scene() -> Scene {
        Scene::new(Rect::new(0.0, 0.0, 400.0, 300.0))
    }

    fn drag(
        id: GestureId,
        phase: GesturePhase,
        target: ComponentId,
        dx: f64,
        dy: f64,
    ) -> GestureEvent {
        GestureEvent::drag(id, phase, target, Vec2::new(dx, dy))
    }

    /// Start a drag on `target` and move it right by `steps` cursor samples
    /// of 10 units every 16 ms, starting from `x`.
    fn swipe(
        engine: &mut ManipulationEngine,
        scene: &mut Scene,
        target: ComponentId,
        x: f64,
        steps: usize,
    ) -> (f64, f64) {
        let start = drag(1, GesturePhase::Started, target, 0.0, 0.0)
            .with_cursor(Point::new(x, 150.0), 0.0);
        engine.handle(scene, &start);
        let mut last = (x, 0.0);
        for i in 1..=steps {
            last = (x + 10.0 * i as f64, 16.0 * i as f64);
            let update = drag(1, GesturePhase::Updated, target, 10.0, 0.0)
                .with_cursor(Point::new(last.0, 150.0), last.1);
            engine.handle(scene, &update);
        }
        last
    }

    #[test]
    fn test_unregistered_target_is_ignored() {
        let mut scene = scene();
        let node = scene.add_node(Point::new(50.0, 50.0), Outline::circle(10.0)).unwrap();
        let mut engine = ManipulationEngine::default();
        engine.handle(&mut scene, &drag(1, GesturePhase::Started, node, 0.0, 0.0));
        assert!(!engine.is_active(1));
    }

    #[test]
    fn test_concurrent_gestures_keep_separate_state() {
        let mut scene = scene();
        let a = scene.add_node(Point::new(50.0, 50.0), Outline::circle(10.0)).unwrap();
        let b = scene.add_node(Point::new(200.0, 200.0), Outline::circle(10.0)).unwrap();
        let mut engine = ManipulationEngine::default();
        engine.install_node_behaviors(a);
        engine.install_node_behaviors(b);

        engine.handle(&mut scene, &drag(1, GesturePhase::Started, a, 0.0, 0.0));
        engine.handle(&mut scene, &drag(2, GesturePhase::Started, b, 0.0, 0.0));
        assert_eq!(engine.active_gestures(), 2);

        engine.handle(&mut scene, &drag(1, GesturePhase::Updated, a, 10.0, 0.0));
        engine.handle(&mut scene, &drag(2, GesturePhase::Updated, b, 0.0, -20.0));
        engine.handle(&mut scene, &drag(1, GesturePhase::Ended, a, 0.0, 0.0));

        assert_eq!(scene.center(a).unwrap(), Point::new(60.0, 50.0));
        assert_eq!(scene.center(b).unwrap(), Point::new(200.0, 180.0));
        assert!(!engine.is_active(1));
        assert!(engine.is_active(2));
    }

    #[test]
    fn test_abort_skips_one_update() {
        let mut scene = scene();
        let a = scene.add_node(Point::new(50.0, 50.0), Outline::circle(10.0)).unwrap();
        let mut engine = ManipulationEngine::default();
        engine.install_node_behaviors(a);

        engine.handle(&mut scene, &drag(1, GesturePhase::Started, a, 0.0, 0.0));
        engine.abort(1);
        engine.handle(&mut scene, &drag(1, GesturePhase::Updated, a, 10.0, 0.0));
        assert_eq!(scene.center(a).unwrap(), Point::new(50.0, 50.0));
        engine.handle(&mut scene, &drag(1, GesturePhase::Updated, a, 10.0, 0.0));
        assert_eq!(scene.center(a).unwrap(), Point::new(60.0, 50.0));
    }

    #[test]
    fn test_release_velocity_starts_glide() {
        let mut scene = scene();
        let a = scene.add_node(Point::new(50.0, 150.0), Outline::circle(10.0)).unwrap();
        let mut engine = ManipulationEngine::default();
        engine.install_node_behaviors(a);

        let (x, t) = swipe(&mut engine, &mut scene, a, 50.0, 5);
        let end =
            drag(1, GesturePhase::Ended, a, 0.0, 0.0).with_cursor(Point::new(x, 150.0), t + 16.0);
        engine.handle(&mut scene, &end);
        assert!(engine.has_inertia(a));

        let released = scene.center(a).unwrap();
        engine.tick(&mut scene);
        let moved = scene.center(a).unwrap();
        assert!(moved.x > released.x);
        assert!((moved.y - released.y).abs() < 1e-9);

        for _ in 0..500 {
            engine.tick(&mut scene);
        }
        assert!(!engine.has_inertia(a));
    }

    #[test]
    fn test_resume_keeps_velocity_and_state() {
        let mut scene = scene();
        let a = scene.add_node(Point::new(50.0, 150.0), Outline::circle(10.0)).unwrap();
        let mut engine = ManipulationEngine::default();
        engine.install_node_behaviors(a);

        let (x, t) = swipe(&mut engine, &mut scene, a, 50.0, 4);
        let resume = drag(1, GesturePhase::Resumed, a, 0.0, 0.0)
            .with_cursor(Point::new(x, 150.0), t + 16.0);
        engine.handle(&mut scene, &resume);
        assert!(engine.is_active(1));
        assert_eq!(scene.center(a).unwrap(), Point::new(90.0, 150.0));

        let end =
            drag(1, GesturePhase::Ended, a, 0.0, 0.0).with_cursor(Point::new(x, 150.0), t + 32.0);
        engine.handle(&mut scene, &end);
        assert!(!engine.is_active(1));
        assert!(engine.has_inertia(a));
    }

    #[test]
    fn test_resume_takes_current_viewport() {
        let mut scene = scene();
        let a = scene.add_node(Point::new(50.0, 150.0), Outline::circle(10.0)).unwrap();
        let mut engine = ManipulationEngine::default();
        engine.install_node_behaviors(a);

        engine.handle(&mut scene, &drag(1, GesturePhase::Started, a, 0.0, 0.0));
        scene.set_viewport(Rect::new(0.0, 0.0, 100.0, 300.0));
        engine.handle(&mut scene, &drag(1, GesturePhase::Resumed, a, 0.0, 0.0));
        engine.handle(&mut scene, &drag(1, GesturePhase::Updated, a, 200.0, 0.0));
        assert_eq!(scene.center(a).unwrap(), Point::new(100.0, 150.0));
    }

    #[test]
    fn test_unrouted_resume_still_ends_with_clamp() {
        let mut scene = scene();
        let p = scene.add_node(Point::new(200.0, 150.0), Outline::circle(10.0)).unwrap();
        let a = scene.add_node(Point::new(50.0, 150.0), Outline::circle(10.0)).unwrap();
        let mut engine = ManipulationEngine::default();
        engine.register(a, GestureKind::Drag, InterestFilter::topmost_node_drag());

        engine.handle(&mut scene, &drag(1, GesturePhase::Started, a, 0.0, 0.0));
        connect(&mut scene, p, a).unwrap();
        assert_eq!(engine.route(&scene, &drag(1, GesturePhase::Resumed, a, 0.0, 0.0)), None);

        engine.handle(&mut scene, &drag(1, GesturePhase::Resumed, a, 0.0, 0.0));
        assert!(engine.is_active(1));
        engine.handle(&mut scene, &drag(1, GesturePhase::Updated, a, 30.0, 0.0));
        assert_eq!(scene.center(a).unwrap(), Point::new(50.0, 150.0));

        scene.translate(a, Vec2::new(-500.0, 0.0)).unwrap();
        engine.handle(&mut scene, &drag(1, GesturePhase::Ended, a, 0.0, 0.0));
        assert!(!engine.is_active(1));
        assert_eq!(scene.center(a).unwrap(), Point::new(0.0, 150.0));
    }

    #[test]
    fn test_new_touch_stops_glide() {
        let mut scene = scene();
        let a = scene.add_node(Point::new(50.0, 150.0), Outline::circle(10.0)).unwrap();
        let mut engine = ManipulationEngine::default();
        engine.install_node_behaviors(a);
        let glide = InertiaController::new(InertiaState {
            velocity: Vec2::new(5.0, 0.0),
            damping: 0.85,
            epsilon: 0.05,
        })
        .unwrap();
        engine.controllers_mut(a).push(Box::new(glide));
        assert!(engine.has_inertia(a));

        engine.handle(&mut scene, &drag(9, GesturePhase::Started, a, 0.0, 0.0));
        assert!(!engine.has_inertia(a));
    }

    #[test]
    fn test_overlay_drag_and_exemption() {
        let mut scene = scene();
        let canvas = scene.canvas();
        let keyboard_outline = Outline::Rectangle {
            width: 100.0,
            height: 40.0,
        };
        let keyboard = scene
            .add(
                ComponentKind::Overlay,
                canvas,
                Some(keyboard_outline),
                Affine::translate((200.0, 250.0)),
            )
            .unwrap();
        let key = scene
            .add(ComponentKind::TextArea, keyboard, None, Affine::IDENTITY)
            .unwrap();
        let qr = scene
            .add_with_capabilities(
                ComponentKind::Overlay,
                Capabilities::for_kind(ComponentKind::Overlay).with_clamp_exempt(),
                canvas,
                Some(Outline::Rectangle {
                    width: 50.0,
                    height: 50.0,
                }),
                Affine::translate((200.0, 250.0)),
            )
            .unwrap();
        let mut engine = ManipulationEngine::default();
        engine.register_drag(keyboard);
        engine.register_drag(qr);

        engine.handle(&mut scene, &drag(1, GesturePhase::Started, key, 0.0, 0.0));
        engine.handle(&mut scene, &drag(1, GesturePhase::Updated, key, 0.0, 100.0));
        assert_eq!(scene.center(keyboard).unwrap(), Point::new(200.0, 300.0));

        engine.handle(&mut scene, &drag(2, GesturePhase::Started, qr, 0.0, 0.0));
        engine.handle(&mut scene, &drag(2, GesturePhase::Updated, qr, 0.0, 100.0));
        engine.handle(&mut scene, &drag(2, GesturePhase::Ended, qr, 0.0, 0.0));
        assert_eq!(scene.center(qr).unwrap(), Point::new(200.0, 350.0));
    }

    #[test]
    fn test_clamp_all_after_viewport_shrink() {
        let mut scene = scene();
        let a = scene.add_node(Point::new(350.0, 250.0), Outline::circle(10.0)).unwrap();
        let b = scene.add_node(Point::new(50.0, 50.0), Outline::circle(10.0)).unwrap();
        let mut engine = ManipulationEngine::new(ManipulationConfig {
            border_margin: 10.0,
            ..ManipulationConfig::default()
        });
        engine.install_node_behaviors(a);
        engine.install_node_behaviors(b);

        scene.set_viewport(Rect::new(0.0, 0.0, 200.0, 200.0));
        assert_eq!(engine.clamp_all(&mut scene), vec![a]);
        assert_eq!(scene.center(a).unwrap(), Point::new(190.0, 190.0));
        assert_eq!(scene.center(b).unwrap(), Point::new(50.0, 50.0));
    }

    #[test]
    fn test_set_config_rejects_invalid_values() {
        let mut engine = ManipulationEngine::default();
        let stalled = ManipulationConfig {
            damping: 1.0,
            ..ManipulationConfig::default()
        };
        let err = engine.set_config(stalled).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "damping", .. }));
        assert_eq!(engine.config(), &ManipulationConfig::default());

        let tighter = ManipulationConfig {
            border_margin: 5.0,
            ..ManipulationConfig::default()
        };
        engine.set_config(tighter.clone()).unwrap();
        assert_eq!(engine.config(), &tighter);
    }

    #[test]
    fn test_unregister_drops_everything() {
        let mut scene = scene();
        let a = scene.add_node(Point::new(50.0, 50.0), Outline::circle(10.0)).unwrap();
        let mut engine = ManipulationEngine::default();
        engine.install_node_behaviors(a);
        engine.handle(&mut scene, &drag(1, GesturePhase::Started, a, 0.0, 0.0));
        engine.unregister(a);
        assert_eq!(engine.active_gestures(), 0);
        let restart = drag(2, GesturePhase::Started, a, 0.0, 0.0);
        assert_eq!(engine.route(&scene, &restart), None);
    }
}
