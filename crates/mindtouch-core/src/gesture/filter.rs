//! Interest filters deciding whether a processor reacts to an event.
//!
//! Filters are evaluated for every event against the live hierarchy, since
//! edges can be added or removed between gestures.

use super::RoutedEvent;
use crate::scene::{ComponentId, ComponentKind, SceneGraph};

/// Predicate over a routed event and the component hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub enum InterestFilter {
    /// Accept everything.
    Any,
    /// Only the topmost node of a connected component (or its decorations).
    TopmostNode,
    /// Reject events on edges or their adornments.
    ExcludeEdges,
    Not(Box<InterestFilter>),
    All(Vec<InterestFilter>),
}

impl InterestFilter {
    /// Drag filter for whole-tree moves.
    pub fn topmost_node_drag() -> Self {
        Self::All(vec![Self::ExcludeEdges, Self::TopmostNode])
    }

    /// Drag filter for moving a nested node on its own.
    pub fn nested_node_drag() -> Self {
        Self::All(vec![Self::ExcludeEdges, Self::Not(Box::new(Self::TopmostNode))])
    }

    /// Evaluate the filter.
    pub fn accepts(&self, scene: &dyn SceneGraph, routed: &RoutedEvent<'_>) -> bool {
        match self {
            Self::Any => true,
            Self::TopmostNode => accepts_topmost(scene, routed),
            Self::ExcludeEdges => {
                !is_edge_part(scene, routed.current_target)
                    && !is_edge_part(scene, routed.event.original_target)
            }
            Self::Not(inner) => !inner.accepts(scene, routed),
            Self::All(filters) => filters.iter().all(|f| f.accepts(scene, routed)),
        }
    }
}

/// Whether a node hangs directly off the canvas.
pub fn is_topmost_node(scene: &dyn SceneGraph, id: ComponentId) -> bool {
    scene.kind(id) == Some(ComponentKind::Node)
        && scene
            .parent(id)
            .is_some_and(|parent| scene.kind(parent) == Some(ComponentKind::Canvas))
}

fn accepts_topmost(scene: &dyn SceneGraph, routed: &RoutedEvent<'_>) -> bool {
    if is_topmost_node(scene, routed.current_target) {
        return true;
    }
    let original = routed.event.original_target;
    let is_decoration = scene.capabilities(original).is_some_and(|caps| caps.decoration);
    is_decoration
        && scene
            .ancestor_of_kind(original, ComponentKind::Node)
            .is_some_and(|node| is_topmost_node(scene, node))
}

/// Whether a component is an edge, an adornments container, or inside one.
fn is_edge_part(scene: &dyn SceneGraph, id: ComponentId) -> bool {
    for ancestor in scene.path_to_root(id) {
        match scene.kind(ancestor) {
            Some(ComponentKind::Edge | ComponentKind::Adornments) => return true,
            // Anything under a node belongs to the node, not the edge above it.
            Some(ComponentKind::Node) => return false,
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{GestureEvent, GesturePhase};
    use crate::relation::connect;
    use crate::scene::{Outline, Scene};
    use kurbo::{Affine, Point, Rect, Vec2};

    struct Fixture {
        scene: Scene,
        a: ComponentId,
        a_content: ComponentId,
        b: ComponentId,
        b_content: ComponentId,
        edge: ComponentId,
    }

    fn fixture() -> Fixture {
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        let a = scene.add_node(Point::new(100.0, 100.0), Outline::circle(30.0)).unwrap();
        let b = scene.add_node(Point::new(300.0, 200.0), Outline::circle(30.0)).unwrap();
        let a_content = scene.add(ComponentKind::NodeContent, a, None, Affine::IDENTITY).unwrap();
        let b_content = scene.add(ComponentKind::NodeContent, b, None, Affine::IDENTITY).unwrap();
        let edge = connect(&mut scene, a, b).unwrap();
        Fixture {
            scene,
            a,
            a_content,
            b,
            b_content,
            edge,
        }
    }

    fn check(
        filter: &InterestFilter,
        scene: &Scene,
        original: ComponentId,
        current: ComponentId,
    ) -> bool {
        let event = GestureEvent::drag(1, GesturePhase::Updated, original, Vec2::new(1.0, 0.0));
        filter.accepts(
            scene,
            &RoutedEvent {
                event: &event,
                current_target: current,
            },
        )
    }

    #[test]
    fn test_topmost_rejects_nested_content() {
        let f = fixture();
        let filter = InterestFilter::TopmostNode;
        assert!(!check(&filter, &f.scene, f.b_content, f.b_content));
        assert!(!check(&filter, &f.scene, f.b_content, f.b));
        assert!(check(&filter, &f.scene, f.a_content, f.a_content));
        assert!(check(&filter, &f.scene, f.a_content, f.a));
    }

    #[test]
    fn test_topmost_follows_hierarchy_changes() {
        let mut f = fixture();
        let filter = InterestFilter::TopmostNode;
        assert!(!check(&filter, &f.scene, f.b, f.b));
        let canvas = f.scene.canvas();
        f.scene.reparent(f.b, canvas).unwrap();
        assert!(check(&filter, &f.scene, f.b, f.b));
    }

    #[test]
    fn test_exclude_edges() {
        let f = fixture();
        let filter = InterestFilter::ExcludeEdges;
        let relation = f.scene.relation(f.edge).unwrap().clone();
        assert!(!check(&filter, &f.scene, f.edge, f.edge));
        assert!(!check(&filter, &f.scene, relation.adornments, relation.adornments));
        assert!(!check(&filter, &f.scene, relation.arrowhead, f.a));
        assert!(check(&filter, &f.scene, f.b_content, f.b));
        assert!(check(&filter, &f.scene, f.a, f.a));
    }

    #[test]
    fn test_composite_drag_filters_partition_nodes() {
        let f = fixture();
        let whole = InterestFilter::topmost_node_drag();
        let nested = InterestFilter::nested_node_drag();
        assert!(whole.accepts(
            &f.scene,
            &RoutedEvent {
                event: &GestureEvent::drag(1, GesturePhase::Started, f.a_content, Vec2::ZERO),
                current_target: f.a,
            }
        ));
        assert!(!check(&nested, &f.scene, f.a_content, f.a));
        assert!(!check(&whole, &f.scene, f.b_content, f.b));
        assert!(check(&nested, &f.scene, f.b_content, f.b));
        assert!(check(&InterestFilter::Any, &f.scene, f.edge, f.edge));
    }
}
