//! Relation edges between idea nodes.
//!
//! An edge is a child of its parent-side node and the child-side node is a
//! child of the edge, so dragging a node carries its whole subtree. The
//! edge's attachment points and adornments are recomputed from the two
//! nodes' boundaries whenever either side moves.

use crate::gesture::GesturePhase;
use crate::geometry::nearest_pair;
use crate::scene::{ComponentId, ComponentKind, Outline, Scene, SceneError, SceneGraph, SceneResult};
use crate::touch::{Compass, TouchSelection, touch_points};
use kurbo::{Affine, Point, Vec2};

/// Radius of the circle drawn at the parent end.
pub const CIRCLE_RADIUS: f64 = 6.0;
/// Side length of the arrowhead image at the child end.
pub const ARROWHEAD_SIZE: f64 = 14.0;
/// Reference direction for arrowhead rotation (screen up).
pub const NORTH: Vec2 = Vec2::new(0.0, -1.0);

/// Geometry and structure of one edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    /// Parent-side node.
    pub parent: ComponentId,
    /// Child-side node.
    pub child: ComponentId,
    /// Container holding the circle and the arrowhead.
    pub adornments: ComponentId,
    pub circle: ComponentId,
    pub arrowhead: ComponentId,
    /// Attachment on the parent node, in the edge's local frame.
    pub parent_point: Point,
    /// Attachment on the child node, in the edge's local frame.
    pub child_point: Point,
    /// Compass slot of each attachment from the last recomputation.
    pub parent_compass: Option<Compass>,
    pub child_compass: Option<Compass>,
    /// Current arrowhead rotation in degrees, clockwise from north.
    pub arrowhead_rotation: f64,
}

/// Connect `child` beneath `parent` with a new edge.
///
/// The child keeps its world position; it is reparented under the edge.
pub fn connect(
    scene: &mut Scene,
    parent: ComponentId,
    child: ComponentId,
) -> SceneResult<ComponentId> {
    for node in [parent, child] {
        if scene.kind(node) != Some(ComponentKind::Node) {
            return Err(SceneError::NotAShape(node));
        }
    }
    if scene.path_to_root(parent).contains(&child) {
        return Err(SceneError::InvalidParent { child, parent });
    }

    let edge = scene.add(ComponentKind::Edge, parent, None, Affine::IDENTITY)?;
    let adornments = scene.add(ComponentKind::Adornments, edge, None, Affine::IDENTITY)?;
    let circle = scene.add(
        ComponentKind::AdornmentImage,
        adornments,
        Some(Outline::circle(CIRCLE_RADIUS)),
        Affine::IDENTITY,
    )?;
    let arrowhead = scene.add(
        ComponentKind::AdornmentImage,
        adornments,
        Some(Outline::Rectangle {
            width: ARROWHEAD_SIZE,
            height: ARROWHEAD_SIZE,
        }),
        Affine::IDENTITY,
    )?;
    scene.reparent(child, edge)?;
    scene.set_relation(
        edge,
        Relation {
            parent,
            child,
            adornments,
            circle,
            arrowhead,
            parent_point: Point::ZERO,
            child_point: Point::ZERO,
            parent_compass: None,
            child_compass: None,
            arrowhead_rotation: 0.0,
        },
    )?;
    update_edge(scene, edge)?;
    log::debug!("Connected {} -> {} via edge {}", parent, child, edge);
    Ok(edge)
}

/// Detach an edge, moving its child node back onto the canvas.
pub fn disconnect(scene: &mut Scene, edge: ComponentId) -> SceneResult<ComponentId> {
    let child = scene.relation(edge).ok_or(SceneError::NotARelation(edge))?.child;
    if scene.parent(child) == Some(edge) {
        scene.reparent(child, scene.canvas())?;
    }
    scene.remove(edge)?;
    Ok(child)
}

/// Whether both ends of the edge are still structurally attached.
pub fn is_attached(scene: &dyn SceneGraph, edge: ComponentId) -> bool {
    scene.relation(edge).is_some_and(|relation| {
        scene.contains(relation.child)
            && scene.parent(relation.child) == Some(edge)
            && scene.parent(edge) == Some(relation.parent)
    })
}

/// Edges touching a node: the one it hangs from and the ones it owns.
pub fn incident_edges(scene: &dyn SceneGraph, node: ComponentId) -> Vec<ComponentId> {
    let mut edges: Vec<ComponentId> = scene
        .parent(node)
        .filter(|&parent| scene.kind(parent) == Some(ComponentKind::Edge))
        .into_iter()
        .collect();
    edges.extend(
        scene
            .children(node)
            .into_iter()
            .filter(|&child| scene.kind(child) == Some(ComponentKind::Edge)),
    );
    edges
}

/// Arrowhead rotation in degrees for a direction vector.
///
/// Measures the unsigned angle to [`NORTH`] and picks the side from the
/// sign of the x component. Returns `None` for a zero-length direction.
pub fn arrowhead_angle(direction: Vec2) -> Option<f64> {
    let length = direction.hypot();
    if length < f64::EPSILON {
        return None;
    }
    let unit = direction / length;
    let angle = unit.dot(NORTH).clamp(-1.0, 1.0).acos().to_degrees();
    if unit.x >= 0.0 { Some(angle) } else { Some(-angle) }
}

/// Recompute an edge's attachment points and adornments.
pub fn update_edge(scene: &mut dyn SceneGraph, edge: ComponentId) -> SceneResult<()> {
    if !is_attached(scene, edge) {
        return Err(SceneError::DetachedRelation(edge));
    }
    let relation = scene.relation(edge).cloned().ok_or(SceneError::NotARelation(edge))?;

    let parent_points = touch_points(scene, relation.parent, TouchSelection::All)?;
    let child_points = touch_points(scene, relation.child, TouchSelection::All)?;
    let Some((pi, ci, parent_world, child_world)) =
        nearest_pair(parent_points.slots(), child_points.slots())
    else {
        return Err(SceneError::NotAShape(relation.child));
    };

    scene.set_center(relation.circle, parent_world)?;
    scene.set_center(relation.arrowhead, child_world)?;

    let to_edge = scene.world_transform(edge)?.inverse();
    let parent_point = to_edge * parent_world;
    let child_point = to_edge * child_world;

    let mut rotation = relation.arrowhead_rotation;
    if let Some(target) = arrowhead_angle(child_point - parent_point) {
        let delta = target - relation.arrowhead_rotation;
        if delta.abs() > f64::EPSILON {
            scene.rotate_about(relation.arrowhead, child_world, delta)?;
        }
        rotation = target;
    }

    if let Some(stored) = scene.relation_mut(edge) {
        stored.parent_point = parent_point;
        stored.child_point = child_point;
        stored.parent_compass = Compass::from_index(pi);
        stored.child_compass = Compass::from_index(ci);
        stored.arrowhead_rotation = rotation;
    }
    Ok(())
}

/// Keeps edges glued to their nodes across the gesture lifecycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationUpdater;

impl RelationUpdater {
    /// React to a lifecycle callback whose current target is an edge.
    ///
    /// Detached edges are skipped without touching siblings.
    pub fn on_gesture(&self, scene: &mut dyn SceneGraph, phase: GesturePhase, edge: ComponentId) {
        if scene.kind(edge) != Some(ComponentKind::Edge) {
            return;
        }
        match update_edge(scene, edge) {
            Ok(()) => {}
            Err(SceneError::DetachedRelation(_)) => {
                log::debug!("Skipping detached edge {} on {:?}", edge, phase);
            }
            Err(e) => {
                log::warn!("Failed to update edge {} on {:?}: {}", edge, phase, e);
            }
        }
    }

    /// Refresh every edge touching a node that just moved.
    pub fn refresh_node(&self, scene: &mut dyn SceneGraph, phase: GesturePhase, node: ComponentId) {
        for edge in incident_edges(scene, node) {
            self.on_gesture(scene, phase, edge);
        }
    }
}
