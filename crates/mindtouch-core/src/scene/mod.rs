//! Scene graph interface consumed by the manipulation engine.
//!
//! The engine never owns shapes. It reads and mutates transforms through
//! [`SceneGraph`], which hosts implement over their own retained-mode graph.
//! [`Scene`] is an in-process arena implementation.

mod arena;

pub use arena::Scene;

use crate::relation::Relation;
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for scene components.
pub type ComponentId = Uuid;

/// Scene errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    #[error("Unknown component: {0}")]
    UnknownComponent(ComponentId),
    #[error("Component {0} has no outline")]
    NotAShape(ComponentId),
    #[error("Component {0} is not a relation edge")]
    NotARelation(ComponentId),
    #[error("Relation {0} is no longer attached to both nodes")]
    DetachedRelation(ComponentId),
    #[error("Invalid parent for {child}: {parent}")]
    InvalidParent { child: ComponentId, parent: ComponentId },
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// The closed set of component categories the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Root of the scene; the visible canvas.
    Canvas,
    /// An idea node.
    Node,
    /// Content holder inside a node (text, image).
    NodeContent,
    /// A relation edge between a parent node and a child node.
    Edge,
    /// Container for an edge's circle and arrowhead.
    Adornments,
    /// Circle or arrowhead image inside an adornments container.
    AdornmentImage,
    /// Holder of touch-point markers on a shape.
    MarkerContainer,
    /// A single touch-point marker.
    Marker,
    /// Visual handle drawn on a marker.
    HandleImage,
    /// SVG decoration drawn on top of a shape.
    SvgDecoration,
    /// Editable text area inside a shape.
    TextArea,
    /// Radial context menu.
    CircularMenu,
    /// Free floating overlay (keyboard, file list, QR code).
    Overlay,
}

/// Capability tags attached to components.
///
/// Routing and clamping consult these tags instead of walking
/// ancestor type chains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Independently positionable and kept inside the viewport.
    pub clampable: bool,
    /// Never clamped, even when `clampable` is set.
    pub clamp_exempt: bool,
    /// Accepts translation from gestures.
    pub draggable: bool,
    /// Accepts rotation from gestures.
    pub rotatable: bool,
    /// Child decoration; routing decisions defer to its node ancestor.
    pub decoration: bool,
}

impl Capabilities {
    /// No capabilities.
    pub const NONE: Self = Self {
        clampable: false,
        clamp_exempt: false,
        draggable: false,
        rotatable: false,
        decoration: false,
    };

    /// Default capabilities for a component kind.
    pub fn for_kind(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Node => Self {
                clampable: true,
                draggable: true,
                rotatable: true,
                ..Self::NONE
            },
            ComponentKind::CircularMenu | ComponentKind::Overlay => Self {
                clampable: true,
                draggable: true,
                ..Self::NONE
            },
            ComponentKind::MarkerContainer
            | ComponentKind::NodeContent
            | ComponentKind::SvgDecoration
            | ComponentKind::TextArea => Self {
                decoration: true,
                ..Self::NONE
            },
            _ => Self::NONE,
        }
    }

    /// Opt out of border clamping.
    pub fn with_clamp_exempt(mut self) -> Self {
        self.clamp_exempt = true;
        self
    }
}

/// Local geometry of a shape, centred on the local origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Outline {
    Ellipse { radius_x: f64, radius_y: f64 },
    Rectangle { width: f64, height: f64 },
}

impl Outline {
    /// A circle with the given radius.
    pub fn circle(radius: f64) -> Self {
        Self::Ellipse {
            radius_x: radius,
            radius_y: radius,
        }
    }

    /// Local-space bounds.
    pub fn local_bounds(&self) -> Rect {
        let (half_w, half_h) = match *self {
            Outline::Ellipse { radius_x, radius_y } => (radius_x, radius_y),
            Outline::Rectangle { width, height } => (width / 2.0, height / 2.0),
        };
        Rect::new(-half_w, -half_h, half_w, half_h)
    }
}

/// Scene graph operations the engine consumes.
///
/// All positions are world space unless stated otherwise. Transform
/// mutators take effect immediately; there is no queuing.
pub trait SceneGraph {
    /// The root canvas component.
    fn canvas(&self) -> ComponentId;

    /// Current visible area in world coordinates.
    fn viewport(&self) -> Rect;

    /// Kind of a component, if it exists.
    fn kind(&self, id: ComponentId) -> Option<ComponentKind>;

    /// Capability tags of a component.
    fn capabilities(&self, id: ComponentId) -> Option<Capabilities>;

    /// Structural parent.
    fn parent(&self, id: ComponentId) -> Option<ComponentId>;

    /// Ordered children.
    fn children(&self, id: ComponentId) -> Vec<ComponentId>;

    /// Shape outline for components that have one.
    fn outline(&self, id: ComponentId) -> Option<Outline>;

    /// Transform relative to the parent.
    fn local_transform(&self, id: ComponentId) -> SceneResult<Affine>;

    /// Replace the transform relative to the parent.
    fn set_local_transform(&mut self, id: ComponentId, transform: Affine) -> SceneResult<()>;

    /// Raise a component to the top of its siblings' paint order.
    fn bring_to_front(&mut self, id: ComponentId) -> SceneResult<()>;

    /// Relation payload of an edge.
    fn relation(&self, id: ComponentId) -> Option<&Relation>;

    /// Mutable relation payload of an edge.
    fn relation_mut(&mut self, id: ComponentId) -> Option<&mut Relation>;

    /// Whether the component exists.
    fn contains(&self, id: ComponentId) -> bool {
        self.kind(id).is_some()
    }

    /// Local-to-world transform.
    fn world_transform(&self, id: ComponentId) -> SceneResult<Affine> {
        let mut transform = self.local_transform(id)?;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            transform = self.local_transform(parent)? * transform;
            current = self.parent(parent);
        }
        Ok(transform)
    }

    /// Transform of the parent frame (identity for the root).
    fn parent_world_transform(&self, id: ComponentId) -> SceneResult<Affine> {
        if !self.contains(id) {
            return Err(SceneError::UnknownComponent(id));
        }
        match self.parent(id) {
            Some(parent) => self.world_transform(parent),
            None => Ok(Affine::IDENTITY),
        }
    }

    /// World-space center (the local origin).
    fn center(&self, id: ComponentId) -> SceneResult<Point> {
        Ok(self.world_transform(id)? * Point::ZERO)
    }

    /// Axis-aligned world bounds of the outline.
    fn world_bounds(&self, id: ComponentId) -> SceneResult<Rect> {
        let outline = self.outline(id).ok_or(SceneError::NotAShape(id))?;
        Ok(self.world_transform(id)?.transform_rect_bbox(outline.local_bounds()))
    }

    /// Translate by a world-space vector.
    fn translate(&mut self, id: ComponentId, delta: Vec2) -> SceneResult<()> {
        let local_delta = to_frame(self.parent_world_transform(id)?.inverse(), delta);
        let local = self.local_transform(id)?;
        self.set_local_transform(id, Affine::translate(local_delta) * local)
    }

    /// Rotate about a world-space point by `degrees` (clockwise on screen).
    fn rotate_about(&mut self, id: ComponentId, pivot: Point, degrees: f64) -> SceneResult<()> {
        let parent = self.parent_world_transform(id)?;
        let world = parent * self.local_transform(id)?;
        let rotated = Affine::rotate_about(degrees.to_radians(), pivot) * world;
        self.set_local_transform(id, parent.inverse() * rotated)
    }

    /// Move so that the world center lands on `center`.
    fn set_center(&mut self, id: ComponentId, center: Point) -> SceneResult<()> {
        let current = self.center(id)?;
        self.translate(id, center - current)
    }

    /// Nearest ancestor (excluding `id`) of the given kind.
    fn ancestor_of_kind(&self, id: ComponentId, kind: ComponentKind) -> Option<ComponentId> {
        let mut current = self.parent(id);
        while let Some(candidate) = current {
            if self.kind(candidate) == Some(kind) {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }

    /// Ancestor chain starting at `id` itself and ending at the root.
    fn path_to_root(&self, id: ComponentId) -> Vec<ComponentId> {
        let mut path = Vec::new();
        let mut current = self.contains(id).then_some(id);
        while let Some(candidate) = current {
            path.push(candidate);
            current = self.parent(candidate);
        }
        path
    }
}

/// Map a vector through the linear part of a transform.
pub fn to_frame(transform: Affine, v: Vec2) -> Vec2 {
    (transform * v.to_point()) - (transform * Point::ZERO)
}
