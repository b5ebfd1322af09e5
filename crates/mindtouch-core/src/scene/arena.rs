//! Arena-backed scene graph.

use super::{Capabilities, ComponentId, ComponentKind, Outline, SceneError, SceneGraph, SceneResult};
use crate::relation::Relation;
use kurbo::{Affine, Point, Rect};
use std::collections::HashMap;
use uuid::Uuid;

/// A single component in the arena.
#[derive(Debug, Clone)]
struct Component {
    kind: ComponentKind,
    capabilities: Capabilities,
    outline: Option<Outline>,
    parent: Option<ComponentId>,
    /// Children in paint order (back to front).
    children: Vec<ComponentId>,
    transform: Affine,
    relation: Option<Relation>,
}

/// In-process scene graph holding components keyed by id.
#[derive(Debug, Clone)]
pub struct Scene {
    canvas: ComponentId,
    viewport: Rect,
    components: HashMap<ComponentId, Component>,
}

impl Scene {
    /// Create a scene whose canvas covers `viewport`.
    pub fn new(viewport: Rect) -> Self {
        let canvas = Uuid::new_v4();
        let mut components = HashMap::new();
        components.insert(
            canvas,
            Component {
                kind: ComponentKind::Canvas,
                capabilities: Capabilities::NONE,
                outline: Some(Outline::Rectangle {
                    width: viewport.width(),
                    height: viewport.height(),
                }),
                parent: None,
                children: Vec::new(),
                transform: Affine::IDENTITY,
                relation: None,
            },
        );
        Self {
            canvas,
            viewport,
            components,
        }
    }

    /// Resize the visible area.
    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    /// Add a component with the default capabilities of its kind.
    ///
    /// `transform` is relative to `parent`.
    pub fn add(
        &mut self,
        kind: ComponentKind,
        parent: ComponentId,
        outline: Option<Outline>,
        transform: Affine,
    ) -> SceneResult<ComponentId> {
        self.add_with_capabilities(kind, Capabilities::for_kind(kind), parent, outline, transform)
    }

    /// Add a component with explicit capabilities.
    pub fn add_with_capabilities(
        &mut self,
        kind: ComponentKind,
        capabilities: Capabilities,
        parent: ComponentId,
        outline: Option<Outline>,
        transform: Affine,
    ) -> SceneResult<ComponentId> {
        let id = Uuid::new_v4();
        self.components
            .get_mut(&parent)
            .ok_or(SceneError::UnknownComponent(parent))?
            .children
            .push(id);
        self.components.insert(
            id,
            Component {
                kind,
                capabilities,
                outline,
                parent: Some(parent),
                children: Vec::new(),
                transform,
                relation: None,
            },
        );
        Ok(id)
    }

    /// Add a node at a world-space center directly on the canvas.
    pub fn add_node(&mut self, center: Point, outline: Outline) -> SceneResult<ComponentId> {
        self.add(
            ComponentKind::Node,
            self.canvas,
            Some(outline),
            Affine::translate(center.to_vec2()),
        )
    }

    /// Replace the capability tags of a component.
    pub fn set_capabilities(
        &mut self,
        id: ComponentId,
        capabilities: Capabilities,
    ) -> SceneResult<()> {
        self.get_mut(id)?.capabilities = capabilities;
        Ok(())
    }

    /// Attach a relation payload to an edge component.
    pub fn set_relation(&mut self, id: ComponentId, relation: Relation) -> SceneResult<()> {
        let component = self.get_mut(id)?;
        if component.kind != ComponentKind::Edge {
            return Err(SceneError::NotARelation(id));
        }
        component.relation = Some(relation);
        Ok(())
    }

    /// Move a component under a new parent, keeping its world transform.
    pub fn reparent(&mut self, id: ComponentId, new_parent: ComponentId) -> SceneResult<()> {
        if !self.components.contains_key(&new_parent) {
            return Err(SceneError::UnknownComponent(new_parent));
        }
        if self.path_to_root(new_parent).contains(&id) {
            return Err(SceneError::InvalidParent {
                child: id,
                parent: new_parent,
            });
        }
        let world = self.world_transform(id)?;
        let parent_world = self.world_transform(new_parent)?;

        if let Some(old_parent) = self.get(id)?.parent {
            if let Some(parent) = self.components.get_mut(&old_parent) {
                parent.children.retain(|&child| child != id);
            }
        }
        self.get_mut(new_parent)?.children.push(id);
        let component = self.get_mut(id)?;
        component.parent = Some(new_parent);
        component.transform = parent_world.inverse() * world;
        Ok(())
    }

    /// Remove a component and its whole subtree.
    pub fn remove(&mut self, id: ComponentId) -> SceneResult<()> {
        if id == self.canvas {
            return Err(SceneError::InvalidParent {
                child: id,
                parent: id,
            });
        }
        let parent = self.get(id)?.parent;
        if let Some(parent) = parent.and_then(|p| self.components.get_mut(&p)) {
            parent.children.retain(|&child| child != id);
        }
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(component) = self.components.remove(&next) {
                pending.extend(component.children);
            }
        }
        Ok(())
    }

    /// Number of components, canvas included.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether only the canvas exists.
    pub fn is_empty(&self) -> bool {
        self.components.len() <= 1
    }

    fn get(&self, id: ComponentId) -> SceneResult<&Component> {
        self.components.get(&id).ok_or(SceneError::UnknownComponent(id))
    }

    fn get_mut(&mut self, id: ComponentId) -> SceneResult<&mut Component> {
        self.components.get_mut(&id).ok_or(SceneError::UnknownComponent(id))
    }
}

impl SceneGraph for Scene {
    fn canvas(&self) -> ComponentId {
        self.canvas
    }

    fn viewport(&self) -> Rect {
        self.viewport
    }

    fn kind(&self, id: ComponentId) -> Option<ComponentKind> {
        self.components.get(&id).map(|c| c.kind)
    }

    fn capabilities(&self, id: ComponentId) -> Option<Capabilities> {
        self.components.get(&id).map(|c| c.capabilities)
    }

    fn parent(&self, id: ComponentId) -> Option<ComponentId> {
        self.components.get(&id).and_then(|c| c.parent)
    }

    fn children(&self, id: ComponentId) -> Vec<ComponentId> {
        self.components
            .get(&id)
            .map(|c| c.children.clone())
            .unwrap_or_default()
    }

    fn outline(&self, id: ComponentId) -> Option<Outline> {
        self.components.get(&id).and_then(|c| c.outline)
    }

    fn local_transform(&self, id: ComponentId) -> SceneResult<Affine> {
        Ok(self.get(id)?.transform)
    }

    fn set_local_transform(&mut self, id: ComponentId, transform: Affine) -> SceneResult<()> {
        self.get_mut(id)?.transform = transform;
        Ok(())
    }

    fn bring_to_front(&mut self, id: ComponentId) -> SceneResult<()> {
        let Some(parent) = self.get(id)?.parent else {
            return Ok(());
        };
        let siblings = &mut self.get_mut(parent)?.children;
        siblings.retain(|&child| child != id);
        siblings.push(id);
        Ok(())
    }

    fn relation(&self, id: ComponentId) -> Option<&Relation> {
        self.components.get(&id).and_then(|c| c.relation.as_ref())
    }

    fn relation_mut(&mut self, id: ComponentId) -> Option<&mut Relation> {
        self.components.get_mut(&id).and_then(|c| c.relation.as_mut())
    }
}
