//! Marker and handle containers.
//!
//! A container is a child of a shape holding one marker per selected touch
//! point. Markers sit at the touch point in the shape's local frame, so their
//! world positions follow every move and rotation of the shape without being
//! updated. Positions are always read back from the hierarchy.

use crate::geometry::sort_by_distance;
use crate::scene::{ComponentId, ComponentKind, Outline, Scene, SceneError, SceneGraph, SceneResult};
use crate::touch::{Compass, TouchPoint, TouchPoints, TouchSelection, local_touch_point};
use kurbo::{Affine, Point};

/// Radius of a handle image.
pub const HANDLE_RADIUS: f64 = 8.0;
/// Hit tolerance for handle picking, in world units.
pub const HANDLE_HIT_TOLERANCE: f64 = 24.0;

/// Markers of one shape, keyed by compass direction.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerContainer {
    id: ComponentId,
    shape: ComponentId,
    markers: [Option<ComponentId>; 8],
    handles: [Option<ComponentId>; 8],
}

impl MarkerContainer {
    /// Create a container under `shape` with markers at the selected touch
    /// points, each optionally carrying a handle image.
    pub fn attach(
        scene: &mut Scene,
        shape: ComponentId,
        selection: TouchSelection,
        with_handles: bool,
    ) -> SceneResult<Self> {
        let outline = scene.outline(shape).ok_or(SceneError::NotAShape(shape))?;
        let id = scene.add(ComponentKind::MarkerContainer, shape, None, Affine::IDENTITY)?;
        let mut container = Self {
            id,
            shape,
            markers: [None; 8],
            handles: [None; 8],
        };

        for compass in Compass::ALL.into_iter().filter(|&c| selection.includes(c)) {
            let position = local_touch_point(outline, compass);
            let local = Affine::translate(position.to_vec2());
            let marker = scene.add(ComponentKind::Marker, id, None, local)?;
            container.markers[compass.index()] = Some(marker);
            if with_handles {
                let handle = scene.add(
                    ComponentKind::HandleImage,
                    marker,
                    Some(Outline::circle(HANDLE_RADIUS)),
                    Affine::IDENTITY,
                )?;
                container.handles[compass.index()] = Some(handle);
            }
        }

        log::debug!(
            "Attached {} markers to {}",
            container.markers.iter().flatten().count(),
            shape
        );
        Ok(container)
    }

    /// Container component id.
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Shape the container belongs to.
    pub fn shape(&self) -> ComponentId {
        self.shape
    }

    /// Marker component for a direction.
    pub fn marker(&self, compass: Compass) -> Option<ComponentId> {
        self.markers[compass.index()]
    }

    /// Handle image for a direction.
    pub fn handle(&self, compass: Compass) -> Option<ComponentId> {
        self.handles[compass.index()]
    }

    /// Number of markers.
    pub fn len(&self) -> usize {
        self.markers.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current world positions of the markers.
    pub fn positions(&self, scene: &dyn SceneGraph) -> SceneResult<TouchPoints> {
        let mut points = TouchPoints::default();
        for compass in Compass::ALL {
            if let Some(marker) = self.marker(compass) {
                points.set(compass, scene.center(marker)?);
            }
        }
        Ok(points)
    }

    /// Markers ordered by distance to `point`, nearest first.
    pub fn by_distance(
        &self,
        scene: &dyn SceneGraph,
        point: Point,
    ) -> SceneResult<Vec<TouchPoint>> {
        let mut touches: Vec<TouchPoint> = self.positions(scene)?.iter().collect();
        sort_by_distance(&mut touches, point, |t| t.position);
        Ok(touches)
    }

    /// Direction of the handle under `point`, if any.
    pub fn hit_test(
        &self,
        scene: &dyn SceneGraph,
        point: Point,
        tolerance: f64,
    ) -> Option<Compass> {
        let nearest = match self.by_distance(scene, point) {
            Ok(touches) => touches.into_iter().next()?,
            Err(e) => {
                log::warn!("Marker hit test failed on {}: {}", self.shape, e);
                return None;
            }
        };
        let hit = (nearest.position - point).hypot() <= tolerance;
        (hit && self.handle(nearest.compass).is_some()).then_some(nearest.compass)
    }

    /// Remove the container and its markers from the scene.
    pub fn detach(self, scene: &mut Scene) -> SceneResult<()> {
        scene.remove(self.id)
    }
}
