//! Compass touch points on shape boundaries.
//!
//! Touch points are never cached: they are derived from the shape's
//! outline and its current world transform every time they are asked for.

use crate::scene::{ComponentId, Outline, SceneError, SceneGraph, SceneResult};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// The eight compass directions, clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compass {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Compass {
    /// All directions in slot order.
    pub const ALL: [Compass; 8] = [
        Compass::N,
        Compass::NE,
        Compass::E,
        Compass::SE,
        Compass::S,
        Compass::SW,
        Compass::W,
        Compass::NW,
    ];

    /// Slot index (N = 0, clockwise).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Direction for a slot index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The diametrically opposite direction.
    pub fn opposite(self) -> Self {
        Self::ALL[(self.index() + 4) % 8]
    }

    /// Clockwise angle from the shape's up axis, in degrees.
    pub fn angle_from_up(self) -> f64 {
        self.index() as f64 * 45.0
    }

    /// Whether this is one of N, E, S, W.
    pub fn is_cardinal(self) -> bool {
        self.index() % 2 == 0
    }
}

/// A compass location with its world position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub compass: Compass,
    pub position: Point,
}

/// Which touch points a caller needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchSelection {
    /// All eight.
    All,
    /// N, E, S, W.
    Cardinal,
    /// NE, SE, SW, NW.
    Diagonal,
    /// Two arbitrary directions.
    Pair(Compass, Compass),
}

impl TouchSelection {
    /// Whether `compass` is part of this selection.
    pub fn includes(self, compass: Compass) -> bool {
        match self {
            TouchSelection::All => true,
            TouchSelection::Cardinal => compass.is_cardinal(),
            TouchSelection::Diagonal => !compass.is_cardinal(),
            TouchSelection::Pair(a, b) => compass == a || compass == b,
        }
    }
}

/// Sparse set of touch points indexed by compass direction.
///
/// Unselected directions are absent rather than zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TouchPoints {
    slots: [Option<Point>; 8],
}

impl TouchPoints {
    /// Position for a direction, if present.
    pub fn get(&self, compass: Compass) -> Option<Point> {
        self.slots[compass.index()]
    }

    /// Store a position.
    pub fn set(&mut self, compass: Compass, position: Point) {
        self.slots[compass.index()] = Some(position);
    }

    /// Raw slots in compass order.
    pub fn slots(&self) -> &[Option<Point>; 8] {
        &self.slots
    }

    /// Present touch points in compass order.
    pub fn iter(&self) -> impl Iterator<Item = TouchPoint> + '_ {
        Compass::ALL.iter().filter_map(|&compass| {
            self.get(compass).map(|position| TouchPoint { compass, position })
        })
    }

    /// Number of present touch points.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether no touch point is present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Boundary point of an outline in its local frame.
pub fn local_touch_point(outline: Outline, compass: Compass) -> Point {
    match outline {
        Outline::Ellipse { radius_x, radius_y } => {
            let theta = compass.angle_from_up().to_radians();
            Point::new(radius_x * theta.sin(), -radius_y * theta.cos())
        }
        Outline::Rectangle { width, height } => {
            let (hw, hh) = (width / 2.0, height / 2.0);
            match compass {
                Compass::N => Point::new(0.0, -hh),
                Compass::NE => Point::new(hw, -hh),
                Compass::E => Point::new(hw, 0.0),
                Compass::SE => Point::new(hw, hh),
                Compass::S => Point::new(0.0, hh),
                Compass::SW => Point::new(-hw, hh),
                Compass::W => Point::new(-hw, 0.0),
                Compass::NW => Point::new(-hw, -hh),
            }
        }
    }
}

/// Local-frame touch points for the selected directions.
pub fn local_touch_points(outline: Outline, selection: TouchSelection) -> TouchPoints {
    let mut points = TouchPoints::default();
    for compass in Compass::ALL.into_iter().filter(|&c| selection.includes(c)) {
        points.set(compass, local_touch_point(outline, compass));
    }
    points
}

/// World-space touch points of a shape under its current transform.
pub fn touch_points(
    scene: &dyn SceneGraph,
    shape: ComponentId,
    selection: TouchSelection,
) -> SceneResult<TouchPoints> {
    let outline = scene.outline(shape).ok_or(SceneError::NotAShape(shape))?;
    let world = scene.world_transform(shape)?;
    let mut points = TouchPoints::default();
    for touch in local_touch_points(outline, selection).iter() {
        points.set(touch.compass, world * touch.position);
    }
    Ok(points)
}
