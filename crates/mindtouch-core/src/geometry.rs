//! Border clamping and distance ordering.
//!
//! [`BorderBounds`] is shared with the menu and overlay layer, which keeps
//! menus and keyboards on-screen with the same rules used for nodes.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Inclusive rectangle a component center must stay inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorderBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BorderBounds {
    /// Create bounds from explicit limits.
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Bounds of a viewport, offset inward by `margin` on every side.
    ///
    /// A margin larger than half the viewport collapses that axis onto its
    /// midpoint instead of inverting the bounds.
    pub fn from_viewport(viewport: Rect, margin: f64) -> Self {
        let viewport = viewport.abs();
        let margin_x = margin.min(viewport.width() / 2.0);
        let margin_y = margin.min(viewport.height() / 2.0);
        Self {
            min_x: viewport.x0 + margin_x,
            max_x: viewport.x1 - margin_x,
            min_y: viewport.y0 + margin_y,
            max_y: viewport.y1 - margin_y,
        }
    }

    /// Whether `point` lies inside (bounds inclusive).
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Whether moving `point` by `delta` would leave the bounds.
    pub fn would_cross(&self, point: Point, delta: Vec2) -> bool {
        !self.contains(point + delta)
    }

    /// Corrected position for a point outside the bounds.
    ///
    /// Returns `None` when no correction is needed. Corners are checked
    /// before single edges; only the violated axes change.
    pub fn clamp(&self, point: Point) -> Option<Point> {
        let left = point.x < self.min_x;
        let right = point.x > self.max_x;
        let top = point.y < self.min_y;
        let bottom = point.y > self.max_y;

        let corrected = if left && top {
            Point::new(self.min_x, self.min_y)
        } else if right && top {
            Point::new(self.max_x, self.min_y)
        } else if left && bottom {
            Point::new(self.min_x, self.max_y)
        } else if right && bottom {
            Point::new(self.max_x, self.max_y)
        } else if left {
            Point::new(self.min_x, point.y)
        } else if right {
            Point::new(self.max_x, point.y)
        } else if top {
            Point::new(point.x, self.min_y)
        } else if bottom {
            Point::new(point.x, self.max_y)
        } else {
            return None;
        };
        Some(corrected)
    }

    /// Clamp, returning the input unchanged when already inside.
    pub fn clamp_or_keep(&self, point: Point) -> Point {
        self.clamp(point).unwrap_or(point)
    }
}

/// Order items nearest-first by the distance of their position to `origin`.
///
/// The sort is stable, so equidistant items keep their relative order.
pub fn sort_by_distance<T>(items: &mut [T], origin: Point, position_of: impl Fn(&T) -> Point) {
    items.sort_by(|a, b| {
        position_of(a)
            .distance(origin)
            .total_cmp(&position_of(b).distance(origin))
    });
}

/// Closest pair of points between two sparse point sets.
///
/// Returns the indices into `a` and `b` and the two points. Ties keep the
/// first pair found in slot order.
pub fn nearest_pair(
    a: &[Option<Point>],
    b: &[Option<Point>],
) -> Option<(usize, usize, Point, Point)> {
    let mut best: Option<(usize, usize, Point, Point, f64)> = None;
    for (i, pa) in a.iter().enumerate() {
        let Some(pa) = *pa else { continue };
        for (j, pb) in b.iter().enumerate() {
            let Some(pb) = *pb else { continue };
            let dist = pa.distance_squared(pb);
            if best.is_none_or(|(.., best_dist)| dist < best_dist) {
                best = Some((i, j, pa, pb, dist));
            }
        }
    }
    best.map(|(i, j, pa, pb, _)| (i, j, pa, pb))
}
