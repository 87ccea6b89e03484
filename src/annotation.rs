use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::geometry::{self, Point, Segment};

pub type ItemId = u64;

/// A measured line: pixel geometry plus the real-world length derived from
/// the scale at creation time. `unit` is copied, not live-linked; only an
/// explicit reference rescale updates `real_distance`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeasuredLine {
    pub id: ItemId,
    pub segment: Segment,
    pub pixel_distance: f32,
    pub real_distance: f32,
    pub unit: String,
    pub name: String,
    pub color: Rgb,
    pub deleted: bool,
    pub hidden: bool,
}

impl MeasuredLine {
    pub fn center(&self) -> Point {
        self.segment.center()
    }

    /// Translate both endpoints so the midpoint lands on `center`,
    /// preserving the segment vector.
    pub fn move_center_to(&mut self, center: Point) {
        let dx = self.segment.end.x - self.segment.start.x;
        let dy = self.segment.end.y - self.segment.start.y;
        self.segment.start = Point::new(center.x - dx * 0.5, center.y - dy * 0.5);
        self.segment.end = Point::new(center.x + dx * 0.5, center.y + dy * 0.5);
    }

    pub fn label(&self) -> String {
        let measure = format!("{:.2} {}", self.real_distance, self.unit);
        if self.name.is_empty() {
            measure
        } else {
            format!("{}: {measure}", self.name)
        }
    }
}

/// Geometry variants. Rectangles keep `min ≤ max` normalized corners; the
/// stored corners/center stay axis-aligned even when `Shape::rotation` is
/// set — rotation is presentation-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    Rectangle {
        min: Point,
        max: Point,
        real_width: f32,
        real_height: f32,
    },
    Circle {
        center: Point,
        radius_px: f32,
        real_diameter: f32,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Shape {
    pub id: ItemId,
    pub kind: ShapeKind,
    pub unit: String,
    pub name: String,
    pub color: Rgb,
    pub fill: bool,
    pub fill_opacity: f32,
    /// Degrees, free-form; the rotate-90 shortcut wraps modulo 360.
    pub rotation: f32,
    pub show_text: bool,
    pub deleted: bool,
    pub hidden: bool,
}

impl Shape {
    pub fn center(&self) -> Point {
        match &self.kind {
            ShapeKind::Rectangle { min, max, .. } => min.midpoint(*max),
            ShapeKind::Circle { center, .. } => *center,
        }
    }

    /// Hit test against the unrotated geometry. Rotated shapes are picked
    /// by their axis-aligned footprint.
    pub fn contains(&self, p: Point) -> bool {
        match &self.kind {
            ShapeKind::Rectangle { min, max, .. } => geometry::point_in_rectangle(p, *min, *max),
            ShapeKind::Circle {
                center, radius_px, ..
            } => geometry::point_in_circle(p, *center, *radius_px),
        }
    }

    /// Move the shape center, preserving extents/radius. Drag never resizes.
    pub fn move_center_to(&mut self, new_center: Point) {
        match &mut self.kind {
            ShapeKind::Rectangle { min, max, .. } => {
                let half_w = (max.x - min.x) * 0.5;
                let half_h = (max.y - min.y) * 0.5;
                *min = Point::new(new_center.x - half_w, new_center.y - half_h);
                *max = Point::new(new_center.x + half_w, new_center.y + half_h);
            }
            ShapeKind::Circle { center, .. } => *center = new_center,
        }
    }

    /// Selection handle positions: four corners for rectangles, center plus
    /// four cardinal edge points for circles. Circle edge markers follow the
    /// rotation so the rotation handle reads correctly.
    pub fn handles(&self) -> Vec<Point> {
        match &self.kind {
            ShapeKind::Rectangle { min, max, .. } => vec![
                *min,
                Point::new(max.x, min.y),
                Point::new(min.x, max.y),
                *max,
            ],
            ShapeKind::Circle {
                center, radius_px, ..
            } => {
                let mut points = vec![*center];
                for (dx, dy) in [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)] {
                    let edge = Point::new(center.x + radius_px * dx, center.y + radius_px * dy);
                    points.push(geometry::rotate_around(edge, *center, self.rotation));
                }
                points
            }
        }
    }

    /// Top-center of the unrotated bounding extent; the rotation handle sits
    /// a fixed offset above it.
    pub fn bounding_top_center(&self) -> Point {
        match &self.kind {
            ShapeKind::Rectangle { min, max, .. } => Point::new((min.x + max.x) * 0.5, min.y),
            ShapeKind::Circle {
                center, radius_px, ..
            } => Point::new(center.x, center.y - radius_px),
        }
    }

    pub fn dimension_text(&self) -> String {
        match &self.kind {
            ShapeKind::Rectangle {
                real_width,
                real_height,
                ..
            } => format!("{real_width:.2} × {real_height:.2} {}", self.unit),
            ShapeKind::Circle { real_diameter, .. } => {
                format!("⌀ {real_diameter:.2} {}", self.unit)
            }
        }
    }

    pub fn label(&self) -> String {
        if self.name.is_empty() {
            self.dimension_text()
        } else {
            format!("{}: {}", self.name, self.dimension_text())
        }
    }
}
