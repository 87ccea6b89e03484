use serde::{Deserialize, Serialize};

/// Pointer tolerance for picking lines and the halo added around circles.
pub const HIT_TOLERANCE: f32 = 5.0;

/// Minimum drag extent before a gesture commits an item: lines (and the
/// reference line) need a length above this, boxes need both sides above
/// it. Independent of [`HIT_TOLERANCE`]; the two only coincide in value.
pub const MIN_DRAW_SIZE: f32 = 5.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }
}

/// A line segment in canvas pixel space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f32 {
        distance(self.start, self.end)
    }

    pub fn center(&self) -> Point {
        self.start.midpoint(self.end)
    }
}

pub fn distance(a: Point, b: Point) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Inclusive bounds test against a normalized rectangle (min ≤ max).
pub fn point_in_rectangle(p: Point, min: Point, max: Point) -> bool {
    p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
}

/// Membership test with a fixed halo so thin circles stay clickable.
pub fn point_in_circle(p: Point, center: Point, radius: f32) -> bool {
    distance(p, center) <= radius + HIT_TOLERANCE
}

/// Whether `p` is within `HIT_TOLERANCE` of the segment.
///
/// Degenerate zero-length segments keep `param = -1` so the start point is
/// used as the closest point instead of dividing by zero.
pub fn point_near_segment(p: Point, segment: Segment) -> bool {
    let a = p.x - segment.start.x;
    let b = p.y - segment.start.y;
    let c = segment.end.x - segment.start.x;
    let d = segment.end.y - segment.start.y;

    let dot = a * c + b * d;
    let len_sq = c * c + d * d;

    let mut param = -1.0;
    if len_sq != 0.0 {
        param = dot / len_sq;
    }

    let closest = if param < 0.0 {
        segment.start
    } else if param > 1.0 {
        segment.end
    } else {
        Point::new(segment.start.x + param * c, segment.start.y + param * d)
    };

    distance(p, closest) <= HIT_TOLERANCE
}

/// Rotate `p` around `center` by `degrees` (screen-space, y axis down).
pub fn rotate_around(p: Point, center: Point, degrees: f32) -> Point {
    let rad = degrees.to_radians();
    let (sin, cos) = rad.sin_cos();
    let dx = p.x - center.x;
    let dy = p.y - center.y;
    Point::new(
        center.x + dx * cos - dy * sin,
        center.y + dx * sin + dy * cos,
    )
}

/// Round a derived real-world value to the 2-decimal display precision.
pub fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}
