use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

use crate::annotation::{ItemId, MeasuredLine, Shape, ShapeKind};
use crate::color::{self, Rgb};
use crate::geometry::{self, round2, Point, Segment};

/// Pixel-to-real-world calibration defined by one reference line.
/// `pixel_distance` is cached at definition time so later edits to
/// `real_length` recompute `ratio` without re-deriving geometry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scale {
    pub segment: Segment,
    pub pixel_distance: f32,
    pub real_length: f32,
    pub unit: String,
    pub ratio: f32,
}

impl Scale {
    pub fn define(segment: Segment, real_length: f32, unit: &str) -> Result<Self> {
        if !real_length.is_finite() || real_length <= 0.0 {
            bail!("Enter a valid reference length");
        }
        let pixel_distance = segment.length();
        if pixel_distance <= geometry::MIN_DRAW_SIZE {
            bail!("Reference line is too short");
        }
        Ok(Self {
            segment,
            pixel_distance,
            real_length,
            unit: unit.to_string(),
            ratio: real_length / pixel_distance,
        })
    }

    pub fn center(&self) -> Point {
        self.segment.center()
    }

    /// Translate both endpoints preserving the line vector; the cached
    /// `pixel_distance` stays valid by construction.
    pub fn move_center_to(&mut self, center: Point) {
        let dx = self.segment.end.x - self.segment.start.x;
        let dy = self.segment.end.y - self.segment.start.y;
        self.segment.start = Point::new(center.x - dx * 0.5, center.y - dy * 0.5);
        self.segment.end = Point::new(center.x + dx * 0.5, center.y + dy * 0.5);
    }

    pub fn label(&self) -> String {
        format!("{} {} (reference)", self.real_length, self.unit)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Reference,
    Line,
    Shape,
}

/// At most one selection globally. `index` caches the current slot and must
/// be re-resolved by id before anything destructive — see
/// [`Document::resolve_selection`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectedItem {
    pub kind: ItemKind,
    pub id: ItemId,
    pub index: usize,
}

/// Numeric dimension edit applied to a shape, in real-world units.
#[derive(Clone, Copy, Debug)]
pub enum DimensionEdit {
    Rectangle { width: f32, height: f32 },
    Circle { diameter: f32 },
}

/// Partial style update; `None` fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct StylePatch {
    pub name: Option<String>,
    pub color: Option<Rgb>,
    pub fill: Option<bool>,
    pub fill_opacity: Option<f32>,
    pub rotation: Option<f32>,
    pub show_text: Option<bool>,
}

/// Row handed to the sidebar: everything the list needs, nothing more.
#[derive(Clone, Debug)]
pub struct ListEntry {
    pub kind: ItemKind,
    pub id: ItemId,
    pub label: String,
    pub color: Rgb,
    pub hidden: bool,
}

#[derive(Clone, Debug, Default)]
pub struct DocumentLists {
    pub lines: Vec<ListEntry>,
    pub rectangles: Vec<ListEntry>,
    pub circles: Vec<ListEntry>,
}

/// The single in-memory document: calibration, measurement collections and
/// the selection. Deleted items stay in their slots (soft delete) so ids and
/// indices remain stable for the rest of the session.
#[derive(Clone, Debug, Default)]
pub struct Document {
    pub scale: Option<Scale>,
    lines: Vec<MeasuredLine>,
    shapes: Vec<Shape>,
    pub selection: Option<SelectedItem>,
    next_id: ItemId,
}

impl Document {
    pub fn lines(&self) -> &[MeasuredLine] {
        &self.lines
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn line_by_id(&self, id: ItemId) -> Option<&MeasuredLine> {
        self.lines.iter().find(|line| line.id == id)
    }

    pub fn line_by_id_mut(&mut self, id: ItemId) -> Option<&mut MeasuredLine> {
        self.lines.iter_mut().find(|line| line.id == id)
    }

    pub fn shape_by_id(&self, id: ItemId) -> Option<&Shape> {
        self.shapes.iter().find(|shape| shape.id == id)
    }

    pub fn shape_by_id_mut(&mut self, id: ItemId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|shape| shape.id == id)
    }

    fn ratio(&self) -> Result<f32> {
        self.scale
            .as_ref()
            .map(|scale| scale.ratio)
            .ok_or_else(|| anyhow!("Set the reference scale first"))
    }

    fn take_id(&mut self) -> ItemId {
        self.next_id = self.next_id.saturating_add(1);
        self.next_id
    }

    pub fn define_scale(&mut self, segment: Segment, real_length: f32, unit: &str) -> Result<()> {
        self.scale = Some(Scale::define(segment, real_length, unit)?);
        Ok(())
    }

    /// Reference rescaling: recompute `ratio` from the cached pixel length
    /// and apply the multiplicative change to every non-deleted derived
    /// value, re-rounded to 2 decimals. Pixel geometry is untouched.
    pub fn update_reference_value(&mut self, new_real_length: f32) -> Result<()> {
        if !new_real_length.is_finite() || new_real_length <= 0.0 {
            bail!("Enter a valid reference length");
        }
        let scale = self
            .scale
            .as_mut()
            .ok_or_else(|| anyhow!("No reference scale to update"))?;

        let new_ratio = new_real_length / scale.pixel_distance;
        let ratio_change = new_ratio / scale.ratio;
        scale.real_length = new_real_length;
        scale.ratio = new_ratio;

        for line in self.lines.iter_mut().filter(|line| !line.deleted) {
            line.real_distance = round2(line.real_distance * ratio_change);
        }
        for shape in self.shapes.iter_mut().filter(|shape| !shape.deleted) {
            match &mut shape.kind {
                ShapeKind::Rectangle {
                    real_width,
                    real_height,
                    ..
                } => {
                    *real_width = round2(*real_width * ratio_change);
                    *real_height = round2(*real_height * ratio_change);
                }
                ShapeKind::Circle { real_diameter, .. } => {
                    *real_diameter = round2(*real_diameter * ratio_change);
                }
            }
        }
        Ok(())
    }

    pub fn add_line(&mut self, segment: Segment) -> Result<ItemId> {
        let ratio = self.ratio()?;
        let unit = self.scale.as_ref().map(|s| s.unit.clone()).unwrap_or_default();
        let pixel_distance = segment.length();
        let id = self.take_id();
        self.lines.push(MeasuredLine {
            id,
            segment,
            pixel_distance,
            real_distance: round2(pixel_distance * ratio),
            unit,
            name: String::new(),
            color: color::DEFAULT_LINE,
            deleted: false,
            hidden: false,
        });
        Ok(id)
    }

    /// Corners are normalized so `min ≤ max` on both axes.
    pub fn add_rectangle(&mut self, a: Point, b: Point) -> Result<ItemId> {
        let ratio = self.ratio()?;
        let unit = self.scale.as_ref().map(|s| s.unit.clone()).unwrap_or_default();
        let min = Point::new(a.x.min(b.x), a.y.min(b.y));
        let max = Point::new(a.x.max(b.x), a.y.max(b.y));
        let id = self.take_id();
        self.shapes.push(Shape {
            id,
            kind: ShapeKind::Rectangle {
                min,
                max,
                real_width: round2((max.x - min.x) * ratio),
                real_height: round2((max.y - min.y) * ratio),
            },
            unit,
            name: String::new(),
            color: color::DEFAULT_RECTANGLE,
            fill: false,
            fill_opacity: 0.3,
            rotation: 0.0,
            show_text: true,
            deleted: false,
            hidden: false,
        });
        Ok(id)
    }

    /// The circle fills the drag bounding box: center at the box midpoint,
    /// radius `max(width, height) / 2` — not center-to-corner distance.
    pub fn add_circle(&mut self, a: Point, b: Point) -> Result<ItemId> {
        let ratio = self.ratio()?;
        let unit = self.scale.as_ref().map(|s| s.unit.clone()).unwrap_or_default();
        let radius_px = (b.x - a.x).abs().max((b.y - a.y).abs()) * 0.5;
        let id = self.take_id();
        self.shapes.push(Shape {
            id,
            kind: ShapeKind::Circle {
                center: a.midpoint(b),
                radius_px,
                real_diameter: round2(radius_px * 2.0 * ratio),
            },
            unit,
            name: String::new(),
            color: color::DEFAULT_CIRCLE,
            fill: false,
            fill_opacity: 0.3,
            rotation: 0.0,
            show_text: true,
            deleted: false,
            hidden: false,
        });
        Ok(id)
    }

    /// Soft delete: the slot is kept so ids and indices stay stable.
    pub fn soft_delete(&mut self, kind: ItemKind, id: ItemId) {
        match kind {
            ItemKind::Line => {
                if let Some(line) = self.line_by_id_mut(id) {
                    line.deleted = true;
                }
            }
            ItemKind::Shape => {
                if let Some(shape) = self.shape_by_id_mut(id) {
                    shape.deleted = true;
                }
            }
            ItemKind::Reference => {}
        }
        if self
            .selection
            .is_some_and(|sel| sel.kind == kind && sel.id == id)
        {
            self.selection = None;
        }
    }

    pub fn set_hidden(&mut self, kind: ItemKind, id: ItemId, hidden: bool) {
        match kind {
            ItemKind::Line => {
                if let Some(line) = self.line_by_id_mut(id) {
                    line.hidden = hidden;
                }
            }
            ItemKind::Shape => {
                if let Some(shape) = self.shape_by_id_mut(id) {
                    shape.hidden = hidden;
                }
            }
            ItemKind::Reference => {}
        }
    }

    /// Unconditional reset of both collections and the selection. The scale
    /// survives; re-calibration is not required after clearing.
    pub fn clear_all(&mut self) {
        self.lines.clear();
        self.shapes.clear();
        self.selection = None;
    }

    pub fn select(&mut self, kind: ItemKind, id: ItemId) -> bool {
        let index = match kind {
            ItemKind::Reference => {
                if self.scale.is_none() {
                    self.selection = None;
                    return false;
                }
                0
            }
            ItemKind::Line => match self.lines.iter().position(|l| l.id == id && !l.deleted) {
                Some(index) => index,
                None => return false,
            },
            ItemKind::Shape => match self.shapes.iter().position(|s| s.id == id && !s.deleted) {
                Some(index) => index,
                None => return false,
            },
        };
        self.selection = Some(SelectedItem { kind, id, index });
        true
    }

    /// Re-resolve the selection's cached index by id. Returns `None` (and
    /// clears the selection) if the item is gone or soft-deleted.
    pub fn resolve_selection(&mut self) -> Option<SelectedItem> {
        let current = self.selection?;
        let index = match current.kind {
            ItemKind::Reference => self.scale.as_ref().map(|_| 0),
            ItemKind::Line => self
                .lines
                .iter()
                .position(|l| l.id == current.id && !l.deleted),
            ItemKind::Shape => self
                .shapes
                .iter()
                .position(|s| s.id == current.id && !s.deleted),
        };
        match index {
            Some(index) => {
                let resolved = SelectedItem { index, ..current };
                self.selection = Some(resolved);
                Some(resolved)
            }
            None => {
                self.selection = None;
                None
            }
        }
    }

    pub fn update_style(&mut self, kind: ItemKind, id: ItemId, patch: StylePatch) {
        match kind {
            ItemKind::Line => {
                if let Some(line) = self.line_by_id_mut(id) {
                    if let Some(name) = patch.name {
                        line.name = name;
                    }
                    if let Some(color) = patch.color {
                        line.color = color;
                    }
                }
            }
            ItemKind::Shape => {
                if let Some(shape) = self.shape_by_id_mut(id) {
                    if let Some(name) = patch.name {
                        shape.name = name;
                    }
                    if let Some(color) = patch.color {
                        shape.color = color;
                    }
                    if let Some(fill) = patch.fill {
                        shape.fill = fill;
                    }
                    if let Some(opacity) = patch.fill_opacity {
                        shape.fill_opacity = opacity.clamp(0.0, 1.0);
                    }
                    if let Some(rotation) = patch.rotation {
                        shape.rotation = rotation;
                    }
                    if let Some(show_text) = patch.show_text {
                        shape.show_text = show_text;
                    }
                }
            }
            ItemKind::Reference => {}
        }
    }

    pub fn rotate_shape_90(&mut self, id: ItemId) {
        if let Some(shape) = self.shape_by_id_mut(id) {
            shape.rotation = (shape.rotation + 90.0).rem_euclid(360.0);
        }
    }

    /// Re-dimension a shape from real-world values: pixel extents come from
    /// `real / ratio` and grow or shrink symmetrically around the center.
    pub fn update_dimensions(&mut self, id: ItemId, edit: DimensionEdit) -> Result<()> {
        let ratio = self.ratio()?;
        let shape = self
            .shape_by_id_mut(id)
            .ok_or_else(|| anyhow!("No such shape"))?;

        match (&mut shape.kind, edit) {
            (
                ShapeKind::Rectangle {
                    min,
                    max,
                    real_width,
                    real_height,
                },
                DimensionEdit::Rectangle { width, height },
            ) => {
                if !width.is_finite() || width <= 0.0 || !height.is_finite() || height <= 0.0 {
                    bail!("Enter valid dimensions");
                }
                let center = min.midpoint(*max);
                let half_w = width / ratio * 0.5;
                let half_h = height / ratio * 0.5;
                *min = Point::new(center.x - half_w, center.y - half_h);
                *max = Point::new(center.x + half_w, center.y + half_h);
                *real_width = round2(width);
                *real_height = round2(height);
            }
            (
                ShapeKind::Circle {
                    radius_px,
                    real_diameter,
                    ..
                },
                DimensionEdit::Circle { diameter },
            ) => {
                if !diameter.is_finite() || diameter <= 0.0 {
                    bail!("Enter a valid diameter");
                }
                *radius_px = diameter / ratio * 0.5;
                *real_diameter = round2(diameter);
            }
            _ => bail!("Dimension edit does not match the shape kind"),
        }
        Ok(())
    }

    /// Select-mode picking order: reference line (when visible), then lines
    /// in creation order, then shapes in creation order. First match wins;
    /// soft-deleted entries never match.
    pub fn hit_test(&self, p: Point, reference_visible: bool) -> Option<SelectedItem> {
        if reference_visible {
            if let Some(scale) = &self.scale {
                if geometry::point_near_segment(p, scale.segment) {
                    return Some(SelectedItem {
                        kind: ItemKind::Reference,
                        id: 0,
                        index: 0,
                    });
                }
            }
        }
        for (index, line) in self.lines.iter().enumerate() {
            if line.deleted {
                continue;
            }
            if geometry::point_near_segment(p, line.segment) {
                return Some(SelectedItem {
                    kind: ItemKind::Line,
                    id: line.id,
                    index,
                });
            }
        }
        for (index, shape) in self.shapes.iter().enumerate() {
            if shape.deleted {
                continue;
            }
            if shape.contains(p) {
                return Some(SelectedItem {
                    kind: ItemKind::Shape,
                    id: shape.id,
                    index,
                });
            }
        }
        None
    }

    /// Read projection for the sidebar: non-deleted entries grouped by kind,
    /// with `Line 1`-style fallback labels numbered within the group.
    pub fn list_entries(&self) -> DocumentLists {
        let mut lists = DocumentLists::default();

        for (n, line) in self.lines.iter().filter(|l| !l.deleted).enumerate() {
            let name = if line.name.is_empty() {
                format!("Line {}", n + 1)
            } else {
                line.name.clone()
            };
            lists.lines.push(ListEntry {
                kind: ItemKind::Line,
                id: line.id,
                label: format!("{name}: {:.2} {}", line.real_distance, line.unit),
                color: line.color,
                hidden: line.hidden,
            });
        }

        let mut rect_n = 0usize;
        let mut circle_n = 0usize;
        for shape in self.shapes.iter().filter(|s| !s.deleted) {
            let entry = |label: String| ListEntry {
                kind: ItemKind::Shape,
                id: shape.id,
                label,
                color: shape.color,
                hidden: shape.hidden,
            };
            match &shape.kind {
                ShapeKind::Rectangle { .. } => {
                    rect_n += 1;
                    let name = if shape.name.is_empty() {
                        format!("Rectangle {rect_n}")
                    } else {
                        shape.name.clone()
                    };
                    lists
                        .rectangles
                        .push(entry(format!("{name}: {}", shape.dimension_text())));
                }
                ShapeKind::Circle { .. } => {
                    circle_n += 1;
                    let name = if shape.name.is_empty() {
                        format!("Circle {circle_n}")
                    } else {
                        shape.name.clone()
                    };
                    lists
                        .circles
                        .push(entry(format!("{name}: {}", shape.dimension_text())));
                }
            }
        }

        lists
    }
}

#[cfg(test)]
mod tests {
    use super::{DimensionEdit, Document, ItemKind, StylePatch};
    use crate::annotation::ShapeKind;
    use crate::geometry::{Point, Segment};

    fn calibrated() -> Document {
        let mut doc = Document::default();
        // 200 px reference line worth 50 cm: ratio 0.25.
        doc.define_scale(
            Segment::new(Point::new(100.0, 100.0), Point::new(300.0, 100.0)),
            50.0,
            "cm",
        )
        .expect("scale");
        doc
    }

    #[test]
    fn calibration_invariant() {
        let doc = calibrated();
        let scale = doc.scale.as_ref().expect("scale set");
        assert_eq!(scale.ratio, 0.25);
        assert!((scale.real_length - scale.pixel_distance * scale.ratio).abs() < 0.005);
    }

    #[test]
    fn rejects_non_positive_reference_length() {
        let mut doc = Document::default();
        let segment = Segment::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert!(doc.define_scale(segment, 0.0, "cm").is_err());
        assert!(doc.define_scale(segment, f32::NAN, "cm").is_err());
        assert!(doc.scale.is_none());
    }

    #[test]
    fn rejects_reference_below_minimum_draw_size() {
        let mut doc = Document::default();
        // Exactly at the 5 px draw threshold, not the hit tolerance.
        let too_short = Segment::new(Point::new(0.0, 0.0), Point::new(5.0, 0.0));
        assert!(doc.define_scale(too_short, 10.0, "cm").is_err());
        let long_enough = Segment::new(Point::new(0.0, 0.0), Point::new(5.1, 0.0));
        assert!(doc.define_scale(long_enough, 10.0, "cm").is_ok());
    }

    #[test]
    fn drawing_tools_require_a_scale() {
        let mut doc = Document::default();
        assert!(doc
            .add_line(Segment::new(Point::new(0.0, 0.0), Point::new(50.0, 0.0)))
            .is_err());
        assert!(doc
            .add_rectangle(Point::new(0.0, 0.0), Point::new(40.0, 20.0))
            .is_err());
        assert!(doc.lines().is_empty() && doc.shapes().is_empty());
    }

    #[test]
    fn measurement_and_rescale_scenario() {
        let mut doc = calibrated();
        let id = doc
            .add_line(Segment::new(Point::new(100.0, 200.0), Point::new(100.0, 250.0)))
            .expect("line");
        let line = doc.line_by_id(id).expect("stored");
        assert_eq!(line.pixel_distance, 50.0);
        assert_eq!(format!("{:.2}", line.real_distance), "12.50");

        doc.update_reference_value(100.0).expect("rescale");
        assert_eq!(doc.scale.as_ref().map(|s| s.ratio), Some(0.5));
        let line = doc.line_by_id(id).expect("stored");
        assert_eq!(format!("{:.2}", line.real_distance), "25.00");
        // Pixel geometry untouched.
        assert_eq!(line.pixel_distance, 50.0);
    }

    #[test]
    fn rescale_skips_deleted_items() {
        let mut doc = calibrated();
        let keep = doc
            .add_line(Segment::new(Point::new(0.0, 0.0), Point::new(40.0, 0.0)))
            .expect("line");
        let gone = doc
            .add_line(Segment::new(Point::new(0.0, 0.0), Point::new(80.0, 0.0)))
            .expect("line");
        doc.soft_delete(ItemKind::Line, gone);
        doc.update_reference_value(100.0).expect("rescale");

        assert_eq!(doc.line_by_id(keep).map(|l| l.real_distance), Some(20.0));
        // The deleted slot keeps its stale value.
        assert_eq!(doc.line_by_id(gone).map(|l| l.real_distance), Some(20.0));
    }

    #[test]
    fn rectangle_dimension_edit_scenario() {
        let mut doc = calibrated();
        let id = doc
            .add_rectangle(Point::new(0.0, 0.0), Point::new(40.0, 20.0))
            .expect("rect");
        match &doc.shape_by_id(id).expect("stored").kind {
            ShapeKind::Rectangle {
                real_width,
                real_height,
                ..
            } => {
                assert_eq!(format!("{real_width:.2}"), "10.00");
                assert_eq!(format!("{real_height:.2}"), "5.00");
            }
            _ => unreachable!(),
        }

        doc.update_dimensions(
            id,
            DimensionEdit::Rectangle {
                width: 20.0,
                height: 10.0,
            },
        )
        .expect("edit");
        match &doc.shape_by_id(id).expect("stored").kind {
            ShapeKind::Rectangle {
                min,
                max,
                real_width,
                ..
            } => {
                // 20 cm / 0.25 = 80 px, grown symmetrically around (20, 10).
                assert_eq!(max.x - min.x, 80.0);
                assert_eq!(max.y - min.y, 40.0);
                assert_eq!(min.midpoint(*max), Point::new(20.0, 10.0));
                assert_eq!(format!("{real_width:.2}"), "20.00");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn dimension_edit_rejects_invalid_input() {
        let mut doc = calibrated();
        let id = doc
            .add_rectangle(Point::new(0.0, 0.0), Point::new(40.0, 20.0))
            .expect("rect");
        let before = doc.shape_by_id(id).expect("stored").kind.clone();
        assert!(doc
            .update_dimensions(
                id,
                DimensionEdit::Rectangle {
                    width: -3.0,
                    height: 10.0
                }
            )
            .is_err());
        assert!(doc
            .update_dimensions(id, DimensionEdit::Circle { diameter: 10.0 })
            .is_err());
        assert_eq!(doc.shape_by_id(id).expect("stored").kind, before);
    }

    #[test]
    fn circle_uses_bounding_box_radius() {
        let mut doc = calibrated();
        let id = doc
            .add_circle(Point::new(0.0, 0.0), Point::new(60.0, 20.0))
            .expect("circle");
        match &doc.shape_by_id(id).expect("stored").kind {
            ShapeKind::Circle {
                center,
                radius_px,
                real_diameter,
            } => {
                assert_eq!(*center, Point::new(30.0, 10.0));
                assert_eq!(*radius_px, 30.0);
                assert_eq!(format!("{real_diameter:.2}"), "15.00");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn soft_delete_preserves_other_indices() {
        let mut doc = calibrated();
        let first = doc
            .add_line(Segment::new(Point::new(0.0, 0.0), Point::new(40.0, 0.0)))
            .expect("line");
        let second = doc
            .add_line(Segment::new(Point::new(0.0, 10.0), Point::new(40.0, 10.0)))
            .expect("line");

        doc.select(ItemKind::Line, first);
        doc.soft_delete(ItemKind::Line, first);

        assert!(doc.selection.is_none());
        assert_eq!(doc.line_by_id(first).map(|l| l.deleted), Some(true));
        // The survivor keeps its slot and id.
        assert_eq!(doc.lines()[1].id, second);
        assert_eq!(doc.list_entries().lines.len(), 1);
    }

    #[test]
    fn selection_resolves_by_id_after_mutation() {
        let mut doc = calibrated();
        let id = doc
            .add_line(Segment::new(Point::new(0.0, 0.0), Point::new(40.0, 0.0)))
            .expect("line");
        assert!(doc.select(ItemKind::Line, id));
        doc.soft_delete(ItemKind::Line, id);
        doc.select(ItemKind::Line, id);
        assert!(doc.resolve_selection().is_none());
        assert!(doc.selection.is_none());
    }

    #[test]
    fn hit_test_prefers_reference_then_lines_then_shapes() {
        let mut doc = calibrated();
        doc.add_rectangle(Point::new(50.0, 50.0), Point::new(350.0, 300.0))
            .expect("rect");
        let line_id = doc
            .add_line(Segment::new(Point::new(50.0, 200.0), Point::new(350.0, 200.0)))
            .expect("line");

        // On the reference line, with the reference visible.
        let hit = doc.hit_test(Point::new(200.0, 100.0), true).expect("hit");
        assert_eq!(hit.kind, ItemKind::Reference);
        // Same point with the reference hidden falls through to the shape.
        let hit = doc.hit_test(Point::new(200.0, 100.0), false).expect("hit");
        assert_eq!(hit.kind, ItemKind::Shape);
        // The measurement line shadows the shape underneath it.
        let hit = doc.hit_test(Point::new(200.0, 200.0), true).expect("hit");
        assert_eq!((hit.kind, hit.id), (ItemKind::Line, line_id));
        // Empty space clears.
        assert!(doc.hit_test(Point::new(600.0, 600.0), true).is_none());
    }

    #[test]
    fn rotate_90_shortcut_wraps_and_preserves_geometry() {
        let mut doc = calibrated();
        let id = doc
            .add_circle(Point::new(0.0, 0.0), Point::new(40.0, 40.0))
            .expect("circle");
        let before = doc.shape_by_id(id).expect("stored").kind.clone();
        doc.update_style(
            ItemKind::Shape,
            id,
            StylePatch {
                rotation: Some(270.0),
                ..StylePatch::default()
            },
        );
        for _ in 0..4 {
            doc.rotate_shape_90(id);
        }
        let shape = doc.shape_by_id(id).expect("stored");
        assert_eq!(shape.rotation, 270.0);
        assert_eq!(shape.kind, before);
    }

    #[test]
    fn clear_all_keeps_the_scale() {
        let mut doc = calibrated();
        doc.add_line(Segment::new(Point::new(0.0, 0.0), Point::new(40.0, 0.0)))
            .expect("line");
        doc.clear_all();
        assert!(doc.lines().is_empty());
        assert!(doc.shapes().is_empty());
        assert!(doc.selection.is_none());
        assert!(doc.scale.is_some());
    }

    #[test]
    fn list_entries_group_and_number_by_kind() {
        let mut doc = calibrated();
        doc.add_line(Segment::new(Point::new(0.0, 0.0), Point::new(40.0, 0.0)))
            .expect("line");
        doc.add_rectangle(Point::new(0.0, 0.0), Point::new(40.0, 20.0))
            .expect("rect");
        let circle = doc
            .add_circle(Point::new(0.0, 0.0), Point::new(40.0, 40.0))
            .expect("circle");
        doc.set_hidden(ItemKind::Shape, circle, true);

        let lists = doc.list_entries();
        assert_eq!(lists.lines.len(), 1);
        assert_eq!(lists.rectangles.len(), 1);
        assert_eq!(lists.circles.len(), 1);
        assert!(lists.lines[0].label.starts_with("Line 1: "));
        assert!(lists.circles[0].hidden);
    }
}
