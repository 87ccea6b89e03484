use anyhow::Result;

use crate::annotation::ItemId;
use crate::document::{Document, ItemKind, SelectedItem};
use crate::geometry::{Point, Segment, MIN_DRAW_SIZE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Select,
    Reference,
    Line,
    Rectangle,
    Circle,
}

impl Mode {
    /// Measurement tools are unusable before calibration; Select and
    /// Reference always work.
    pub fn requires_scale(self) -> bool {
        matches!(self, Mode::Line | Mode::Rectangle | Mode::Circle)
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Select => "Select",
            Mode::Reference => "Reference",
            Mode::Line => "Line",
            Mode::Rectangle => "Rectangle",
            Mode::Circle => "Circle",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DragKind {
    /// Rubber-band preview from `start` to `current`.
    Draw,
    /// Moving an existing item; `offset` is pointer minus item center at
    /// grab time, so the grab point stays under the cursor.
    Move { target: SelectedItem, offset: Point },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragState {
    pub kind: DragKind,
    pub start: Point,
    pub current: Point,
}

/// What a finished gesture produced; the app maps these to status text.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureOutcome {
    None,
    SelectionChanged(Option<SelectedItem>),
    /// A reference line was drawn; the caller must prompt for its
    /// real-world length before the scale exists.
    ReferenceDrawn(Segment),
    LineAdded(ItemId),
    ShapeAdded(ItemId),
    /// The drag never crossed the minimum size; nothing was created.
    TooSmall,
    Moved,
}

/// Pointer state machine for the canvas. Pure document edits only; all
/// egui wiring lives in the canvas module.
#[derive(Default)]
pub struct Interaction {
    pub mode: Mode,
    pub drag: Option<DragState>,
}

impl Interaction {
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.drag = None;
    }

    /// A plain click (no drag). Only Select mode reacts: pick or clear.
    pub fn click(
        &mut self,
        doc: &mut Document,
        p: Point,
        reference_visible: bool,
    ) -> GestureOutcome {
        if self.mode != Mode::Select {
            return GestureOutcome::None;
        }
        match doc.hit_test(p, reference_visible) {
            Some(hit) => {
                doc.select(hit.kind, hit.id);
                GestureOutcome::SelectionChanged(doc.selection)
            }
            None => {
                doc.selection = None;
                GestureOutcome::SelectionChanged(None)
            }
        }
    }

    pub fn drag_started(&mut self, doc: &mut Document, p: Point, reference_visible: bool) {
        match self.mode {
            Mode::Select => {
                let Some(hit) = doc.hit_test(p, reference_visible) else {
                    doc.selection = None;
                    return;
                };
                doc.select(hit.kind, hit.id);
                let Some(target) = doc.resolve_selection() else {
                    return;
                };
                let center = match target.kind {
                    ItemKind::Reference => match &doc.scale {
                        Some(scale) => scale.center(),
                        None => return,
                    },
                    ItemKind::Line => match doc.line_by_id(target.id) {
                        Some(line) => line.center(),
                        None => return,
                    },
                    ItemKind::Shape => match doc.shape_by_id(target.id) {
                        Some(shape) => shape.center(),
                        None => return,
                    },
                };
                self.drag = Some(DragState {
                    kind: DragKind::Move {
                        target,
                        offset: Point::new(p.x - center.x, p.y - center.y),
                    },
                    start: p,
                    current: p,
                });
            }
            Mode::Reference | Mode::Line | Mode::Rectangle | Mode::Circle => {
                self.drag = Some(DragState {
                    kind: DragKind::Draw,
                    start: p,
                    current: p,
                });
            }
        }
    }

    /// Move drags reposition live so the item tracks the pointer; draw
    /// drags only update the rubber-band endpoint.
    pub fn drag_updated(&mut self, doc: &mut Document, p: Point) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        drag.current = p;
        if let DragKind::Move { target, offset } = drag.kind {
            let center = Point::new(p.x - offset.x, p.y - offset.y);
            match target.kind {
                ItemKind::Reference => {
                    if let Some(scale) = doc.scale.as_mut() {
                        scale.move_center_to(center);
                    }
                }
                ItemKind::Line => {
                    if let Some(line) = doc.line_by_id_mut(target.id) {
                        line.move_center_to(center);
                    }
                }
                ItemKind::Shape => {
                    if let Some(shape) = doc.shape_by_id_mut(target.id) {
                        shape.move_center_to(center);
                    }
                }
            }
        }
    }

    pub fn drag_finished(&mut self, doc: &mut Document) -> Result<GestureOutcome> {
        let Some(drag) = self.drag.take() else {
            return Ok(GestureOutcome::None);
        };

        if let DragKind::Move { .. } = drag.kind {
            // Position already applied during the drag.
            return Ok(GestureOutcome::Moved);
        }

        let segment = Segment::new(drag.start, drag.current);
        let width = (drag.current.x - drag.start.x).abs();
        let height = (drag.current.y - drag.start.y).abs();

        match self.mode {
            Mode::Reference => {
                if segment.length() <= MIN_DRAW_SIZE {
                    return Ok(GestureOutcome::TooSmall);
                }
                Ok(GestureOutcome::ReferenceDrawn(segment))
            }
            Mode::Line => {
                if segment.length() <= MIN_DRAW_SIZE {
                    return Ok(GestureOutcome::TooSmall);
                }
                Ok(GestureOutcome::LineAdded(doc.add_line(segment)?))
            }
            Mode::Rectangle => {
                if width <= MIN_DRAW_SIZE || height <= MIN_DRAW_SIZE {
                    return Ok(GestureOutcome::TooSmall);
                }
                Ok(GestureOutcome::ShapeAdded(
                    doc.add_rectangle(drag.start, drag.current)?,
                ))
            }
            Mode::Circle => {
                if width <= MIN_DRAW_SIZE || height <= MIN_DRAW_SIZE {
                    return Ok(GestureOutcome::TooSmall);
                }
                Ok(GestureOutcome::ShapeAdded(
                    doc.add_circle(drag.start, drag.current)?,
                ))
            }
            Mode::Select => Ok(GestureOutcome::None),
        }
    }

    /// Pointer left the canvas mid-gesture. A draw drag is abandoned
    /// without creating anything; a move drag simply ends where it was.
    pub fn pointer_left(&mut self) {
        self.drag = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{DragKind, GestureOutcome, Interaction, Mode};
    use crate::document::{Document, ItemKind};
    use crate::geometry::{Point, Segment};

    fn calibrated() -> Document {
        let mut doc = Document::default();
        doc.define_scale(
            Segment::new(Point::new(100.0, 100.0), Point::new(300.0, 100.0)),
            50.0,
            "cm",
        )
        .expect("scale");
        doc
    }

    fn drag(
        interaction: &mut Interaction,
        doc: &mut Document,
        from: Point,
        to: Point,
    ) -> GestureOutcome {
        interaction.drag_started(doc, from, true);
        interaction.drag_updated(doc, to);
        interaction.drag_finished(doc).expect("gesture")
    }

    #[test]
    fn line_tool_creates_a_measurement() {
        let mut doc = calibrated();
        let mut interaction = Interaction::default();
        interaction.set_mode(Mode::Line);

        let outcome = drag(
            &mut interaction,
            &mut doc,
            Point::new(100.0, 200.0),
            Point::new(100.0, 250.0),
        );
        let GestureOutcome::LineAdded(id) = outcome else {
            panic!("expected a line, got {outcome:?}");
        };
        assert_eq!(doc.line_by_id(id).map(|l| l.real_distance), Some(12.5));
    }

    #[test]
    fn tiny_drags_create_nothing() {
        let mut doc = calibrated();
        let mut interaction = Interaction::default();

        interaction.set_mode(Mode::Line);
        let outcome = drag(
            &mut interaction,
            &mut doc,
            Point::new(10.0, 10.0),
            Point::new(13.0, 14.0),
        );
        assert_eq!(outcome, GestureOutcome::TooSmall);

        // A wide but flat box fails the per-axis threshold.
        interaction.set_mode(Mode::Rectangle);
        let outcome = drag(
            &mut interaction,
            &mut doc,
            Point::new(10.0, 10.0),
            Point::new(80.0, 13.0),
        );
        assert_eq!(outcome, GestureOutcome::TooSmall);
        assert!(doc.lines().is_empty() && doc.shapes().is_empty());
    }

    #[test]
    fn reference_tool_defers_to_the_prompt() {
        let mut doc = calibrated();
        let mut interaction = Interaction::default();
        interaction.set_mode(Mode::Reference);

        let outcome = drag(
            &mut interaction,
            &mut doc,
            Point::new(0.0, 0.0),
            Point::new(120.0, 0.0),
        );
        assert_eq!(
            outcome,
            GestureOutcome::ReferenceDrawn(Segment::new(
                Point::new(0.0, 0.0),
                Point::new(120.0, 0.0)
            ))
        );
        // The old scale stays until the prompt is confirmed.
        assert_eq!(doc.scale.as_ref().map(|s| s.real_length), Some(50.0));
    }

    #[test]
    fn select_drag_keeps_grab_offset() {
        let mut doc = calibrated();
        let mut interaction = Interaction::default();
        let id = doc
            .add_rectangle(Point::new(0.0, 0.0), Point::new(40.0, 20.0))
            .expect("rect");

        // Grab near the corner, not the center.
        interaction.drag_started(&mut doc, Point::new(35.0, 15.0), true);
        match interaction.drag.expect("dragging").kind {
            DragKind::Move { offset, .. } => assert_eq!(offset, Point::new(15.0, 5.0)),
            other => panic!("expected a move drag, got {other:?}"),
        }

        interaction.drag_updated(&mut doc, Point::new(135.0, 115.0));
        assert_eq!(
            doc.shape_by_id(id).map(|s| s.center()),
            Some(Point::new(120.0, 110.0))
        );
        assert_eq!(
            interaction.drag_finished(&mut doc).expect("gesture"),
            GestureOutcome::Moved
        );
    }

    #[test]
    fn select_click_picks_and_clears() {
        let mut doc = calibrated();
        let mut interaction = Interaction::default();
        let id = doc
            .add_line(Segment::new(Point::new(50.0, 200.0), Point::new(150.0, 200.0)))
            .expect("line");

        let outcome = interaction.click(&mut doc, Point::new(100.0, 203.0), true);
        match outcome {
            GestureOutcome::SelectionChanged(Some(sel)) => {
                assert_eq!((sel.kind, sel.id), (ItemKind::Line, id));
            }
            other => panic!("expected a selection, got {other:?}"),
        }

        let outcome = interaction.click(&mut doc, Point::new(500.0, 500.0), true);
        assert_eq!(outcome, GestureOutcome::SelectionChanged(None));
        assert!(doc.selection.is_none());
    }

    #[test]
    fn leaving_the_canvas_abandons_a_draw() {
        let mut doc = calibrated();
        let mut interaction = Interaction::default();
        interaction.set_mode(Mode::Circle);

        interaction.drag_started(&mut doc, Point::new(10.0, 10.0), true);
        interaction.drag_updated(&mut doc, Point::new(90.0, 90.0));
        interaction.pointer_left();

        assert!(interaction.drag.is_none());
        assert!(doc.shapes().is_empty());
        assert_eq!(
            interaction.drag_finished(&mut doc).expect("gesture"),
            GestureOutcome::None
        );
    }

    #[test]
    fn switching_modes_cancels_the_drag() {
        let mut doc = calibrated();
        let mut interaction = Interaction::default();
        interaction.set_mode(Mode::Rectangle);
        interaction.drag_started(&mut doc, Point::new(10.0, 10.0), true);
        interaction.set_mode(Mode::Select);
        assert!(interaction.drag.is_none());
    }
}
