use egui::{
    vec2, Align2, Color32, Context, FontId, Key, Painter, Pos2, Rect, Response, Sense, Shape,
    Stroke, Ui,
};

use crate::annotation::{MeasuredLine, Shape as PlanShape, ShapeKind};
use crate::color::Rgb;
use crate::document::ItemKind;
use crate::geometry::{self, round2, Point, Segment};
use crate::interaction::{DragKind, DragState, GestureOutcome, Mode};
use crate::state::{EditorState, PendingReference, REFERENCE_COLOR, REFERENCE_SELECTED_COLOR};

const LABEL_FONT: f32 = 14.0;
const HANDLE_RADIUS: f32 = 4.0;
const ROTATION_HANDLE_OFFSET: f32 = 20.0;

pub fn show_canvas(ui: &mut Ui, ctx: &Context, state: &mut EditorState) {
    let Some(image) = state.image.as_mut() else {
        empty_canvas(ui);
        return;
    };
    image.ensure_texture(ctx);
    let texture_id = image
        .texture
        .as_ref()
        .map(|texture| texture.id())
        .expect("texture was just created");

    // The image fits the viewport, scale-down only. Annotation coordinates
    // are canvas pixels; a viewport resize rescales the image but not the
    // stored geometry.
    let canvas_size = image.fit_size(ui.available_size() - vec2(16.0, 16.0));
    state.canvas_size = canvas_size;

    let (outer_rect, response) =
        ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
    let canvas_rect = Rect::from_center_size(outer_rect.center(), canvas_size);

    let painter = ui.painter_at(outer_rect);
    painter.rect_filled(outer_rect, 0.0, ui.visuals().extreme_bg_color);
    painter.image(
        texture_id,
        canvas_rect,
        Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
        Color32::WHITE,
    );

    draw_reference(&painter, state, canvas_rect);
    if state.show_all_objects {
        draw_lines(&painter, state, canvas_rect);
        draw_shapes(&painter, state, canvas_rect);
    }
    draw_drag_preview(&painter, state, canvas_rect);
    draw_selection(&painter, state, canvas_rect);

    handle_pointer(ctx, state, &response, canvas_rect);
    handle_keyboard(ctx, state);
}

fn empty_canvas(ui: &mut Ui) {
    let (rect, _) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, ui.visuals().extreme_bg_color);
    painter.text(
        rect.center(),
        Align2::CENTER_CENTER,
        "Open a plan image to start measuring",
        FontId::proportional(18.0),
        ui.visuals().weak_text_color(),
    );
}

fn to_screen(p: Point, canvas_rect: Rect) -> Pos2 {
    Pos2::new(canvas_rect.min.x + p.x, canvas_rect.min.y + p.y)
}

fn from_screen(pos: Pos2, canvas_rect: Rect) -> Point {
    Point::new(pos.x - canvas_rect.min.x, pos.y - canvas_rect.min.y)
}

fn draw_label(painter: &Painter, text: &str, anchor: Point, color: Rgb, canvas_rect: Rect) {
    // Midpoint plus a (+5, -5) nudge so the text clears the line.
    let pos = to_screen(Point::new(anchor.x + 5.0, anchor.y - 5.0), canvas_rect);
    painter.text(
        pos,
        Align2::LEFT_BOTTOM,
        text,
        FontId::proportional(LABEL_FONT),
        color.color32(),
    );
}

fn draw_reference(painter: &Painter, state: &EditorState, canvas_rect: Rect) {
    if !state.show_reference {
        return;
    }
    let Some(scale) = &state.document.scale else {
        return;
    };
    let selected = state
        .document
        .selection
        .is_some_and(|sel| sel.kind == ItemKind::Reference);
    let color = if selected {
        REFERENCE_SELECTED_COLOR
    } else {
        REFERENCE_COLOR
    };
    let width = if selected { 3.0 } else { 2.0 };

    let start = to_screen(scale.segment.start, canvas_rect);
    let end = to_screen(scale.segment.end, canvas_rect);
    painter.line_segment([start, end], Stroke::new(width, color.color32()));
    if state.show_all_text {
        draw_label(painter, &scale.label(), scale.center(), color, canvas_rect);
    }
    if selected {
        painter.circle_filled(start, HANDLE_RADIUS, color.color32());
        painter.circle_filled(end, HANDLE_RADIUS, color.color32());
    }
}

fn draw_lines(painter: &Painter, state: &EditorState, canvas_rect: Rect) {
    for line in state.document.lines() {
        if line.deleted || line.hidden {
            continue;
        }
        let selected = state
            .document
            .selection
            .is_some_and(|sel| sel.kind == ItemKind::Line && sel.id == line.id);
        draw_line(painter, line, selected, state.show_all_text, canvas_rect);
    }
}

fn draw_line(
    painter: &Painter,
    line: &MeasuredLine,
    selected: bool,
    show_text: bool,
    canvas_rect: Rect,
) {
    let color = if selected {
        line.color.selected()
    } else {
        line.color
    };
    let width = if selected { 3.0 } else { 2.0 };
    let start = to_screen(line.segment.start, canvas_rect);
    let end = to_screen(line.segment.end, canvas_rect);
    painter.line_segment([start, end], Stroke::new(width, color.color32()));
    if show_text {
        draw_label(painter, &line.label(), line.center(), color, canvas_rect);
    }
}

fn draw_shapes(painter: &Painter, state: &EditorState, canvas_rect: Rect) {
    for shape in state.document.shapes() {
        if shape.deleted || shape.hidden {
            continue;
        }
        let selected = state
            .document
            .selection
            .is_some_and(|sel| sel.kind == ItemKind::Shape && sel.id == shape.id);
        draw_shape(painter, shape, selected, state.show_all_text, canvas_rect);
    }
}

fn draw_shape(
    painter: &Painter,
    shape: &PlanShape,
    selected: bool,
    show_global_text: bool,
    canvas_rect: Rect,
) {
    let color = if selected {
        shape.color.selected()
    } else {
        shape.color
    };
    let stroke = Stroke::new(if selected { 3.0 } else { 2.0 }, color.color32());
    let fill = if shape.fill {
        shape.color.fill_color32(shape.fill_opacity)
    } else {
        Color32::TRANSPARENT
    };

    match &shape.kind {
        ShapeKind::Rectangle { min, max, .. } => {
            // Rotation is presentation-only: rotate the four stored corners
            // around the center and draw the polygon.
            let center = min.midpoint(*max);
            let corners = [
                *min,
                Point::new(max.x, min.y),
                *max,
                Point::new(min.x, max.y),
            ]
            .map(|corner| {
                to_screen(
                    geometry::rotate_around(corner, center, shape.rotation),
                    canvas_rect,
                )
            });
            painter.add(Shape::convex_polygon(corners.to_vec(), fill, stroke));
        }
        ShapeKind::Circle {
            center, radius_px, ..
        } => {
            painter.circle(to_screen(*center, canvas_rect), *radius_px, fill, stroke);
        }
    }

    if show_global_text && shape.show_text {
        painter.text(
            to_screen(shape.center(), canvas_rect),
            Align2::CENTER_CENTER,
            shape.label(),
            FontId::proportional(LABEL_FONT),
            color.color32(),
        );
    }
}

fn draw_drag_preview(painter: &Painter, state: &EditorState, canvas_rect: Rect) {
    let Some(drag) = state.interaction.drag.as_ref() else {
        return;
    };
    if drag.kind != DragKind::Draw {
        return;
    }

    let segment = Segment::new(drag.start, drag.current);
    let start = to_screen(drag.start, canvas_rect);
    let current = to_screen(drag.current, canvas_rect);
    let ratio = state.document.scale.as_ref().map(|scale| scale.ratio);
    let unit = state
        .document
        .scale
        .as_ref()
        .map(|scale| scale.unit.as_str())
        .unwrap_or("");

    match state.interaction.mode {
        Mode::Reference => {
            painter.line_segment([start, current], Stroke::new(2.0, REFERENCE_COLOR.color32()));
            draw_label(
                painter,
                &format!("{:.0} px", segment.length()),
                segment.center(),
                REFERENCE_COLOR,
                canvas_rect,
            );
        }
        Mode::Line => {
            painter.line_segment(
                [start, current],
                Stroke::new(2.0, crate::color::DEFAULT_LINE.color32()),
            );
            if let Some(ratio) = ratio {
                draw_label(
                    painter,
                    &format!("{:.2} {unit}", round2(segment.length() * ratio)),
                    segment.center(),
                    crate::color::DEFAULT_LINE,
                    canvas_rect,
                );
            }
        }
        Mode::Rectangle => {
            let rect = Rect::from_two_pos(start, current);
            painter.rect_stroke(
                rect,
                0.0,
                Stroke::new(2.0, crate::color::DEFAULT_RECTANGLE.color32()),
            );
            if let Some(ratio) = ratio {
                let w = round2((drag.current.x - drag.start.x).abs() * ratio);
                let h = round2((drag.current.y - drag.start.y).abs() * ratio);
                painter.text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    format!("{w:.2} × {h:.2} {unit}"),
                    FontId::proportional(LABEL_FONT),
                    crate::color::DEFAULT_RECTANGLE.color32(),
                );
            }
        }
        Mode::Circle => {
            let radius = (drag.current.x - drag.start.x)
                .abs()
                .max((drag.current.y - drag.start.y).abs())
                * 0.5;
            let center = drag.start.midpoint(drag.current);
            painter.circle_stroke(
                to_screen(center, canvas_rect),
                radius,
                Stroke::new(2.0, crate::color::DEFAULT_CIRCLE.color32()),
            );
            if let Some(ratio) = ratio {
                painter.text(
                    to_screen(center, canvas_rect),
                    Align2::CENTER_CENTER,
                    format!("⌀ {:.2} {unit}", round2(radius * 2.0 * ratio)),
                    FontId::proportional(LABEL_FONT),
                    crate::color::DEFAULT_CIRCLE.color32(),
                );
            }
        }
        Mode::Select => {}
    }
}

fn draw_selection(painter: &Painter, state: &EditorState, canvas_rect: Rect) {
    let Some(selection) = state.document.selection else {
        return;
    };
    match selection.kind {
        ItemKind::Line => {
            let Some(line) = state.document.line_by_id(selection.id) else {
                return;
            };
            if line.hidden || !state.show_all_objects {
                return;
            }
            let color = line.color.selected().color32();
            for p in [line.segment.start, line.segment.end] {
                painter.circle_filled(to_screen(p, canvas_rect), HANDLE_RADIUS, color);
            }
        }
        ItemKind::Shape => {
            let Some(shape) = state.document.shape_by_id(selection.id) else {
                return;
            };
            if shape.hidden || !state.show_all_objects {
                return;
            }
            let color = shape.color.selected().color32();
            let center = shape.center();
            for p in shape.handles() {
                let rotated = match shape.kind {
                    // Circle handles are already rotated.
                    ShapeKind::Circle { .. } => p,
                    ShapeKind::Rectangle { .. } => {
                        geometry::rotate_around(p, center, shape.rotation)
                    }
                };
                painter.circle_filled(to_screen(rotated, canvas_rect), HANDLE_RADIUS, color);
            }

            // Rotation handle above the shape, joined by a short stem.
            let top = shape.bounding_top_center();
            let anchor = geometry::rotate_around(
                Point::new(top.x, top.y - ROTATION_HANDLE_OFFSET),
                center,
                shape.rotation,
            );
            let top_rotated = geometry::rotate_around(top, center, shape.rotation);
            painter.line_segment(
                [
                    to_screen(top_rotated, canvas_rect),
                    to_screen(anchor, canvas_rect),
                ],
                Stroke::new(1.0, color),
            );
            painter.circle_stroke(
                to_screen(anchor, canvas_rect),
                HANDLE_RADIUS + 1.0,
                Stroke::new(1.5, color),
            );
        }
        // Reference handles are drawn with the line itself.
        ItemKind::Reference => {}
    }
}

fn handle_pointer(ctx: &Context, state: &mut EditorState, response: &Response, canvas_rect: Rect) {
    // Modals swallow input.
    if state.pending_reference.is_some() || state.confirm_clear_all {
        return;
    }

    let pointer = ctx.input(|input| input.pointer.clone());
    let Some(pointer_pos) = pointer.interact_pos() else {
        state.interaction.pointer_left();
        return;
    };

    // egui keeps `dragged()` true while the button is held, even after the
    // pointer leaves the widget. An escaped drag must be abandoned here or
    // the release would finalize an item with out-of-canvas coordinates.
    if drag_escaped(
        state.interaction.drag.is_some(),
        canvas_rect.contains(pointer_pos),
    ) {
        let was_draw = matches!(
            state.interaction.drag,
            Some(DragState {
                kind: DragKind::Draw,
                ..
            })
        );
        state.interaction.pointer_left();
        if was_draw {
            state.set_status("Pointer left the canvas, drawing discarded");
        }
        return;
    }

    let p = from_screen(pointer_pos, canvas_rect);
    let reference_visible = state.show_reference;

    if response.drag_started() && canvas_rect.contains(pointer_pos) {
        state
            .interaction
            .drag_started(&mut state.document, p, reference_visible);
    }
    if response.dragged() {
        state.interaction.drag_updated(&mut state.document, p);
    }
    if response.drag_stopped() {
        apply_outcome(state);
    }
    if response.clicked() && canvas_rect.contains(pointer_pos) {
        let outcome = state.interaction.click(&mut state.document, p, reference_visible);
        if let GestureOutcome::SelectionChanged(selection) = outcome {
            state.set_status(match selection {
                Some(_) => "Selected".to_string(),
                None => "Selection cleared".to_string(),
            });
        }
    }
}

/// An active drag whose pointer is no longer inside the canvas must be
/// dropped rather than finalized.
fn drag_escaped(drag_active: bool, pointer_inside: bool) -> bool {
    drag_active && !pointer_inside
}

fn apply_outcome(state: &mut EditorState) {
    let outcome = match state.interaction.drag_finished(&mut state.document) {
        Ok(outcome) => outcome,
        Err(err) => {
            state.set_status(err.to_string());
            return;
        }
    };
    match outcome {
        GestureOutcome::ReferenceDrawn(segment) => {
            let unit = state
                .document
                .scale
                .as_ref()
                .map(|scale| scale.unit.clone())
                .unwrap_or_else(|| state.settings.default_unit.clone());
            state.pending_reference = Some(PendingReference {
                segment,
                length_input: String::new(),
                unit_input: unit,
            });
        }
        GestureOutcome::LineAdded(_) => state.set_status("Line measured"),
        GestureOutcome::ShapeAdded(_) => state.set_status("Shape added"),
        GestureOutcome::TooSmall => state.set_status("Drag further to create an item"),
        GestureOutcome::Moved | GestureOutcome::SelectionChanged(_) | GestureOutcome::None => {}
    }
}

fn handle_keyboard(ctx: &Context, state: &mut EditorState) {
    if state.pending_reference.is_some() || state.confirm_clear_all {
        return;
    }
    if ctx.wants_keyboard_input() {
        return;
    }

    let Some(selection) = state.document.resolve_selection() else {
        return;
    };

    if ctx.input(|input| input.key_pressed(Key::Delete) || input.key_pressed(Key::Backspace)) {
        match selection.kind {
            ItemKind::Line | ItemKind::Shape => {
                state.document.soft_delete(selection.kind, selection.id);
                state.set_status("Deleted");
            }
            // The reference cannot be deleted; deleting hides it instead.
            ItemKind::Reference => {
                state.show_reference = false;
                state.document.selection = None;
                state.set_status("Reference line hidden");
            }
        }
    }

    if ctx.input(|input| input.key_pressed(Key::R)) && selection.kind == ItemKind::Shape {
        state.document.rotate_shape_90(selection.id);
    }
}
