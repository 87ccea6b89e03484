use egui::{vec2, Color32, CollapsingHeader, DragValue, RichText, ScrollArea, Sense, Stroke, Ui};

use crate::annotation::ShapeKind;
use crate::color::Rgb;
use crate::document::{DimensionEdit, ItemKind, ListEntry, StylePatch};
use crate::state::EditorState;

pub fn show_sidebar(ui: &mut Ui, state: &mut EditorState) {
    ScrollArea::vertical()
        .id_source("planmark_sidebar")
        .show(ui, |ui| {
            view_section(ui, state);
            ui.separator();
            reference_section(ui, state);
            ui.separator();
            items_section(ui, state);
            ui.separator();
            properties_section(ui, state);
        });
}

fn view_section(ui: &mut Ui, state: &mut EditorState) {
    ui.label(RichText::new("View").strong());
    ui.checkbox(&mut state.show_reference, "Reference line");
    ui.checkbox(&mut state.show_all_objects, "Measurements");
    ui.checkbox(&mut state.show_all_text, "Labels");
}

fn reference_section(ui: &mut Ui, state: &mut EditorState) {
    ui.label(RichText::new("Reference").strong());
    let Some(scale) = state.document.scale.as_ref() else {
        ui.label(
            RichText::new("Not set. Use the Reference tool on a known distance.").weak(),
        );
        return;
    };
    ui.label(format!(
        "{} {} over {:.0} px",
        scale.real_length, scale.unit, scale.pixel_distance
    ));
    ui.label(
        RichText::new(format!("1 px = {:.4} {}", scale.ratio, scale.unit)).weak(),
    );

    match state.reference_edit.take() {
        None => {
            if ui.button("Edit length").clicked() {
                state.reference_edit = Some(scale.real_length.to_string());
            }
        }
        Some(mut input) => {
            let mut done = false;
            ui.horizontal(|ui| {
                ui.text_edit_singleline(&mut input);
                if ui.button("Apply").clicked() {
                    match input.trim().parse::<f32>() {
                        Ok(value) => match state.document.update_reference_value(value) {
                            Ok(()) => {
                                state.set_status("Measurements rescaled");
                                done = true;
                            }
                            Err(err) => state.set_status(err.to_string()),
                        },
                        Err(_) => state.set_status("Enter a valid reference length"),
                    }
                }
                if ui.button("Cancel").clicked() {
                    done = true;
                }
            });
            if !done {
                state.reference_edit = Some(input);
            }
        }
    }
}

fn items_section(ui: &mut Ui, state: &mut EditorState) {
    let mut force_open = None;
    ui.horizontal(|ui| {
        ui.label(RichText::new("Items").strong());
        if ui.small_button("Expand all").clicked() {
            force_open = Some(true);
        }
        if ui.small_button("Collapse all").clicked() {
            force_open = Some(false);
        }
    });
    let lists = state.document.list_entries();
    item_group(ui, state, "Lines", &lists.lines, force_open);
    item_group(ui, state, "Rectangles", &lists.rectangles, force_open);
    item_group(ui, state, "Circles", &lists.circles, force_open);
}

fn item_group(
    ui: &mut Ui,
    state: &mut EditorState,
    title: &str,
    entries: &[ListEntry],
    force_open: Option<bool>,
) {
    CollapsingHeader::new(format!("{title} ({})", entries.len()))
        .id_source(title)
        .default_open(true)
        .open(force_open)
        .show(ui, |ui| {
            if entries.is_empty() {
                ui.label(RichText::new("None yet").weak());
                return;
            }
            for entry in entries {
                item_row(ui, state, entry);
            }
        });
}

fn item_row(ui: &mut Ui, state: &mut EditorState, entry: &ListEntry) {
    ui.horizontal(|ui| {
        color_swatch(ui, entry.color);

        let selected = state
            .document
            .selection
            .is_some_and(|sel| sel.kind == entry.kind && sel.id == entry.id);
        let mut label = RichText::new(&entry.label);
        if entry.hidden {
            label = label.weak().strikethrough();
        }
        if ui.selectable_label(selected, label).clicked() {
            state.document.select(entry.kind, entry.id);
        }

        let eye = if entry.hidden { "Show" } else { "Hide" };
        if ui.small_button(eye).clicked() {
            state
                .document
                .set_hidden(entry.kind, entry.id, !entry.hidden);
        }
        if ui.small_button("✖").on_hover_text("Delete").clicked() {
            state.document.soft_delete(entry.kind, entry.id);
            state.set_status("Deleted");
        }
    });
}

fn color_swatch(ui: &mut Ui, color: Rgb) {
    let (rect, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
    ui.painter().rect_filled(rect, 2.0, color.color32());
    ui.painter()
        .rect_stroke(rect, 2.0, Stroke::new(1.0, Color32::from_gray(90)));
}

fn properties_section(ui: &mut Ui, state: &mut EditorState) {
    ui.label(RichText::new("Selection").strong());
    let Some(selection) = state.document.resolve_selection() else {
        ui.label(RichText::new("Nothing selected").weak());
        return;
    };

    match selection.kind {
        ItemKind::Reference => {
            ui.label("Reference line. Edit its length above or redraw it.");
        }
        ItemKind::Line => line_properties(ui, state, selection.id),
        ItemKind::Shape => shape_properties(ui, state, selection.id),
    }
}

fn line_properties(ui: &mut Ui, state: &mut EditorState, id: u64) {
    let Some(line) = state.document.line_by_id(id) else {
        return;
    };
    let mut name = line.name.clone();
    let mut rgb = line.color.0;
    let distance = format!("{:.2} {}", line.real_distance, line.unit);

    ui.horizontal(|ui| {
        ui.label("Name");
        ui.text_edit_singleline(&mut name);
    });
    ui.horizontal(|ui| {
        ui.label("Color");
        ui.color_edit_button_srgb(&mut rgb);
    });
    ui.label(format!("Length: {distance}"));

    let patch = StylePatch {
        name: Some(name),
        color: Some(Rgb(rgb)),
        ..StylePatch::default()
    };
    state.document.update_style(ItemKind::Line, id, patch);
}

fn shape_properties(ui: &mut Ui, state: &mut EditorState, id: u64) {
    let Some(shape) = state.document.shape_by_id(id) else {
        return;
    };
    let mut name = shape.name.clone();
    let mut rgb = shape.color.0;
    let mut fill = shape.fill;
    let mut opacity = shape.fill_opacity;
    let mut rotation = shape.rotation;
    let mut show_text = shape.show_text;
    let kind = shape.kind.clone();

    ui.horizontal(|ui| {
        ui.label("Name");
        ui.text_edit_singleline(&mut name);
    });
    ui.horizontal(|ui| {
        ui.label("Color");
        ui.color_edit_button_srgb(&mut rgb);
    });
    ui.checkbox(&mut show_text, "Show dimensions");
    ui.checkbox(&mut fill, "Fill");
    if fill {
        // Presented as 0-100 percent, stored as 0-1.
        let mut percent = (opacity * 100.0).round() as u32;
        ui.horizontal(|ui| {
            ui.label("Opacity");
            if ui
                .add(egui::Slider::new(&mut percent, 0..=100).suffix("%"))
                .changed()
            {
                opacity = percent as f32 / 100.0;
            }
        });
    }
    ui.horizontal(|ui| {
        ui.label("Rotation");
        // Free-form degrees; only the 90-degree shortcut wraps.
        ui.add(DragValue::new(&mut rotation).speed(1.0).suffix("°"));
        if ui.button("⟳ 90°").on_hover_text("Rotate (R)").clicked() {
            state.document.rotate_shape_90(id);
            rotation = state
                .document
                .shape_by_id(id)
                .map(|s| s.rotation)
                .unwrap_or(rotation);
        }
    });

    state.document.update_style(
        ItemKind::Shape,
        id,
        StylePatch {
            name: Some(name),
            color: Some(Rgb(rgb)),
            fill: Some(fill),
            fill_opacity: Some(opacity),
            rotation: Some(rotation),
            show_text: Some(show_text),
        },
    );

    dimension_editor(ui, state, id, kind);
}

fn dimension_editor(ui: &mut Ui, state: &mut EditorState, id: u64, kind: ShapeKind) {
    let unit = state
        .document
        .scale
        .as_ref()
        .map(|scale| scale.unit.clone())
        .unwrap_or_default();

    match kind {
        ShapeKind::Rectangle {
            real_width,
            real_height,
            ..
        } => {
            let mut width = real_width;
            let mut height = real_height;
            let mut changed = false;
            ui.horizontal(|ui| {
                ui.label("W");
                changed |= ui
                    .add(
                        DragValue::new(&mut width)
                            .speed(0.1)
                            .clamp_range(0.01..=f32::MAX)
                            .suffix(format!(" {unit}")),
                    )
                    .changed();
                ui.label("H");
                changed |= ui
                    .add(
                        DragValue::new(&mut height)
                            .speed(0.1)
                            .clamp_range(0.01..=f32::MAX)
                            .suffix(format!(" {unit}")),
                    )
                    .changed();
            });
            if changed {
                if let Err(err) = state
                    .document
                    .update_dimensions(id, DimensionEdit::Rectangle { width, height })
                {
                    state.set_status(err.to_string());
                }
            }
        }
        ShapeKind::Circle { real_diameter, .. } => {
            let mut diameter = real_diameter;
            ui.horizontal(|ui| {
                ui.label("⌀");
                if ui
                    .add(
                        DragValue::new(&mut diameter)
                            .speed(0.1)
                            .clamp_range(0.01..=f32::MAX)
                            .suffix(format!(" {unit}")),
                    )
                    .changed()
                {
                    if let Err(err) = state
                        .document
                        .update_dimensions(id, DimensionEdit::Circle { diameter })
                    {
                        state.set_status(err.to_string());
                    }
                }
            });
        }
    }
}
