use egui::{Align, Layout, RichText, Ui};

use crate::interaction::Mode;
use crate::state::EditorState;

/// Actions the toolbar requests from the app; file dialogs and export
/// plumbing live there, not here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolbarAction {
    OpenImage,
    ExportPng,
    CopyToClipboard,
}

/// Whether a tool can be activated right now. Measurement tools stay
/// disabled until both an image and a scale exist; Reference only needs
/// the image.
pub fn mode_enabled(mode: Mode, has_image: bool, has_scale: bool) -> bool {
    if !has_image {
        return mode == Mode::Select;
    }
    if mode.requires_scale() {
        return has_scale;
    }
    true
}

pub fn show_toolbar(ui: &mut Ui, state: &mut EditorState) -> Option<ToolbarAction> {
    let mut action = None;
    let has_image = state.image.is_some();
    let has_scale = state.document.scale.is_some();

    ui.horizontal(|ui| {
        if ui.button("Open…").clicked() {
            action = Some(ToolbarAction::OpenImage);
        }
        ui.separator();

        for mode in [
            Mode::Select,
            Mode::Reference,
            Mode::Line,
            Mode::Rectangle,
            Mode::Circle,
        ] {
            let enabled = mode_enabled(mode, has_image, has_scale);
            let selected = state.interaction.mode == mode;
            let response = ui.add_enabled(
                enabled,
                egui::SelectableLabel::new(selected, mode.label()),
            );
            let response = if enabled || has_image {
                response
            } else {
                response.on_disabled_hover_text("Open an image first")
            };
            let response = if !enabled && has_image && mode.requires_scale() {
                response.on_disabled_hover_text("Set the reference scale first")
            } else {
                response
            };
            if response.clicked() {
                state.enter_mode(mode);
                state.set_status(match mode {
                    Mode::Select => "Click an item to select it, drag to move",
                    Mode::Reference => "Drag along a known distance",
                    Mode::Line => "Drag to measure a distance",
                    Mode::Rectangle => "Drag a box to measure an area",
                    Mode::Circle => "Drag a box; the circle fills it",
                });
            }
        }

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            let clear_enabled = has_image
                && (!state.document.lines().is_empty() || !state.document.shapes().is_empty());
            if ui
                .add_enabled(clear_enabled, egui::Button::new("Clear all"))
                .clicked()
            {
                state.confirm_clear_all = true;
            }
            ui.separator();
            if ui
                .add_enabled(has_image, egui::Button::new("Copy"))
                .on_hover_text("Copy the annotated image to the clipboard")
                .clicked()
            {
                action = Some(ToolbarAction::CopyToClipboard);
            }
            if ui
                .add_enabled(has_image, egui::Button::new("Export PNG"))
                .clicked()
            {
                action = Some(ToolbarAction::ExportPng);
            }
        });
    });

    if !has_scale && has_image {
        ui.label(
            RichText::new("No scale yet: draw a reference line over a known distance")
                .weak()
                .small(),
        );
    }

    action
}

#[cfg(test)]
mod tests {
    use super::mode_enabled;
    use crate::interaction::Mode;

    #[test]
    fn measurement_tools_wait_for_calibration() {
        assert!(!mode_enabled(Mode::Line, true, false));
        assert!(!mode_enabled(Mode::Rectangle, true, false));
        assert!(mode_enabled(Mode::Reference, true, false));
        assert!(mode_enabled(Mode::Line, true, true));
    }

    #[test]
    fn only_select_works_without_an_image() {
        assert!(mode_enabled(Mode::Select, false, false));
        assert!(!mode_enabled(Mode::Reference, false, false));
        assert!(!mode_enabled(Mode::Circle, false, true));
    }
}
