use std::path::PathBuf;

use egui::{Align2, CentralPanel, Context, Key, SidePanel, TopBottomPanel, Vec2};
use tracing::{error, info};

use crate::clipboard;
use crate::flatten::{self, FlattenOptions};
use crate::loader::{ImageLoader, LoadEvent};
use crate::sidebar;
use crate::state::EditorState;
use crate::toolbar::{self, ToolbarAction};
use crate::canvas;

pub struct PlanMarkApp {
    state: EditorState,
    loader: ImageLoader,
}

impl PlanMarkApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            state: EditorState::default(),
            loader: ImageLoader::new(),
        }
    }

    fn poll_loader(&mut self, ctx: &Context) {
        match self.loader.try_recv() {
            Some(LoadEvent::Loaded { path, image, .. }) => {
                info!(path = %path.display(), width = image.width(), height = image.height(), "image loaded");
                self.state.reset_for_new_image(ctx, image);
            }
            Some(LoadEvent::Failed { path, message, .. }) => {
                error!(path = %path.display(), %message, "image load failed");
                self.state.set_status(format!("Cannot open image: {message}"));
            }
            None => {}
        }
        if self.loader.is_loading() {
            // Keep polling while the decode runs.
            ctx.request_repaint_after(std::time::Duration::from_millis(50));
        }
    }

    fn open_image_dialog(&mut self) {
        let mut dialog = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "webp"]);
        if let Some(dir) = &self.state.settings.last_open_dir {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.pick_file() else {
            return;
        };
        if let Some(parent) = path.parent() {
            self.state.settings.last_open_dir = Some(parent.to_path_buf());
            if let Err(err) = self.state.settings.save() {
                error!("cannot save settings: {err:#}");
            }
        }
        self.state.set_status(format!("Loading {}…", path.display()));
        self.loader.request(path);
    }

    fn flatten_current(&self) -> Option<anyhow::Result<image::DynamicImage>> {
        let image = self.state.image.as_ref()?;
        let options = FlattenOptions {
            canvas_width: self.state.canvas_size.x.round() as u32,
            canvas_height: self.state.canvas_size.y.round() as u32,
            show_reference: self.state.show_reference,
            show_all_text: self.state.show_all_text,
            show_all_objects: self.state.show_all_objects,
        };
        Some(flatten::flatten(&image.dynamic, &self.state.document, options))
    }

    fn export_png(&mut self) {
        let Some(result) = self.flatten_current() else {
            return;
        };
        let flattened = match result {
            Ok(flattened) => flattened,
            Err(err) => {
                error!("flatten failed: {err:#}");
                self.state.set_status(format!("Export failed: {err:#}"));
                return;
            }
        };

        let default_name = format!(
            "planmark-{}.png",
            chrono::Local::now().format("%Y%m%d-%H%M%S")
        );
        let mut dialog = rfd::FileDialog::new()
            .add_filter("PNG image", &["png"])
            .set_file_name(&default_name);
        if let Some(dir) = &self.state.settings.last_open_dir {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.save_file() else {
            return;
        };

        match self.write_png(&flattened, &path) {
            Ok(()) => {
                info!(path = %path.display(), "exported");
                self.state.set_status(format!("Exported {}", path.display()));
            }
            Err(err) => {
                error!("export failed: {err:#}");
                self.state.set_status(format!("Export failed: {err:#}"));
            }
        }
    }

    fn write_png(&self, image: &image::DynamicImage, path: &PathBuf) -> anyhow::Result<()> {
        let bytes = flatten::encode_png(image)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn copy_to_clipboard(&mut self) {
        let Some(result) = self.flatten_current() else {
            return;
        };
        let status = match result.and_then(|flattened| {
            clipboard::copy_image(&flattened)?;
            Ok(())
        }) {
            Ok(()) => "Copied to clipboard".to_string(),
            Err(err) => {
                error!("clipboard copy failed: {err:#}");
                format!("Copy failed: {err:#}")
            }
        };
        self.state.set_status(status);
    }

    fn show_reference_prompt(&mut self, ctx: &Context) {
        let Some(mut pending) = self.state.pending_reference.take() else {
            return;
        };
        let mut confirm = false;
        let mut cancel = false;

        egui::Window::new("Reference length")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(format!(
                    "The line spans {:.0} px. Enter the real distance it covers.",
                    pending.segment.length()
                ));
                ui.horizontal(|ui| {
                    ui.label("Length");
                    let response = ui.text_edit_singleline(&mut pending.length_input);
                    if pending.length_input.is_empty() && !response.has_focus() {
                        response.request_focus();
                    }
                    ui.label("Unit");
                    ui.add(
                        egui::TextEdit::singleline(&mut pending.unit_input).desired_width(48.0),
                    );
                });
                ui.horizontal(|ui| {
                    if ui.button("Set scale").clicked()
                        || ui.input(|input| input.key_pressed(Key::Enter))
                    {
                        confirm = true;
                    }
                    if ui.button("Cancel").clicked()
                        || ui.input(|input| input.key_pressed(Key::Escape))
                    {
                        cancel = true;
                    }
                });
            });

        if cancel {
            self.state.set_status("Reference discarded");
            return;
        }
        if confirm {
            let unit = pending.unit_input.trim();
            let unit = if unit.is_empty() {
                self.state.settings.default_unit.clone()
            } else {
                unit.to_string()
            };
            // Invalid input aborts the gesture: the drawn line is
            // discarded, the previous scale (if any) stays.
            let Ok(value) = pending.length_input.trim().parse::<f32>() else {
                self.state
                    .set_status("Invalid length, reference discarded");
                return;
            };
            match self.state.apply_reference(pending.segment, value, &unit) {
                Ok(()) => {
                    if self.state.settings.default_unit != unit {
                        self.state.settings.default_unit = unit.clone();
                        if let Err(err) = self.state.settings.save() {
                            error!("cannot save settings: {err:#}");
                        }
                    }
                }
                Err(err) => {
                    self.state
                        .set_status(format!("{err}, reference discarded"));
                }
            }
            return;
        }
        self.state.pending_reference = Some(pending);
    }

    fn show_clear_all_confirm(&mut self, ctx: &Context) {
        if !self.state.confirm_clear_all {
            return;
        }
        let mut clear = false;
        let mut keep = false;

        egui::Window::new("Clear all measurements?")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label("All lines and shapes will be removed. The scale is kept.");
                ui.horizontal(|ui| {
                    if ui.button("Clear all").clicked() {
                        clear = true;
                    }
                    if ui.button("Keep").clicked()
                        || ui.input(|input| input.key_pressed(Key::Escape))
                    {
                        keep = true;
                    }
                });
            });

        if clear {
            self.state.document.clear_all();
            self.state.set_status("All measurements cleared");
        }
        if clear || keep {
            self.state.confirm_clear_all = false;
        }
    }
}

impl eframe::App for PlanMarkApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.poll_loader(ctx);

        let mut action = None;
        TopBottomPanel::top("planmark_toolbar").show(ctx, |ui| {
            action = toolbar::show_toolbar(ui, &mut self.state);
        });

        match action {
            Some(ToolbarAction::OpenImage) => self.open_image_dialog(),
            Some(ToolbarAction::ExportPng) => self.export_png(),
            Some(ToolbarAction::CopyToClipboard) => self.copy_to_clipboard(),
            None => {}
        }

        SidePanel::right("planmark_sidebar")
            .default_width(280.0)
            .show(ctx, |ui| {
                sidebar::show_sidebar(ui, &mut self.state);
            });

        TopBottomPanel::bottom("planmark_status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.loader.is_loading() {
                    ui.spinner();
                }
                ui.label(&self.state.status);
            });
        });

        CentralPanel::default().show(ctx, |ui| {
            canvas::show_canvas(ui, ctx, &mut self.state);
        });

        self.show_reference_prompt(ctx);
        self.show_clear_all_confirm(ctx);
    }
}
