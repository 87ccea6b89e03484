use std::path::PathBuf;

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use egui::{ColorImage, Context as EguiContext, TextureHandle, TextureOptions, Vec2};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::document::Document;
use crate::geometry::Segment;
use crate::interaction::{Interaction, Mode};

/// Reference line colors: green, brighter green when selected.
pub const REFERENCE_COLOR: Rgb = Rgb([0x00, 0xFF, 0x00]);
pub const REFERENCE_SELECTED_COLOR: Rgb = Rgb([0x00, 0xBB, 0x00]);

pub struct EditorImage {
    pub dynamic: DynamicImage,
    pub texture: Option<TextureHandle>,
}

impl EditorImage {
    pub fn new(dynamic: DynamicImage) -> Self {
        Self {
            dynamic,
            texture: None,
        }
    }

    pub fn size_vec2(&self) -> Vec2 {
        Vec2::new(self.dynamic.width() as f32, self.dynamic.height() as f32)
    }

    /// Canvas size for a given viewport: the image scaled down to fit,
    /// never scaled up. Annotation coordinates live in this space.
    pub fn fit_size(&self, available: Vec2) -> Vec2 {
        let size = self.size_vec2();
        let scale = (available.x / size.x)
            .min(available.y / size.y)
            .min(1.0)
            .max(0.01);
        size * scale
    }

    pub fn ensure_texture(&mut self, ctx: &EguiContext) {
        if self.texture.is_some() {
            return;
        }
        let rgba = self.dynamic.to_rgba8();
        let size = [rgba.width() as usize, rgba.height() as usize];
        let color = ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
        self.texture = Some(ctx.load_texture("plan_image", color, TextureOptions::LINEAR));
    }
}

/// Waiting for the user to confirm the real-world length of a freshly
/// drawn reference line. The scale is not replaced until confirmed.
#[derive(Clone, Debug)]
pub struct PendingReference {
    pub segment: Segment,
    pub length_input: String,
    pub unit_input: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub default_unit: String,
    pub last_open_dir: Option<PathBuf>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            default_unit: "cm".to_string(),
            last_open_dir: None,
        }
    }
}

impl UserSettings {
    fn file_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("com", "planmark", "planmark")?;
        let config_dir = dirs.config_dir();
        std::fs::create_dir_all(config_dir).ok()?;
        Some(config_dir.join("settings.json"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::file_path().context("cannot resolve settings path")?;
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::file_path().context("cannot resolve settings path")?;
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

pub struct EditorState {
    pub image: Option<EditorImage>,
    pub document: Document,
    pub interaction: Interaction,
    /// Reference line visibility; the line keeps working as the scale
    /// while hidden.
    pub show_reference: bool,
    /// Global presentation toggles; transient, reset on restart.
    pub show_all_text: bool,
    pub show_all_objects: bool,
    pub pending_reference: Option<PendingReference>,
    /// In-progress edit of the existing reference length, as typed.
    pub reference_edit: Option<String>,
    pub confirm_clear_all: bool,
    pub status: String,
    /// Canvas size of the last laid-out frame; export renders at this
    /// size so the output matches what is on screen.
    pub canvas_size: Vec2,
    pub settings: UserSettings,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            image: None,
            document: Document::default(),
            interaction: Interaction::default(),
            show_reference: true,
            show_all_text: true,
            show_all_objects: true,
            pending_reference: None,
            reference_edit: None,
            confirm_clear_all: false,
            status: "Open a plan image to start".to_string(),
            canvas_size: Vec2::ZERO,
            settings: UserSettings::load().unwrap_or_default(),
        }
    }
}

impl EditorState {
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Mode entry is a total reset: in-progress primitive, drag state and
    /// the selection are all dropped so nothing stale leaks across modes.
    pub fn enter_mode(&mut self, mode: Mode) {
        self.interaction.set_mode(mode);
        self.document.selection = None;
    }

    /// Confirm a drawn reference line as the scale. On success the active
    /// tool drops back to Select; calibration leaves no tool armed. On
    /// failure the previous scale (if any) stays and the mode is untouched.
    pub fn apply_reference(&mut self, segment: Segment, value: f32, unit: &str) -> Result<()> {
        self.document.define_scale(segment, value, unit)?;
        self.enter_mode(Mode::Select);
        self.set_status(format!("Scale set: {value} {unit}"));
        Ok(())
    }

    /// Replace the image and start a fresh document. The old scale does
    /// not carry over; it was calibrated against different pixels.
    pub fn reset_for_new_image(&mut self, ctx: &EguiContext, image: DynamicImage) {
        let mut editor_image = EditorImage::new(image);
        editor_image.ensure_texture(ctx);
        self.image = Some(editor_image);
        self.document = Document::default();
        self.interaction.set_mode(Mode::Reference);
        self.pending_reference = None;
        self.reference_edit = None;
        self.confirm_clear_all = false;
        self.show_reference = true;
        self.show_all_text = true;
        self.show_all_objects = true;
        self.set_status("Draw the reference line and enter its real length");
    }
}

#[cfg(test)]
mod tests {
    use super::{EditorImage, EditorState};
    use crate::geometry::{Point, Segment};
    use crate::interaction::Mode;
    use egui::Vec2;
    use image::DynamicImage;

    #[test]
    fn confirming_the_reference_returns_to_select() {
        let mut state = EditorState::default();
        state.enter_mode(Mode::Reference);
        let segment = Segment::new(Point::new(10.0, 10.0), Point::new(210.0, 10.0));

        state.apply_reference(segment, 100.0, "cm").expect("scale");

        assert_eq!(state.interaction.mode, Mode::Select);
        assert_eq!(state.document.scale.as_ref().map(|s| s.ratio), Some(0.5));
    }

    #[test]
    fn failed_reference_keeps_the_mode_and_scale() {
        let mut state = EditorState::default();
        state.enter_mode(Mode::Reference);
        let segment = Segment::new(Point::new(10.0, 10.0), Point::new(210.0, 10.0));

        assert!(state.apply_reference(segment, -1.0, "cm").is_err());
        assert_eq!(state.interaction.mode, Mode::Reference);
        assert!(state.document.scale.is_none());
    }

    #[test]
    fn fit_size_scales_down_only() {
        let image = EditorImage::new(DynamicImage::new_rgba8(800, 600));
        // Smaller viewport: shrink preserving aspect.
        let fitted = image.fit_size(Vec2::new(400.0, 400.0));
        assert_eq!(fitted, Vec2::new(400.0, 300.0));
        // Larger viewport: never upscale.
        let fitted = image.fit_size(Vec2::new(2000.0, 2000.0));
        assert_eq!(fitted, Vec2::new(800.0, 600.0));
    }
}
