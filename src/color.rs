use anyhow::{anyhow, Result};
use egui::Color32;
use serde::{Deserialize, Serialize};

/// Default stroke colors per item kind: red lines, orange rectangles,
/// light-blue circles.
pub const DEFAULT_LINE: Rgb = Rgb([0xFF, 0x00, 0x00]);
pub const DEFAULT_RECTANGLE: Rgb = Rgb([0xFF, 0xA5, 0x00]);
pub const DEFAULT_CIRCLE: Rgb = Rgb([0x00, 0xBF, 0xFF]);

/// Brightness delta applied to a selected item's color.
pub const SELECTED_SHIFT: i16 = -30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow!("invalid hex color '{hex}'"));
        }
        let r = u8::from_str_radix(&digits[0..2], 16)?;
        let g = u8::from_str_radix(&digits[2..4], 16)?;
        let b = u8::from_str_radix(&digits[4..6], 16)?;
        Ok(Rgb([r, g, b]))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2])
    }

    pub fn color32(self) -> Color32 {
        Color32::from_rgb(self.0[0], self.0[1], self.0[2])
    }

    /// Translucent variant used for shape fills, `opacity` in 0–1.
    pub fn fill_color32(self, opacity: f32) -> Color32 {
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        Color32::from_rgba_unmultiplied(self.0[0], self.0[1], self.0[2], alpha)
    }

    /// Shift brightness by `delta`, clamping each channel to 0..=255.
    pub fn adjusted(self, delta: i16) -> Rgb {
        let shift = |c: u8| (c as i16 + delta).clamp(0, 255) as u8;
        Rgb([shift(self.0[0]), shift(self.0[1]), shift(self.0[2])])
    }

    /// The darker rendition used for selected strokes and handles.
    pub fn selected(self) -> Rgb {
        self.adjusted(SELECTED_SHIFT)
    }
}
