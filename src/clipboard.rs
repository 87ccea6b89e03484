use std::borrow::Cow;

use anyhow::{Context, Result};
use arboard::Clipboard;
use image::DynamicImage;

/// Put a flattened export on the system clipboard as raw RGBA.
pub fn copy_image(image: &DynamicImage) -> Result<()> {
    let mut clipboard = Clipboard::new().context("cannot initialize clipboard")?;
    let rgba = image.to_rgba8();
    let width = rgba.width() as usize;
    let height = rgba.height() as usize;
    clipboard
        .set_image(arboard::ImageData {
            width,
            height,
            bytes: Cow::Owned(rgba.into_raw()),
        })
        .context("cannot write image to clipboard")
}
