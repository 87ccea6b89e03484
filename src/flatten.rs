use ab_glyph::FontArc;
use anyhow::{anyhow, Context, Result};
use image::{imageops::FilterType, DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::annotation::ShapeKind;
use crate::color::Rgb;
use crate::document::Document;
use crate::geometry::Point;
use crate::state::REFERENCE_COLOR;

const LABEL_SCALE: f32 = 14.0;

/// What the export includes; mirrors the on-screen visibility toggles.
#[derive(Clone, Copy, Debug)]
pub struct FlattenOptions {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub show_reference: bool,
    pub show_all_text: bool,
    pub show_all_objects: bool,
}

/// Render the document over the image at canvas size, so the output
/// matches the on-screen coordinate space the annotations live in.
pub fn flatten(image: &DynamicImage, doc: &Document, options: FlattenOptions) -> Result<DynamicImage> {
    let width = options.canvas_width.max(1);
    let height = options.canvas_height.max(1);
    let mut pixmap =
        Pixmap::new(width, height).ok_or_else(|| anyhow!("cannot allocate pixmap"))?;

    let resized = image.resize_exact(width, height, FilterType::Lanczos3);
    copy_image_to_pixmap(&resized, &mut pixmap)?;

    if options.show_reference {
        if let Some(scale) = &doc.scale {
            stroke_line(
                &mut pixmap,
                scale.segment.start,
                scale.segment.end,
                REFERENCE_COLOR,
                2.0,
            )?;
        }
    }

    if options.show_all_objects {
        for line in doc.lines().iter().filter(|l| !l.deleted && !l.hidden) {
            stroke_line(
                &mut pixmap,
                line.segment.start,
                line.segment.end,
                line.color,
                2.0,
            )?;
        }
        for shape in doc.shapes().iter().filter(|s| !s.deleted && !s.hidden) {
            draw_shape(&mut pixmap, shape)?;
        }
    }

    let mut output = RgbaImage::from_raw(width, height, pixmap.data().to_vec())
        .ok_or_else(|| anyhow!("cannot construct output image"))?;

    if options.show_all_text {
        draw_labels(&mut output, doc, options);
    }

    Ok(DynamicImage::ImageRgba8(output))
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .context("cannot encode PNG")?;
    Ok(buffer.into_inner())
}

fn copy_image_to_pixmap(image: &DynamicImage, pixmap: &mut Pixmap) -> Result<()> {
    let rgba = image.to_rgba8();
    let data = pixmap.data_mut();
    if data.len() != rgba.len() {
        return Err(anyhow!("image and pixmap size mismatch"));
    }
    data.copy_from_slice(rgba.as_raw());
    Ok(())
}

fn solid_paint(color: Rgb) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.0[0], color.0[1], color.0[2], 255);
    paint.anti_alias = true;
    paint
}

fn stroke_line(
    pixmap: &mut Pixmap,
    from: Point,
    to: Point,
    color: Rgb,
    width: f32,
) -> Result<()> {
    let mut pb = PathBuilder::new();
    pb.move_to(from.x, from.y);
    pb.line_to(to.x, to.y);
    let path = pb.finish().ok_or_else(|| anyhow!("cannot build line path"))?;
    let stroke = Stroke {
        width,
        ..Default::default()
    };
    pixmap.stroke_path(&path, &solid_paint(color), &stroke, Transform::identity(), None);
    Ok(())
}

fn draw_shape(pixmap: &mut Pixmap, shape: &crate::annotation::Shape) -> Result<()> {
    let stroke = Stroke {
        width: 2.0,
        ..Default::default()
    };
    let paint = solid_paint(shape.color);

    let (path, transform) = match &shape.kind {
        ShapeKind::Rectangle { min, max, .. } => {
            let rect = tiny_skia::Rect::from_ltrb(min.x, min.y, max.x, max.y)
                .ok_or_else(|| anyhow!("degenerate rectangle"))?;
            let center = min.midpoint(*max);
            (
                PathBuilder::from_rect(rect),
                // Presentation rotation around the shape center.
                Transform::from_rotate_at(shape.rotation, center.x, center.y),
            )
        }
        ShapeKind::Circle {
            center, radius_px, ..
        } => {
            let mut pb = PathBuilder::new();
            pb.push_circle(center.x, center.y, radius_px.max(0.5));
            (
                pb.finish().ok_or_else(|| anyhow!("cannot build circle path"))?,
                Transform::identity(),
            )
        }
    };

    if shape.fill {
        let mut fill_paint = Paint::default();
        let alpha = (shape.fill_opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        fill_paint.set_color_rgba8(shape.color.0[0], shape.color.0[1], shape.color.0[2], alpha);
        fill_paint.anti_alias = true;
        pixmap.fill_path(&path, &fill_paint, FillRule::Winding, transform, None);
    }
    pixmap.stroke_path(&path, &paint, &stroke, transform, None);
    Ok(())
}

fn draw_labels(image: &mut RgbaImage, doc: &Document, options: FlattenOptions) {
    let Some(font) = load_system_font() else {
        return;
    };

    let mut label_at = |text: &str, anchor: Point, color: Rgb, centered: bool| {
        let (x, y) = if centered {
            let (w, h) = text_size(LABEL_SCALE, &font, text);
            (
                anchor.x - w as f32 * 0.5,
                anchor.y - h as f32 * 0.5,
            )
        } else {
            // Midpoint nudge: right of and above the line.
            (anchor.x + 5.0, anchor.y - 5.0 - LABEL_SCALE)
        };
        draw_text_mut(
            image,
            Rgba([color.0[0], color.0[1], color.0[2], 255]),
            x as i32,
            y as i32,
            LABEL_SCALE,
            &font,
            text,
        );
    };

    if options.show_reference {
        if let Some(scale) = &doc.scale {
            label_at(&scale.label(), scale.center(), REFERENCE_COLOR, false);
        }
    }

    if options.show_all_objects {
        for line in doc.lines().iter().filter(|l| !l.deleted && !l.hidden) {
            label_at(&line.label(), line.center(), line.color, false);
        }
        for shape in doc.shapes().iter().filter(|s| !s.deleted && !s.hidden) {
            if shape.show_text {
                label_at(&shape.label(), shape.center(), shape.color, true);
            }
        }
    }
}

fn load_system_font() -> Option<FontArc> {
    let candidates = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/System/Library/Fonts/SFNS.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];

    for path in candidates {
        if let Ok(bytes) = std::fs::read(path) {
            if let Ok(font) = FontArc::try_from_vec(bytes) {
                return Some(font);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, RgbaImage};

    use super::{flatten, FlattenOptions};
    use crate::document::Document;
    use crate::geometry::{Point, Segment};

    fn options(width: u32, height: u32) -> FlattenOptions {
        FlattenOptions {
            canvas_width: width,
            canvas_height: height,
            show_reference: true,
            show_all_text: false,
            show_all_objects: true,
        }
    }

    #[test]
    fn flatten_renders_at_canvas_size() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            800,
            600,
            image::Rgba([255, 255, 255, 255]),
        ));
        let mut doc = Document::default();
        doc.define_scale(
            Segment::new(Point::new(50.0, 50.0), Point::new(150.0, 50.0)),
            50.0,
            "cm",
        )
        .expect("scale");
        doc.add_rectangle(Point::new(20.0, 20.0), Point::new(120.0, 80.0))
            .expect("rect");

        // The canvas was showing the image at half size.
        let result = flatten(&image, &doc, options(400, 300)).expect("flatten");
        assert_eq!(result.width(), 400);
        assert_eq!(result.height(), 300);
    }

    #[test]
    fn rendering_is_deterministic() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            300,
            200,
            image::Rgba([240, 240, 240, 255]),
        ));
        let mut doc = Document::default();
        doc.define_scale(
            Segment::new(Point::new(20.0, 20.0), Point::new(220.0, 20.0)),
            100.0,
            "cm",
        )
        .expect("scale");
        doc.add_line(Segment::new(Point::new(30.0, 100.0), Point::new(200.0, 150.0)))
            .expect("line");
        doc.add_circle(Point::new(100.0, 60.0), Point::new(180.0, 140.0))
            .expect("circle");

        let first = flatten(&image, &doc, options(300, 200)).expect("flatten");
        let second = flatten(&image, &doc, options(300, 200)).expect("flatten");
        assert_eq!(first.to_rgba8().as_raw(), second.to_rgba8().as_raw());
    }

    #[test]
    fn hidden_items_are_left_out() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            200,
            200,
            image::Rgba([255, 255, 255, 255]),
        ));
        let mut doc = Document::default();
        doc.define_scale(
            Segment::new(Point::new(10.0, 10.0), Point::new(110.0, 10.0)),
            50.0,
            "cm",
        )
        .expect("scale");
        let id = doc
            .add_line(Segment::new(Point::new(50.0, 100.0), Point::new(150.0, 100.0)))
            .expect("line");
        doc.set_hidden(crate::document::ItemKind::Line, id, true);

        let plain = flatten(
            &image,
            &Document::default(),
            FlattenOptions {
                show_reference: false,
                ..options(200, 200)
            },
        )
        .expect("flatten");
        let with_hidden = flatten(
            &image,
            &doc,
            FlattenOptions {
                show_reference: false,
                ..options(200, 200)
            },
        )
        .expect("flatten");
        // A hidden line leaves no trace; the renders are identical.
        assert_eq!(plain.to_rgba8().as_raw(), with_hidden.to_rgba8().as_raw());
    }
}
