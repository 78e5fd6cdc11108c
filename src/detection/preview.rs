//! Annotated preview: detection boxes and labels drawn over the photo.

use crate::constants::model::DEFAULT_CLASS_NAME;
use crate::detection::BoxDetection;
use crate::error::{Error, Result};
use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::{debug, warn};

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const BOX_THICKNESS: i32 = 3;
const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_HEIGHT: u32 = 20;
const LABEL_PADDING: i32 = 2;
/// Average glyph width used to size the label band when no font is loaded.
const LABEL_CHAR_WIDTH: f32 = 9.0;

/// Fonts tried when the config names none.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Class names and label font for the preview.
pub struct PreviewStyle {
    class_names: Vec<String>,
    font: Option<FontVec>,
}

impl Default for PreviewStyle {
    fn default() -> Self {
        Self::new(&[DEFAULT_CLASS_NAME.to_string()], None)
    }
}

impl PreviewStyle {
    /// Label boxes with `class_names`, drawing text with the font at
    /// `font_path` or the first system font found.
    ///
    /// Without a usable font the label band is drawn without text.
    pub fn new(class_names: &[String], font_path: Option<&Path>) -> Self {
        let font = match font_path {
            Some(path) => load_font(path),
            None => SYSTEM_FONTS
                .iter()
                .map(Path::new)
                .filter(|p| p.is_file())
                .find_map(load_font),
        };
        if font.is_none() {
            debug!("No label font available, preview labels will have no text");
        }

        Self {
            class_names: class_names.to_vec(),
            font,
        }
    }

    /// Label text for one box, e.g. `Iguana 87.5%`.
    pub fn label(&self, detection: &BoxDetection) -> String {
        let name = self
            .class_names
            .get(detection.class_id)
            .map_or("Unknown", String::as_str);
        format!("{} {:.1}%", capitalize(name), detection.confidence * 100.0)
    }
}

fn load_font(path: &Path) -> Option<FontVec> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Could not read font {}: {e}", path.display());
            return None;
        }
    };
    match FontVec::try_from_vec(bytes) {
        Ok(font) => {
            debug!("Preview label font: {}", path.display());
            Some(font)
        }
        Err(e) => {
            warn!("Invalid font {}: {e}", path.display());
            None
        }
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Draw every box and its label onto a copy of `image`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]
pub fn render_preview(image: &DynamicImage, detections: &[BoxDetection], style: &PreviewStyle) -> RgbImage {
    let mut canvas = image.to_rgb8();

    for detection in detections {
        let [x1, y1, x2, y2] = detection.bbox;
        let width = (x2 - x1).round().max(0.0) as u32;
        let height = (y2 - y1).round().max(0.0) as u32;
        if width == 0 || height == 0 {
            continue;
        }
        let (left, top) = (x1.round() as i32, y1.round() as i32);

        // Nested rectangles give the outline its thickness.
        for inset in 0..BOX_THICKNESS {
            let w = width.saturating_sub(2 * inset as u32);
            let h = height.saturating_sub(2 * inset as u32);
            if w == 0 || h == 0 {
                break;
            }
            draw_hollow_rect_mut(&mut canvas, Rect::at(left + inset, top + inset).of_size(w, h), BOX_COLOR);
        }

        draw_label(&mut canvas, left, top, &style.label(detection), style.font.as_ref());
    }

    canvas
}

/// Filled band above the box (inside it when at the top edge) with the text.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss
)]
fn draw_label(canvas: &mut RgbImage, left: i32, top: i32, text: &str, font: Option<&FontVec>) {
    let scale = PxScale::from(LABEL_FONT_SIZE);
    let text_width = font.map_or_else(
        || (text.chars().count() as f32 * LABEL_CHAR_WIDTH) as u32,
        |font| text_size(scale, font, text).0,
    );

    let x = left.max(0);
    let y = if top >= LABEL_HEIGHT as i32 {
        top - LABEL_HEIGHT as i32
    } else {
        top.max(0)
    };
    let room = canvas.width().saturating_sub(x as u32);
    let band_width = (text_width + 2 * LABEL_PADDING as u32).min(room);
    if band_width == 0 {
        return;
    }

    draw_filled_rect_mut(canvas, Rect::at(x, y).of_size(band_width, LABEL_HEIGHT), BOX_COLOR);
    if let Some(font) = font {
        draw_text_mut(
            canvas,
            LABEL_TEXT_COLOR,
            x + LABEL_PADDING,
            y + LABEL_PADDING,
            scale,
            font,
            text,
        );
    }
}

/// Render the preview and write it to `output`. Format follows the extension.
pub fn save_preview(
    image: &DynamicImage,
    detections: &[BoxDetection],
    style: &PreviewStyle,
    output: &Path,
) -> Result<()> {
    render_preview(image, detections, style)
        .save(output)
        .map_err(|e| Error::PreviewWrite {
            path: output.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn detection(bbox: [f32; 4]) -> BoxDetection {
        BoxDetection {
            confidence: 0.875,
            class_id: 0,
            bbox,
        }
    }

    fn plain_style() -> PreviewStyle {
        PreviewStyle {
            class_names: vec!["iguana".to_string()],
            font: None,
        }
    }

    #[test]
    fn test_label_names_class_and_confidence() {
        let style = plain_style();
        assert_eq!(style.label(&detection([0.0, 0.0, 1.0, 1.0])), "Iguana 87.5%");

        let other = BoxDetection {
            class_id: 4,
            ..detection([0.0, 0.0, 1.0, 1.0])
        };
        assert_eq!(style.label(&other), "Unknown 87.5%");
    }

    #[test]
    fn test_box_outline_is_red() {
        let image = DynamicImage::new_rgb8(80, 80);
        let preview = render_preview(&image, &[detection([10.0, 30.0, 50.0, 70.0])], &plain_style());

        assert_eq!(*preview.get_pixel(10, 30), BOX_COLOR);
        assert_eq!(*preview.get_pixel(12, 50), BOX_COLOR);
        // Inside the outline stays untouched.
        assert_eq!(*preview.get_pixel(30, 50), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_label_band_sits_above_box() {
        let image = DynamicImage::new_rgb8(200, 80);
        let preview = render_preview(&image, &[detection([10.0, 30.0, 50.0, 70.0])], &plain_style());

        assert_eq!(*preview.get_pixel(12, 15), BOX_COLOR);
        // The band is sized to the text, so it reaches past the box's right edge.
        assert_eq!(*preview.get_pixel(80, 15), BOX_COLOR);
        assert_eq!(*preview.get_pixel(12, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_label_moves_inside_box_at_top_edge() {
        let image = DynamicImage::new_rgb8(200, 80);
        let preview = render_preview(&image, &[detection([10.0, 2.0, 60.0, 60.0])], &plain_style());
        assert_eq!(*preview.get_pixel(30, 12), BOX_COLOR);
    }

    #[test]
    fn test_degenerate_box_is_skipped() {
        let image = DynamicImage::new_rgb8(20, 20);
        let preview = render_preview(&image, &[detection([5.0, 5.0, 5.0, 15.0])], &plain_style());
        assert!(preview.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_unreadable_font_falls_back_to_plain_band() {
        let dir = TempDir::new().unwrap();
        let bogus = dir.path().join("font.ttf");
        std::fs::write(&bogus, b"not a font").unwrap();

        let style = PreviewStyle::new(&["iguana".to_string()], Some(&bogus));
        assert!(style.font.is_none());
    }

    #[test]
    fn test_save_preview_writes_file() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("preview.png");
        let image = DynamicImage::new_rgb8(20, 20);

        save_preview(&image, &[detection([2.0, 2.0, 18.0, 18.0])], &plain_style(), &output).unwrap();
        let reloaded = image::open(&output).unwrap();
        assert_eq!(reloaded.width(), 20);
    }
}
