//! Draws face outlines and confidence labels onto a copy of the input image.

use crate::types::FaceRecord;
use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut, draw_text_mut};
use imageproc::point::Point;
use std::path::Path;
use thiserror::Error;

const OUTLINE_WIDTH: f32 = 5.0;
const OUTLINE_COLOR: Rgb<u8> = Rgb([0x00, 0xff, 0x00]);
const LABEL_COLOR: Rgb<u8> = Rgb([0xff, 0x00, 0x00]);
/// Labels sit this many pixels above the first polygon vertex.
const LABEL_OFFSET_Y: i32 = 30;
pub const DEFAULT_LABEL_SCALE: f32 = 16.0;

/// Fonts tried in order when none is configured.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("font {path}: {reason}")]
    Font { path: String, reason: String },
}

/// A text label and its anchor (top-left corner).
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub x: i32,
    pub y: i32,
}

/// Closed outline of a face: every vertex in order, then the first again.
pub fn outline(face: &FaceRecord) -> Vec<(i32, i32)> {
    let mut points: Vec<(i32, i32)> = face.bounding_poly.iter().map(|v| (v.x, v.y)).collect();
    if let Some(&first) = points.first() {
        points.push(first);
    }
    points
}

/// Confidence label for a face, or `None` if it has no vertices.
pub fn label(face: &FaceRecord) -> Option<Label> {
    let first = face.bounding_poly.first()?;
    Some(Label {
        text: format!("{:.3}%", face.detection_confidence),
        x: first.x,
        y: first.y - LABEL_OFFSET_Y,
    })
}

/// Load a TrueType font for labels.
///
/// An explicit path must load. Without one, well-known system locations are
/// searched and `Ok(None)` is returned if nothing usable is found.
pub fn load_font(explicit: Option<&Path>) -> Result<Option<FontVec>, AnnotateError> {
    if let Some(path) = explicit {
        return read_font(path).map(Some);
    }
    for candidate in SYSTEM_FONT_CANDIDATES {
        let path = Path::new(candidate);
        if !path.exists() {
            continue;
        }
        match read_font(path) {
            Ok(font) => {
                tracing::debug!(path = candidate, "using system font");
                return Ok(Some(font));
            }
            Err(e) => tracing::debug!(path = candidate, error = %e, "skipping font"),
        }
    }
    Ok(None)
}

fn read_font(path: &Path) -> Result<FontVec, AnnotateError> {
    let font_err = |reason: String| AnnotateError::Font {
        path: path.display().to_string(),
        reason,
    };
    let data = std::fs::read(path).map_err(|e| font_err(e.to_string()))?;
    FontVec::try_from_vec(data).map_err(|e| font_err(e.to_string()))
}

/// Renders face annotations.
pub struct Annotator {
    font: Option<FontVec>,
    scale: PxScale,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Annotator {
    /// Without a font, outlines are drawn and labels skipped.
    pub fn new(font: Option<FontVec>) -> Self {
        Self {
            font,
            scale: PxScale::from(DEFAULT_LABEL_SCALE),
        }
    }

    pub fn with_label_scale(mut self, px: f32) -> Self {
        self.scale = PxScale::from(px);
        self
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Decode `bytes` and draw every face onto it.
    pub fn annotate(&self, bytes: &[u8], faces: &[FaceRecord]) -> Result<RgbImage, AnnotateError> {
        let mut canvas = image::load_from_memory(bytes)?.to_rgb8();
        if !faces.is_empty() && self.font.is_none() {
            tracing::warn!("no font available; confidence labels will be skipped");
        }
        for face in faces {
            self.draw_face(&mut canvas, face);
        }
        Ok(canvas)
    }

    /// Annotate and save to `dest`, replacing any existing file.
    ///
    /// The encoding follows the extension of `dest`.
    pub fn write(&self, bytes: &[u8], faces: &[FaceRecord], dest: &Path) -> Result<(), AnnotateError> {
        let canvas = self.annotate(bytes, faces)?;
        canvas.save(dest)?;
        tracing::info!(path = %dest.display(), faces = faces.len(), "annotated image written");
        Ok(())
    }

    fn draw_face(&self, canvas: &mut RgbImage, face: &FaceRecord) {
        let points = outline(face);
        for pair in points.windows(2) {
            draw_thick_segment(canvas, pair[0], pair[1], OUTLINE_WIDTH, OUTLINE_COLOR);
        }

        if let (Some(font), Some(label)) = (&self.font, label(face)) {
            draw_text_mut(canvas, LABEL_COLOR, label.x, label.y, self.scale, font, &label.text);
        }
    }
}

/// Draw a line segment `width` pixels wide as a filled quad with round caps.
fn draw_thick_segment(canvas: &mut RgbImage, from: (i32, i32), to: (i32, i32), width: f32, color: Rgb<u8>) {
    let radius = (width / 2.0).floor() as i32;
    draw_filled_circle_mut(canvas, from, radius, color);
    draw_filled_circle_mut(canvas, to, radius, color);

    let dx = (to.0 - from.0) as f32;
    let dy = (to.1 - from.1) as f32;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return;
    }

    let half = width / 2.0;
    let nx = -dy / len * half;
    let ny = dx / len * half;
    let corner = |p: (i32, i32), sign: f32| {
        Point::new(
            (p.0 as f32 + sign * nx).round() as i32,
            (p.1 as f32 + sign * ny).round() as i32,
        )
    };

    let quad = [corner(from, 1.0), corner(to, 1.0), corner(to, -1.0), corner(from, -1.0)];
    if quad[0] != quad[3] {
        draw_polygon_mut(canvas, &quad, color);
    }
}
