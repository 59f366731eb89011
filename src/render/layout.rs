//! Line placement inside a detected box.
//!
//! The font size is derived from the box height alone and never shrinks to
//! fit, so long or many-line translations can spill past the box edges.

use super::{GlyphFace, LineRenderError};
use crate::ocr::TextRect;

pub const MIN_FONT_SIZE: u32 = 12;
const FONT_SIZE_RATIO: f32 = 0.8;
const LINE_GAP_RATIO: f32 = 0.2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedLine {
    pub index: usize,
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug)]
pub struct SkippedLine {
    pub index: usize,
    pub text: String,
    pub error: LineRenderError,
}

#[derive(Debug)]
pub enum LineSlot {
    Placed(PlacedLine),
    Skipped(SkippedLine),
}

#[derive(Debug)]
pub struct LinePlan {
    pub font_size: u32,
    pub slots: Vec<LineSlot>,
}

impl LinePlan {
    pub fn placed(&self) -> impl Iterator<Item = &PlacedLine> {
        self.slots.iter().filter_map(|slot| match slot {
            LineSlot::Placed(line) => Some(line),
            LineSlot::Skipped(_) => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SkippedLine> {
        self.slots.iter().filter_map(|slot| match slot {
            LineSlot::Skipped(line) => Some(line),
            LineSlot::Placed(_) => None,
        })
    }
}

pub fn font_size_for(rect: &TextRect) -> u32 {
    let size = (rect.height() as f32 * FONT_SIZE_RATIO) as u32;
    size.max(MIN_FONT_SIZE)
}

/// Positions every `\n`-separated line of `text` inside `rect`.
pub fn plan_lines<F: GlyphFace + ?Sized>(rect: &TextRect, text: &str, face: &F) -> LinePlan {
    let font_size = font_size_for(rect);
    let lines = text.split('\n').collect::<Vec<_>>();
    let box_w = rect.width();
    let box_h = rect.height();

    let mut slots = Vec::with_capacity(lines.len());
    if lines.len() == 1 {
        let slot = match measure_line(face, lines[0], font_size) {
            Ok((width, height)) => LineSlot::Placed(PlacedLine {
                index: 0,
                text: lines[0].to_string(),
                x: rect.x1 + centering_offset(box_w, width),
                y: rect.y1 + centering_offset(box_h, height),
                width: width as u32,
                height: height as u32,
            }),
            Err(error) => LineSlot::Skipped(SkippedLine {
                index: 0,
                text: lines[0].to_string(),
                error,
            }),
        };
        slots.push(slot);
        return LinePlan { font_size, slots };
    }

    let gap = LINE_GAP_RATIO * box_h as f32 / lines.len() as f32;
    let mut cursor_y = rect.y1 as f32;
    for (index, line) in lines.iter().enumerate() {
        match measure_line(face, line, font_size) {
            Ok((width, height)) => {
                slots.push(LineSlot::Placed(PlacedLine {
                    index,
                    text: line.to_string(),
                    x: rect.x1 + centering_offset(box_w, width),
                    y: cursor_y as i32,
                    width: width as u32,
                    height: height as u32,
                }));
                cursor_y += height as f32 + gap;
            }
            Err(error) => slots.push(LineSlot::Skipped(SkippedLine {
                index,
                text: line.to_string(),
                error,
            })),
        }
    }
    LinePlan { font_size, slots }
}

fn measure_line<F: GlyphFace + ?Sized>(
    face: &F,
    line: &str,
    font_size: u32,
) -> Result<(i32, i32), LineRenderError> {
    let (width, height) = face.measure(line, font_size)?;
    let width = i32::try_from(width).map_err(|_| LineRenderError::OutOfRange)?;
    let height = i32::try_from(height).map_err(|_| LineRenderError::OutOfRange)?;
    Ok((width, height))
}

/// Floor division so oversized lines shift left/up symmetrically.
fn centering_offset(outer: i32, inner: i32) -> i32 {
    (outer - inner).div_euclid(2)
}
