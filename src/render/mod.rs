mod fill;
mod font;
mod layout;
mod outline;

use image::{Rgb, RgbImage};
use snafu::Snafu;
use tracing::{debug, warn};

use crate::ocr::TextRect;

pub use fill::{FALLBACK_FILL, paint_box, sample_background, sample_point};
pub use font::{GlyphFace, OverlayFont, load_font, resolve_overlay_font};
pub use layout::{
    LinePlan, LineSlot, MIN_FONT_SIZE, PlacedLine, SkippedLine, font_size_for, plan_lines,
};
pub use outline::{draw_outlined_line, outline_offsets};

pub const DEFAULT_FONT_FALLBACKS: &[&str] = &["DejaVu Sans", "Liberation Sans", "sans-serif"];

#[derive(Debug, Snafu)]
pub enum LineRenderError {
    #[snafu(display("font has no glyph for {:?}", ch))]
    MissingGlyph { ch: char },
    #[snafu(display("line does not fit drawable coordinates"))]
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayStyle {
    pub text_color: Rgb<u8>,
    pub outline_color: Rgb<u8>,
    pub outline_width: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            text_color: Rgb([0, 0, 0]),
            outline_color: Rgb([255, 255, 255]),
            outline_width: 1,
        }
    }
}

/// Parses `#rrggbb` (leading `#` optional).
pub fn parse_hex_color(value: &str) -> Option<Rgb<u8>> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Rgb([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub lines_drawn: usize,
    pub lines_skipped: usize,
}

/// Paints over one detected box and writes its translation in place.
pub struct RegionReplacer<F> {
    face: F,
    style: OverlayStyle,
}

impl<F: GlyphFace> RegionReplacer<F> {
    pub fn new(face: F, style: OverlayStyle) -> Self {
        Self { face, style }
    }

    pub fn replace(
        &self,
        canvas: &mut RgbImage,
        rect: &TextRect,
        translated: &str,
    ) -> ReplaceOutcome {
        let rect = rect.clamp_to(canvas.width(), canvas.height());
        if rect.is_empty() {
            debug!(?rect, "box lies outside the canvas");
            return ReplaceOutcome::default();
        }

        let background = sample_background(canvas, &rect);
        paint_box(canvas, &rect, background);

        let plan = plan_lines(&rect, translated, &self.face);
        let mut outcome = ReplaceOutcome::default();
        for slot in &plan.slots {
            match slot {
                LineSlot::Placed(line) => {
                    draw_outlined_line(canvas, &self.face, line, plan.font_size, &self.style);
                    outcome.lines_drawn += 1;
                }
                LineSlot::Skipped(skipped) => {
                    warn!(
                        line = skipped.index,
                        text = %skipped.text,
                        "skipping line: {}",
                        skipped.error
                    );
                    outcome.lines_skipped += 1;
                }
            }
        }
        outcome
    }
}
