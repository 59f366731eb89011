use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::ocr::TextRect;

pub const SAMPLE_OFFSET_ABOVE: i32 = 5;
pub const FALLBACK_FILL: Rgb<u8> = Rgb([255, 255, 255]);

/// Pixel used as the fill color for `rect`: 5 px above its horizontal
/// center, or its own top edge when that row is off the canvas.
pub fn sample_point(canvas: &RgbImage, rect: &TextRect) -> Option<(u32, u32)> {
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return None;
    }
    let max_x = i32::try_from(width - 1).unwrap_or(i32::MAX);
    let max_y = i32::try_from(height - 1).unwrap_or(i32::MAX);

    let center_x = rect.x1 + (rect.x2 - rect.x1).div_euclid(2);
    let above = rect.y1 - SAMPLE_OFFSET_ABOVE;
    let sample_y = if above >= 0 { above } else { rect.y1 };

    Some((
        center_x.clamp(0, max_x) as u32,
        sample_y.clamp(0, max_y) as u32,
    ))
}

pub fn sample_background(canvas: &RgbImage, rect: &TextRect) -> Rgb<u8> {
    sample_point(canvas, rect)
        .and_then(|(x, y)| canvas.get_pixel_checked(x, y).copied())
        .unwrap_or(FALLBACK_FILL)
}

/// Paints `rect` after clamping it to the canvas. Empty rects are a no-op.
pub fn paint_box(canvas: &mut RgbImage, rect: &TextRect, color: Rgb<u8>) {
    let clamped = rect.clamp_to(canvas.width(), canvas.height());
    if clamped.is_empty() {
        return;
    }
    let area = Rect::at(clamped.x1, clamped.y1)
        .of_size(clamped.width() as u32, clamped.height() as u32);
    draw_filled_rect_mut(canvas, area, color);
}
