use image::RgbImage;

use super::{GlyphFace, OverlayStyle, PlacedLine};

/// Offsets forming a diamond of radius `width`, origin excluded.
pub fn outline_offsets(width: u32) -> Vec<(i32, i32)> {
    let radius = i32::try_from(width).unwrap_or(i32::MAX / 4);
    let mut offsets = Vec::new();
    for dx in -radius..=radius {
        for dy in -radius..=radius {
            if (dx, dy) == (0, 0) || dx.abs() + dy.abs() > radius {
                continue;
            }
            offsets.push((dx, dy));
        }
    }
    offsets
}

/// Stamps the halo of the whole line in the outline color, then the glyphs,
/// so a neighbour's halo never covers an earlier glyph. The halo radius is
/// capped at `font_size`.
pub fn draw_outlined_line<F: GlyphFace + ?Sized>(
    canvas: &mut RgbImage,
    face: &F,
    line: &PlacedLine,
    font_size: u32,
    style: &OverlayStyle,
) {
    let mut pen_x = line.x as f32;
    let mut glyphs = Vec::with_capacity(line.text.len());
    for ch in line.text.chars().filter(|ch| *ch != '\n') {
        glyphs.push((ch, pen_x.round() as i32));
        pen_x += face.advance(ch, font_size);
    }

    for (dx, dy) in outline_offsets(style.outline_width.min(font_size)) {
        for &(ch, x) in &glyphs {
            face.draw_glyph(canvas, ch, x + dx, line.y + dy, font_size, style.outline_color);
        }
    }
    for &(ch, x) in &glyphs {
        face.draw_glyph(canvas, ch, x, line.y, font_size, style.text_color);
    }
}
