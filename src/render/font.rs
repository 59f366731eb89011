use ab_glyph::{Font, FontArc, FontVec, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use snafu::ResultExt;
use std::path::Path;
use ttf_parser::{Face, name_id};
use usvg::fontdb;

use super::LineRenderError;
use crate::error::{FontReadSnafu, FontSnafu, RetextError};

/// Font rasterizer used by the replacer: measures lines and stamps glyphs.
pub trait GlyphFace {
    /// Width and height of `text` set at `size` pixels. Newlines are ignored.
    fn measure(&self, text: &str, size: u32) -> Result<(u32, u32), LineRenderError>;

    fn advance(&self, ch: char, size: u32) -> f32;

    /// Draws `ch` with its top-left layout corner at `(x, y)`.
    fn draw_glyph(
        &self,
        canvas: &mut RgbImage,
        ch: char,
        x: i32,
        y: i32,
        size: u32,
        color: Rgb<u8>,
    );
}

impl<F: GlyphFace + ?Sized> GlyphFace for &F {
    fn measure(&self, text: &str, size: u32) -> Result<(u32, u32), LineRenderError> {
        (**self).measure(text, size)
    }

    fn advance(&self, ch: char, size: u32) -> f32 {
        (**self).advance(ch, size)
    }

    fn draw_glyph(
        &self,
        canvas: &mut RgbImage,
        ch: char,
        x: i32,
        y: i32,
        size: u32,
        color: Rgb<u8>,
    ) {
        (**self).draw_glyph(canvas, ch, x, y, size, color)
    }
}

/// A TrueType/OpenType face rasterized with `ab_glyph`.
#[derive(Clone)]
pub struct OverlayFont {
    font: FontArc,
    family: Option<String>,
}

impl std::fmt::Debug for OverlayFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayFont")
            .field("family", &self.family)
            .finish()
    }
}

impl OverlayFont {
    pub fn from_data(data: Vec<u8>, preferred_family: Option<&str>) -> Result<Self, RetextError> {
        let (index, family) = select_face(&data, preferred_family);
        let font = FontVec::try_from_vec_and_index(data, index).context(FontSnafu)?;
        Ok(Self {
            font: FontArc::new(font),
            family,
        })
    }

    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }
}

impl GlyphFace for OverlayFont {
    fn measure(&self, text: &str, size: u32) -> Result<(u32, u32), LineRenderError> {
        let scaled = self.font.as_scaled(PxScale::from(size as f32));
        let mut width = 0f32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            let glyph = self.font.glyph_id(ch);
            if glyph.0 == 0 && !ch.is_whitespace() {
                return Err(LineRenderError::MissingGlyph { ch });
            }
            width += scaled.h_advance(glyph);
        }
        let height = scaled.ascent() - scaled.descent();
        Ok((width.ceil().max(0.0) as u32, height.ceil().max(0.0) as u32))
    }

    fn advance(&self, ch: char, size: u32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(size as f32));
        scaled.h_advance(self.font.glyph_id(ch))
    }

    fn draw_glyph(
        &self,
        canvas: &mut RgbImage,
        ch: char,
        x: i32,
        y: i32,
        size: u32,
        color: Rgb<u8>,
    ) {
        let mut buf = [0u8; 4];
        imageproc::drawing::draw_text_mut(
            canvas,
            color,
            x,
            y,
            PxScale::from(size as f32),
            &self.font,
            ch.encode_utf8(&mut buf),
        );
    }
}

pub fn load_font(path: &Path) -> Result<OverlayFont, RetextError> {
    let data = std::fs::read(path).context(FontReadSnafu {
        path: path.display().to_string(),
    })?;
    OverlayFont::from_data(data, None)
}

/// Loads `font_path` when given, otherwise the first system family found
/// among `family` and `fallback`.
pub fn resolve_overlay_font(
    font_path: Option<&Path>,
    family: Option<&str>,
    fallback: &[&str],
) -> Result<OverlayFont, RetextError> {
    if let Some(path) = font_path {
        return load_font(path);
    }

    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    let mut candidates = Vec::new();
    if let Some(family) = family {
        candidates.push(family);
    }
    candidates.extend_from_slice(fallback);

    for candidate in &candidates {
        if let Some(font) = load_system_family(&db, candidate)? {
            return Ok(font);
        }
    }
    Err(RetextError::FontNotFound {
        family: candidates.join(", "),
    })
}

fn load_system_family(
    db: &fontdb::Database,
    family: &str,
) -> Result<Option<OverlayFont>, RetextError> {
    let is_sans = family.eq_ignore_ascii_case("sans-serif");
    let families = if is_sans {
        vec![fontdb::Family::SansSerif]
    } else {
        vec![fontdb::Family::Name(family)]
    };
    let query = fontdb::Query {
        families: &families,
        ..Default::default()
    };
    let Some(id) = db.query(&query) else {
        return Ok(None);
    };
    let Some(data) = db.with_face_data(id, |data, _index| data.to_vec()) else {
        return Ok(None);
    };
    let preferred = (!is_sans).then_some(family);
    OverlayFont::from_data(data, preferred).map(Some)
}

/// Picks the face index inside a collection, preferring `preferred_family`.
fn select_face(data: &[u8], preferred_family: Option<&str>) -> (u32, Option<String>) {
    let mut fallback = None;
    let count = ttf_parser::fonts_in_collection(data).unwrap_or(1);
    for index in 0..count {
        let Ok(face) = Face::parse(data, index) else {
            continue;
        };
        let family = extract_family_name(&face);
        if let (Some(preferred), Some(found)) = (preferred_family, &family) {
            if found.eq_ignore_ascii_case(preferred) {
                return (index, family);
            }
        }
        if fallback.is_none() {
            fallback = Some((index, family));
        }
    }
    fallback.unwrap_or((0, None))
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}
