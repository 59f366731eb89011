use image::{Rgb, RgbImage};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io;

use crate::error::OcrError;
use crate::ocr::{OcrEngine, OcrRecord, TextRect, WORD_LEVEL};
use crate::render::{GlyphFace, LineRenderError};

pub(crate) fn word(text: &str, x1: i32, y1: i32, x2: i32, y2: i32, confidence: f32) -> OcrRecord {
    OcrRecord {
        level: WORD_LEVEL,
        text: text.to_string(),
        rect: TextRect::new(x1, y1, x2, y2),
        confidence,
    }
}

enum Script {
    Records(Vec<OcrRecord>),
    Fail(String),
    Offline,
}

/// OCR double answering per language and remembering what it was asked.
pub(crate) struct ScriptedEngine {
    scripts: HashMap<String, Script>,
    offline: bool,
    calls: RefCell<Vec<String>>,
}

impl ScriptedEngine {
    pub(crate) fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            offline: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn offline() -> Self {
        Self {
            offline: true,
            ..Self::new()
        }
    }

    pub(crate) fn with_language(
        mut self,
        language: &str,
        result: Result<Vec<OcrRecord>, OcrError>,
    ) -> Self {
        let script = match result {
            Ok(records) => Script::Records(records),
            Err(OcrError::Unavailable { .. }) => Script::Offline,
            Err(err) => Script::Fail(err.to_string()),
        };
        self.scripts.insert(language.to_string(), script);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl OcrEngine for ScriptedEngine {
    fn recognize(&self, _image: &RgbImage, language: &str) -> Result<Vec<OcrRecord>, OcrError> {
        self.calls.borrow_mut().push(language.to_string());
        let offline = || OcrError::Unavailable {
            source: io::Error::new(io::ErrorKind::NotFound, "tesseract not installed"),
            binary: "tesseract".to_string(),
        };
        if self.offline {
            return Err(offline());
        }
        match self.scripts.get(language) {
            None => Ok(Vec::new()),
            Some(Script::Records(records)) => Ok(records.clone()),
            Some(Script::Fail(stderr)) => Err(OcrError::Failed {
                language: language.to_string(),
                stderr: stderr.clone(),
            }),
            Some(Script::Offline) => Err(offline()),
        }
    }
}

/// Monospace face drawing each glyph as a solid block `size / 2` wide and
/// `size` tall. `#` has no glyph.
pub(crate) struct BlockFace;

impl GlyphFace for BlockFace {
    fn measure(&self, text: &str, size: u32) -> Result<(u32, u32), LineRenderError> {
        if text.contains('#') {
            return Err(LineRenderError::MissingGlyph { ch: '#' });
        }
        let count = text.chars().filter(|ch| *ch != '\n').count() as u32;
        Ok((count * (size / 2), size))
    }

    fn advance(&self, _ch: char, size: u32) -> f32 {
        (size / 2) as f32
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
        if ch.is_whitespace() {
            return;
        }
        let (width, height) = canvas.dimensions();
        let glyph_w = (size / 2) as i32;
        for py in y..y + size as i32 {
            for px in x..x + glyph_w {
                if px >= 0 && py >= 0 && (px as u32) < width && (py as u32) < height {
                    canvas.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }
}
