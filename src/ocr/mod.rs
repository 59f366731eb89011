mod detect;
mod parse;
mod tesseract;

use image::RgbImage;
use serde::Serialize;

use crate::error::OcrError;

pub use detect::TextDetector;
pub use parse::parse_tsv_records;
pub use tesseract::{Tesseract, list_tesseract_languages};

/// Tesseract's page/block/paragraph/line/word hierarchy; only words are kept.
pub const WORD_LEVEL: u32 = 5;

pub const DEFAULT_CONFIDENCE_THRESHOLD: u32 = 50;

/// Pixel rectangle with exclusive right/bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextRect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl TextRect {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn from_xywh(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self::new(x, y, x.saturating_add(w), y.saturating_add(h))
    }

    pub fn width(&self) -> i32 {
        (self.x2 - self.x1).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.y2 - self.y1).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Clamps every edge into `[0, width] x [0, height]`.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let max_x = i32::try_from(width).unwrap_or(i32::MAX);
        let max_y = i32::try_from(height).unwrap_or(i32::MAX);
        let x1 = self.x1.clamp(0, max_x);
        let y1 = self.y1.clamp(0, max_y);
        Self {
            x1,
            y1,
            x2: self.x2.clamp(x1, max_x),
            y2: self.y2.clamp(y1, max_y),
        }
    }
}

/// Raw engine output before any filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrRecord {
    pub level: u32,
    pub text: String,
    pub rect: TextRect,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedTextBox {
    pub text: String,
    #[serde(rename = "box")]
    pub rect: TextRect,
    pub confidence: u32,
}

/// External OCR collaborator. Implementations run recognition for one
/// language hint and return every record they produced.
pub trait OcrEngine {
    fn recognize(&self, image: &RgbImage, language: &str) -> Result<Vec<OcrRecord>, OcrError>;
}

impl<E: OcrEngine + ?Sized> OcrEngine for &E {
    fn recognize(&self, image: &RgbImage, language: &str) -> Result<Vec<OcrRecord>, OcrError> {
        (**self).recognize(image, language)
    }
}
