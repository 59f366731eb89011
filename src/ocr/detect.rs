use image::RgbImage;
use tracing::{debug, warn};

use super::{DetectedTextBox, OcrEngine, OcrRecord, WORD_LEVEL};
use crate::error::OcrError;

/// Turns raw engine records into word boxes above a confidence threshold.
pub struct TextDetector<E> {
    engine: E,
    confidence_threshold: u32,
}

impl<E: OcrEngine> TextDetector<E> {
    pub fn new(engine: E, confidence_threshold: u32) -> Self {
        Self {
            engine,
            confidence_threshold: confidence_threshold.min(100),
        }
    }

    /// Never fails: an unreachable backend is logged and yields no boxes.
    pub fn detect(&self, image: &RgbImage, language: &str) -> Vec<DetectedTextBox> {
        match self.try_detect(image, language) {
            Ok(boxes) => boxes,
            Err(err) => {
                warn!("text detection skipped: {}", err);
                Vec::new()
            }
        }
    }

    pub fn try_detect(
        &self,
        image: &RgbImage,
        language: &str,
    ) -> Result<Vec<DetectedTextBox>, OcrError> {
        let records = self.engine.recognize(image, language)?;
        let total = records.len();
        let boxes = records
            .into_iter()
            .filter_map(|record| self.accept(record))
            .collect::<Vec<_>>();
        debug!(
            language,
            records = total,
            kept = boxes.len(),
            "ocr records filtered"
        );
        Ok(boxes)
    }

    fn accept(&self, record: OcrRecord) -> Option<DetectedTextBox> {
        if record.level != WORD_LEVEL {
            return None;
        }
        let text = record.text.trim();
        if text.is_empty() {
            return None;
        }
        // tesseract reports fractional confidences; the threshold works on whole points
        let confidence = record.confidence.trunc();
        if !confidence.is_finite() || confidence <= self.confidence_threshold as f32 {
            return None;
        }
        Some(DetectedTextBox {
            text: text.to_string(),
            rect: record.rect,
            confidence: confidence.min(100.0) as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{DEFAULT_CONFIDENCE_THRESHOLD, TextRect};
    use std::io;

    struct FixedEngine(Vec<OcrRecord>);

    impl OcrEngine for FixedEngine {
        fn recognize(
            &self,
            _image: &RgbImage,
            _language: &str,
        ) -> Result<Vec<OcrRecord>, OcrError> {
            Ok(self.0.clone())
        }
    }

    struct OfflineEngine;

    impl OcrEngine for OfflineEngine {
        fn recognize(
            &self,
            _image: &RgbImage,
            _language: &str,
        ) -> Result<Vec<OcrRecord>, OcrError> {
            Err(OcrError::Unavailable {
                source: io::Error::new(io::ErrorKind::NotFound, "not installed"),
                binary: "tesseract".to_string(),
            })
        }
    }

    fn word(text: &str, confidence: f32) -> OcrRecord {
        OcrRecord {
            level: WORD_LEVEL,
            text: text.to_string(),
            rect: TextRect::new(1, 1, 10, 10),
            confidence,
        }
    }

    #[test]
    fn confidence_fifty_is_excluded_and_fifty_one_kept() {
        let engine = FixedEngine(vec![word("А", 50.0), word("Б", 51.0), word("В", 50.9)]);
        let detector = TextDetector::new(engine, DEFAULT_CONFIDENCE_THRESHOLD);
        let boxes = detector.detect(&RgbImage::new(20, 20), "rus");
        let texts = boxes.iter().map(|b| b.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, vec!["Б"]);
        assert_eq!(boxes[0].confidence, 51);
    }

    #[test]
    fn non_finite_confidence_is_dropped() {
        let tsv = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
5\t1\t1\t1\t1\t1\t10\t10\t50\t20\tnan\tШУМ\n\
5\t1\t1\t1\t1\t2\t70\t10\t50\t20\tinf\tГАМ\n\
5\t1\t1\t1\t1\t3\t130\t10\t50\t20\t77.5\tЭЙ\n";
        let records = crate::ocr::parse_tsv_records(tsv);
        assert_eq!(records.len(), 3);
        assert!(records[0].confidence.is_nan());

        let detector = TextDetector::new(FixedEngine(records), DEFAULT_CONFIDENCE_THRESHOLD);
        let boxes = detector.detect(&RgbImage::new(200, 40), "rus");
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].text, "ЭЙ");
        assert_eq!(boxes[0].confidence, 77);
    }

    #[test]
    fn non_word_levels_and_blank_text_are_dropped() {
        let mut line = word("СТРОКА", 95.0);
        line.level = 4;
        let engine = FixedEngine(vec![line, word("   ", 99.0), word(" ДА ", 96.4)]);
        let detector = TextDetector::new(engine, DEFAULT_CONFIDENCE_THRESHOLD);
        let boxes = detector.detect(&RgbImage::new(20, 20), "rus");
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].text, "ДА");
        assert_eq!(boxes[0].confidence, 96);
    }

    #[test]
    fn unavailable_backend_yields_no_boxes() {
        let detector = TextDetector::new(OfflineEngine, DEFAULT_CONFIDENCE_THRESHOLD);
        let image = RgbImage::new(20, 20);
        assert!(detector.detect(&image, "rus").is_empty());
        assert!(matches!(
            detector.try_detect(&image, "rus"),
            Err(OcrError::Unavailable { .. })
        ));
    }
}
