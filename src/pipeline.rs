use image::RgbImage;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::debug::{OcrDebugConfig, write_ocr_debug};
use crate::error::{OcrError, RetextError};
use crate::image_io::{load_image, save_image};
use crate::matcher::TranslationTable;
use crate::ocr::{DEFAULT_CONFIDENCE_THRESHOLD, DetectedTextBox, OcrEngine, TextDetector};
use crate::render::{GlyphFace, OverlayStyle, RegionReplacer};

/// Everything one run needs, fixed at construction.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Primary OCR language first, then fallbacks in the order they are tried.
    pub languages: Vec<String>,
    pub translations: TranslationTable,
    pub confidence_threshold: u32,
    pub style: OverlayStyle,
    pub debug: Option<OcrDebugConfig>,
}

impl PipelineConfig {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            languages: vec!["rus".to_string(), "eng".to_string()],
            translations: TranslationTable::new(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            style: OverlayStyle::default(),
            debug: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Found {
        language: String,
        boxes: Vec<DetectedTextBox>,
    },
    Empty,
    Unavailable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub replaced: usize,
    pub unmatched: usize,
    pub lines_drawn: usize,
    pub lines_skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub output_path: PathBuf,
    pub language: Option<String>,
    pub detected: usize,
    pub ocr_available: bool,
    pub stats: ApplyStats,
}

pub struct Pipeline<E, F> {
    config: PipelineConfig,
    detector: TextDetector<E>,
    replacer: RegionReplacer<F>,
}

impl<E: OcrEngine, F: GlyphFace> Pipeline<E, F> {
    pub fn new(config: PipelineConfig, engine: E, face: F) -> Self {
        let detector = TextDetector::new(engine, config.confidence_threshold);
        let replacer = RegionReplacer::new(face, config.style);
        Self {
            config,
            detector,
            replacer,
        }
    }

    /// Load, detect, replace, save. Nothing is written when loading fails or
    /// when OCR ran but found no text in any language.
    pub fn run(&self) -> Result<RunReport, RetextError> {
        let loaded = load_image(&self.config.input_path)?;
        debug!(
            input = %self.config.input_path.display(),
            mime = %loaded.mime,
            width = loaded.canvas.width(),
            height = loaded.canvas.height(),
            "page loaded"
        );
        let mut canvas = loaded.canvas;

        let (language, boxes, ocr_available) = match self.detect_text(&canvas) {
            Detection::Found { language, boxes } => (Some(language), boxes, true),
            Detection::Unavailable => (None, Vec::new(), false),
            Detection::Empty => {
                return Err(RetextError::NoTextDetected {
                    languages: self.config.languages.join(", "),
                });
            }
        };

        if let Some(debug_config) = &self.config.debug {
            write_ocr_debug(debug_config, &canvas, &boxes)?;
        }

        let stats = self.apply(&mut canvas, &boxes);
        save_image(&canvas, &self.config.output_path, loaded.format)?;

        let report = RunReport {
            output_path: self.config.output_path.clone(),
            language,
            detected: boxes.len(),
            ocr_available,
            stats,
        };
        info!(
            output = %report.output_path.display(),
            language = report.language.as_deref().unwrap_or("-"),
            detected = report.detected,
            replaced = report.stats.replaced,
            unmatched = report.stats.unmatched,
            lines_drawn = report.stats.lines_drawn,
            lines_skipped = report.stats.lines_skipped,
            "page written"
        );
        Ok(report)
    }

    /// Tries each configured language in order until one yields boxes.
    pub fn detect_text(&self, canvas: &RgbImage) -> Detection {
        for language in &self.config.languages {
            match self.detector.try_detect(canvas, language) {
                Ok(boxes) if !boxes.is_empty() => {
                    return Detection::Found {
                        language: language.clone(),
                        boxes,
                    };
                }
                Ok(_) => debug!(language = %language, "no text detected"),
                Err(err @ OcrError::Unavailable { .. }) => {
                    warn!("{}; leaving the page untouched", err);
                    return Detection::Unavailable;
                }
                Err(err) => warn!("{}", err),
            }
        }
        Detection::Empty
    }

    /// Replaces every matched box in detection order.
    pub fn apply(&self, canvas: &mut RgbImage, boxes: &[DetectedTextBox]) -> ApplyStats {
        let mut stats = ApplyStats::default();
        for detected in boxes {
            let Some(found) = self.config.translations.lookup(&detected.text) else {
                debug!(text = %detected.text, "no translation");
                stats.unmatched += 1;
                continue;
            };
            debug!(
                text = %detected.text,
                source = found.source,
                kind = ?found.kind,
                "replacing box"
            );
            let outcome = self.replacer.replace(canvas, &detected.rect, found.target);
            stats.replaced += 1;
            stats.lines_drawn += outcome.lines_drawn;
            stats.lines_skipped += outcome.lines_skipped;
        }
        stats
    }
}
