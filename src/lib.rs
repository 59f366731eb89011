use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};

pub mod compose;
pub mod debug;
pub mod error;
pub mod image_io;
pub mod logging;
pub mod matcher;
pub mod ocr;
pub mod pipeline;
pub mod render;
pub mod settings;
#[cfg(test)]
mod test_util;

pub use compose::{StitchOptions, StitchOutput};
pub use error::{OcrError, RetextError};
pub use matcher::{MatchKind, TranslationMatch, TranslationTable};
pub use ocr::{DetectedTextBox, OcrEngine, OcrRecord, Tesseract, TextRect};
pub use pipeline::{ApplyStats, Detection, Pipeline, PipelineConfig, RunReport};
pub use render::{GlyphFace, OverlayFont, OverlayStyle};

use crate::debug::OcrDebugConfig;
use crate::render::{DEFAULT_FONT_FALLBACKS, parse_hex_color, resolve_overlay_font};
use crate::settings::Settings;

#[derive(Debug, Clone, Default)]
pub struct ReplaceOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub lang: Option<String>,
    pub fallback_langs: Vec<String>,
    pub font_path: Option<String>,
    pub font_family: Option<String>,
    pub outline_width: Option<u32>,
    pub confidence: Option<u32>,
    pub translations_path: Option<String>,
    pub settings_path: Option<String>,
    pub debug_ocr: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StitchRequest {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub group_size: Option<usize>,
    pub margin: Option<u32>,
    pub settings_path: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GridRequest {
    pub top_left: PathBuf,
    pub top_right: PathBuf,
    pub bottom_left: PathBuf,
    pub bottom_right: PathBuf,
    pub output: PathBuf,
    pub margin: Option<u32>,
    pub settings_path: Option<String>,
}

/// Detects, matches and redraws the text of one page.
pub fn run_replace(options: ReplaceOptions) -> Result<RunReport> {
    let settings = load_settings(options.settings_path.as_deref())?;
    let config = build_pipeline_config(&options, &settings)?;

    let font_path = options
        .font_path
        .as_deref()
        .or(settings.font_path.as_deref())
        .map(Path::new);
    let family = options
        .font_family
        .as_deref()
        .or(settings.font_family.as_deref());
    let font = resolve_overlay_font(font_path, family, DEFAULT_FONT_FALLBACKS)
        .with_context(|| "failed to resolve overlay font")?;
    tracing::debug!(family = font.family().unwrap_or("-"), "overlay font loaded");

    let engine = Tesseract::new(&settings.tesseract_binary, settings.tesseract_psm);
    let pipeline = Pipeline::new(config, engine, font);
    Ok(pipeline.run()?)
}

pub fn run_stitch(request: StitchRequest) -> Result<StitchOutput> {
    let settings = load_settings(request.settings_path.as_deref())?;
    let options = StitchOptions {
        images_per_group: request
            .group_size
            .unwrap_or(settings.stitch_group_size)
            .max(1),
        margin: request.margin.unwrap_or(settings.stitch_margin),
    };
    compose::repack_cbz(&request.input, &request.output_dir, &options)
}

pub fn run_grid(request: GridRequest) -> Result<()> {
    let settings = load_settings(request.settings_path.as_deref())?;
    let margin = request.margin.unwrap_or(settings.grid_margin);
    compose::compose_grid_files(
        [
            &request.top_left,
            &request.top_right,
            &request.bottom_left,
            &request.bottom_right,
        ],
        &request.output,
        margin,
    )
}

/// Languages installed for the configured tesseract binary.
pub fn list_ocr_languages(settings_path: Option<&str>) -> Result<Vec<String>> {
    let settings = load_settings(settings_path)?;
    let tesseract = Tesseract::new(&settings.tesseract_binary, settings.tesseract_psm);
    Ok(tesseract.list_languages()?)
}

fn load_settings(path: Option<&str>) -> Result<Settings> {
    settings::load_settings(path.map(Path::new))
}

fn build_pipeline_config(options: &ReplaceOptions, settings: &Settings) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::new(&options.input, &options.output);
    config.languages = resolve_languages(
        options.lang.as_deref(),
        &options.fallback_langs,
        &settings.ocr_languages,
    );
    config.confidence_threshold = options
        .confidence
        .unwrap_or(settings.confidence_threshold)
        .min(100);

    let mut translations = settings.translations.clone();
    if let Some(path) = &options.translations_path {
        translations.extend(settings::load_translation_file(Path::new(path))?);
    }
    if translations.is_empty() {
        tracing::warn!("translation table is empty; no box will be replaced");
    }
    config.translations = translations;

    config.style = OverlayStyle {
        text_color: parse_color(&settings.text_color, "text_color")?,
        outline_color: parse_color(&settings.outline_color, "outline_color")?,
        outline_width: options.outline_width.unwrap_or(settings.outline_width),
    };
    if options.debug_ocr {
        config.debug = Some(OcrDebugConfig::beside(&options.output, &options.input));
    }
    Ok(config)
}

/// `--lang` replaces the primary language. Explicit fallbacks replace the
/// configured ones; otherwise the configured list follows, minus duplicates.
fn resolve_languages(
    primary: Option<&str>,
    fallbacks: &[String],
    configured: &[String],
) -> Vec<String> {
    let mut languages: Vec<String> = Vec::new();
    let mut push = |lang: &str| {
        let lang = lang.trim();
        if !lang.is_empty() && !languages.iter().any(|known| known == lang) {
            languages.push(lang.to_string());
        }
    };
    match primary {
        Some(lang) => push(lang),
        None => {
            if let Some(first) = configured.first() {
                push(first.as_str());
            }
        }
    }
    if fallbacks.is_empty() {
        configured.iter().for_each(|lang| push(lang.as_str()));
    } else {
        fallbacks.iter().for_each(|lang| push(lang.as_str()));
    }
    languages
}

fn parse_color(value: &str, key: &str) -> Result<image::Rgb<u8>> {
    parse_hex_color(value).ok_or_else(|| anyhow!("invalid {} {:?}; expected #rrggbb", key, value))
}
