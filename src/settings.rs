use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::matcher::TranslationTable;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub ocr_languages: Vec<String>,
    pub confidence_threshold: u32,
    pub tesseract_binary: String,
    pub tesseract_psm: u32,
    pub font_path: Option<String>,
    pub font_family: Option<String>,
    pub outline_width: u32,
    pub text_color: String,
    pub outline_color: String,
    pub translations: TranslationTable,
    pub stitch_group_size: usize,
    pub stitch_margin: u32,
    pub grid_margin: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ocr_languages: vec!["rus".to_string(), "eng".to_string()],
            confidence_threshold: 50,
            tesseract_binary: "tesseract".to_string(),
            tesseract_psm: 6,
            font_path: None,
            font_family: None,
            outline_width: 1,
            text_color: "#000000".to_string(),
            outline_color: "#ffffff".to_string(),
            translations: TranslationTable::new(),
            stitch_group_size: 10,
            stitch_margin: 20,
            grid_margin: 20,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    ocr: Option<OcrSettings>,
    render: Option<RenderSettings>,
    compose: Option<ComposeSettings>,
    #[serde(default)]
    translation: Vec<TranslationEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct OcrSettings {
    languages: Option<Vec<String>>,
    confidence_threshold: Option<u32>,
    tesseract: Option<String>,
    psm: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderSettings {
    font_path: Option<String>,
    font_family: Option<String>,
    outline_width: Option<u32>,
    text_color: Option<String>,
    outline_color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ComposeSettings {
    group_size: Option<usize>,
    margin: Option<u32>,
    grid_margin: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TranslationEntry {
    source: String,
    target: String,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];
    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }
    load_settings_from(&ordered_paths)
}

/// Embedded defaults, then every existing file in `paths`, later files winning.
pub fn load_settings_from(paths: &[PathBuf]) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile =
        toml::from_str(DEFAULT_SETTINGS_TOML).with_context(|| "failed to parse default settings")?;
    settings.merge(defaults);

    for path in paths {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }
    Ok(settings)
}

/// Reads a file holding only `[[translation]]` entries.
pub fn load_translation_file(path: &Path) -> Result<TranslationTable> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read translations: {}", path.display()))?;
    let parsed: SettingsFile = toml::from_str(&content)
        .with_context(|| format!("failed to parse translations: {}", path.display()))?;
    Ok(parsed
        .translation
        .into_iter()
        .map(|entry| (entry.source, entry.target))
        .collect())
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(ocr) = incoming.ocr {
            if let Some(languages) = ocr.languages {
                let languages = languages
                    .into_iter()
                    .map(|lang| lang.trim().to_string())
                    .filter(|lang| !lang.is_empty())
                    .collect::<Vec<_>>();
                if !languages.is_empty() {
                    self.ocr_languages = languages;
                }
            }
            if let Some(threshold) = ocr.confidence_threshold {
                self.confidence_threshold = threshold.min(100);
            }
            if let Some(binary) = ocr.tesseract {
                if !binary.trim().is_empty() {
                    self.tesseract_binary = binary;
                }
            }
            if let Some(psm) = ocr.psm {
                self.tesseract_psm = psm;
            }
        }
        if let Some(render) = incoming.render {
            if let Some(path) = render.font_path {
                if !path.trim().is_empty() {
                    self.font_path = Some(path);
                }
            }
            if let Some(family) = render.font_family {
                if !family.trim().is_empty() {
                    self.font_family = Some(family);
                }
            }
            if let Some(width) = render.outline_width {
                self.outline_width = width;
            }
            if let Some(color) = render.text_color {
                if !color.trim().is_empty() {
                    self.text_color = color;
                }
            }
            if let Some(color) = render.outline_color {
                if !color.trim().is_empty() {
                    self.outline_color = color;
                }
            }
        }
        if let Some(compose) = incoming.compose {
            if let Some(size) = compose.group_size {
                if size > 0 {
                    self.stitch_group_size = size;
                }
            }
            if let Some(margin) = compose.margin {
                self.stitch_margin = margin;
            }
            if let Some(margin) = compose.grid_margin {
                self.grid_margin = margin;
            }
        }
        for entry in incoming.translation {
            self.translations.insert(entry.source, entry.target);
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".comic-retext"))
        }
    })
}
