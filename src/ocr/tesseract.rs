use image::RgbImage;
use snafu::ResultExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{OcrEngine, OcrRecord, parse_tsv_records};
use crate::error::{FailedSnafu, OcrError, UnavailableSnafu};

pub const DEFAULT_TESSERACT_BINARY: &str = "tesseract";
pub const DEFAULT_PSM: u32 = 6;

/// The `tesseract` command line tool driven through its TSV renderer.
#[derive(Debug, Clone)]
pub struct Tesseract {
    binary: PathBuf,
    psm: u32,
}

impl Default for Tesseract {
    fn default() -> Self {
        Self::new(DEFAULT_TESSERACT_BINARY, DEFAULT_PSM)
    }
}

impl Tesseract {
    pub fn new(binary: impl Into<PathBuf>, psm: u32) -> Self {
        Self {
            binary: binary.into(),
            psm,
        }
    }

    /// Languages installed for this binary, as `tesseract --list-langs` prints them.
    pub fn list_languages(&self) -> Result<Vec<String>, OcrError> {
        list_tesseract_languages(&self.binary)
    }

    fn run_tsv(&self, path: &Path, language: &str) -> Result<String, OcrError> {
        let output = Command::new(&self.binary)
            .arg(path)
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg("tsv")
            .output()
            .context(UnavailableSnafu {
                binary: self.binary.display().to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return FailedSnafu {
                language,
                stderr: stderr.trim(),
            }
            .fail();
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl OcrEngine for Tesseract {
    fn recognize(&self, image: &RgbImage, language: &str) -> Result<Vec<OcrRecord>, OcrError> {
        let mut tmp = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .map_err(|err| OcrError::TempImage {
                message: err.to_string(),
            })?;
        image
            .write_to(&mut tmp, image::ImageFormat::Png)
            .map_err(|err| OcrError::TempImage {
                message: err.to_string(),
            })?;
        tmp.flush().ok();

        let tsv = self.run_tsv(tmp.path(), language)?;
        Ok(parse_tsv_records(&tsv))
    }
}

pub fn list_tesseract_languages(binary: &Path) -> Result<Vec<String>, OcrError> {
    let output = Command::new(binary)
        .arg("--list-langs")
        .output()
        .context(UnavailableSnafu {
            binary: binary.display().to_string(),
        })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return FailedSnafu {
            language: "--list-langs",
            stderr: stderr.trim(),
        }
        .fail();
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_language_list(&stdout))
}

fn parse_language_list(stdout: &str) -> Vec<String> {
    let mut langs = Vec::new();
    for (idx, line) in stdout.lines().enumerate() {
        if idx == 0 {
            continue;
        }
        let value = line.trim();
        if !value.is_empty() {
            langs.push(value.to_string());
        }
    }
    langs
}
