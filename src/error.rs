use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RetextError {
    #[snafu(display("failed to read image `{}`: {}", path, source))]
    ImageRead {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("`{}` is not a supported image (detected {})", path, detected))]
    UnsupportedImage { path: String, detected: String },
    #[snafu(display("failed to decode image `{}`: {}", path, source))]
    ImageDecode {
        source: image::ImageError,
        path: String,
    },
    #[snafu(display("failed to write image `{}`: {}", path, source))]
    ImageWrite {
        source: image::ImageError,
        path: String,
    },
    #[snafu(display("no output format for `{}`", path))]
    UnknownOutputFormat { path: String },
    #[snafu(display("no text detected (tried languages: {})", languages))]
    NoTextDetected { languages: String },
    #[snafu(display("failed to read font `{}`: {}", path, source))]
    FontRead {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Load Font error: {}", source))]
    Font { source: ab_glyph::InvalidFont },
    #[snafu(display("font not found: {}", family))]
    FontNotFound { family: String },
    #[snafu(display("failed to write debug output `{}`: {}", path, message))]
    DebugOutput { path: String, message: String },
}

impl RetextError {
    /// Load failures abort the run before anything is written.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            RetextError::ImageRead { .. }
                | RetextError::UnsupportedImage { .. }
                | RetextError::ImageDecode { .. }
        )
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum OcrError {
    #[snafu(display("OCR backend `{}` is unavailable: {}", binary, source))]
    Unavailable {
        source: std::io::Error,
        binary: String,
    },
    #[snafu(display("failed to prepare image for OCR: {}", message))]
    TempImage { message: String },
    #[snafu(display("OCR failed for language `{}`: {}", language, stderr))]
    Failed { language: String, stderr: String },
}
