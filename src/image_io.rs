use image::{ImageFormat, RgbImage};
use snafu::ResultExt;
use std::path::Path;

use crate::error::{
    ImageDecodeSnafu, ImageReadSnafu, ImageWriteSnafu, RetextError, UnknownOutputFormatSnafu,
    UnsupportedImageSnafu,
};

pub struct LoadedImage {
    pub canvas: RgbImage,
    pub mime: String,
    pub format: Option<ImageFormat>,
}

/// Reads and decodes `path` into an RGB canvas.
pub fn load_image(path: &Path) -> Result<LoadedImage, RetextError> {
    let display = path.display().to_string();
    let bytes = std::fs::read(path).context(ImageReadSnafu {
        path: display.clone(),
    })?;
    let mime = detect_image_mime(&bytes, path).ok_or_else(|| {
        let detected = infer::get(&bytes)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| "unknown data".to_string());
        UnsupportedImageSnafu {
            path: display.clone(),
            detected,
        }
        .build()
    })?;
    let format = image_format_from_mime(&mime);
    let decoded = match format {
        Some(format) => image::load_from_memory_with_format(&bytes, format),
        None => image::load_from_memory(&bytes),
    }
    .context(ImageDecodeSnafu { path: display })?;

    Ok(LoadedImage {
        canvas: decoded.to_rgb8(),
        mime,
        format,
    })
}

/// Writes `canvas` to `path`, choosing the format from the extension and
/// falling back to `fallback` when the extension is missing or unknown.
pub fn save_image(
    canvas: &RgbImage,
    path: &Path,
    fallback: Option<ImageFormat>,
) -> Result<(), RetextError> {
    let display = path.display().to_string();
    let format = ImageFormat::from_path(path)
        .ok()
        .or(fallback)
        .ok_or_else(|| {
            UnknownOutputFormatSnafu {
                path: display.clone(),
            }
            .build()
        })?;
    canvas
        .save_with_format(path, format)
        .context(ImageWriteSnafu { path: display })
}

pub(crate) fn detect_image_mime(bytes: &[u8], path: &Path) -> Option<String> {
    if let Some(kind) = infer::get(bytes) {
        let detected = kind.mime_type();
        return detected
            .starts_with("image/")
            .then(|| detected.to_string());
    }
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_lowercase())?;
    mime_from_extension(&ext).map(|mime| mime.to_string())
}

fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "tiff" | "tif" => Some("image/tiff"),
        _ => None,
    }
}

pub(crate) fn image_format_from_mime(mime: &str) -> Option<ImageFormat> {
    match mime {
        "image/png" => Some(ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
        "image/gif" => Some(ImageFormat::Gif),
        "image/webp" => Some(ImageFormat::WebP),
        "image/bmp" => Some(ImageFormat::Bmp),
        "image/tiff" => Some(ImageFormat::Tiff),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::tempdir;

    #[test]
    fn png_round_trips_through_loader() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("page.png");
        let mut canvas = RgbImage::from_pixel(8, 4, Rgb([10, 20, 30]));
        canvas.put_pixel(3, 2, Rgb([200, 0, 0]));
        canvas.save(&path).expect("save");

        let loaded = load_image(&path).expect("load");
        assert_eq!(loaded.mime, "image/png");
        assert_eq!(loaded.format, Some(ImageFormat::Png));
        assert_eq!(loaded.canvas, canvas);
    }

    #[test]
    fn text_file_is_rejected_as_load_failure() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"%PDF-1.7 not an image").expect("write");

        let err = match load_image(&path) {
            Ok(_) => panic!("expected load failure"),
            Err(err) => err,
        };
        assert!(err.is_load_failure());
    }

    #[test]
    fn missing_file_is_load_failure() {
        let dir = tempdir().expect("tempdir");
        let err = match load_image(&dir.path().join("absent.jpg")) {
            Ok(_) => panic!("expected load failure"),
            Err(err) => err,
        };
        assert!(matches!(err, RetextError::ImageRead { .. }));
    }

    #[test]
    fn save_uses_fallback_format_without_extension() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("out");
        let canvas = RgbImage::from_pixel(2, 2, Rgb([1, 2, 3]));
        save_image(&canvas, &path, Some(ImageFormat::Png)).expect("save");
        let bytes = std::fs::read(&path).expect("read");
        assert_eq!(infer::get(&bytes).map(|k| k.mime_type()), Some("image/png"));

        let err = save_image(&canvas, &dir.path().join("out2"), None).expect_err("no format");
        assert!(matches!(err, RetextError::UnknownOutputFormat { .. }));
    }
}
