use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::RgbImage;
use resvg::render;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tiny_skia::Pixmap;
use usvg::{Options, Tree};

use crate::error::RetextError;
use crate::ocr::DetectedTextBox;

/// Where the OCR debug artefacts of one run are written.
#[derive(Debug, Clone)]
pub struct OcrDebugConfig {
    output_dir: PathBuf,
    base_name: String,
}

impl OcrDebugConfig {
    /// Artefacts land next to `output`, named after the input file stem.
    pub fn beside(output: &Path, input: &Path) -> Self {
        let output_dir = output
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let base = input
            .file_stem()
            .and_then(|value| value.to_str())
            .unwrap_or("input");
        Self {
            output_dir,
            base_name: sanitize_filename_component(base),
        }
    }

    pub fn overlay_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_ocr_bbox.png", self.base_name))
    }

    pub fn json_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_ocr.json", self.base_name))
    }
}

pub fn write_ocr_debug(
    config: &OcrDebugConfig,
    canvas: &RgbImage,
    boxes: &[DetectedTextBox],
) -> Result<(), RetextError> {
    std::fs::create_dir_all(&config.output_dir)
        .map_err(|err| debug_error(&config.output_dir, err))?;

    let json_path = config.json_path();
    let json = serde_json::to_string_pretty(boxes).map_err(|err| debug_error(&json_path, err))?;
    std::fs::write(&json_path, json).map_err(|err| debug_error(&json_path, err))?;

    let overlay_path = config.overlay_path();
    let svg = render_bbox_svg(canvas, boxes).map_err(|err| debug_error(&overlay_path, err))?;
    let png = rasterize_svg(&svg).map_err(|err| debug_error(&overlay_path, err))?;
    std::fs::write(&overlay_path, png).map_err(|err| debug_error(&overlay_path, err))?;
    Ok(())
}

pub fn render_bbox_svg(
    canvas: &RgbImage,
    boxes: &[DetectedTextBox],
) -> Result<String, image::ImageError> {
    let mut png = Vec::new();
    canvas.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    let data_uri = format!("data:image/png;base64,{}", BASE64.encode(&png));
    let (width, height) = canvas.dimensions();

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    ));
    svg.push_str(&format!(
        r#"<image href="{uri}" xlink:href="{uri}" x="0" y="0" width="{w}" height="{h}" preserveAspectRatio="none"/>"#,
        uri = data_uri,
        w = width,
        h = height
    ));
    for detected in boxes {
        let rect = detected.rect;
        svg.push_str(&format!(
            r##"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="none" stroke="#00c853" stroke-width="2"/>"##,
            x = rect.x1,
            y = rect.y1,
            w = rect.width(),
            h = rect.height()
        ));
    }
    svg.push_str("</svg>");
    Ok(svg)
}

fn rasterize_svg(svg: &str) -> Result<Vec<u8>, String> {
    let tree = Tree::from_str(svg, &Options::default()).map_err(|err| err.to_string())?;
    let size = tree.size().to_int_size();
    let mut pixmap =
        Pixmap::new(size.width(), size.height()).ok_or_else(|| "empty SVG size".to_string())?;
    render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
    let image = image::RgbaImage::from_raw(size.width(), size.height(), pixmap.data().to_vec())
        .ok_or_else(|| "failed to build image buffer from SVG".to_string())?;
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|err| err.to_string())?;
    Ok(bytes)
}

fn debug_error(path: &Path, err: impl std::fmt::Display) -> RetextError {
    RetextError::DebugOutput {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

fn sanitize_filename_component(value: &str) -> String {
    let mut out = String::new();
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
        } else if ch.is_whitespace() {
            out.push('_');
        }
    }
    if out.is_empty() {
        "input".to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::TextRect;
    use image::Rgb;
    use tempfile::tempdir;

    fn sample_boxes() -> Vec<DetectedTextBox> {
        vec![DetectedTextBox {
            text: "ТЕСТ".to_string(),
            rect: TextRect::new(10, 10, 60, 30),
            confidence: 90,
        }]
    }

    #[test]
    fn paths_follow_output_dir_and_input_stem() {
        let config =
            OcrDebugConfig::beside(Path::new("/tmp/out/page.png"), Path::new("in/стр 1.jpg"));
        assert_eq!(config.json_path(), Path::new("/tmp/out/_1_ocr.json"));

        let config = OcrDebugConfig::beside(Path::new("page.png"), Path::new("scan-01.jpg"));
        assert_eq!(config.overlay_path(), Path::new("./scan-01_ocr_bbox.png"));
    }

    #[test]
    fn svg_outlines_every_box() {
        let canvas = RgbImage::from_pixel(200, 100, Rgb([255, 255, 255]));
        let svg = render_bbox_svg(&canvas, &sample_boxes()).expect("svg");
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"<rect x="10" y="10" width="50" height="20""#));
        assert!(svg.contains("data:image/png;base64,"));
    }

    #[test]
    fn writes_overlay_and_json() {
        let dir = tempdir().expect("tempdir");
        let config = OcrDebugConfig::beside(&dir.path().join("out.png"), Path::new("page.jpg"));
        let canvas = RgbImage::from_pixel(40, 30, Rgb([255, 255, 255]));
        write_ocr_debug(&config, &canvas, &sample_boxes()).expect("debug output");

        let overlay = image::open(config.overlay_path()).expect("overlay png");
        assert_eq!((overlay.width(), overlay.height()), (40, 30));

        let json = std::fs::read_to_string(config.json_path()).expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value[0]["text"], "ТЕСТ");
        assert_eq!(value[0]["box"]["y2"], 30);
    }
}
