use anyhow::{Context, Result, anyhow};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const PAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp"];
const STRIP_QUALITY: u8 = 100;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StitchOptions {
    pub images_per_group: usize,
    pub margin: u32,
}

impl Default for StitchOptions {
    fn default() -> Self {
        Self {
            images_per_group: 10,
            margin: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StitchOutput {
    pub zip_path: PathBuf,
    pub cbz_path: PathBuf,
    pub strips: Vec<String>,
}

/// Repacks a CBZ into tall strips of `images_per_group` pages each and
/// writes them as `output_<timestamp>.zip` plus an identical `.cbz`.
pub fn repack_cbz(
    input: &Path,
    output_dir: &Path,
    options: &StitchOptions,
) -> Result<StitchOutput> {
    let is_cbz = input
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".cbz"));
    if !is_cbz {
        return Err(anyhow!(
            "please provide a valid .cbz file: {}",
            input.display()
        ));
    }
    let bytes = std::fs::read(input)
        .with_context(|| format!("failed to read cbz: {}", input.display()))?;
    let pages = read_cbz_pages(&bytes)?;
    if pages.is_empty() {
        return Err(anyhow!("no valid image files found in CBZ"));
    }

    let group_size = options.images_per_group.max(1);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let file_options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut strips = Vec::new();
    for (idx, group) in pages.chunks(group_size).enumerate() {
        let strip = stitch_strip(group, options.margin)?;
        let name = format!("tall_{:03}.jpg", idx + 1);
        debug!(
            strip = %name,
            pages = group.len(),
            width = strip.width(),
            height = strip.height(),
            "strip built"
        );
        let encoded = encode_jpeg(&strip)?;
        writer
            .start_file(name.as_str(), file_options)
            .with_context(|| "failed to write zip entry")?;
        writer
            .write_all(&encoded)
            .with_context(|| "failed to write zip content")?;
        strips.push(name);
    }
    let archive = writer
        .finish()
        .with_context(|| "failed to finalize zip output")?
        .into_inner();

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;
    let base = format!("output_{}", timestamp()?);
    let zip_path = output_dir.join(format!("{}.zip", base));
    let cbz_path = output_dir.join(format!("{}.cbz", base));
    std::fs::write(&zip_path, &archive)
        .with_context(|| format!("failed to write {}", zip_path.display()))?;
    std::fs::copy(&zip_path, &cbz_path)
        .with_context(|| format!("failed to write {}", cbz_path.display()))?;

    info!(
        pages = pages.len(),
        strips = strips.len(),
        output = %zip_path.display(),
        "cbz repacked"
    );
    Ok(StitchOutput {
        zip_path,
        cbz_path,
        strips,
    })
}

/// Decodes the top-level page images of a CBZ, ordered by entry name.
/// Entries inside folders are not pages.
pub fn read_cbz_pages(bytes: &[u8]) -> Result<Vec<RgbImage>> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).with_context(|| "failed to read zip archive")?;
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .with_context(|| "failed to read zip entry")?;
        let name = file.name().to_string();
        if file.is_dir() || name.contains('/') || !is_page_name(&name) {
            continue;
        }
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .with_context(|| format!("failed to read zip entry content: {}", name))?;
        entries.push((name, data));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    entries
        .into_iter()
        .map(|(name, data)| {
            image::load_from_memory(&data)
                .map(|page| page.to_rgb8())
                .with_context(|| format!("failed to decode page: {}", name))
        })
        .collect()
}

/// Stacks `pages` top to bottom, left-aligned, `margin` px apart on white.
pub fn stitch_strip(pages: &[RgbImage], margin: u32) -> Result<RgbImage> {
    let width = pages.iter().map(|page| page.width()).max().unwrap_or(0);
    let gap_count = u32::try_from(pages.len().saturating_sub(1))
        .map_err(|_| anyhow!("strip too large: {} pages", pages.len()))?;
    let height = pages
        .iter()
        .try_fold(0u32, |total, page| total.checked_add(page.height()))
        .and_then(|total| total.checked_add(margin.checked_mul(gap_count)?))
        .ok_or_else(|| {
            anyhow!(
                "strip too large: {} pages with a {} px margin",
                pages.len(),
                margin
            )
        })?;

    let mut strip = RgbImage::from_pixel(width, height, BACKGROUND);
    let mut y_offset = 0i64;
    for page in pages {
        image::imageops::replace(&mut strip, page, 0, y_offset);
        y_offset += i64::from(page.height()) + i64::from(margin);
    }
    Ok(strip)
}

fn is_page_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    PAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn encode_jpeg(strip: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, STRIP_QUALITY)
        .encode_image(strip)
        .with_context(|| "failed to encode strip")?;
    Ok(bytes)
}

/// Local wall-clock time; UTC when the local offset cannot be determined.
fn timestamp() -> Result<String> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format_timestamp(now)
}

fn format_timestamp(moment: OffsetDateTime) -> Result<String> {
    let format = time::format_description::parse("[year][month][day][hour][minute][second]")
        .with_context(|| "invalid timestamp format")?;
    moment
        .format(&format)
        .with_context(|| "failed to format timestamp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn png(width: u32, height: u32, shade: u8) -> Vec<u8> {
        let page = RgbImage::from_pixel(width, height, Rgb([shade, shade, shade]));
        let mut bytes = Vec::new();
        page.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    fn write_cbz(path: &Path, entries: &[(&str, Vec<u8>)]) {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer
                .start_file(*name, FileOptions::default())
                .expect("start entry");
            writer.write_all(data).expect("write entry");
        }
        let bytes = writer.finish().expect("finish").into_inner();
        std::fs::write(path, bytes).expect("write cbz");
    }

    #[test]
    fn strip_dimensions_include_margins() {
        let pages = vec![
            RgbImage::from_pixel(30, 10, Rgb([0, 0, 0])),
            RgbImage::from_pixel(50, 20, Rgb([0, 0, 0])),
            RgbImage::from_pixel(40, 5, Rgb([0, 0, 0])),
        ];
        let strip = stitch_strip(&pages, 20).expect("strip");
        assert_eq!(strip.dimensions(), (50, 10 + 20 + 20 + 20 + 5));
        assert_eq!(strip.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(strip.get_pixel(0, 15), &BACKGROUND);
        assert_eq!(strip.get_pixel(49, 30), &Rgb([0, 0, 0]));
        assert_eq!(strip.get_pixel(45, 70), &BACKGROUND);
    }

    #[test]
    fn timestamp_is_fourteen_digits() {
        let moment = OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("timestamp");
        assert_eq!(format_timestamp(moment).expect("format"), "20231114221320");

        let now = timestamp().expect("now");
        assert_eq!(now.len(), 14);
        assert!(now.chars().all(|ch| ch.is_ascii_digit()));
    }

    #[test]
    fn oversized_margin_is_an_error() {
        let pages = vec![RgbImage::new(2, 2), RgbImage::new(2, 2)];
        let err = stitch_strip(&pages, u32::MAX).expect_err("overflow");
        assert!(err.to_string().contains("strip too large"));

        let single = stitch_strip(&pages[..1], u32::MAX).expect("no gaps for one page");
        assert_eq!(single.dimensions(), (2, 2));
    }

    #[test]
    fn pages_are_sorted_and_non_pages_ignored() {
        let dir = tempdir().expect("tempdir");
        let cbz = dir.path().join("chapter.cbz");
        write_cbz(
            &cbz,
            &[
                ("002.PNG", png(4, 4, 20)),
                ("001.png", png(4, 4, 10)),
                ("ComicInfo.xml", b"<ComicInfo/>".to_vec()),
                ("extras/003.png", png(4, 4, 30)),
            ],
        );
        let pages = read_cbz_pages(&std::fs::read(&cbz).expect("read")).expect("pages");
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].get_pixel(0, 0), &Rgb([10, 10, 10]));
        assert_eq!(pages[1].get_pixel(0, 0), &Rgb([20, 20, 20]));
    }

    #[test]
    fn repack_groups_pages_into_strips() {
        let dir = tempdir().expect("tempdir");
        let cbz = dir.path().join("chapter.cbz");
        let entries = (1..=5)
            .map(|i| (format!("{:03}.png", i), png(8 + i, 6, 100)))
            .collect::<Vec<_>>();
        let borrowed = entries
            .iter()
            .map(|(name, data)| (name.as_str(), data.clone()))
            .collect::<Vec<_>>();
        write_cbz(&cbz, &borrowed);

        let options = StitchOptions {
            images_per_group: 2,
            margin: 20,
        };
        let out_dir = dir.path().join("out");
        let output = repack_cbz(&cbz, &out_dir, &options).expect("repack");
        assert_eq!(output.strips, vec!["tall_001.jpg", "tall_002.jpg", "tall_003.jpg"]);
        assert_eq!(
            std::fs::read(&output.zip_path).expect("zip"),
            std::fs::read(&output.cbz_path).expect("cbz")
        );

        let zip_bytes = std::fs::read(&output.zip_path).expect("zip");
        let mut archive = ZipArchive::new(Cursor::new(zip_bytes)).expect("archive");
        let mut first = Vec::new();
        archive
            .by_name("tall_001.jpg")
            .expect("first strip")
            .read_to_end(&mut first)
            .expect("read strip");
        let strip = image::load_from_memory(&first).expect("decode strip");
        assert_eq!((strip.width(), strip.height()), (10, 6 + 20 + 6));

        let mut last = Vec::new();
        archive
            .by_name("tall_003.jpg")
            .expect("last strip")
            .read_to_end(&mut last)
            .expect("read strip");
        let strip = image::load_from_memory(&last).expect("decode strip");
        assert_eq!((strip.width(), strip.height()), (13, 6));
    }

    #[test]
    fn wrong_extension_and_empty_archive_are_rejected() {
        let dir = tempdir().expect("tempdir");
        let zip = dir.path().join("chapter.zip");
        write_cbz(&zip, &[("001.png", png(2, 2, 0))]);
        let err = repack_cbz(&zip, dir.path(), &StitchOptions::default()).expect_err("not cbz");
        assert!(err.to_string().contains("valid .cbz"));

        let cbz = dir.path().join("empty.cbz");
        write_cbz(&cbz, &[("notes.txt", b"hi".to_vec())]);
        let err = repack_cbz(&cbz, dir.path(), &StitchOptions::default()).expect_err("no pages");
        assert!(err.to_string().contains("no valid image files"));
    }
}
