use anyhow::{Context, Result, anyhow};
use image::{Rgb, RgbImage};
use std::path::Path;
use tracing::info;

use crate::image_io::{load_image, save_image};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Places four images as top-left, top-right, bottom-left, bottom-right.
///
/// Columns are not aligned across rows: each right-hand image starts
/// `margin` px after its own row's left image.
pub fn compose_grid(tiles: [&RgbImage; 4], margin: u32) -> Result<RgbImage> {
    let [tl, tr, bl, br] = tiles;
    let too_large = || anyhow!("grid too large with a {} px margin", margin);
    let top_width = sum3(tl.width(), margin, tr.width()).ok_or_else(too_large)?;
    let bottom_width = sum3(bl.width(), margin, br.width()).ok_or_else(too_large)?;
    let top_height = tl.height().max(tr.height());
    let height = sum3(top_height, margin, bl.height().max(br.height()))
        .ok_or_else(too_large)?;

    let mut canvas = RgbImage::from_pixel(top_width.max(bottom_width), height, BACKGROUND);
    let bottom_y = i64::from(top_height) + i64::from(margin);
    image::imageops::replace(&mut canvas, tl, 0, 0);
    image::imageops::replace(&mut canvas, tr, i64::from(tl.width()) + i64::from(margin), 0);
    image::imageops::replace(&mut canvas, bl, 0, bottom_y);
    let br_x = i64::from(bl.width()) + i64::from(margin);
    image::imageops::replace(&mut canvas, br, br_x, bottom_y);
    Ok(canvas)
}

fn sum3(first: u32, margin: u32, second: u32) -> Option<u32> {
    first.checked_add(margin)?.checked_add(second)
}

pub fn compose_grid_files(inputs: [&Path; 4], output: &Path, margin: u32) -> Result<()> {
    let mut tiles = Vec::with_capacity(4);
    for path in inputs {
        let loaded = load_image(path)
            .with_context(|| format!("failed to load grid image: {}", path.display()))?;
        tiles.push(loaded.canvas);
    }
    let canvas = compose_grid([&tiles[0], &tiles[1], &tiles[2], &tiles[3]], margin)?;
    save_image(&canvas, output, Some(image::ImageFormat::Png))
        .with_context(|| format!("failed to write grid: {}", output.display()))?;
    info!(
        output = %output.display(),
        width = canvas.width(),
        height = canvas.height(),
        "grid written"
    );
    Ok(())
}
