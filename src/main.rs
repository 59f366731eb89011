use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use comic_retext::{GridRequest, ReplaceOptions, StitchRequest};

#[derive(Parser, Debug)]
#[command(
    name = "comic-retext",
    version,
    about = "Replace recognized comic text with translations drawn in place"
)]
struct Cli {
    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "settings", global = true)]
    settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect text on a page and draw translations over it
    Replace {
        /// Input image
        #[arg(short = 'i', long = "input")]
        input: PathBuf,

        /// Output image (format follows the extension)
        #[arg(short = 'o', long = "output")]
        output: PathBuf,

        /// Primary OCR language (tesseract code, e.g. rus)
        #[arg(short = 'l', long = "lang")]
        lang: Option<String>,

        /// Fallback OCR language, tried in order (repeatable)
        #[arg(long = "fallback-lang")]
        fallback_lang: Vec<String>,

        /// TrueType/OpenType font file for the overlay text
        #[arg(long = "font")]
        font: Option<String>,

        /// System font family used when --font is not given
        #[arg(long = "font-family")]
        font_family: Option<String>,

        /// Outline width in pixels (0 disables the halo; capped at the font size)
        #[arg(long = "outline-width")]
        outline_width: Option<u32>,

        /// Minimum word confidence; words at or below it are dropped
        #[arg(long = "confidence")]
        confidence: Option<u32>,

        /// TOML file with [[translation]] entries
        #[arg(short = 't', long = "translations")]
        translations: Option<String>,

        /// Write <stem>_ocr.json and <stem>_ocr_bbox.png next to the output
        #[arg(long = "debug-ocr")]
        debug_ocr: bool,
    },
    /// Repack a .cbz into tall strips
    Stitch {
        /// Input .cbz archive
        #[arg(short = 'i', long = "input")]
        input: PathBuf,

        /// Directory for output_<timestamp>.zip/.cbz
        #[arg(short = 'o', long = "output-dir", default_value = ".")]
        output_dir: PathBuf,

        /// Pages per strip
        #[arg(long = "group-size")]
        group_size: Option<usize>,

        /// Vertical gap between pages in pixels
        #[arg(long = "margin")]
        margin: Option<u32>,
    },
    /// Combine four images into a 2x2 grid
    Grid {
        top_left: PathBuf,
        top_right: PathBuf,
        bottom_left: PathBuf,
        bottom_right: PathBuf,

        /// Output image
        #[arg(short = 'o', long = "output")]
        output: PathBuf,

        /// Gap between cells in pixels
        #[arg(long = "margin")]
        margin: Option<u32>,
    },
    /// List languages installed for tesseract
    Languages,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    comic_retext::logging::init(cli.verbose)?;

    match cli.command {
        Command::Replace {
            input,
            output,
            lang,
            fallback_lang,
            font,
            font_family,
            outline_width,
            confidence,
            translations,
            debug_ocr,
        } => {
            let report = comic_retext::run_replace(ReplaceOptions {
                input,
                output,
                lang,
                fallback_langs: fallback_lang,
                font_path: font,
                font_family,
                outline_width,
                confidence,
                translations_path: translations,
                settings_path: cli.settings,
                debug_ocr,
            })?;
            if !report.ocr_available {
                println!(
                    "OCR unavailable; copied page unchanged to {}",
                    report.output_path.display()
                );
            } else {
                println!(
                    "{}: {} box(es) detected ({}), {} replaced, {} unmatched, {} line(s) drawn",
                    report.output_path.display(),
                    report.detected,
                    report.language.as_deref().unwrap_or("-"),
                    report.stats.replaced,
                    report.stats.unmatched,
                    report.stats.lines_drawn
                );
            }
        }
        Command::Stitch {
            input,
            output_dir,
            group_size,
            margin,
        } => {
            let output = comic_retext::run_stitch(StitchRequest {
                input,
                output_dir,
                group_size,
                margin,
                settings_path: cli.settings,
            })?;
            println!("{}", output.zip_path.display());
            println!("{}", output.cbz_path.display());
        }
        Command::Grid {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
            output,
            margin,
        } => {
            let display = output.display().to_string();
            comic_retext::run_grid(GridRequest {
                top_left,
                top_right,
                bottom_left,
                bottom_right,
                output,
                margin,
                settings_path: cli.settings,
            })?;
            println!("{}", display);
        }
        Command::Languages => {
            for lang in comic_retext::list_ocr_languages(cli.settings.as_deref())? {
                println!("{}", lang);
            }
        }
    }
    Ok(())
}
