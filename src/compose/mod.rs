//! Page assembly helpers that work on whole images rather than text boxes.

mod grid;
mod stitch;

pub use grid::{compose_grid, compose_grid_files};
pub use stitch::{StitchOptions, StitchOutput, read_cbz_pages, repack_cbz, stitch_strip};
