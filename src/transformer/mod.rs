//! Turns planned units into final page images.
//!
//! Each [`Unit`] is an isolated job: it loads its own source pages, derives its output
//! images and writes them under the output indices the planner assigned. Jobs share
//! no state, so [`transform_units`] runs them on a rayon pool in any order.

use std::path::{Path, PathBuf};

use image::{ImageBuffer, Luma};
use rayon::ThreadPool;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::planner::Unit;
use crate::types::{Direction, TargetSize, output_file_name};

pub mod geometry;
pub mod jpeg;
pub mod tone;

/// Single-channel floating point image, values in `[0, 1]`.
pub type GrayF32Image = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Settings the transformer needs from the processor configuration.
#[derive(Debug, Clone, Copy)]
pub struct TransformOptions {
    pub direction: Direction,
    pub gamma: f64,
    pub split_overlap: bool,
    pub target_size: Option<TargetSize>,
    pub jpeg_quality: u8,
}

/// Transforms every unit on the given pool and returns all written files in
/// output-index order.
///
/// The first failing unit aborts the batch; units not yet started are skipped.
pub fn transform_units(
    pool: &ThreadPool,
    units: &[Unit],
    output_dir: &Path,
    options: TransformOptions,
) -> Result<Vec<PathBuf>> {
    let per_unit: Vec<Vec<PathBuf>> = pool.install(|| {
        units
            .par_iter()
            .map(|unit| transform_unit(unit, output_dir, options))
            .collect::<Result<Vec<_>>>()
    })?;
    Ok(per_unit.into_iter().flatten().collect())
}

/// Loads, merges and processes a single unit, writing `<index>.jpg` per output page.
pub fn transform_unit(
    unit: &Unit,
    output_dir: &Path,
    options: TransformOptions,
) -> Result<Vec<PathBuf>> {
    let gray = {
        let first = image::open(&unit.primary)?.to_rgb8();
        let page = match &unit.secondary {
            Some(secondary) => {
                let second = image::open(secondary)?.to_rgb8();
                geometry::merge_pages(&first, &second, options.direction)?
            }
            None => first,
        };
        geometry::to_gray_f32(&page)
    };

    let cropped = geometry::crop(gray, unit.bbox);
    let pages = geometry::derive_pages(
        cropped,
        unit.is_spread,
        unit.split_mode,
        options.split_overlap,
        options.target_size,
        options.direction,
    );

    if pages.len() != unit.output_count() {
        return Err(Error::Invariant(format!(
            "Unit from page {} produced {} images for {} planned outputs",
            unit.source_index,
            pages.len(),
            unit.output_count()
        )));
    }

    let mut written = Vec::with_capacity(pages.len());
    for (page, index) in pages.into_iter().zip(unit.output_indices.clone()) {
        let corrected = tone::gamma_correct(&page, options.gamma);
        let quantized = tone::quantize(corrected);
        let bytes = jpeg::encode_jpeg(&quantized, options.jpeg_quality)?;

        let path = output_dir.join(output_file_name(index));
        std::fs::write(&path, bytes)?;
        written.push(path);
    }

    log::debug!(
        "Transformed page {}{} into {:?}",
        unit.source_index,
        if unit.is_merged() { " (merged)" } else { "" },
        unit.output_indices
    );
    Ok(written)
}
