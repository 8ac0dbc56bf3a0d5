//! Per-page analysis: seam mergeability against the successor page and the
//! content bounding box used for margin cropping.
//!
//! Every page is analyzed independently of the others, so [`analyze_pages`] fans
//! the work out over a rayon pool and returns the metrics in source order.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, GrayImage, Pixel};
use rayon::ThreadPool;
use rayon::prelude::*;

use crate::error::Result;
use crate::types::{CropMode, Direction, PairMetric, Rect};

/// Seam rows with both luminances below this are not white background.
const WHITE_BACKGROUND_LUMINANCE: f64 = 0.95;
/// Seam rows with both luminances above this are not black background.
const BLACK_BACKGROUND_LUMINANCE: f64 = 0.05;
/// Gray band treated as near-black margin.
const NEAR_BLACK_BAND: (u8, u8) = (0, 16);
/// Gray band treated as near-white margin.
const NEAR_WHITE_BAND: (u8, u8) = (235, 255);
/// Largest share of an axis that may be cropped from each side.
const MAX_CROP_RATIO: f64 = 0.1;

/// Settings the analyzer needs from the processor configuration.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzeOptions {
    pub direction: Direction,
    pub merge_enabled: bool,
    pub crop_mode: CropMode,
}

/// Analyzes every page against its successor on the given pool.
///
/// The first failing page aborts the whole batch.
pub fn analyze_pages(
    pool: &ThreadPool,
    pages: &[PathBuf],
    options: AnalyzeOptions,
) -> Result<Vec<PairMetric>> {
    pool.install(|| {
        pages
            .par_iter()
            .enumerate()
            .map(|(i, page)| {
                let next = pages.get(i + 1).map(PathBuf::as_path);
                analyze_page(page, next, options)
            })
            .collect()
    })
}

/// Computes the metric of a single page against its successor, if any.
pub fn analyze_page(
    page: &Path,
    next: Option<&Path>,
    options: AnalyzeOptions,
) -> Result<PairMetric> {
    let current = image::open(page)?;
    let (width, height) = current.dimensions();

    let (merge_score, merge_contrast) = match next {
        Some(next) if options.merge_enabled && width < height => {
            let next = image::open(next)?;
            if next.width() < next.height() {
                seam_metrics(&current, &next, options.direction)
            } else {
                (0.0, 0.0)
            }
        }
        _ => (0.0, 0.0),
    };

    let bbox = match options.crop_mode {
        CropMode::None => None,
        CropMode::Default => content_bbox(&current.to_luma8()),
    };

    log::debug!(
        "Analyzed {:?}: {}x{}, seam score {:.3}, contrast {:.3}, bbox {:?}",
        page,
        width,
        height,
        merge_score,
        merge_contrast,
        bbox
    );

    Ok(PairMetric {
        merge_score,
        merge_contrast,
        bbox,
        width,
        height,
    })
}

/// sRGB channel in `[0, 255]` to linear light in `[0, 1]`.
pub fn srgb_to_linear(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// BT.709 relative luminance of an sRGB pixel.
pub fn relative_luminance(rgb: [u8; 3]) -> f64 {
    0.2126 * srgb_to_linear(rgb[0])
        + 0.7152 * srgb_to_linear(rgb[1])
        + 0.0722 * srgb_to_linear(rgb[2])
}

fn rms(values: &[f64]) -> f64 {
    (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
}

/// Measures how well two pages continue each other across the seam.
///
/// Returns `(score, contrast)`: the share of seam rows that carry content on both
/// sides, and the RMS luminance difference over those rows. Rows are split into a
/// "not white" and a "not black" set; the smaller one is used since the larger is
/// dominated by the page background. Pages of different heights never match.
pub fn seam_metrics(
    current: &DynamicImage,
    next: &DynamicImage,
    direction: Direction,
) -> (f64, f64) {
    if current.height() != next.height() || current.height() == 0 || next.width() == 0 {
        return (0.0, 0.0);
    }

    // Trailing edge of the current page meets the leading edge of the next one.
    let (x_current, x_next) = match direction {
        Direction::Ltr => (current.width() - 1, 0),
        Direction::Rtl => (0, next.width() - 1),
    };

    let mut not_white = Vec::new();
    let mut not_black = Vec::new();
    for y in 0..current.height() {
        let y0 = relative_luminance(current.get_pixel(x_current, y).to_rgb().0);
        let y1 = relative_luminance(next.get_pixel(x_next, y).to_rgb().0);
        let delta = (y0 - y1).abs();

        if y0 < WHITE_BACKGROUND_LUMINANCE && y1 < WHITE_BACKGROUND_LUMINANCE {
            not_white.push(delta);
        }
        if y0 > BLACK_BACKGROUND_LUMINANCE && y1 > BLACK_BACKGROUND_LUMINANCE {
            not_black.push(delta);
        }
    }

    if not_white.is_empty() || not_black.is_empty() {
        return (0.0, 0.0);
    }

    let rows = if not_white.len() < not_black.len() {
        &not_white
    } else {
        &not_black
    };
    (rows.len() as f64 / current.height() as f64, rms(rows))
}

/// Content bounding box of a grayscale page.
///
/// Near-black and near-white margins are detected separately and the two boxes
/// intersected. `None` when the page is blank for both bands.
pub fn content_bbox(gray: &GrayImage) -> Option<Rect> {
    let black = band_bbox(gray, NEAR_BLACK_BAND);
    let white = band_bbox(gray, NEAR_WHITE_BAND);
    match (black, white) {
        (None, None) => None,
        (Some(b), None) => Some(b),
        (None, Some(w)) => Some(w),
        (Some(b), Some(w)) => Some(b.intersect(&w)),
    }
}

/// Bounding box of the pixels outside `band`, with each side cropping at most
/// [`MAX_CROP_RATIO`] of the axis.
pub fn band_bbox(gray: &GrayImage, band: (u8, u8)) -> Option<Rect> {
    let (width, height) = gray.dimensions();
    let mut found: Option<Rect> = None;

    for (x, y, pixel) in gray.enumerate_pixels() {
        let value = pixel.0[0];
        if (band.0..=band.1).contains(&value) {
            continue;
        }
        found = Some(match found {
            None => Rect::new(x, y, x + 1, y + 1),
            Some(r) => Rect::new(
                r.left.min(x),
                r.top.min(y),
                r.right.max(x + 1),
                r.bottom.max(y + 1),
            ),
        });
    }

    let content = found?;
    let margin_x = (MAX_CROP_RATIO * width as f64 + 0.5) as u32;
    let margin_y = (MAX_CROP_RATIO * height as f64 + 0.5) as u32;
    Some(Rect::new(
        content.left.min(margin_x),
        content.top.min(margin_y),
        width.min(content.right.max(width.saturating_sub(margin_x))),
        height.min(content.bottom.max(height.saturating_sub(margin_y))),
    ))
}
