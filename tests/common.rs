//! Common test utilities and constants for the Mihiraki crate.
//!
//! Provides functions for setting up test directories and writing synthetic page
//! images with known seam and margin properties.

use image::{GrayImage, Luma, Rgb, RgbImage};
use mihiraki::error::{Error, Result};
use mihiraki::types::{PairMetric, Rect};
use rand::{Rng, distributions::Alphanumeric};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";
#[allow(dead_code)]
pub const LONG_TEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Portrait page size used by the synthetic pages.
#[allow(dead_code)]
pub const PAGE_WIDTH: u32 = 60;
#[allow(dead_code)]
pub const PAGE_HEIGHT: u32 = 80;

#[allow(dead_code)]
pub struct TestDirs {
    pub base_dir: PathBuf,
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
}

/// Helper function to create a clean test directory with source and target subdirectories.
/// The directory name carries a random suffix so tests can run in parallel.
#[allow(dead_code)]
pub async fn setup_test_dirs(sub_path: &str) -> TestDirs {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let unique_sub_path = format!("{}-{}", sub_path, rand_string);
    let base_dir = PathBuf::from(TEST_TMP_DIR).join(unique_sub_path);
    if base_dir.exists() {
        fs::remove_dir_all(&base_dir).await.unwrap();
    }
    let source_dir = base_dir.join("source");
    let target_dir = base_dir.join("target");

    fs::create_dir_all(&source_dir).await.unwrap();

    TestDirs {
        base_dir,
        source_dir,
        target_dir,
    }
}

/// Removes a test directory created by [`setup_test_dirs`].
#[allow(dead_code)]
pub async fn cleanup_test_dirs(dirs: &TestDirs) {
    let _ = fs::remove_dir_all(&dirs.base_dir).await;
}

/// Saves an image as PNG so pixel values survive exactly.
#[allow(dead_code)]
pub async fn save_png(path: &Path, img: RgbImage) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let path_clone = path.to_path_buf();
    tokio::task::spawn_blocking(move || img.save_with_format(path_clone, image::ImageFormat::Png))
        .await
        .map_err(|e| Error::AsyncTaskError(e.to_string()))?
        .map_err(Error::Image)?;
    Ok(())
}

/// Uniformly colored page.
#[allow(dead_code)]
pub fn flat_page(width: u32, height: u32, color: Rgb<u8>) -> RgbImage {
    RgbImage::from_pixel(width, height, color)
}

/// Page whose rows alternate between two mid grays in bands of four.
///
/// Every column is identical, so two such pages continue each other at any seam.
#[allow(dead_code)]
pub fn striped_page(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |_, y| {
        if (y / 4) % 2 == 0 {
            Rgb([100, 100, 100])
        } else {
            Rgb([150, 150, 150])
        }
    })
}

/// Page with the inverse banding of [`striped_page`], so the seam contrast is high.
#[allow(dead_code)]
pub fn inverse_striped_page(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |_, y| {
        if (y / 4) % 2 == 0 {
            Rgb([20, 20, 20])
        } else {
            Rgb([230, 230, 230])
        }
    })
}

/// Gray content block surrounded by a white margin of `margin` pixels.
#[allow(dead_code)]
pub fn framed_page(width: u32, height: u32, margin: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let inside =
            x >= margin && x < width - margin && y >= margin && y < height - margin;
        if inside { Luma([120]) } else { Luma([255]) }
    })
}

/// Writes `pages` as `000.png`, `001.png`, ... and returns their paths in order.
#[allow(dead_code)]
pub async fn write_book(dir: &Path, pages: Vec<RgbImage>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(pages.len());
    for (i, page) in pages.into_iter().enumerate() {
        let path = dir.join(format!("{:03}.png", i));
        save_png(&path, page).await?;
        paths.push(path);
    }
    Ok(paths)
}

/// Analyzer result of a portrait page with full-frame content.
#[allow(dead_code)]
pub fn portrait_metric(merge_score: f64, merge_contrast: f64) -> PairMetric {
    PairMetric {
        merge_score,
        merge_contrast,
        bbox: Some(Rect::new(0, 0, PAGE_WIDTH, PAGE_HEIGHT)),
        width: PAGE_WIDTH,
        height: PAGE_HEIGHT,
    }
}

/// Placeholder page paths for planner tests, which never open files.
#[allow(dead_code)]
pub fn page_paths(count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| PathBuf::from(format!("{:03}.png", i)))
        .collect()
}
