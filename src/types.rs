//! Core data types and enums for the Mihiraki spread pipeline.
//!
//! This module defines the fundamental data structures shared by the pipeline stages:
//! - Settings enumerations (`Direction`, `CropMode`, `SplitMode`)
//! - Geometry (`Rect`, `TargetSize`)
//! - Per-page analysis results (`PairMetric`)
//! - The final result handed to container writers (`ProcessedComic`)

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::layout::{PageMap, SpreadMap};

/// Reading direction of the source book.
///
/// Governs which page edges form the seam, the order of split halves and
/// the Left/Right spread flags.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Ltr => write!(f, "ltr"),
            Direction::Rtl => write!(f, "rtl"),
        }
    }
}

/// Border cropping mode applied to every page.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub enum CropMode {
    None,
    /// Crop uniform near-black and near-white margins, at most 10% per side.
    #[default]
    Default,
}

/// How a page classified as a spread is turned into output pages.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub enum SplitMode {
    /// Keep the spread as one landscape page.
    None,
    /// Rotate the spread to portrait.
    Rotate,
    /// Cut the spread into two halves.
    Split,
    /// Rotated whole spread followed by both halves.
    #[default]
    Both,
}

impl SplitMode {
    /// Number of output pages produced for a unit.
    pub fn output_count(self, is_spread: bool) -> usize {
        if !is_spread {
            return 1;
        }
        match self {
            SplitMode::None | SplitMode::Rotate => 1,
            SplitMode::Split => 2,
            SplitMode::Both => 3,
        }
    }
}

/// Page-spread placement of an output page in a fixed-layout reader.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub enum SpreadSide {
    Center,
    Left,
    Right,
}

/// Output canvas size for letterboxing, in pixels.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    /// 1404x1872 portrait canvas of common 10" e-ink readers.
    pub const DEFAULT_DEVICE: TargetSize = TargetSize {
        width: 1404,
        height: 1872,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height.
    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl From<(u32, u32)> for TargetSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Half-open pixel rectangle `[left, right) x [top, bottom)`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Rect {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Tightest rectangle common to both.
    pub fn intersect(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        }
    }
}

/// Analysis result for one source page, measured against its successor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct PairMetric {
    /// Share of seam rows carrying content, in `[0, 1]`.
    pub merge_score: f64,
    /// RMS luminance difference across the seam over the content rows.
    pub merge_contrast: f64,
    /// Content bounding box, `None` when cropping is off or nothing was found.
    pub bbox: Option<Rect>,
    pub width: u32,
    pub height: u32,
}

impl PairMetric {
    /// Merge decision: `score > pct_threshold && contrast < contrast_threshold`.
    pub fn is_mergeable(&self, pct_threshold: f64, contrast_threshold: f64) -> bool {
        self.merge_score > pct_threshold && self.merge_contrast < contrast_threshold
    }
}

/// Final result of a run, consumed by container writers.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessedComic {
    /// Written JPEG files in final reading order (`00000.jpg`, `00001.jpg`, ...).
    pub images: Vec<PathBuf>,
    /// Source page index to primary output index, in source order.
    pub page_map: PageMap,
    /// Spread placement of output pages produced by spread units.
    pub spread_map: SpreadMap,
}

/// A page image is a spread when it is wider than tall.
pub fn is_spread(width: u32, height: u32) -> bool {
    width > height
}

/// File name of an output page: five-digit zero-padded index plus `.jpg`.
pub fn output_file_name(index: usize) -> String {
    format!("{:05}.jpg", index)
}

/// Utility function: Determines file type and MIME type from a file path
///
/// # Supported formats
///
/// - JPEG/JPG: image/jpeg
/// - PNG: image/png
/// - WebP: image/webp
pub fn get_file_info(image_path: &Path) -> Result<(&'static str, &'static str)> {
    let extension = image_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => Ok(("jpg", "image/jpeg")),
        Some("png") => Ok(("png", "image/png")),
        Some("webp") => Ok(("webp", "image/webp")),
        _ => Err(Error::Unsupported(format!("Image format {:#?}", extension))),
    }
}
