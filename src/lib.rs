//! Mihiraki - Comic Page Spread Processing Library
//!
//! This crate prepares scanned or rendered comic pages for e-readers. It detects
//! physical double-page spreads across adjacent pages, merges them, crops uniform
//! margins, splits or rotates wide spreads, letterboxes to the device canvas and
//! writes 16-level grayscale JPEG pages.
//!
//! The pipeline has three stages joined by immutable hand-offs:
//!
//! 1. [`analyzer`] measures every page against its successor (parallel)
//! 2. [`planner`] decides merges, splits and output indices in one pass (sequential)
//! 3. [`transformer`] renders every planned unit to `00000.jpg`, `00001.jpg`, ... (parallel)
//!
//! Container readers and writers stay outside the crate: they hand over the ordered
//! page images and read back the output pages together with a [`PageMap`] (to move
//! bookmarks) and a [`SpreadMap`] (to mark page-spread layout).
//!
//! # Getting Started
//!
//! ```rust,no_run
//! use mihiraki::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> mihiraki::error::Result<()> {
//!     let config = ProcessorConfig::builder()
//!         .reading_direction(Direction::Rtl)
//!         .split_mode(SplitMode::Both)
//!         .target_size(TargetSize::DEFAULT_DEVICE)
//!         .jpeg_quality(60u8)
//!         .build()?;
//!
//!     let comic = config
//!         .process_directory(Path::new("./my_manga/volume_01"), Path::new("./out"))
//!         .await?;
//!
//!     for (source, output) in comic.page_map.iter() {
//!         println!("source page {} -> output page {}", source, output);
//!     }
//!     println!("{} pages written", comic.images.len());
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod collector;
pub mod error;
pub mod layout;
pub mod planner;
pub mod processor;
pub mod transformer;
pub mod types;

pub use processor::ProcessorConfig;
pub use processor::ProcessorConfigBuilder;

pub use layout::{PageMap, SpreadMap};
pub use planner::{Plan, Unit};
pub use types::{
    CropMode, Direction, PairMetric, ProcessedComic, Rect, SplitMode, SpreadSide, TargetSize,
};

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types, allowing you to
/// import everything you need with a single `use mihiraki::prelude::*;` statement.
pub mod prelude {
    pub use super::{
        CropMode, Direction, PageMap, PairMetric, Plan, ProcessedComic, ProcessorConfig,
        ProcessorConfigBuilder, Rect, SplitMode, SpreadMap, SpreadSide, TargetSize, Unit, error,
        types,
    };
    pub use crate::collector::Collector;
    pub use std::path::{Path, PathBuf};
}
