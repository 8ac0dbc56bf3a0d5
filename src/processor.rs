use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};
use regex::Regex;
use tokio::fs;
use tokio::task::spawn_blocking;

use crate::analyzer::{self, AnalyzeOptions};
use crate::collector::Collector;
use crate::error::{Error, Result};
use crate::layout::{PageMap, SpreadMap};
use crate::planner::{self, Plan, PlanOptions};
use crate::transformer::{self, TransformOptions};
use crate::types::{
    CropMode, Direction, PairMetric, ProcessedComic, SplitMode, TargetSize, get_file_info,
};

/// The spread processing configuration, built declaratively using the builder pattern.
///
/// Once built, the configuration is immutable and drives the three pipeline stages:
///
/// 1. analysis of every page against its successor (parallel),
/// 2. planning of merges, splits and output indices (sequential),
/// 3. transformation of every planned unit into JPEG pages (parallel).
///
/// Entry points:
///
/// - [`process`](ProcessorConfig::process): async run over an ordered page list
/// - [`process_blocking`](ProcessorConfig::process_blocking): the same without a runtime
/// - [`process_directory`](ProcessorConfig::process_directory): collect a directory, then process
///
/// ## Builder Pattern
///
/// ```rust,no_run
/// # use mihiraki::prelude::*;
/// let config = ProcessorConfig::builder()
///     .reading_direction(Direction::Rtl)
///     .split_mode(SplitMode::Split)
///     .target_size(TargetSize::DEFAULT_DEVICE)
///     .build()
///     .expect("Invalid configuration");
/// ```
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(setter(into, strip_option), build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessorConfig {
    /// Reading direction of the book.
    ///
    /// Decides which page edges meet at a seam, the order of split halves and the
    /// Left/Right spread flags.
    #[builder(default = "Direction::Ltr")]
    pub reading_direction: Direction,

    /// Whether adjacent portrait pages may be merged into spreads.
    #[builder(default = "true")]
    pub merge_enabled: bool,

    /// Minimum share of seam rows carrying content, exclusive, in `[0, 1]`.
    #[builder(default = "0.15")]
    pub merge_pct_threshold: f64,

    /// Maximum RMS luminance difference across the seam, exclusive.
    #[builder(default = "0.25")]
    pub merge_contrast_threshold: f64,

    /// Margin cropping.
    #[builder(default = "CropMode::Default")]
    pub crop_mode: CropMode,

    /// Gamma applied before the contrast stretch. Values above 1 darken mid-tones.
    #[builder(default = "1.8")]
    pub gamma: f64,

    /// Output pages produced from a spread.
    #[builder(default = "SplitMode::Both")]
    pub split_mode: SplitMode,

    /// Let split halves overlap so each fills the target canvas.
    #[builder(default = "true")]
    pub split_overlap: bool,

    /// Letterbox canvas. `None` keeps the cropped size.
    #[builder(default)]
    pub target_size: Option<TargetSize>,

    /// JPEG quality, 1-100.
    #[builder(default = "60")]
    pub jpeg_quality: u8,

    /// Size of the worker pool. Defaults to the number of logical CPUs.
    #[builder(default)]
    pub worker_threads: Option<usize>,

    /// Create the output directory if it does not exist.
    #[builder(default = "true")]
    pub create_output_directory: bool,

    /// Custom regex for page numbers when collecting a directory.
    ///
    /// Example: `r"page[\s_-]*(\d+)"` to match "page_001", "page-01"
    #[builder(default)]
    pub page_name_regex_str: Option<String>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            reading_direction: Direction::Ltr,
            merge_enabled: true,
            merge_pct_threshold: 0.15,
            merge_contrast_threshold: 0.25,
            crop_mode: CropMode::Default,
            gamma: 1.8,
            split_mode: SplitMode::Both,
            split_overlap: true,
            target_size: None,
            jpeg_quality: 60,
            worker_threads: None,
            create_output_directory: true,
            page_name_regex_str: None,
        }
    }
}

impl ProcessorConfig {
    /// Creates a new builder for configuring `ProcessorConfig`.
    pub fn builder() -> ProcessorConfigBuilder {
        ProcessorConfigBuilder::default()
    }

    pub fn analyze_options(&self) -> AnalyzeOptions {
        AnalyzeOptions {
            direction: self.reading_direction,
            merge_enabled: self.merge_enabled,
            crop_mode: self.crop_mode,
        }
    }

    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            direction: self.reading_direction,
            merge_enabled: self.merge_enabled,
            merge_pct_threshold: self.merge_pct_threshold,
            merge_contrast_threshold: self.merge_contrast_threshold,
            split_mode: self.split_mode,
        }
    }

    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            direction: self.reading_direction,
            gamma: self.gamma,
            split_overlap: self.split_overlap,
            target_size: self.target_size,
            jpeg_quality: self.jpeg_quality,
        }
    }

    /// Validates a run before any page is decoded.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidConfig`] for an empty page list
    /// * [`Error::NotFound`] for missing pages, or a missing output directory that may
    ///   not be created
    /// * [`Error::Unsupported`] for pages that are not JPEG, PNG or WebP
    /// * [`Error::InvalidPath`] if the output path is not a directory
    pub fn preflight_check(&self, pages: &[PathBuf], output_dir: &Path) -> Result<&Self> {
        if pages.is_empty() {
            return Err(Error::InvalidConfig("No pages to process".to_string()));
        }
        for page in pages {
            if !page.is_file() {
                return Err(Error::NotFound(format!("Page image does not exist: {:?}", page)));
            }
            get_file_info(page)?;
        }

        if output_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("Output directory is required".to_string()));
        }
        if output_dir.exists() {
            if !output_dir.is_dir() {
                return Err(Error::InvalidPath(
                    output_dir.to_path_buf(),
                    "Output path is not a directory.".to_string(),
                ));
            }
        } else if !self.create_output_directory {
            return Err(Error::NotFound(format!(
                "Output directory does not exist: {:?}",
                output_dir
            )));
        }
        Ok(self)
    }

    fn worker_pool(&self) -> Result<ThreadPool> {
        let threads = self.worker_threads.unwrap_or_else(num_cpus::get).max(1);
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("mihiraki-worker-{}", i))
            .build()
            .map_err(Error::from)
    }

    /// Runs the analyzer stage alone.
    pub fn analyze(&self, pages: &[PathBuf]) -> Result<Vec<PairMetric>> {
        analyzer::analyze_pages(&self.worker_pool()?, pages, self.analyze_options())
    }

    /// Runs the planner on complete analyzer results.
    pub fn plan(&self, pages: &[PathBuf], metrics: &[PairMetric]) -> Result<Plan> {
        planner::plan_pages(pages, metrics, &self.plan_options())
    }

    /// Processes an ordered page list into `output_dir` on the calling thread.
    ///
    /// # Returns
    ///
    /// * `Ok(ProcessedComic)` - Written pages in reading order, plus the page and spread maps
    /// * `Err(Error)` - Invalid input, or the first failure of any job
    pub fn process_blocking(&self, pages: &[PathBuf], output_dir: &Path) -> Result<ProcessedComic> {
        self.preflight_check(pages, output_dir)?;
        if !output_dir.exists() {
            std::fs::create_dir_all(output_dir)?;
        }

        let pool = self.worker_pool()?;
        log::info!(
            "Processing {} pages into {:?} with {} workers",
            pages.len(),
            output_dir,
            pool.current_num_threads()
        );

        let metrics = analyzer::analyze_pages(&pool, pages, self.analyze_options())?;
        let Plan {
            units,
            page_map,
            spread_map,
        } = self.plan(pages, &metrics)?;
        let expected = units.iter().map(|u| u.output_count()).sum::<usize>();
        let images =
            transformer::transform_units(&pool, &units, output_dir, self.transform_options())?;

        self.finish(images, expected, page_map, spread_map)
    }

    /// Processes an ordered page list into `output_dir`.
    ///
    /// Both parallel stages run on the worker pool from a blocking task; the planner
    /// runs in between, once every analyzer job has completed.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use mihiraki::prelude::*;
    /// # #[tokio::main]
    /// # async fn main() -> mihiraki::error::Result<()> {
    /// let pages = vec![PathBuf::from("book/000.jpg"), PathBuf::from("book/001.jpg")];
    /// let config = ProcessorConfig::builder().build()?;
    /// let comic = config.process(pages, PathBuf::from("out")).await?;
    /// println!("{} pages written", comic.images.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn process(&self, pages: Vec<PathBuf>, output_dir: PathBuf) -> Result<ProcessedComic> {
        self.preflight_check(&pages, &output_dir)?;
        if !output_dir.exists() {
            fs::create_dir_all(&output_dir).await?;
        }

        let pool = Arc::new(self.worker_pool()?);
        let pages = Arc::new(pages);
        log::info!(
            "Processing {} pages into {:?} with {} workers",
            pages.len(),
            output_dir,
            pool.current_num_threads()
        );

        let metrics = {
            let pool = Arc::clone(&pool);
            let pages = Arc::clone(&pages);
            let options = self.analyze_options();
            spawn_blocking(move || analyzer::analyze_pages(&pool, &pages, options)).await??
        };

        let Plan {
            units,
            page_map,
            spread_map,
        } = self.plan(&pages, &metrics)?;
        let expected = units.iter().map(|u| u.output_count()).sum::<usize>();

        let images = {
            let options = self.transform_options();
            spawn_blocking(move || {
                transformer::transform_units(&pool, &units, &output_dir, options)
            })
            .await??
        };

        self.finish(images, expected, page_map, spread_map)
    }

    /// Collects the page images of `source_dir` in page order and processes them.
    pub async fn process_directory(
        &self,
        source_dir: &Path,
        output_dir: &Path,
    ) -> Result<ProcessedComic> {
        let regex = self
            .page_name_regex_str
            .as_deref()
            .map(Regex::new)
            .transpose()?;
        let pages = Collector::new(source_dir, regex.as_ref())
            .collect_pages()
            .await?;
        self.process(pages, output_dir.to_path_buf()).await
    }

    fn finish(
        &self,
        images: Vec<PathBuf>,
        expected: usize,
        page_map: PageMap,
        spread_map: SpreadMap,
    ) -> Result<ProcessedComic> {
        if images.len() != expected {
            return Err(Error::Invariant(format!(
                "{} images written for {} planned output pages",
                images.len(),
                expected
            )));
        }
        log::info!(
            "Wrote {} output pages, {} spread pages",
            images.len(),
            spread_map.len()
        );
        Ok(ProcessedComic {
            images,
            page_map,
            spread_map,
        })
    }
}

impl ProcessorConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(gamma) = self.gamma {
            if !(gamma.is_finite() && gamma > 0.0) {
                return Err(format!("Gamma must be a positive number, got {}", gamma));
            }
        }
        if let Some(pct) = self.merge_pct_threshold {
            if !(0.0..=1.0).contains(&pct) {
                return Err(format!(
                    "Merge percentage threshold must be between 0 and 1, got {}",
                    pct
                ));
            }
        }
        if let Some(contrast) = self.merge_contrast_threshold {
            if !(contrast.is_finite() && contrast >= 0.0) {
                return Err(format!(
                    "Merge contrast threshold must be a non-negative number, got {}",
                    contrast
                ));
            }
        }
        if let Some(quality) = self.jpeg_quality {
            if !(1..=100).contains(&quality) {
                return Err(format!("JPEG quality must be between 1 and 100, got {}", quality));
            }
        }
        if let Some(Some(size)) = self.target_size {
            if size.width == 0 || size.height == 0 {
                return Err(format!(
                    "Target size must be non-zero, got {}x{}",
                    size.width, size.height
                ));
            }
        }
        if let Some(Some(0)) = self.worker_threads {
            return Err("Worker thread count must be at least 1".to_string());
        }
        if let Some(Some(s)) = &self.page_name_regex_str {
            if Regex::new(s).is_err() {
                return Err(format!("Invalid page_name_regex: {}", s));
            }
        }
        Ok(())
    }
}
