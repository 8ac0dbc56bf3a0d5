//! Source page discovery.
//!
//! Collects the page images of a book stored as a plain directory and orders them by
//! the page number found in each file name, the way scanned comics are usually named
//! (`001.jpg`, `page_2.png`, `p10.webp`).

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;
use tokio::fs::read_dir;

use crate::error::{Error, Result};
use crate::types::get_file_info;

lazy_static! {
    /// Default Regex pattern for extracting numeric values from page filenames.
    /// Matches "001", "1", "1.5" etc.
    pub static ref DEFAULT_NUMBER_REGEX: Regex = Regex::new(r"\d+\.?\d*").unwrap();
}

/// Collects and orders the page images of one book directory.
#[derive(Debug)]
pub struct Collector<'a> {
    base_directory: &'a Path,
    page_name_regex: Option<&'a Regex>, // Custom regex for page name parsing
}

impl<'a> Collector<'a> {
    /// Creates a new Collector for the specified directory.
    ///
    /// # Arguments
    ///
    /// * `base_directory` - Directory holding the page images
    /// * `page_name_regex` - Optional custom regex for parsing page numbers; the first
    ///   capture group is used if present, the whole match otherwise
    pub fn new(base_directory: &'a Path, page_name_regex: Option<&'a Regex>) -> Self {
        Self {
            base_directory,
            page_name_regex,
        }
    }

    /// Collects the supported page images of the directory in page order.
    ///
    /// Hidden files, sub-directories and files with unsupported extensions are skipped.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<PathBuf>)` - Page paths sorted by page number
    /// * `Err(Error)` - The directory is missing, unreadable or holds no pages
    pub async fn collect_pages(&self) -> Result<Vec<PathBuf>> {
        if !self.base_directory.exists() {
            return Err(Error::NotFound(format!(
                "Source directory does not exist: {:?}",
                self.base_directory
            )));
        }
        if !self.base_directory.is_dir() {
            return Err(Error::InvalidPath(
                self.base_directory.to_path_buf(),
                "Source path is not a directory.".to_string(),
            ));
        }

        let mut pages = Vec::new();
        let mut entries = read_dir(self.base_directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_hidden_file(&path) || entry.file_type().await?.is_dir() {
                continue;
            }
            if get_file_info(&path).is_err() {
                log::debug!("Skipping non-image file {:?}", path);
                continue;
            }
            pages.push(path);
        }

        if pages.is_empty() {
            return Err(Error::NotFound(format!(
                "No page images found in {:?}",
                self.base_directory
            )));
        }

        pages.par_sort_by(|a, b| self.sort_name_by_number(a, b));
        log::debug!(
            "Collected {} pages from {:?}",
            pages.len(),
            self.base_directory
        );
        Ok(pages)
    }

    /// Extracts the page number of a path using the configured regex or the default.
    ///
    /// The last match in the file name wins, as it is usually the page counter.
    pub fn regex_parser(&self, path: &Path) -> Option<f64> {
        let file_name = path.file_name()?.to_str()?;
        let active_regex = self.page_name_regex.unwrap_or(&DEFAULT_NUMBER_REGEX);

        active_regex
            .captures_iter(file_name)
            .last()
            .and_then(|cap| cap.get(1).or_else(|| cap.get(0)))
            .and_then(|m| m.as_str().parse::<f64>().ok())
    }

    /// Orders paths by page number, falling back to the file name when numbers tie
    /// or are missing.
    pub fn sort_name_by_number(&self, a: &Path, b: &Path) -> Ordering {
        let an = self.regex_parser(a);
        let bn = self.regex_parser(b);

        match an.partial_cmp(&bn) {
            Some(Ordering::Equal) | None => a.file_name().cmp(&b.file_name()),
            Some(order) => order,
        }
    }

    /// Sorts paths by numeric values in their file name using the default regex.
    pub fn sort_name_by_number_default(a: &Path, b: &Path) -> Ordering {
        Collector::new(Path::new(""), None).sort_name_by_number(a, b)
    }
}

/// Checks if a file name starts with a dot.
pub fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
