//! Custom error types and result handling for Mihiraki operations.
//!
//! All operations return a [`Result<T>`] which is a type alias for `std::result::Result<T, Error>`.
//! Any error raised inside a pipeline job is fatal for the whole run: output indices are
//! assigned up front, so a missing unit would leave a hole in the output sequence.
//!
use std::path::PathBuf;

/// Type alias for Results with Mihiraki errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all Mihiraki operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O errors from the standard library
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Regular expression parsing errors
    #[error(transparent)]
    Regex(#[from] regex::Error),
    /// Image decoding and encoding errors
    #[error(transparent)]
    Image(#[from] image::ImageError),
    /// Async task join errors
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    /// Worker pool construction errors
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    ConfigBuilder(#[from] crate::processor::ProcessorConfigBuilderError),
    /// Rejected configuration or input set; the run never starts
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Error for invalid file or directory paths
    #[error("The given path '{0:?}' is invalid: {1}")]
    InvalidPath(PathBuf, String),
    /// Error for resources that couldn't be found (e.g., source directory, page image)
    #[error("Not found: {0}")]
    NotFound(String),
    /// Error for unsupported operations or formats (e.g., unknown image extension)
    #[error("Unsupported: {0}")]
    Unsupported(String),
    /// Broken internal invariant between planning and transformation
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
    /// JPEG encoding errors
    #[error(transparent)]
    JpegEncoding(#[from] jpeg_encoder::EncodingError),
    /// Error for failed asynchronous tasks
    #[error("Asynchronous task failed: {0}")]
    AsyncTaskError(String),
    /// Other errors that don't fit into specific categories
    #[error("Other error: {0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.to_string())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}
