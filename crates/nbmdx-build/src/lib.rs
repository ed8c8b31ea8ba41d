//! Notebook discovery and incremental conversion for nbmdx.
//!
//! [`build_all`] finds the notebooks under a directory, skips those whose
//! generated file is newer than the notebook, and converts the rest on a
//! rayon thread pool. Each notebook runs through a shared, read-only
//! [`NotebookConverter`]; conversions never share mutable state.

mod build;
mod convert;
mod discover;

use std::path::PathBuf;

use nbmdx_notebook::NotebookError;
use nbmdx_pipeline::PipelineError;

pub use build::{BuildOptions, BuildReport, build_all, needs_rebuild};
pub use convert::{NotebookConverter, nb2md};
pub use discover::discover_notebooks;

/// Error raised while discovering or converting notebooks.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The path does not name an `.ipynb` file.
    #[error("{} is not a notebook.", .0.display())]
    NotANotebook(PathBuf),
    /// The notebook or source directory does not exist.
    #[error("file {} not found.", .0.display())]
    NotFound(PathBuf),
    /// Reading or parsing the notebook failed.
    #[error("{0}")]
    Notebook(#[from] NotebookError),
    /// A pipeline stage failed.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),
    /// Reading a directory or writing the generated file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File or directory path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The worker pool could not be created.
    #[error("Failed to create thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
