//! Jupyter notebook data model for nbmdx.
//!
//! Reads and writes nbformat v4 documents with serde. Only the fields the
//! preprocessing pipeline acts on are typed; everything else is carried in
//! flattened maps so that a read/write round trip keeps unknown keys.
//!
//! # Example
//!
//! ```
//! use nbmdx_notebook::{CellType, Notebook};
//!
//! let nb = Notebook::from_json(r##"{
//!     "cells": [{"cell_type": "markdown", "metadata": {}, "source": ["# Title\n", "body"]}],
//!     "metadata": {},
//!     "nbformat": 4,
//!     "nbformat_minor": 5
//! }"##).unwrap();
//!
//! assert_eq!(nb.cells[0].cell_type, CellType::Markdown);
//! assert_eq!(nb.cells[0].source, "# Title\nbody");
//! ```

mod cell;
mod multiline;
mod output;
pub mod text;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use cell::{Cell, CellMetadata, CellType, Transient};
pub use output::{MimeBundle, Output, OutputMetadata};

/// Language used when the notebook metadata names none.
const DEFAULT_LANGUAGE: &str = "python";

/// Error returned when reading or writing a notebook.
#[derive(Debug, thiserror::Error)]
pub enum NotebookError {
    /// I/O error while reading or writing the notebook file.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Notebook path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not valid nbformat JSON.
    #[error("Invalid notebook JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The path does not name an `.ipynb` file.
    #[error("{} is not a notebook", .0.display())]
    NotANotebook(PathBuf),
}

/// A Jupyter notebook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    /// Ordered cell list.
    pub cells: Vec<Cell>,
    /// Notebook-level metadata.
    #[serde(default)]
    pub metadata: NotebookMetadata,
    /// Major nbformat version.
    #[serde(default = "default_nbformat")]
    pub nbformat: u32,
    /// Minor nbformat version.
    #[serde(default)]
    pub nbformat_minor: u32,
}

fn default_nbformat() -> u32 {
    4
}

/// Notebook-level metadata.
///
/// Only the language hints are read; all keys are preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotebookMetadata {
    /// Kernel description (`name`, `language`, `display_name`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernelspec: Option<Value>,
    /// Language description written by the kernel (`name`, `version`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_info: Option<Value>,
    /// Remaining metadata keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NotebookMetadata {
    /// Programming language of the notebook's code cells.
    ///
    /// Looks at `kernelspec.language`, then `language_info.name`, and falls
    /// back to `python`.
    pub fn language(&self) -> &str {
        fn from<'a>(value: &'a Option<Value>, key: &str) -> Option<&'a str> {
            value
                .as_ref()
                .and_then(|v| v.get(key))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        }
        from(&self.kernelspec, "language")
            .or_else(|| from(&self.language_info, "name"))
            .unwrap_or(DEFAULT_LANGUAGE)
    }
}

impl Notebook {
    /// Create an empty nbformat 4.5 notebook.
    #[must_use]
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            metadata: NotebookMetadata::default(),
            nbformat: 4,
            nbformat_minor: 5,
        }
    }

    /// Parse a notebook from nbformat JSON.
    pub fn from_json(json: &str) -> Result<Self, NotebookError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a notebook from an `.ipynb` file.
    pub fn from_path(path: &Path) -> Result<Self, NotebookError> {
        if !is_notebook_path(path) {
            return Err(NotebookError::NotANotebook(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| NotebookError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Serialize the notebook to pretty-printed nbformat JSON.
    pub fn to_json(&self) -> Result<String, NotebookError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Write the notebook to `path`.
    pub fn write(&self, path: &Path) -> Result<(), NotebookError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| NotebookError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Check whether `path` has the `.ipynb` extension.
pub fn is_notebook_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "ipynb")
}
