//! Front matter extraction and quality checks for generated documentation.
//!
//! Generated markdown files start with a YAML front matter block:
//!
//! ```text
//! ---
//! title: Plotting
//! description: How to render matplotlib figures in the docs.
//! ---
//! ```
//!
//! [`meta_list`] collects the front matter and word count of every markdown
//! file under a directory; [`run_check`] reports the files failing a [`Check`].
//!
//! # Example
//!
//! ```
//! use nbmdx_frontmatter::{Check, run_check};
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::write(dir.path().join("guide.md"), "---\ntitle: Guide\n---\nShort.").unwrap();
//!
//! let err = run_check(Check::Description, dir.path()).unwrap_err();
//! assert!(err.to_string().contains("guide.md"));
//! ```

mod check;
mod meta;

use std::path::PathBuf;

pub use check::{Check, run_check};
pub use meta::{DocMeta, get_meta, meta_list};

/// Error returned by front matter extraction and checks.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// Some files failed the check.
    #[error("The following files {message}:\n\t{}", format_files(files))]
    Failed {
        /// What the files have in common.
        message: String,
        /// Offending files.
        files: Vec<PathBuf>,
    },
    /// Reading a file or directory failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File or directory path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The front matter is not valid YAML.
    #[error("Invalid front matter in {}: {source}", path.display())]
    Yaml {
        /// Markdown file path.
        path: PathBuf,
        /// Underlying error.
        source: serde_yaml::Error,
    },
    /// The front matter is valid YAML but not a mapping.
    #[error("Front matter in {} is not a mapping", .0.display())]
    NotAMapping(PathBuf),
}

fn format_files(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|f| f.display().to_string())
        .collect::<Vec<_>>()
        .join("\n\t")
}
