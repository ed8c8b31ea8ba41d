//! Notebook preprocessing pipeline for MDX export.
//!
//! A [`Pipeline`] is an ordered list of [`Preprocessor`] stages. Each stage
//! rewrites the notebook in place: cell sources, outputs and metadata, or the
//! cell list itself. Stages share nothing but the notebook and a [`Resources`]
//! side channel (e.g. extracted images and the file map pointing at where they
//! were saved).
//!
//! # Cell-meta comments
//!
//! Code cells can configure later stages with line comments of the form
//! `#meta:key=value` (alias `#cell_meta:key=value`). [`InjectMeta`] collects
//! them into the cell's metadata record, [`CleanMagics`] removes them from the
//! exported source.
//!
//! | comment                           | effect                                   |
//! |-----------------------------------|------------------------------------------|
//! | `#meta:tag=remove_cell` / `hide`  | drop the cell                            |
//! | `#meta:tag=remove_output`         | drop the outputs                         |
//! | `#meta:tag=remove_input`          | hide the source                          |
//! | `#meta:tag=black`                 | format the source with the formatter     |
//! | `#meta:show_steps=start,train`    | keep only these Metaflow steps in logs   |
//! | `#meta:filter_words=Warn,Index`   | drop stdout lines containing these words |
//!
//! A trailing `#meta_hide_line` comment hides a single source line.
//!
//! # Example
//!
//! ```
//! use nbmdx_notebook::{Cell, Notebook, Output};
//! use nbmdx_pipeline::{CleanMagics, InjectMeta, Pipeline, Resources, UpdateTags};
//!
//! let pipeline = Pipeline::new()
//!     .with_stage(InjectMeta)
//!     .with_stage(CleanMagics)
//!     .with_stage(UpdateTags);
//!
//! let mut nb = Notebook::new(vec![Cell::code("#meta:tag=black\nx = 1")]);
//! pipeline.run(&mut nb, &mut Resources::default()).unwrap();
//!
//! assert_eq!(nb.cells[0].source, "x = 1");
//! assert_eq!(nb.cells[0].metadata.tags, vec!["black".to_owned()]);
//! ```

mod html;
mod pipeline;
mod resources;
mod stages;

pub use html::is_dataframe;
pub use pipeline::{Pipeline, PipelineSettings, Preprocessor};
pub use resources::{ResourceMetadata, Resources};
pub use stages::{
    AUTOGENERATED_WARNING, BashIdentify, Black, CleanFlags, CleanMagics, CleanShowDoc,
    CodeFormatter, CommandFormatter, ExtractOutputs, FilterOutput, HideInputLines, HtmlEscape,
    ImagePath, ImageSave, InjectMeta, InsertWarning, MetaflowSelectSteps, MetaflowTruncate,
    RmEmptyCode, StripAnsi, TagRemove, UpdateTags, WriteTitle,
};

use std::path::PathBuf;

/// Error raised by a pipeline stage.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Writing a side-channel file failed.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The code formatter rejected a cell.
    #[error("Formatting cell {index} failed: {message}")]
    Format {
        /// Index of the cell in the notebook.
        index: usize,
        /// Formatter diagnostics.
        message: String,
    },
    /// A pattern built from configuration did not compile.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
