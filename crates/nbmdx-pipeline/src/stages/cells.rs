//! Stages that insert, remove or convert whole cells.

use std::sync::LazyLock;

use nbmdx_notebook::{Cell, Notebook, Output};
use regex::Regex;
use uuid::Uuid;

use crate::{PipelineError, Preprocessor, Resources};

/// Banner telling readers of the generated file to edit the notebook instead.
pub const AUTOGENERATED_WARNING: &str = "{/* WARNING: THIS FILE WAS AUTOGENERATED! DO NOT EDIT! \
Instead, edit the notebook w/the location & name as this file.*/}";

/// Notebook front-end keys that describe how outputs were displayed.
const OUTPUT_DISPLAY_KEYS: [&str; 2] = ["collapsed", "scrolled"];

static SHOWDOC_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^ShowDoc").expect("invalid ShowDoc regex"));

static HTML_REMOVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<HTMLRemove>.*</HTMLRemove>").expect("invalid HTMLRemove regex")
});

/// Insert the autogenerated-file banner as a markdown cell after the first cell.
///
/// The first cell usually holds front matter, which must stay on top.
#[derive(Debug, Clone)]
pub struct InsertWarning {
    banner: String,
}

impl InsertWarning {
    /// Insert `banner` instead of the default warning.
    pub fn new(banner: impl Into<String>) -> Self {
        Self {
            banner: banner.into(),
        }
    }
}

impl Default for InsertWarning {
    fn default() -> Self {
        Self::new(AUTOGENERATED_WARNING)
    }
}

impl Preprocessor for InsertWarning {
    fn name(&self) -> &'static str {
        "InsertWarning"
    }

    fn preprocess(&self, nb: &mut Notebook, _resources: &mut Resources) -> Result<(), PipelineError> {
        let cell = Cell::markdown(self.banner.as_str()).with_id(Uuid::new_v4().simple().to_string());
        let index = nb.cells.len().min(1);
        nb.cells.insert(index, cell);
        Ok(())
    }
}

/// Remove cells, outputs or inputs based on cell and output tags.
///
/// All tag lists start empty; [`Pipeline::mdx`](crate::Pipeline::mdx) fills
/// them from [`PipelineSettings`](crate::PipelineSettings).
#[derive(Debug, Clone, Default)]
pub struct TagRemove {
    remove_cell_tags: Vec<String>,
    remove_all_outputs_tags: Vec<String>,
    remove_input_tags: Vec<String>,
    remove_single_output_tags: Vec<String>,
}

impl TagRemove {
    /// Create a stage that removes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags that remove the whole cell.
    #[must_use]
    pub fn with_remove_cell_tags(mut self, tags: Vec<String>) -> Self {
        self.remove_cell_tags = tags;
        self
    }

    /// Tags that clear every output of a code cell.
    #[must_use]
    pub fn with_remove_all_outputs_tags(mut self, tags: Vec<String>) -> Self {
        self.remove_all_outputs_tags = tags;
        self
    }

    /// Tags that hide the cell source in the export.
    #[must_use]
    pub fn with_remove_input_tags(mut self, tags: Vec<String>) -> Self {
        self.remove_input_tags = tags;
        self
    }

    /// Output metadata tags that remove that single output.
    #[must_use]
    pub fn with_remove_single_output_tags(mut self, tags: Vec<String>) -> Self {
        self.remove_single_output_tags = tags;
        self
    }

    fn keep_output(&self, output: &Output) -> bool {
        output.metadata().is_none_or(|meta| {
            !meta
                .tags
                .iter()
                .any(|tag| self.remove_single_output_tags.contains(tag))
        })
    }
}

impl Preprocessor for TagRemove {
    fn name(&self) -> &'static str {
        "TagRemove"
    }

    fn preprocess(&self, nb: &mut Notebook, resources: &mut Resources) -> Result<(), PipelineError> {
        let before = nb.cells.len();
        nb.cells.retain(|cell| !cell.has_any_tag(&self.remove_cell_tags));
        if nb.cells.len() < before {
            tracing::debug!(removed = before - nb.cells.len(), "Removed tagged cells");
        }

        for (index, cell) in nb.cells.iter_mut().enumerate() {
            self.preprocess_cell(cell, resources, index)?;
        }
        Ok(())
    }

    fn preprocess_cell(
        &self,
        cell: &mut Cell,
        _resources: &mut Resources,
        _index: usize,
    ) -> Result<(), PipelineError> {
        if cell.is_code() && cell.has_any_tag(&self.remove_all_outputs_tags) {
            cell.outputs.clear();
            cell.execution_count = None;
            for key in OUTPUT_DISPLAY_KEYS {
                cell.metadata.extra.remove(key);
            }
        }
        if cell.has_any_tag(&self.remove_input_tags) {
            cell.transient.remove_source = true;
        }
        if !self.remove_single_output_tags.is_empty() {
            cell.outputs.retain(|output| self.keep_output(output));
        }
        Ok(())
    }
}

/// Replace `ShowDoc(...)` cells by a raw cell holding their rendered HTML.
///
/// Only cells with exactly one HTML payload are converted. Every
/// `<HTMLRemove>` section is cut from the HTML first.
pub struct CleanShowDoc;

impl Preprocessor for CleanShowDoc {
    fn name(&self) -> &'static str {
        "CleanShowDoc"
    }

    fn preprocess_cell(
        &self,
        cell: &mut Cell,
        _resources: &mut Resources,
        _index: usize,
    ) -> Result<(), PipelineError> {
        if !cell.is_code() || !SHOWDOC_CALL.is_match(&cell.source) {
            return Ok(());
        }
        let html: Vec<String> = cell
            .outputs
            .iter()
            .filter_map(Output::data)
            .filter_map(|data| data.text("text/html"))
            .collect();
        let [html] = html.as_slice() else {
            return Ok(());
        };

        let mut raw = Cell::raw(HTML_REMOVE.replace_all(html, ""));
        raw.id = cell.id.take();
        raw.metadata = std::mem::take(&mut cell.metadata);
        *cell = raw;
        Ok(())
    }
}

/// Remove code cells whose source is blank.
pub struct RmEmptyCode;

impl Preprocessor for RmEmptyCode {
    fn name(&self) -> &'static str {
        "RmEmptyCode"
    }

    fn preprocess(&self, nb: &mut Notebook, _resources: &mut Resources) -> Result<(), PipelineError> {
        nb.cells
            .retain(|cell| !(cell.is_code() && cell.source.trim().is_empty()));
        Ok(())
    }
}
