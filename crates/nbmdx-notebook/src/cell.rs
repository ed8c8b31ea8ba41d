//! Notebook cells and their metadata.

use std::collections::BTreeMap;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::multiline;
use crate::output::Output;

/// Kind of a notebook cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    /// Executable code with outputs.
    Code,
    /// Markdown prose.
    Markdown,
    /// Raw content passed through to the exporter untouched.
    Raw,
}

/// Per-cell state that lives only for the duration of one conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transient {
    /// Hide the cell's input when exporting.
    pub remove_source: bool,
}

/// A notebook cell.
///
/// Code-only fields (`outputs`, `execution_count`) are always present in
/// memory and only written for code cells.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Cell {
    /// Cell kind.
    pub cell_type: CellType,
    /// Cell id (nbformat 4.5+).
    #[serde(default)]
    pub id: Option<String>,
    /// Cell metadata.
    #[serde(default)]
    pub metadata: CellMetadata,
    /// Cell source text.
    #[serde(default, deserialize_with = "multiline::deserialize")]
    pub source: String,
    /// Outputs of a code cell.
    #[serde(default)]
    pub outputs: Vec<Output>,
    /// Execution counter of a code cell.
    #[serde(default)]
    pub execution_count: Option<u32>,
    /// Inline attachments of markdown and raw cells.
    #[serde(default)]
    pub attachments: Option<Value>,
    /// Conversion-time state, never serialized.
    #[serde(skip)]
    pub transient: Transient,
}

impl Cell {
    fn with_type(cell_type: CellType, source: impl Into<String>) -> Self {
        Self {
            cell_type,
            id: None,
            metadata: CellMetadata::default(),
            source: source.into(),
            outputs: Vec::new(),
            execution_count: None,
            attachments: None,
            transient: Transient::default(),
        }
    }

    /// Create a code cell without outputs.
    pub fn code(source: impl Into<String>) -> Self {
        Self::with_type(CellType::Code, source)
    }

    /// Create a markdown cell.
    pub fn markdown(source: impl Into<String>) -> Self {
        Self::with_type(CellType::Markdown, source)
    }

    /// Create a raw cell.
    pub fn raw(source: impl Into<String>) -> Self {
        Self::with_type(CellType::Raw, source)
    }

    /// Set the cell id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Append an output.
    #[must_use]
    pub fn with_output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }

    /// Whether this is a code cell.
    pub fn is_code(&self) -> bool {
        self.cell_type == CellType::Code
    }

    /// Whether this is a markdown cell.
    pub fn is_markdown(&self) -> bool {
        self.cell_type == CellType::Markdown
    }

    /// Whether this is a raw cell.
    pub fn is_raw(&self) -> bool {
        self.cell_type == CellType::Raw
    }

    /// Look up a cell-meta record entry, falling back to `alias`.
    ///
    /// Keys come in singular and plural spellings (`tag` / `tags`,
    /// `show_step` / `show_steps`), so callers pass both.
    pub fn cell_meta(&self, key: &str, alias: &str) -> Option<&str> {
        let record = &self.metadata.cell_meta;
        record
            .get(key)
            .or_else(|| record.get(alias))
            .map(String::as_str)
    }

    /// Whether the cell carries any of `tags`.
    pub fn has_any_tag<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        self.metadata
            .tags
            .iter()
            .any(|t| tags.iter().any(|wanted| wanted.as_ref() == t))
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Cell", 7)?;
        state.serialize_field("cell_type", &self.cell_type)?;
        if let Some(id) = &self.id {
            state.serialize_field("id", id)?;
        }
        state.serialize_field("metadata", &self.metadata)?;
        state.serialize_field("source", &self.source)?;
        if self.is_code() {
            state.serialize_field("execution_count", &self.execution_count)?;
            state.serialize_field("outputs", &self.outputs)?;
        } else if let Some(attachments) = &self.attachments {
            state.serialize_field("attachments", attachments)?;
        }
        state.end()
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

/// Cell metadata.
///
/// Typed fields are the ones pipeline stages read or write; everything else
/// lands in [`extra`](Self::extra).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellMetadata {
    /// Cell tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Key/value record injected from `#meta:key=value` comments.
    #[serde(
        rename = "nbmdx",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub cell_meta: BTreeMap<String, String>,
    /// Info string for the exported code fence (overrides the notebook language).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magics_language: Option<String>,
    /// The cell writes a script file (`%%writefile`).
    #[serde(default, skip_serializing_if = "is_false")]
    pub script: bool,
    /// Extension of the written script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_ext: Option<String>,
    /// Name of the written script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// An output of this cell carries escaped HTML.
    #[serde(default, skip_serializing_if = "is_false")]
    pub html_output: bool,
    /// Escaped HTML output should be centered (it is not a dataframe).
    #[serde(default, skip_serializing_if = "is_false")]
    pub html_center: bool,
    /// Target mime type of a raw cell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Target mime type as written by the Jupyter raw-cell toolbar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_mimetype: Option<String>,
    /// Remaining metadata keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CellMetadata {
    /// Target mime type of a raw cell, preferring `format` over `raw_mimetype`.
    pub fn raw_format(&self) -> Option<&str> {
        self.format.as_deref().or(self.raw_mimetype.as_deref())
    }
}
