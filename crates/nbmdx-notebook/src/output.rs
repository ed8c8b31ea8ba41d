//! Code cell outputs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::multiline;

/// Mime type to payload map of a rich output.
///
/// Text payloads may be stored as a list of lines; [`text`](Self::text)
/// joins them. JSON payloads (e.g. `application/json`) are kept as values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MimeBundle(pub Map<String, Value>);

impl MimeBundle {
    /// Text payload for `mime`, if present and textual.
    pub fn text(&self, mime: &str) -> Option<String> {
        match self.0.get(mime)? {
            Value::String(s) => Some(s.clone()),
            Value::Array(lines) => Some(lines.iter().filter_map(Value::as_str).collect()),
            _ => None,
        }
    }

    /// Replace the payload for `mime` with `text`.
    pub fn set_text(&mut self, mime: &str, text: String) {
        self.0.insert(mime.to_owned(), Value::String(text));
    }

    /// Whether a payload exists for `mime`.
    pub fn contains(&self, mime: &str) -> bool {
        self.0.contains_key(mime)
    }

    /// Iterate over the mime types present.
    pub fn mime_types(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Metadata attached to a rich output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputMetadata {
    /// Extracted file name per mime type.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filenames: BTreeMap<String, String>,
    /// Output-level tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Remaining metadata keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A code cell output, tagged by `output_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    /// Text written to stdout or stderr.
    Stream {
        /// Stream name (`stdout` or `stderr`).
        name: String,
        /// Stream text.
        #[serde(deserialize_with = "multiline::deserialize")]
        text: String,
    },
    /// Rich display output.
    DisplayData {
        /// Payload per mime type.
        #[serde(default)]
        data: MimeBundle,
        /// Output metadata.
        #[serde(default)]
        metadata: OutputMetadata,
    },
    /// Value of the last expression of a cell.
    ExecuteResult {
        /// Execution counter.
        #[serde(default)]
        execution_count: Option<u32>,
        /// Payload per mime type.
        #[serde(default)]
        data: MimeBundle,
        /// Output metadata.
        #[serde(default)]
        metadata: OutputMetadata,
    },
    /// Raised exception.
    Error {
        /// Exception name.
        ename: String,
        /// Exception value.
        evalue: String,
        /// Formatted traceback lines (may contain ANSI escapes).
        #[serde(default)]
        traceback: Vec<String>,
    },
}

impl Output {
    /// Create a stream output.
    pub fn stream(name: &str, text: impl Into<String>) -> Self {
        Self::Stream {
            name: name.to_owned(),
            text: text.into(),
        }
    }

    /// Create a display output with a single payload.
    pub fn display(mime: &str, payload: impl Into<String>) -> Self {
        let mut data = MimeBundle::default();
        data.set_text(mime, payload.into());
        Self::DisplayData {
            data,
            metadata: OutputMetadata::default(),
        }
    }

    /// Mutable text of a stream output named `name`.
    pub fn stream_text_mut(&mut self, name: &str) -> Option<&mut String> {
        match self {
            Self::Stream { name: n, text } if n == name => Some(text),
            _ => None,
        }
    }

    /// Payloads of a rich output.
    pub fn data(&self) -> Option<&MimeBundle> {
        match self {
            Self::DisplayData { data, .. } | Self::ExecuteResult { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Mutable payloads of a rich output.
    pub fn data_mut(&mut self) -> Option<&mut MimeBundle> {
        match self {
            Self::DisplayData { data, .. } | Self::ExecuteResult { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Metadata of a rich output.
    pub fn metadata(&self) -> Option<&OutputMetadata> {
        match self {
            Self::DisplayData { metadata, .. } | Self::ExecuteResult { metadata, .. } => {
                Some(metadata)
            }
            _ => None,
        }
    }

    /// Mutable metadata of a rich output.
    pub fn metadata_mut(&mut self) -> Option<&mut OutputMetadata> {
        match self {
            Self::DisplayData { metadata, .. } | Self::ExecuteResult { metadata, .. } => {
                Some(metadata)
            }
            _ => None,
        }
    }
}
