//! Side channel shared by the stages of one pipeline run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Key prefix for extracted output files.
const DEFAULT_UNIQUE_KEY: &str = "output";

/// Where the notebook being converted lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceMetadata {
    /// Notebook file stem (e.g. `matplotlib` for `matplotlib.ipynb`).
    pub name: Option<String>,
    /// Directory containing the notebook.
    pub path: PathBuf,
}

/// Cross-cell state for a single notebook conversion.
///
/// Created fresh per notebook; never shared between notebooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resources {
    /// Notebook location.
    pub metadata: ResourceMetadata,
    /// Extracted output files by name (see [`ExtractOutputs`](crate::ExtractOutputs)).
    pub outputs: BTreeMap<String, Vec<u8>>,
    /// Extracted file name to saved path, relative to the notebook directory
    /// (see [`ImageSave`](crate::ImageSave)).
    pub fmap: BTreeMap<String, String>,
    /// Prefix of extracted output file names.
    pub unique_key: String,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            metadata: ResourceMetadata::default(),
            outputs: BTreeMap::new(),
            fmap: BTreeMap::new(),
            unique_key: DEFAULT_UNIQUE_KEY.to_owned(),
        }
    }
}

impl Resources {
    /// Resources for the notebook at `path`.
    pub fn for_notebook(path: &Path) -> Self {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
        let dir = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self {
            metadata: ResourceMetadata { name, path: dir },
            ..Self::default()
        }
    }
}
