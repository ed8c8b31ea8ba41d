//! Notebook discovery by filesystem walking.

use std::fs;
use std::path::{Path, PathBuf};

use nbmdx_notebook::is_notebook_path;

use crate::BuildError;

/// Notebooks whose name starts with this are scratch files and never built.
const SCRATCH_PREFIX: &str = "Untitled";

/// Find the notebooks to build under `basedir`, sorted by path.
///
/// A notebook path yields itself. Directories are walked, descending into
/// subdirectories only when `recursive` is set. Hidden entries (including
/// `.ipynb_checkpoints`), `_`-prefixed notebooks and `Untitled*` notebooks
/// are skipped.
pub fn discover_notebooks(basedir: &Path, recursive: bool) -> Result<Vec<PathBuf>, BuildError> {
    if basedir.is_file() {
        if !is_notebook_path(basedir) {
            return Err(BuildError::NotANotebook(basedir.to_path_buf()));
        }
        return Ok(vec![basedir.to_path_buf()]);
    }
    if !basedir.is_dir() {
        return Err(BuildError::NotFound(basedir.to_path_buf()));
    }

    let mut notebooks = Vec::new();
    scan_directory(basedir, recursive, &mut notebooks)?;
    notebooks.sort();
    tracing::debug!(dir = %basedir.display(), count = notebooks.len(), "Discovered notebooks");
    Ok(notebooks)
}

fn scan_directory(dir: &Path, recursive: bool, notebooks: &mut Vec<PathBuf>) -> Result<(), BuildError> {
    let entries = fs::read_dir(dir).map_err(|source| BuildError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries.filter_map(Result::ok) {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            if recursive {
                scan_directory(&path, recursive, notebooks)?;
            }
        } else if is_notebook_path(&path)
            && !name.starts_with('_')
            && !name.starts_with(SCRATCH_PREFIX)
        {
            notebooks.push(path);
        }
    }
    Ok(())
}
