//! Front matter and word counts of markdown files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use glob::Pattern;
use regex::Regex;
use serde_yaml::{Mapping, Value};

use crate::CheckError;

static FRONT_MATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?sm)^---\s*(.*?)---\s*$").expect("invalid front matter regex")
});

static MARKDOWN_FILE: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new("*.md").expect("invalid markdown glob"));

/// Front matter and size of one markdown file.
#[derive(Debug, Clone, PartialEq)]
pub struct DocMeta {
    /// Path of the markdown file.
    pub fname: PathBuf,
    /// Whitespace-separated words outside the front matter.
    pub n_words: usize,
    /// Parsed front matter; empty when the file has none.
    pub front_matter: Mapping,
}

impl DocMeta {
    /// Front matter value for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.front_matter.get(key)
    }
}

/// Read the front matter and word count of the markdown file at `path`.
///
/// The front matter is the first `---` delimited block.
pub fn get_meta(path: &Path) -> Result<DocMeta, CheckError> {
    let text = fs::read_to_string(path).map_err(|source| CheckError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let front_matter = match FRONT_MATTER.captures(&text) {
        Some(caps) => parse_front_matter(&caps[1], path)?,
        None => Mapping::new(),
    };
    let n_words = FRONT_MATTER
        .replace_all(&text, "")
        .split_whitespace()
        .count();

    Ok(DocMeta {
        fname: path.to_path_buf(),
        n_words,
        front_matter,
    })
}

fn parse_front_matter(yaml: &str, path: &Path) -> Result<Mapping, CheckError> {
    let value: Value = serde_yaml::from_str(yaml).map_err(|source| CheckError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(CheckError::NotAMapping(path.to_path_buf())),
    }
}

/// Metadata of every `*.md` file under `srcdir`, sorted by path.
///
/// Folders starting with `.` and files starting with `_` or `.` are skipped.
pub fn meta_list(srcdir: &Path) -> Result<Vec<DocMeta>, CheckError> {
    let mut files = Vec::new();
    collect_markdown(srcdir, &mut files)?;
    files.sort();
    tracing::debug!(dir = %srcdir.display(), files = files.len(), "Collected markdown files");
    files.iter().map(|path| get_meta(path)).collect()
}

fn collect_markdown(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), CheckError> {
    let entries = fs::read_dir(dir).map_err(|source| CheckError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries.filter_map(Result::ok) {
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            if !name.starts_with('.') {
                collect_markdown(&path, files)?;
            }
        } else if !name.starts_with(['_', '.']) && MARKDOWN_FILE.matches(&name) {
            files.push(path);
        }
    }
    Ok(())
}
