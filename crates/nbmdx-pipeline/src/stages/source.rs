//! Stages that rewrite code cell sources: magics, shell escapes, flags and
//! hidden lines.

use std::sync::LazyLock;

use nbmdx_notebook::Cell;
use regex::Regex;

use super::{META_COMMENT, remove_matches};
use crate::{PipelineError, Preprocessor, Resources};

static WRITEFILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A[\s\S]*%%writefile\s(\S+)\n").expect("invalid writefile regex")
});

static MAGIC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?m)(^\s*(%%|%).+?[\n\r])|({META_COMMENT})"))
        .expect("invalid magic regex")
});

static SHELL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*!").expect("invalid shell regex"));

/// Marker comment that hides a single source line.
const HIDE_LINE_MARKER: &str = "#meta_hide_line";

/// Title the code fence of `%%writefile <name>` cells with the file name.
///
/// Sets `magics_language` to `{ext} title="{name}"` and records the script
/// fields; the cell's outputs ("Writing name") are dropped.
pub struct WriteTitle;

impl Preprocessor for WriteTitle {
    fn name(&self) -> &'static str {
        "WriteTitle"
    }

    fn preprocess_cell(
        &self,
        cell: &mut Cell,
        _resources: &mut Resources,
        _index: usize,
    ) -> Result<(), PipelineError> {
        let Some(caps) = WRITEFILE_PATTERN.captures(&cell.source) else {
            return Ok(());
        };
        let filename = caps[1].to_owned();
        let ext = filename
            .rsplit_once('.')
            .map_or(filename.as_str(), |(_, ext)| ext)
            .to_owned();

        let meta = &mut cell.metadata;
        meta.magics_language = Some(format!("{ext} title=\"{filename}\""));
        meta.script = true;
        meta.file_ext = Some(ext);
        meta.filename = Some(filename);
        cell.outputs.clear();
        Ok(())
    }
}

/// Remove `%` / `%%` magic lines and `#meta:` comments from code cells.
pub struct CleanMagics;

impl Preprocessor for CleanMagics {
    fn name(&self) -> &'static str {
        "CleanMagics"
    }

    fn preprocess_cell(
        &self,
        cell: &mut Cell,
        _resources: &mut Resources,
        _index: usize,
    ) -> Result<(), PipelineError> {
        if cell.is_code() {
            cell.source = remove_matches(&MAGIC_PATTERN, &cell.source);
        }
        Ok(())
    }
}

/// Mark cells with `!command` lines as bash and drop the `!` prefixes.
pub struct BashIdentify;

impl Preprocessor for BashIdentify {
    fn name(&self) -> &'static str {
        "BashIdentify"
    }

    fn preprocess_cell(
        &self,
        cell: &mut Cell,
        _resources: &mut Resources,
        _index: usize,
    ) -> Result<(), PipelineError> {
        if cell.is_code() && SHELL_PATTERN.is_match(&cell.source) {
            cell.metadata.magics_language = Some("bash".to_owned());
            cell.source = remove_matches(&SHELL_PATTERN, &cell.source);
        }
        Ok(())
    }
}

/// Remove test flag comments (e.g. `#notest`) from code cells.
pub struct CleanFlags {
    patterns: Vec<Regex>,
}

impl CleanFlags {
    /// Build the stage for the given flag names.
    pub fn new<S: AsRef<str>>(flags: &[S]) -> Result<Self, PipelineError> {
        let patterns = flags
            .iter()
            .map(|flag| Regex::new(&format!(r"(?m)^#\s*{}\s*", regex::escape(flag.as_ref()))))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }
}

impl Preprocessor for CleanFlags {
    fn name(&self) -> &'static str {
        "CleanFlags"
    }

    fn preprocess_cell(
        &self,
        cell: &mut Cell,
        _resources: &mut Resources,
        _index: usize,
    ) -> Result<(), PipelineError> {
        if !cell.is_code() {
            return Ok(());
        }
        for pattern in &self.patterns {
            cell.source = remove_matches(pattern, &cell.source);
        }
        Ok(())
    }
}

/// Drop code lines ending with `#meta_hide_line`.
pub struct HideInputLines;

impl Preprocessor for HideInputLines {
    fn name(&self) -> &'static str {
        "HideInputLines"
    }

    fn preprocess_cell(
        &self,
        cell: &mut Cell,
        _resources: &mut Resources,
        _index: usize,
    ) -> Result<(), PipelineError> {
        if cell.is_code() && cell.source.contains(HIDE_LINE_MARKER) {
            cell.source = cell
                .source
                .split('\n')
                .filter(|line| !line.trim().ends_with(HIDE_LINE_MARKER))
                .collect::<Vec<_>>()
                .join("\n");
        }
        Ok(())
    }
}
