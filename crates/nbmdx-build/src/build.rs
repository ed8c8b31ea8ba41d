//! Incremental parallel build of a notebook directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rayon::prelude::*;

use crate::convert::NotebookConverter;
use crate::discover::discover_notebooks;
use crate::BuildError;

/// Options for [`build_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Convert every notebook, even those with an up-to-date output.
    pub force_all: bool,
    /// Worker threads; `Some(0)` converts sequentially, `None` uses one per CPU.
    pub workers: Option<usize>,
    /// Pause before each notebook.
    pub pause: Duration,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            force_all: false,
            workers: None,
            pause: Duration::ZERO,
        }
    }
}

/// Outcome of [`build_all`].
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Notebooks converted, in discovery order.
    pub converted: Vec<PathBuf>,
    /// Notebooks skipped because their output was up to date.
    pub skipped: Vec<PathBuf>,
    /// Notebooks whose conversion failed.
    pub failed: Vec<(PathBuf, BuildError)>,
}

impl BuildReport {
    /// True when no conversion failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// True when no notebook needed converting.
    pub fn is_up_to_date(&self) -> bool {
        self.converted.is_empty() && self.failed.is_empty()
    }
}

/// Whether `notebook` must be converted again to refresh `output`.
///
/// True when the output is missing, either modification time is unknown, or
/// the notebook was modified at or after the output.
pub fn needs_rebuild(notebook: &Path, output: &Path) -> bool {
    let mtime = |path: &Path| fs::metadata(path).and_then(|m| m.modified()).ok();
    match (mtime(notebook), mtime(output)) {
        (Some(nb), Some(out)) => nb >= out,
        _ => true,
    }
}

/// Convert the notebooks under `basedir` that changed since their last build.
///
/// A single discovered notebook is always converted, sequentially. A failing
/// notebook is recorded in the report and never stops the others.
///
/// # Errors
///
/// Returns an error only if discovery fails or the worker pool cannot be
/// created.
pub fn build_all(
    basedir: &Path,
    converter: &NotebookConverter,
    options: &BuildOptions,
) -> Result<BuildReport, BuildError> {
    let notebooks = discover_notebooks(basedir, options.recursive)?;
    let single = notebooks.len() == 1;
    let force_all = options.force_all || single;

    let (pending, skipped): (Vec<PathBuf>, Vec<PathBuf>) = notebooks
        .into_iter()
        .partition(|nb| force_all || needs_rebuild(nb, &converter.output_path(nb)));

    let mut report = BuildReport {
        skipped,
        ..BuildReport::default()
    };
    if pending.is_empty() {
        tracing::info!(skipped = report.skipped.len(), "No notebooks were modified");
        return Ok(report);
    }

    let workers = if single { Some(0) } else { options.workers };
    let convert_one = |path: &PathBuf| {
        if !options.pause.is_zero() {
            std::thread::sleep(options.pause);
        }
        converter.convert(path)
    };

    let results: Vec<Result<PathBuf, BuildError>> = match workers {
        Some(0) => pending.iter().map(convert_one).collect(),
        _ => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers.unwrap_or(0))
                .build()?;
            pool.install(|| pending.par_iter().map(convert_one).collect())
        }
    };

    for (path, result) in pending.into_iter().zip(results) {
        match result {
            Ok(_) => report.converted.push(path),
            Err(e) => {
                tracing::warn!(notebook = %path.display(), error = %e, "Conversion failed");
                report.failed.push((path, e));
            }
        }
    }

    tracing::info!(
        converted = report.converted.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Build finished"
    );
    Ok(report)
}
