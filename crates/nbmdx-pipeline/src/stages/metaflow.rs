//! Metaflow run log cleanup for cells that execute a flow.

use std::sync::LazyLock;

use nbmdx_notebook::Cell;
use regex::Regex;

use super::remove_matches;
use crate::{PipelineError, Preprocessor, Resources};

static FLOW_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"python.+run").expect("invalid flow run regex"));

static PREAMBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"([\s\S]*Metaflow[\s\S]*Validating[\s\S]+The graph[\s\S]+)(\n[\s\S]+Workflow starting[\s\S]+)",
    )
    .expect("invalid preamble regex")
});

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}\s\d{2}:\d{2}:\d{2}.\d{3}").expect("invalid timestamp regex")
});

const ELLIPSIS: &str = "...";

fn runs_flow(cell: &Cell) -> bool {
    FLOW_RUN.is_match(&cell.source)
}

/// Drop the Metaflow banner and log timestamps from stdout of flow runs.
pub struct MetaflowTruncate;

impl Preprocessor for MetaflowTruncate {
    fn name(&self) -> &'static str {
        "MetaflowTruncate"
    }

    fn preprocess_cell(
        &self,
        cell: &mut Cell,
        _resources: &mut Resources,
        _index: usize,
    ) -> Result<(), PipelineError> {
        if !runs_flow(cell) {
            return Ok(());
        }
        for text in cell.outputs.iter_mut().filter_map(|o| o.stream_text_mut("stdout")) {
            let body = PREAMBLE.replace(text, "${2}").into_owned();
            *text = remove_matches(&TIMESTAMP, &body);
        }
        Ok(())
    }
}

/// Keep only the log lines of the steps named in `show_steps`.
///
/// ```text
/// #meta:show_steps=start,train
/// ```
pub struct MetaflowSelectSteps;

impl MetaflowSelectSteps {
    fn select(text: &str, steps: &[Regex]) -> String {
        let mut lines = vec![ELLIPSIS];
        for step in steps {
            let found: Vec<&str> = step.find_iter(text).map(|m| m.as_str()).collect();
            if !found.is_empty() {
                lines.extend(found);
                lines.push(ELLIPSIS);
            }
        }
        lines.join("\n")
    }
}

impl Preprocessor for MetaflowSelectSteps {
    fn name(&self) -> &'static str {
        "MetaflowSelectSteps"
    }

    fn preprocess_cell(
        &self,
        cell: &mut Cell,
        _resources: &mut Resources,
        _index: usize,
    ) -> Result<(), PipelineError> {
        if !runs_flow(cell) {
            return Ok(());
        }
        let Some(steps) = cell.cell_meta("show_steps", "show_step") else {
            return Ok(());
        };
        let patterns = steps
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|step| {
                Regex::new(&format!(
                    r".*\d+/{}/\d+\s\(pid\s\d+\).*",
                    regex::escape(step)
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for text in cell.outputs.iter_mut().filter_map(|o| o.stream_text_mut("stdout")) {
            *text = Self::select(text, &patterns);
        }
        Ok(())
    }
}
