//! Stdout stream cleanup.

use nbmdx_notebook::Cell;
use nbmdx_notebook::text::strip_ansi;

use crate::{PipelineError, Preprocessor, Resources};

/// Remove ANSI color and cursor sequences from stdout.
pub struct StripAnsi;

impl Preprocessor for StripAnsi {
    fn name(&self) -> &'static str {
        "StripAnsi"
    }

    fn preprocess_cell(
        &self,
        cell: &mut Cell,
        _resources: &mut Resources,
        _index: usize,
    ) -> Result<(), PipelineError> {
        for text in cell.outputs.iter_mut().filter_map(|o| o.stream_text_mut("stdout")) {
            *text = strip_ansi(text).into_owned();
        }
        Ok(())
    }
}

/// Drop stdout lines containing any of the `filter_words` of the cell.
///
/// ```text
/// #meta:filter_words=FutureWarning,MultiIndex
/// ```
pub struct FilterOutput;

impl Preprocessor for FilterOutput {
    fn name(&self) -> &'static str {
        "FilterOutput"
    }

    fn preprocess_cell(
        &self,
        cell: &mut Cell,
        _resources: &mut Resources,
        _index: usize,
    ) -> Result<(), PipelineError> {
        let Some(words) = cell.cell_meta("filter_words", "filter_word") else {
            return Ok(());
        };
        let words: Vec<String> = words
            .split(',')
            .filter(|w| !w.is_empty())
            .map(str::to_owned)
            .collect();
        if words.is_empty() {
            return Ok(());
        }

        for text in cell.outputs.iter_mut().filter_map(|o| o.stream_text_mut("stdout")) {
            *text = text
                .lines()
                .filter(|line| !words.iter().any(|w| line.contains(w.as_str())))
                .collect::<Vec<_>>()
                .join("\n");
        }
        Ok(())
    }
}
