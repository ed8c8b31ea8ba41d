//! Preprocessor trait and stage composition.

use nbmdx_notebook::{Cell, Notebook};

use crate::resources::Resources;
use crate::stages::{
    AUTOGENERATED_WARNING, BashIdentify, Black, CleanFlags, CleanMagics, CleanShowDoc,
    CommandFormatter, ExtractOutputs, FilterOutput, HideInputLines, HtmlEscape, ImagePath,
    ImageSave, InjectMeta, InsertWarning, MetaflowSelectSteps, MetaflowTruncate, RmEmptyCode,
    StripAnsi, TagRemove, UpdateTags, WriteTitle,
};
use crate::PipelineError;

/// A single notebook transformation stage.
///
/// Implement [`preprocess_cell`](Self::preprocess_cell) for stages that look
/// at one cell at a time, or override [`preprocess`](Self::preprocess) for
/// stages that insert, remove or reorder cells.
///
/// Stages hold only configuration; all per-notebook state travels in the
/// notebook and [`Resources`]. This makes one pipeline shareable across the
/// worker threads of a build.
///
/// # Example
///
/// ```
/// use nbmdx_notebook::{Cell, Notebook};
/// use nbmdx_pipeline::{Pipeline, PipelineError, Preprocessor, Resources};
///
/// struct Shout;
///
/// impl Preprocessor for Shout {
///     fn name(&self) -> &'static str { "Shout" }
///
///     fn preprocess_cell(
///         &self,
///         cell: &mut Cell,
///         _resources: &mut Resources,
///         _index: usize,
///     ) -> Result<(), PipelineError> {
///         if cell.is_markdown() {
///             cell.source = cell.source.to_uppercase();
///         }
///         Ok(())
///     }
/// }
///
/// let mut nb = Notebook::new(vec![Cell::markdown("hello")]);
/// Pipeline::new().with_stage(Shout).run(&mut nb, &mut Resources::default()).unwrap();
/// assert_eq!(nb.cells[0].source, "HELLO");
/// ```
pub trait Preprocessor: Send + Sync {
    /// Stage name used in logs.
    fn name(&self) -> &'static str;

    /// Transform the whole notebook.
    ///
    /// The default calls [`preprocess_cell`](Self::preprocess_cell) for every
    /// cell in order.
    fn preprocess(&self, nb: &mut Notebook, resources: &mut Resources) -> Result<(), PipelineError> {
        for (index, cell) in nb.cells.iter_mut().enumerate() {
            self.preprocess_cell(cell, resources, index)?;
        }
        Ok(())
    }

    /// Transform a single cell.
    fn preprocess_cell(
        &self,
        cell: &mut Cell,
        resources: &mut Resources,
        index: usize,
    ) -> Result<(), PipelineError> {
        let _ = (cell, resources, index);
        Ok(())
    }
}

/// Settings for the default MDX pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Test flags stripped from code cells (e.g. `notest` for `#notest`).
    pub tst_flags: Vec<String>,
    /// Formatter command for cells tagged `black`: program followed by arguments.
    pub formatter: Vec<String>,
    /// Tags that remove the whole cell.
    pub remove_cell_tags: Vec<String>,
    /// Tags that remove all outputs of a cell.
    pub remove_all_outputs_tags: Vec<String>,
    /// Tags that hide the input of a cell.
    pub remove_input_tags: Vec<String>,
    /// Output-level tags that remove a single output.
    pub remove_single_output_tags: Vec<String>,
    /// Markdown inserted after the first cell to flag the file as generated.
    pub warning: String,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            tst_flags: Vec::new(),
            formatter: owned(&["black", "-q", "-"]),
            remove_cell_tags: owned(&["remove_cell", "hide"]),
            remove_all_outputs_tags: owned(&[
                "remove_output",
                "remove_outputs",
                "hide_output",
                "hide_outputs",
            ]),
            remove_input_tags: owned(&["remove_input", "remove_inputs", "hide_input", "hide_inputs"]),
            remove_single_output_tags: Vec::new(),
            warning: AUTOGENERATED_WARNING.to_owned(),
        }
    }
}

/// Ordered chain of preprocessing stages.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Preprocessor>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl Pipeline {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    #[must_use]
    pub fn with_stage<P: Preprocessor + 'static>(mut self, stage: P) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// The default notebook-to-MDX chain.
    ///
    /// Order matters:
    /// - `InjectMeta` reads the `#meta` comments that `CleanMagics` deletes.
    /// - `UpdateTags` turns the record into tags before `TagRemove` and `Black` read them.
    /// - `ExtractOutputs`, `ImageSave` and `ImagePath` hand images down through [`Resources`].
    /// - `CleanShowDoc` turns its HTML into a raw cell before `HtmlEscape` would fence it.
    pub fn mdx(settings: &PipelineSettings) -> Result<Self, PipelineError> {
        let tag_remove = TagRemove::new()
            .with_remove_cell_tags(settings.remove_cell_tags.clone())
            .with_remove_all_outputs_tags(settings.remove_all_outputs_tags.clone())
            .with_remove_input_tags(settings.remove_input_tags.clone())
            .with_remove_single_output_tags(settings.remove_single_output_tags.clone());

        Ok(Self::new()
            .with_stage(ExtractOutputs)
            .with_stage(InjectMeta)
            .with_stage(WriteTitle)
            .with_stage(CleanMagics)
            .with_stage(BashIdentify)
            .with_stage(MetaflowTruncate)
            .with_stage(MetaflowSelectSteps)
            .with_stage(UpdateTags)
            .with_stage(InsertWarning::new(settings.warning.clone()))
            .with_stage(tag_remove)
            .with_stage(CleanFlags::new(&settings.tst_flags)?)
            .with_stage(CleanShowDoc)
            .with_stage(RmEmptyCode)
            .with_stage(StripAnsi)
            .with_stage(HideInputLines)
            .with_stage(FilterOutput)
            .with_stage(Black::new(CommandFormatter::from_command(&settings.formatter)))
            .with_stage(ImageSave)
            .with_stage(ImagePath)
            .with_stage(HtmlEscape))
    }

    /// Names of the stages in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage over `nb` in order.
    ///
    /// Stops at the first failing stage.
    pub fn run(&self, nb: &mut Notebook, resources: &mut Resources) -> Result<(), PipelineError> {
        for stage in &self.stages {
            tracing::debug!(stage = stage.name(), cells = nb.cells.len(), "Running stage");
            stage.preprocess(nb, resources)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbmdx_notebook::Output;
    use pretty_assertions::assert_eq;

    struct Append(&'static str);

    impl Preprocessor for Append {
        fn name(&self) -> &'static str {
            "Append"
        }

        fn preprocess_cell(
            &self,
            cell: &mut Cell,
            _resources: &mut Resources,
            _index: usize,
        ) -> Result<(), PipelineError> {
            cell.source.push_str(self.0);
            Ok(())
        }
    }

    struct Fail;

    impl Preprocessor for Fail {
        fn name(&self) -> &'static str {
            "Fail"
        }

        fn preprocess(&self, _nb: &mut Notebook, _res: &mut Resources) -> Result<(), PipelineError> {
            Err(PipelineError::Format {
                index: 0,
                message: "boom".to_owned(),
            })
        }
    }

    #[test]
    fn test_stages_run_in_declaration_order() {
        let pipeline = Pipeline::new().with_stage(Append("a")).with_stage(Append("b"));
        let mut nb = Notebook::new(vec![Cell::code(""), Cell::markdown("")]);

        pipeline.run(&mut nb, &mut Resources::default()).unwrap();

        assert_eq!(nb.cells[0].source, "ab");
        assert_eq!(nb.cells[1].source, "ab");
    }

    #[test]
    fn test_failing_stage_stops_pipeline() {
        let pipeline = Pipeline::new()
            .with_stage(Append("a"))
            .with_stage(Fail)
            .with_stage(Append("b"));
        let mut nb = Notebook::new(vec![Cell::code("")]);

        let result = pipeline.run(&mut nb, &mut Resources::default());

        assert!(result.is_err());
        assert_eq!(nb.cells[0].source, "a");
    }

    #[test]
    fn test_mdx_stage_order() {
        let pipeline = Pipeline::mdx(&PipelineSettings::default()).unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec![
                "ExtractOutputs",
                "InjectMeta",
                "WriteTitle",
                "CleanMagics",
                "BashIdentify",
                "MetaflowTruncate",
                "MetaflowSelectSteps",
                "UpdateTags",
                "InsertWarning",
                "TagRemove",
                "CleanFlags",
                "CleanShowDoc",
                "RmEmptyCode",
                "StripAnsi",
                "HideInputLines",
                "FilterOutput",
                "Black",
                "ImageSave",
                "ImagePath",
                "HtmlEscape",
            ]
        );
    }

    #[test]
    fn test_mdx_pipeline_end_to_end() {
        let frontmatter = Cell::raw("---\ntitle: Demo\n---");
        let meta_cell = Cell::code("#meta:tags=remove_output\n%%time\nprint('hi')")
            .with_output(Output::stream("stdout", "hi\n"));
        let hidden = Cell::code("#meta:tag=hide\nsecret()");
        let shell = Cell::code("!python flow.py run #meta_hide_line\n!ls");
        let empty = Cell::code("   ");
        let mut nb = Notebook::new(vec![frontmatter, meta_cell, hidden, shell, empty]);

        let pipeline = Pipeline::mdx(&PipelineSettings::default()).unwrap();
        pipeline.run(&mut nb, &mut Resources::default()).unwrap();

        assert_eq!(nb.cells.len(), 4);
        assert!(nb.cells[0].is_raw());
        assert!(nb.cells[1].is_markdown());
        assert!(nb.cells[1].source.contains("AUTOGENERATED"));

        assert_eq!(nb.cells[2].source, "print('hi')");
        assert!(nb.cells[2].outputs.is_empty());

        assert_eq!(nb.cells[3].source, "ls");
        assert_eq!(nb.cells[3].metadata.magics_language.as_deref(), Some("bash"));
    }
}
