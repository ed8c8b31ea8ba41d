//! Single notebook conversion.

use std::fs;
use std::path::{Path, PathBuf};

use nbmdx_notebook::{Notebook, is_notebook_path};
use nbmdx_pipeline::{Pipeline, Resources};
use nbmdx_render::MdxExporter;

use crate::BuildError;

/// Default extension of generated files.
const DEFAULT_OUTPUT_EXTENSION: &str = "md";

/// Runs a notebook through the pipeline and writes the MDX next to it.
///
/// Holds only configuration, so one converter is shared by every worker of
/// a build.
#[derive(Debug)]
pub struct NotebookConverter {
    pipeline: Pipeline,
    exporter: MdxExporter,
    output_extension: String,
}

impl NotebookConverter {
    /// Create a converter writing `.md` files.
    pub fn new(pipeline: Pipeline, exporter: MdxExporter) -> Self {
        Self {
            pipeline,
            exporter,
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_owned(),
        }
    }

    /// Set the extension of generated files (without the dot).
    #[must_use]
    pub fn with_output_extension(mut self, extension: impl Into<String>) -> Self {
        self.output_extension = extension.into();
        self
    }

    /// Path of the file generated for `notebook`.
    pub fn output_path(&self, notebook: &Path) -> PathBuf {
        notebook.with_extension(&self.output_extension)
    }

    /// Load, preprocess and render the notebook at `path`.
    ///
    /// Extracted images are still written next to the notebook.
    pub fn render(&self, path: &Path) -> Result<String, BuildError> {
        if !is_notebook_path(path) {
            return Err(BuildError::NotANotebook(path.to_path_buf()));
        }
        if !path.is_file() {
            return Err(BuildError::NotFound(path.to_path_buf()));
        }

        let mut nb = Notebook::from_path(path)?;
        let mut resources = Resources::for_notebook(path);
        self.pipeline.run(&mut nb, &mut resources)?;
        Ok(self.exporter.render(&nb))
    }

    /// Convert the notebook at `path` and write the generated file.
    ///
    /// Returns the path of the generated file.
    pub fn convert(&self, path: &Path) -> Result<PathBuf, BuildError> {
        tracing::info!(notebook = %path.display(), "Converting notebook");
        let mdx = self.render(path)?;
        let output = self.output_path(path);
        fs::write(&output, mdx).map_err(|source| BuildError::Io {
            path: output.clone(),
            source,
        })?;
        Ok(output)
    }
}

/// Convert the notebook at `path` with `converter`.
pub fn nb2md(path: &Path, converter: &NotebookConverter) -> Result<PathBuf, BuildError> {
    converter.convert(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbmdx_pipeline::PipelineSettings;
    use pretty_assertions::assert_eq;

    const NOTEBOOK: &str = r##"{
 "cells": [
  {"cell_type": "raw", "metadata": {}, "source": ["---\n", "title: Demo\n", "---"]},
  {"cell_type": "markdown", "metadata": {}, "source": ["# Demo"]},
  {
   "cell_type": "code",
   "execution_count": 1,
   "metadata": {},
   "outputs": [{"name": "stdout", "output_type": "stream", "text": ["2\n"]}],
   "source": ["#meta:tag=hide_input\n", "print(1 + 1)"]
  },
  {"cell_type": "code", "execution_count": null, "metadata": {}, "outputs": [], "source": ["#notest\n", "x = 1"]}
 ],
 "metadata": {"kernelspec": {"name": "python3", "language": "python"}},
 "nbformat": 4,
 "nbformat_minor": 5
}"##;

    fn mdx_converter() -> NotebookConverter {
        let settings = PipelineSettings {
            tst_flags: vec!["notest".to_owned()],
            warning: "{/* generated */}".to_owned(),
            ..PipelineSettings::default()
        };
        NotebookConverter::new(Pipeline::mdx(&settings).unwrap(), MdxExporter::new())
    }

    #[test]
    fn test_convert_writes_sibling_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.ipynb");
        fs::write(&path, NOTEBOOK).unwrap();

        let output = nb2md(&path, &mdx_converter()).unwrap();

        assert_eq!(output, dir.path().join("demo.md"));
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "---\ntitle: Demo\n---\n\n\
             {/* generated */}\n\n\
             # Demo\n\n\
             <CodeOutputBlock lang=\"python\">\n\n```\n2\n```\n\n</CodeOutputBlock>\n\n\
             ```python\nx = 1\n```\n"
        );
    }

    #[test]
    fn test_output_extension() {
        let converter = mdx_converter().with_output_extension("mdx");
        assert_eq!(
            converter.output_path(Path::new("/nbs/demo.ipynb")),
            PathBuf::from("/nbs/demo.mdx")
        );
    }

    #[test]
    fn test_render_rejects_non_notebook() {
        let err = mdx_converter().render(Path::new("/nbs/demo.md")).unwrap_err();
        assert!(matches!(err, BuildError::NotANotebook(_)));
        assert_eq!(err.to_string(), "/nbs/demo.md is not a notebook.");
    }

    #[test]
    fn test_render_missing_notebook() {
        let err = mdx_converter()
            .render(Path::new("/nonexistent/demo.ipynb"))
            .unwrap_err();
        assert!(matches!(err, BuildError::NotFound(_)));
    }

    #[test]
    fn test_render_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ipynb");
        fs::write(&path, "{not json").unwrap();

        let err = mdx_converter().render(&path).unwrap_err();
        assert!(matches!(err, BuildError::Notebook(_)));
        assert!(!dir.path().join("broken.md").exists());
    }
}
