//! Images and HTML in outputs: extraction, saving, linking and escaping.

use std::collections::BTreeMap;
use std::fs;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use nbmdx_notebook::{Cell, Notebook};

use crate::html::is_dataframe;
use crate::{PipelineError, Preprocessor, Resources};

/// Extracted mime types and their file extensions. SVG is stored as text.
const EXTRACT_TYPES: [(&str, &str); 4] = [
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/svg+xml", "svg"),
    ("application/pdf", "pdf"),
];

const SVG: &str = "image/svg+xml";
const HTML: &str = "text/html";

/// Move image and PDF payloads out of the notebook into [`Resources::outputs`].
///
/// Files are named `{unique_key}_{cell}_{output}.{ext}`; the name is recorded
/// in the output's `metadata.filenames`. The payload stays in the output.
pub struct ExtractOutputs;

impl Preprocessor for ExtractOutputs {
    fn name(&self) -> &'static str {
        "ExtractOutputs"
    }

    fn preprocess_cell(
        &self,
        cell: &mut Cell,
        resources: &mut Resources,
        index: usize,
    ) -> Result<(), PipelineError> {
        for (output_index, output) in cell.outputs.iter_mut().enumerate() {
            let Some(data) = output.data() else {
                continue;
            };
            let mut extracted = Vec::new();
            for (mime, ext) in EXTRACT_TYPES {
                let Some(payload) = data.text(mime) else {
                    continue;
                };
                let bytes = if mime == SVG {
                    payload.into_bytes()
                } else {
                    let compact: String = payload.split_ascii_whitespace().collect();
                    match BASE64_STANDARD.decode(compact) {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            tracing::warn!(cell = index, output = output_index, mime, error = %e, "Skipping undecodable output");
                            continue;
                        }
                    }
                };
                let filename = format!("{}_{index}_{output_index}.{ext}", resources.unique_key);
                resources.outputs.insert(filename.clone(), bytes);
                extracted.push((mime, filename));
            }
            if let Some(meta) = output.metadata_mut() {
                for (mime, filename) in extracted {
                    meta.filenames.insert(mime.to_owned(), filename);
                }
            }
        }
        Ok(())
    }
}

/// Write extracted files next to the notebook, into `_{name}_files/`.
///
/// Records each saved path (relative to the notebook directory) in
/// [`Resources::fmap`]. Existing files are overwritten, so re-running a
/// conversion leaves the same files behind.
pub struct ImageSave;

impl Preprocessor for ImageSave {
    fn name(&self) -> &'static str {
        "ImageSave"
    }

    fn preprocess(&self, _nb: &mut Notebook, resources: &mut Resources) -> Result<(), PipelineError> {
        let Some(name) = resources.metadata.name.as_deref() else {
            return Ok(());
        };
        if resources.outputs.is_empty() {
            return Ok(());
        }

        let folder = format!("_{name}_files");
        let dir = resources.metadata.path.join(&folder);
        fs::create_dir_all(&dir).map_err(|source| PipelineError::Write {
            path: dir.clone(),
            source,
        })?;

        let mut fmap = BTreeMap::new();
        for (key, bytes) in &resources.outputs {
            let dest = dir.join(key);
            fs::write(&dest, bytes).map_err(|source| PipelineError::Write {
                path: dest.clone(),
                source,
            })?;
            fmap.insert(key.clone(), format!("{folder}/{key}"));
        }
        tracing::debug!(dir = %dir.display(), files = fmap.len(), "Saved extracted outputs");
        resources.fmap = fmap;
        Ok(())
    }
}

/// Point `metadata.filenames` at the paths [`ImageSave`] wrote.
pub struct ImagePath;

impl Preprocessor for ImagePath {
    fn name(&self) -> &'static str {
        "ImagePath"
    }

    fn preprocess_cell(
        &self,
        cell: &mut Cell,
        resources: &mut Resources,
        _index: usize,
    ) -> Result<(), PipelineError> {
        if resources.fmap.is_empty() {
            return Ok(());
        }
        for meta in cell.outputs.iter_mut().filter_map(|o| o.metadata_mut()) {
            for filename in meta.filenames.values_mut() {
                if let Some(saved) = resources.fmap.get(filename.as_str()) {
                    filename.clone_from(saved);
                }
            }
        }
        Ok(())
    }
}

/// Fence HTML outputs of code cells so MDX does not parse them as JSX.
///
/// Marks the cell with `html_output`, and with `html_center` unless the HTML
/// is a dataframe table.
pub struct HtmlEscape;

impl Preprocessor for HtmlEscape {
    fn name(&self) -> &'static str {
        "HtmlEscape"
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
        for data in cell.outputs.iter_mut().filter_map(|o| o.data_mut()) {
            let Some(html) = data.text(HTML).filter(|h| !h.is_empty()) else {
                continue;
            };
            cell.metadata.html_output = true;
            cell.metadata.html_center = !is_dataframe(&html);
            data.set_text(HTML, format!("```html\n{}\n```", html.trim()));
        }
        Ok(())
    }
}
