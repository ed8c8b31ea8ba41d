//! Cell and output layout.

use nbmdx_notebook::text::{code_fence, strip_ansi};
use nbmdx_notebook::{Cell, CellType, MimeBundle, Notebook, Output, OutputMetadata};

/// Image types linked through the file names `ExtractOutputs` recorded.
const IMAGE_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/svg+xml"];

/// Raw cell formats passed through by default. Raw cells without a format
/// are always passed through.
const DEFAULT_RAW_FORMATS: [&str; 2] = ["text/markdown", "text/html"];

/// Writes a processed notebook as MDX.
///
/// Layout, blocks separated by one blank line:
/// - markdown and raw cells: their source;
/// - code cells: a fenced block tagged with `magics_language` or the
///   notebook language, unless the input was removed;
/// - outputs: streams, plain text and tracebacks in a fenced
///   `<CodeOutputBlock>`, HTML in an `<HTMLOutputBlock>`, extracted images as
///   markdown image links, markdown verbatim.
#[derive(Debug, Clone)]
pub struct MdxExporter {
    raw_formats: Vec<String>,
}

impl Default for MdxExporter {
    fn default() -> Self {
        Self {
            raw_formats: DEFAULT_RAW_FORMATS.map(str::to_owned).to_vec(),
        }
    }
}

impl MdxExporter {
    /// Create an exporter with the default raw formats.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also pass through raw cells of the given mime type.
    #[must_use]
    pub fn with_raw_format(mut self, format: impl Into<String>) -> Self {
        self.raw_formats.push(format.into());
        self
    }

    /// Render `nb` as MDX. An empty notebook renders as an empty string.
    pub fn render(&self, nb: &Notebook) -> String {
        let language = nb.metadata.language();
        let mut blocks = Vec::new();

        for cell in &nb.cells {
            match cell.cell_type {
                CellType::Markdown => push_text(&mut blocks, &cell.source),
                CellType::Raw => {
                    if self.passes_raw(cell) {
                        push_text(&mut blocks, &cell.source);
                    }
                }
                CellType::Code => render_code(cell, language, &mut blocks),
            }
        }

        if blocks.is_empty() {
            return String::new();
        }
        let mut mdx = blocks.join("\n\n");
        mdx.push('\n');
        mdx
    }

    fn passes_raw(&self, cell: &Cell) -> bool {
        match cell.metadata.raw_format() {
            None | Some("") => true,
            Some(format) => self.raw_formats.iter().any(|f| f == format),
        }
    }
}

fn push_text(blocks: &mut Vec<String>, text: &str) {
    let text = text.trim_end();
    if !text.trim_start().is_empty() {
        blocks.push(text.to_owned());
    }
}

fn render_code(cell: &Cell, language: &str, blocks: &mut Vec<String>) {
    if !cell.transient.remove_source {
        let lang = cell.metadata.magics_language.as_deref().unwrap_or(language);
        blocks.push(fenced(lang, &cell.source));
    }
    blocks.extend(
        cell.outputs
            .iter()
            .filter_map(|output| render_output(cell, output, language)),
    );
}

fn render_output(cell: &Cell, output: &Output, language: &str) -> Option<String> {
    match output {
        Output::Stream { text, .. } => code_output(language, text),
        Output::DisplayData { data, metadata } | Output::ExecuteResult { data, metadata, .. } => {
            render_rich(cell, data, metadata, language)
        }
        Output::Error { traceback, .. } => code_output(language, &strip_ansi(&traceback.join("\n"))),
    }
}

fn render_rich(
    cell: &Cell,
    data: &MimeBundle,
    metadata: &OutputMetadata,
    language: &str,
) -> Option<String> {
    for mime in IMAGE_TYPES {
        if !data.contains(mime) {
            continue;
        }
        if let Some(filename) = metadata.filenames.get(mime) {
            return Some(format!("![{}]({filename})", image_alt(mime)));
        }
    }
    if let Some(html) = data.text("text/html") {
        let open = if cell.metadata.html_center {
            "<HTMLOutputBlock center>"
        } else {
            "<HTMLOutputBlock>"
        };
        return Some(format!("{open}\n\n{}\n\n</HTMLOutputBlock>", html.trim()));
    }
    if let Some(markdown) = data.text("text/markdown") {
        let markdown = markdown.trim();
        return (!markdown.is_empty()).then(|| markdown.to_owned());
    }
    data.text("text/plain")
        .and_then(|plain| code_output(language, &plain))
}

/// `png` for `image/png`, `svg` for `image/svg+xml`.
fn image_alt(mime: &str) -> &str {
    mime.split(['/', '+']).nth(1).unwrap_or(mime)
}

fn fenced(info: &str, body: &str) -> String {
    let fence = code_fence(body);
    format!("{fence}{info}\n{body}\n{fence}")
}

fn code_output(language: &str, text: &str) -> Option<String> {
    let text = text.trim_end();
    if text.trim_start().is_empty() {
        return None;
    }
    Some(format!(
        "<CodeOutputBlock lang=\"{language}\">\n\n{}\n\n</CodeOutputBlock>",
        fenced("", text)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn render(cells: Vec<Cell>) -> String {
        MdxExporter::new().render(&Notebook::new(cells))
    }

    #[test]
    fn test_markdown_and_code() {
        let mdx = render(vec![
            Cell::raw("---\ntitle: Demo\n---\n"),
            Cell::markdown("# Title\n\nSome text.\n"),
            Cell::code("x = 1").with_output(Output::stream("stdout", "1\n")),
        ]);

        assert_eq!(
            mdx,
            "---\ntitle: Demo\n---\n\n\
             # Title\n\nSome text.\n\n\
             ```python\nx = 1\n```\n\n\
             <CodeOutputBlock lang=\"python\">\n\n```\n1\n```\n\n</CodeOutputBlock>\n"
        );
    }

    #[test]
    fn test_empty_notebook() {
        assert_eq!(render(Vec::new()), "");
    }

    #[test]
    fn test_magics_language_overrides_fence() {
        let mut cell = Cell::code("ls -la");
        cell.metadata.magics_language = Some("bash".to_owned());
        assert_eq!(render(vec![cell]), "```bash\nls -la\n```\n");
    }

    #[test]
    fn test_notebook_language() {
        let mut nb = Notebook::new(vec![Cell::code("1 + 1")]);
        nb.metadata.kernelspec = Some(json!({"name": "ir", "language": "R"}));
        assert_eq!(MdxExporter::new().render(&nb), "```R\n1 + 1\n```\n");
    }

    #[test]
    fn test_removed_source_keeps_outputs() {
        let mut cell = Cell::code("secret()").with_output(Output::stream("stdout", "shown"));
        cell.transient.remove_source = true;
        let mdx = render(vec![cell]);
        assert!(!mdx.contains("secret"));
        assert!(mdx.contains("shown"));
    }

    #[test]
    fn test_nested_backticks_get_longer_fence() {
        let mdx = render(vec![Cell::code("s = \"\"\"\n```py\nx\n```\n\"\"\"")]);
        assert!(mdx.starts_with("````python\n"));
        assert!(mdx.ends_with("\n````\n"));
    }

    #[test]
    fn test_extracted_image_link() {
        let mut output = Output::display("image/png", "iVBOR");
        if let Some(data) = output.data_mut() {
            data.set_text("text/plain", "<Figure size 432x288>".to_owned());
        }
        if let Some(meta) = output.metadata_mut() {
            meta.filenames
                .insert("image/png".to_owned(), "_plots_files/output_0_0.png".to_owned());
        }
        let mdx = render(vec![Cell::code("plot()").with_output(output)]);
        assert!(mdx.ends_with("![png](_plots_files/output_0_0.png)\n"));
        assert!(!mdx.contains("Figure size"));
    }

    #[test]
    fn test_image_without_file_falls_back_to_text() {
        let mut output = Output::display("image/png", "iVBOR");
        if let Some(data) = output.data_mut() {
            data.set_text("text/plain", "<Figure>".to_owned());
        }
        let mdx = render(vec![Cell::code("plot()").with_output(output)]);
        assert!(mdx.contains("```\n<Figure>\n```"));
    }

    #[test]
    fn test_html_output_blocks() {
        let mut centered = Cell::code("chart").with_output(Output::display(
            "text/html",
            "```html\n<div></div>\n```",
        ));
        centered.metadata.html_output = true;
        centered.metadata.html_center = true;
        let table = Cell::code("df").with_output(Output::display("text/html", "<table></table>"));

        let mdx = render(vec![centered, table]);
        assert!(mdx.contains(
            "<HTMLOutputBlock center>\n\n```html\n<div></div>\n```\n\n</HTMLOutputBlock>"
        ));
        assert!(mdx.contains("<HTMLOutputBlock>\n\n<table></table>\n\n</HTMLOutputBlock>"));
    }

    #[test]
    fn test_markdown_output_is_verbatim() {
        let cell = Cell::code("Markdown('**hi**')")
            .with_output(Output::display("text/markdown", "**hi**\n"));
        assert!(render(vec![cell]).ends_with("```\n\n**hi**\n"));
    }

    #[test]
    fn test_error_traceback_without_ansi() {
        let cell = Cell::code("1/0").with_output(Output::Error {
            ename: "ZeroDivisionError".to_owned(),
            evalue: "division by zero".to_owned(),
            traceback: vec![
                "\x1b[0;31mZeroDivisionError\x1b[0m".to_owned(),
                "division by zero".to_owned(),
            ],
        });
        let mdx = render(vec![cell]);
        assert!(mdx.contains("```\nZeroDivisionError\ndivision by zero\n```"));
        assert!(!mdx.contains('\x1b'));
    }

    #[test]
    fn test_raw_cell_formats() {
        let mut rst = Cell::raw(".. note:: hidden");
        rst.metadata.format = Some("text/restructuredtext".to_owned());
        let mut html = Cell::raw("<br/>");
        html.metadata.format = Some("text/html".to_owned());

        assert_eq!(render(vec![rst.clone(), html.clone()]), "<br/>\n");

        let exporter = MdxExporter::new().with_raw_format("text/restructuredtext");
        assert_eq!(
            exporter.render(&Notebook::new(vec![rst, html])),
            ".. note:: hidden\n\n<br/>\n"
        );
    }

    #[test]
    fn test_raw_mimetype_filters_raw_cell() {
        let mut latex = Cell::raw("\\newpage");
        latex.metadata.raw_mimetype = Some("text/latex".to_owned());
        let mut html = Cell::raw("<hr/>");
        html.metadata.raw_mimetype = Some("text/html".to_owned());

        assert_eq!(render(vec![latex, html]), "<hr/>\n");
    }

    #[test]
    fn test_blank_stream_is_skipped() {
        let cell = Cell::code("x").with_output(Output::stream("stdout", "\n"));
        assert_eq!(render(vec![cell]), "```python\nx\n```\n");
    }
}
