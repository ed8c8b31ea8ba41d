//! MDX export of preprocessed notebooks.
//!
//! [`MdxExporter`] writes markdown and raw cells verbatim and turns code cells
//! into fenced blocks. Outputs are wrapped in the `<CodeOutputBlock>` and
//! `<HTMLOutputBlock>` components the documentation site provides.
//!
//! # Example
//!
//! ```
//! use nbmdx_notebook::{Cell, Notebook, Output};
//! use nbmdx_render::MdxExporter;
//!
//! let nb = Notebook::new(vec![
//!     Cell::markdown("# Hello"),
//!     Cell::code("print('hi')").with_output(Output::stream("stdout", "hi\n")),
//! ]);
//!
//! let mdx = MdxExporter::new().render(&nb);
//! assert!(mdx.starts_with("# Hello\n\n```python\nprint('hi')\n```"));
//! assert!(mdx.contains("<CodeOutputBlock lang=\"python\">"));
//! ```

mod exporter;

pub use exporter::MdxExporter;
