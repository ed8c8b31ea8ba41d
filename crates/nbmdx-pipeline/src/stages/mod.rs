//! Built-in preprocessing stages.

mod cells;
mod format;
mod media;
mod meta;
mod metaflow;
mod output;
mod source;

pub use cells::{AUTOGENERATED_WARNING, CleanShowDoc, InsertWarning, RmEmptyCode, TagRemove};
pub use format::{Black, CodeFormatter, CommandFormatter};
pub use media::{ExtractOutputs, HtmlEscape, ImagePath, ImageSave};
pub use meta::{InjectMeta, UpdateTags};
pub use metaflow::{MetaflowSelectSteps, MetaflowTruncate};
pub use output::{FilterOutput, StripAnsi};
pub use source::{BashIdentify, CleanFlags, CleanMagics, HideInputLines, WriteTitle};

use regex::Regex;

/// Regex source matching a `#meta:key=value` comment line (alias `#cell_meta:`).
///
/// Group 1 is the `key=value` body. The comment must end the line or the input.
pub(crate) const META_COMMENT: &str = r"^\s*#(?:cell_meta|meta):(\S+)\s*(?:[\n\r]|\z)";

/// Delete every match of `pattern` from `text` and trim the result.
pub(crate) fn remove_matches(pattern: &Regex, text: &str) -> String {
    pattern.replace_all(text, "").trim().to_owned()
}
