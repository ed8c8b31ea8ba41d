//! Cell-meta record: injection from comments and conversion to tags.

use std::sync::LazyLock;

use nbmdx_notebook::Cell;
use regex::Regex;

use super::META_COMMENT;
use crate::{PipelineError, Preprocessor, Resources};

static META_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("(?m){META_COMMENT}")).expect("invalid meta regex"));

/// Collect `#meta:key=value` comments of code cells into the cell-meta record.
///
/// The body is split at the first `=`; bodies without one are ignored with a
/// warning. Later comments overwrite earlier ones with the same key.
pub struct InjectMeta;

impl Preprocessor for InjectMeta {
    fn name(&self) -> &'static str {
        "InjectMeta"
    }

    fn preprocess_cell(
        &self,
        cell: &mut Cell,
        _resources: &mut Resources,
        index: usize,
    ) -> Result<(), PipelineError> {
        if !cell.is_code() {
            return Ok(());
        }
        for caps in META_PATTERN.captures_iter(&cell.source) {
            let body = &caps[1];
            if let Some((key, value)) = body.split_once('=') {
                cell.metadata
                    .cell_meta
                    .insert(key.to_owned(), value.to_owned());
            } else {
                tracing::warn!(cell = index, comment = body, "Cell meta comment has no '=', ignoring");
            }
        }
        Ok(())
    }
}

/// Append the record's comma-separated `tags` (alias `tag`) to the cell tags.
pub struct UpdateTags;

impl Preprocessor for UpdateTags {
    fn name(&self) -> &'static str {
        "UpdateTags"
    }

    fn preprocess_cell(
        &self,
        cell: &mut Cell,
        _resources: &mut Resources,
        _index: usize,
    ) -> Result<(), PipelineError> {
        let Some(tags) = cell.cell_meta("tags", "tag") else {
            return Ok(());
        };
        let new_tags: Vec<String> = tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect();
        cell.metadata.tags.extend(new_tags);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn inject(cell: &mut Cell) {
        InjectMeta
            .preprocess_cell(cell, &mut Resources::default(), 0)
            .unwrap();
    }

    #[test]
    fn test_inject_meta_collects_record() {
        let mut cell = Cell::code("#meta:show_steps=start,train\n#cell_meta:tag=black\nrun()");
        inject(&mut cell);

        let record = &cell.metadata.cell_meta;
        assert_eq!(record.len(), 2);
        assert_eq!(record["show_steps"], "start,train");
        assert_eq!(record["tag"], "black");
    }

    #[test]
    fn test_inject_meta_on_last_line() {
        let mut cell = Cell::code("run()\n  #meta:filter_words=FutureWarning");
        inject(&mut cell);
        assert_eq!(cell.metadata.cell_meta["filter_words"], "FutureWarning");
    }

    #[test]
    fn test_inject_meta_ignores_body_without_equals() {
        let mut cell = Cell::code("#meta:black\nx = 1");
        inject(&mut cell);
        assert!(cell.metadata.cell_meta.is_empty());
    }

    #[test]
    fn test_inject_meta_keeps_equals_in_value() {
        let mut cell = Cell::code("#meta:filter_words=a=b\n");
        inject(&mut cell);
        assert_eq!(cell.metadata.cell_meta["filter_words"], "a=b");
    }

    #[test]
    fn test_inject_meta_skips_markdown() {
        let mut cell = Cell::markdown("#meta:tag=hide\n");
        inject(&mut cell);
        assert!(cell.metadata.cell_meta.is_empty());
    }

    #[test]
    fn test_inject_meta_ignores_inline_comment() {
        let mut cell = Cell::code("x = 1  #meta:tag=hide\n");
        inject(&mut cell);
        assert!(cell.metadata.cell_meta.is_empty());
    }

    #[test]
    fn test_inject_meta_keeps_existing_entries() {
        let mut cell = Cell::code("#meta:tag=black\n");
        cell.metadata
            .cell_meta
            .insert("show_steps".to_owned(), "end".to_owned());
        inject(&mut cell);
        assert_eq!(cell.metadata.cell_meta["show_steps"], "end");
        assert_eq!(cell.metadata.cell_meta["tag"], "black");
    }

    #[test]
    fn test_update_tags_appends() {
        let mut cell = Cell::code("x");
        cell.metadata.tags = vec!["existing".to_owned()];
        cell.metadata
            .cell_meta
            .insert("tags".to_owned(), "remove_output,black".to_owned());

        UpdateTags
            .preprocess_cell(&mut cell, &mut Resources::default(), 0)
            .unwrap();

        assert_eq!(cell.metadata.tags, vec!["existing", "remove_output", "black"]);
    }

    #[test]
    fn test_update_tags_singular_alias() {
        let mut cell = Cell::code("x");
        cell.metadata
            .cell_meta
            .insert("tag".to_owned(), "hide".to_owned());

        UpdateTags
            .preprocess_cell(&mut cell, &mut Resources::default(), 0)
            .unwrap();

        assert_eq!(cell.metadata.tags, vec!["hide"]);
    }

    #[test]
    fn test_update_tags_without_record_is_noop() {
        let mut cell = Cell::code("x");
        UpdateTags
            .preprocess_cell(&mut cell, &mut Resources::default(), 0)
            .unwrap();
        assert!(cell.metadata.tags.is_empty());
    }
}
