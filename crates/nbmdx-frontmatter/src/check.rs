//! Documentation quality checks.

use std::ops::RangeInclusive;
use std::path::Path;

use crate::meta::{DocMeta, meta_list};
use crate::CheckError;

/// Pages shorter than this are reported by [`Check::Length`].
const MIN_WORDS: usize = 50;

/// Accepted description length in characters.
const DESCRIPTION_CHARS: RangeInclusive<usize> = 55..=300;

/// A front matter or content check over generated markdown files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Files without a `description` field.
    Description,
    /// Files without an `image` field.
    Image,
    /// Files with fewer than 50 words.
    Length,
    /// Files whose description is not between 55 and 300 characters.
    DescriptionLength,
}

impl Check {
    /// Whether `doc` fails this check.
    pub fn fails(self, doc: &DocMeta) -> bool {
        match self {
            Self::Description => doc.get("description").is_none(),
            Self::Image => doc.get("image").is_none(),
            Self::Length => doc.n_words < MIN_WORDS,
            Self::DescriptionLength => match doc.get("description") {
                None | Some(serde_yaml::Value::Null) => false,
                Some(value) => value.as_str().is_none_or(|desc| {
                    !desc.is_empty() && !DESCRIPTION_CHARS.contains(&desc.chars().count())
                }),
            },
        }
    }

    /// Description of the files failing this check.
    pub fn message(self) -> &'static str {
        match self {
            Self::Description => "do not have the field `description` in their front matter",
            Self::Image => "do not have the field `image` in their front matter",
            Self::Length => "contain less than 50 words",
            Self::DescriptionLength => {
                "have a description that is not between 55 and 300 characters"
            }
        }
    }
}

/// Run `check` over every markdown file under `srcdir`.
///
/// # Errors
///
/// Returns [`CheckError::Failed`] listing the offending files, or an I/O or
/// YAML error if a file cannot be read.
pub fn run_check(check: Check, srcdir: &Path) -> Result<(), CheckError> {
    let docs = meta_list(srcdir)?;
    let files: Vec<_> = docs
        .into_iter()
        .filter(|doc| check.fails(doc))
        .map(|doc| doc.fname)
        .collect();

    if files.is_empty() {
        return Ok(());
    }
    Err(CheckError::Failed {
        message: check.message().to_owned(),
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_yaml::{Mapping, Value};
    use std::path::PathBuf;

    fn doc(front_matter: &[(&str, &str)], n_words: usize) -> DocMeta {
        let mut mapping = Mapping::new();
        for (key, value) in front_matter {
            mapping.insert(Value::from(*key), Value::from(*value));
        }
        DocMeta {
            fname: PathBuf::from("doc.md"),
            n_words,
            front_matter: mapping,
        }
    }

    #[test]
    fn test_description_and_image() {
        let bare = doc(&[], 100);
        let full = doc(&[("description", "x"), ("image", "cover.png")], 100);

        assert!(Check::Description.fails(&bare));
        assert!(Check::Image.fails(&bare));
        assert!(!Check::Description.fails(&full));
        assert!(!Check::Image.fails(&full));
    }

    #[test]
    fn test_length() {
        assert!(Check::Length.fails(&doc(&[], 49)));
        assert!(!Check::Length.fails(&doc(&[], 50)));
    }

    #[test]
    fn test_description_length() {
        let short = "a".repeat(54);
        let min = "a".repeat(55);
        let max = "a".repeat(300);
        let long = "a".repeat(301);

        assert!(Check::DescriptionLength.fails(&doc(&[("description", &short)], 0)));
        assert!(!Check::DescriptionLength.fails(&doc(&[("description", &min)], 0)));
        assert!(!Check::DescriptionLength.fails(&doc(&[("description", &max)], 0)));
        assert!(Check::DescriptionLength.fails(&doc(&[("description", &long)], 0)));
    }

    #[test]
    fn test_description_length_ignores_missing_description() {
        assert!(!Check::DescriptionLength.fails(&doc(&[], 0)));
        assert!(!Check::DescriptionLength.fails(&doc(&[("description", "")], 0)));
    }

    #[test]
    fn test_description_length_counts_characters() {
        let accented = "é".repeat(55);
        assert!(!Check::DescriptionLength.fails(&doc(&[("description", &accented)], 0)));
    }

    #[test]
    fn test_run_check_lists_failures() {
        let dir = tempfile::tempdir().unwrap();
        let words = "word ".repeat(60);
        std::fs::write(dir.path().join("long.md"), &words).unwrap();
        std::fs::write(dir.path().join("short.md"), "too short").unwrap();

        let err = run_check(Check::Length, dir.path()).unwrap_err();

        let CheckError::Failed { message, files } = &err else {
            panic!("expected Failed, got {err:?}");
        };
        assert_eq!(message, "contain less than 50 words");
        assert_eq!(files, &vec![dir.path().join("short.md")]);
        assert_eq!(
            err.to_string(),
            format!(
                "The following files contain less than 50 words:\n\t{}",
                dir.path().join("short.md").display()
            )
        );
    }

    #[test]
    fn test_run_check_passes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("page.md"),
            "---\ndescription: fine\nimage: cover.png\n---\nbody",
        )
        .unwrap();

        assert!(run_check(Check::Description, dir.path()).is_ok());
        assert!(run_check(Check::Image, dir.path()).is_ok());
    }
}
