//! Text helpers shared by the pipeline and the exporter.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Single-character escapes (`ESC @`..`ESC _`, except `[`) and CSI sequences.
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1B(?:[@-Z\x5C-_]|\[[0-?]*[ -/]*[@-~])").expect("invalid ANSI escape regex")
});

/// Remove ANSI escape sequences (colors, cursor movement) from `text`.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ANSI_ESCAPE.replace_all(text, "")
}

/// Smallest backtick fence (at least three) that cannot be closed by `content`.
///
/// Content that itself contains a run of backticks needs a longer fence so the
/// exported code block is not terminated early.
pub fn code_fence(content: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for ch in content.chars() {
        if ch == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_color_codes() {
        let text = "\x1b[35m2022-01-01\x1b[0m \x1b[1mstart\x1b[0m";
        assert_eq!(strip_ansi(text), "2022-01-01 start");
    }

    #[test]
    fn test_strip_single_char_escape() {
        assert_eq!(strip_ansi("a\x1bMb"), "ab");
    }

    #[test]
    fn test_plain_text_is_borrowed() {
        assert!(matches!(strip_ansi("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_code_fence_default() {
        assert_eq!(code_fence("print(1)"), "```");
        assert_eq!(code_fence("a `b` c"), "```");
    }

    #[test]
    fn test_code_fence_grows_past_content() {
        assert_eq!(code_fence("```python\nx\n```"), "````");
        assert_eq!(code_fence("`````"), "``````");
    }
}
