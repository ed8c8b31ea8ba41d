//! Minimal HTML tag scanner for pandas dataframe detection.

use std::iter::Peekable;
use std::str::CharIndices;

const DATAFRAME_MARKER: &str = ".dataframe";

/// A parsed tag; attribute values are not kept.
#[derive(Debug, PartialEq, Eq)]
enum Tag {
    Start { name: String, attrs: Vec<String> },
    End { name: String },
}

/// Whether `html` is a pandas dataframe rendering.
///
/// Pandas emits a `<style scoped>` block with `.dataframe` selectors in
/// front of its tables. Text seen between a `<style scoped>` start tag and
/// the next `</style>` that mentions `.dataframe` marks the HTML as a
/// dataframe.
pub fn is_dataframe(html: &str) -> bool {
    let mut scoped = false;
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        if scoped && rest[..open].contains(DATAFRAME_MARKER) {
            return true;
        }
        let markup = &rest[open..];

        if let Some(comment) = markup.strip_prefix("<!--") {
            rest = comment.find("-->").map_or("", |end| &comment[end + 3..]);
            continue;
        }
        let Some(close) = markup.find('>') else {
            rest = markup;
            break;
        };
        rest = &markup[close + 1..];

        match parse_tag(&markup[1..close]) {
            Some(Tag::Start { name, attrs }) if name == "style" => {
                if attrs.iter().any(|a| a == "scoped") {
                    scoped = true;
                }
                // Style content is raw text up to the closing tag.
                let end = find_ignore_case(rest, "</style").unwrap_or(rest.len());
                if scoped && rest[..end].contains(DATAFRAME_MARKER) {
                    return true;
                }
                rest = &rest[end..];
            }
            Some(Tag::End { name }) if name == "style" => scoped = false,
            _ => {}
        }
    }

    scoped && rest.contains(DATAFRAME_MARKER)
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(needle)
}

/// Parse the inside of `<...>`. Returns `None` for declarations and
/// processing instructions.
fn parse_tag(inner: &str) -> Option<Tag> {
    let inner = inner.trim();
    if inner.starts_with('!') || inner.starts_with('?') {
        return None;
    }
    if let Some(end) = inner.strip_prefix('/') {
        let name = end.split_whitespace().next()?.to_ascii_lowercase();
        return Some(Tag::End { name });
    }

    let inner = inner.strip_suffix('/').unwrap_or(inner);
    let name_end = inner
        .find(|c: char| c.is_whitespace())
        .unwrap_or(inner.len());
    let name = inner[..name_end].to_ascii_lowercase();
    if name.is_empty() {
        return None;
    }
    let attrs = attribute_names(&inner[name_end..]);
    Some(Tag::Start { name, attrs })
}

/// Lowercased attribute names, skipping over quoted values.
fn attribute_names(input: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut chars = input.char_indices().peekable();

    loop {
        skip_whitespace(&mut chars);
        let Some(&(start, _)) = chars.peek() else {
            break;
        };
        let mut end = input.len();
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() || c == '=' {
                end = i;
                break;
            }
            chars.next();
        }
        if end > start {
            names.push(input[start..end].to_ascii_lowercase());
        }

        skip_whitespace(&mut chars);
        if chars.peek().is_some_and(|&(_, c)| c == '=') {
            chars.next();
            skip_whitespace(&mut chars);
            skip_value(&mut chars);
        }
    }
    names
}

fn skip_whitespace(chars: &mut Peekable<CharIndices<'_>>) {
    while chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
}

fn skip_value(chars: &mut Peekable<CharIndices<'_>>) {
    match chars.peek().map(|&(_, c)| c) {
        Some(quote @ ('"' | '\'')) => {
            chars.next();
            for (_, c) in chars.by_ref() {
                if c == quote {
                    break;
                }
            }
        }
        _ => {
            while chars.next_if(|&(_, c)| !c.is_whitespace()).is_some() {}
        }
    }
}
