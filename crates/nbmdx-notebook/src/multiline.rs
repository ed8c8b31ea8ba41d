//! nbformat "multiline string" fields.
//!
//! nbformat allows text fields to be stored either as one string or as a
//! list of lines (each keeping its trailing newline). Both forms deserialize
//! to a single `String`; serialization always writes the single-string form.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Multiline {
    One(String),
    Lines(Vec<String>),
}

impl From<Multiline> for String {
    fn from(value: Multiline) -> Self {
        match value {
            Multiline::One(s) => s,
            Multiline::Lines(lines) => lines.concat(),
        }
    }
}

pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Multiline::deserialize(deserializer).map(String::from)
}
