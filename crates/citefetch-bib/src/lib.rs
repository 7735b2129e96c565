//! BibTeX normalization: raw upstream BibTeX text into a canonical
//! tagged-field record.
//!
//! Upstream sources emit a single BibTeX entry per lookup, often spread
//! across several lines with irregular indentation. [`parse_entry`] collapses
//! the whitespace, parses the first entry, and returns a [`CanonicalRecord`]
//! whose field set drives the downstream reconciler.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BibError {
    #[error("input is not a BibTeX entry")]
    NotAnEntry,
    #[error("BibTeX parse error: {0}")]
    Parse(String),
    #[error("no entries found")]
    NoEntries,
}

/// The author-list separator mandated by BibTeX.
pub const AUTHOR_SEPARATOR: &str = " and ";

/// A normalized BibTeX-derived record.
///
/// `entry_type` is the lowercased tag (`article`, `inproceedings`, ...).
/// Field keys are lowercased; values keep their original casing and
/// punctuation. An absent key means "no data" — empty values are never
/// stored, so `get` returning `None` is the only "do not touch" signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRecord {
    pub entry_type: String,
    pub fields: BTreeMap<String, String>,
}

impl CanonicalRecord {
    pub fn new(entry_type: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into().to_lowercase(),
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Store a field. Empty (or whitespace-only) values are dropped rather
    /// than stored, keeping "absent" and "empty" the same thing.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if !value.trim().is_empty() {
            self.fields.insert(name.to_lowercase(), value);
        }
    }

    /// Store a field only if it is not already present. Used to merge
    /// secondary metadata (e.g. DBLP hit info) under the parsed BibTeX.
    pub fn set_if_absent(&mut self, name: &str, value: impl Into<String>) {
        let key = name.to_lowercase();
        if self.fields.contains_key(&key) {
            return;
        }
        let value = value.into();
        if !value.trim().is_empty() {
            self.fields.insert(key, value);
        }
    }

    /// The author list, split on the literal `" and "` separator.
    pub fn authors(&self) -> Option<Vec<&str>> {
        self.get("author").map(|a| {
            a.split(AUTHOR_SEPARATOR)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect()
        })
    }
}

static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static ENTRY_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\s*([A-Za-z]+)\s*[({]").unwrap());

/// Parse one BibTeX entry into a [`CanonicalRecord`].
///
/// Whitespace runs (including newlines) are collapsed to single spaces
/// before structural parsing, so reformatting an entry never changes the
/// result. If the input holds several entries only the first is used.
/// Callers should treat an `Err` as "no data available", not a hard error.
pub fn parse_entry(raw: &str) -> Result<CanonicalRecord, BibError> {
    let collapsed = WS_RE.replace_all(raw.trim(), " ").to_string();

    let entry_type = ENTRY_TAG_RE
        .captures(&collapsed)
        .map(|c| c[1].to_lowercase())
        .ok_or(BibError::NotAnEntry)?;

    let bibliography =
        biblatex::Bibliography::parse(&collapsed).map_err(|e| BibError::Parse(e.to_string()))?;
    let entry = bibliography.iter().next().ok_or(BibError::NoEntries)?;

    let mut record = CanonicalRecord::new(entry_type);
    for (name, chunks) in &entry.fields {
        record.set(name, chunks_to_string(chunks));
    }
    Ok(record)
}

/// Convert biblatex chunks to a plain string.
fn chunks_to_string(chunks: &[biblatex::Spanned<biblatex::Chunk>]) -> String {
    chunks
        .iter()
        .map(|c| match &c.v {
            biblatex::Chunk::Normal(s) => s.as_str(),
            biblatex::Chunk::Verbatim(s) => s.as_str(),
            biblatex::Chunk::Math(s) => s.as_str(),
        })
        .collect::<Vec<_>>()
        .join("")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"@inproceedings{DBLP:conf/test/Example24,
  author    = {Jane Q. Public and
               John Smith},
  title     = {A Study of Canonical Records},
  booktitle = {Proceedings of the 41st Conference on Examples},
  pages     = {1--10},
  year      = {2024}
}"#;

    #[test]
    fn parses_basic_entry() {
        let record = parse_entry(SAMPLE).unwrap();
        assert_eq!(record.entry_type, "inproceedings");
        assert_eq!(record.get("title"), Some("A Study of Canonical Records"));
        assert_eq!(record.get("year"), Some("2024"));
        assert_eq!(record.get("pages"), Some("1--10"));
    }

    #[test]
    fn author_list_uses_and_separator() {
        let record = parse_entry(SAMPLE).unwrap();
        assert_eq!(
            record.authors().unwrap(),
            vec!["Jane Q. Public", "John Smith"]
        );
    }

    #[test]
    fn whitespace_insensitive() {
        let reformatted = SAMPLE.replace("\n  ", "\n\t\t  ").replace(" = ", "\n=\n");
        let a = parse_entry(SAMPLE).unwrap();
        let b = parse_entry(&reformatted).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn multiline_values_are_collapsed() {
        let record = parse_entry(SAMPLE).unwrap();
        assert_eq!(
            record.get("author"),
            Some("Jane Q. Public and John Smith")
        );
    }

    #[test]
    fn value_casing_preserved() {
        let record = parse_entry(
            "@article{k, title = {IEEE Security \\& Privacy: A SURVEY}, journal = {J. Test}}",
        )
        .unwrap();
        let title = record.get("title").unwrap();
        assert!(title.contains("SURVEY"));
        assert_eq!(record.get("journal"), Some("J. Test"));
    }

    #[test]
    fn first_entry_wins() {
        let two = format!("{SAMPLE}\n@article{{k2, title = {{Second Entry}}, year = {{1999}}}}");
        let record = parse_entry(&two).unwrap();
        assert_eq!(record.entry_type, "inproceedings");
        assert_eq!(record.get("title"), Some("A Study of Canonical Records"));
    }

    #[test]
    fn rejects_non_bibtex_input() {
        assert!(parse_entry("this is just prose, no entry here").is_err());
        assert!(parse_entry("").is_err());
    }

    #[test]
    fn missing_field_is_absent_not_empty() {
        let record = parse_entry("@misc{k, title = {Untitled Note}}").unwrap();
        assert_eq!(record.get("journal"), None);
    }

    #[test]
    fn empty_values_are_dropped() {
        let record = parse_entry("@misc{k, title = {Untitled Note}, note = {}}").unwrap();
        assert_eq!(record.get("note"), None);
    }

    #[test]
    fn set_if_absent_does_not_overwrite() {
        let mut record = CanonicalRecord::new("article");
        record.set("venue", "CACM");
        record.set_if_absent("venue", "Other");
        record.set_if_absent("url", "https://example.org/x");
        assert_eq!(record.get("venue"), Some("CACM"));
        assert_eq!(record.get("url"), Some("https://example.org/x"));
    }

    #[test]
    fn keys_are_case_normalized() {
        let mut record = CanonicalRecord::new("Article");
        record.set("Title", "X");
        assert_eq!(record.entry_type, "article");
        assert_eq!(record.get("title"), Some("X"));
        assert_eq!(record.get("TITLE"), Some("X"));
    }
}
