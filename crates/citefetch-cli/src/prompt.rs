//! Terminal candidate selection.

use std::io::{BufRead, Write};

use citefetch_bib::CanonicalRecord;
use citefetch_core::CandidateSelector;
use indicatif::ProgressBar;
use owo_colors::OwoColorize;

/// Numbered-list selector on stdin/stderr.
///
/// Suspends the batch progress bar while prompting so the list stays
/// readable.
pub struct TerminalSelector {
    bar: ProgressBar,
}

impl TerminalSelector {
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl CandidateSelector for TerminalSelector {
    fn select(&self, candidates: &[CanonicalRecord]) -> Option<usize> {
        self.bar.suspend(|| prompt_selection(candidates))
    }
}

fn prompt_selection(candidates: &[CanonicalRecord]) -> Option<usize> {
    let mut stderr = std::io::stderr().lock();
    for (index, record) in candidates.iter().enumerate() {
        let _ = writeln!(stderr, "{}", format_candidate(index, record));
    }
    let _ = write!(
        stderr,
        "{} [1-{}, empty to skip]: ",
        "pick a match".bold(),
        candidates.len()
    );
    let _ = stderr.flush();

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).ok()?;
    parse_selection(&line, candidates.len())
}

/// Parse a 1-based selection. Empty or out-of-range input cancels.
pub fn parse_selection(input: &str, count: usize) -> Option<usize> {
    let choice: usize = input.trim().parse().ok()?;
    if choice >= 1 && choice <= count {
        Some(choice - 1)
    } else {
        None
    }
}

/// Render one candidate the way the selection list shows it: title line,
/// then authors, then venue details.
pub fn format_candidate(index: usize, record: &CanonicalRecord) -> String {
    let mut lines = vec![format!(
        "  {} {}",
        format!("[{}]", index + 1).bold(),
        record.get("title").unwrap_or("(untitled)")
    )];

    if let Some(authors) = record.authors() {
        lines.push(format!("      {}", authors.join(", ").dimmed()));
    }

    let venue = record
        .get("journal")
        .or_else(|| record.get("booktitle"))
        .or_else(|| record.get("venue"));
    let details: Vec<String> = [
        venue.map(str::to_string),
        record.get("volume").map(|v| format!("Vol. {v}")),
        record.get("number").map(|n| format!("No. {n}")),
        record.get("pages").map(|p| format!("pp. {p}")),
        record.get("year").map(|y| format!("({y})")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !details.is_empty() {
        lines.push(format!("      {}", details.join(", ").dimmed()));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_selection_is_one_based() {
        assert_eq!(parse_selection("1", 3), Some(0));
        assert_eq!(parse_selection(" 3 \n", 3), Some(2));
    }

    #[test]
    fn parse_selection_rejects_out_of_range_and_junk() {
        assert_eq!(parse_selection("0", 3), None);
        assert_eq!(parse_selection("4", 3), None);
        assert_eq!(parse_selection("", 3), None);
        assert_eq!(parse_selection("\n", 3), None);
        assert_eq!(parse_selection("x", 3), None);
    }

    #[test]
    fn format_candidate_shows_venue_details() {
        let mut record = CanonicalRecord::new("article");
        record.set("title", "A Paper");
        record.set("author", "Jane Q. Public and John Smith");
        record.set("journal", "J. Test");
        record.set("volume", "12");
        record.set("year", "2024");

        let rendered = format_candidate(0, &record);
        assert!(rendered.contains("[1]"));
        assert!(rendered.contains("A Paper"));
        assert!(rendered.contains("Jane Q. Public, John Smith"));
        assert!(rendered.contains("J. Test, Vol. 12, (2024)"));
    }
}
