//! Candidate disambiguation seam.
//!
//! The pipeline only needs "present N candidates, get back one index or
//! none"; how that happens (terminal prompt, GUI list, scripted test) is the
//! implementor's business.

use citefetch_bib::CanonicalRecord;

pub trait CandidateSelector {
    /// Pick one of `candidates`, or `None` to cancel the update.
    fn select(&self, candidates: &[CanonicalRecord]) -> Option<usize>;
}

/// Always picks the first candidate. For non-interactive runs.
pub struct FirstCandidate;

impl CandidateSelector for FirstCandidate {
    fn select(&self, candidates: &[CanonicalRecord]) -> Option<usize> {
        if candidates.is_empty() { None } else { Some(0) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_candidate_picks_index_zero() {
        let candidates = vec![CanonicalRecord::new("article")];
        assert_eq!(FirstCandidate.select(&candidates), Some(0));
        assert_eq!(FirstCandidate.select(&[]), None);
    }
}
