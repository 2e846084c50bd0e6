//! Progress filtering against the persisted ledger.

use ingest_common::Ledger;
use tracing::warn;

/// Subtract completed and excluded identifiers from the candidate set,
/// preserving order.
///
/// Completed entries that no longer appear among the candidates are
/// reported as orphans; that is a consistency warning for the operator,
/// not a mutation.
pub fn filter_candidates(candidates: Vec<String>, ledger: &Ledger) -> Vec<String> {
    for doi in ledger.completed() {
        if !candidates.iter().any(|c| c == doi) {
            warn!(%doi, "completed DOI not found among candidates");
        }
    }
    candidates
        .into_iter()
        .filter(|id| !ledger.is_completed(id) && !ledger.is_excluded(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(completed: &[&str], excluded: &[&str]) -> Ledger {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = Ledger::load(
            dir.path().join("completed_dois.json"),
            dir.path().join("excluded_dois.json"),
        )
        .unwrap();
        for doi in completed {
            ledger.mark_completed(doi).unwrap();
        }
        for doi in excluded {
            ledger.mark_excluded(doi).unwrap();
        }
        // The tempdir is gone after this returns; the ledger only needs
        // its in-memory state for filtering.
        ledger
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn filtering_subtracts_both_ledgers() {
        let ledger = ledger_with(&["10.25989/b"], &["10.25989/c"]);
        let candidates = ids(&["10.25989/a", "10.25989/b", "10.25989/c", "10.25989/d"]);

        let remaining = filter_candidates(candidates, &ledger);
        assert_eq!(remaining, ids(&["10.25989/a", "10.25989/d"]));
        for id in &remaining {
            assert!(!ledger.is_completed(id));
            assert!(!ledger.is_excluded(id));
        }
    }

    #[test]
    fn orphaned_entries_do_not_change_the_result() {
        let ledger = ledger_with(&["10.25989/gone"], &["10.25989/also-gone"]);
        let remaining = filter_candidates(ids(&["10.25989/a"]), &ledger);
        assert_eq!(remaining, ids(&["10.25989/a"]));
    }

    #[test]
    fn empty_candidates_stay_empty() {
        let ledger = ledger_with(&["10.25989/b"], &[]);
        assert!(filter_candidates(Vec::new(), &ledger).is_empty());
    }
}
