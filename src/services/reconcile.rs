//! Diff and merge of a local and a remote collection.
//!
//! This is the pure half of a sync pass: no I/O, no locking. Both sides are
//! first collapsed to one record per text (first occurrence wins), then split
//! into three disjoint key sets:
//!
//! ```text
//!   only_local   keys the remote does not have
//!   only_remote  keys the local store does not have
//!   both         keys on both sides; a conflict when the categories differ
//! ```

use crate::models::{ConflictPolicy, PushMode, Quote};
use std::collections::{HashMap, HashSet};

/// A key present on both sides with different categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// The local record.
    pub local: Quote,
    /// The remote record.
    pub remote: Quote,
}

/// Result of reconciling one local snapshot with one remote fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// The collection to commit.
    pub records: Vec<Quote>,
    /// Local records the remote lacks (deduplicated, local order).
    pub only_local: Vec<Quote>,
    /// Remote records the local side lacks (deduplicated, remote order).
    pub only_remote: Vec<Quote>,
    /// Divergent keys.
    pub conflicts: Vec<Conflict>,
    /// Records admitted from the remote under the policy.
    pub new_count: usize,
    /// The deduplicated local snapshot the diff ran against.
    local: Vec<Quote>,
}

impl Reconciliation {
    /// Returns the number of divergent keys.
    #[must_use]
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    /// Returns the texts of the divergent keys.
    #[must_use]
    pub fn conflicting_keys(&self) -> Vec<String> {
        self.conflicts.iter().map(|c| c.local.text.clone()).collect()
    }

    /// Returns the records to push back to the remote under `mode`.
    ///
    /// `All` pushes the pre-merge local snapshot, so records discarded by
    /// `server-wins` still reach the remote.
    #[must_use]
    pub fn push_candidates(&self, mode: PushMode) -> Vec<Quote> {
        match mode {
            PushMode::None => Vec::new(),
            PushMode::OnlyLocal => self.only_local.clone(),
            PushMode::All => self.local.clone(),
        }
    }
}

/// Keeps the first record for each text, preserving order.
#[must_use]
pub fn dedup_by_text(records: &[Quote]) -> Vec<Quote> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .iter()
        .filter(|q| seen.insert(q.text.as_str()))
        .cloned()
        .collect()
}

/// Diffs `local` against `remote` and applies `policy`.
///
/// - `server-wins`: the remote collection (deduplicated)
/// - `local-wins`: the local collection (deduplicated); nothing admitted
/// - `merge`: the local collection followed by `only_remote` in remote order;
///   keys on both sides keep the local record
#[must_use]
pub fn reconcile(local: &[Quote], remote: &[Quote], policy: ConflictPolicy) -> Reconciliation {
    let local = dedup_by_text(local);
    let remote = dedup_by_text(remote);

    let local_by_text: HashMap<&str, &Quote> = local.iter().map(|q| (q.key(), q)).collect();
    let remote_by_text: HashMap<&str, &Quote> = remote.iter().map(|q| (q.key(), q)).collect();

    let only_local: Vec<Quote> = local
        .iter()
        .filter(|q| !remote_by_text.contains_key(q.key()))
        .cloned()
        .collect();
    let only_remote: Vec<Quote> = remote
        .iter()
        .filter(|q| !local_by_text.contains_key(q.key()))
        .cloned()
        .collect();
    let conflicts: Vec<Conflict> = local
        .iter()
        .filter_map(|l| {
            remote_by_text
                .get(l.key())
                .filter(|r| r.category != l.category)
                .map(|r| Conflict {
                    local: l.clone(),
                    remote: (*r).clone(),
                })
        })
        .collect();

    let (records, new_count) = match policy {
        ConflictPolicy::ServerWins => (remote.clone(), only_remote.len()),
        ConflictPolicy::LocalWins => (local.clone(), 0),
        ConflictPolicy::Merge => {
            // Shared keys keep the local record; only unseen remote keys are admitted.
            let mut merged = local.clone();
            merged.extend(only_remote.iter().cloned());
            (merged, only_remote.len())
        },
    };

    Reconciliation {
        records,
        only_local,
        only_remote,
        conflicts,
        new_count,
        local,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(text: &str, category: &str) -> Quote {
        Quote::new(text, category).unwrap()
    }

    #[test]
    fn test_merge_keeps_local_version_on_conflict() {
        let r = reconcile(&[q("A", "X")], &[q("A", "Y")], ConflictPolicy::Merge);
        assert_eq!(r.records, vec![q("A", "X")]);
        assert_eq!(r.conflict_count(), 1);
        assert_eq!(r.new_count, 0);
        assert_eq!(r.conflicting_keys(), vec!["A"]);
    }

    #[test]
    fn test_merge_appends_remote_only_in_remote_order() {
        let local = [q("A", "x"), q("B", "x")];
        let remote = [q("D", "y"), q("A", "x"), q("C", "y")];
        let r = reconcile(&local, &remote, ConflictPolicy::Merge);

        assert_eq!(
            r.records,
            vec![q("A", "x"), q("B", "x"), q("D", "y"), q("C", "y")]
        );
        assert_eq!(r.new_count, 2);
        assert_eq!(r.conflict_count(), 0);
        assert_eq!(r.only_local, vec![q("B", "x")]);
    }

    #[test]
    fn test_server_wins_replaces_fully() {
        let r = reconcile(&[q("A", "X")], &[q("B", "Y")], ConflictPolicy::ServerWins);
        assert_eq!(r.records, vec![q("B", "Y")]);
        assert_eq!(r.new_count, 1);
        assert_eq!(r.only_local, vec![q("A", "X")]);
    }

    #[test]
    fn test_local_wins_ignores_remote_additions() {
        let r = reconcile(
            &[q("A", "X")],
            &[q("A", "X"), q("B", "Y")],
            ConflictPolicy::LocalWins,
        );
        assert_eq!(r.records, vec![q("A", "X")]);
        assert_eq!(r.new_count, 0);
        assert_eq!(r.only_remote, vec![q("B", "Y")]);
    }

    #[test]
    fn test_identical_shared_records_are_not_conflicts() {
        let r = reconcile(&[q("A", "X")], &[q("A", "X")], ConflictPolicy::Merge);
        assert_eq!(r.conflict_count(), 0);
        assert_eq!(r.new_count, 0);
    }

    #[test]
    fn test_duplicates_collapse_to_first_occurrence() {
        let local = [q("A", "x"), q("A", "y"), q("B", "x")];
        let remote = [q("C", "z"), q("C", "w")];
        let r = reconcile(&local, &remote, ConflictPolicy::Merge);
        assert_eq!(r.records, vec![q("A", "x"), q("B", "x"), q("C", "z")]);
    }

    #[test]
    fn test_push_candidates() {
        let r = reconcile(
            &[q("A", "x"), q("B", "x")],
            &[q("A", "x"), q("C", "y")],
            ConflictPolicy::ServerWins,
        );
        assert!(r.push_candidates(PushMode::None).is_empty());
        assert_eq!(r.push_candidates(PushMode::OnlyLocal), vec![q("B", "x")]);
        assert_eq!(
            r.push_candidates(PushMode::All),
            vec![q("A", "x"), q("B", "x")]
        );
    }

    #[test]
    fn test_dedup_by_text() {
        let deduped = dedup_by_text(&[q("A", "1"), q("B", "2"), q("A", "3")]);
        assert_eq!(deduped, vec![q("A", "1"), q("B", "2")]);
    }
}
