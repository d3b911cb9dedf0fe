//! Sync pass results.

use super::ConflictPolicy;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counts reported by a completed sync pass. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    /// Records admitted from the remote (0 under `local-wins`).
    pub new_count: usize,
    /// Keys present on both sides with a different category.
    pub conflict_count: usize,
    /// When the merged collection was committed.
    pub merged_at: DateTime<Utc>,
}

impl SyncResult {
    /// Returns true if the pass found anything worth telling the caller about.
    #[must_use]
    pub const fn has_divergence(&self) -> bool {
        self.new_count > 0 || self.conflict_count > 0
    }

    /// Returns a human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.has_divergence() {
            format!(
                "Fetched {} new quotes from server, {} conflicts.",
                self.new_count, self.conflict_count
            )
        } else {
            "Already up to date".to_string()
        }
    }
}

/// Outcome of the optional push-back step.
///
/// Pushing stops at the first failure; already pushed records stay pushed and
/// the merge that preceded the push is never reversed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushReport {
    /// Records selected for pushing.
    pub attempted: usize,
    /// Records the remote accepted.
    pub pushed: usize,
    /// The failure that stopped the push, if any.
    pub error: Option<String>,
}

impl PushReport {
    /// Returns true if every selected record was pushed.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.error.is_none() && self.pushed == self.attempted
    }
}

/// Everything a sync pass produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// The policy the pass ran under.
    pub policy: ConflictPolicy,
    /// Merge counts.
    pub result: SyncResult,
    /// Push-back outcome, `None` when pushing is disabled.
    pub push: Option<PushReport>,
}

/// What a call to `SyncEngine::sync` amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// This call ran a full sync pass.
    Applied(SyncReport),
    /// Another pass was already in flight; this call waited for it and did nothing.
    Coalesced,
}

impl SyncOutcome {
    /// Returns the report if this call applied a pass.
    #[must_use]
    pub const fn report(&self) -> Option<&SyncReport> {
        match self {
            Self::Applied(report) => Some(report),
            Self::Coalesced => None,
        }
    }

    /// Returns the merge counts if this call applied a pass.
    #[must_use]
    pub fn result(&self) -> Option<SyncResult> {
        self.report().map(|report| report.result)
    }

    /// Returns true if the call was folded into an in-flight pass.
    #[must_use]
    pub const fn is_coalesced(&self) -> bool {
        matches!(self, Self::Coalesced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(new_count: usize, conflict_count: usize) -> SyncResult {
        SyncResult {
            new_count,
            conflict_count,
            merged_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_up_to_date() {
        let r = result(0, 0);
        assert!(!r.has_divergence());
        assert_eq!(r.summary(), "Already up to date");
    }

    #[test]
    fn test_summary_with_divergence() {
        let r = result(3, 1);
        assert!(r.has_divergence());
        assert!(r.summary().contains("3 new quotes"));
        assert!(r.summary().contains("1 conflicts"));
    }

    #[test]
    fn test_push_report_complete() {
        let report = PushReport {
            attempted: 2,
            pushed: 2,
            error: None,
        };
        assert!(report.is_complete());

        let report = PushReport {
            attempted: 2,
            pushed: 1,
            error: Some("timeout".to_string()),
        };
        assert!(!report.is_complete());
    }

    #[test]
    fn test_outcome_accessors() {
        assert!(SyncOutcome::Coalesced.is_coalesced());
        assert!(SyncOutcome::Coalesced.report().is_none());

        let outcome = SyncOutcome::Applied(SyncReport {
            policy: ConflictPolicy::Merge,
            result: result(1, 0),
            push: None,
        });
        assert!(!outcome.is_coalesced());
        assert_eq!(outcome.result().map(|r| r.new_count), Some(1));
    }
}
