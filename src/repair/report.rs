//! Statistics from a transcript repair operation.

use serde::Serialize;

/// What a repair pass changed, for caller-side telemetry.
///
/// Orphan drops are the only change that loses information the caller may
/// care about, so those ids are reported individually and in drop order.
/// Placeholder insertion and duplicate removal are counted for completeness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    /// Number of orphan tool results removed.
    pub dropped_orphan_count: usize,
    /// Ids of the removed orphans, in the order they were dropped. An id
    /// appears once per dropped message, so repeats are possible.
    pub dropped_orphan_ids: Vec<String>,
    /// Number of synthetic error results inserted for unanswered tool calls.
    pub inserted_placeholder_count: usize,
    /// Number of duplicate tool results removed.
    pub duplicates_dropped_count: usize,
}

impl RepairReport {
    /// Returns true if the repair pass changed anything.
    pub fn has_changes(&self) -> bool {
        *self != Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_report_has_no_changes() {
        assert!(!RepairReport::default().has_changes());
    }

    #[test]
    fn test_report_with_orphans_has_changes() {
        let report = RepairReport {
            dropped_orphan_count: 1,
            dropped_orphan_ids: vec!["call_orphan".to_string()],
            ..Default::default()
        };
        assert!(report.has_changes());
    }
}
