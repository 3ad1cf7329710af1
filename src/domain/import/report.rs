use serde::Serialize;

use crate::domain::entity::EntityKind;
use crate::domain::record::Record;

/// Outcome of one successful import, reported back to the user.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub entity: EntityKind,

    /// Data rows read from the sheet (header row excluded)
    pub total_rows: usize,

    /// Rows sent to storage
    pub imported: usize,

    /// Header echoes and rows missing required fields
    pub rejected: usize,

    /// Rows collapsed into a later row with the same natural key
    pub duplicates_removed: usize,

    /// Field values dropped by coercion (oversized enum text)
    pub invalid_fields: usize,

    /// Canonical collection re-fetched after the write
    pub records: Vec<Record>,
}

impl ImportReport {
    /// One-line human readable summary, e.g. for a toast notification.
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("{} rows imported", self.imported)];
        if self.duplicates_removed > 0 {
            parts.push(format!(
                "{} duplicate{} merged",
                self.duplicates_removed,
                if self.duplicates_removed == 1 { "" } else { "s" }
            ));
        }
        if self.rejected > 0 {
            parts.push(format!("{} rows skipped", self.rejected));
        }
        if self.invalid_fields > 0 {
            parts.push(format!("{} invalid values cleared", self.invalid_fields));
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(duplicates_removed: usize, rejected: usize, invalid_fields: usize) -> ImportReport {
        ImportReport {
            entity: EntityKind::Employee,
            total_rows: 3,
            imported: 2,
            rejected,
            duplicates_removed,
            invalid_fields,
            records: Vec::new(),
        }
    }

    #[test]
    fn test_summary_mentions_single_duplicate() {
        assert_eq!(report(1, 0, 0).summary(), "2 rows imported, 1 duplicate merged");
    }

    #[test]
    fn test_summary_lists_all_counters() {
        assert_eq!(
            report(2, 1, 1).summary(),
            "2 rows imported, 2 duplicates merged, 1 rows skipped, 1 invalid values cleared"
        );
    }
}
