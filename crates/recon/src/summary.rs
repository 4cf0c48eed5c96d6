use std::collections::BTreeSet;

use serde::Serialize;

use crate::log::{DiscrepancyRecord, ErrorCode};

/// Counts per error code, for the console and JSON output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub total: usize,
    pub value_mismatches: usize,
    pub duplicates_in_actual: usize,
    pub duplicates_in_expected: usize,
    pub missing_from_actual: usize,
    pub excess_in_actual: usize,
    pub keys_with_errors: usize,
}

impl ReconSummary {
    pub fn from_records(records: &[DiscrepancyRecord]) -> Self {
        let mut summary = ReconSummary {
            total: records.len(),
            ..Default::default()
        };
        let mut keys = BTreeSet::new();

        for r in records {
            keys.insert(r.key());
            match r.code() {
                ErrorCode::ValueMismatch => summary.value_mismatches += 1,
                ErrorCode::DuplicateInActual => summary.duplicates_in_actual += 1,
                ErrorCode::DuplicateInExpected => summary.duplicates_in_expected += 1,
                ErrorCode::MissingFromActual => summary.missing_from_actual += 1,
                ErrorCode::ExcessInActual => summary.excess_in_actual += 1,
            }
        }

        summary.keys_with_errors = keys.len();
        summary
    }

    pub fn is_clean(&self) -> bool {
        self.total == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Key, Value};

    #[test]
    fn summary_counts() {
        let records = vec![
            DiscrepancyRecord::structural(Key::Int(41), ErrorCode::DuplicateInExpected, "id").unwrap(),
            DiscrepancyRecord::structural(Key::Int(500), ErrorCode::MissingFromActual, "id").unwrap(),
            DiscrepancyRecord::value_mismatch(Key::Int(90), "pclass", Value::Int(3), Value::Int(5)),
            DiscrepancyRecord::value_mismatch(Key::Int(90), "survived", Value::from("No"), Value::from("Yes")),
        ];
        let summary = ReconSummary::from_records(&records);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.value_mismatches, 2);
        assert_eq!(summary.duplicates_in_expected, 1);
        assert_eq!(summary.missing_from_actual, 1);
        assert_eq!(summary.excess_in_actual, 0);
        assert_eq!(summary.keys_with_errors, 3);
        assert!(!summary.is_clean());
        assert!(ReconSummary::from_records(&[]).is_clean());
    }
}
