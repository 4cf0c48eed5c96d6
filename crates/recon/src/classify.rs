use std::collections::BTreeSet;

use crate::dataset::KeyIndex;
use crate::log::ErrorCode;
use crate::value::Key;

/// Structural classification of keys across the two datasets.
///
/// Every list is in ascending key order. A key may appear in more than one
/// list (duplicated on one side and missing from the other).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyClassification {
    pub duplicates_in_actual: Vec<Key>,
    pub duplicates_in_expected: Vec<Key>,
    pub missing_from_actual: Vec<Key>,
    pub excess_in_actual: Vec<Key>,
    matched: Vec<Key>,
}

impl KeyClassification {
    /// Groups in emission order, each tagged with its error code.
    pub fn structural(&self) -> [(ErrorCode, &[Key]); 4] {
        [
            (ErrorCode::DuplicateInActual, self.duplicates_in_actual.as_slice()),
            (ErrorCode::DuplicateInExpected, self.duplicates_in_expected.as_slice()),
            (ErrorCode::MissingFromActual, self.missing_from_actual.as_slice()),
            (ErrorCode::ExcessInActual, self.excess_in_actual.as_slice()),
        ]
    }

    /// Keys present exactly once on both sides.
    pub fn matched(&self) -> &[Key] {
        &self.matched
    }

    /// Keys excluded from cell comparison.
    pub fn unreconcilable(&self) -> BTreeSet<Key> {
        self.structural()
            .into_iter()
            .flat_map(|(_, keys)| keys.iter().cloned())
            .collect()
    }
}

/// Classify keys into duplicated, missing, excess and matched.
pub fn classify(expected: &KeyIndex, actual: &KeyIndex) -> KeyClassification {
    let mut out = KeyClassification::default();

    for (key, rows) in expected.iter() {
        if rows.len() > 1 {
            out.duplicates_in_expected.push(key.clone());
        }
        if !actual.contains(key) {
            out.missing_from_actual.push(key.clone());
        }
    }

    for (key, rows) in actual.iter() {
        if rows.len() > 1 {
            out.duplicates_in_actual.push(key.clone());
        }
        if !expected.contains(key) {
            out.excess_in_actual.push(key.clone());
        }
    }

    out.matched = expected
        .keys()
        .filter(|k| expected.single(k).is_some() && actual.single(k).is_some())
        .cloned()
        .collect();

    out
}
