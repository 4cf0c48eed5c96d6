//! Discrepancy records and the append-only log that accumulates them.
//!
//! The log is an arena of records in discovery order plus an index from key
//! to the positions of that key's records. Both are updated by the same
//! `append`, so the grouped view never drifts from the flat log.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::error::{ReconError, Result};
use crate::summary::ReconSummary;
use crate::value::{Key, Value};

// ---------------------------------------------------------------------------
// Error codes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCode {
    /// Actual value does not match the expected one.
    ValueMismatch = 1,
    /// Key appears more than once in actual data.
    DuplicateInActual = 2,
    /// Key appears more than once in expected data.
    DuplicateInExpected = 3,
    /// Key is expected but absent from actual data.
    MissingFromActual = 4,
    /// Key is in actual data but was not expected.
    ExcessInActual = 5,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 5] = [
        ErrorCode::ValueMismatch,
        ErrorCode::DuplicateInActual,
        ErrorCode::DuplicateInExpected,
        ErrorCode::MissingFromActual,
        ErrorCode::ExcessInActual,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Codes 2-5 concern a whole key rather than a cell.
    pub fn is_structural(self) -> bool {
        self != ErrorCode::ValueMismatch
    }

    pub fn default_message(self, key_column: &str) -> String {
        match self {
            Self::ValueMismatch => "wrong value".to_string(),
            Self::DuplicateInActual => format!("Duplicated {key_column} in actual data"),
            Self::DuplicateInExpected => format!("Duplicated {key_column} in expected data"),
            Self::MissingFromActual => "Missing row in actual data".to_string(),
            Self::ExcessInActual => "Excessive row in actual data".to_string(),
        }
    }
}

impl TryFrom<u8> for ErrorCode {
    type Error = ReconError;

    fn try_from(code: u8) -> Result<Self> {
        ErrorCode::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| ReconError::Validation(format!("unknown error code {code}")))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One finding. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscrepancyRecord {
    key: Key,
    code: ErrorCode,
    message: String,
    column: Option<String>,
    expected: Option<Value>,
    actual: Option<Value>,
}

impl DiscrepancyRecord {
    /// Build a record, checking that the optional fields fit the code.
    pub fn new(
        key: Key,
        code: ErrorCode,
        message: impl Into<String>,
        column: Option<String>,
        expected: Option<Value>,
        actual: Option<Value>,
    ) -> Result<Self> {
        let record = Self {
            key,
            code,
            message: message.into(),
            column,
            expected,
            actual,
        };
        record.validate()?;
        Ok(record)
    }

    pub fn value_mismatch(
        key: Key,
        column: impl Into<String>,
        expected: Value,
        actual: Value,
    ) -> Self {
        Self {
            key,
            code: ErrorCode::ValueMismatch,
            message: ErrorCode::ValueMismatch.default_message(""),
            column: Some(column.into()),
            expected: Some(expected),
            actual: Some(actual),
        }
    }

    /// A key-level finding (codes 2-5).
    pub fn structural(key: Key, code: ErrorCode, key_column: &str) -> Result<Self> {
        Self::new(key, code, code.default_message(key_column), None, None, None)
    }

    pub fn validate(&self) -> Result<()> {
        let filled = [
            self.column.is_some(),
            self.expected.is_some(),
            self.actual.is_some(),
        ];
        if self.code.is_structural() {
            if filled.iter().any(|f| *f) {
                return Err(ReconError::Validation(format!(
                    "key {}: error code {} must not carry column or values",
                    self.key, self.code
                )));
            }
        } else if !filled.iter().all(|f| *f) {
            return Err(ReconError::Validation(format!(
                "key {}: error code 1 requires column_name, expected_value and actual_value",
                self.key
            )));
        }
        Ok(())
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn expected(&self) -> Option<&Value> {
        self.expected.as_ref()
    }

    pub fn actual(&self) -> Option<&Value> {
        self.actual.as_ref()
    }
}

impl Serialize for DiscrepancyRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("DiscrepancyRecord", 5)?;
        s.serialize_field("error_message", &self.message)?;
        s.serialize_field("error_code", &self.code)?;
        s.serialize_field("column_name", &self.column)?;
        s.serialize_field("expected_value", &self.expected)?;
        s.serialize_field("actual_value", &self.actual)?;
        s.end()
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Destination for records as they are discovered.
pub trait DiscrepancySink {
    fn append(&mut self, record: DiscrepancyRecord) -> Result<()>;
}

impl<A: DiscrepancySink, B: DiscrepancySink> DiscrepancySink for (A, B) {
    fn append(&mut self, record: DiscrepancyRecord) -> Result<()> {
        self.0.append(record.clone())?;
        self.1.append(record)
    }
}

impl<S: DiscrepancySink + ?Sized> DiscrepancySink for &mut S {
    fn append(&mut self, record: DiscrepancyRecord) -> Result<()> {
        (**self).append(record)
    }
}

// ---------------------------------------------------------------------------
// Log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct DiscrepancyLog {
    records: Vec<DiscrepancyRecord>,
    by_key: BTreeMap<Key, Vec<usize>>,
}

impl DiscrepancyLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn snapshot(&self) -> DiscrepancySnapshot {
        DiscrepancySnapshot {
            records: self.records.clone(),
            by_key: self.by_key.clone(),
        }
    }
}

impl DiscrepancySink for DiscrepancyLog {
    fn append(&mut self, record: DiscrepancyRecord) -> Result<()> {
        record.validate()?;
        let pos = self.records.len();
        self.by_key.entry(record.key.clone()).or_default().push(pos);
        self.records.push(record);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Read-only copy of a log at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscrepancySnapshot {
    records: Vec<DiscrepancyRecord>,
    by_key: BTreeMap<Key, Vec<usize>>,
}

impl DiscrepancySnapshot {
    /// All records in discovery order.
    pub fn records(&self) -> &[DiscrepancyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keys with at least one record, ascending.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.by_key.keys()
    }

    /// Records for `key` in discovery order.
    pub fn for_key<'a>(&'a self, key: &Key) -> impl Iterator<Item = &'a DiscrepancyRecord> + 'a {
        self.by_key
            .get(key)
            .into_iter()
            .flatten()
            .map(move |&pos| &self.records[pos])
    }

    pub fn summary(&self) -> ReconSummary {
        ReconSummary::from_records(&self.records)
    }

    /// Serializable `{key: {"errors": [...]}}` view.
    pub fn grouped(&self) -> GroupedView<'_> {
        GroupedView { snapshot: self }
    }
}

pub struct GroupedView<'a> {
    snapshot: &'a DiscrepancySnapshot,
}

#[derive(Serialize)]
struct KeyErrors<'a> {
    errors: Vec<&'a DiscrepancyRecord>,
}

impl Serialize for GroupedView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.snapshot.by_key.len()))?;
        for key in self.snapshot.keys() {
            let errors = KeyErrors {
                errors: self.snapshot.for_key(key).collect(),
            };
            map.serialize_entry(&key.to_string(), &errors)?;
        }
        map.end()
    }
}
