//! Cell equality policy.
//!
//! Rules, in priority order:
//! 1. Two missing values are equal; exactly one missing value differs.
//! 2. With tolerance on and both columns float-typed, two floats are equal
//!    when [`is_close`] holds. An integer and a float are never close.
//! 3. When the column kinds differ, or both columns are `Object`, both values
//!    are compared by their text form (`15.0` vs `"15"` differs).
//! 4. Otherwise values are equal only when exactly equal.

use crate::config::ToleranceConfig;
use crate::value::{ColumnKind, Value};

// ---------------------------------------------------------------------------
// Column context
// ---------------------------------------------------------------------------

/// Declared kinds of the expected and actual column being compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnPair {
    pub expected: ColumnKind,
    pub actual: ColumnKind,
}

impl ColumnPair {
    pub fn new(expected: ColumnKind, actual: ColumnKind) -> Self {
        Self { expected, actual }
    }

    pub fn infer<'a>(
        expected: impl IntoIterator<Item = &'a Value>,
        actual: impl IntoIterator<Item = &'a Value>,
    ) -> Self {
        Self::new(ColumnKind::infer(expected), ColumnKind::infer(actual))
    }

    /// Both columns are float-typed, so tolerance may apply.
    pub fn both_float(&self) -> bool {
        self.expected == ColumnKind::Float && self.actual == ColumnKind::Float
    }

    /// The pair falls back to text comparison for the whole run.
    pub fn textualized(&self) -> bool {
        self.expected != self.actual
            || (self.expected == ColumnKind::Object && self.actual == ColumnKind::Object)
    }
}

// ---------------------------------------------------------------------------
// Comparator
// ---------------------------------------------------------------------------

/// Decides whether an expected/actual cell pair is a discrepancy.
pub trait ValueComparator {
    fn differs(&self, expected: &Value, actual: &Value, columns: &ColumnPair) -> bool;
}

/// The standard policy described in the module docs.
#[derive(Debug, Clone, Default)]
pub struct DefaultComparator {
    tolerance: ToleranceConfig,
}

impl DefaultComparator {
    pub fn new(tolerance: ToleranceConfig) -> Self {
        Self { tolerance }
    }
}

impl ValueComparator for DefaultComparator {
    fn differs(&self, expected: &Value, actual: &Value, columns: &ColumnPair) -> bool {
        match (expected.is_missing(), actual.is_missing()) {
            (true, true) => return false,
            (true, false) | (false, true) => return true,
            (false, false) => {}
        }

        if self.tolerance.enabled && columns.both_float() {
            if let (Value::Float(e), Value::Float(a)) = (expected, actual) {
                if is_close(*a, *e, self.tolerance.rtol, self.tolerance.atol) {
                    return false;
                }
            }
        }

        if columns.textualized() {
            return expected.to_text() != actual.to_text();
        }

        expected != actual
    }
}

/// `|a - b| <= atol + rtol * |b|`; `b` is the reference value.
pub fn is_close(a: f64, b: f64, rtol: f64, atol: f64) -> bool {
    if a == b {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    (a - b).abs() <= atol + rtol * b.abs()
}

/// Compare one pair as if each value formed its own column.
pub fn differs(expected: &Value, actual: &Value, tolerance_enabled: bool) -> bool {
    let comparator = DefaultComparator::new(ToleranceConfig {
        enabled: tolerance_enabled,
        ..ToleranceConfig::default()
    });
    let columns = ColumnPair::infer([expected], [actual]);
    comparator.differs(expected, actual, &columns)
}

/// Mismatch mask over two aligned columns: `true` where the values differ.
pub fn compare_columns<C: ValueComparator + ?Sized>(
    comparator: &C,
    columns: &ColumnPair,
    expected: &[&Value],
    actual: &[&Value],
) -> Vec<bool> {
    debug_assert_eq!(expected.len(), actual.len(), "columns must be aligned");
    expected
        .iter()
        .zip(actual)
        .map(|(e, a)| comparator.differs(e, a, columns))
        .collect()
}
