use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::classify::classify;
use crate::compare::{compare_columns, ColumnPair, DefaultComparator, ValueComparator};
use crate::config::ReconConfig;
use crate::dataset::{Dataset, KeyIndex};
use crate::error::{ReconError, Result};
use crate::log::{DiscrepancyLog, DiscrepancyRecord, DiscrepancySink, DiscrepancySnapshot};
use crate::summary::ReconSummary;
use crate::value::{ColumnKind, Key, Value};

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Shared flag checked between engine steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Both datasets after normalization, column and key selection, before pruning.
/// Report renderers need these to show rows that were never cell-compared.
#[derive(Debug, Clone)]
pub struct Narrowed {
    pub expected: Dataset,
    pub actual: Dataset,
}

#[derive(Debug, Clone)]
pub struct ReconOutcome {
    pub snapshot: DiscrepancySnapshot,
    pub summary: ReconSummary,
    pub expected: Dataset,
    pub actual: Dataset,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Reconciler {
    config: ReconConfig,
    comparator: Box<dyn ValueComparator + Send + Sync>,
    cancel: Option<CancelToken>,
}

impl Reconciler {
    pub fn new(config: ReconConfig) -> Result<Self> {
        let config = config.normalized();
        config.validate()?;
        let comparator = Box::new(DefaultComparator::new(config.tolerance.clone()));
        Ok(Self {
            config,
            comparator,
            cancel: None,
        })
    }

    /// Replace the cell equality policy.
    pub fn with_comparator<C>(mut self, comparator: C) -> Self
    where
        C: ValueComparator + Send + Sync + 'static,
    {
        self.comparator = Box::new(comparator);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    /// Reconcile into a fresh log and return its snapshot.
    pub fn run(&self, expected: &Dataset, actual: &Dataset) -> Result<ReconOutcome> {
        let mut log = DiscrepancyLog::new();
        let narrowed = self.run_into(expected, actual, &mut log)?;
        let snapshot = log.snapshot();
        Ok(ReconOutcome {
            summary: snapshot.summary(),
            snapshot,
            expected: narrowed.expected,
            actual: narrowed.actual,
        })
    }

    /// Reconcile, appending every finding to `sink` as it is discovered.
    ///
    /// Records appended before an error or cancellation stay in the sink.
    pub fn run_into<S>(&self, expected: &Dataset, actual: &Dataset, sink: &mut S) -> Result<Narrowed>
    where
        S: DiscrepancySink + ?Sized,
    {
        let key_column = self.config.key_column.as_str();

        // 1. Normalize
        self.checkpoint("normalize")?;
        let mut expected = expected.clone();
        let mut actual = actual.clone();
        expected.lowercase_columns();
        actual.lowercase_columns();

        // 2. Column selection
        self.checkpoint("select_columns")?;
        let (mut expected, mut actual) = self.select_columns(expected, actual)?;
        let compare_cols: Vec<String> = actual
            .columns()
            .iter()
            .filter(|c| *c != key_column)
            .cloned()
            .collect();
        let kinds = column_kinds(&expected, &actual, &compare_cols);
        debug!(columns = compare_cols.len(), "columns selected");

        // 3. Key selection
        self.checkpoint("select_keys")?;
        if let Some(keys) = &self.config.keys {
            let allowed: BTreeSet<Key> = keys.iter().cloned().collect();
            expected.retain_keys(key_column, &allowed);
            actual.retain_keys(key_column, &allowed);
            debug!(
                keys = allowed.len(),
                expected_rows = expected.len(),
                actual_rows = actual.len(),
                "keys selected"
            );
        }

        // 4. Index
        self.checkpoint("index")?;
        let mut expected_index = expected.index_by(key_column);
        let mut actual_index = actual.index_by(key_column);
        debug!(
            expected_keys = expected_index.len(),
            actual_keys = actual_index.len(),
            "datasets indexed"
        );

        // 5. Structural reconciliation
        self.checkpoint("classify")?;
        let classification = classify(&expected_index, &actual_index);
        for (code, keys) in classification.structural() {
            for key in keys {
                sink.append(DiscrepancyRecord::structural(key.clone(), code, key_column)?)?;
            }
            debug!(code = code.code(), count = keys.len(), "structural findings");
        }

        // 6. Prune
        self.checkpoint("prune")?;
        for key in classification.unreconcilable() {
            expected_index.remove(&key);
            actual_index.remove(&key);
        }
        let matched = classification.matched();
        debug_assert!(expected_index.keys().eq(matched.iter()));
        debug_assert!(actual_index.keys().eq(matched.iter()));

        // 7. Cell-level comparison
        self.checkpoint("compare")?;
        let mut mismatches = 0usize;
        for column in &compare_cols {
            let pair = kinds[column];
            if pair.textualized() {
                debug!(column = %column, ?pair, "comparing column as text");
            }
            let (keys, e_values, a_values) =
                aligned_values(&expected, &actual, &expected_index, &actual_index, matched, column);
            let mask = compare_columns(&*self.comparator, &pair, &e_values, &a_values);
            for ((key, differs), (e, a)) in keys.iter().zip(mask).zip(e_values.iter().zip(&a_values)) {
                if differs {
                    mismatches += 1;
                    sink.append(DiscrepancyRecord::value_mismatch(
                        (*key).clone(),
                        column.clone(),
                        (*e).clone(),
                        (*a).clone(),
                    ))?;
                }
            }
        }

        // 8. Finalize
        info!(
            compared_keys = matched.len(),
            structural = classification.unreconcilable().len(),
            mismatches,
            "reconciliation finished"
        );

        Ok(Narrowed { expected, actual })
    }

    fn checkpoint(&self, step: &'static str) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(ReconError::Cancelled { step }),
            _ => {
                debug!(step, "step");
                Ok(())
            }
        }
    }

    fn select_columns(&self, expected: Dataset, actual: Dataset) -> Result<(Dataset, Dataset)> {
        let key_column = &self.config.key_column;

        match &self.config.columns {
            Some(columns) => {
                let mut wanted = columns.clone();
                if !wanted.contains(key_column) {
                    wanted.push(key_column.clone());
                }
                for ds in [&actual, &expected] {
                    let missing = ds.missing_columns(&wanted);
                    if !missing.is_empty() {
                        return Err(ReconError::MissingColumn {
                            dataset: ds.name().to_string(),
                            columns: missing,
                        });
                    }
                }
                Ok((expected.project(&wanted), actual.project(&wanted)))
            }
            None => {
                let only_in_expected = actual.missing_columns(expected.columns());
                let only_in_actual = expected.missing_columns(actual.columns());
                if !only_in_expected.is_empty() || !only_in_actual.is_empty() {
                    return Err(ReconError::SchemaMismatch {
                        only_in_expected,
                        only_in_actual,
                    });
                }
                for ds in [&actual, &expected] {
                    if !ds.has_column(key_column) {
                        return Err(ReconError::MissingColumn {
                            dataset: ds.name().to_string(),
                            columns: vec![key_column.clone()],
                        });
                    }
                }
                Ok((expected, actual))
            }
        }
    }
}

/// Kind of every compared column, taken over the whole selected column.
fn column_kinds(expected: &Dataset, actual: &Dataset, columns: &[String]) -> HashMap<String, ColumnPair> {
    columns
        .iter()
        .map(|c| {
            let e = (0..expected.len()).map(|r| expected.value(r, c));
            let a = (0..actual.len()).map(|r| actual.value(r, c));
            (c.clone(), ColumnPair::new(ColumnKind::infer(e), ColumnKind::infer(a)))
        })
        .collect()
}

/// Values of `column` for every matched key, in ascending key order.
fn aligned_values<'a>(
    expected: &'a Dataset,
    actual: &'a Dataset,
    expected_index: &KeyIndex,
    actual_index: &KeyIndex,
    matched: &'a [Key],
    column: &str,
) -> (Vec<&'a Key>, Vec<&'a Value>, Vec<&'a Value>) {
    let mut keys = Vec::with_capacity(matched.len());
    let mut e_values = Vec::with_capacity(matched.len());
    let mut a_values = Vec::with_capacity(matched.len());

    for key in matched {
        if let (Some(e_row), Some(a_row)) = (expected_index.single(key), actual_index.single(key)) {
            keys.push(key);
            e_values.push(expected.value(e_row, column));
            a_values.push(actual.value(a_row, column));
        }
    }

    (keys, e_values, a_values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToleranceConfig;
    use crate::log::ErrorCode;

    fn dataset(name: &str, rows: Vec<Vec<(&str, Value)>>) -> Dataset {
        Dataset::from_records(name, rows)
    }

    fn row(id: i64, pclass: i64, fare: f64) -> Vec<(&'static str, Value)> {
        vec![
            ("PassengerId", Value::Int(id)),
            ("Pclass", Value::Int(pclass)),
            ("Fare", Value::Float(fare)),
        ]
    }

    #[test]
    fn identical_datasets_are_clean() {
        let data = dataset("Expected data", vec![row(1, 3, 7.25), row(2, 1, 71.28)]);
        let outcome = Reconciler::new(ReconConfig::new("passengerid"))
            .unwrap()
            .run(&data, &data)
            .unwrap();
        assert!(outcome.snapshot.is_empty());
        assert!(outcome.summary.is_clean());
    }

    #[test]
    fn schema_mismatch_is_fatal() {
        let expected = dataset("Expected data", vec![row(1, 3, 7.25)]);
        let actual = dataset(
            "Actual data",
            vec![vec![("PassengerId", Value::Int(1)), ("Pclass", Value::Int(3))]],
        );
        let err = Reconciler::new(ReconConfig::new("passengerid"))
            .unwrap()
            .run(&expected, &actual)
            .unwrap_err();
        assert_eq!(
            err,
            ReconError::SchemaMismatch {
                only_in_expected: vec!["fare".into()],
                only_in_actual: vec![],
            }
        );
    }

    #[test]
    fn missing_key_column_without_selection() {
        let expected = dataset("Expected data", vec![vec![("id", Value::Int(1))]]);
        let err = Reconciler::new(ReconConfig::new("passengerid"))
            .unwrap()
            .run(&expected, &expected)
            .unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn { .. }));
    }

    #[test]
    fn tolerance_flag_controls_float_columns() {
        let expected = dataset("Expected data", vec![row(1, 3, 7.8542)]);
        let actual = dataset("Actual data", vec![row(1, 3, 7.8542000000000005)]);

        let strict = Reconciler::new(ReconConfig::new("passengerid")).unwrap();
        assert_eq!(strict.run(&expected, &actual).unwrap().snapshot.len(), 1);

        let tolerant = Reconciler::new(
            ReconConfig::new("passengerid").with_tolerance(ToleranceConfig::enabled()),
        )
        .unwrap();
        assert!(tolerant.run(&expected, &actual).unwrap().snapshot.is_empty());
    }

    #[test]
    fn cancelled_before_start() {
        let data = dataset("Expected data", vec![row(1, 3, 7.25)]);
        let token = CancelToken::new();
        token.cancel();
        let err = Reconciler::new(ReconConfig::new("passengerid"))
            .unwrap()
            .with_cancel(token)
            .run(&data, &data)
            .unwrap_err();
        assert_eq!(err, ReconError::Cancelled { step: "normalize" });
    }

    #[test]
    fn value_records_are_column_major_key_ascending() {
        let expected = dataset("Expected data", vec![row(2, 1, 1.0), row(1, 1, 1.0)]);
        let actual = dataset("Actual data", vec![row(1, 2, 2.0), row(2, 2, 2.0)]);
        let outcome = Reconciler::new(ReconConfig::new("passengerid"))
            .unwrap()
            .run(&expected, &actual)
            .unwrap();
        let order: Vec<(String, Option<&str>)> = outcome
            .snapshot
            .records()
            .iter()
            .map(|r| (r.key().to_string(), r.column()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("1".to_string(), Some("pclass")),
                ("2".to_string(), Some("pclass")),
                ("1".to_string(), Some("fare")),
                ("2".to_string(), Some("fare")),
            ]
        );
        assert!(outcome
            .snapshot
            .records()
            .iter()
            .all(|r| r.code() == ErrorCode::ValueMismatch));
    }
}
