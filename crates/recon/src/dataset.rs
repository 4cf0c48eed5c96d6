use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::value::{Key, Value};

static NULL: Value = Value::Null;

/// One row: column name → value. Absent columns read as `Null`.
pub type Row = HashMap<String, Value>;

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// An ordered sequence of flat rows sharing one column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Build from ordered `(column, value)` records. Column order is the
    /// order of first appearance across all records.
    pub fn from_records<I, R, C>(name: impl Into<String>, records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (C, Value)>,
        C: Into<String>,
    {
        let mut dataset = Self::new(name, Vec::new());
        for record in records {
            dataset.push_record(record);
        }
        dataset
    }

    /// Append one row. Columns the dataset does not know yet are added at the end.
    pub fn push_record<R, C>(&mut self, record: R)
    where
        R: IntoIterator<Item = (C, Value)>,
        C: Into<String>,
    {
        let mut row = Row::new();
        for (column, value) in record {
            let column = column.into();
            if !self.columns.contains(&column) {
                self.columns.push(column.clone());
            }
            row.insert(column, value);
        }
        self.rows.push(row);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Value at `(row, column)`; `Null` when the row lacks the column.
    pub fn value(&self, row: usize, column: &str) -> &Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&NULL)
    }

    /// Lowercase every column name. When two names collide, the column that
    /// comes later in column order wins.
    pub fn lowercase_columns(&mut self) {
        let original = std::mem::take(&mut self.columns);
        for column in &original {
            let lower = column.to_lowercase();
            if self.columns.contains(&lower) {
                tracing::warn!(dataset = %self.name, column = %lower, "duplicate column after lowercasing");
            } else {
                self.columns.push(lower);
            }
        }

        for row in &mut self.rows {
            let mut lowered = Row::with_capacity(row.len());
            for column in &original {
                if let Some(value) = row.remove(column) {
                    lowered.insert(column.to_lowercase(), value);
                }
            }
            *row = lowered;
        }
    }

    /// Columns from `wanted` that this dataset lacks, in `wanted` order.
    pub fn missing_columns(&self, wanted: &[String]) -> Vec<String> {
        wanted
            .iter()
            .filter(|c| !self.has_column(c))
            .cloned()
            .collect()
    }

    /// Copy restricted to `columns` (deduplicated, in the given order).
    pub fn project(&self, columns: &[String]) -> Dataset {
        let mut kept: Vec<String> = Vec::with_capacity(columns.len());
        for column in columns {
            if !kept.contains(column) {
                kept.push(column.clone());
            }
        }

        let rows = self
            .rows
            .iter()
            .map(|row| {
                kept.iter()
                    .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
                    .collect()
            })
            .collect();

        Dataset {
            name: self.name.clone(),
            columns: kept,
            rows,
        }
    }

    /// Keep only rows whose key is in `keys`.
    pub fn retain_keys(&mut self, key_column: &str, keys: &BTreeSet<Key>) {
        self.rows
            .retain(|row| keys.contains(&Key::from_value(row.get(key_column).unwrap_or(&NULL))));
    }

    /// Group row positions by key, preserving multiplicity. Rows without a key
    /// value are grouped under [`Key::Missing`].
    pub fn index_by(&self, key_column: &str) -> KeyIndex {
        let mut entries: BTreeMap<Key, Vec<usize>> = BTreeMap::new();
        for (pos, row) in self.rows.iter().enumerate() {
            let key = Key::from_value(row.get(key_column).unwrap_or(&NULL));
            entries.entry(key).or_default().push(pos);
        }
        let index = KeyIndex { entries };
        let unkeyed = index.positions(&Key::Missing).len();
        if unkeyed > 0 {
            tracing::warn!(dataset = %self.name, column = key_column, rows = unkeyed, "rows without a key value");
        }
        index
    }
}

// ---------------------------------------------------------------------------
// Key index
// ---------------------------------------------------------------------------

/// Key → row positions, ordered by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyIndex {
    entries: BTreeMap<Key, Vec<usize>>,
}

impl KeyIndex {
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &[usize])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    pub fn positions(&self, key: &Key) -> &[usize] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The only row for `key`, or `None` if the key is absent or duplicated.
    pub fn single(&self, key: &Key) -> Option<usize> {
        match self.positions(key) {
            [pos] => Some(*pos),
            _ => None,
        }
    }

    pub fn remove(&mut self, key: &Key) -> Option<Vec<usize>> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passengers() -> Dataset {
        Dataset::from_records(
            "Expected data",
            vec![
                vec![("PassengerId", Value::Int(90)), ("Pclass", Value::Int(3))],
                vec![("PassengerId", Value::Int(41)), ("Pclass", Value::Int(1))],
                vec![("PassengerId", Value::Int(41)), ("Pclass", Value::Int(1))],
            ],
        )
    }

    #[test]
    fn lowercase_renames_rows_and_columns() {
        let mut ds = passengers();
        ds.lowercase_columns();
        assert_eq!(ds.columns(), &["passengerid".to_string(), "pclass".to_string()]);
        assert_eq!(ds.value(0, "pclass"), &Value::Int(3));
        assert_eq!(ds.value(0, "Pclass"), &Value::Null);
    }

    #[test]
    fn index_preserves_multiplicity() {
        let mut ds = passengers();
        ds.lowercase_columns();
        let index = ds.index_by("passengerid");
        assert_eq!(index.len(), 2);
        assert_eq!(index.positions(&Key::Int(41)), &[1, 2]);
        assert_eq!(index.single(&Key::Int(90)), Some(0));
        assert_eq!(index.single(&Key::Int(41)), None);
        assert_eq!(index.keys().collect::<Vec<_>>(), vec![&Key::Int(41), &Key::Int(90)]);
    }

    #[test]
    fn rows_without_key_share_missing_key() {
        let ds = Dataset::from_records(
            "Actual data",
            vec![
                vec![("id", Value::Int(1))],
                vec![("id", Value::Null)],
                vec![("id", Value::Float(f64::NAN))],
                vec![("id", Value::Float(1.0))],
            ],
        );
        let index = ds.index_by("id");
        assert_eq!(index.positions(&Key::Missing), &[1, 2]);
        assert_eq!(index.positions(&Key::Int(1)), &[0, 3]);
        assert_eq!(index.keys().last(), Some(&Key::Missing));
    }

    #[test]
    fn explicit_columns_survive_without_rows() {
        let mut ds = Dataset::new("Expected data", vec!["PassengerId".into(), "Pclass".into()]);
        assert!(ds.is_empty());
        ds.lowercase_columns();
        assert_eq!(ds.columns(), &["passengerid".to_string(), "pclass".to_string()]);

        ds.push_record([("pclass", Value::Int(3)), ("passengerid", Value::Int(90))]);
        assert_eq!(ds.columns(), &["passengerid".to_string(), "pclass".to_string()]);
        assert_eq!(ds.value(0, "pclass"), &Value::Int(3));
    }

    #[test]
    fn project_and_missing_columns() {
        let mut ds = passengers();
        ds.lowercase_columns();
        let wanted = vec!["pclass".to_string(), "age".to_string()];
        assert_eq!(ds.missing_columns(&wanted), vec!["age".to_string()]);

        let projected = ds.project(&["passengerid".to_string()]);
        assert_eq!(projected.columns(), &["passengerid".to_string()]);
        assert_eq!(projected.value(0, "pclass"), &Value::Null);
    }

    #[test]
    fn retain_keys_filters_rows() {
        let mut ds = passengers();
        ds.lowercase_columns();
        ds.retain_keys("passengerid", &BTreeSet::from([Key::Int(90)]));
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.value(0, "passengerid"), &Value::Int(90));
    }
}
