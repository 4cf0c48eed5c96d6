// Report layout: which cells of the actual data get marked, and how.
//
// Pure data; the Excel writer only paints what this module decides.

use datarecon_recon::{Dataset, DiscrepancySnapshot, ErrorCode, Key, Value};

pub const MESSAGE_COLUMN: &str = "error_message";

#[derive(Debug, Clone, PartialEq)]
pub struct RenderCell {
    pub value: Value,
    /// Replacement text for a mismatched cell.
    pub note: Option<String>,
    pub style: Option<ErrorCode>,
}

impl RenderCell {
    fn plain(value: Value) -> Self {
        Self { value, note: None, style: None }
    }

    /// What the cell shows.
    pub fn text(&self) -> String {
        match &self.note {
            Some(note) => note.clone(),
            None if self.value.is_missing() => String::new(),
            None => self.value.to_text(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderRow {
    pub key: Key,
    pub cells: Vec<RenderCell>,
    pub message: Option<String>,
}

/// Headers (key column first, `error_message` last) and styled rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub headers: Vec<String>,
    pub rows: Vec<RenderRow>,
}

impl RenderPlan {
    /// Lay out `actual` in key order, marking every recorded discrepancy, then
    /// append the expected rows that actual data lacks.
    pub fn build(
        snapshot: &DiscrepancySnapshot,
        actual: &Dataset,
        expected: &Dataset,
        key_column: &str,
    ) -> Self {
        let columns: Vec<String> = std::iter::once(key_column.to_string())
            .chain(actual.columns().iter().filter(|c| *c != key_column).cloned())
            .collect();

        // Key order; rows without a key value come last.
        let mut rows: Vec<RenderRow> = Vec::with_capacity(actual.len());
        for (key, positions) in actual.index_by(key_column).iter() {
            for &pos in positions {
                let cells = columns.iter().map(|c| RenderCell::plain(actual.value(pos, c).clone())).collect();
                let mut row = RenderRow { key: key.clone(), cells, message: None };
                mark_row(&mut row, snapshot, key, &columns);
                rows.push(row);
            }
        }

        let expected_index = expected.index_by(key_column);
        for record in snapshot.records() {
            if record.code() != ErrorCode::MissingFromActual {
                continue;
            }
            let source = expected_index.positions(record.key()).first().copied();
            let cells = columns
                .iter()
                .map(|c| {
                    let value = if c == key_column {
                        record.key().to_value()
                    } else {
                        source.map(|pos| expected.value(pos, c).clone()).unwrap_or(Value::Null)
                    };
                    RenderCell {
                        value,
                        note: None,
                        style: Some(ErrorCode::MissingFromActual),
                    }
                })
                .collect();
            rows.push(RenderRow {
                key: record.key().clone(),
                cells,
                message: Some(record.message().to_string()),
            });
        }

        let mut headers = columns;
        headers.push(MESSAGE_COLUMN.to_string());
        RenderPlan { headers, rows }
    }

    pub fn marked_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.message.is_some()).count()
    }
}

fn mark_row(row: &mut RenderRow, snapshot: &DiscrepancySnapshot, key: &Key, columns: &[String]) {
    for record in snapshot.for_key(key) {
        match record.code() {
            ErrorCode::ValueMismatch => {
                let Some(idx) = record.column().and_then(|c| columns.iter().position(|h| h == c)) else {
                    continue;
                };
                let cell = &mut row.cells[idx];
                let expected = record.expected().map(Value::to_text).unwrap_or_default();
                cell.note = Some(format!("{} \\\\ expected: {} \\\\", cell.value.to_text(), expected));
                cell.style = Some(ErrorCode::ValueMismatch);
            }
            ErrorCode::DuplicateInActual | ErrorCode::DuplicateInExpected | ErrorCode::ExcessInActual => {
                for cell in &mut row.cells {
                    cell.style = Some(record.code());
                }
            }
            ErrorCode::MissingFromActual => continue,
        }
        row.message = Some(record.message().to_string());
    }
}
