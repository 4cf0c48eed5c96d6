// Discrepancy log as CSV, written while the run is in progress

use std::fs::File;
use std::io::Write;
use std::path::Path;

use datarecon_recon::{DiscrepancyRecord, DiscrepancySink, ReconError, Value};

use crate::error::{IoError, Result};

/// Column headers for a log keyed by `key_column`.
pub fn log_headers(key_column: &str) -> [String; 6] {
    [
        key_column.to_string(),
        "error_message".to_string(),
        "error_code".to_string(),
        "column_name".to_string(),
        "expected_value".to_string(),
        "actual_value".to_string(),
    ]
}

/// Text for an optional cell. Absent and missing values are both empty.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        Some(v) if !v.is_missing() => v.to_text(),
        _ => String::new(),
    }
}

/// One record as log fields, in header order.
pub fn record_fields(record: &DiscrepancyRecord) -> [String; 6] {
    [
        record.key().to_string(),
        record.message().to_string(),
        record.code().to_string(),
        record.column().unwrap_or_default().to_string(),
        cell_text(record.expected()),
        cell_text(record.actual()),
    ]
}

/// CSV sink. Every appended record is flushed before `append` returns, so a
/// run that fails half-way still leaves a readable log behind.
pub struct CsvLogWriter<W: Write> {
    writer: csv::Writer<W>,
    written: usize,
}

impl CsvLogWriter<File> {
    pub fn create(path: &Path, key_column: &str) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| IoError::write(parent, e))?;
        }
        let file = File::create(path).map_err(|e| IoError::write(path, e))?;
        Self::from_writer(file, key_column)
    }
}

impl<W: Write> CsvLogWriter<W> {
    pub fn from_writer(inner: W, key_column: &str) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(log_headers(key_column))?;
        writer.flush().map_err(|e| IoError::Csv(e.into()))?;
        Ok(Self { writer, written: 0 })
    }

    /// Records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| IoError::Shape(format!("failed to finish log: {}", e.error())))
    }
}

impl<W: Write> DiscrepancySink for CsvLogWriter<W> {
    fn append(&mut self, record: DiscrepancyRecord) -> datarecon_recon::Result<()> {
        self.writer
            .write_record(record_fields(&record))
            .map_err(|e| ReconError::Sink(e.to_string()))?;
        self.writer.flush().map_err(|e| ReconError::Sink(e.to_string()))?;
        self.written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datarecon_recon::{ErrorCode, Key};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_header_only_log() {
        let writer = CsvLogWriter::from_writer(Vec::new(), "passengerid").unwrap();
        let bytes = writer.into_inner().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "passengerid,error_message,error_code,column_name,expected_value,actual_value\n"
        );
    }

    #[test]
    fn test_records_written_in_order() {
        let mut writer = CsvLogWriter::from_writer(Vec::new(), "passengerid").unwrap();
        writer
            .append(DiscrepancyRecord::structural(Key::Int(41), ErrorCode::DuplicateInExpected, "passengerid").unwrap())
            .unwrap();
        writer
            .append(DiscrepancyRecord::value_mismatch(Key::Int(90), "fare", Value::Float(15.0), Value::Null))
            .unwrap();
        assert_eq!(writer.written(), 2);

        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "41,Duplicated passengerid in expected data,3,,,");
        assert_eq!(lines[2], "90,wrong value,1,fare,15.0,");
    }

    #[test]
    fn test_file_is_readable_mid_run() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("discrepancies").join("log.csv");
        let mut writer = CsvLogWriter::create(&path, "id").unwrap();
        writer
            .append(DiscrepancyRecord::structural(Key::Int(500), ErrorCode::MissingFromActual, "id").unwrap())
            .unwrap();

        // Not dropped yet: the record must already be on disk.
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("500,Missing row in actual data,4"));
        drop(writer);
    }
}
