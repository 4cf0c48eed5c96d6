// CSV/TSV dataset loading

use std::io::Read;
use std::path::Path;

use datarecon_recon::{Dataset, Value};

use crate::error::{IoError, Result};

pub fn load(path: &Path, name: &str) -> Result<Dataset> {
    let content = read_file_as_utf8(path)?;
    parse(&content, name)
}

/// Parse CSV text with a sniffed delimiter. The first line is the header.
pub fn parse(content: &str, name: &str) -> Result<Dataset> {
    let delimiter = sniff_delimiter(content);
    tracing::debug!(dataset = name, delimiter = %(delimiter as char).escape_default(), "sniffed delimiter");
    parse_with_delimiter(content, delimiter, name)
}

pub fn parse_with_delimiter(content: &str, delimiter: u8, name: &str) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(IoError::Shape("CSV input has no header row".into()));
    }

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() > headers.len() {
            return Err(IoError::Shape(format!(
                "row {} has {} fields, header has {}",
                idx + 2,
                record.len(),
                headers.len()
            )));
        }
        raw_rows.push(record.iter().map(str::to_string).collect());
    }

    let types: Vec<CellType> = (0..headers.len())
        .map(|col| {
            CellType::infer(
                raw_rows
                    .iter()
                    .map(|r| r.get(col).map(String::as_str).unwrap_or("")),
            )
        })
        .collect();

    // Columns come from the header, so a file without data rows keeps them.
    let mut columns: Vec<String> = Vec::with_capacity(headers.len());
    for header in &headers {
        if !columns.contains(header) {
            columns.push(header.clone());
        }
    }

    let mut dataset = Dataset::new(name, columns);
    for row in &raw_rows {
        dataset.push_record(headers.iter().enumerate().map(|(col, header)| {
            let cell = row.get(col).map(String::as_str).unwrap_or("");
            (header.clone(), types[col].convert(cell))
        }));
    }
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Type inference
// ---------------------------------------------------------------------------

/// Column type decided from every non-empty cell in the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellType {
    Int,
    Float,
    Bool,
    Text,
}

impl CellType {
    fn infer<'a>(cells: impl Iterator<Item = &'a str>) -> CellType {
        let mut all_int = true;
        let mut all_float = true;
        let mut all_bool = true;
        let mut seen = false;

        for cell in cells.map(str::trim).filter(|c| !c.is_empty()) {
            seen = true;
            all_int &= cell.parse::<i64>().is_ok();
            all_float &= cell.parse::<f64>().is_ok();
            all_bool &= parse_bool(cell).is_some();
            if !all_int && !all_float && !all_bool {
                return CellType::Text;
            }
        }

        match (seen, all_int, all_float, all_bool) {
            (false, ..) => CellType::Text,
            (true, true, _, _) => CellType::Int,
            (true, _, true, _) => CellType::Float,
            (true, _, _, true) => CellType::Bool,
            _ => CellType::Text,
        }
    }

    fn convert(self, cell: &str) -> Value {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        match self {
            CellType::Int => trimmed.parse().map(Value::Int).unwrap_or(Value::Null),
            CellType::Float => trimmed.parse().map(Value::Float).unwrap_or(Value::Null),
            CellType::Bool => parse_bool(trimmed).map(Value::Bool).unwrap_or(Value::Null),
            CellType::Text => Value::Str(cell.to_string()),
        }
    }
}

fn parse_bool(cell: &str) -> Option<bool> {
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Encoding and dialect
// ---------------------------------------------------------------------------

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// with the best consistent-lines x field-count score wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(10).collect();

    let mut best = b',';
    let mut best_score = 0usize;

    for &delim in candidates {
        let counts: Vec<usize> = sample.iter().map(|line| field_count(line, delim)).collect();
        let Some(&target) = counts.first() else {
            break;
        };
        if target <= 1 {
            continue;
        }

        let consistent = counts.iter().filter(|&&c| c == target).count();
        let score = consistent * target;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
        .map(|r| r.len())
        .unwrap_or(1)
}

/// Read a file as UTF-8, falling back to Windows-1252 for spreadsheet exports.
pub fn read_file_as_utf8(path: &Path) -> Result<String> {
    let mut bytes = Vec::new();
    std::fs::File::open(path)
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .map_err(|e| IoError::read(path, e))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(s)),
        Err(e) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            tracing::debug!(path = %path.display(), "decoded as windows-1252");
            Ok(decoded.into_owned())
        }
    }
}
