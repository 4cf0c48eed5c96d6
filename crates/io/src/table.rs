// Plain-text table of discrepancy records for console output

use datarecon_recon::DiscrepancyRecord;

use crate::log_writer::{log_headers, record_fields};

/// Render records as a `|`-separated table with a dashed rule under the header.
pub fn render(records: &[DiscrepancyRecord], key_column: &str) -> String {
    let header = log_headers(key_column);
    let rows: Vec<[String; 6]> = records.iter().map(record_fields).collect();

    let mut widths = header.clone().map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("|"));
    out.push('\n');
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{cell:<w$}", w = *w))
        .collect();
    out.push_str(padded.join("|").trim_end());
    out.push('\n');
}
