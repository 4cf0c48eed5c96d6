// Dataset loading and discrepancy reports

pub mod csv;
pub mod error;
pub mod json;
pub mod log_writer;
pub mod render;
pub mod table;
pub mod xlsx;

use std::path::Path;

use datarecon_recon::Dataset;

pub use error::{IoError, Result};
pub use log_writer::CsvLogWriter;
pub use render::RenderPlan;

/// Supported dataset file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match extension(path).as_str() {
            ".csv" => Some(InputFormat::Csv),
            ".json" => Some(InputFormat::Json),
            _ => None,
        }
    }
}

/// Lowercased extension with its leading dot, or an empty string.
pub fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Load a dataset, choosing the parser from the file extension.
pub fn load(path: &Path, name: &str) -> Result<Dataset> {
    match InputFormat::from_path(path) {
        Some(InputFormat::Csv) => csv::load(path, name),
        Some(InputFormat::Json) => json::load(path, name),
        None => Err(IoError::Shape(format!(
            "unsupported input format '{}'",
            extension(path)
        ))),
    }
}
