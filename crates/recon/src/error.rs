use thiserror::Error;

/// Result alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, ReconError>;

/// Configuration-level failures. These abort a run; discrepancies found
/// during a run are never reported through this type.
#[derive(Debug, Error, PartialEq)]
pub enum ReconError {
    /// A requested column is absent from one of the datasets.
    #[error("{dataset} does not contain column(s): {}", .columns.join(","))]
    MissingColumn { dataset: String, columns: Vec<String> },

    /// No column selection was given and the two datasets disagree on columns.
    #[error(
        "columns of actual and expected data do not match (only in expected: [{}], only in actual: [{}]); select columns explicitly",
        .only_in_expected.join(","),
        .only_in_actual.join(",")
    )]
    SchemaMismatch {
        only_in_expected: Vec<String>,
        only_in_actual: Vec<String>,
    },

    /// Malformed caller input (bad record, blank key column, bad tolerance).
    #[error("validation error: {0}")]
    Validation(String),

    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// A sink could not persist a record.
    #[error("failed to record discrepancy: {0}")]
    Sink(String),

    /// The cancellation token fired between two steps.
    #[error("reconciliation cancelled before step '{step}'")]
    Cancelled { step: &'static str },
}
