//! CLI Exit Code Registry
//!
//! Single source of truth for `drecon` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Run completed (discrepancies found is still success)     |
//! | 1    | General error (unspecified)                              |
//! | 2    | Usage error (bad flag, wrong extension, unknown column)  |
//! | 3    | I/O error (unreadable input, unwritable output)          |
//! | 4    | Parse error (malformed CSV/JSON)                         |
//! | 5    | Config error (bad TOML, schema mismatch, bad tolerance)  |
//! | 6    | Fetch error (actual data could not be downloaded)        |
//! | 7    | Reconciliation cancelled before completion               |
//!
//! Adding a code: add the constant, document the trigger, update the table.

/// Run completed. Discrepancies are reported, not treated as failure.
pub const EXIT_SUCCESS: u8 = 0;

/// General error. Prefer a specific code.
pub const EXIT_ERROR: u8 = 1;

/// Bad arguments, wrong file extension, or a selected column that does not exist.
pub const EXIT_USAGE: u8 = 2;

/// Input could not be read or output could not be written.
pub const EXIT_IO: u8 = 3;

/// Input file is not valid CSV/JSON, or has an unusable shape.
pub const EXIT_PARSE: u8 = 4;

/// Config file invalid, or datasets disagree on columns without a selection.
pub const EXIT_CONFIG: u8 = 5;

/// Actual data could not be fetched (connection, HTTP status, body).
pub const EXIT_FETCH: u8 = 6;

/// Cancel token fired; the log holds the records found so far.
pub const EXIT_CANCELLED: u8 = 7;
