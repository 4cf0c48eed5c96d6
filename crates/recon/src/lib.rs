//! `datarecon-recon`: keyed dataset reconciliation engine.
//!
//! Pure engine crate: receives already-loaded datasets, returns a log of
//! typed discrepancies. No CLI or IO dependencies.

pub mod classify;
pub mod compare;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod log;
pub mod summary;
pub mod value;

pub use compare::{differs, ColumnPair, DefaultComparator, ValueComparator};
pub use config::{ReconConfig, ToleranceConfig};
pub use dataset::{Dataset, KeyIndex, Row};
pub use engine::{CancelToken, Narrowed, ReconOutcome, Reconciler};
pub use error::{ReconError, Result};
pub use log::{DiscrepancyLog, DiscrepancyRecord, DiscrepancySink, DiscrepancySnapshot, ErrorCode};
pub use summary::ReconSummary;
pub use value::{ColumnKind, Key, Value};
