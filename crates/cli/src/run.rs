//! The reconcile command: load, reconcile, report.

use std::time::Instant;

use datarecon_io::{render::RenderPlan, table, xlsx, CsvLogWriter};
use datarecon_recon::{Dataset, DiscrepancyLog, ReconSummary, Reconciler};
use serde::Serialize;

use crate::args::{build_config, check_paths};
use crate::console::Console;
use crate::fetch::fetch_dataset;
use crate::{Cli, CliError};

/// Run metadata for `--json`.
#[derive(Debug, Serialize)]
struct RunMeta {
    started_at: String,
    finished_at: String,
    duration_ms: u128,
    key_column: String,
    expected_rows: usize,
    actual_rows: usize,
    actual_source: String,
    log_file: String,
    excel_file: Option<String>,
}

#[derive(Serialize)]
struct JsonOutput<'a, G: Serialize> {
    run: RunMeta,
    summary: &'a ReconSummary,
    discrepancies: G,
}

pub fn cmd_reconcile(cli: &Cli) -> Result<(), CliError> {
    let started_at = chrono::Utc::now();
    let clock = Instant::now();
    let console = Console::new(cli.verbose);

    check_paths(cli)?;
    let engine = Reconciler::new(build_config(cli)?)?;
    let key_column = engine.config().key_column.clone();

    let expected = datarecon_io::load(&cli.input, "Expected data")?;
    tracing::info!(rows = expected.len(), path = %cli.input.display(), "expected data loaded");

    let (actual, actual_source) = load_actual(cli)?;

    let mut log = DiscrepancyLog::new();
    let writer = CsvLogWriter::create(&cli.output, &key_column)?;
    let mut sink = (&mut log, writer);
    let narrowed = engine.run_into(&expected, &actual, &mut sink)?;
    let (_, writer) = sink;
    tracing::info!(records = writer.written(), path = %cli.output.display(), "discrepancy log written");
    drop(writer);

    let snapshot = log.snapshot();
    let summary = snapshot.summary();

    console.block(&table::render(snapshot.records(), &key_column));
    console.say("");

    let mut excel_file = None;
    if let Some(path) = &cli.excel {
        let plan = RenderPlan::build(&snapshot, &narrowed.actual, &narrowed.expected, &key_column);
        let result = xlsx::export(&plan, path)?;
        tracing::debug!(marked_rows = result.marked_rows, marked_cells = result.marked_cells, "excel report");
        console.say(format!("Created file {} with marked discrepancies.", path.display()));
        excel_file = Some(path.display().to_string());
    }

    console.say(format!("Discrepancies logged in file {}", cli.output.display()));
    print_summary(&console, &summary);

    if cli.json {
        let output = JsonOutput {
            run: RunMeta {
                started_at: started_at.to_rfc3339(),
                finished_at: chrono::Utc::now().to_rfc3339(),
                duration_ms: clock.elapsed().as_millis(),
                key_column,
                expected_rows: expected.len(),
                actual_rows: actual.len(),
                actual_source,
                log_file: cli.output.display().to_string(),
                excel_file,
            },
            summary: &summary,
            discrepancies: snapshot.grouped(),
        };
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    Ok(())
}

fn load_actual(cli: &Cli) -> Result<(Dataset, String), CliError> {
    match &cli.actual {
        Some(path) => {
            let dataset = datarecon_io::load(path, "Actual data")?;
            tracing::info!(rows = dataset.len(), path = %path.display(), "actual data loaded");
            Ok((dataset, path.display().to_string()))
        }
        None => Ok((fetch_dataset(&cli.url)?, cli.url.clone())),
    }
}

fn print_summary(console: &Console, s: &ReconSummary) {
    if !console.is_verbose() {
        return;
    }
    if s.is_clean() {
        console.say("No discrepancies found.");
        return;
    }
    console.say(format!(
        "{} discrepancies across {} keys: {} wrong values, {} duplicated in actual, {} duplicated in expected, {} missing, {} excessive",
        s.total,
        s.keys_with_errors,
        s.value_mismatches,
        s.duplicates_in_actual,
        s.duplicates_in_expected,
        s.missing_from_actual,
        s.excess_in_actual,
    ));
}
