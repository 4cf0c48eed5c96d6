//! Download actual data from the remote records API.

use std::time::Duration;

use datarecon_recon::Dataset;

use crate::exit_codes::EXIT_FETCH;
use crate::CliError;

pub const DEFAULT_URL: &str =
    "https://public.opendatasoft.com/api/records/1.0/search/?dataset=titanic-passengers&rows=10000";

const TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("drecon/", env!("CARGO_PKG_VERSION"));

pub const CONNECT_FAILED: &str =
    "Failed to establish new connection. Check your Internet connection and try again.";

fn fetch_err(msg: impl Into<String>) -> CliError {
    CliError { code: EXIT_FETCH, message: msg.into(), hint: None }
}

/// GET `url` and flatten its JSON body into the "Actual data" dataset.
pub fn fetch_dataset(url: &str) -> Result<Dataset, CliError> {
    let http = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| fetch_err(format!("failed to build HTTP client: {e}")))?;

    tracing::debug!(url, "fetching actual data");
    let resp = http.get(url).send().map_err(|e| {
        if e.is_connect() {
            fetch_err(CONNECT_FAILED).with_hint(format!("url: {url}"))
        } else if e.is_timeout() {
            fetch_err(format!("request timed out after {TIMEOUT_SECS}s"))
        } else {
            fetch_err(format!("request failed: {e}"))
        }
    })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(fetch_err(format!("actual data request failed (HTTP {})", status.as_u16())));
    }

    let text = resp
        .text()
        .map_err(|e| fetch_err(format!("failed to read response body: {e}")))?;
    let body = text.trim_start_matches('\u{feff}');
    let json: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        fetch_err(format!(
            "failed to parse JSON response: {e} (body: {})",
            body.chars().take(200).collect::<String>()
        ))
    })?;

    let dataset = datarecon_io::json::from_json(json, "Actual data")
        .map_err(|e| fetch_err(format!("unexpected response: {e}")))?;
    tracing::info!(rows = dataset.len(), columns = dataset.columns().len(), "actual data fetched");
    Ok(dataset)
}
