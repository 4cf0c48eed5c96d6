//! Argument validation and config assembly.

use std::path::Path;

use datarecon_recon::{Key, ReconConfig};

use crate::exit_codes::{EXIT_CONFIG, EXIT_IO};
use crate::{Cli, CliError};

pub const DEFAULT_KEY_COLUMN: &str = "passengerid";

pub const INPUT_EXTENSIONS: &[&str] = &[".csv", ".json"];
pub const OUTPUT_EXTENSIONS: &[&str] = &[".csv", ".txt"];
pub const EXCEL_EXTENSIONS: &[&str] = &[".xls", ".xlsx"];

/// Fail with a usage error unless `path` has one of `allowed` (case-insensitive).
pub fn check_extension(path: &Path, allowed: &[&str], flag: &str) -> Result<(), CliError> {
    let ext = datarecon_io::extension(path);
    if allowed.contains(&ext.as_str()) {
        return Ok(());
    }
    Err(CliError::args(format!(
        "argument {flag}: Allowed file extensions are {}, not '{ext}'.",
        allowed.join(", ")
    )))
}

/// Check every file flag before any work is done.
pub fn check_paths(cli: &Cli) -> Result<(), CliError> {
    check_extension(&cli.output, OUTPUT_EXTENSIONS, "-o/--outputfile")?;
    check_extension(&cli.input, INPUT_EXTENSIONS, "-i/--inputfile")?;
    if let Some(excel) = &cli.excel {
        check_extension(excel, EXCEL_EXTENSIONS, "-e/--excel")?;
    }
    if let Some(actual) = &cli.actual {
        check_extension(actual, INPUT_EXTENSIONS, "--actual")?;
    }
    Ok(())
}

/// Config file (if any) with command-line flags layered on top.
pub fn build_config(cli: &Cli) -> Result<ReconConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                CliError { code: EXIT_IO, message: format!("cannot read config {}: {e}", path.display()), hint: None }
            })?;
            ReconConfig::from_toml(&text).map_err(|e| {
                CliError { code: EXIT_CONFIG, message: format!("{}: {e}", path.display()), hint: None }
            })?
        }
        None => ReconConfig::new(DEFAULT_KEY_COLUMN),
    };

    if let Some(key) = &cli.key {
        config.key_column = key.clone();
    }
    if let Some(columns) = &cli.columns {
        config.columns = Some(columns.iter().map(|c| c.trim().to_string()).collect());
    }
    if let Some(keys) = &cli.keys {
        config.keys = Some(parse_keys(keys)?);
    }
    if cli.float_precision {
        config.tolerance.enabled = true;
    }

    let config = config.normalized();
    config.validate().map_err(|e| {
        CliError::args(e.to_string()).with_hint("check -k/--key and -c/--columns")
    })?;
    Ok(config)
}

fn parse_keys(raw: &[String]) -> Result<Vec<Key>, CliError> {
    let keys: Vec<Key> = raw
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(Key::parse)
        .collect();
    if keys.is_empty() {
        return Err(CliError::args("argument -p/--keys: expected at least one key"));
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["drecon"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn extension_message_matches_contract() {
        let err = check_extension(&PathBuf::from("data.pickle"), INPUT_EXTENSIONS, "-i/--inputfile").unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
        assert!(
            err.message.ends_with("Allowed file extensions are .csv, .json, not '.pickle'."),
            "message: {}",
            err.message
        );
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(check_extension(&PathBuf::from("Expected.JSON"), INPUT_EXTENSIONS, "-i").is_ok());
        assert!(check_extension(&PathBuf::from("report.XLSX"), EXCEL_EXTENSIONS, "-e").is_ok());
        assert!(check_extension(&PathBuf::from("log"), OUTPUT_EXTENSIONS, "-o").is_err());
    }

    #[test]
    fn output_checked_before_input() {
        let c = cli(&["-i", "in.pickle", "-o", "out.xml"]);
        let err = check_paths(&c).unwrap_err();
        assert!(err.message.contains("-o/--outputfile"));
    }

    #[test]
    fn defaults_without_flags() {
        let config = build_config(&cli(&["-i", "in.csv", "-o", "out.csv"])).unwrap();
        assert_eq!(config.key_column, "passengerid");
        assert!(config.columns.is_none());
        assert!(config.keys.is_none());
        assert!(!config.tolerance.enabled);
    }

    #[test]
    fn flags_build_selection() {
        let c = cli(&["-i", "in.csv", "-o", "out.csv", "-c", "Fare,Pclass", "-p", "90,727", "-f", "-k", "PassengerId"]);
        let config = build_config(&c).unwrap();
        assert_eq!(config.key_column, "passengerid");
        assert_eq!(config.columns, Some(vec!["fare".to_string(), "pclass".to_string()]));
        assert_eq!(config.keys, Some(vec![Key::Int(90), Key::Int(727)]));
        assert!(config.tolerance.enabled);
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recon.toml");
        std::fs::write(
            &path,
            "key_column = \"id\"\ncolumns = [\"a\"]\n[tolerance]\nenabled = false\nrtol = 1e-3\n",
        )
        .unwrap();

        let c = cli(&["-i", "in.csv", "-o", "out.csv", "--config", path.to_str().unwrap(), "-c", "b", "-f"]);
        let config = build_config(&c).unwrap();
        assert_eq!(config.key_column, "id");
        assert_eq!(config.columns, Some(vec!["b".to_string()]));
        assert!(config.tolerance.enabled);
        assert_eq!(config.tolerance.rtol, 1e-3);
    }

    #[test]
    fn bad_config_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recon.toml");
        std::fs::write(&path, "key_column = 5").unwrap();
        let c = cli(&["-i", "in.csv", "-o", "out.csv", "--config", path.to_str().unwrap()]);
        assert_eq!(build_config(&c).unwrap_err().code, EXIT_CONFIG);
    }

    #[test]
    fn text_keys_are_kept() {
        assert_eq!(
            parse_keys(&["90".into(), " A-7 ".into(), "".into()]).unwrap(),
            vec![Key::Int(90), Key::from("A-7")]
        );
        assert!(parse_keys(&["".into()]).is_err());
    }
}
