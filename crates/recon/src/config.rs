use serde::Deserialize;

use crate::error::{ReconError, Result};
use crate::value::Key;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// What to reconcile and how strictly.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReconConfig {
    /// Column holding the unique identifier of each record.
    pub key_column: String,
    /// Restrict comparison to these columns (key column is always included).
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    /// Restrict comparison to these keys.
    #[serde(default)]
    pub keys: Option<Vec<Key>>,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
}

// ---------------------------------------------------------------------------
// Tolerance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToleranceConfig {
    /// Compare float columns approximately.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_rtol")]
    pub rtol: f64,
    #[serde(default = "default_atol")]
    pub atol: f64,
}

fn default_rtol() -> f64 {
    1e-5
}

fn default_atol() -> f64 {
    1e-8
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rtol: default_rtol(),
            atol: default_atol(),
        }
    }
}

impl ToleranceConfig {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Build + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn new(key_column: impl Into<String>) -> Self {
        Self {
            key_column: key_column.into(),
            columns: None,
            keys: None,
            tolerance: ToleranceConfig::default(),
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_tolerance(mut self, tolerance: ToleranceConfig) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn from_toml(input: &str) -> Result<Self> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        let config = config.normalized();
        config.validate()?;
        Ok(config)
    }

    /// Lowercase the key column and selected columns, matching dataset normalization.
    pub fn normalized(mut self) -> Self {
        self.key_column = self.key_column.trim().to_lowercase();
        if let Some(columns) = self.columns.as_mut() {
            for column in columns.iter_mut() {
                *column = column.trim().to_lowercase();
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.key_column.trim().is_empty() {
            return Err(ReconError::Validation("key_column must not be empty".into()));
        }

        if let Some(columns) = &self.columns {
            if columns.is_empty() {
                return Err(ReconError::Validation(
                    "columns: selection must name at least one column".into(),
                ));
            }
            if columns.iter().any(|c| c.trim().is_empty()) {
                return Err(ReconError::Validation(
                    "columns: column names must not be empty".into(),
                ));
            }
        }

        let tol = &self.tolerance;
        for (name, value) in [("rtol", tol.rtol), ("atol", tol.atol)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ReconError::Validation(format!(
                    "tolerance.{name} must be a finite non-negative number, got {value}"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
key_column = "PassengerId"
columns = ["Pclass", "Fare"]
keys = [90, 727, "A-7"]

[tolerance]
enabled = true
rtol = 1e-4
"#;

    #[test]
    fn parse_full() {
        let config = ReconConfig::from_toml(FULL).unwrap();
        assert_eq!(config.key_column, "passengerid");
        assert_eq!(config.columns.as_deref(), Some(&["pclass".to_string(), "fare".to_string()][..]));
        assert_eq!(
            config.keys,
            Some(vec![Key::Int(90), Key::Int(727), Key::from("A-7")])
        );
        assert!(config.tolerance.enabled);
        assert_eq!(config.tolerance.rtol, 1e-4);
        assert_eq!(config.tolerance.atol, 1e-8);
    }

    #[test]
    fn parse_minimal_defaults() {
        let config = ReconConfig::from_toml(r#"key_column = "id""#).unwrap();
        assert!(config.columns.is_none());
        assert!(config.keys.is_none());
        assert_eq!(config.tolerance, ToleranceConfig::default());
    }

    #[test]
    fn reject_missing_key_column() {
        let err = ReconConfig::from_toml("columns = [\"a\"]").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_blank_key_column() {
        let err = ReconConfig::new("  ").validate().unwrap_err();
        assert!(err.to_string().contains("key_column"));
    }

    #[test]
    fn reject_empty_selection() {
        let err = ReconConfig::new("id")
            .with_columns(Vec::<String>::new())
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("at least one column"));
    }

    #[test]
    fn reject_negative_tolerance() {
        let input = r#"
key_column = "id"
[tolerance]
atol = -1.0
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("tolerance.atol"));
    }
}
