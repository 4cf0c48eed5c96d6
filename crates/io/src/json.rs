// JSON dataset loading
//
// Accepts a bare array of records or an API response object with a `records`
// array. Records wrapped in a `fields` object are unwrapped. Nested objects
// are flattened into dotted column names.

use std::collections::HashSet;
use std::path::Path;

use datarecon_recon::{Dataset, Value};
use serde_json::{Map, Value as Json};

use crate::csv::read_file_as_utf8;
use crate::error::{IoError, Result};

pub fn load(path: &Path, name: &str) -> Result<Dataset> {
    let content = read_file_as_utf8(path)?;
    parse(&content, name)
}

pub fn parse(content: &str, name: &str) -> Result<Dataset> {
    let json: Json = serde_json::from_str(content)?;
    from_json(json, name)
}

/// Build a dataset from an already-decoded JSON document.
pub fn from_json(json: Json, name: &str) -> Result<Dataset> {
    let records = match json {
        Json::Array(items) => items,
        Json::Object(mut obj) => match obj.remove("records") {
            Some(Json::Array(items)) => items,
            Some(_) => return Err(IoError::Shape("'records' must be an array".into())),
            None => {
                return Err(IoError::Shape(
                    "expected an array of records or an object with a 'records' array".into(),
                ))
            }
        },
        _ => return Err(IoError::Shape("expected an array of records".into())),
    };

    let mut rows: Vec<Vec<(String, Value)>> = Vec::with_capacity(records.len());
    for (idx, record) in records.into_iter().enumerate() {
        let Json::Object(mut obj) = record else {
            return Err(IoError::Shape(format!("record {idx} is not an object")));
        };
        let fields = match obj.remove("fields") {
            Some(Json::Object(fields)) => fields,
            Some(other) => {
                obj.insert("fields".to_string(), other);
                obj
            }
            None => obj,
        };

        let mut row = Vec::with_capacity(fields.len());
        flatten("", fields, &mut row);
        rows.push(row);
    }

    promote_mixed_numbers(&mut rows);
    Ok(Dataset::from_records(name, rows))
}

fn flatten(prefix: &str, obj: Map<String, Json>, out: &mut Vec<(String, Value)>) {
    for (key, value) in obj {
        let column = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Json::Object(nested) => flatten(&column, nested, out),
            other => out.push((column, scalar(other))),
        }
    }
}

fn scalar(json: Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        Json::String(s) => Value::Str(s),
        array @ Json::Array(_) => Value::Str(array.to_string()),
        Json::Object(_) => Value::Null,
    }
}

/// Columns holding both integers and floats become float columns.
fn promote_mixed_numbers(rows: &mut [Vec<(String, Value)>]) {
    let mut has_int: HashSet<String> = HashSet::new();
    let mut has_float: HashSet<String> = HashSet::new();
    for (column, value) in rows.iter().flatten() {
        match value {
            Value::Int(_) => {
                has_int.insert(column.clone());
            }
            Value::Float(_) => {
                has_float.insert(column.clone());
            }
            _ => {}
        }
    }

    let mixed: HashSet<&String> = has_int.intersection(&has_float).collect();
    if mixed.is_empty() {
        return;
    }
    for (column, value) in rows.iter_mut().flatten() {
        if let (Value::Int(i), true) = (&*value, mixed.contains(column)) {
            let promoted = *i as f64;
            *value = Value::Float(promoted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_api_response_shape() {
        let content = r#"{
            "nhits": 2,
            "records": [
                {"datasetid": "titanic-passengers", "recordid": "a1",
                 "fields": {"passengerid": 1, "name": "Braund", "fare": 7.25, "age": 22}},
                {"datasetid": "titanic-passengers", "recordid": "a2",
                 "fields": {"passengerid": 2, "name": "Cumings", "fare": 71, "age": 38.5}}
            ]
        }"#;
        let ds = parse(content, "Actual data").unwrap();
        assert_eq!(ds.len(), 2);
        assert!(!ds.has_column("recordid"));
        assert_eq!(ds.value(0, "passengerid"), &Value::Int(1));
        assert_eq!(ds.value(1, "name"), &Value::from("Cumings"));
        // Mixed int/float columns are promoted.
        assert_eq!(ds.value(1, "fare"), &Value::Float(71.0));
        assert_eq!(ds.value(0, "age"), &Value::Float(22.0));
    }

    #[test]
    fn test_bare_array_with_nested_objects() {
        let content = r#"[
            {"id": 1, "geo": {"lat": 49.6, "lon": -1.6}, "tags": ["a", "b"], "alive": true},
            {"id": 2, "geo": {"lat": 51.9}, "alive": null}
        ]"#;
        let ds = parse(content, "Expected data").unwrap();
        assert_eq!(ds.columns(), &["id", "geo.lat", "geo.lon", "tags", "alive"].map(String::from));
        assert_eq!(ds.value(0, "geo.lon"), &Value::Float(-1.6));
        assert_eq!(ds.value(1, "geo.lon"), &Value::Null);
        assert_eq!(ds.value(0, "tags"), &Value::from(r#"["a","b"]"#));
        assert_eq!(ds.value(0, "alive"), &Value::Bool(true));
        assert_eq!(ds.value(1, "alive"), &Value::Null);
    }

    #[test]
    fn test_rejects_scalar_records() {
        let err = parse("[1, 2]", "Expected data").unwrap_err();
        assert!(matches!(err, IoError::Shape(_)));

        let err = parse(r#"{"nhits": 0}"#, "Expected data").unwrap_err();
        assert!(matches!(err, IoError::Shape(_)));
    }

    #[test]
    fn test_invalid_json() {
        let err = parse("{not json", "Expected data").unwrap_err();
        assert!(matches!(err, IoError::Json(_)));
        assert!(err.to_string().starts_with("JSON input is not valid"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("expected.json");
        fs::write(&path, r#"[{"PassengerId": 90, "Pclass": 3}]"#).unwrap();
        let ds = load(&path, "Expected data").unwrap();
        assert_eq!(ds.value(0, "Pclass"), &Value::Int(3));
    }
}
