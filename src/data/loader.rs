//! Forecast Data Loader Module
//! Moves the forecast table between its three representations: the cached
//! CSV file, the API's JSON body, and an in-memory Polars DataFrame.

use polars::prelude::*;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read or write CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Unexpected response shape: {0}")]
    Shape(String),
    #[error("No data in response")]
    NoData,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Either `{"Country": [...], "q1": [...]}` or `[{"Country": .., "q1": ..}, ...]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ForecastPayload {
    Records(Vec<Map<String, Value>>),
    Columns(Map<String, Value>),
}

/// Handles cache file IO and JSON decoding with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load a cached CSV file.
    pub fn read_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .finish()?
            .collect()?;
        Ok(df)
    }

    /// Write `df` as CSV with a header row and no index column.
    ///
    /// The table goes to a sibling temp file that is renamed over `path` once
    /// complete, so a failed write never leaves a partial cache behind.
    pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), LoaderError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = Self::temp_sibling(path);
        let written = File::create(&tmp)
            .map_err(LoaderError::from)
            .and_then(|mut file| {
                CsvWriter::new(&mut file).include_header(true).finish(df)?;
                file.sync_all()?;
                Ok(())
            })
            .and_then(|()| fs::rename(&tmp, path).map_err(LoaderError::from));

        if written.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        written
    }

    fn temp_sibling(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(".{name}.tmp"))
    }

    /// Decode an API response body into a DataFrame.
    pub fn from_json(body: &str) -> Result<DataFrame, LoaderError> {
        let payload: ForecastPayload = serde_json::from_str(body).map_err(|e| {
            // Untagged enums swallow the real reason; report syntax errors as-is.
            match serde_json::from_str::<Value>(body) {
                Err(syntax) => LoaderError::JsonError(syntax),
                Ok(_) => LoaderError::Shape(format!(
                    "expected an object of columns or an array of records ({e})"
                )),
            }
        })?;

        let columns = match payload {
            ForecastPayload::Columns(map) => Self::columns_from_map(map)?,
            ForecastPayload::Records(records) => Self::columns_from_records(&records),
        };

        if columns.is_empty() {
            return Err(LoaderError::NoData);
        }

        Ok(DataFrame::new(columns)?)
    }

    fn columns_from_map(map: Map<String, Value>) -> Result<Vec<Column>, LoaderError> {
        let mut height: Option<(String, usize)> = None;
        let mut columns = Vec::with_capacity(map.len());

        for (name, value) in map {
            let Value::Array(values) = value else {
                return Err(LoaderError::Shape(format!(
                    "column '{name}' is not an array"
                )));
            };
            match &height {
                Some((first, len)) if *len != values.len() => {
                    return Err(LoaderError::Shape(format!(
                        "column '{name}' has {} values but '{first}' has {len}",
                        values.len()
                    )));
                }
                Some(_) => {}
                None => height = Some((name.clone(), values.len())),
            }
            columns.push(Self::json_column(&name, &values));
        }

        Ok(columns)
    }

    fn columns_from_records(records: &[Map<String, Value>]) -> Vec<Column> {
        // Union of keys, first-seen order
        let mut names: Vec<&str> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !names.contains(&key.as_str()) {
                    names.push(key);
                }
            }
        }

        names
            .into_iter()
            .map(|name| {
                let values: Vec<Value> = records
                    .iter()
                    .map(|r| r.get(name).cloned().unwrap_or(Value::Null))
                    .collect();
                Self::json_column(name, &values)
            })
            .collect()
    }

    /// Build a typed column from JSON scalars.
    fn json_column(name: &str, values: &[Value]) -> Column {
        let has_values = values.iter().any(|v| !v.is_null());
        let all = |pred: fn(&Value) -> bool| values.iter().all(|v| v.is_null() || pred(v));

        if has_values && all(Value::is_i64) {
            Column::new(
                name.into(),
                values.iter().map(Value::as_i64).collect::<Vec<_>>(),
            )
        } else if has_values && all(Value::is_number) {
            Column::new(
                name.into(),
                values.iter().map(Value::as_f64).collect::<Vec<_>>(),
            )
        } else if has_values && all(Value::is_boolean) {
            Column::new(
                name.into(),
                values.iter().map(Value::as_bool).collect::<Vec<_>>(),
            )
        } else {
            let strings: Vec<Option<String>> = values
                .iter()
                .map(|v| match v {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
                .collect();
            Column::new(name.into(), strings)
        }
    }

    /// Get list of column names.
    pub fn get_columns(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNAR: &str = r#"{
        "Country": ["Mexico", "Sweden"],
        "Category": ["Core Inflation Rate", "Stock Market"],
        "q1": [1.0, 2300.5],
        "q2": [1.1, 2310.0],
        "q3": [1.2, 2320.0],
        "q4": [1.3, 2330.25],
        "q1_date": [null, "2024-03-31T00:00:00"]
    }"#;

    #[test]
    fn columnar_json_keeps_column_order_and_types() {
        let df = DataLoader::from_json(COLUMNAR).unwrap();
        assert_eq!(
            DataLoader::get_columns(&df),
            vec!["Country", "Category", "q1", "q2", "q3", "q4", "q1_date"]
        );
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("q1").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Country").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("q1_date").unwrap().null_count(), 1);
    }

    #[test]
    fn record_json_unions_keys() {
        let body = r#"[
            {"Country": "Mexico", "Category": "Core Inflation Rate", "q1": 4},
            {"Country": "Sweden", "Category": "Stock Market", "q1": 5, "q1_date": "2024-03-31"}
        ]"#;
        let df = DataLoader::from_json(body).unwrap();
        assert_eq!(
            DataLoader::get_columns(&df),
            vec!["Country", "Category", "q1", "q1_date"]
        );
        assert_eq!(df.column("q1").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("q1_date").unwrap().null_count(), 1);
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let body = r#"{"Country": ["Mexico", "Sweden"], "q1": [1.0]}"#;
        assert!(matches!(
            DataLoader::from_json(body),
            Err(LoaderError::Shape(_))
        ));
    }

    #[test]
    fn invalid_json_is_a_json_error() {
        assert!(matches!(
            DataLoader::from_json("{not json"),
            Err(LoaderError::JsonError(_))
        ));
        assert!(matches!(
            DataLoader::from_json("42"),
            Err(LoaderError::Shape(_))
        ));
    }

    #[test]
    fn empty_response_has_no_data() {
        assert!(matches!(DataLoader::from_json("[]"), Err(LoaderError::NoData)));
    }

    #[test]
    fn csv_round_trip_preserves_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("forecast.csv");

        let mut df = DataLoader::from_json(COLUMNAR).unwrap();
        DataLoader::write_csv(&mut df, &path).unwrap();
        let back = DataLoader::read_csv(&path).unwrap();

        assert!(back.equals_missing(&df));

        let header = fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("Country,Category,q1"));
    }

    #[test]
    fn failed_csv_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.csv");

        // Nested lists have no CSV representation.
        let nested = Series::new("q1".into(), &[Series::new("".into(), &[1.0f64, 2.0])]);
        let mut df = DataFrame::new(vec![nested.into()]).unwrap();

        assert!(DataLoader::write_csv(&mut df, &path).is_err());
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn successful_csv_write_leaves_only_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.csv");

        let mut df = DataLoader::from_json(COLUMNAR).unwrap();
        DataLoader::write_csv(&mut df, &path).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("forecast.csv")]);
    }
}
