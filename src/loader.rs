use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    pipeline::{parse_date, Column, PlotError, Schema, Table, ValidationMode, Value, ValueType},
    Appliable, Logged,
};

/// Both `DataFrame.to_json(orient="records")` and `orient="split"` layouts are accepted
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TableFile {
    Split {
        columns: Vec<String>,
        data: Vec<Vec<serde_json::Value>>,
    },
    Records(Vec<serde_json::Map<String, serde_json::Value>>),
}

/**
 * Read a file from local disk or over http(s)
 */
pub async fn load_file(path: &str) -> Result<String, PlotError> {
    debug!("Reading file at {}", path);
    Ok(if path.starts_with("http:") || path.starts_with("https:") {
        let resp = reqwest::get(path)
            .await
            .log()
            .map_err(|e| PlotError::Unknown(e.to_string()))?
            .error_for_status()
            .log()
            .map_err(|e| PlotError::Unknown(e.to_string()))?;
        resp.text()
            .await
            .log()
            .map_err(|e| PlotError::Unknown(e.to_string()))
    } else {
        tokio::fs::read_to_string(path)
            .await
            .log()
            .map_err(|e| PlotError::Unknown(e.to_string()))
    }?
    .then(|s| {
        debug!(
            "Successfully read file at {}, file length is {}",
            path,
            s.len()
        );
    }))
}

/**
 * Load the observation table, the date column is turned into dates
 */
pub async fn load_table(path: &str, date_col: &str) -> Result<Table, PlotError> {
    let table = parse_table(&load_file(path).await?, date_col)?;
    if table.is_empty() {
        return Err(PlotError::EmptyTable);
    }
    info!(
        "Loaded {} rows from {}, columns: {}",
        table.len(),
        path,
        table.schema.dump()
    );
    Ok(table)
}

/// Dates are either `YYYY-MM-DD` prefixed strings or epoch milliseconds, pandas' default
fn to_date(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::String(s) => parse_date(&s).map(Value::from).unwrap_or_default(),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
            .map(|d| Value::from(d.date_naive()))
            .unwrap_or_default(),
        _ => Value::Null,
    }
}

/// The narrowest type holding every non-null value, mixed columns are read as strings
fn infer_type(values: &[Value]) -> ValueType {
    let mut ret: Option<ValueType> = None;
    for v in values.iter().filter(|v| !v.is_null()) {
        let t = v.value_type();
        ret = Some(match ret {
            None => t,
            Some(r) if r == t => r,
            Some(r) if r.is_numeric() && t.is_numeric() => ValueType::Double,
            _ => return ValueType::String,
        });
    }
    // A column with no value at all is a measure where every observation is missing
    ret.unwrap_or(ValueType::Double)
}

/**
 * Parse a JSON table, column types are inferred from the values
 */
pub fn parse_table(text: &str, date_col: &str) -> Result<Table, PlotError> {
    let file: TableFile =
        serde_json::from_str(text).map_err(|e| PlotError::DataError(e.to_string()))?;
    let (names, raw_rows) = match file {
        TableFile::Split { columns, data } => (columns, data),
        TableFile::Records(records) => {
            let mut names: Vec<String> = vec![];
            for record in records.iter() {
                for name in record.keys() {
                    if !names.contains(name) {
                        names.push(name.clone());
                    }
                }
            }
            let rows: Vec<Vec<serde_json::Value>> = records
                .into_iter()
                .map(|mut record| {
                    names
                        .iter()
                        .map(|n| record.remove(n).unwrap_or_default())
                        .collect()
                })
                .collect();
            (names, rows)
        }
    };

    let date_idx = names.iter().position(|n| n == date_col);
    let rows: Vec<Vec<Value>> = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .enumerate()
                .map(|(idx, v)| {
                    if Some(idx) == date_idx {
                        to_date(v)
                    } else {
                        Value::from(v)
                    }
                })
                .collect()
        })
        .collect();

    let schema: Schema = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let column_type = if Some(idx) == date_idx {
                ValueType::Date
            } else {
                infer_type(
                    &rows
                        .iter()
                        .filter_map(|r| r.get(idx).cloned())
                        .collect::<Vec<_>>(),
                )
            };
            Column::new(name, column_type)
        })
        .collect();
    if let Some(e) = rows.iter().flatten().find_map(|v| match v {
        Value::Error(e) => Some(e.clone()),
        _ => None,
    }) {
        return Err(e);
    }
    Table::new(schema, rows).validated(ValidationMode::Convert)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_parse_records() {
        let t = parse_table(
            r#"[
                {"date": "2021-01-01", "variable_description": "TV",
                 "Spend": 100, "Activity": 10.5, "geo": 1},
                {"date": "2021-01-02T00:00:00.000", "variable_description": "TV",
                 "Spend": 0.5, "Activity": null, "geo": "north"},
                {"date": "not a date", "variable_description": "Radio", "Spend": 3}
            ]"#,
            "date",
        )
        .unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.schema.get_column("Spend").unwrap().column_type, ValueType::Double);
        assert_eq!(t.schema.get_column("geo").unwrap().column_type, ValueType::String);
        assert_eq!(t.schema.get_column("date").unwrap().column_type, ValueType::Date);
        assert_eq!(
            t.column_values("date").unwrap(),
            vec![
                Value::from(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()),
                Value::from(NaiveDate::from_ymd_opt(2021, 1, 2).unwrap()),
                Value::Null
            ]
        );
        assert_eq!(
            t.column_values("geo").unwrap(),
            vec![Value::from("1"), Value::from("north"), Value::Null]
        );
        assert_eq!(t.column_values("Spend").unwrap()[0], Value::from(100f64));
    }

    #[test]
    fn test_parse_split() {
        let t = parse_table(
            r#"{
                "columns": ["YEAR_QTR", "value", "date"],
                "index": [0, 1],
                "data": [["2021-Q1", 3, 1609459200000], ["2021-Q2", 4, null]]
            }"#,
            "date",
        )
        .unwrap();
        assert_eq!(
            t.schema.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["YEAR_QTR", "value", "date"]
        );
        assert_eq!(t.schema.get_column("value").unwrap().column_type, ValueType::Long);
        assert_eq!(
            t.rows[0][2],
            Value::from(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap())
        );
        assert!(t.rows[1][2].is_null());
    }

    #[test]
    fn test_all_null_column_is_numeric() {
        let t = parse_table(
            r#"[
                {"date": "2021-01-01", "Spend": 10, "Activity": null},
                {"date": "2021-01-02", "Spend": 5, "Activity": null}
            ]"#,
            "date",
        )
        .unwrap();
        assert_eq!(t.schema.get_column("Activity").unwrap().column_type, ValueType::Double);
        assert!(t.column_values("Activity").unwrap().iter().all(|v| v.is_null()));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_table("{\"a\": 1}", "date"),
            Err(PlotError::DataError(_))
        ));
        assert!(matches!(
            parse_table(r#"[{"a": [1, 2]}]"#, "date"),
            Err(PlotError::DataError(_))
        ));
    }

    #[tokio::test]
    async fn test_load_table() {
        let path = std::env::temp_dir().join(format!("mmx-plots-{}.json", std::process::id()));
        tokio::fs::write(&path, r#"[{"date": "2021-01-01", "Spend": 1}]"#)
            .await
            .unwrap();
        let t = load_table(path.to_str().unwrap(), "date").await.unwrap();
        assert_eq!(t.len(), 1);
        tokio::fs::write(&path, "[]").await.unwrap();
        assert!(matches!(
            load_table(path.to_str().unwrap(), "date").await,
            Err(PlotError::EmptyTable)
        ));
        tokio::fs::remove_file(&path).await.unwrap();
        assert!(load_table(path.to_str().unwrap(), "date").await.is_err());
    }
}
