// src/table/json.rs

use serde_json::{Map, Value};
use tracing::debug;

use super::{Cell, RawTable};
use crate::error::ForecastError;

fn to_cell(v: &Value) -> Cell {
    match v {
        Value::Null => Cell::Empty,
        Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
        Value::String(s) => Cell::text(s.clone()),
        other => Cell::text(other.to_string()),
    }
}

fn to_label(v: &Value) -> String {
    to_cell(v).to_label()
}

fn array_field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Vec<Value>> {
    names
        .iter()
        .find_map(|n| obj.get(*n))
        .and_then(Value::as_array)
}

fn row_of(v: &Value) -> Result<Vec<Cell>, ForecastError> {
    v.as_array()
        .map(|cells| cells.iter().map(to_cell).collect())
        .ok_or_else(|| ForecastError::InvalidDocument(format!("expected a row array, got {v}")))
}

fn table_from_value(v: &Value) -> Result<RawTable, ForecastError> {
    match v {
        // records: [{"Дата": "15.03.2024", "1": 4012, ...}, ...]
        Value::Array(items) if items.iter().all(Value::is_object) => {
            let headers: Vec<String> = match items.first().and_then(Value::as_object) {
                Some(first) => first.keys().cloned().collect(),
                None => Vec::new(),
            };
            let rows = items
                .iter()
                .filter_map(Value::as_object)
                .map(|obj| {
                    headers
                        .iter()
                        .map(|h| obj.get(h).map(to_cell).unwrap_or(Cell::Empty))
                        .collect()
                })
                .collect();
            Ok(RawTable::new(headers, rows))
        }

        // values: [["15.03.2024", 4012, ...], ...]
        Value::Array(items) => {
            let rows = items.iter().map(row_of).collect::<Result<_, _>>()?;
            Ok(RawTable::new(Vec::new(), rows))
        }

        // split: {"columns": [...], "data": [[...], ...]}
        Value::Object(obj) => {
            let data = array_field(obj, &["data", "rows"]).ok_or_else(|| {
                ForecastError::InvalidDocument("object table without `data`/`rows`".to_string())
            })?;
            let headers = array_field(obj, &["columns", "headers"])
                .map(|cols| cols.iter().map(to_label).collect())
                .unwrap_or_default();
            let rows = data.iter().map(row_of).collect::<Result<_, _>>()?;
            Ok(RawTable::new(headers, rows))
        }

        other => Err(ForecastError::InvalidDocument(format!(
            "expected a table, got {}",
            match other {
                Value::Null => "null",
                Value::Bool(_) => "a boolean",
                Value::Number(_) => "a number",
                _ => "a string",
            }
        ))),
    }
}

/// Candidate tables from a JSON document.
///
/// A top-level `{"tables": [...]}` yields one candidate per element; any
/// other document is read as a single table in records, values or split
/// orientation.
pub fn tables_from_json(body: &str) -> Result<Vec<RawTable>, ForecastError> {
    let doc: Value = serde_json::from_str(body)?;
    let tables = match doc.get("tables").and_then(Value::as_array) {
        Some(list) => list.iter().map(table_from_value).collect::<Result<Vec<_>, _>>()?,
        None => vec![table_from_value(&doc)?],
    };
    debug!(tables = tables.len(), "parsed json document");
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_orientation_keeps_key_order() {
        let body = r#"[
            {"Дата": "15.03.2024", "2": 4100, "1": 4000.5},
            {"Дата": "16.03.2024", "1": null}
        ]"#;
        let tables = tables_from_json(body).unwrap();
        assert_eq!(tables.len(), 1);
        let t = &tables[0];
        assert_eq!(t.headers, vec!["Дата", "2", "1"]);
        assert_eq!(t.rows[0], vec![Cell::text("15.03.2024"), Cell::Number(4100.0), Cell::Number(4000.5)]);
        assert_eq!(t.rows[1], vec![Cell::text("16.03.2024"), Cell::Empty, Cell::Empty]);
    }

    #[test]
    fn split_orientation_with_numeric_columns() {
        let body = r#"{"columns": ["Date", 1, 2], "data": [["15.03.2024", 1, "2"]]}"#;
        let t = tables_from_json(body).unwrap().remove(0);
        assert_eq!(t.headers, vec!["Date", "1", "2"]);
        assert_eq!(t.rows[0][2], Cell::text("2"));
    }

    #[test]
    fn values_orientation_has_no_header() {
        let t = tables_from_json(r#"[["15.03.2024", 1], ["16.03.2024", 2]]"#)
            .unwrap()
            .remove(0);
        assert!(t.headers.is_empty());
        assert_eq!(t.rows.len(), 2);
    }

    #[test]
    fn tables_wrapper_yields_every_candidate() {
        let body = r#"{"tables": [
            [{"a": 1}],
            {"headers": ["Дата", "1"], "rows": [["15.03.2024", 7]]}
        ]}"#;
        let tables = tables_from_json(body).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1].headers, vec!["Дата", "1"]);

        let empty = tables_from_json(r#"{"tables": []}"#).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn rejects_unusable_shapes() {
        assert!(matches!(
            tables_from_json("42"),
            Err(ForecastError::InvalidDocument(_))
        ));
        assert!(matches!(
            tables_from_json(r#"{"status": "ok"}"#),
            Err(ForecastError::InvalidDocument(_))
        ));
        assert!(matches!(tables_from_json("{"), Err(ForecastError::Json(_))));
    }
}
