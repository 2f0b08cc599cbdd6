//! Flat tabular result sets.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One flattened record: column name to scalar.
pub type Row = HashMap<String, Value>;

/// Ordered rows sharing a single column set.
///
/// Columns are listed in first-seen order across all rows. A row that lacks
/// a column reads as `null` for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabularResult {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl TabularResult {
    /// Build a result from flattened rows whose column order is given
    /// per row as `(name, value)` pairs.
    pub fn from_ordered_rows(records: Vec<Vec<(String, Value)>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut rows = Vec::with_capacity(records.len());

        for record in records {
            let mut row = Row::with_capacity(record.len());
            for (name, value) in record {
                if !columns.contains(&name) {
                    columns.push(name.clone());
                }
                row.insert(name, value);
            }
            rows.push(row);
        }

        Self { columns, rows }
    }

    /// Column names in display order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in CRM response order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns true if the named column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Cell value, `null` if the row has no such column.
    pub fn cell<'a>(&'a self, row: &'a Row, column: &str) -> &'a Value {
        row.get(column).unwrap_or(&Value::Null)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Render a scalar cell for display or export. `null` becomes empty.
pub fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Numeric reading of a cell. Strings holding numbers are accepted.
pub fn cell_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
