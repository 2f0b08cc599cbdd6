//! Record flattening.
//!
//! Salesforce records carry an `attributes` metadata object and nest
//! relationship fields (`Account: {Name, Industry}`). Flattening drops the
//! metadata and promotes one level of nesting to `Account.Name` style columns.

use serde_json::{Map, Value};

use crm_types::TabularResult;

/// CRM-internal metadata key.
pub const METADATA_FIELD: &str = "attributes";

/// Flatten one record into ordered `(column, value)` pairs.
pub fn flatten_record(record: &Map<String, Value>) -> Vec<(String, Value)> {
    let mut flat = Vec::with_capacity(record.len());

    for (key, value) in record {
        if key == METADATA_FIELD {
            continue;
        }
        match value {
            Value::Object(nested) => {
                for (inner_key, inner_value) in nested {
                    if inner_key == METADATA_FIELD {
                        continue;
                    }
                    flat.push((format!("{}.{}", key, inner_key), inner_value.clone()));
                }
            }
            other => flat.push((key.clone(), other.clone())),
        }
    }

    flat
}

/// Flatten a record set, preserving row order.
pub fn flatten_records(records: &[Map<String, Value>]) -> TabularResult {
    TabularResult::from_ordered_rows(records.iter().map(flatten_record).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_nested_relationship_promoted() {
        let record = obj(json!({
            "Id": "006A",
            "Account": {"Name": "Acme", "Industry": "Energy"}
        }));
        let result = flatten_records(&[record]);
        assert_eq!(result.columns(), &["Id", "Account.Name", "Account.Industry"]);
        assert!(!result.has_column("Account"));
        let row = &result.rows()[0];
        assert_eq!(row["Account.Name"], json!("Acme"));
        assert_eq!(row["Account.Industry"], json!("Energy"));
    }

    #[test]
    fn test_metadata_dropped_at_both_levels() {
        let record = obj(json!({
            "attributes": {"type": "Opportunity", "url": "/services/data/v60.0/sobjects/Opportunity/006A"},
            "Name": "Big deal",
            "Account": {"attributes": {"type": "Account"}, "Name": "Acme"}
        }));
        let flat = flatten_record(&record);
        assert_eq!(
            flat,
            vec![
                ("Name".to_string(), json!("Big deal")),
                ("Account.Name".to_string(), json!("Acme")),
            ]
        );
    }

    #[test]
    fn test_null_relationship_stays_scalar() {
        let record = obj(json!({"Name": "Orphan", "Account": null}));
        let flat = flatten_record(&record);
        assert_eq!(flat[1], ("Account".to_string(), Value::Null));
    }

    #[test]
    fn test_row_order_preserved() {
        let records: Vec<_> = ["c", "a", "b"]
            .iter()
            .map(|n| obj(json!({"Name": n})))
            .collect();
        let result = flatten_records(&records);
        let names: Vec<_> = result.rows().iter().map(|r| r["Name"].clone()).collect();
        assert_eq!(names, vec![json!("c"), json!("a"), json!("b")]);
    }
}
