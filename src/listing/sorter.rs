//! Record ordering
//!
//! Stable, deterministic sort of JSON records by a single field.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Field and direction to order a collection by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Sorts records in place
pub struct RecordSorter;

impl RecordSorter {
    pub fn sort(records: &mut [Value], spec: &SortSpec) {
        records.sort_by(|a, b| {
            let ordering = Self::compare_values(a.get(&spec.field), b.get(&spec.field));
            match spec.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    /// Ordering rules:
    /// - missing < null < bool < number < string < array < object
    /// - same type: natural ordering; arrays and objects compare equal
    fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => {
                let rank = |v: &Value| -> u8 {
                    match v {
                        Value::Null => 0,
                        Value::Bool(_) => 1,
                        Value::Number(_) => 2,
                        Value::String(_) => 3,
                        Value::Array(_) => 4,
                        Value::Object(_) => 5,
                    }
                };

                match (a, b) {
                    (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
                    (Value::Number(x), Value::Number(y)) => {
                        let x = x.as_f64().unwrap_or(0.0);
                        let y = y.as_f64().unwrap_or(0.0);
                        x.partial_cmp(&y).unwrap_or(Ordering::Equal)
                    }
                    (Value::String(x), Value::String(y)) => x.cmp(y),
                    _ => rank(a).cmp(&rank(b)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(records: &[Value]) -> Vec<&str> {
        records.iter().map(|r| r["id"].as_str().unwrap()).collect()
    }

    #[test]
    fn test_sort_numbers_both_directions() {
        let mut records = vec![
            json!({"id": "b", "time": 2.5}),
            json!({"id": "a", "time": 1}),
            json!({"id": "c", "time": 3}),
        ];

        RecordSorter::sort(&mut records, &SortSpec::asc("time"));
        assert_eq!(ids(&records), vec!["a", "b", "c"]);

        RecordSorter::sort(&mut records, &SortSpec::desc("time"));
        assert_eq!(ids(&records), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_sort_stable() {
        let mut records = vec![
            json!({"id": "a", "status": "done"}),
            json!({"id": "b", "status": "done"}),
            json!({"id": "c", "status": "done"}),
        ];

        RecordSorter::sort(&mut records, &SortSpec::asc("status"));
        assert_eq!(ids(&records), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_missing_sorts_first_ascending() {
        let mut records = vec![
            json!({"id": "a", "name": "x"}),
            json!({"id": "b"}),
            json!({"id": "c", "name": null}),
        ];

        RecordSorter::sort(&mut records, &SortSpec::asc("name"));
        assert_eq!(ids(&records), vec!["b", "c", "a"]);
    }
}
