//! Result of a list query

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of records and the size of the set it was cut from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResult {
    /// Records in the page, at most `page_length`
    pub rows: Vec<Value>,

    /// Filtered count with an active search, collection size otherwise
    #[serde(rename = "totalLength")]
    pub total_length: usize,
}

impl ListResult {
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            total_length: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
