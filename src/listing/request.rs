//! # List Request
//!
//! Paging, sorting and search parameters for a listing, plus parsing from
//! raw HTTP query parameters:
//!
//! | parameter     | meaning                                      |
//! |---------------|----------------------------------------------|
//! | `pageStart`   | index of the first row (default 0)           |
//! | `pageLength`  | rows per page (> 0, capped)                  |
//! | `sortIndex`   | field to order by; `-1` means `time`         |
//! | `reverseSort` | `true` orders descending (newest first)      |
//! | `searchTerm`  | search query, empty for no filter            |

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::errors::{ListError, ListingResult};
use super::sorter::{SortDirection, SortSpec};

/// Sort index value meaning "no field chosen"
pub const UNSET_SORT_INDEX: &str = "-1";

/// Field used when no sort field is chosen
pub const DEFAULT_SORT_FIELD: &str = "time";

/// Page size bounds applied when parsing requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLimits {
    pub default_page_length: usize,
    pub max_page_length: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_length: 25,
            max_page_length: 1000,
        }
    }
}

/// One page request over a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRequest {
    pub page_start: usize,
    pub page_length: usize,
    pub sort_field: String,
    pub descending: bool,
    pub search_term: String,
}

impl ListRequest {
    /// First page, newest first, no filter
    pub fn new(page_length: usize) -> Self {
        Self {
            page_start: 0,
            page_length,
            sort_field: UNSET_SORT_INDEX.to_string(),
            descending: true,
            search_term: String::new(),
        }
    }

    pub fn starting_at(mut self, page_start: usize) -> Self {
        self.page_start = page_start;
        self
    }

    pub fn sorted_by(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.sort_field = field.into();
        self.descending = descending;
        self
    }

    pub fn searching(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    /// Sort field with the unset sentinel resolved
    pub fn resolved_sort_field(&self) -> &str {
        let field = self.sort_field.trim();
        if field.is_empty() || field == UNSET_SORT_INDEX {
            DEFAULT_SORT_FIELD
        } else {
            &self.sort_field
        }
    }

    pub fn sort_spec(&self) -> SortSpec {
        SortSpec {
            field: self.resolved_sort_field().to_string(),
            direction: if self.descending {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            },
        }
    }

    /// Exclusive end index of the requested page
    pub fn page_end(&self) -> usize {
        self.page_start.saturating_add(self.page_length)
    }

    /// Parse raw query parameters
    pub fn from_query(params: &HashMap<String, String>, limits: &PageLimits) -> ListingResult<Self> {
        let page_start = match params.get("pageStart") {
            Some(v) => parse_count("pageStart", v)?,
            None => 0,
        };

        let page_length = match params.get("pageLength") {
            Some(v) => parse_count("pageLength", v)?,
            None => limits.default_page_length,
        };

        if page_length == 0 {
            return Err(ListError::InvalidRequest(
                "pageLength must be greater than 0".to_string(),
            ));
        }
        if page_length > limits.max_page_length {
            return Err(ListError::InvalidRequest(format!(
                "pageLength {} exceeds maximum {}",
                page_length, limits.max_page_length
            )));
        }

        let descending = match params.get("reverseSort") {
            Some(v) => parse_flag("reverseSort", v)?,
            None => true,
        };

        Ok(Self {
            page_start,
            page_length,
            sort_field: params
                .get("sortIndex")
                .cloned()
                .unwrap_or_else(|| UNSET_SORT_INDEX.to_string()),
            descending,
            search_term: params.get("searchTerm").cloned().unwrap_or_default(),
        })
    }
}

fn parse_count(name: &str, value: &str) -> ListingResult<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| ListError::InvalidRequest(format!("Invalid {}: {}", name, value)))
}

fn parse_flag(name: &str, value: &str) -> ListingResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ListError::InvalidRequest(format!("Invalid {}: {}", name, value))),
    }
}
