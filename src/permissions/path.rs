//! # Permission Paths
//!
//! A permission path is a dotted string naming a capability in a
//! permission tree:
//!
//! ```text
//! cion.environment.$environments.service
//! └──┘ └─────────┘ └───────────┘ └─────┘
//! key     key       placeholder   leaf
//! ```
//!
//! Every segment but the last selects a key in a nested object. The last
//! segment must be a member of the array reached. Segments starting with
//! `$` are placeholders whose value is supplied when the path is checked.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use super::errors::{PermissionError, PermissionResult};
use super::reasons::ReasonSink;

/// Placeholder name → resolved value
pub type Placeholders = HashMap<String, Value>;

const PLACEHOLDER_PREFIX: char = '$';

/// One step of a permission path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(String),
}

/// Parsed permission path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionPath {
    raw: String,
    segments: Vec<Segment>,
}

impl PermissionPath {
    pub fn parse(raw: &str) -> PermissionResult<Self> {
        if raw.is_empty() {
            return Err(PermissionError::invalid_path(raw, "path is empty"));
        }

        let mut segments = Vec::new();
        for part in raw.split('.') {
            if part.is_empty() {
                return Err(PermissionError::invalid_path(raw, "empty segment"));
            }
            match part.strip_prefix(PLACEHOLDER_PREFIX) {
                Some("") => {
                    return Err(PermissionError::invalid_path(raw, "placeholder without a name"));
                }
                Some(name) => segments.push(Segment::Placeholder(name.to_string())),
                None => segments.push(Segment::Literal(part.to_string())),
            }
        }

        if let Some(Segment::Placeholder(_)) = segments.last() {
            return Err(PermissionError::invalid_path(
                raw,
                "the granted leaf cannot be a placeholder",
            ));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The path as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn has_placeholders(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Placeholder(_)))
    }

    /// Names of all placeholders, in path order
    pub fn placeholder_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Walk `tree` along this path.
    ///
    /// Every failed lookup reports the path as written to `sink`. A
    /// placeholder bound to an array requires every element to grant the
    /// rest of the path; all elements are walked even after one fails. An
    /// empty array grants.
    pub fn evaluate(&self, tree: &Value, values: &Placeholders, sink: &mut dyn ReasonSink) -> bool {
        self.walk(tree, 0, values, sink)
    }

    fn walk(&self, node: &Value, index: usize, values: &Placeholders, sink: &mut dyn ReasonSink) -> bool {
        let last = self.segments.len() - 1;

        if index == last {
            let leaf = match &self.segments[last] {
                Segment::Literal(leaf) => leaf.as_str(),
                Segment::Placeholder(_) => return self.deny(sink),
            };
            let granted = node
                .as_array()
                .map(|items| items.iter().any(|item| item.as_str() == Some(leaf)))
                .unwrap_or(false);
            return granted || self.deny(sink);
        }

        match &self.segments[index] {
            Segment::Literal(key) => self.step(node, key, index, values, sink),
            Segment::Placeholder(name) => match values.get(name) {
                Some(Value::Array(items)) => {
                    let mut allowed = true;
                    for item in items {
                        let granted = match scalar_key(item) {
                            Some(key) => self.step(node, &key, index, values, sink),
                            None => self.deny(sink),
                        };
                        allowed &= granted;
                    }
                    allowed
                }
                Some(value) => match scalar_key(value) {
                    Some(key) => self.step(node, &key, index, values, sink),
                    None => self.deny(sink),
                },
                None => self.deny(sink),
            },
        }
    }

    fn step(
        &self,
        node: &Value,
        key: &str,
        index: usize,
        values: &Placeholders,
        sink: &mut dyn ReasonSink,
    ) -> bool {
        match node.as_object().and_then(|map| map.get(key)) {
            Some(child) => self.walk(child, index + 1, values, sink),
            None => self.deny(sink),
        }
    }

    fn deny(&self, sink: &mut dyn ReasonSink) -> bool {
        sink.report(&self.raw);
        false
    }
}

impl fmt::Display for PermissionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Key text for a scalar placeholder value; null, arrays and objects have none
fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
