//! # Predicate Compiler
//!
//! Turns a parsed query into a reusable record predicate.
//!
//! The field scope is threaded down the tree as a parameter: `Field` sets it
//! for its subtree, `Group` passes it through, and the innermost `Field`
//! always wins. Each term is compiled once into a regular expression and is
//! matched with search semantics (anywhere in the value).

use regex::Regex;
use serde_json::Value;

use super::ast::QueryNode;
use super::errors::{SearchError, SearchResult};

/// Compiled, immutable record predicate
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Pattern searched in the string form of `field`
    Match { field: String, pattern: Regex },

    /// Every child must match
    All(Vec<Predicate>),

    /// At least one child must match
    Any(Vec<Predicate>),
}

impl Predicate {
    /// Check a record against this predicate
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Predicate::Match { field, pattern } => field_text(record, field)
                .map(|text| pattern.is_match(&text))
                .unwrap_or(false),
            Predicate::All(children) => children.iter().all(|c| c.matches(record)),
            Predicate::Any(children) => children.iter().any(|c| c.matches(record)),
        }
    }
}

/// String form of a record field used for matching.
///
/// Missing fields and `null` have no string form and never match.
fn field_text(record: &Value, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Compiles query ASTs into predicates
pub struct PredicateCompiler;

impl PredicateCompiler {
    /// Compile a query tree
    pub fn compile(node: &QueryNode) -> SearchResult<Predicate> {
        Self::compile_scoped(node, None)
    }

    fn compile_scoped(node: &QueryNode, field: Option<&str>) -> SearchResult<Predicate> {
        match node {
            QueryNode::Term { value } => {
                let field =
                    field.ok_or_else(|| SearchError::UnscopedTerm(value.clone()))?;
                let pattern = Regex::new(value).map_err(|e| SearchError::InvalidPattern {
                    pattern: value.clone(),
                    reason: e.to_string(),
                })?;
                Ok(Predicate::Match {
                    field: field.to_string(),
                    pattern,
                })
            }
            QueryNode::Field { name, expr } => Self::compile_scoped(expr, Some(name)),
            QueryNode::Group { expr } => Self::compile_scoped(expr, field),
            QueryNode::And { children } => Ok(Predicate::All(
                children
                    .iter()
                    .map(|c| Self::compile_scoped(c, field))
                    .collect::<SearchResult<Vec<_>>>()?,
            )),
            QueryNode::Or { children } => Ok(Predicate::Any(
                children
                    .iter()
                    .map(|c| Self::compile_scoped(c, field))
                    .collect::<SearchResult<Vec<_>>>()?,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compiled(node: QueryNode) -> Predicate {
        PredicateCompiler::compile(&node).unwrap()
    }

    #[test]
    fn test_term_is_substring_search() {
        let pred = compiled(QueryNode::field("image", QueryNode::term("web")));

        assert!(pred.matches(&json!({"image": "cion/web:rc-12"})));
        assert!(!pred.matches(&json!({"image": "cion/api:rc-3"})));
    }

    #[test]
    fn test_term_is_regex() {
        let pred = compiled(QueryNode::field("image", QueryNode::term("^cion/api:rc-[0-9]+$")));

        assert!(pred.matches(&json!({"image": "cion/api:rc-3"})));
        assert!(!pred.matches(&json!({"image": "cion/api:latest"})));
    }

    #[test]
    fn test_non_string_fields_use_json_text() {
        let pred = compiled(QueryNode::field("attempts", QueryNode::term("^3$")));
        assert!(pred.matches(&json!({"attempts": 3})));

        let pred = compiled(QueryNode::field("ok", QueryNode::term("true")));
        assert!(pred.matches(&json!({"ok": true})));
    }

    #[test]
    fn test_missing_and_null_never_match() {
        let pred = compiled(QueryNode::field("status", QueryNode::term(".*")));

        assert!(!pred.matches(&json!({"event": "x"})));
        assert!(!pred.matches(&json!({"status": null})));
    }

    #[test]
    fn test_group_keeps_scope_field_overrides() {
        // f1:(a AND f2:b)
        let pred = compiled(QueryNode::field(
            "f1",
            QueryNode::group(QueryNode::and(vec![
                QueryNode::term("a"),
                QueryNode::field("f2", QueryNode::term("b")),
            ])),
        ));

        assert!(pred.matches(&json!({"f1": "a", "f2": "b"})));
        assert!(!pred.matches(&json!({"f1": "b", "f2": "a"})));
        assert!(!pred.matches(&json!({"f1": "a", "f2": "x"})));
    }

    #[test]
    fn test_unscoped_term_is_an_error() {
        let err = PredicateCompiler::compile(&QueryNode::term("x")).unwrap_err();
        assert!(matches!(err, SearchError::UnscopedTerm(v) if v == "x"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err =
            PredicateCompiler::compile(&QueryNode::field("a", QueryNode::term("rc-(1"))).unwrap_err();
        assert!(matches!(err, SearchError::InvalidPattern { .. }));
    }

    #[test]
    fn test_predicate_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Predicate>();
    }
}
