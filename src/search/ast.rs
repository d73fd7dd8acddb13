//! # Search Query AST
//!
//! Parsed form of a search string. Nodes are immutable once built.

use serde::Serialize;

/// A node of a parsed search query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryNode {
    /// Match value, compared against the field in scope
    Term { value: String },

    /// Sets the field scope for its subtree
    Field { name: String, expr: Box<QueryNode> },

    /// Parenthesized subexpression; keeps the enclosing scope
    Group { expr: Box<QueryNode> },

    /// Conjunction
    And { children: Vec<QueryNode> },

    /// Disjunction
    Or { children: Vec<QueryNode> },
}

impl QueryNode {
    pub fn term(value: impl Into<String>) -> Self {
        QueryNode::Term {
            value: value.into(),
        }
    }

    pub fn field(name: impl Into<String>, expr: QueryNode) -> Self {
        QueryNode::Field {
            name: name.into(),
            expr: Box::new(expr),
        }
    }

    pub fn group(expr: QueryNode) -> Self {
        QueryNode::Group {
            expr: Box::new(expr),
        }
    }

    /// Build a conjunction. A single child is returned as-is.
    pub fn and(mut children: Vec<QueryNode>) -> Self {
        if children.len() == 1 {
            return children.remove(0);
        }
        QueryNode::And { children }
    }

    /// Build a disjunction. A single child is returned as-is.
    pub fn or(mut children: Vec<QueryNode>) -> Self {
        if children.len() == 1 {
            return children.remove(0);
        }
        QueryNode::Or { children }
    }

    /// Names of every field referenced in this subtree, in visit order
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            QueryNode::Term { .. } => {}
            QueryNode::Field { name, expr } => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
                expr.collect_fields(out);
            }
            QueryNode::Group { expr } => expr.collect_fields(out),
            QueryNode::And { children } | QueryNode::Or { children } => {
                for child in children {
                    child.collect_fields(out);
                }
            }
        }
    }
}
