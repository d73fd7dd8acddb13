//! # Search Query Module
//!
//! Compiles human-typed search strings into record predicates.
//!
//! ```text
//! event:(new-image OR "service update") AND status:done
//! ```
//!
//! `field:value` matches `value` as a regular expression against the string
//! form of `field`; `AND`, `OR` and parentheses combine terms. Every value
//! must sit inside a `field:` scope.

pub mod ast;
pub mod cache;
pub mod compiler;
pub mod errors;
pub mod lexer;
pub mod parser;

pub use ast::QueryNode;
pub use cache::{CacheStats, CompiledQueryCache};
pub use compiler::{Predicate, PredicateCompiler};
pub use errors::{ParseError, ParseErrorKind, SearchError, SearchResult};
pub use parser::{parse, MAX_DEPTH};

/// Parse and compile a search string in one step.
///
/// Returns `Ok(None)` when the text is empty, meaning every record matches.
pub fn compile_search(text: &str) -> SearchResult<Option<Predicate>> {
    match parse(text)? {
        Some(node) => Ok(Some(PredicateCompiler::compile(&node)?)),
        None => Ok(None),
    }
}
