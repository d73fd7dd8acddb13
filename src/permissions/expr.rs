//! # Permission Expressions
//!
//! Composable capability checks evaluated against a user's permission tree.
//!
//! ```text
//! let expr = PermissionExpr::path("cion.config.edit")?
//!     | PermissionExpr::path_with("cion.environment.$env.service", resolver)?;
//! ```
//!
//! `&` and `|` always evaluate both operands so the caller sees every
//! missing capability, not only the first.

use std::fmt;
use std::future::Future;
use std::ops::{BitAnd, BitOr};
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use super::errors::PermissionResult;
use super::path::{PermissionPath, Placeholders};
use super::reasons::ReasonSink;
use super::resolver::{CheckContext, PlaceholderResolver};

/// Boxed future returned by [`PermissionExpr::check`]
pub type CheckFuture<'a> = Pin<Box<dyn Future<Output = PermissionResult<bool>> + Send + 'a>>;

/// A compiled permission check
#[derive(Clone)]
pub enum PermissionExpr {
    Path {
        path: PermissionPath,
        resolver: Option<Arc<dyn PlaceholderResolver>>,
    },
    And(Box<PermissionExpr>, Box<PermissionExpr>),
    Or(Box<PermissionExpr>, Box<PermissionExpr>),
}

impl PermissionExpr {
    /// Check for a path without placeholders bound
    pub fn path(path: &str) -> PermissionResult<Self> {
        Ok(PermissionExpr::Path {
            path: PermissionPath::parse(path)?,
            resolver: None,
        })
    }

    /// Check for a path whose placeholders come from `resolver`
    pub fn path_with(path: &str, resolver: Arc<dyn PlaceholderResolver>) -> PermissionResult<Self> {
        Ok(PermissionExpr::Path {
            path: PermissionPath::parse(path)?,
            resolver: Some(resolver),
        })
    }

    /// Evaluate against `tree`.
    ///
    /// Returns `Ok(false)` on denial, with the path of every failed lookup
    /// reported to `sink`. Errors only when placeholder resolution fails.
    pub fn check<'a, S: ReasonSink + Send>(
        &'a self,
        tree: &'a Value,
        sink: &'a mut S,
        ctx: &'a CheckContext,
    ) -> CheckFuture<'a> {
        Box::pin(async move {
            match self {
                PermissionExpr::Path { path, resolver } => {
                    let values = match resolver {
                        Some(resolver) if path.has_placeholders() => resolver.resolve(ctx).await?,
                        _ => Placeholders::new(),
                    };
                    Ok(path.evaluate(tree, &values, sink))
                }
                PermissionExpr::And(left, right) => {
                    let left = left.check(tree, &mut *sink, ctx).await?;
                    let right = right.check(tree, &mut *sink, ctx).await?;
                    Ok(left && right)
                }
                PermissionExpr::Or(left, right) => {
                    let left = left.check(tree, &mut *sink, ctx).await?;
                    let right = right.check(tree, &mut *sink, ctx).await?;
                    Ok(left || right)
                }
            }
        })
    }

    /// Every path named in this expression, left to right
    pub fn paths(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            PermissionExpr::Path { path, .. } => out.push(path.as_str()),
            PermissionExpr::And(left, right) | PermissionExpr::Or(left, right) => {
                left.collect_paths(out);
                right.collect_paths(out);
            }
        }
    }
}

impl BitAnd for PermissionExpr {
    type Output = PermissionExpr;

    fn bitand(self, rhs: Self) -> Self::Output {
        PermissionExpr::And(Box::new(self), Box::new(rhs))
    }
}

impl BitOr for PermissionExpr {
    type Output = PermissionExpr;

    fn bitor(self, rhs: Self) -> Self::Output {
        PermissionExpr::Or(Box::new(self), Box::new(rhs))
    }
}

impl fmt::Debug for PermissionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionExpr::Path { path, resolver } => f
                .debug_struct("Path")
                .field("path", &path.as_str())
                .field("resolver", &resolver.is_some())
                .finish(),
            PermissionExpr::And(left, right) => f.debug_tuple("And").field(left).field(right).finish(),
            PermissionExpr::Or(left, right) => f.debug_tuple("Or").field(left).field(right).finish(),
        }
    }
}

impl fmt::Display for PermissionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionExpr::Path { path, .. } => write!(f, "{}", path),
            PermissionExpr::And(left, right) => write!(f, "({} & {})", left, right),
            PermissionExpr::Or(left, right) => write!(f, "({} | {})", left, right),
        }
    }
}
