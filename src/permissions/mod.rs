//! # Permissions Module
//!
//! Capability checks over a user's permission tree: a nested JSON object
//! whose leaves are arrays of granted capability names.
//!
//! ```text
//! {"cion": {"user": ["create", "edit"]}}
//!
//! cion.user.create   → granted
//! cion.user.delete   → denied, reason "cion.user.delete"
//! ```

pub mod errors;
pub mod expr;
pub mod path;
pub mod reasons;
pub mod resolver;

pub use errors::{PermissionError, PermissionResult};
pub use expr::{CheckFuture, PermissionExpr};
pub use path::{PermissionPath, Placeholders, Segment};
pub use reasons::{DenialReasons, ReasonSink};
pub use resolver::{
    BodyFieldResolver, CheckContext, ParamResolver, PlaceholderResolver, ResolverFuture,
    StaticPlaceholders,
};
