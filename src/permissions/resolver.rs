//! # Placeholder Resolution
//!
//! Supplies values for `$name` segments of a permission path from the
//! request being authorized. Resolution may need to read the request, so it
//! is asynchronous.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use super::errors::{PermissionError, PermissionResult};
use super::path::Placeholders;

/// Boxed future returned by placeholder resolvers
pub type ResolverFuture<'a> = Pin<Box<dyn Future<Output = PermissionResult<Placeholders>> + Send + 'a>>;

/// Request data a permission check may draw placeholder values from
#[derive(Debug, Clone, Default)]
pub struct CheckContext {
    /// Raw request body
    pub body: Vec<u8>,

    /// Path and query parameters
    pub params: HashMap<String, String>,
}

impl CheckContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Request body parsed as JSON. An empty body reads as `{}`.
    pub fn json_body(&self) -> PermissionResult<Value> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_slice(&self.body)
            .map_err(|e| PermissionError::Resolver(format!("request body is not valid JSON: {}", e)))
    }
}

/// Produces placeholder values for a request
pub trait PlaceholderResolver: Send + Sync {
    fn resolve<'a>(&'a self, ctx: &'a CheckContext) -> ResolverFuture<'a>;
}

/// Binds placeholders to top-level fields of a JSON request body.
///
/// A field missing from the body leaves its placeholder unbound, which the
/// check treats as a denial.
#[derive(Debug, Clone, Default)]
pub struct BodyFieldResolver {
    bindings: Vec<(String, String)>,
}

impl BodyFieldResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `placeholder` to body field `field`
    pub fn bind(mut self, placeholder: impl Into<String>, field: impl Into<String>) -> Self {
        self.bindings.push((placeholder.into(), field.into()));
        self
    }

    fn resolve_sync(&self, ctx: &CheckContext) -> PermissionResult<Placeholders> {
        let body = ctx.json_body()?;
        let object = body
            .as_object()
            .ok_or_else(|| PermissionError::Resolver("request body must be a JSON object".to_string()))?;

        Ok(self
            .bindings
            .iter()
            .filter_map(|(placeholder, field)| {
                object.get(field).map(|value| (placeholder.clone(), value.clone()))
            })
            .collect())
    }
}

impl PlaceholderResolver for BodyFieldResolver {
    fn resolve<'a>(&'a self, ctx: &'a CheckContext) -> ResolverFuture<'a> {
        Box::pin(std::future::ready(self.resolve_sync(ctx)))
    }
}

/// Binds placeholders to request parameters
#[derive(Debug, Clone, Default)]
pub struct ParamResolver {
    bindings: Vec<(String, String)>,
}

impl ParamResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, placeholder: impl Into<String>, param: impl Into<String>) -> Self {
        self.bindings.push((placeholder.into(), param.into()));
        self
    }
}

impl PlaceholderResolver for ParamResolver {
    fn resolve<'a>(&'a self, ctx: &'a CheckContext) -> ResolverFuture<'a> {
        let values = self
            .bindings
            .iter()
            .filter_map(|(placeholder, param)| {
                ctx.params
                    .get(param)
                    .map(|value| (placeholder.clone(), Value::String(value.clone())))
            })
            .collect();
        Box::pin(std::future::ready(Ok(values)))
    }
}

/// Fixed placeholder values, independent of the request
#[derive(Debug, Clone, Default)]
pub struct StaticPlaceholders {
    values: Placeholders,
}

impl StaticPlaceholders {
    pub fn new(values: Placeholders) -> Self {
        Self { values }
    }

    /// Build from a JSON object; any other JSON value is rejected
    pub fn from_json(value: Value) -> PermissionResult<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                values: map.into_iter().collect(),
            }),
            other => Err(PermissionError::Resolver(format!(
                "placeholder values must be a JSON object, got {}",
                other
            ))),
        }
    }
}

impl PlaceholderResolver for StaticPlaceholders {
    fn resolve<'a>(&'a self, _ctx: &'a CheckContext) -> ResolverFuture<'a> {
        Box::pin(std::future::ready(Ok(self.values.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_body_field_resolver() {
        let resolver = BodyFieldResolver::new()
            .bind("environments", "environments")
            .bind("name", "service-name");
        let ctx = CheckContext::new()
            .with_body(r#"{"environments": ["prod", "staging"], "image-name": "web"}"#);

        let values = resolver.resolve(&ctx).await.unwrap();
        assert_eq!(values.get("environments"), Some(&json!(["prod", "staging"])));
        assert!(!values.contains_key("name"));
    }

    #[tokio::test]
    async fn test_body_resolver_rejects_bad_json() {
        let resolver = BodyFieldResolver::new().bind("env", "env");

        let ctx = CheckContext::new().with_body("{not json");
        assert!(matches!(resolver.resolve(&ctx).await, Err(PermissionError::Resolver(_))));

        let ctx = CheckContext::new().with_body("[1, 2]");
        assert!(matches!(resolver.resolve(&ctx).await, Err(PermissionError::Resolver(_))));
    }

    #[tokio::test]
    async fn test_empty_body_resolves_nothing() {
        let resolver = BodyFieldResolver::new().bind("env", "env");
        let values = resolver.resolve(&CheckContext::new()).await.unwrap();
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn test_param_resolver() {
        let resolver = ParamResolver::new().bind("hook", "id");
        let ctx = CheckContext::new().with_param("id", "abc");
        let values = resolver.resolve(&ctx).await.unwrap();
        assert_eq!(values.get("hook"), Some(&json!("abc")));
    }

    #[test]
    fn test_static_placeholders_from_json() {
        assert!(StaticPlaceholders::from_json(json!({"env": "prod"})).is_ok());
        assert!(StaticPlaceholders::from_json(json!(["prod"])).is_err());
    }
}
