//! Async-capable helpers
//!
//! A helper author returns a [`HelperValue`]: either the value right away, or
//! a future that produces it later. [`AsyncHelper`] adapts such a function to
//! the engine's synchronous [`HelperDef`] contract. Immediate values pass
//! straight through; deferred ones are parked in the active render pass and
//! a placeholder token is rendered in their place.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use handlebars::{
    Context, Handlebars, Helper, HelperDef, RenderContext, RenderError, RenderErrorReason,
    ScopedJson,
};
use serde_json::Value;

use crate::registry::{DeferredValue, PendingRegistry};

/// Result of invoking an async-capable helper
pub enum HelperValue {
    /// Known now; rendered exactly as a plain helper's value would be
    Immediate(Value),
    /// Known later; resolved after the synchronous pass
    Deferred(DeferredValue),
}

impl HelperValue {
    pub fn ready(value: impl Into<Value>) -> Self {
        HelperValue::Immediate(value.into())
    }

    /// Wrap a future whose error is reported through its `Display` form
    pub fn deferred<F, T, E>(future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Into<Value>,
        E: Display,
    {
        HelperValue::Deferred(
            future
                .map(|result| result.map(Into::into).map_err(|e| anyhow::anyhow!("{e}")))
                .boxed(),
        )
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, HelperValue::Deferred(_))
    }
}

impl std::fmt::Debug for HelperValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HelperValue::Immediate(v) => f.debug_tuple("Immediate").field(v).finish(),
            HelperValue::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<Value> for HelperValue {
    fn from(value: Value) -> Self {
        HelperValue::Immediate(value)
    }
}

impl From<String> for HelperValue {
    fn from(value: String) -> Self {
        HelperValue::Immediate(Value::String(value))
    }
}

impl From<&str> for HelperValue {
    fn from(value: &str) -> Self {
        HelperValue::Immediate(Value::String(value.to_string()))
    }
}

type HelperFn = dyn Fn(&Helper<'_>, &Context) -> Result<HelperValue, RenderError> + Send + Sync;

/// Engine-facing adapter around an async-capable helper function
#[derive(Clone)]
pub struct AsyncHelper {
    name: String,
    func: Arc<HelperFn>,
}

impl AsyncHelper {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Helper<'_>, &Context) -> Result<HelperValue, RenderError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the wrapped function and turn its result into the value the
    /// engine renders.
    fn invoke(&self, h: &Helper<'_>, ctx: &Context) -> Result<Value, RenderError> {
        match (self.func)(h, ctx)? {
            HelperValue::Immediate(value) => Ok(value),
            HelperValue::Deferred(computation) => match PendingRegistry::defer(computation) {
                Ok(id) => {
                    tracing::trace!(helper = %self.name, placeholder = %id, "Deferred helper result");
                    Ok(Value::String(id.token()))
                }
                Err(_dropped) => Err(RenderErrorReason::Other(format!(
                    "async helper '{}' deferred its result outside an async render pass",
                    self.name
                ))
                .into()),
            },
        }
    }
}

impl std::fmt::Debug for AsyncHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncHelper")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl HelperDef for AsyncHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        self.invoke(h, ctx).map(ScopedJson::Derived)
    }
}

/// Register an async-capable helper under `name`.
///
/// Must be called before any render pass that uses `name`. Deferred results
/// are only resolved by [`render_async`](crate::render_async) and friends; a
/// plain `Handlebars::render` fails when such a helper defers.
pub fn register_async_helper<F>(handlebars: &mut Handlebars<'_>, name: &str, func: F)
where
    F: Fn(&Helper<'_>, &Context) -> Result<HelperValue, RenderError> + Send + Sync + 'static,
{
    handlebars.register_helper(name, Box::new(AsyncHelper::new(name, func)));
}
