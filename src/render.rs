//! Async render pass
//!
//! One pass runs in two phases:
//!
//! 1. The engine renders synchronously with a fresh [`PendingRegistry`] as the
//!    active pass. Deferred helpers park their futures there and emit
//!    placeholder tokens.
//! 2. The registry is drained, every parked future is awaited concurrently
//!    until all have settled, and the tokens are replaced in one scan of the
//!    rendered text. Failures become an inline marker instead of failing the
//!    render.

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use handlebars::{Handlebars, JsonRender};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::RenderConfig;
use crate::error::{AsyncRenderError, DeferredFailure, Result};
use crate::placeholder::{replace_tokens, PlaceholderId};
use crate::registry::{PendingEntry, PendingRegistry};

/// Inline marker written where a failed helper would have rendered.
///
/// A `-->` inside the reason is neutralised so the comment cannot close early.
pub fn error_marker(reason: &str) -> String {
    format!(
        "<!-- error in async promise: {} -->",
        reason.replace("-->", "--&gt;")
    )
}

/// Render a registered template, resolving async helpers.
///
/// Waits for every deferred helper without a time limit.
pub async fn render_async<T>(handlebars: &Handlebars<'_>, name: &str, data: &T) -> Result<String>
where
    T: Serialize,
{
    render_async_with(handlebars, name, data, &RenderConfig::default()).await
}

/// [`render_async`] with explicit settings
#[instrument(skip(handlebars, data, config))]
pub async fn render_async_with<T>(
    handlebars: &Handlebars<'_>,
    name: &str,
    data: &T,
    config: &RenderConfig,
) -> Result<String>
where
    T: Serialize,
{
    if !handlebars.has_template(name) {
        return Err(AsyncRenderError::TemplateNotFound(name.to_string()));
    }

    let registry = Arc::new(PendingRegistry::new());
    let rendered = PendingRegistry::enter(&registry, || handlebars.render(name, data))?;
    Ok(resolve_pass(&registry, rendered, config).await)
}

/// Render an inline template string, resolving async helpers.
pub async fn render_template_async<T>(
    handlebars: &Handlebars<'_>,
    template: &str,
    data: &T,
) -> Result<String>
where
    T: Serialize,
{
    render_template_async_with(handlebars, template, data, &RenderConfig::default()).await
}

/// [`render_template_async`] with explicit settings
#[instrument(skip_all)]
pub async fn render_template_async_with<T>(
    handlebars: &Handlebars<'_>,
    template: &str,
    data: &T,
    config: &RenderConfig,
) -> Result<String>
where
    T: Serialize,
{
    let registry = Arc::new(PendingRegistry::new());
    let rendered =
        PendingRegistry::enter(&registry, || handlebars.render_template(template, data))?;
    Ok(resolve_pass(&registry, rendered, config).await)
}

/// Await everything the pass deferred and splice the results into `rendered`.
///
/// Leaves `registry` empty.
pub(crate) async fn resolve_pass(
    registry: &PendingRegistry,
    rendered: String,
    config: &RenderConfig,
) -> String {
    let snapshot = registry.drain();
    if snapshot.is_empty() {
        return rendered;
    }

    debug!(pending = snapshot.len(), "Resolving async helpers");
    let settled = join_all(
        snapshot
            .into_iter()
            .map(|entry| settle(entry, config.timeout)),
    )
    .await;

    let mut slots: HashMap<PlaceholderId, Slot> = HashMap::with_capacity(settled.len());
    let mut order = Vec::with_capacity(settled.len());
    for (id, outcome) in settled {
        let text = match outcome {
            Ok(value) => {
                let text = value.render();
                debug!(placeholder = %id, value = %text, "Async helper resolved");
                text
            }
            Err(failure) => {
                warn!(placeholder = %id, error = %failure, "Async helper failed");
                error_marker(&failure.to_string())
            }
        };
        slots.insert(
            id,
            Slot {
                text,
                hits: Cell::new(0),
            },
        );
        order.push(id);
    }

    let output = replace_tokens(&rendered, |id| {
        let slot = slots.get(&id)?;
        let hits = slot.hits.get() + 1;
        slot.hits.set(hits);
        if hits == 2 {
            warn!(placeholder = %id, "Placeholder emitted more than once");
        }
        Some(slot.text.as_str())
    });

    for id in order {
        if slots.get(&id).is_some_and(|slot| slot.hits.get() == 0) {
            debug!(placeholder = %id, "Resolved helper value was not part of the output");
        }
    }

    output
}

struct Slot {
    text: String,
    hits: Cell<usize>,
}

async fn settle(
    entry: PendingEntry,
    timeout: Option<Duration>,
) -> (PlaceholderId, std::result::Result<Value, DeferredFailure>) {
    let PendingEntry { id, computation } = entry;
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, computation).await {
            Ok(result) => result.map_err(DeferredFailure::Failed),
            Err(_) => Err(DeferredFailure::TimedOut(limit)),
        },
        None => computation.await.map_err(DeferredFailure::Failed),
    };
    (id, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use serde_json::json;

    fn resolved(value: Value) -> crate::registry::DeferredValue {
        async move { Ok(value) }.boxed()
    }

    fn rejected(reason: &'static str) -> crate::registry::DeferredValue {
        async move { Err(anyhow::anyhow!(reason)) }.boxed()
    }

    #[test]
    fn test_error_marker() {
        assert_eq!(
            error_marker("timeout"),
            "<!-- error in async promise: timeout -->"
        );
        assert_eq!(
            error_marker("a --> b"),
            "<!-- error in async promise: a --&gt; b -->"
        );
    }

    #[tokio::test]
    async fn test_resolve_pass_drains_registry() {
        let registry = PendingRegistry::new();
        let ok = registry.insert(resolved(json!("X")));
        let bad = registry.insert(rejected("timeout"));
        let text = format!("{} and {}", ok.token(), bad.token());

        let out = resolve_pass(&registry, text, &RenderConfig::default()).await;
        assert_eq!(out, "X and <!-- error in async promise: timeout -->");
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_empty_registry_returns_text_untouched() {
        let registry = PendingRegistry::new();
        let out = resolve_pass(&registry, "plain".to_string(), &RenderConfig::default()).await;
        assert_eq!(out, "plain");
    }

    #[tokio::test]
    async fn test_value_rendering_follows_engine() {
        let registry = PendingRegistry::new();
        let null = registry.insert(resolved(Value::Null));
        let num = registry.insert(resolved(json!(42)));
        let flag = registry.insert(resolved(json!(true)));
        let text = format!("[{}|{}|{}]", null.token(), num.token(), flag.token());

        let out = resolve_pass(&registry, text, &RenderConfig::default()).await;
        assert_eq!(out, "[|42|true]");
    }

    #[tokio::test]
    async fn test_duplicate_token_replaced_everywhere() {
        let registry = PendingRegistry::new();
        let id = registry.insert(resolved(json!("v")));
        let text = format!("{0}-{0}", id.token());

        let out = resolve_pass(&registry, text, &RenderConfig::default()).await;
        assert_eq!(out, "v-v");
    }

    #[tokio::test]
    async fn test_missing_token_is_still_awaited() {
        let registry = PendingRegistry::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        registry.insert(
            async move {
                let _ = tx.send(());
                Ok(json!("unused"))
            }
            .boxed(),
        );

        let out = resolve_pass(&registry, "no token".to_string(), &RenderConfig::default()).await;
        assert_eq!(out, "no token");
        assert!(rx.await.is_ok());
    }

    #[tokio::test]
    async fn test_foreign_token_left_alone() {
        let registry = PendingRegistry::new();
        let ours = registry.insert(resolved(json!("mine")));
        let foreign = PlaceholderId::new();
        let text = format!("{}{}", ours.token(), foreign.token());

        let out = resolve_pass(&registry, text, &RenderConfig::default()).await;
        assert_eq!(out, format!("mine{}", foreign.token()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_marker() {
        let registry = PendingRegistry::new();
        let slow = registry.insert(futures::future::pending().boxed());
        let fast = registry.insert(resolved(json!("fast")));
        let text = format!("{} {}", slow.token(), fast.token());

        let config = RenderConfig::new().with_timeout(Duration::from_secs(1));
        let out = resolve_pass(&registry, text, &config).await;
        assert_eq!(out, "<!-- error in async promise: timed out after 1s --> fast");
    }
}
