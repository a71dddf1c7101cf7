//! Asynchronous helpers for handlebars
//!
//! Handlebars calls helpers synchronously while it builds output text. Some
//! helpers need to do asynchronous work first, for example fetching a
//! fragment over HTTP. This crate lets such a helper hand back a future:
//! the synchronous render writes a unique placeholder token where the value
//! belongs, then the render pass awaits every future concurrently and
//! replaces each token with its value (or with an inline error marker).
//!
//! Key properties:
//! - Helpers that answer immediately render exactly as plain helpers do
//! - One failing helper never fails the render or its siblings
//! - Every render pass owns its pending futures; concurrent passes cannot
//!   pick up each other's work
//! - Returned text never contains a placeholder produced by the pass
//!
//! # Example
//!
//! ```no_run
//! use hbs_async::{register_async_helper, render_async, HelperValue};
//! use handlebars::Handlebars;
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut hbs = Handlebars::new();
//! register_async_helper(&mut hbs, "asyncName", |_, _| {
//!     Ok(HelperValue::deferred(async { Ok::<_, String>("World") }))
//! });
//! hbs.register_template_string("hello", "Hello {{asyncName}}")?;
//!
//! assert_eq!(render_async(&hbs, "hello", &json!({})).await?, "Hello World");
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod fetch;
mod helper;
mod placeholder;
mod registry;
mod render;
mod renderer;

pub use config::{RenderConfig, TIMEOUT_ENV};
pub use error::{AsyncRenderError, DeferredFailure, Result};
pub use fetch::{register_fetch_helper, FETCH_HELPER};
pub use helper::{register_async_helper, AsyncHelper, HelperValue};
pub use placeholder::{find_tokens, PlaceholderId, TokenMatch, Tokens, SENTINEL};
pub use registry::{DeferredValue, PendingEntry, PendingRegistry};
pub use render::{
    error_marker, render_async, render_async_with, render_template_async,
    render_template_async_with,
};
pub use renderer::AsyncRenderer;
