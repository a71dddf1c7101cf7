//! Error types for asynchronous rendering
//!
//! Two layers: [`AsyncRenderError`] is returned to callers when a render pass
//! cannot produce any output at all, [`DeferredFailure`] describes a single
//! deferred helper result that settled badly and ends up as an inline marker.

use std::time::Duration;

use thiserror::Error;

/// Failure of a whole render pass.
///
/// Individual deferred helpers never produce this; they degrade to an inline
/// marker instead. Only the synchronous engine pass can fail the render.
#[derive(Error, Debug)]
pub enum AsyncRenderError {
    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),
}

/// Why a deferred helper computation did not produce a value.
///
/// The `Display` form is the reason embedded in the failure marker.
#[derive(Error, Debug)]
pub enum DeferredFailure {
    #[error("{0}")]
    Failed(anyhow::Error),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

pub type Result<T> = std::result::Result<T, AsyncRenderError>;
