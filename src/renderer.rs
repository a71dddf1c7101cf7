//! Engine wrapper bundling a handlebars registry with render settings

use handlebars::{Context, Handlebars, Helper, RenderError};
use serde::Serialize;

use crate::config::RenderConfig;
use crate::error::Result;
use crate::fetch::register_fetch_helper;
use crate::helper::{register_async_helper, HelperValue};
use crate::render::{render_async_with, render_template_async_with};

/// A handlebars registry whose renders resolve async helpers
#[derive(Debug, Default)]
pub struct AsyncRenderer<'reg> {
    handlebars: Handlebars<'reg>,
    config: RenderConfig,
}

impl<'reg> AsyncRenderer<'reg> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RenderConfig) -> Self {
        Self {
            handlebars: Handlebars::new(),
            config,
        }
    }

    /// Wrap an already configured registry
    pub fn from_handlebars(handlebars: Handlebars<'reg>, config: RenderConfig) -> Self {
        Self { handlebars, config }
    }

    pub fn register_async_helper<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&Helper<'_>, &Context) -> std::result::Result<HelperValue, RenderError>
            + Send
            + Sync
            + 'static,
    {
        register_async_helper(&mut self.handlebars, name, func);
    }

    pub fn register_template_string(&mut self, name: &str, template: impl AsRef<str>) -> Result<()> {
        self.handlebars.register_template_string(name, template)?;
        Ok(())
    }

    pub fn register_fetch_helper(&mut self, client: reqwest::Client) {
        register_fetch_helper(&mut self.handlebars, client);
    }

    pub fn handlebars(&self) -> &Handlebars<'reg> {
        &self.handlebars
    }

    pub fn handlebars_mut(&mut self) -> &mut Handlebars<'reg> {
        &mut self.handlebars
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render the template registered as `name`
    pub async fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        render_async_with(&self.handlebars, name, data, &self.config).await
    }

    /// Render an inline template string
    pub async fn render_template<T: Serialize>(&self, template: &str, data: &T) -> Result<String> {
        render_template_async_with(&self.handlebars, template, data, &self.config).await
    }
}
