//! `fetch` helper
//!
//! `{{fetch "https://example.com/fragment.html"}}` renders the body of an
//! HTTP GET. The request runs after the synchronous pass; a transport error
//! or a non-success status shows up as the usual inline failure marker.

use handlebars::{Context, Handlebars, Helper, RenderError, RenderErrorReason};

use crate::helper::{register_async_helper, HelperValue};

pub const FETCH_HELPER: &str = "fetch";

/// Register `fetch` on `handlebars`, issuing requests through `client`.
pub fn register_fetch_helper(handlebars: &mut Handlebars<'_>, client: reqwest::Client) {
    register_async_helper(handlebars, FETCH_HELPER, move |h, ctx| {
        fetch_helper(&client, h, ctx)
    });
}

fn fetch_helper(
    client: &reqwest::Client,
    h: &Helper<'_>,
    _: &Context,
) -> Result<HelperValue, RenderError> {
    let url = h
        .param(0)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex(FETCH_HELPER, 0))?
        .value()
        .as_str()
        .ok_or(RenderErrorReason::InvalidParamType("string"))?
        .to_string();

    let request = client.get(url.as_str());
    Ok(HelperValue::deferred(async move {
        tracing::debug!(url = %url, "Fetching");
        let response = request.send().await?.error_for_status()?;
        response.text().await
    }))
}
