//! Payment Required responses for locked topics
//!
//! When the topic view pipeline returns a denial, API clients get a 402 JSON
//! body carrying the lock address and the canonical topic URL (so they can
//! start the unlock flow); browsers get the 402 error page.
//!
//! The payload is rebuilt from the request parameters (`topic_id`, then
//! `id`). If neither resolves to a topic the viewer can see, the body
//! degrades to the bare error.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::{info, warn};

use super::preload::{preload_json, render_page, Preloaded};
use super::request::{RequestContext, RequestParams, ResponseFormat};
use super::responses::json_response;
use super::topic::is_visible_to;
use crate::gate::{Denial, Viewer};
use crate::server::AppState;
use crate::store::TopicStore;

pub const PAYMENT_REQUIRED: &str = "Payment Required";

/// Parameters naming the denied topic, in priority order
const TOPIC_PARAMS: &[&str] = &["topic_id", "id"];

/// Structured 402 body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequiredBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl PaymentRequiredBody {
    pub fn bare() -> Self {
        Self {
            error: PAYMENT_REQUIRED,
            lock: None,
            url: None,
        }
    }
}

/// Build the 402 body from the request parameters
///
/// Lookup failures never fail the response; they only drop `lock` and `url`.
/// Topics hidden from `viewer` count as unresolved.
pub async fn payment_required_body(
    params: &RequestParams,
    viewer: &Viewer,
    topics: &dyn TopicStore,
) -> PaymentRequiredBody {
    let mut body = PaymentRequiredBody::bare();

    let Some(raw_id) = params.first_of(TOPIC_PARAMS) else {
        return body;
    };
    let Ok(topic_id) = raw_id.parse::<i64>() else {
        return body;
    };

    match topics.find_topic(topic_id).await {
        Ok(Some(topic)) if is_visible_to(viewer, &topic) => {
            body.lock = topic.lock().address().map(str::to_string);
            body.url = Some(topic.relative_url());
        }
        Ok(_) => {}
        Err(e) => {
            warn!(topic_id, error = %e, "Topic lookup failed while building 402 body");
        }
    }

    body
}

/// Turn a denial into the outbound response
pub async fn payment_required(
    state: &AppState,
    ctx: &RequestContext,
    denial: &Denial,
) -> Response<Full<Bytes>> {
    info!(
        topic_id = denial.topic_id,
        category_id = denial.category_id,
        lock = %denial.lock_address,
        user_id = ?ctx.viewer.user_id,
        "Topic locked for viewer"
    );

    match ctx.format {
        ResponseFormat::Json => {
            let body =
                payment_required_body(&ctx.params, &ctx.viewer, state.topics.as_ref()).await;
            json_response(StatusCode::PAYMENT_REQUIRED, &body)
        }
        ResponseFormat::Html => {
            // The denial is the answer; a settings outage only costs the widget
            let preloaded = match preload_json(&state.settings).await {
                Ok(preloaded) => preloaded,
                Err(e) => {
                    warn!(error = %e, "Settings unavailable for 402 page");
                    Preloaded::new()
                }
            };
            render_page(
                StatusCode::PAYMENT_REQUIRED,
                &state.args.site_title,
                Some(PAYMENT_REQUIRED),
                &preloaded,
                "<div class=\"page-not-found\"><h1>Payment Required</h1>\
                 <p>This topic is in a locked category. Unlock it to continue.</p></div>",
            )
        }
    }
}
