//! Topic view pipeline
//!
//! Stages run in a fixed order:
//! 1. lookup (by id or slug) - missing topics are 404
//! 2. standard visibility - unlisted topics are 404 for non-staff
//! 3. lock stage ([`crate::gate::AccessGate`]) - denials go to [`super::denial`]
//! 4. serialization in the requested format

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::debug;

use super::denial::payment_required;
use super::preload::{preload_json, render_page};
use super::request::{RequestContext, ResponseFormat};
use super::responses::{escape_html, json_response};
use crate::gate::{AccessDecision, Denial, Topic, Viewer};
use crate::server::AppState;
use crate::types::{GateError, Result};

/// How the route identified the topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicLookup {
    Id(i64),
    Slug(String),
}

/// Result of running the pipeline up to serialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicOutcome {
    Visible(Topic),
    Locked(Denial),
}

/// Serialized topic for API clients
#[derive(Debug, Clone, Serialize)]
pub struct TopicView {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub category_id: i64,
    pub url: String,
}

impl From<&Topic> for TopicView {
    fn from(topic: &Topic) -> Self {
        Self {
            id: topic.id,
            title: topic.title.clone(),
            slug: topic.slug.clone(),
            category_id: topic.category.id,
            url: topic.relative_url(),
        }
    }
}

/// Standard visibility rule: unlisted topics are staff-only
pub fn is_visible_to(viewer: &Viewer, topic: &Topic) -> bool {
    topic.visible || viewer.is_staff()
}

/// Applied before the lock stage
fn ensure_visible(viewer: &Viewer, topic: &Topic) -> Result<()> {
    if !is_visible_to(viewer, topic) {
        return Err(GateError::NotFound(format!("topic {}", topic.id)));
    }
    Ok(())
}

/// Run lookup, visibility and lock stages
pub async fn load_topic(
    state: &AppState,
    viewer: &Viewer,
    lookup: &TopicLookup,
) -> Result<TopicOutcome> {
    let found = match lookup {
        TopicLookup::Id(id) => state.topics.find_topic(*id).await?,
        TopicLookup::Slug(slug) => state.topics.find_topic_by_slug(slug).await?,
    };
    let topic = found.ok_or_else(|| GateError::NotFound(format!("topic {:?}", lookup)))?;

    ensure_visible(viewer, &topic)?;

    match state.gate.check(viewer, &topic).await? {
        AccessDecision::Permit => Ok(TopicOutcome::Visible(topic)),
        AccessDecision::Deny(denial) => Ok(TopicOutcome::Locked(denial)),
    }
}

/// Handle a topic view request
pub async fn handle_topic(
    state: &AppState,
    ctx: &RequestContext,
    lookup: TopicLookup,
) -> Result<Response<Full<Bytes>>> {
    let topic = match load_topic(state, &ctx.viewer, &lookup).await? {
        TopicOutcome::Visible(topic) => topic,
        TopicOutcome::Locked(denial) => return Ok(payment_required(state, ctx, &denial).await),
    };

    debug!(topic_id = topic.id, "Serving topic");

    match ctx.format {
        ResponseFormat::Json => Ok(json_response(StatusCode::OK, &TopicView::from(&topic))),
        ResponseFormat::Html => {
            let preloaded = preload_json(&state.settings).await?;
            Ok(render_page(
                StatusCode::OK,
                &state.args.site_title,
                Some(&topic.title),
                &preloaded,
                &format!(
                    "<article class=\"topic\" data-topic-id=\"{}\"><h1>{}</h1></article>",
                    topic.id,
                    escape_html(&topic.title)
                ),
            ))
        }
    }
}
