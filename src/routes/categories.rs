//! Category listing with lock indicators
//!
//! Each lock field is paired with an `include_*` flag so clients can tell an
//! absent lock from an empty one. The icon is only exposed on locked
//! categories.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::preload::{preload_json, render_page};
use super::request::{RequestContext, ResponseFormat};
use super::responses::{escape_html, json_response};
use crate::gate::{Category, CategoryLock};
use crate::server::AppState;
use crate::types::Result;

/// Lock fields as exposed to clients
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryLockView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock: Option<String>,
    pub include_lock: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_icon: Option<String>,
    pub include_lock_icon: bool,
}

impl From<&CategoryLock> for CategoryLockView {
    fn from(lock: &CategoryLock) -> Self {
        let address = lock.address();
        let icon = address.and(lock.icon());
        Self {
            lock: address.map(str::to_string),
            include_lock: address.is_some(),
            lock_icon: icon.map(str::to_string),
            include_lock_icon: icon.is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(flatten)]
    pub lock: CategoryLockView,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
            lock: CategoryLockView::from(&category.lock),
        }
    }
}

#[derive(Debug, Serialize)]
struct CategoryList {
    categories: Vec<CategoryView>,
}

/// GET /categories
pub async fn list_categories(
    state: &AppState,
    ctx: &RequestContext,
) -> Result<Response<Full<Bytes>>> {
    let categories: Vec<CategoryView> = state
        .topics
        .list_categories()
        .await?
        .iter()
        .map(CategoryView::from)
        .collect();

    match ctx.format {
        ResponseFormat::Json => Ok(json_response(StatusCode::OK, &CategoryList { categories })),
        ResponseFormat::Html => {
            let items: String = categories
                .iter()
                .map(|c| {
                    let marker = if c.lock.include_lock { " data-locked=\"true\"" } else { "" };
                    format!("<li data-category-id=\"{}\"{}>{}</li>", c.id, marker, escape_html(&c.name))
                })
                .collect();
            let preloaded = preload_json(&state.settings).await?;
            Ok(render_page(
                StatusCode::OK,
                &state.args.site_title,
                Some("Categories"),
                &preloaded,
                &format!("<ul class=\"categories\">{}</ul>", items),
            ))
        }
    }
}
