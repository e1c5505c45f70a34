//! Page bootstrap payload
//!
//! Every full page render carries a `data-preloaded` map so the browser can
//! boot without follow-up requests. When settings exist, the whitelisted lock
//! settings are stored under [`PRELOAD_LOCK_KEY`] for the unlock widget.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use std::collections::BTreeMap;

use super::responses::{escape_html, html_response};
use crate::cache::ConfigCache;
use crate::types::Result;

/// Preload key holding the client lock settings
pub const PRELOAD_LOCK_KEY: &str = "lock";

/// Values preloaded into a page, each a JSON-encoded string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preloaded(BTreeMap<String, String>);

impl Preloaded {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, key: &str, json: String) {
        self.0.insert(key.to_string(), json);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

/// JSON for the client lock settings, `None` when settings were never saved
pub async fn lock_settings_json(cache: &ConfigCache) -> Result<Option<String>> {
    match cache.persisted().await? {
        Some(settings) => Ok(Some(serde_json::to_string(&settings.client_view())?)),
        None => Ok(None),
    }
}

/// Build the preload map for an initial page load
pub async fn preload_json(cache: &ConfigCache) -> Result<Preloaded> {
    let mut preloaded = Preloaded::new();
    if let Some(json) = lock_settings_json(cache).await? {
        preloaded.store(PRELOAD_LOCK_KEY, json);
    }
    Ok(preloaded)
}

/// Render the application shell around `body_html`
pub fn render_page(
    status: StatusCode,
    site_title: &str,
    page_title: Option<&str>,
    preloaded: &Preloaded,
    body_html: &str,
) -> Response<Full<Bytes>> {
    let title = match page_title {
        Some(page) => format!("{} - {}", page, site_title),
        None => site_title.to_string(),
    };

    html_response(
        status,
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n\
             <body>\n<div id=\"data-preloaded\" data-preloaded=\"{preloaded}\"></div>\n\
             <section id=\"main\">\n{body}\n</section>\n</body>\n</html>\n",
            title = escape_html(&title),
            preloaded = escape_html(&preloaded.to_json()),
            body = body_html,
        ),
    )
}
