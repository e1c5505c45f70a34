//! Parsed request context shared by all route handlers

use bytes::Bytes;
use hyper::Method;
use std::collections::HashMap;

use crate::gate::Viewer;

/// Representation the caller asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Structured payload for API clients
    Json,
    /// Rendered page for browsers
    Html,
}

impl ResponseFormat {
    /// Detect the format from the path suffix and `Accept` header
    ///
    /// Returns the format and the path with any `.json` suffix removed.
    pub fn detect<'a>(path: &'a str, accept: Option<&str>) -> (Self, &'a str) {
        if let Some(stripped) = path.strip_suffix(".json") {
            return (ResponseFormat::Json, stripped);
        }

        let wants_json = accept
            .map(|accept| {
                accept
                    .split(',')
                    .map(|part| part.split(';').next().unwrap_or("").trim())
                    .any(|mime| mime == "application/json")
            })
            .unwrap_or(false);

        if wants_json {
            (ResponseFormat::Json, path)
        } else {
            (ResponseFormat::Html, path)
        }
    }
}

/// Merged query string and path parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams(HashMap<String, String>);

impl RequestParams {
    /// Parse a raw query string; malformed pairs are dropped
    pub fn from_query(query: Option<&str>) -> Self {
        let pairs: Vec<(String, String)> = query
            .and_then(|q| serde_urlencoded::from_str(q).ok())
            .unwrap_or_default();
        Self(pairs.into_iter().collect())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Set a path parameter; overrides a query parameter of the same name
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// First of `keys` that is present, in order
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.get(key))
    }
}

/// Everything a route handler needs from the HTTP request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    /// Request path without a `.json` suffix
    pub path: String,
    pub format: ResponseFormat,
    pub params: RequestParams,
    pub viewer: Viewer,
    pub body: Bytes,
}

impl RequestContext {
    pub fn new(
        method: Method,
        raw_path: &str,
        query: Option<&str>,
        accept: Option<&str>,
        viewer: Viewer,
        body: Bytes,
    ) -> Self {
        let (format, path) = ResponseFormat::detect(raw_path, accept);
        Self {
            method,
            path: path.to_string(),
            format,
            params: RequestParams::from_query(query),
            viewer,
            body,
        }
    }

    /// A bodiless GET, mostly for tests
    pub fn get(path_and_query: &str, viewer: Viewer) -> Self {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path_and_query, None),
        };
        Self::new(Method::GET, path, query, None, viewer, Bytes::new())
    }
}
