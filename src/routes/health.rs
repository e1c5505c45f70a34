//! Health check endpoint

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::responses::json_response;
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    pub node_id: String,
    pub mode: &'static str,
    pub cache: CacheHealth,
}

#[derive(Serialize)]
pub struct CacheHealth {
    pub namespace: String,
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub clears: u64,
}

/// GET /health
pub fn health_check(state: &AppState) -> Response<Full<Bytes>> {
    let stats = state.settings.stats();
    json_response(
        StatusCode::OK,
        &HealthResponse {
            healthy: true,
            version: env!("CARGO_PKG_VERSION"),
            node_id: state.args.node_id.to_string(),
            mode: if state.args.dev_mode { "development" } else { "production" },
            cache: CacheHealth {
                namespace: state.settings.namespace().to_string(),
                entries: stats.entries,
                hits: stats.hits,
                misses: stats.misses,
                clears: stats.clears,
            },
        },
    )
}
