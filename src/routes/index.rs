//! Application shell

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

use super::preload::{preload_json, render_page};
use crate::server::AppState;
use crate::types::Result;

/// GET /
pub async fn index(state: &AppState) -> Result<Response<Full<Bytes>>> {
    let preloaded = preload_json(&state.settings).await?;
    Ok(render_page(
        StatusCode::OK,
        &state.args.site_title,
        None,
        &preloaded,
        "<div id=\"app\"></div>",
    ))
}
