//! Admin settings routes
//!
//! GET returns the stored settings blob; PUT replaces it and clears the
//! settings cache on every process.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use tracing::info;

use super::request::RequestContext;
use super::responses::json_response;
use crate::cache::LockSettings;
use crate::server::AppState;
use crate::types::{GateError, Result};

fn require_admin(ctx: &RequestContext) -> Result<()> {
    if ctx.viewer.is_anonymous() {
        return Err(GateError::Unauthorized("login required".into()));
    }
    if !ctx.viewer.is_admin {
        return Err(GateError::Forbidden("admin access required".into()));
    }
    Ok(())
}

/// GET /admin/plugins/unlock
pub async fn get_settings(state: &AppState, ctx: &RequestContext) -> Result<Response<Full<Bytes>>> {
    require_admin(ctx)?;
    let settings = state.settings.settings().await?;
    Ok(json_response(StatusCode::OK, &*settings))
}

/// PUT /admin/plugins/unlock
pub async fn update_settings(
    state: &AppState,
    ctx: &RequestContext,
) -> Result<Response<Full<Bytes>>> {
    require_admin(ctx)?;

    let settings: LockSettings = serde_json::from_slice(&ctx.body)?;
    state.settings_store.save(&settings).await?;
    state.settings.clear().await?;

    info!(
        user_id = ?ctx.viewer.user_id,
        lock_address = ?settings.lock_address,
        "Lock settings updated"
    );

    Ok(json_response(StatusCode::OK, &settings))
}
