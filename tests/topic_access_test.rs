//! Topic view pipeline integration tests
//!
//! Runs requests through `dispatch` against in-memory stores.

use bytes::Bytes;
use clap::Parser;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

use lockgate::cache::{LocalInvalidation, LockSettings};
use lockgate::config::Args;
use lockgate::gate::{Category, CategoryLock, Topic, Viewer};
use lockgate::routes::{RequestContext, PRELOAD_LOCK_KEY};
use lockgate::server::{dispatch, AppState, Stores};
use lockgate::store::{MemoryContentStore, MemorySettingsStore, SettingsStore};

struct Harness {
    state: AppState,
    content: Arc<MemoryContentStore>,
    settings: Arc<MemorySettingsStore>,
}

fn harness() -> Harness {
    let content = Arc::new(MemoryContentStore::new());
    let premium =
        Category::new(5, "Premium", "premium").locked(CategoryLock::new("0xABC", "members"));
    content.insert_topic(Topic::new(42, "welcome-members", "Welcome Members", premium));
    content.insert_topic(Topic::new(7, "hello", "Hello", Category::new(1, "General", "general")));

    let settings = Arc::new(MemorySettingsStore::new());
    let args = Args::parse_from(["lockgate", "--dev-mode"]);
    let state = assert_ok!(AppState::new(
        args,
        Stores::memory(Arc::clone(&content), Arc::clone(&settings)),
        Arc::new(LocalInvalidation),
    ));

    Harness {
        state,
        content,
        settings,
    }
}

async fn body_of(response: Response<Full<Bytes>>) -> Bytes {
    assert_ok!(response.into_body().collect().await).to_bytes()
}

async fn json_of(response: Response<Full<Bytes>>) -> Value {
    assert_ok!(serde_json::from_slice(&body_of(response).await))
}

async fn text_of(response: Response<Full<Bytes>>) -> String {
    assert_ok!(String::from_utf8(body_of(response).await.to_vec()))
}

#[tokio::test]
async fn test_non_member_gets_payment_required_with_lock() {
    let h = harness();
    let response = dispatch(&h.state, RequestContext::get("/t/42.json", Viewer::user(9, "alice"))).await;

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(
        json_of(response).await,
        json!({
            "error": "Payment Required",
            "lock": "0xABC",
            "url": "/t/welcome-members/42",
        })
    );
}

#[tokio::test]
async fn test_slug_route_degrades_to_bare_body() {
    let h = harness();
    let response = dispatch(
        &h.state,
        RequestContext::get("/t/welcome-members.json", Viewer::user(9, "alice")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(json_of(response).await, json!({ "error": "Payment Required" }));
}

#[tokio::test]
async fn test_topic_id_path_param_wins_over_query() {
    let h = harness();
    let response = dispatch(
        &h.state,
        RequestContext::get("/t/welcome-members/42.json?topic_id=7", Viewer::anonymous()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(json_of(response).await["url"], "/t/welcome-members/42");
}

#[tokio::test]
async fn test_denial_body_hides_unlisted_topic_from_params() {
    let h = harness();
    let staff = Category::new(9, "Staff", "staff").locked(CategoryLock::new("0xSTAFF", "staff"));
    let mut unlisted = Topic::new(99, "secret-staff-plan", "Secret", staff);
    unlisted.visible = false;
    h.content.insert_topic(unlisted);

    let direct = dispatch(&h.state, RequestContext::get("/t/99.json", Viewer::user(9, "alice"))).await;
    assert_eq!(direct.status(), StatusCode::NOT_FOUND);

    let response = dispatch(
        &h.state,
        RequestContext::get("/t/42.json?topic_id=99", Viewer::user(9, "alice")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(json_of(response).await, json!({ "error": "Payment Required" }));
}

#[tokio::test]
async fn test_unlocked_category_is_open_to_everyone() {
    let h = harness();
    for viewer in [Viewer::anonymous(), Viewer::user(9, "alice")] {
        let response = dispatch(&h.state, RequestContext::get("/t/7.json", viewer)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_of(response).await["id"], 7);
    }
    assert_eq!(h.content.membership_queries(), 0);
}

#[tokio::test]
async fn test_member_and_admin_pass_the_lock() {
    let h = harness();
    h.content.add_member(9, "members");

    let member = dispatch(&h.state, RequestContext::get("/t/42.json", Viewer::user(9, "alice"))).await;
    assert_eq!(member.status(), StatusCode::OK);

    let admin = dispatch(&h.state, RequestContext::get("/t/42.json", Viewer::admin(1, "root"))).await;
    assert_eq!(admin.status(), StatusCode::OK);

    h.content.remove_member(9, "members");
    let revoked = dispatch(&h.state, RequestContext::get("/t/42.json", Viewer::user(9, "alice"))).await;
    assert_eq!(revoked.status(), StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_missing_topic_is_not_found_not_locked() {
    let h = harness();
    let response = dispatch(&h.state, RequestContext::get("/t/999.json", Viewer::anonymous())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_html_denial_carries_preloaded_settings() {
    let h = harness();
    h.settings.put(LockSettings {
        lock_address: Some("0xABC".into()),
        lock_call_to_action: Some("Join".into()),
        ..Default::default()
    });

    let response = dispatch(&h.state, RequestContext::get("/t/42", Viewer::user(9, "alice"))).await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    let html = text_of(response).await;
    assert!(html.contains("Payment Required"));
    assert!(html.contains("data-preloaded"));
    assert!(html.contains(PRELOAD_LOCK_KEY));
    assert!(html.contains("0xABC"));
}

#[tokio::test]
async fn test_admin_update_clears_cached_settings() {
    let h = harness();
    h.settings.put(LockSettings {
        lock_address: Some("0xOLD".into()),
        ..Default::default()
    });

    // Warm the cache
    let before = dispatch(&h.state, RequestContext::get("/", Viewer::anonymous())).await;
    assert!(text_of(before).await.contains("0xOLD"));

    let update = RequestContext::new(
        Method::PUT,
        "/admin/plugins/unlock",
        None,
        Some("application/json"),
        Viewer::admin(1, "root"),
        Bytes::from(r#"{"lock_address":"0xNEW","lock_network":"100"}"#),
    );
    let response = dispatch(&h.state, update).await;
    assert_eq!(response.status(), StatusCode::OK);

    let stored = assert_ok!(h.settings.load().await);
    assert_eq!(stored.and_then(|s| s.lock_address).as_deref(), Some("0xNEW"));

    let after = dispatch(&h.state, RequestContext::get("/", Viewer::anonymous())).await;
    let html = text_of(after).await;
    assert!(html.contains("0xNEW"));
    assert!(!html.contains("0xOLD"));
}

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let h = harness();

    let anonymous = dispatch(
        &h.state,
        RequestContext::get("/admin/plugins/unlock.json", Viewer::anonymous()),
    )
    .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let user = dispatch(
        &h.state,
        RequestContext::get("/admin/plugins/unlock.json", Viewer::user(9, "alice")),
    )
    .await;
    assert_eq!(user.status(), StatusCode::FORBIDDEN);

    let bad_body = RequestContext::new(
        Method::PUT,
        "/admin/plugins/unlock",
        None,
        Some("application/json"),
        Viewer::admin(1, "root"),
        Bytes::from_static(b"not json"),
    );
    let response = dispatch(&h.state, bad_body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_categories_expose_lock_flags() {
    let h = harness();
    let response = dispatch(&h.state, RequestContext::get("/categories.json", Viewer::anonymous())).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_of(response).await;
    let categories = assert_ok!(body["categories"].as_array().ok_or("no categories"));
    let premium = categories
        .iter()
        .find(|c| c["id"] == 5)
        .cloned()
        .unwrap_or_default();
    assert_eq!(premium["lock"], "0xABC");
    assert_eq!(premium["include_lock"], true);

    let general = categories
        .iter()
        .find(|c| c["id"] == 1)
        .cloned()
        .unwrap_or_default();
    assert_eq!(general["include_lock"], false);
    assert!(general.get("lock").is_none());
}

#[tokio::test]
async fn test_settings_outage_fails_normal_pages_but_not_denials() {
    let h = harness();
    h.settings.set_offline(true);
    assert_err!(h.settings.load().await);

    let index = dispatch(&h.state, RequestContext::get("/", Viewer::anonymous())).await;
    assert_eq!(index.status(), StatusCode::SERVICE_UNAVAILABLE);

    let denial = dispatch(&h.state, RequestContext::get("/t/42", Viewer::anonymous())).await;
    assert_eq!(denial.status(), StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let h = harness();
    let response = dispatch(&h.state, RequestContext::get("/nope.json", Viewer::anonymous())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
