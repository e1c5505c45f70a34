//! HTTP routes for lockgate

pub mod admin;
pub mod categories;
pub mod denial;
pub mod health;
pub mod index;
pub mod preload;
pub mod request;
pub mod responses;
pub mod topic;

pub use admin::{get_settings, update_settings};
pub use categories::{list_categories, CategoryLockView, CategoryView};
pub use denial::{payment_required, payment_required_body, PaymentRequiredBody, PAYMENT_REQUIRED};
pub use health::health_check;
pub use index::index;
pub use preload::{preload_json, render_page, Preloaded, PRELOAD_LOCK_KEY};
pub use request::{RequestContext, RequestParams, ResponseFormat};
pub use responses::{error_response, html_response, json_response};
pub use topic::{handle_topic, load_topic, TopicLookup, TopicOutcome, TopicView};
