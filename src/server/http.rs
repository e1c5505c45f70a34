//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Requests are parsed into
//! a [`RequestContext`] and routed by [`dispatch`], which tests drive directly.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::JwtValidator;
use crate::cache::{ConfigCache, InvalidationBus};
use crate::config::Args;
use crate::db::MongoStore;
use crate::gate::AccessGate;
use crate::routes::{self, error_response, RequestContext, TopicLookup};
use crate::store::{
    MemoryContentStore, MemorySettingsStore, MembershipStore, SettingsStore, TopicStore,
};
use crate::types::{GateError, Result};

/// JWT expiry for tokens minted by this process (dev tooling only)
const TOKEN_EXPIRY_SECONDS: u64 = 3600;

/// The external stores lockgate reads from
#[derive(Clone)]
pub struct Stores {
    pub topics: Arc<dyn TopicStore>,
    pub memberships: Arc<dyn MembershipStore>,
    pub settings: Arc<dyn SettingsStore>,
}

impl Stores {
    pub fn mongo(store: MongoStore) -> Self {
        let store = Arc::new(store);
        Self {
            topics: Arc::clone(&store) as Arc<dyn TopicStore>,
            memberships: Arc::clone(&store) as Arc<dyn MembershipStore>,
            settings: store as Arc<dyn SettingsStore>,
        }
    }

    pub fn memory(content: Arc<MemoryContentStore>, settings: Arc<MemorySettingsStore>) -> Self {
        Self {
            topics: Arc::clone(&content) as Arc<dyn TopicStore>,
            memberships: content as Arc<dyn MembershipStore>,
            settings: settings as Arc<dyn SettingsStore>,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub topics: Arc<dyn TopicStore>,
    pub gate: AccessGate,
    /// Cached view of the settings row
    pub settings: Arc<ConfigCache>,
    /// Durable settings row, written by the admin route
    pub settings_store: Arc<dyn SettingsStore>,
    pub jwt: JwtValidator,
}

impl AppState {
    pub fn new(args: Args, stores: Stores, bus: Arc<dyn InvalidationBus>) -> Result<Self> {
        let jwt = match (&args.jwt_secret, args.dev_mode) {
            (Some(secret), _) => JwtValidator::new(secret.clone(), TOKEN_EXPIRY_SECONDS)?,
            (None, true) => JwtValidator::new_dev(),
            (None, false) => {
                return Err(GateError::Config(
                    "JWT_SECRET is required in production mode".into(),
                ))
            }
        };

        let settings = Arc::new(ConfigCache::new(
            args.cache_namespace.clone(),
            Arc::clone(&stores.settings),
            bus,
        ));

        Ok(Self {
            args,
            topics: stores.topics,
            gate: AccessGate::new(stores.memberships),
            settings,
            settings_store: stores.settings,
            jwt,
        })
    }
}

pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "lockgate listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - dev JWT secret accepted");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = hyper_util::rt::TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Parse the hyper request and dispatch it
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
    };
    let accept = header("accept");
    let authorization = header("authorization");

    info!("[{}] {} {}", addr, method, path);

    let viewer = match state.jwt.viewer_from_header(authorization.as_deref()) {
        Ok(viewer) => viewer,
        Err(e) => {
            let (format, _) = routes::ResponseFormat::detect(&path, accept.as_deref());
            return Ok(error_response(&e, format));
        }
    };

    let body = req.into_body().collect().await?.to_bytes();
    let ctx = RequestContext::new(
        method,
        &path,
        query.as_deref(),
        accept.as_deref(),
        viewer,
        body,
    );

    Ok(dispatch(&state, ctx).await)
}

/// Route a parsed request; errors become responses in the caller's format
pub async fn dispatch(state: &AppState, mut ctx: RequestContext) -> Response<Full<Bytes>> {
    match route(state, &mut ctx).await {
        Ok(response) => response,
        Err(err) => {
            if err.is_infrastructure() {
                error!(path = %ctx.path, error = %err, "Store failure while handling request");
            } else {
                info!(path = %ctx.path, error = %err, "Request failed");
            }
            error_response(&err, ctx.format)
        }
    }
}

async fn route(state: &AppState, ctx: &mut RequestContext) -> Result<Response<Full<Bytes>>> {
    let path = ctx.path.clone();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (&ctx.method, segments.as_slice()) {
        (&Method::GET, []) => routes::index(state).await,
        (&Method::GET, ["health"]) | (&Method::GET, ["healthz"]) => {
            Ok(routes::health_check(state))
        }
        (&Method::GET, ["categories"]) => routes::list_categories(state, ctx).await,
        (&Method::GET, ["t", rest @ ..]) => {
            let lookup = topic_lookup(ctx, rest)?;
            routes::handle_topic(state, ctx, lookup).await
        }
        (&Method::GET, ["admin", "plugins", "unlock"]) => routes::get_settings(state, ctx).await,
        (&Method::PUT, ["admin", "plugins", "unlock"]) => {
            routes::update_settings(state, ctx).await
        }
        _ => Err(GateError::NotFound(path.clone())),
    }
}

/// Resolve `/t/...` segments and record them as request params
///
/// `/t/{id}` sets `id`, `/t/{slug}/{id}` sets `slug` and `topic_id`,
/// `/t/{slug}` sets only `slug`.
fn topic_lookup(ctx: &mut RequestContext, segments: &[&str]) -> Result<TopicLookup> {
    match segments {
        [single] => match single.parse::<i64>() {
            Ok(id) => {
                ctx.params.insert("id", *single);
                Ok(TopicLookup::Id(id))
            }
            Err(_) => {
                ctx.params.insert("slug", *single);
                Ok(TopicLookup::Slug(single.to_string()))
            }
        },
        [slug, id] => {
            let topic_id = id
                .parse::<i64>()
                .map_err(|_| GateError::NotFound(ctx.path.clone()))?;
            ctx.params.insert("slug", *slug);
            ctx.params.insert("topic_id", *id);
            Ok(TopicLookup::Id(topic_id))
        }
        _ => Err(GateError::NotFound(ctx.path.clone())),
    }
}
