//! lockgate - membership-gated topic access

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lockgate::{
    cache::{spawn_invalidation_listener, InvalidationBus, LocalInvalidation, NatsInvalidation},
    config::Args,
    db::{MongoClient, MongoStore},
    nats::NatsClient,
    server::{self, AppState, Stores},
    store::{MemoryContentStore, MemorySettingsStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("lockgate={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  lockgate - membership-gated topics");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Cache namespace: {}", args.cache_namespace);
    info!("NATS: {}", args.nats.nats_url);
    info!("MongoDB: {}", args.mongodb_uri);
    info!("======================================");

    // MongoDB (optional in dev mode)
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => match MongoStore::new(&client).await {
            Ok(store) => {
                info!("Serving content from MongoDB database '{}'", client.db_name());
                Some(store)
            }
            Err(e) => {
                error!("MongoDB collection setup failed: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) if args.dev_mode => {
            warn!("MongoDB connection failed (dev mode, using in-memory stores): {}", e);
            None
        }
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            std::process::exit(1);
        }
    };

    let stores = match mongo {
        Some(store) => Stores::mongo(store),
        None => Stores::memory(
            Arc::new(MemoryContentStore::new()),
            Arc::new(MemorySettingsStore::new()),
        ),
    };

    // NATS (optional in dev mode; clears then stay local to this process)
    let nats = match NatsClient::new(&args.nats, &format!("lockgate-{}", args.node_id)).await {
        Ok(client) => {
            info!("Cache clears fan out over NATS as {}", client.name());
            Some(client)
        }
        Err(e) if args.dev_mode => {
            warn!("NATS connection failed (dev mode, cache clears stay local): {}", e);
            None
        }
        Err(e) => {
            error!("NATS connection failed: {}", e);
            std::process::exit(1);
        }
    };

    let origin = args.node_id;
    let bus: Arc<dyn InvalidationBus> = match &nats {
        Some(client) => Arc::new(NatsInvalidation::new(client.clone(), origin)),
        None => Arc::new(LocalInvalidation),
    };

    let state = Arc::new(AppState::new(args, stores, bus)?);

    let listener = match &nats {
        Some(client) => {
            Some(spawn_invalidation_listener(client.clone(), Arc::clone(&state.settings), origin).await?)
        }
        None => None,
    };

    tokio::select! {
        result = server::run(state) => {
            if let Err(e) = result {
                error!("Server error: {:?}", e);
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    if let Some(handle) = listener {
        handle.abort();
    }
    if let Some(client) = nats {
        if let Err(e) = client.flush().await {
            warn!("NATS flush failed during shutdown: {}", e);
        }
    }

    Ok(())
}
