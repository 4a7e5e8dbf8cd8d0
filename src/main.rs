//! Game Forge Back binary entrypoint wiring REST, SSE and the sync store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use game_forge_back::{
    config::AppConfig,
    dao::sync_store::memory::MemorySyncStore,
    routes,
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let event_capacity = config.event_capacity();
    let app_state = AppState::new(config);

    install_sync_store(app_state.clone(), event_capacity).await;
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Supervise a CouchDB sync store when one is configured, otherwise serve from memory.
#[cfg(feature = "couch-store")]
async fn install_sync_store(state: SharedState, event_capacity: usize) {
    use game_forge_back::{
        dao::{
            storage::StorageError,
            sync_store::{
                SyncStore,
                couchdb::{CouchConfig, CouchSyncStore},
            },
        },
        services::storage_supervisor,
    };
    use tracing::warn;

    match CouchConfig::from_env() {
        Ok(couch_config) => {
            info!(base_url = %couch_config.base_url, database = %couch_config.database, "using CouchDB sync store");
            tokio::spawn(storage_supervisor::run(state, move || {
                let couch_config = couch_config.clone();
                async move {
                    let store = CouchSyncStore::connect(couch_config, event_capacity).await?;
                    Ok::<Arc<dyn SyncStore>, StorageError>(Arc::new(store))
                }
            }));
        }
        Err(err) => {
            warn!(error = %err, "CouchDB not configured; using in-memory sync store");
            state
                .set_sync_store(Arc::new(MemorySyncStore::new(event_capacity)))
                .await;
        }
    }
}

#[cfg(not(feature = "couch-store"))]
async fn install_sync_store(state: SharedState, event_capacity: usize) {
    info!("using in-memory sync store");
    state
        .set_sync_store(Arc::new(MemorySyncStore::new(event_capacity)))
        .await;
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
