/// Account bootstrap and access-group checks.
pub mod account_service;
/// Entity creation, edits, deletion, references and change feeds.
pub mod content_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Game-level summary, naming and rulebook operations.
pub mod game_service;
/// Health check service.
pub mod health_service;
#[cfg(test)]
pub(crate) mod scripted_store;
/// Server-Sent Events change feed.
pub mod sse_service;
/// Sync backend connection supervisor.
pub mod storage_supervisor;

#[cfg(test)]
pub(crate) async fn memory_state() -> (
    crate::state::SharedState,
    std::sync::Arc<crate::dao::sync_store::memory::MemorySyncStore>,
) {
    use std::sync::Arc;

    use crate::{config::AppConfig, dao::sync_store::memory::MemorySyncStore, state::AppState};

    let state = AppState::new(AppConfig::default());
    let store = Arc::new(MemorySyncStore::new(64));
    state.set_sync_store(store.clone()).await;
    (state, store)
}
