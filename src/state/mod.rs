mod session;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};

use crate::{
    config::AppConfig,
    dao::{models::AccountId, sync_store::SyncStore},
    error::ServiceError,
};

pub use self::session::Session;

/// Shared handle passed to every handler and service.
pub type SharedState = Arc<AppState>;

/// Central application state holding the sync-layer handle and configuration.
pub struct AppState {
    sync_store: RwLock<Option<Arc<dyn SyncStore>>>,
    config: AppConfig,
    degraded: watch::Sender<bool>,
    root_gates: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a sync store is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            sync_store: RwLock::new(None),
            config,
            degraded: degraded_tx,
            root_gates: DashMap::new(),
        })
    }

    /// Obtain a handle to the current sync store, if one is installed.
    pub async fn sync_store(&self) -> Option<Arc<dyn SyncStore>> {
        let guard = self.sync_store.read().await;
        guard.as_ref().cloned()
    }

    /// Sync store handle, or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_sync_store(&self) -> Result<Arc<dyn SyncStore>, ServiceError> {
        self.sync_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new sync store implementation and leave degraded mode.
    pub async fn set_sync_store(&self, store: Arc<dyn SyncStore>) {
        {
            let mut guard = self.sync_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current sync store and enter degraded mode.
    pub async fn clear_sync_store(&self) {
        {
            let mut guard = self.sync_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Loaded application configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Gate serializing root initialization of one account inside this process.
    pub fn root_gate(&self, account: &AccountId) -> Arc<Mutex<()>> {
        self.root_gates.entry(account.clone()).or_default().clone()
    }

    /// Drop the gate of an account whose root is bound.
    pub fn release_root_gate(&self, account: &AccountId) {
        self.root_gates.remove(account);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::sync_store::memory::MemorySyncStore;

    #[tokio::test]
    async fn starts_degraded_until_store_installed() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded().await);
        assert!(matches!(
            state.require_sync_store().await,
            Err(ServiceError::Degraded)
        ));

        let mut watcher = state.degraded_watcher();
        state
            .set_sync_store(Arc::new(MemorySyncStore::new(4)))
            .await;

        assert!(!state.is_degraded().await);
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());
        assert!(state.require_sync_store().await.is_ok());

        state.clear_sync_store().await;
        assert!(state.is_degraded().await);
        assert!(state.sync_store().await.is_none());
    }

    #[test]
    fn root_gates_are_per_account() {
        let state = AppState::new(AppConfig::default());
        let alice = AccountId::new("alice");

        let first = state.root_gate(&alice);
        assert!(Arc::ptr_eq(&first, &state.root_gate(&alice)));
        assert!(!Arc::ptr_eq(&first, &state.root_gate(&AccountId::new("bob"))));

        state.release_root_gate(&alice);
        assert!(!Arc::ptr_eq(&first, &state.root_gate(&alice)));
    }
}
