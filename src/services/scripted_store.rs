//! Sync store wrapper for tests that need slow lookups or a failing backend.

use std::{io, sync::Arc, time::Duration};

use futures::future::{self, BoxFuture};
use tokio::sync::broadcast;

use crate::dao::{
    changes::{Change, ChangeEvent},
    models::{AccessGroup, AccountId, Document, GroupId, RecordId},
    storage::{StorageError, StorageResult},
    sync_store::{SyncStore, memory::MemorySyncStore},
};

pub(crate) struct ScriptedStore {
    inner: Arc<MemorySyncStore>,
    lookup_delay: Duration,
    refuse_commits: bool,
}

impl ScriptedStore {
    /// Delay every account-root lookup by `delay`.
    pub(crate) fn slow_lookups(inner: Arc<MemorySyncStore>, delay: Duration) -> Self {
        Self {
            inner,
            lookup_delay: delay,
            refuse_commits: false,
        }
    }

    /// Accept creates but fail every commit as unavailable.
    pub(crate) fn refusing_commits(inner: Arc<MemorySyncStore>) -> Self {
        Self {
            inner,
            lookup_delay: Duration::ZERO,
            refuse_commits: true,
        }
    }
}

impl SyncStore for ScriptedStore {
    fn create(&self, document: Document) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.create(document)
    }

    fn load(&self, id: RecordId) -> BoxFuture<'static, StorageResult<Option<Document>>> {
        self.inner.load(id)
    }

    fn commit(&self, id: RecordId, change: Change) -> BoxFuture<'static, StorageResult<Document>> {
        if self.refuse_commits {
            let err = StorageError::unavailable(
                format!("commit on `{id}` refused"),
                io::Error::other("backend offline"),
            );
            return Box::pin(future::ready(Err(err)));
        }
        self.inner.commit(id, change)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.inner.subscribe()
    }

    fn create_group(&self, group: AccessGroup) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.create_group(group)
    }

    fn find_group(&self, id: GroupId) -> BoxFuture<'static, StorageResult<Option<AccessGroup>>> {
        self.inner.find_group(id)
    }

    fn find_account_root(
        &self,
        account: AccountId,
    ) -> BoxFuture<'static, StorageResult<Option<RecordId>>> {
        let lookup = self.inner.find_account_root(account);
        let delay = self.lookup_delay;
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            lookup.await
        })
    }

    fn bind_account_root(
        &self,
        account: AccountId,
        root: RecordId,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.bind_account_root(account, root)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.health_check()
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.try_reconnect()
    }
}
