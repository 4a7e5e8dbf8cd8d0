/// CouchDB document backend.
#[cfg(feature = "couch-store")]
pub mod couchdb;
/// In-process backend.
pub mod memory;

use futures::future::BoxFuture;
use tokio::sync::broadcast;

use crate::dao::{
    changes::{Change, ChangeEvent},
    models::{AccessGroup, AccountId, Document, GroupId, RecordId},
    storage::StorageResult,
};

/// Abstraction over the external sync layer holding the record arena.
///
/// Backends apply commits to a single record in arrival order, so concurrent
/// writers resolve per field with the last write winning.
pub trait SyncStore: Send + Sync {
    /// Store a brand-new document. Fails if the ID is already taken.
    fn create(&self, document: Document) -> BoxFuture<'static, StorageResult<()>>;
    /// Latest version of a record, `None` when it is not available here.
    fn load(&self, id: RecordId) -> BoxFuture<'static, StorageResult<Option<Document>>>;
    /// Apply one change and return the updated document.
    fn commit(&self, id: RecordId, change: Change) -> BoxFuture<'static, StorageResult<Document>>;
    /// Receive every change accepted after this call.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
    /// Store a new access group.
    fn create_group(&self, group: AccessGroup) -> BoxFuture<'static, StorageResult<()>>;
    /// Look up an access group.
    fn find_group(&self, id: GroupId) -> BoxFuture<'static, StorageResult<Option<AccessGroup>>>;
    /// Root record bound to `account`, if any.
    fn find_account_root(
        &self,
        account: AccountId,
    ) -> BoxFuture<'static, StorageResult<Option<RecordId>>>;
    /// Bind an account to its root record. Fails if the account is already bound.
    fn bind_account_root(
        &self,
        account: AccountId,
        root: RecordId,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap liveness probe of the backend.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
