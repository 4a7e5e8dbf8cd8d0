//! In-process last-writer-wins sync store.

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::{self, BoxFuture};
use tokio::sync::broadcast;
use tracing::debug;

use crate::dao::{
    changes::{Change, ChangeEvent, ChangeEventKind},
    models::{AccessGroup, AccountId, Document, GroupId, RecordId},
    storage::{StorageError, StorageResult},
    sync_store::SyncStore,
};

/// Arena kept entirely in memory. Commits on one record hold that record's
/// shard lock, which orders concurrent writers.
pub struct MemorySyncStore {
    documents: DashMap<RecordId, Document>,
    groups: DashMap<GroupId, AccessGroup>,
    roots: DashMap<AccountId, RecordId>,
    events: broadcast::Sender<ChangeEvent>,
}

impl MemorySyncStore {
    /// Build an empty store whose change feed buffers `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (events, _receiver) = broadcast::channel(capacity.max(1));
        Self {
            documents: DashMap::new(),
            groups: DashMap::new(),
            roots: DashMap::new(),
            events,
        }
    }

    /// Number of records held, reachable or not.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no record was ever stored.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn insert_document(&self, document: Document) -> StorageResult<()> {
        let event = match self.documents.entry(document.id) {
            Entry::Occupied(_) => {
                return Err(StorageError::AlreadyExists {
                    key: document.id.to_string(),
                });
            }
            Entry::Vacant(slot) => {
                let event = ChangeEvent {
                    id: document.id,
                    group: document.group,
                    version: document.version,
                    kind: ChangeEventKind::Created {
                        record: document.record.clone(),
                    },
                };
                slot.insert(document);
                event
            }
        };

        let _ = self.events.send(event);
        Ok(())
    }

    fn apply_change(&self, id: RecordId, change: Change) -> StorageResult<Document> {
        let (document, event) = {
            let mut entry = self
                .documents
                .get_mut(&id)
                .ok_or(StorageError::NotFound { id })?;

            entry
                .record
                .apply(&change)
                .map_err(|source| StorageError::Rejected { id, source })?;
            entry.version += 1;

            let event = ChangeEvent {
                id,
                group: entry.group,
                version: entry.version,
                kind: ChangeEventKind::Updated { change },
            };
            (entry.clone(), event)
        };

        debug!(record = %id, version = document.version, "committed change");
        let _ = self.events.send(event);
        Ok(document)
    }
}

impl SyncStore for MemorySyncStore {
    fn create(&self, document: Document) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(future::ready(self.insert_document(document)))
    }

    fn load(&self, id: RecordId) -> BoxFuture<'static, StorageResult<Option<Document>>> {
        let document = self.documents.get(&id).map(|entry| entry.clone());
        Box::pin(future::ready(Ok(document)))
    }

    fn commit(&self, id: RecordId, change: Change) -> BoxFuture<'static, StorageResult<Document>> {
        Box::pin(future::ready(self.apply_change(id, change)))
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    fn create_group(&self, group: AccessGroup) -> BoxFuture<'static, StorageResult<()>> {
        let result = match self.groups.entry(group.id) {
            Entry::Occupied(_) => Err(StorageError::AlreadyExists {
                key: group.id.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(group);
                Ok(())
            }
        };
        Box::pin(future::ready(result))
    }

    fn find_group(&self, id: GroupId) -> BoxFuture<'static, StorageResult<Option<AccessGroup>>> {
        let group = self.groups.get(&id).map(|entry| entry.clone());
        Box::pin(future::ready(Ok(group)))
    }

    fn find_account_root(
        &self,
        account: AccountId,
    ) -> BoxFuture<'static, StorageResult<Option<RecordId>>> {
        let root = self.roots.get(&account).map(|entry| *entry);
        Box::pin(future::ready(Ok(root)))
    }

    fn bind_account_root(
        &self,
        account: AccountId,
        root: RecordId,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let result = match self.roots.entry(account) {
            Entry::Occupied(entry) => Err(StorageError::AlreadyExists {
                key: entry.key().to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(root);
                Ok(())
            }
        };
        Box::pin(future::ready(result))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(future::ready(Ok(())))
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(future::ready(Ok(())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{
        changes::FieldWrite,
        models::{Ability, Record},
    };

    fn ability_document(group: GroupId) -> Document {
        Document::new(
            RecordId::new(),
            group,
            Record::Ability(Ability::default()),
        )
    }

    #[tokio::test]
    async fn commits_bump_version_and_broadcast() {
        let store = MemorySyncStore::new(8);
        let mut events = store.subscribe();
        let document = ability_document(GroupId::new());
        let id = document.id;

        store.create(document).await.unwrap();
        let updated = store
            .commit(
                id,
                Change::Set {
                    write: FieldWrite::Name("Fireball".into()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.version, 1);
        assert_eq!(updated.record.name(), Some("Fireball"));

        let created = events.recv().await.unwrap();
        assert_eq!(created.version, 0);
        assert!(matches!(created.kind, ChangeEventKind::Created { .. }));

        let changed = events.recv().await.unwrap();
        assert_eq!(changed.id, id);
        assert_eq!(changed.version, 1);
    }

    #[tokio::test]
    async fn later_write_to_same_field_wins() {
        let store = MemorySyncStore::new(8);
        let document = ability_document(GroupId::new());
        let id = document.id;
        store.create(document).await.unwrap();

        for name in ["first", "second"] {
            store
                .commit(
                    id,
                    Change::Set {
                        write: FieldWrite::Name(name.into()),
                    },
                )
                .await
                .unwrap();
        }

        let loaded = store.load(id).await.unwrap().unwrap();
        assert_eq!(loaded.record.name(), Some("second"));
        assert_eq!(loaded.version, 2);
    }

    #[tokio::test]
    async fn duplicate_create_is_refused() {
        let store = MemorySyncStore::new(8);
        let document = ability_document(GroupId::new());
        store.create(document.clone()).await.unwrap();

        let err = store.create(document).await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists { .. }));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn rejected_change_leaves_version_untouched() {
        let store = MemorySyncStore::new(8);
        let document = ability_document(GroupId::new());
        let id = document.id;
        store.create(document).await.unwrap();

        let err = store
            .commit(
                id,
                Change::Set {
                    write: FieldWrite::IsTreasure(true),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Rejected { .. }));

        let loaded = store.load(id).await.unwrap().unwrap();
        assert_eq!(loaded.version, 0);
    }

    #[tokio::test]
    async fn commit_to_unknown_record_is_not_found() {
        let store = MemorySyncStore::new(8);
        let id = RecordId::new();
        let err = store
            .commit(
                id,
                Change::Set {
                    write: FieldWrite::Name("ghost".into()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { id: missing } if missing == id));
    }

    #[tokio::test]
    async fn account_can_only_be_bound_once() {
        let store = MemorySyncStore::new(8);
        let account = AccountId::new("alice");
        let root = RecordId::new();

        store.bind_account_root(account.clone(), root).await.unwrap();
        assert!(
            store
                .bind_account_root(account.clone(), RecordId::new())
                .await
                .is_err()
        );
        assert_eq!(store.find_account_root(account).await.unwrap(), Some(root));
    }
}
