use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::dao::{
    changes::{Change, ChangeEvent, ChangeEventKind},
    models::{AccessGroup, AccountId, Document, GroupId, RecordId},
    storage::{StorageError, StorageResult},
    sync_store::SyncStore,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        CouchAccountDocument, CouchGroupDocument, CouchRecordDocument, account_doc_id,
        group_doc_id, record_doc_id,
    },
};

/// Result of a conditional document write.
enum PutOutcome {
    Stored,
    /// The revision moved (or the document exists when creating).
    Conflict,
}

/// Sync store persisting one CouchDB document per record.
///
/// Change notifications cover the commits made through this process.
#[derive(Clone)]
pub struct CouchSyncStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
    commit_attempts: u32,
    events: broadcast::Sender<ChangeEvent>,
}

impl CouchSyncStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig, event_capacity: usize) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));
        let (events, _receiver) = broadcast::channel(event_capacity.max(1));

        let store = Self {
            client,
            base_url,
            database,
            auth,
            commit_attempts: config.commit_attempts.max(1),
            events,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        let builder = self.client.request(method, url);
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = format!("{}/{}", self.base_url, self.database);
        let mut builder = self.client.get(&url);
        if let Some((ref user, ref pass)) = self.auth {
            builder = builder.basic_auth(user.as_ref(), Some(pass.as_ref()));
        }

        let response = builder
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let mut builder = self.client.put(&url);
                if let Some((ref user, ref pass)) = self.auth {
                    builder = builder.basic_auth(user.as_ref(), Some(pass.as_ref()));
                }
                let create =
                    builder
                        .send()
                        .await
                        .map_err(|source| CouchDaoError::DatabaseCreate {
                            database: database.clone(),
                            source,
                        })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    /// PUT a document; CouchDB answers 409 when `_rev` is stale or missing for
    /// an existing document.
    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<PutOutcome>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::CONFLICT => Ok(PutOutcome::Conflict),
            status if status.is_success() => Ok(PutOutcome::Stored),
            status => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status,
            }),
        }
    }

    /// Store a document that must not exist yet.
    async fn put_new<T>(&self, doc_id: String, document: &T) -> StorageResult<()>
    where
        T: Serialize,
    {
        match self.put_document(&doc_id, document).await? {
            PutOutcome::Stored => Ok(()),
            PutOutcome::Conflict => Err(StorageError::AlreadyExists { key: doc_id }),
        }
    }

    /// Read-modify-write loop: re-read and re-apply whenever another writer
    /// slipped in between, so the most recent commit wins per field.
    async fn commit_with_retry(&self, id: RecordId, change: Change) -> StorageResult<Document> {
        let doc_id = record_doc_id(id);

        for attempt in 1..=self.commit_attempts {
            let Some(stored) = self.get_document::<CouchRecordDocument>(&doc_id).await? else {
                return Err(StorageError::NotFound { id });
            };

            let mut document = stored.to_document();
            document
                .record
                .apply(&change)
                .map_err(|source| StorageError::Rejected { id, source })?;
            document.version += 1;

            let candidate = CouchRecordDocument::from_document(document.clone(), stored.rev);
            match self.put_document(&doc_id, &candidate).await? {
                PutOutcome::Stored => {
                    debug!(record = %id, version = document.version, attempt, "committed change");
                    let _ = self.events.send(ChangeEvent {
                        id,
                        group: document.group,
                        version: document.version,
                        kind: ChangeEventKind::Updated { change },
                    });
                    return Ok(document);
                }
                PutOutcome::Conflict => {
                    warn!(record = %id, attempt, "revision conflict; retrying commit");
                }
            }
        }

        Err(CouchDaoError::CommitContention {
            id,
            attempts: self.commit_attempts,
        }
        .into())
    }
}

impl SyncStore for CouchSyncStore {
    fn create(&self, document: Document) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let event = ChangeEvent {
                id: document.id,
                group: document.group,
                version: document.version,
                kind: ChangeEventKind::Created {
                    record: document.record.clone(),
                },
            };
            let doc_id = record_doc_id(document.id);
            let stored = CouchRecordDocument::from_document(document, None);
            store.put_new(doc_id, &stored).await?;
            let _ = store.events.send(event);
            Ok(())
        })
    }

    fn load(&self, id: RecordId) -> BoxFuture<'static, StorageResult<Option<Document>>> {
        let store = self.clone();
        Box::pin(async move {
            let maybe_doc = store
                .get_document::<CouchRecordDocument>(&record_doc_id(id))
                .await?;
            Ok(maybe_doc.map(|doc| doc.to_document()))
        })
    }

    fn commit(&self, id: RecordId, change: Change) -> BoxFuture<'static, StorageResult<Document>> {
        let store = self.clone();
        Box::pin(async move { store.commit_with_retry(id, change).await })
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    fn create_group(&self, group: AccessGroup) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = group_doc_id(group.id);
            let stored = CouchGroupDocument { group };
            store.put_new(doc_id, &stored).await
        })
    }

    fn find_group(&self, id: GroupId) -> BoxFuture<'static, StorageResult<Option<AccessGroup>>> {
        let store = self.clone();
        Box::pin(async move {
            let maybe_doc = store
                .get_document::<CouchGroupDocument>(&group_doc_id(id))
                .await?;
            Ok(maybe_doc.map(|doc| doc.group))
        })
    }

    fn find_account_root(
        &self,
        account: AccountId,
    ) -> BoxFuture<'static, StorageResult<Option<RecordId>>> {
        let store = self.clone();
        Box::pin(async move {
            let maybe_doc = store
                .get_document::<CouchAccountDocument>(&account_doc_id(account.as_str()))
                .await?;
            Ok(maybe_doc.map(|doc| doc.root))
        })
    }

    fn bind_account_root(
        &self,
        account: AccountId,
        root: RecordId,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = account_doc_id(account.as_str());
            let stored = CouchAccountDocument { root };
            store.put_new(doc_id, &stored).await
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = format!("{}/{}", store.base_url, store.database);
            let mut builder = store.client.get(&url);
            if let Some((ref user, ref pass)) = store.auth {
                builder = builder.basic_auth(user.as_ref(), Some(pass.as_ref()));
            }

            let response = builder
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
