//! Entity lifecycle inside the session's game: creation, field edits,
//! deletion, shared references and change notifications.
//!
//! Deleting an entity only removes its key from the game collection. Other
//! entities keep referencing it; [`resolve_links`] reports those references as
//! dangling.

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::{
    dao::{
        changes::{Change, ChangeEvent, FieldWrite, Slot},
        models::{
            Ability, Character, CollectionKind, Document, Equipment, GroupId, Monster, Record,
            RecordId, RecordKind,
        },
        sync_store::SyncStore,
    },
    dto::content::{LinkStatus, LinkView, RecordDetails},
    error::ServiceError,
    services::account_service::{load_game, load_in_group, require_reader, require_writer},
    state::{Session, SharedState},
};

/// An entity to insert into one of the game's collections.
#[derive(Debug, Clone)]
pub enum NewRecord {
    /// Into the abilities collection.
    Ability(Ability),
    /// Into the characters collection.
    Character(Character),
    /// Into the equipment collection.
    Equipment(Equipment),
    /// Into the monsters collection.
    Monster(Monster),
}

impl NewRecord {
    /// Collection the entity is inserted into.
    pub fn collection(&self) -> CollectionKind {
        match self {
            NewRecord::Ability(_) => CollectionKind::Abilities,
            NewRecord::Character(_) => CollectionKind::Characters,
            NewRecord::Equipment(_) => CollectionKind::Equipment,
            NewRecord::Monster(_) => CollectionKind::Monsters,
        }
    }

    fn into_record(self) -> Record {
        match self {
            NewRecord::Ability(ability) => Record::Ability(ability),
            NewRecord::Character(character) => Record::Character(character),
            NewRecord::Equipment(equipment) => Record::Equipment(equipment),
            NewRecord::Monster(monster) => Record::Monster(monster),
        }
    }
}

/// Allocate a new entity and insert it into its collection under a fresh ID.
pub async fn create_record(
    state: &SharedState,
    session: &Session,
    new_record: NewRecord,
) -> Result<Document, ServiceError> {
    let store = state.require_sync_store().await?;
    require_writer(store.as_ref(), session).await?;

    let collection = new_record.collection();
    let document = Document::new(RecordId::new(), session.group, new_record.into_record());
    let id = document.id;

    store.create(document.clone()).await?;
    let linked = store
        .commit(
            session.game,
            Change::Link {
                slot: collection.into(),
                target: id,
            },
        )
        .await;
    if let Err(err) = linked {
        warn!(
            record = %id,
            %collection,
            error = %err,
            "record stored but not listed in its collection"
        );
        return Err(err.into());
    }

    info!(record = %id, %collection, "created record");
    Ok(document)
}

/// Overwrite one field of an entity of `collection` in place.
pub async fn update_field(
    state: &SharedState,
    session: &Session,
    collection: CollectionKind,
    id: RecordId,
    write: FieldWrite,
) -> Result<Document, ServiceError> {
    let store = state.require_sync_store().await?;
    require_writer(store.as_ref(), session).await?;
    load_member(store.as_ref(), session, collection, id).await?;

    let field = write.field_name();
    let document = store.commit(id, Change::Set { write }).await?;
    debug!(record = %id, field, version = document.version, "updated field");
    Ok(document)
}

/// Remove `id` from `collection`. References held by other entities are kept.
pub async fn delete_record(
    state: &SharedState,
    session: &Session,
    collection: CollectionKind,
    id: RecordId,
) -> Result<(), ServiceError> {
    let store = state.require_sync_store().await?;
    require_writer(store.as_ref(), session).await?;

    let (_, game) = load_game(store.as_ref(), session).await?;
    if !game.contains(collection, id) {
        return Err(ServiceError::NotFound(format!("{collection} `{id}`")));
    }

    store
        .commit(
            session.game,
            Change::Unlink {
                slot: collection.into(),
                target: id,
            },
        )
        .await?;

    info!(record = %id, %collection, "deleted record");
    Ok(())
}

/// Attach `target` to one of `owner`'s reference slots. Attaching twice is a no-op.
pub async fn add_reference(
    state: &SharedState,
    session: &Session,
    collection: CollectionKind,
    owner: RecordId,
    slot: Slot,
    target: RecordId,
) -> Result<Document, ServiceError> {
    let store = state.require_sync_store().await?;
    require_writer(store.as_ref(), session).await?;

    let source = reference_source(slot)?;
    let document = load_member(store.as_ref(), session, collection, owner).await?;
    ensure_reference_owner(&document)?;

    let (_, game) = load_game(store.as_ref(), session).await?;
    if !game.contains(source, target) {
        return Err(ServiceError::NotFound(format!("{source} `{target}`")));
    }

    let document = store.commit(owner, Change::Link { slot, target }).await?;
    debug!(record = %owner, slot = slot.name(), %target, "attached reference");
    Ok(document)
}

/// Detach `target` from one of `owner`'s reference slots.
///
/// The target is not looked up, so dangling references can be cleared.
pub async fn remove_reference(
    state: &SharedState,
    session: &Session,
    collection: CollectionKind,
    owner: RecordId,
    slot: Slot,
    target: RecordId,
) -> Result<Document, ServiceError> {
    let store = state.require_sync_store().await?;
    require_writer(store.as_ref(), session).await?;

    reference_source(slot)?;
    let document = load_member(store.as_ref(), session, collection, owner).await?;
    ensure_reference_owner(&document)?;

    let document = store.commit(owner, Change::Unlink { slot, target }).await?;
    debug!(record = %owner, slot = slot.name(), %target, "detached reference");
    Ok(document)
}

/// Look up an entity through its collection.
pub async fn get_record(
    state: &SharedState,
    session: &Session,
    collection: CollectionKind,
    id: RecordId,
) -> Result<Document, ServiceError> {
    let store = state.require_sync_store().await?;
    require_reader(store.as_ref(), session).await?;

    let (_, game) = load_game(store.as_ref(), session).await?;
    if !game.contains(collection, id) {
        return Err(ServiceError::NotFound(format!("{collection} `{id}`")));
    }

    store
        .load(id)
        .await?
        .ok_or_else(|| ServiceError::NotLoaded(format!("{collection} `{id}`")))
}

/// Look up an entity and resolve its outgoing references.
pub async fn get_record_details(
    state: &SharedState,
    session: &Session,
    collection: CollectionKind,
    id: RecordId,
) -> Result<RecordDetails, ServiceError> {
    let document = get_record(state, session, collection, id).await?;
    let links = resolve_links(state, session, &document).await?;
    Ok(RecordDetails {
        record: document.into(),
        links,
    })
}

/// Every loaded entity of `collection`, in insertion order.
pub async fn list_records(
    state: &SharedState,
    session: &Session,
    collection: CollectionKind,
) -> Result<Vec<Document>, ServiceError> {
    let store = state.require_sync_store().await?;
    require_reader(store.as_ref(), session).await?;

    let (_, game) = load_game(store.as_ref(), session).await?;
    let mut documents = Vec::with_capacity(game.collection(collection).len());
    for id in game.collection(collection) {
        match store.load(*id).await? {
            Some(document) => documents.push(document),
            None => debug!(record = %id, %collection, "skipping record not loaded yet"),
        }
    }

    Ok(documents)
}

/// Report each reference held by `document` as live or dangling.
pub async fn resolve_links(
    state: &SharedState,
    session: &Session,
    document: &Document,
) -> Result<Vec<LinkView>, ServiceError> {
    let store = state.require_sync_store().await?;
    require_reader(store.as_ref(), session).await?;

    let (_, game) = load_game(store.as_ref(), session).await?;
    let mut links = Vec::new();
    for (slot, target) in document.record.links() {
        let live = slot
            .source_collection()
            .is_some_and(|collection| game.contains(collection, target));
        let status = if live {
            LinkStatus::Live {
                name: target_name(store.as_ref(), target).await?,
            }
        } else {
            LinkStatus::Dangling
        };
        links.push(LinkView {
            slot,
            target,
            status,
        });
    }

    Ok(links)
}

async fn target_name(store: &dyn SyncStore, id: RecordId) -> Result<Option<String>, ServiceError> {
    let document = store.load(id).await?;
    Ok(document.and_then(|document| document.record.name().map(str::to_owned)))
}

/// Subscribe to changes of the session's game, optionally narrowed to one record.
pub async fn watch(
    state: &SharedState,
    session: &Session,
    record: Option<RecordId>,
) -> Result<ChangeFeed, ServiceError> {
    let store = state.require_sync_store().await?;
    require_reader(store.as_ref(), session).await?;
    if let Some(id) = record {
        load_in_group(store.as_ref(), session, id).await?;
    }

    Ok(ChangeFeed {
        receiver: store.subscribe(),
        group: session.group,
        record,
    })
}

/// Change notifications restricted to one access group.
pub struct ChangeFeed {
    receiver: broadcast::Receiver<ChangeEvent>,
    group: GroupId,
    record: Option<RecordId>,
}

impl ChangeFeed {
    /// Wait for the next matching change. `None` once the store is gone.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.accepts(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "change feed lagged; skipping missed changes");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn accepts(&self, event: &ChangeEvent) -> bool {
        event.group == self.group && self.record.is_none_or(|id| id == event.id)
    }
}

/// Load `id` only while it is still a key of `collection` in the session's game.
async fn load_member(
    store: &dyn SyncStore,
    session: &Session,
    collection: CollectionKind,
    id: RecordId,
) -> Result<Document, ServiceError> {
    let (_, game) = load_game(store, session).await?;
    if !game.contains(collection, id) {
        return Err(ServiceError::NotFound(format!("{collection} `{id}`")));
    }
    load_in_group(store, session, id).await
}

fn reference_source(slot: Slot) -> Result<CollectionKind, ServiceError> {
    slot.source_collection().ok_or_else(|| {
        ServiceError::InvalidInput(format!(
            "`{}` is a game collection, not a reference slot",
            slot.name()
        ))
    })
}

fn ensure_reference_owner(document: &Document) -> Result<(), ServiceError> {
    match document.record.kind() {
        RecordKind::Equipment | RecordKind::Monster => Ok(()),
        other => Err(ServiceError::InvalidInput(format!(
            "{other} records hold no references"
        ))),
    }
}
