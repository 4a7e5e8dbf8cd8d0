//! Account bootstrap and the access checks shared by every content operation.

use tracing::{debug, info, warn};

use crate::{
    dao::{
        models::{
            AccessGroup, AccountId, AccountRoot, Document, Game, Record, RecordId, RuleBook,
        },
        storage::StorageError,
        sync_store::SyncStore,
    },
    error::ServiceError,
    state::{Session, SharedState},
};

/// Resolve the session for `account`, creating its game on first use.
///
/// Safe to call on every request: an account that already has a root gets the
/// existing game back without taking any lock.
pub async fn ensure_root(state: &SharedState, account: AccountId) -> Result<Session, ServiceError> {
    let store = state.require_sync_store().await?;
    if let Some(root) = store.find_account_root(account.clone()).await? {
        return load_session(store.as_ref(), account, root).await;
    }

    let gate = state.root_gate(&account);
    let session = {
        let _guard = gate.lock().await;
        initialize_root(state, store.as_ref(), account.clone()).await
    };
    if session.is_ok() {
        state.release_root_gate(&account);
    }
    session
}

async fn initialize_root(
    state: &SharedState,
    store: &dyn SyncStore,
    account: AccountId,
) -> Result<Session, ServiceError> {
    if let Some(root) = store.find_account_root(account.clone()).await? {
        debug!(%account, %root, "account root initialized by a concurrent login");
        return load_session(store, account, root).await;
    }

    let config = state.config();
    let group = AccessGroup::owned_by(account.clone());
    let group_id = group.id;
    store.create_group(group).await?;

    let rule_book = Document::new(
        RecordId::new(),
        group_id,
        Record::RuleBook(RuleBook {
            content: config.default_rule_book().to_string(),
        }),
    );
    let rule_book_id = rule_book.id;
    store.create(rule_book).await?;

    let game = Document::new(
        RecordId::new(),
        group_id,
        Record::Game(Game::new(config.default_game_name(), rule_book_id)),
    );
    let game_id = game.id;
    store.create(game).await?;

    let root = Document::new(
        RecordId::new(),
        group_id,
        Record::AccountRoot(AccountRoot { game: game_id }),
    );
    let root_id = root.id;
    store.create(root).await?;

    match store.bind_account_root(account.clone(), root_id).await {
        Ok(()) => {}
        // another process bound the account between our lookup and our bind
        Err(StorageError::AlreadyExists { .. }) => {
            let Some(winner) = store.find_account_root(account.clone()).await? else {
                return Err(ServiceError::NotLoaded(format!("account root of `{account}`")));
            };
            warn!(
                %account,
                root = %winner,
                orphaned_root = %root_id,
                "account bound by another writer, using its root"
            );
            return load_session(store, account, winner).await;
        }
        Err(err) => return Err(err.into()),
    }

    info!(%account, game = %game_id, group = %group_id, "initialized account root");

    Ok(Session {
        account,
        root: root_id,
        game: game_id,
        group: group_id,
    })
}

async fn load_session(
    store: &dyn SyncStore,
    account: AccountId,
    root: RecordId,
) -> Result<Session, ServiceError> {
    let Some(document) = store.load(root).await? else {
        return Err(ServiceError::NotLoaded(format!("account root `{root}`")));
    };
    let Record::AccountRoot(AccountRoot { game }) = document.record else {
        return Err(ServiceError::NotLoaded(format!(
            "record `{root}` is not an account root"
        )));
    };

    Ok(Session {
        account,
        root,
        game,
        group: document.group,
    })
}

/// Ensure the session's account may read the game's records.
pub(crate) async fn require_reader(
    store: &dyn SyncStore,
    session: &Session,
) -> Result<AccessGroup, ServiceError> {
    let group = load_group(store, session).await?;
    if !group.can_read(&session.account) {
        return Err(ServiceError::Forbidden(format!(
            "account `{}` is not a member of this game",
            session.account
        )));
    }
    Ok(group)
}

/// Ensure the session's account may write the game's records.
pub(crate) async fn require_writer(
    store: &dyn SyncStore,
    session: &Session,
) -> Result<AccessGroup, ServiceError> {
    let group = load_group(store, session).await?;
    if !group.can_write(&session.account) {
        return Err(ServiceError::Forbidden(format!(
            "account `{}` cannot edit this game",
            session.account
        )));
    }
    Ok(group)
}

async fn load_group(store: &dyn SyncStore, session: &Session) -> Result<AccessGroup, ServiceError> {
    store
        .find_group(session.group)
        .await?
        .ok_or_else(|| ServiceError::NotLoaded(format!("access group `{}`", session.group)))
}

/// Load the session's game with its current version.
pub(crate) async fn load_game(
    store: &dyn SyncStore,
    session: &Session,
) -> Result<(u64, Game), ServiceError> {
    let Some(document) = store.load(session.game).await? else {
        return Err(ServiceError::NotLoaded(format!("game `{}`", session.game)));
    };
    match document.record {
        Record::Game(game) => Ok((document.version, game)),
        other => Err(ServiceError::NotLoaded(format!(
            "record `{}` is a {}, not a game",
            session.game,
            other.kind()
        ))),
    }
}

/// Load a record and check it belongs to the session's access group.
pub(crate) async fn load_in_group(
    store: &dyn SyncStore,
    session: &Session,
    id: RecordId,
) -> Result<Document, ServiceError> {
    let Some(document) = store.load(id).await? else {
        return Err(ServiceError::NotFound(format!("record `{id}`")));
    };
    if document.group != session.group {
        return Err(ServiceError::Forbidden(format!(
            "record `{id}` belongs to another game"
        )));
    }
    Ok(document)
}
