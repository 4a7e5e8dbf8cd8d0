use tracing::info;

use crate::{
    dao::{
        changes::{Change, FieldWrite},
        models::Record,
    },
    dto::game::{GameSummary, RuleBookView},
    error::ServiceError,
    services::account_service::{load_game, require_reader, require_writer},
    state::{Session, SharedState},
};

/// Summarise the session's game and the key sets of its collections.
pub async fn game_summary(
    state: &SharedState,
    session: &Session,
) -> Result<GameSummary, ServiceError> {
    let store = state.require_sync_store().await?;
    require_reader(store.as_ref(), session).await?;

    let (version, game) = load_game(store.as_ref(), session).await?;
    Ok(GameSummary::new(session.game, version, game))
}

/// Rename the session's game.
pub async fn rename_game(
    state: &SharedState,
    session: &Session,
    name: String,
) -> Result<GameSummary, ServiceError> {
    let store = state.require_sync_store().await?;
    require_writer(store.as_ref(), session).await?;

    let document = store
        .commit(
            session.game,
            Change::Set {
                write: FieldWrite::Name(name),
            },
        )
        .await?;

    match document.record {
        Record::Game(game) => {
            info!(game = %document.id, name = %game.name, "renamed game");
            Ok(GameSummary::new(document.id, document.version, game))
        }
        other => Err(ServiceError::NotLoaded(format!(
            "record `{}` is a {}, not a game",
            document.id,
            other.kind()
        ))),
    }
}

/// Fetch the rulebook attached to the session's game.
pub async fn rule_book(
    state: &SharedState,
    session: &Session,
) -> Result<RuleBookView, ServiceError> {
    let store = state.require_sync_store().await?;
    require_reader(store.as_ref(), session).await?;

    let (_, game) = load_game(store.as_ref(), session).await?;
    let document = store
        .load(game.rule_book)
        .await?
        .ok_or_else(|| ServiceError::NotLoaded(format!("rule book `{}`", game.rule_book)))?;

    RuleBookView::from_document(document)
        .ok_or_else(|| ServiceError::NotLoaded(format!("rule book `{}`", game.rule_book)))
}

/// Replace the rulebook markdown.
pub async fn update_rule_book(
    state: &SharedState,
    session: &Session,
    content: String,
) -> Result<RuleBookView, ServiceError> {
    let store = state.require_sync_store().await?;
    require_writer(store.as_ref(), session).await?;

    let (_, game) = load_game(store.as_ref(), session).await?;
    let document = store
        .commit(
            game.rule_book,
            Change::Set {
                write: FieldWrite::Content(content),
            },
        )
        .await?;

    RuleBookView::from_document(document)
        .ok_or_else(|| ServiceError::NotLoaded(format!("rule book `{}`", game.rule_book)))
}
