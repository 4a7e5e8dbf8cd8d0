use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, put},
};
use axum_valid::Valid;

use crate::{
    dao::{
        changes::Slot,
        models::{CollectionKind, RecordId},
    },
    dto::{
        content::{
            CreateAbilityRequest, CreateCharacterRequest, CreateEquipmentRequest,
            CreateMonsterRequest, FieldUpdateRequest, RecordDetails, RecordView,
        },
        game::{GameSummary, RenameGameRequest, RuleBookView, UpdateRuleBookRequest},
    },
    error::AppError,
    routes::session::require_session,
    services::{
        content_service::{self, NewRecord},
        game_service,
    },
    state::{Session, SharedState},
};

/// Game content endpoints, scoped to the caller's session.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/game", get(get_game))
        .route("/game/name", put(rename_game))
        .route("/game/rulebook", get(get_rule_book).put(update_rule_book))
        .route("/game/abilities", get(list_abilities).post(create_ability))
        .route(
            "/game/characters",
            get(list_characters).post(create_character),
        )
        .route("/game/equipment", get(list_equipment).post(create_equipment))
        .route("/game/monsters", get(list_monsters).post(create_monster))
        .route(
            "/game/{collection}/{id}",
            get(get_record).patch(update_field).delete(delete_record),
        )
        .route(
            "/game/{collection}/{id}/links/{slot}/{target}",
            put(add_reference).delete(remove_reference),
        )
        .route_layer(middleware::from_fn_with_state(state, require_session))
}

/// Summarise the caller's game.
#[utoipa::path(
    get,
    path = "/game",
    tag = "game",
    params(("X-Account-Id" = String, Header, description = "Account identifier issued by the auth provider")),
    responses((status = 200, description = "Game summary", body = GameSummary))
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(game_service::game_summary(&state, &session).await?))
}

/// Rename the caller's game.
#[utoipa::path(
    put,
    path = "/game/name",
    tag = "game",
    params(("X-Account-Id" = String, Header, description = "Account identifier issued by the auth provider")),
    request_body = RenameGameRequest,
    responses((status = 200, description = "Game renamed", body = GameSummary))
)]
pub async fn rename_game(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Valid(Json(payload)): Valid<Json<RenameGameRequest>>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(
        game_service::rename_game(&state, &session, payload.name).await?,
    ))
}

/// Fetch the markdown rulebook.
#[utoipa::path(
    get,
    path = "/game/rulebook",
    tag = "game",
    params(("X-Account-Id" = String, Header, description = "Account identifier issued by the auth provider")),
    responses((status = 200, description = "Rulebook content", body = RuleBookView))
)]
pub async fn get_rule_book(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
) -> Result<Json<RuleBookView>, AppError> {
    Ok(Json(game_service::rule_book(&state, &session).await?))
}

/// Replace the markdown rulebook.
#[utoipa::path(
    put,
    path = "/game/rulebook",
    tag = "game",
    params(("X-Account-Id" = String, Header, description = "Account identifier issued by the auth provider")),
    request_body = UpdateRuleBookRequest,
    responses((status = 200, description = "Rulebook updated", body = RuleBookView))
)]
pub async fn update_rule_book(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Valid(Json(payload)): Valid<Json<UpdateRuleBookRequest>>,
) -> Result<Json<RuleBookView>, AppError> {
    Ok(Json(
        game_service::update_rule_book(&state, &session, payload.content).await?,
    ))
}

async fn list(
    state: &SharedState,
    session: &Session,
    collection: CollectionKind,
) -> Result<Json<Vec<RecordView>>, AppError> {
    let documents = content_service::list_records(state, session, collection).await?;
    Ok(Json(documents.into_iter().map(Into::into).collect()))
}

async fn create(
    state: &SharedState,
    session: &Session,
    new_record: NewRecord,
) -> Result<(StatusCode, Json<RecordView>), AppError> {
    let document = content_service::create_record(state, session, new_record).await?;
    Ok((StatusCode::CREATED, Json(document.into())))
}

/// List the abilities of the game.
#[utoipa::path(
    get,
    path = "/game/abilities",
    tag = "content",
    params(("X-Account-Id" = String, Header, description = "Account identifier issued by the auth provider")),
    responses((status = 200, description = "Abilities in insertion order", body = [RecordView]))
)]
pub async fn list_abilities(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<RecordView>>, AppError> {
    list(&state, &session, CollectionKind::Abilities).await
}

/// Create an ability. Omitted fields take their defaults.
#[utoipa::path(
    post,
    path = "/game/abilities",
    tag = "content",
    params(("X-Account-Id" = String, Header, description = "Account identifier issued by the auth provider")),
    request_body = CreateAbilityRequest,
    responses((status = 201, description = "Ability created", body = RecordView))
)]
pub async fn create_ability(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Valid(Json(payload)): Valid<Json<CreateAbilityRequest>>,
) -> Result<(StatusCode, Json<RecordView>), AppError> {
    create(&state, &session, NewRecord::Ability(payload.into())).await
}

#[utoipa::path(
    get,
    path = "/game/characters",
    tag = "content",
    params(("X-Account-Id" = String, Header, description = "Account identifier issued by the auth provider")),
    responses((status = 200, description = "Characters in insertion order", body = [RecordView]))
)]
pub async fn list_characters(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<RecordView>>, AppError> {
    list(&state, &session, CollectionKind::Characters).await
}

#[utoipa::path(
    post,
    path = "/game/characters",
    tag = "content",
    params(("X-Account-Id" = String, Header, description = "Account identifier issued by the auth provider")),
    request_body = CreateCharacterRequest,
    responses((status = 201, description = "Character created", body = RecordView))
)]
pub async fn create_character(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Valid(Json(payload)): Valid<Json<CreateCharacterRequest>>,
) -> Result<(StatusCode, Json<RecordView>), AppError> {
    create(&state, &session, NewRecord::Character(payload.into())).await
}

#[utoipa::path(
    get,
    path = "/game/equipment",
    tag = "content",
    params(("X-Account-Id" = String, Header, description = "Account identifier issued by the auth provider")),
    responses((status = 200, description = "Equipment in insertion order", body = [RecordView]))
)]
pub async fn list_equipment(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<RecordView>>, AppError> {
    list(&state, &session, CollectionKind::Equipment).await
}

#[utoipa::path(
    post,
    path = "/game/equipment",
    tag = "content",
    params(("X-Account-Id" = String, Header, description = "Account identifier issued by the auth provider")),
    request_body = CreateEquipmentRequest,
    responses((status = 201, description = "Equipment created", body = RecordView))
)]
pub async fn create_equipment(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Valid(Json(payload)): Valid<Json<CreateEquipmentRequest>>,
) -> Result<(StatusCode, Json<RecordView>), AppError> {
    create(&state, &session, NewRecord::Equipment(payload.into())).await
}

#[utoipa::path(
    get,
    path = "/game/monsters",
    tag = "content",
    params(("X-Account-Id" = String, Header, description = "Account identifier issued by the auth provider")),
    responses((status = 200, description = "Monsters in insertion order", body = [RecordView]))
)]
pub async fn list_monsters(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<RecordView>>, AppError> {
    list(&state, &session, CollectionKind::Monsters).await
}

/// Create a monster with its essence. Unknown monster types are rejected.
#[utoipa::path(
    post,
    path = "/game/monsters",
    tag = "content",
    params(("X-Account-Id" = String, Header, description = "Account identifier issued by the auth provider")),
    request_body = CreateMonsterRequest,
    responses((status = 201, description = "Monster created", body = RecordView))
)]
pub async fn create_monster(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Valid(Json(payload)): Valid<Json<CreateMonsterRequest>>,
) -> Result<(StatusCode, Json<RecordView>), AppError> {
    create(&state, &session, NewRecord::Monster(payload.into())).await
}

/// Fetch an entity through its collection, with its references resolved.
#[utoipa::path(
    get,
    path = "/game/{collection}/{id}",
    tag = "content",
    params(
        ("X-Account-Id" = String, Header, description = "Account identifier issued by the auth provider"),
        ("collection" = CollectionKind, Path, description = "Collection holding the entity"),
        ("id" = String, Path, description = "Entity identifier")
    ),
    responses(
        (status = 200, description = "Entity found", body = RecordDetails),
        (status = 404, description = "Not a key of the collection"),
        (status = 503, description = "Listed but not loaded yet")
    )
)]
pub async fn get_record(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Path((collection, id)): Path<(CollectionKind, RecordId)>,
) -> Result<Json<RecordDetails>, AppError> {
    Ok(Json(
        content_service::get_record_details(&state, &session, collection, id).await?,
    ))
}

/// Overwrite one field of an entity.
#[utoipa::path(
    patch,
    path = "/game/{collection}/{id}",
    tag = "content",
    params(
        ("X-Account-Id" = String, Header, description = "Account identifier issued by the auth provider"),
        ("collection" = CollectionKind, Path, description = "Collection holding the entity"),
        ("id" = String, Path, description = "Entity identifier")
    ),
    request_body = FieldUpdateRequest,
    responses(
        (status = 200, description = "Field updated", body = RecordView),
        (status = 400, description = "Field does not exist on this entity")
    )
)]
pub async fn update_field(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Path((collection, id)): Path<(CollectionKind, RecordId)>,
    Valid(Json(payload)): Valid<Json<FieldUpdateRequest>>,
) -> Result<Json<RecordView>, AppError> {
    let document =
        content_service::update_field(&state, &session, collection, id, payload.write).await?;
    Ok(Json(document.into()))
}

/// Remove an entity from its collection. References to it are kept.
#[utoipa::path(
    delete,
    path = "/game/{collection}/{id}",
    tag = "content",
    params(
        ("X-Account-Id" = String, Header, description = "Account identifier issued by the auth provider"),
        ("collection" = CollectionKind, Path, description = "Collection holding the entity"),
        ("id" = String, Path, description = "Entity identifier")
    ),
    responses(
        (status = 204, description = "Entity removed"),
        (status = 404, description = "Not a key of the collection")
    )
)]
pub async fn delete_record(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Path((collection, id)): Path<(CollectionKind, RecordId)>,
) -> Result<StatusCode, AppError> {
    content_service::delete_record(&state, &session, collection, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Attach a shared ability or equipment drop to an entity.
#[utoipa::path(
    put,
    path = "/game/{collection}/{id}/links/{slot}/{target}",
    tag = "content",
    params(
        ("X-Account-Id" = String, Header, description = "Account identifier issued by the auth provider"),
        ("collection" = CollectionKind, Path, description = "Collection holding the owner"),
        ("id" = String, Path, description = "Owner identifier"),
        ("slot" = Slot, Path, description = "Reference slot on the owner"),
        ("target" = String, Path, description = "Referenced entity")
    ),
    responses(
        (status = 200, description = "Reference attached", body = RecordView),
        (status = 404, description = "Owner or target not found")
    )
)]
pub async fn add_reference(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Path((collection, id, slot, target)): Path<(CollectionKind, RecordId, Slot, RecordId)>,
) -> Result<Json<RecordView>, AppError> {
    let document =
        content_service::add_reference(&state, &session, collection, id, slot, target).await?;
    Ok(Json(document.into()))
}

/// Detach a reference, whether or not its target still exists.
#[utoipa::path(
    delete,
    path = "/game/{collection}/{id}/links/{slot}/{target}",
    tag = "content",
    params(
        ("X-Account-Id" = String, Header, description = "Account identifier issued by the auth provider"),
        ("collection" = CollectionKind, Path, description = "Collection holding the owner"),
        ("id" = String, Path, description = "Owner identifier"),
        ("slot" = Slot, Path, description = "Reference slot on the owner"),
        ("target" = String, Path, description = "Referenced entity")
    ),
    responses((status = 200, description = "Reference detached", body = RecordView))
)]
pub async fn remove_reference(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Path((collection, id, slot, target)): Path<(CollectionKind, RecordId, Slot, RecordId)>,
) -> Result<Json<RecordView>, AppError> {
    let document =
        content_service::remove_reference(&state, &session, collection, id, slot, target)
            .await?;
    Ok(Json(document.into()))
}
