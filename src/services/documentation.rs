use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the game content backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::change_stream,
        crate::routes::game::get_game,
        crate::routes::game::rename_game,
        crate::routes::game::get_rule_book,
        crate::routes::game::update_rule_book,
        crate::routes::game::list_abilities,
        crate::routes::game::create_ability,
        crate::routes::game::list_characters,
        crate::routes::game::create_character,
        crate::routes::game::list_equipment,
        crate::routes::game::create_equipment,
        crate::routes::game::list_monsters,
        crate::routes::game::create_monster,
        crate::routes::game::get_record,
        crate::routes::game::update_field,
        crate::routes::game::delete_record,
        crate::routes::game::add_reference,
        crate::routes::game::remove_reference,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::Handshake,
            crate::dto::game::GameSummary,
            crate::dto::game::RenameGameRequest,
            crate::dto::game::RuleBookView,
            crate::dto::game::UpdateRuleBookRequest,
            crate::dto::content::CreateAbilityRequest,
            crate::dto::content::CreateCharacterRequest,
            crate::dto::content::CreateEquipmentRequest,
            crate::dto::content::CreateMonsterRequest,
            crate::dto::content::EssenceInput,
            crate::dto::content::FieldUpdateRequest,
            crate::dto::content::RecordView,
            crate::dto::content::RecordDetails,
            crate::dto::content::LinkView,
            crate::dto::content::LinkStatus,
            crate::dao::changes::ChangeEvent,
            crate::dao::changes::FieldWrite,
            crate::dao::changes::Slot,
            crate::dao::models::CollectionKind,
            crate::dao::models::Record,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent change feed"),
        (name = "game", description = "Game summary, name and rulebook"),
        (name = "content", description = "Abilities, characters, equipment and monsters"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_content_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/game",
            "/game/rulebook",
            "/game/monsters",
            "/game/{collection}/{id}",
            "/game/{collection}/{id}/links/{slot}/{target}",
            "/game/events",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
