use std::sync::Arc;

use game_forge_back::{
    config::AppConfig,
    dao::{
        changes::Slot,
        models::{
            Ability, AbilityType, AccountId, CollectionKind, Equipment, EquipmentType, Monster,
            Record,
        },
        sync_store::memory::MemorySyncStore,
    },
    dto::content::LinkStatus,
    services::{
        account_service,
        content_service::{self, NewRecord},
        game_service,
    },
    state::AppState,
};

#[tokio::test]
async fn shared_abilities_survive_deletion_as_dangling_references() {
    let state = AppState::new(AppConfig::default());
    state
        .set_sync_store(Arc::new(MemorySyncStore::new(64)))
        .await;
    let session = account_service::ensure_root(&state, AccountId::new("gm"))
        .await
        .unwrap();

    let fireball = content_service::create_record(
        &state,
        &session,
        NewRecord::Ability(Ability {
            name: "Fireball".into(),
            kind: AbilityType::Active,
            ..Ability::default()
        }),
    )
    .await
    .unwrap()
    .id;
    let staff = content_service::create_record(
        &state,
        &session,
        NewRecord::Equipment(Equipment {
            name: "Staff".into(),
            kind: EquipmentType::Weapon,
            ..Equipment::default()
        }),
    )
    .await
    .unwrap()
    .id;

    content_service::add_reference(
        &state,
        &session,
        CollectionKind::Equipment,
        staff,
        Slot::Abilities,
        fireball,
    )
    .await
    .unwrap();

    let document =
        content_service::get_record(&state, &session, CollectionKind::Equipment, staff)
            .await
            .unwrap();
    let links = content_service::resolve_links(&state, &session, &document)
        .await
        .unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].target, fireball);
    assert_eq!(
        links[0].status,
        LinkStatus::Live {
            name: Some("Fireball".into())
        }
    );

    content_service::delete_record(&state, &session, CollectionKind::Abilities, fireball)
        .await
        .unwrap();

    let document =
        content_service::get_record(&state, &session, CollectionKind::Equipment, staff)
            .await
            .unwrap();
    let Record::Equipment(ref equipment) = document.record else {
        panic!("expected equipment");
    };
    assert_eq!(equipment.abilities.len(), 1);
    assert!(equipment.abilities.contains(&fireball));
    let links = content_service::resolve_links(&state, &session, &document)
        .await
        .unwrap();
    assert_eq!(links[0].status, LinkStatus::Dangling);

    let fireball2 = content_service::create_record(
        &state,
        &session,
        NewRecord::Ability(Ability {
            name: "Fireball2".into(),
            ..Ability::default()
        }),
    )
    .await
    .unwrap()
    .id;
    let monster = content_service::create_record(
        &state,
        &session,
        NewRecord::Monster(Monster::default()),
    )
    .await
    .unwrap()
    .id;
    content_service::add_reference(
        &state,
        &session,
        CollectionKind::Monsters,
        monster,
        Slot::EssenceAbilities,
        fireball2,
    )
    .await
    .unwrap();

    let document =
        content_service::get_record(&state, &session, CollectionKind::Monsters, monster)
            .await
            .unwrap();
    let Record::Monster(monster) = document.record else {
        panic!("expected a monster");
    };
    assert!(monster.essence.abilities.contains(&fireball2));

    let summary = game_service::game_summary(&state, &session).await.unwrap();
    assert_eq!(summary.abilities, vec![fireball2]);
}
