//! Typed record definitions stored in the sync layer.
//!
//! Every storable record lives in the arena keyed by [`RecordId`]. Records that
//! point at other records (equipment abilities, monster drops, game collections)
//! hold IDs only, so sharing is explicit and a reference can outlive its target.

use std::{fmt, str::FromStr};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Drop rate applied to equipment drops and essences when none is specified.
pub const DEFAULT_DROP_RATE: f64 = 0.5;

/// Unique identifier of a record. Generated once and never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = String, format = Uuid)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Allocate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID value.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RecordId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identifier of an access group scoping every record of one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, format = Uuid)]
pub struct GroupId(Uuid);

impl GroupId {
    /// Allocate a fresh group identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque account identifier issued by the external auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wrap a provider-issued identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to an image handled by the external image-ingestion helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImageRef {
    /// Identifier issued by the image store.
    pub id: String,
    /// Original width in pixels, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Original height in pixels, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Combat statistics embedded in characters, equipment, monsters and essences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Stats {
    /// Hit points.
    pub health: i32,
    /// Damage dealt per hit.
    pub attack: i32,
    /// Damage absorbed per hit.
    pub defense: i32,
    /// Tiles covered per turn.
    pub movement: i32,
}

impl Stats {
    /// Build stats from the four values in display order.
    pub const fn new(health: i32, attack: i32, defense: i32, movement: i32) -> Self {
        Self {
            health,
            attack,
            defense,
            movement,
        }
    }

    /// Read one statistic.
    pub fn get(&self, stat: StatField) -> i32 {
        match stat {
            StatField::Health => self.health,
            StatField::Attack => self.attack,
            StatField::Defense => self.defense,
            StatField::Movement => self.movement,
        }
    }

    /// Overwrite one statistic.
    pub fn set(&mut self, stat: StatField, value: i32) {
        match stat {
            StatField::Health => self.health = value,
            StatField::Attack => self.attack = value,
            StatField::Defense => self.defense = value,
            StatField::Movement => self.movement = value,
        }
    }
}

/// Names one of the four [`Stats`] fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatField {
    /// [`Stats::health`].
    Health,
    /// [`Stats::attack`].
    Attack,
    /// [`Stats::defense`].
    Defense,
    /// [`Stats::movement`].
    Movement,
}

/// Whether an ability is triggered or always in effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AbilityType {
    /// Triggered by the player.
    #[default]
    Active,
    /// Always in effect. Older documents spell it `pasive`.
    #[serde(alias = "pasive")]
    Passive,
}

/// Ability (a.k.a. card effect) shared by reference between equipment and monsters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Ability {
    /// Display name.
    pub name: String,
    /// Rules text.
    pub description: String,
    /// Active or passive.
    #[serde(rename = "type")]
    pub kind: AbilityType,
    /// Card artwork.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
}

/// Earlier name of [`Ability`].
pub type CardEffect = Ability;

impl Default for Ability {
    fn default() -> Self {
        Self {
            name: "New Ability".into(),
            description: "Ability description".into(),
            kind: AbilityType::Active,
            image: None,
        }
    }
}

/// Playable character template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Character {
    /// Display name.
    pub name: String,
    /// Flavor and rules text.
    #[serde(alias = "characteristics")]
    pub description: String,
    /// Base statistics.
    #[serde(default)]
    pub stats: Stats,
    /// Portrait.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
}

impl Default for Character {
    fn default() -> Self {
        Self {
            name: "New Character".into(),
            description: "Character description".into(),
            stats: Stats::new(20, 10, 10, 5),
            image: None,
        }
    }
}

/// Category of an equipment card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentType {
    /// Held weapon.
    #[default]
    Weapon,
    /// Worn protection.
    Armor,
    /// Carried relic.
    Artifact,
    /// Castable spell.
    Spell,
}

/// Equipment card, referencing shared abilities by ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Equipment {
    /// Display name.
    pub name: String,
    /// Flavor and rules text.
    #[serde(alias = "characteristics")]
    pub description: String,
    /// Statistics granted when equipped.
    #[serde(default)]
    pub stats: Stats,
    /// Equipment category.
    #[serde(rename = "type")]
    pub kind: EquipmentType,
    /// Shared abilities granted by this equipment.
    #[serde(default, alias = "effects")]
    #[schema(value_type = Vec<String>)]
    pub abilities: IndexSet<RecordId>,
    /// Treasure cards are only found as loot.
    #[serde(default)]
    pub is_treasure: bool,
    /// Card artwork.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
}

impl Default for Equipment {
    fn default() -> Self {
        Self {
            name: "New Equipment".into(),
            description: "Equipment description".into(),
            stats: Stats::default(),
            kind: EquipmentType::Weapon,
            abilities: IndexSet::new(),
            is_treasure: false,
            image: None,
        }
    }
}

/// Rank of a monster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MonsterType {
    /// Unique encounter.
    Boss,
    /// Regular encounter.
    #[default]
    Minion,
}

/// Color naming a monster essence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EssenceColor {
    /// Red essence.
    #[default]
    Red,
    /// Blue essence.
    Blue,
    /// Green essence.
    Green,
    /// Yellow essence.
    Yellow,
    /// Purple essence.
    Purple,
    /// Black essence.
    Black,
    /// White essence.
    White,
}

/// Secondary drop profile owned by exactly one monster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonsterEssence {
    /// Color shown on the essence card.
    pub color: EssenceColor,
    /// Rules text.
    #[serde(alias = "characteristics")]
    pub description: String,
    /// Statistics granted by the essence.
    #[serde(default)]
    pub stats: Stats,
    /// Shared abilities granted by the essence.
    #[serde(default, alias = "effects")]
    #[schema(value_type = Vec<String>)]
    pub abilities: IndexSet<RecordId>,
    /// Chance, in `[0, 1]`, that the essence drops.
    pub drop_rate: f64,
}

impl Default for MonsterEssence {
    fn default() -> Self {
        Self {
            color: EssenceColor::Red,
            description: "Red essence".into(),
            stats: Stats::default(),
            abilities: IndexSet::new(),
            drop_rate: DEFAULT_DROP_RATE,
        }
    }
}

/// Chance for a monster to drop one shared piece of equipment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EquipmentDrop {
    /// Dropped equipment.
    pub equipment: RecordId,
    /// Chance, in `[0, 1]`, that the equipment drops.
    pub drop_rate: f64,
}

/// Monster card with its owned essence and equipment drops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Monster {
    /// Display name.
    pub name: String,
    /// Flavor and rules text.
    #[serde(alias = "characteristics")]
    pub description: String,
    /// Combat statistics.
    #[serde(default)]
    pub stats: Stats,
    /// Boss or minion.
    #[serde(rename = "type")]
    pub kind: MonsterType,
    /// Shared abilities used by the monster.
    #[serde(default, alias = "effects")]
    #[schema(value_type = Vec<String>)]
    pub abilities: IndexSet<RecordId>,
    /// Essence owned by this monster alone.
    #[serde(default)]
    pub essence: MonsterEssence,
    /// Keyed by the dropped equipment's ID.
    #[serde(default, alias = "drop")]
    #[schema(value_type = Object)]
    pub drops: IndexMap<RecordId, EquipmentDrop>,
    /// Coins awarded when defeated.
    #[serde(default)]
    pub money_drop: i64,
    /// Card artwork.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
}

impl Default for Monster {
    fn default() -> Self {
        Self {
            name: "New Monster".into(),
            description: "Monster description".into(),
            stats: Stats::new(10, 5, 5, 3),
            kind: MonsterType::Minion,
            abilities: IndexSet::new(),
            essence: MonsterEssence::default(),
            drops: IndexMap::new(),
            money_drop: 10,
            image: None,
        }
    }
}

/// Markdown rulebook attached to a game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RuleBook {
    /// Markdown text.
    pub content: String,
}

/// Aggregate root of one account's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Game {
    /// Display name.
    pub name: String,
    /// Abilities shared by the game's entities.
    #[serde(default, alias = "effects")]
    #[schema(value_type = Vec<String>)]
    pub abilities: IndexSet<RecordId>,
    /// Playable characters.
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub characters: IndexSet<RecordId>,
    /// Equipment cards.
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub equipment: IndexSet<RecordId>,
    /// Monster cards.
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub monsters: IndexSet<RecordId>,
    /// Rulebook record.
    pub rule_book: RecordId,
}

impl Game {
    /// Build an empty game pointing at an existing rulebook record.
    pub fn new(name: impl Into<String>, rule_book: RecordId) -> Self {
        Self {
            name: name.into(),
            abilities: IndexSet::new(),
            characters: IndexSet::new(),
            equipment: IndexSet::new(),
            monsters: IndexSet::new(),
            rule_book,
        }
    }

    /// Key set of one of the four entity collections.
    pub fn collection(&self, collection: CollectionKind) -> &IndexSet<RecordId> {
        match collection {
            CollectionKind::Abilities => &self.abilities,
            CollectionKind::Characters => &self.characters,
            CollectionKind::Equipment => &self.equipment,
            CollectionKind::Monsters => &self.monsters,
        }
    }

    /// Whether `id` is currently a key of `collection`.
    pub fn contains(&self, collection: CollectionKind, id: RecordId) -> bool {
        self.collection(collection).contains(&id)
    }
}

/// Per-account entry point holding the account's game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountRoot {
    /// Game owned by the account.
    pub game: RecordId,
}

/// Every record kind the arena can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    /// Shared ability.
    Ability(Ability),
    /// Character template.
    Character(Character),
    /// Equipment card.
    Equipment(Equipment),
    /// Monster card.
    Monster(Monster),
    /// Game rulebook.
    RuleBook(RuleBook),
    /// Game aggregate.
    Game(Game),
    /// Per-account entry point.
    AccountRoot(AccountRoot),
}

/// Discriminant of [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// [`Record::Ability`].
    Ability,
    /// [`Record::Character`].
    Character,
    /// [`Record::Equipment`].
    Equipment,
    /// [`Record::Monster`].
    Monster,
    /// [`Record::RuleBook`].
    RuleBook,
    /// [`Record::Game`].
    Game,
    /// [`Record::AccountRoot`].
    AccountRoot,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecordKind::Ability => "ability",
            RecordKind::Character => "character",
            RecordKind::Equipment => "equipment",
            RecordKind::Monster => "monster",
            RecordKind::RuleBook => "rule_book",
            RecordKind::Game => "game",
            RecordKind::AccountRoot => "account_root",
        };
        f.write_str(label)
    }
}

impl Record {
    /// Discriminant of this record.
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Ability(_) => RecordKind::Ability,
            Record::Character(_) => RecordKind::Character,
            Record::Equipment(_) => RecordKind::Equipment,
            Record::Monster(_) => RecordKind::Monster,
            Record::RuleBook(_) => RecordKind::RuleBook,
            Record::Game(_) => RecordKind::Game,
            Record::AccountRoot(_) => RecordKind::AccountRoot,
        }
    }

    /// Display name for records that carry one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Record::Ability(ability) => Some(&ability.name),
            Record::Character(character) => Some(&character.name),
            Record::Equipment(equipment) => Some(&equipment.name),
            Record::Monster(monster) => Some(&monster.name),
            Record::Game(game) => Some(&game.name),
            Record::RuleBook(_) | Record::AccountRoot(_) => None,
        }
    }

    /// Borrow the game held by this record, if any.
    pub fn as_game(&self) -> Option<&Game> {
        match self {
            Record::Game(game) => Some(game),
            _ => None,
        }
    }
}

/// The four user-managed collections of a [`Game`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// [`Game::abilities`].
    Abilities,
    /// [`Game::characters`].
    Characters,
    /// [`Game::equipment`].
    Equipment,
    /// [`Game::monsters`].
    Monsters,
}

impl CollectionKind {
    /// Kind of record stored in this collection.
    pub fn record_kind(self) -> RecordKind {
        match self {
            CollectionKind::Abilities => RecordKind::Ability,
            CollectionKind::Characters => RecordKind::Character,
            CollectionKind::Equipment => RecordKind::Equipment,
            CollectionKind::Monsters => RecordKind::Monster,
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CollectionKind::Abilities => "abilities",
            CollectionKind::Characters => "characters",
            CollectionKind::Equipment => "equipment",
            CollectionKind::Monsters => "monsters",
        };
        f.write_str(label)
    }
}

/// Arena envelope: a record plus its identity, access group and version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Document {
    /// Arena key.
    pub id: RecordId,
    /// Access group owning the record.
    pub group: GroupId,
    /// Number of changes applied since creation.
    pub version: u64,
    /// Stored payload.
    pub record: Record,
}

impl Document {
    /// Wrap a freshly created record at version 0.
    pub fn new(id: RecordId, group: GroupId, record: Record) -> Self {
        Self {
            id,
            group,
            version: 0,
            record,
        }
    }
}

/// Permission level of an account inside an [`AccessGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Edits content and manages members.
    Admin,
    /// Edits content.
    Writer,
    /// Reads content only.
    Reader,
}

/// Read/write permission boundary applied to every record of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccessGroup {
    /// Group identifier.
    pub id: GroupId,
    /// Role granted to each member account.
    #[schema(value_type = Object)]
    pub members: IndexMap<AccountId, Role>,
}

impl AccessGroup {
    /// New group administered by `owner`.
    pub fn owned_by(owner: AccountId) -> Self {
        let mut members = IndexMap::new();
        members.insert(owner, Role::Admin);
        Self {
            id: GroupId::new(),
            members,
        }
    }

    /// Role of `account`, when it is a member.
    pub fn role_of(&self, account: &AccountId) -> Option<Role> {
        self.members.get(account).copied()
    }

    /// Any member may read.
    pub fn can_read(&self, account: &AccountId) -> bool {
        self.role_of(account).is_some()
    }

    /// Admins and writers may edit.
    pub fn can_write(&self, account: &AccountId) -> bool {
        matches!(self.role_of(account), Some(Role::Admin | Role::Writer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_passive_spelling_is_accepted() {
        let ability: Ability = serde_json::from_str(
            r#"{"name":"Aura","description":"Always on","type":"pasive"}"#,
        )
        .unwrap();
        assert_eq!(ability.kind, AbilityType::Passive);
    }

    #[test]
    fn unknown_monster_type_is_rejected() {
        let result = serde_json::from_str::<MonsterType>(r#""dragon""#);
        assert!(result.is_err());
    }

    #[test]
    fn legacy_effects_and_characteristics_are_accepted() {
        let id = RecordId::new();
        let raw = format!(
            r#"{{"name":"Staff","characteristics":"Old","type":"weapon","effects":["{id}"]}}"#
        );
        let equipment: Equipment = serde_json::from_str(&raw).unwrap();
        assert_eq!(equipment.description, "Old");
        assert!(equipment.abilities.contains(&id));
        assert!(!equipment.is_treasure);
    }

    #[test]
    fn record_is_tagged_by_kind() {
        let record = Record::RuleBook(RuleBook {
            content: "# Rules".into(),
        });
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["kind"], "rule_book");
        assert_eq!(value["content"], "# Rules");
    }

    #[test]
    fn stats_set_and_get_address_the_same_field() {
        let mut stats = Stats::default();
        stats.set(StatField::Movement, 7);
        assert_eq!(stats.get(StatField::Movement), 7);
        assert_eq!(stats.movement, 7);
        assert_eq!(stats.health, 0);
    }

    #[test]
    fn readers_cannot_write() {
        let owner = AccountId::new("owner");
        let reader = AccountId::new("reader");
        let mut group = AccessGroup::owned_by(owner.clone());
        group.members.insert(reader.clone(), Role::Reader);

        assert!(group.can_write(&owner));
        assert!(group.can_read(&reader));
        assert!(!group.can_write(&reader));
        assert!(!group.can_read(&AccountId::new("stranger")));
    }

    #[test]
    fn monster_defaults_match_create_action() {
        let monster = Monster::default();
        assert_eq!(monster.stats, Stats::new(10, 5, 5, 3));
        assert_eq!(monster.kind, MonsterType::Minion);
        assert_eq!(monster.money_drop, 10);
        assert_eq!(monster.essence.color, EssenceColor::Red);
        assert_eq!(monster.essence.drop_rate, DEFAULT_DROP_RATE);
        assert!(monster.drops.is_empty());
    }
}
