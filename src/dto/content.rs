//! Payloads for creating, editing and reading game entities.
//!
//! Creation requests mirror the "Create New X" actions: every field is
//! optional and falls back to the defaults of the matching entity.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::{
        changes::{FieldWrite, Slot},
        models::{
            Ability, AbilityType, Character, Document, Equipment, EquipmentType, EssenceColor,
            ImageRef, Monster, MonsterEssence, MonsterType, Record, RecordId, Stats,
        },
    },
    dto::validation::{validate_drop_rate, validate_not_blank},
};

fn check_name(errors: &mut ValidationErrors, field: &'static str, value: Option<&str>) {
    if let Some(value) = value
        && let Err(err) = validate_not_blank(value)
    {
        errors.add(field, err);
    }
}

fn check_rate(errors: &mut ValidationErrors, field: &'static str, value: Option<f64>) {
    if let Some(rate) = value
        && let Err(err) = validate_drop_rate(rate)
    {
        errors.add(field, err);
    }
}

fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Payload creating a shared ability.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateAbilityRequest {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Flavor and rules text.
    #[serde(default)]
    pub description: Option<String>,
    /// Active or passive.
    #[serde(default, rename = "type")]
    pub kind: Option<AbilityType>,
    /// Artwork reference.
    #[serde(default)]
    pub image: Option<ImageRef>,
}

impl Validate for CreateAbilityRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_name(&mut errors, "name", self.name.as_deref());
        into_result(errors)
    }
}

impl From<CreateAbilityRequest> for Ability {
    fn from(request: CreateAbilityRequest) -> Self {
        let defaults = Ability::default();
        Self {
            name: request.name.unwrap_or(defaults.name),
            description: request.description.unwrap_or(defaults.description),
            kind: request.kind.unwrap_or(defaults.kind),
            image: request.image,
        }
    }
}

/// Payload creating a character template.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateCharacterRequest {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Flavor and rules text.
    #[serde(default, alias = "characteristics")]
    pub description: Option<String>,
    /// Starting statistics.
    #[serde(default)]
    pub stats: Option<Stats>,
    /// Artwork reference.
    #[serde(default)]
    pub image: Option<ImageRef>,
}

impl Validate for CreateCharacterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_name(&mut errors, "name", self.name.as_deref());
        into_result(errors)
    }
}

impl From<CreateCharacterRequest> for Character {
    fn from(request: CreateCharacterRequest) -> Self {
        let defaults = Character::default();
        Self {
            name: request.name.unwrap_or(defaults.name),
            description: request.description.unwrap_or(defaults.description),
            stats: request.stats.unwrap_or(defaults.stats),
            image: request.image,
        }
    }
}

/// Payload creating an equipment card. Abilities are attached afterwards.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateEquipmentRequest {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Flavor and rules text.
    #[serde(default, alias = "characteristics")]
    pub description: Option<String>,
    /// Starting statistics.
    #[serde(default)]
    pub stats: Option<Stats>,
    /// Equipment category.
    #[serde(default, rename = "type")]
    pub kind: Option<EquipmentType>,
    /// Whether the card is loot only.
    #[serde(default)]
    pub is_treasure: Option<bool>,
    /// Artwork reference.
    #[serde(default)]
    pub image: Option<ImageRef>,
}

impl Validate for CreateEquipmentRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_name(&mut errors, "name", self.name.as_deref());
        into_result(errors)
    }
}

impl From<CreateEquipmentRequest> for Equipment {
    fn from(request: CreateEquipmentRequest) -> Self {
        let defaults = Equipment::default();
        Self {
            name: request.name.unwrap_or(defaults.name),
            description: request.description.unwrap_or(defaults.description),
            stats: request.stats.unwrap_or(defaults.stats),
            kind: request.kind.unwrap_or(defaults.kind),
            abilities: defaults.abilities,
            is_treasure: request.is_treasure.unwrap_or(defaults.is_treasure),
            image: request.image,
        }
    }
}

/// Initial values for the essence owned by a new monster.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct EssenceInput {
    /// Essence color.
    #[serde(default)]
    pub color: Option<EssenceColor>,
    /// Rules text.
    #[serde(default)]
    pub description: Option<String>,
    /// Statistics granted by the essence.
    #[serde(default)]
    pub stats: Option<Stats>,
    /// Chance in `[0, 1]`.
    #[serde(default)]
    pub drop_rate: Option<f64>,
}

impl From<EssenceInput> for MonsterEssence {
    fn from(input: EssenceInput) -> Self {
        let defaults = MonsterEssence::default();
        Self {
            color: input.color.unwrap_or(defaults.color),
            description: input.description.unwrap_or(defaults.description),
            stats: input.stats.unwrap_or(defaults.stats),
            abilities: defaults.abilities,
            drop_rate: input.drop_rate.unwrap_or(defaults.drop_rate),
        }
    }
}

/// Payload creating a monster card. Drops and abilities are attached afterwards.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateMonsterRequest {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Flavor and rules text.
    #[serde(default, alias = "characteristics")]
    pub description: Option<String>,
    /// Starting statistics.
    #[serde(default)]
    pub stats: Option<Stats>,
    /// Boss or minion.
    #[serde(default, rename = "type")]
    pub kind: Option<MonsterType>,
    /// Coins awarded when defeated.
    #[serde(default)]
    pub money_drop: Option<i64>,
    /// Owned essence; defaults apply to omitted fields.
    #[serde(default)]
    pub essence: Option<EssenceInput>,
    /// Artwork reference.
    #[serde(default)]
    pub image: Option<ImageRef>,
}

impl Validate for CreateMonsterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_name(&mut errors, "name", self.name.as_deref());
        check_rate(
            &mut errors,
            "essence",
            self.essence.as_ref().and_then(|essence| essence.drop_rate),
        );
        into_result(errors)
    }
}

impl From<CreateMonsterRequest> for Monster {
    fn from(request: CreateMonsterRequest) -> Self {
        let defaults = Monster::default();
        Self {
            name: request.name.unwrap_or(defaults.name),
            description: request.description.unwrap_or(defaults.description),
            stats: request.stats.unwrap_or(defaults.stats),
            kind: request.kind.unwrap_or(defaults.kind),
            abilities: defaults.abilities,
            essence: request.essence.map(Into::into).unwrap_or(defaults.essence),
            drops: defaults.drops,
            money_drop: request.money_drop.unwrap_or(defaults.money_drop),
            image: request.image,
        }
    }
}

/// Single field edit, applied immediately.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FieldUpdateRequest {
    /// Field to overwrite and its value.
    pub write: FieldWrite,
}

impl Validate for FieldUpdateRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match &self.write {
            FieldWrite::Name(name) => check_name(&mut errors, "name", Some(name.as_str())),
            FieldWrite::EssenceDropRate(rate) => {
                check_rate(&mut errors, "essence_drop_rate", Some(*rate))
            }
            FieldWrite::DropRate { rate, .. } => check_rate(&mut errors, "drop_rate", Some(*rate)),
            _ => {}
        }
        into_result(errors)
    }
}

/// A stored entity with its identity and version.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordView {
    /// Arena key.
    pub id: RecordId,
    /// Changes applied since creation.
    pub version: u64,
    /// Stored entity, tagged by `kind`.
    #[serde(flatten)]
    pub record: Record,
}

impl From<Document> for RecordView {
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            version: document.version,
            record: document.record,
        }
    }
}

/// Whether a reference still points at an entity of the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LinkStatus {
    /// The target is still a key of its collection.
    Live {
        /// Current name of the target, when it carries one.
        name: Option<String>,
    },
    /// The target was removed from its collection.
    Dangling,
}

/// One outgoing reference of an entity, resolved against the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LinkView {
    /// Slot holding the reference.
    pub slot: Slot,
    /// Referenced entity.
    pub target: RecordId,
    /// Live or dangling.
    #[serde(flatten)]
    pub status: LinkStatus,
}

/// An entity together with its resolved references.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordDetails {
    /// The entity itself.
    pub record: RecordView,
    /// Its outgoing references.
    pub links: Vec<LinkView>,
}
