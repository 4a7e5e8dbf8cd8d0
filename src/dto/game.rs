use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{Document, Game, Record, RecordId},
    dto::validation::validate_not_blank,
};

/// Snapshot of the session's game with the key sets of its collections.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameSummary {
    /// Game record.
    pub id: RecordId,
    /// Display name.
    pub name: String,
    /// Rulebook record.
    pub rule_book: RecordId,
    /// Ability keys, in insertion order.
    pub abilities: Vec<RecordId>,
    /// Character keys, in insertion order.
    pub characters: Vec<RecordId>,
    /// Equipment keys, in insertion order.
    pub equipment: Vec<RecordId>,
    /// Monster keys, in insertion order.
    pub monsters: Vec<RecordId>,
    /// Version of the game record.
    pub version: u64,
}

impl GameSummary {
    /// Flatten a game record into its summary.
    pub fn new(id: RecordId, version: u64, game: Game) -> Self {
        Self {
            id,
            name: game.name,
            rule_book: game.rule_book,
            abilities: game.abilities.into_iter().collect(),
            characters: game.characters.into_iter().collect(),
            equipment: game.equipment.into_iter().collect(),
            monsters: game.monsters.into_iter().collect(),
            version,
        }
    }
}

/// Payload renaming the session's game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RenameGameRequest {
    /// New display name. Must not be blank.
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
}

/// Markdown rulebook attached to the game.
#[derive(Debug, Serialize, ToSchema)]
pub struct RuleBookView {
    /// Rulebook record.
    pub id: RecordId,
    /// Markdown text.
    pub content: String,
    /// Version of the rulebook record.
    pub version: u64,
}

impl RuleBookView {
    /// Project a rulebook document; `None` when the document holds another kind.
    pub fn from_document(document: Document) -> Option<Self> {
        match document.record {
            Record::RuleBook(rule_book) => Some(Self {
                id: document.id,
                content: rule_book.content,
                version: document.version,
            }),
            _ => None,
        }
    }
}

/// Payload replacing the rulebook markdown. Empty content is allowed.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateRuleBookRequest {
    /// Replacement markdown text.
    pub content: String,
}
