use crate::dao::models::{AccountId, GroupId, RecordId};

/// Per-request context identifying the caller and the game they operate on.
///
/// Produced by account-root initialization and passed explicitly to every
/// content operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Caller.
    pub account: AccountId,
    /// Account root record of the caller.
    pub root: RecordId,
    /// Game the caller works on.
    pub game: RecordId,
    /// Access group of that game.
    pub group: GroupId,
}
