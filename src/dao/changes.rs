//! Field-level mutations applied to arena records.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::dao::models::{
    AbilityType, CollectionKind, DEFAULT_DROP_RATE, EquipmentDrop, EquipmentType, EssenceColor,
    GroupId, ImageRef, MonsterType, Record, RecordId, RecordKind, StatField,
};

/// A write to exactly one field of one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldWrite {
    /// Abilities, characters, equipment, monsters and the game itself.
    Name(String),
    /// Description of any entity.
    Description(String),
    /// Ability kind.
    AbilityType(AbilityType),
    /// Artwork of any entity; `None` clears it.
    Image(Option<ImageRef>),
    /// One statistic of a character, equipment or monster.
    Stat {
        /// Statistic to overwrite.
        stat: StatField,
        /// New value.
        value: i32,
    },
    /// Equipment category.
    EquipmentType(EquipmentType),
    /// Equipment treasure flag.
    IsTreasure(bool),
    /// Monster rank.
    MonsterType(MonsterType),
    /// Coins dropped by a monster.
    MoneyDrop(i64),
    /// Color of a monster essence.
    EssenceColor(EssenceColor),
    /// Rules text of a monster essence.
    EssenceDescription(String),
    /// One statistic of a monster essence.
    EssenceStat {
        /// Statistic to overwrite.
        stat: StatField,
        /// New value.
        value: i32,
    },
    /// Drop chance of a monster essence.
    EssenceDropRate(f64),
    /// Drop rate of the drop entry keyed by `equipment`.
    DropRate {
        /// Key of the drop entry.
        equipment: RecordId,
        /// New drop chance.
        rate: f64,
    },
    /// Rulebook markdown.
    Content(String),
}

impl FieldWrite {
    /// Wire name of the targeted field.
    pub fn field_name(&self) -> &'static str {
        match self {
            FieldWrite::Name(_) => "name",
            FieldWrite::Description(_) => "description",
            FieldWrite::AbilityType(_) => "ability_type",
            FieldWrite::Image(_) => "image",
            FieldWrite::Stat { .. } => "stat",
            FieldWrite::EquipmentType(_) => "equipment_type",
            FieldWrite::IsTreasure(_) => "is_treasure",
            FieldWrite::MonsterType(_) => "monster_type",
            FieldWrite::MoneyDrop(_) => "money_drop",
            FieldWrite::EssenceColor(_) => "essence_color",
            FieldWrite::EssenceDescription(_) => "essence_description",
            FieldWrite::EssenceStat { .. } => "essence_stat",
            FieldWrite::EssenceDropRate(_) => "essence_drop_rate",
            FieldWrite::DropRate { .. } => "drop_rate",
            FieldWrite::Content(_) => "content",
        }
    }
}

/// A keyed collection inside a record.
///
/// `abilities` addresses both the game's global ability collection and the
/// ability references held by equipment and monsters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// Ability keys.
    Abilities,
    /// Character keys of a game.
    Characters,
    /// Equipment keys of a game.
    Equipment,
    /// Monster keys of a game.
    Monsters,
    /// Abilities of a monster essence.
    EssenceAbilities,
    /// Equipment drops of a monster.
    Drops,
}

impl Slot {
    /// Wire name of the slot.
    pub fn name(self) -> &'static str {
        match self {
            Slot::Abilities => "abilities",
            Slot::Characters => "characters",
            Slot::Equipment => "equipment",
            Slot::Monsters => "monsters",
            Slot::EssenceAbilities => "essence_abilities",
            Slot::Drops => "drops",
        }
    }

    /// Game collection that entries of this slot are drawn from, for slots
    /// holding references owned by an entity.
    pub fn source_collection(self) -> Option<CollectionKind> {
        match self {
            Slot::Abilities | Slot::EssenceAbilities => Some(CollectionKind::Abilities),
            Slot::Drops => Some(CollectionKind::Equipment),
            Slot::Characters | Slot::Equipment | Slot::Monsters => None,
        }
    }
}

impl From<CollectionKind> for Slot {
    fn from(value: CollectionKind) -> Self {
        match value {
            CollectionKind::Abilities => Slot::Abilities,
            CollectionKind::Characters => Slot::Characters,
            CollectionKind::Equipment => Slot::Equipment,
            CollectionKind::Monsters => Slot::Monsters,
        }
    }
}

/// A single mutation committed through the sync layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Change {
    /// Overwrite one field.
    Set {
        /// Field and its new value.
        write: FieldWrite,
    },
    /// Insert `target` into `slot`, overwriting any existing entry.
    Link {
        /// Keyed collection to edit.
        slot: Slot,
        /// Key to insert or remove.
        target: RecordId,
    },
    /// Remove `target` from `slot`. Absent keys are ignored.
    Unlink {
        /// Keyed collection to edit.
        slot: Slot,
        /// Key to insert or remove.
        target: RecordId,
    },
}

impl Change {
    fn label(&self) -> &'static str {
        match self {
            Change::Set { write } => write.field_name(),
            Change::Link { slot, .. } | Change::Unlink { slot, .. } => slot.name(),
        }
    }
}

/// Notification broadcast by the sync layer after each accepted write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChangeEvent {
    /// Record that changed.
    pub id: RecordId,
    /// Access group of the record.
    pub group: GroupId,
    /// Record version after the change.
    pub version: u64,
    /// What happened.
    #[serde(flatten)]
    pub kind: ChangeEventKind,
}

/// Payload of a [`ChangeEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEventKind {
    /// A record was stored for the first time.
    Created {
        /// Initial content.
        record: Record,
    },
    /// A change was committed.
    Updated {
        /// Applied change.
        change: Change,
    },
}

/// A change that cannot be applied to the targeted record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// The record kind has no such field or slot.
    #[error("{kind} records have no `{field}` field")]
    NotApplicable {
        /// Kind of the targeted record.
        kind: RecordKind,
        /// Field or slot named by the change.
        field: &'static str,
    },
    /// A drop rate targeted an equipment the monster does not drop.
    #[error("no drop entry for equipment `{equipment}`")]
    MissingDrop {
        /// Equipment key looked up in the drops.
        equipment: RecordId,
    },
}

impl Record {
    /// Apply `change` in place. On error the record is left untouched.
    pub fn apply(&mut self, change: &Change) -> Result<(), ApplyError> {
        let kind = self.kind();
        let applied = match change {
            Change::Set { write } => self.set_field(write)?,
            Change::Link { slot, target } => self.link(*slot, *target),
            Change::Unlink { slot, target } => self.unlink(*slot, *target),
        };

        if applied {
            Ok(())
        } else {
            Err(ApplyError::NotApplicable {
                kind,
                field: change.label(),
            })
        }
    }

    /// Every outgoing reference held by this record, in slot order.
    pub fn links(&self) -> Vec<(Slot, RecordId)> {
        match self {
            Record::Equipment(equipment) => {
                tagged(Slot::Abilities, equipment.abilities.iter()).collect()
            }
            Record::Monster(monster) => tagged(Slot::Abilities, monster.abilities.iter())
                .chain(tagged(
                    Slot::EssenceAbilities,
                    monster.essence.abilities.iter(),
                ))
                .chain(tagged(Slot::Drops, monster.drops.keys()))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn set_field(&mut self, write: &FieldWrite) -> Result<bool, ApplyError> {
        use FieldWrite as W;

        let applied = match (self, write) {
            (Record::Ability(a), W::Name(v)) => replace(&mut a.name, v),
            (Record::Character(c), W::Name(v)) => replace(&mut c.name, v),
            (Record::Equipment(e), W::Name(v)) => replace(&mut e.name, v),
            (Record::Monster(m), W::Name(v)) => replace(&mut m.name, v),
            (Record::Game(g), W::Name(v)) => replace(&mut g.name, v),

            (Record::Ability(a), W::Description(v)) => replace(&mut a.description, v),
            (Record::Character(c), W::Description(v)) => replace(&mut c.description, v),
            (Record::Equipment(e), W::Description(v)) => replace(&mut e.description, v),
            (Record::Monster(m), W::Description(v)) => replace(&mut m.description, v),

            (Record::Ability(a), W::Image(v)) => replace(&mut a.image, v),
            (Record::Character(c), W::Image(v)) => replace(&mut c.image, v),
            (Record::Equipment(e), W::Image(v)) => replace(&mut e.image, v),
            (Record::Monster(m), W::Image(v)) => replace(&mut m.image, v),

            (Record::Character(c), W::Stat { stat, value }) => {
                c.stats.set(*stat, *value);
                true
            }
            (Record::Equipment(e), W::Stat { stat, value }) => {
                e.stats.set(*stat, *value);
                true
            }
            (Record::Monster(m), W::Stat { stat, value }) => {
                m.stats.set(*stat, *value);
                true
            }

            (Record::Ability(a), W::AbilityType(v)) => replace(&mut a.kind, v),
            (Record::Equipment(e), W::EquipmentType(v)) => replace(&mut e.kind, v),
            (Record::Equipment(e), W::IsTreasure(v)) => replace(&mut e.is_treasure, v),
            (Record::Monster(m), W::MonsterType(v)) => replace(&mut m.kind, v),
            (Record::Monster(m), W::MoneyDrop(v)) => replace(&mut m.money_drop, v),

            (Record::Monster(m), W::EssenceColor(v)) => replace(&mut m.essence.color, v),
            (Record::Monster(m), W::EssenceDescription(v)) => {
                replace(&mut m.essence.description, v)
            }
            (Record::Monster(m), W::EssenceStat { stat, value }) => {
                m.essence.stats.set(*stat, *value);
                true
            }
            (Record::Monster(m), W::EssenceDropRate(v)) => replace(&mut m.essence.drop_rate, v),
            (Record::Monster(m), W::DropRate { equipment, rate }) => {
                let Some(entry) = m.drops.get_mut(equipment) else {
                    return Err(ApplyError::MissingDrop {
                        equipment: *equipment,
                    });
                };
                entry.drop_rate = *rate;
                true
            }

            (Record::RuleBook(r), W::Content(v)) => replace(&mut r.content, v),

            _ => false,
        };

        Ok(applied)
    }

    fn link(&mut self, slot: Slot, target: RecordId) -> bool {
        match (self, slot) {
            (Record::Monster(m), Slot::Drops) => {
                m.drops.insert(
                    target,
                    EquipmentDrop {
                        equipment: target,
                        drop_rate: DEFAULT_DROP_RATE,
                    },
                );
                true
            }
            (record, slot) => match record.id_set_mut(slot) {
                Some(set) => {
                    set.insert(target);
                    true
                }
                None => false,
            },
        }
    }

    fn unlink(&mut self, slot: Slot, target: RecordId) -> bool {
        match (self, slot) {
            (Record::Monster(m), Slot::Drops) => {
                m.drops.shift_remove(&target);
                true
            }
            (record, slot) => match record.id_set_mut(slot) {
                Some(set) => {
                    set.shift_remove(&target);
                    true
                }
                None => false,
            },
        }
    }

    fn id_set_mut(&mut self, slot: Slot) -> Option<&mut indexmap::IndexSet<RecordId>> {
        match (self, slot) {
            (Record::Game(g), Slot::Abilities) => Some(&mut g.abilities),
            (Record::Game(g), Slot::Characters) => Some(&mut g.characters),
            (Record::Game(g), Slot::Equipment) => Some(&mut g.equipment),
            (Record::Game(g), Slot::Monsters) => Some(&mut g.monsters),
            (Record::Equipment(e), Slot::Abilities) => Some(&mut e.abilities),
            (Record::Monster(m), Slot::Abilities) => Some(&mut m.abilities),
            (Record::Monster(m), Slot::EssenceAbilities) => Some(&mut m.essence.abilities),
            _ => None,
        }
    }
}

fn tagged<'a>(
    slot: Slot,
    ids: impl Iterator<Item = &'a RecordId> + 'a,
) -> impl Iterator<Item = (Slot, RecordId)> + 'a {
    ids.map(move |id| (slot, *id))
}

fn replace<T: Clone>(slot: &mut T, value: &T) -> bool {
    *slot = value.clone();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{Ability, Character, Equipment, Game, Monster, Stats};

    #[test]
    fn stat_write_targets_owned_stats() {
        let mut record = Record::Character(Character::default());
        record
            .apply(&Change::Set {
                write: FieldWrite::Stat {
                    stat: StatField::Health,
                    value: 42,
                },
            })
            .unwrap();

        let Record::Character(character) = record else {
            panic!("kind changed");
        };
        assert_eq!(character.stats, Stats::new(42, 10, 10, 5));
    }

    #[test]
    fn inapplicable_field_is_rejected_without_mutation() {
        let mut record = Record::Ability(Ability::default());
        let before = record.clone();

        let err = record
            .apply(&Change::Set {
                write: FieldWrite::MoneyDrop(99),
            })
            .unwrap_err();

        assert_eq!(
            err,
            ApplyError::NotApplicable {
                kind: RecordKind::Ability,
                field: "money_drop",
            }
        );
        assert_eq!(record, before);
    }

    #[test]
    fn characters_hold_no_ability_references() {
        let mut record = Record::Character(Character::default());
        let err = record
            .apply(&Change::Link {
                slot: Slot::Abilities,
                target: RecordId::new(),
            })
            .unwrap_err();
        assert!(matches!(err, ApplyError::NotApplicable { .. }));
    }

    #[test]
    fn linking_twice_keeps_a_single_entry() {
        let target = RecordId::new();
        let mut record = Record::Equipment(Equipment::default());
        let link = Change::Link {
            slot: Slot::Abilities,
            target,
        };
        record.apply(&link).unwrap();
        record.apply(&link).unwrap();

        assert_eq!(record.links(), vec![(Slot::Abilities, target)]);
    }

    #[test]
    fn drop_link_creates_entry_with_default_rate() {
        let equipment = RecordId::new();
        let mut record = Record::Monster(Monster::default());
        record
            .apply(&Change::Link {
                slot: Slot::Drops,
                target: equipment,
            })
            .unwrap();
        record
            .apply(&Change::Set {
                write: FieldWrite::DropRate {
                    equipment,
                    rate: 0.25,
                },
            })
            .unwrap();

        let Record::Monster(monster) = &record else {
            panic!("kind changed");
        };
        assert_eq!(monster.drops[&equipment].drop_rate, 0.25);
        assert_eq!(monster.drops[&equipment].equipment, equipment);
    }

    #[test]
    fn drop_rate_is_not_range_checked() {
        let mut record = Record::Monster(Monster::default());
        record
            .apply(&Change::Set {
                write: FieldWrite::EssenceDropRate(3.5),
            })
            .unwrap();
        let Record::Monster(monster) = &record else {
            panic!("kind changed");
        };
        assert_eq!(monster.essence.drop_rate, 3.5);
    }

    #[test]
    fn drop_rate_for_missing_entry_fails() {
        let equipment = RecordId::new();
        let mut record = Record::Monster(Monster::default());
        let err = record
            .apply(&Change::Set {
                write: FieldWrite::DropRate {
                    equipment,
                    rate: 0.1,
                },
            })
            .unwrap_err();
        assert_eq!(err, ApplyError::MissingDrop { equipment });
    }

    #[test]
    fn unlink_of_absent_key_is_a_no_op() {
        let mut record = Record::Game(Game::new("Game", RecordId::new()));
        let before = record.clone();
        record
            .apply(&Change::Unlink {
                slot: Slot::Monsters,
                target: RecordId::new(),
            })
            .unwrap();
        assert_eq!(record, before);
    }

    #[test]
    fn monster_links_cover_every_slot() {
        let ability = RecordId::new();
        let essence_ability = RecordId::new();
        let equipment = RecordId::new();
        let mut record = Record::Monster(Monster::default());
        for (slot, target) in [
            (Slot::Abilities, ability),
            (Slot::EssenceAbilities, essence_ability),
            (Slot::Drops, equipment),
        ] {
            record.apply(&Change::Link { slot, target }).unwrap();
        }

        assert_eq!(
            record.links(),
            vec![
                (Slot::Abilities, ability),
                (Slot::EssenceAbilities, essence_ability),
                (Slot::Drops, equipment),
            ]
        );
    }

    #[test]
    fn field_write_wire_format() {
        let write: FieldWrite =
            serde_json::from_str(r#"{"field":"stat","value":{"stat":"health","value":42}}"#)
                .unwrap();
        assert_eq!(
            write,
            FieldWrite::Stat {
                stat: StatField::Health,
                value: 42
            }
        );

        let write: FieldWrite =
            serde_json::from_str(r#"{"field":"equipment_type","value":"armor"}"#).unwrap();
        assert_eq!(write, FieldWrite::EquipmentType(EquipmentType::Armor));
    }
}
