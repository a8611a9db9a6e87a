#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Resolves declarative condition and trigger descriptors.
//!
//! Conditions become booleans and triggers become world [`Command`]s. Neither
//! resolver mutates anything; the caller applies the produced commands through
//! the world so each effect lands atomically.

use candy_quest_core::{
    CharacterSnapshot, Command, ConditionDescriptor, RuleContext, StatKind, TriggerDescriptor,
};

/// Counters that numeric conditions may reference besides the seven stats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Counter {
    /// Number of items carried, duplicates included.
    Inventory,
    /// Houses the character has visited.
    HousesVisited,
    /// Tricks the character has played.
    Tricks,
    /// Treats the character has accepted.
    Treats,
    /// Current round number.
    Round,
}

impl Counter {
    /// Resolves a content-table name into a counter.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "inventory" => Some(Self::Inventory),
            "houses_visited" => Some(Self::HousesVisited),
            "tricks" => Some(Self::Tricks),
            "treats" => Some(Self::Treats),
            "round" => Some(Self::Round),
            _ => None,
        }
    }

    fn read(self, character: &CharacterSnapshot, context: &RuleContext<'_>) -> i32 {
        let value = match self {
            Self::Inventory => u32::try_from(character.inventory.len()).unwrap_or(u32::MAX),
            Self::HousesVisited => context.houses_visited,
            Self::Tricks => context.tricks,
            Self::Treats => context.treats,
            Self::Round => context.round,
        };
        i32::try_from(value).unwrap_or(i32::MAX)
    }
}

/// Looks up the current value of a named stat or counter.
#[must_use]
pub fn numeric_target(
    target: &str,
    character: &CharacterSnapshot,
    context: &RuleContext<'_>,
) -> Option<i32> {
    if let Some(stat) = StatKind::from_name(target) {
        return Some(character.stats.get(stat));
    }
    Counter::from_name(target).map(|counter| counter.read(character, context))
}

/// Evaluates a single condition for a character.
///
/// Unknown logic kinds and numeric targets resolve to `false`.
#[must_use]
pub fn resolve_condition(
    descriptor: &ConditionDescriptor,
    character: &CharacterSnapshot,
    context: &RuleContext<'_>,
) -> bool {
    match descriptor {
        ConditionDescriptor::Item { item } => character.holds(item),
        ConditionDescriptor::Numeric {
            target,
            comparison,
            value,
        } => match numeric_target(target, character, context) {
            Some(current) => comparison.holds(current, *value),
            None => {
                tracing::debug!(target = %target, "numeric condition references unknown target");
                false
            }
        },
        ConditionDescriptor::Location { point } => character.cell == *point,
        ConditionDescriptor::Tile { tile } => context.tiles.at(character.cell) == Some(tile),
        ConditionDescriptor::Unrecognized => {
            tracing::debug!("condition with unrecognized logic kind");
            false
        }
    }
}

/// Reports whether every condition in the list holds. Empty lists pass.
#[must_use]
pub fn conditions_pass(
    conditions: &[ConditionDescriptor],
    character: &CharacterSnapshot,
    context: &RuleContext<'_>,
) -> bool {
    conditions
        .iter()
        .all(|condition| resolve_condition(condition, character, context))
}

/// Maps a trigger onto the world command that applies it.
///
/// `ADD`/`GIVE` and `SUBTRACT`/`TAKE` collapse into a sign here, so a stat
/// trigger may use `GIVE` and an item trigger may use `SUBTRACT`. Unknown
/// kinds and stat names produce no command.
#[must_use]
pub fn resolve_trigger(
    descriptor: &TriggerDescriptor,
    character: &CharacterSnapshot,
    _context: &RuleContext<'_>,
) -> Option<Command> {
    match descriptor {
        TriggerDescriptor::Stat { op, target, value } => {
            let Some(stat) = StatKind::from_name(target) else {
                tracing::debug!(target = %target, "stat trigger references unknown stat");
                return None;
            };
            Some(Command::AdjustStat {
                character: character.id,
                stat,
                delta: value.saturating_mul(op.sign()),
            })
        }
        TriggerDescriptor::Item { op, item } => {
            let item = item.clone();
            Some(if op.sign() > 0 {
                Command::GiveItem {
                    character: character.id,
                    item,
                }
            } else {
                Command::TakeItem {
                    character: character.id,
                    item,
                }
            })
        }
        TriggerDescriptor::Position { delta } => Some(Command::TranslateCharacter {
            character: character.id,
            delta: *delta,
        }),
        TriggerDescriptor::Unrecognized => {
            tracing::debug!("trigger with unrecognized logic kind");
            None
        }
    }
}

/// Resolves every trigger in order, skipping the ones that produce nothing.
#[must_use]
pub fn resolve_triggers(
    triggers: &[TriggerDescriptor],
    character: &CharacterSnapshot,
    context: &RuleContext<'_>,
) -> Vec<Command> {
    triggers
        .iter()
        .filter_map(|trigger| resolve_trigger(trigger, character, context))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use candy_quest_core::{
        CellCoord, CellOffset, CharacterId, Comparison, Grid, ItemId, Stats, TileKind, TriggerOp,
        UserId,
    };

    fn character(health: i32) -> CharacterSnapshot {
        CharacterSnapshot {
            id: CharacterId::new(2),
            user: UserId::new("ann"),
            name: "Ann".to_owned(),
            cell: CellCoord::new(1, 0),
            stats: Stats {
                health,
                ..Stats::default()
            },
            can_take_turn: true,
            has_moved: false,
            active: true,
            inventory: vec![ItemId::new("lantern"), ItemId::new("gum"), ItemId::new("gum")],
        }
    }

    fn less_than(target: &str, value: i32) -> ConditionDescriptor {
        ConditionDescriptor::Numeric {
            target: target.to_owned(),
            comparison: Comparison::LessThan,
            value,
        }
    }

    fn with_context<R>(run: impl FnOnce(&RuleContext<'_>) -> R) -> R {
        let mut tiles = Grid::filled(3, 1, TileKind::Corridor);
        let _ = tiles.set(CellCoord::new(1, 0), TileKind::Doorway);
        let context = RuleContext {
            tiles: &tiles,
            round: 4,
            houses_visited: 2,
            tricks: 1,
            treats: 0,
        };
        run(&context)
    }

    #[test]
    fn less_than_two_on_health() {
        with_context(|context| {
            assert!(resolve_condition(&less_than("health", 2), &character(1), context));
            assert!(!resolve_condition(&less_than("health", 2), &character(2), context));
        });
    }

    #[test]
    fn counters_resolve_from_context_and_inventory() {
        with_context(|context| {
            let kid = character(5);
            assert_eq!(numeric_target("inventory", &kid, context), Some(3));
            assert_eq!(numeric_target("houses_visited", &kid, context), Some(2));
            assert_eq!(numeric_target("round", &kid, context), Some(4));
            assert_eq!(numeric_target("luck", &kid, context), Some(1));
            assert_eq!(numeric_target("charisma", &kid, context), None);
        });
    }

    #[test]
    fn unknown_targets_and_kinds_fail_closed() {
        with_context(|context| {
            let kid = character(5);
            assert!(!resolve_condition(&less_than("charisma", 99), &kid, context));
            assert!(!resolve_condition(
                &ConditionDescriptor::Unrecognized,
                &kid,
                context
            ));
            assert_eq!(
                resolve_trigger(&TriggerDescriptor::Unrecognized, &kid, context),
                None
            );
        });
    }

    #[test]
    fn location_tile_and_item_conditions() {
        with_context(|context| {
            let kid = character(5);
            let conditions = vec![
                ConditionDescriptor::Location {
                    point: CellCoord::new(1, 0),
                },
                ConditionDescriptor::Tile {
                    tile: TileKind::Doorway,
                },
                ConditionDescriptor::Item {
                    item: ItemId::new("lantern"),
                },
            ];
            assert!(conditions_pass(&conditions, &kid, context));
            assert!(conditions_pass(&[], &kid, context));

            let missing = [ConditionDescriptor::Item {
                item: ItemId::new("broom"),
            }];
            assert!(!conditions_pass(&missing, &kid, context));
        });
    }

    #[test]
    fn trigger_synonyms_share_a_sign() {
        with_context(|context| {
            let kid = character(5);
            let stat = |op| TriggerDescriptor::Stat {
                op,
                target: "candies".to_owned(),
                value: 3,
            };
            let expected_gain = Some(Command::AdjustStat {
                character: kid.id,
                stat: StatKind::Candies,
                delta: 3,
            });
            assert_eq!(resolve_trigger(&stat(TriggerOp::Add), &kid, context), expected_gain);
            assert_eq!(resolve_trigger(&stat(TriggerOp::Give), &kid, context), expected_gain);
            assert_eq!(
                resolve_trigger(&stat(TriggerOp::Take), &kid, context),
                resolve_trigger(&stat(TriggerOp::Subtract), &kid, context)
            );

            let item = TriggerDescriptor::Item {
                op: TriggerOp::Subtract,
                item: ItemId::new("gum"),
            };
            assert_eq!(
                resolve_trigger(&item, &kid, context),
                Some(Command::TakeItem {
                    character: kid.id,
                    item: ItemId::new("gum"),
                })
            );
        });
    }

    #[test]
    fn position_triggers_translate() {
        with_context(|context| {
            let kid = character(5);
            let triggers = [
                TriggerDescriptor::Position {
                    delta: CellOffset::new(-1, 2),
                },
                TriggerDescriptor::Unrecognized,
            ];
            assert_eq!(
                resolve_triggers(&triggers, &kid, context),
                vec![Command::TranslateCharacter {
                    character: kid.id,
                    delta: CellOffset::new(-1, 2),
                }]
            );
        });
    }
}
