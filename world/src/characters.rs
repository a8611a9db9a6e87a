//! Authoritative character state management utilities.

use std::collections::BTreeMap;

use candy_quest_core::{CellCoord, CharacterId, CharacterSnapshot, ItemId, Stats, UserId};

/// Character stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Character {
    pub(crate) id: CharacterId,
    pub(crate) user: UserId,
    pub(crate) name: String,
    pub(crate) cell: CellCoord,
    pub(crate) stats: Stats,
    pub(crate) can_take_turn: bool,
    pub(crate) has_moved: bool,
    pub(crate) active: bool,
    pub(crate) inventory: Vec<ItemId>,
}

impl Character {
    pub(crate) fn snapshot(&self) -> CharacterSnapshot {
        CharacterSnapshot {
            id: self.id,
            user: self.user.clone(),
            name: self.name.clone(),
            cell: self.cell,
            stats: self.stats,
            can_take_turn: self.can_take_turn,
            has_moved: self.has_moved,
            active: self.active,
            inventory: self.inventory.clone(),
        }
    }

    /// Removes the first copy of `item`, reporting whether one was held.
    pub(crate) fn take_item(&mut self, item: &ItemId) -> bool {
        match self.inventory.iter().position(|held| held == item) {
            Some(index) => {
                let _ = self.inventory.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Registry that stores characters in join order and allocates identifiers.
#[derive(Debug)]
pub(crate) struct CharacterRoster {
    entries: BTreeMap<CharacterId, Character>,
    order: Vec<CharacterId>,
    next_id: CharacterId,
}

impl CharacterRoster {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            order: Vec::new(),
            next_id: CharacterId::new(0),
        }
    }

    pub(crate) fn join(
        &mut self,
        user: UserId,
        name: String,
        cell: CellCoord,
        stats: Stats,
        inventory: Vec<ItemId>,
    ) -> CharacterId {
        let id = self.next_id;
        self.next_id = CharacterId::new(id.get().saturating_add(1));
        let character = Character {
            id,
            user,
            name,
            cell,
            stats,
            can_take_turn: false,
            has_moved: false,
            active: true,
            inventory,
        };
        let _ = self.entries.insert(id, character);
        self.order.push(id);
        id
    }

    pub(crate) fn get(&self, id: CharacterId) -> Option<&Character> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Character> {
        self.entries.values()
    }

    pub(crate) fn for_user(&self, user: &UserId) -> Option<&Character> {
        self.entries.values().find(|character| &character.user == user)
    }

    /// Next active character after `current` in join order, and whether the
    /// search wrapped past the end of the order.
    pub(crate) fn next_active_after(
        &self,
        current: Option<CharacterId>,
    ) -> Option<(CharacterId, bool)> {
        let start = current
            .and_then(|id| self.order.iter().position(|candidate| *candidate == id))
            .map_or(0, |index| index + 1);
        let count = self.order.len();

        (0..count).find_map(|step| {
            let index = start + step;
            let id = self.order[index % count];
            let wrapped = current.is_some() && index >= count;
            self.entries
                .get(&id)
                .filter(|character| character.active)
                .map(|_| (id, wrapped))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster_with(count: u32) -> CharacterRoster {
        let mut roster = CharacterRoster::new();
        for index in 0..count {
            let _ = roster.join(
                UserId::new(format!("user-{index}")),
                format!("kid {index}"),
                CellCoord::new(0, 0),
                Stats::default(),
                Vec::new(),
            );
        }
        roster
    }

    #[test]
    fn identifiers_follow_join_order() {
        let roster = roster_with(3);
        let ids: Vec<_> = roster.iter().map(|character| character.id.get()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(
            roster.for_user(&UserId::new("user-1")).map(|c| c.id),
            Some(CharacterId::new(1))
        );
    }

    #[test]
    fn next_active_wraps_and_skips_inactive() {
        let mut roster = roster_with(3);
        if let Some(character) = roster.get_mut(CharacterId::new(0)) {
            character.active = false;
        }

        assert_eq!(roster.next_active_after(None), Some((CharacterId::new(1), false)));
        assert_eq!(
            roster.next_active_after(Some(CharacterId::new(1))),
            Some((CharacterId::new(2), false))
        );
        assert_eq!(
            roster.next_active_after(Some(CharacterId::new(2))),
            Some((CharacterId::new(1), true))
        );
    }

    #[test]
    fn take_item_removes_a_single_copy() {
        let mut roster = roster_with(1);
        let gum = ItemId::new("gum");
        let character = roster.get_mut(CharacterId::new(0)).expect("joined");
        character.inventory = vec![gum.clone(), gum.clone()];

        assert!(character.take_item(&gum));
        assert_eq!(character.inventory, vec![gum.clone()]);
        assert!(character.take_item(&gum));
        assert!(!character.take_item(&gum));
    }
}
