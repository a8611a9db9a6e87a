#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Candy Quest.

mod characters;
mod map;
mod sites;

use candy_quest_core::{CellCoord, CharacterId, Command, Event, PendingChoice, StatKind};

use self::characters::CharacterRoster;
use self::map::FogGrid;
use self::sites::SiteRegistry;

pub use self::map::MapModel;

/// Represents the authoritative state of a single session.
#[derive(Debug)]
pub struct World {
    map: MapModel,
    fog: FogGrid,
    characters: CharacterRoster,
    sites: SiteRegistry,
    turn: TurnState,
}

#[derive(Debug, Default)]
struct TurnState {
    current: Option<CharacterId>,
    round: u32,
    pending: Option<PendingChoice>,
    ended: bool,
}

impl World {
    /// Creates a world around a generated map with every cell hidden.
    #[must_use]
    pub fn new(map: MapModel) -> Self {
        let (columns, rows) = map.tiles().dimensions();
        Self {
            fog: FogGrid::hidden(columns, rows),
            map,
            characters: CharacterRoster::new(),
            sites: SiteRegistry::new(),
            turn: TurnState::default(),
        }
    }

    fn start_turn(&mut self, character: CharacterId, out_events: &mut Vec<Event>) {
        if let Some(state) = self.characters.get_mut(character) {
            state.can_take_turn = true;
            state.has_moved = false;
        }
        self.turn.current = Some(character);
        out_events.push(Event::TurnStarted {
            character,
            round: self.turn.round,
        });
    }

    fn end_session(&mut self, out_events: &mut Vec<Event>) {
        self.turn.current = None;
        self.turn.pending = None;
        if !self.turn.ended {
            self.turn.ended = true;
            out_events.push(Event::SessionEnded);
        }
    }

    fn clear_pending_for(&mut self, character: CharacterId, out_events: &mut Vec<Event>) {
        if self
            .turn
            .pending
            .as_ref()
            .is_some_and(|pending| pending.character == character)
        {
            self.turn.pending = None;
            out_events.push(Event::ChoiceResolved { character });
        }
    }

    fn relocate(
        &mut self,
        character: CharacterId,
        to: Option<CellCoord>,
        out_events: &mut Vec<Event>,
    ) -> bool {
        let walkable = to.is_some_and(|cell| self.map.is_walkable(cell));
        let Some(state) = self.characters.get_mut(character) else {
            return false;
        };
        let Some(to) = to.filter(|_| walkable) else {
            out_events.push(Event::MoveRejected { character, to });
            return false;
        };

        let from = state.cell;
        if from != to {
            state.cell = to;
            out_events.push(Event::CharacterMoved {
                character,
                from,
                to,
            });
        }
        true
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Every command is applied completely before this function returns, so no
/// partially applied effect is ever observable.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::AddCharacter {
            user,
            name,
            cell,
            stats,
            inventory,
        } => {
            let character = world.characters.join(user, name, cell, stats, inventory);
            out_events.push(Event::CharacterJoined { character, cell });
        }
        Command::PlaceHouse {
            cell,
            encounter,
            conditions,
            triggers,
        } => {
            let house = world
                .sites
                .place_house(cell, encounter, conditions, triggers);
            out_events.push(Event::HousePlaced { house, cell });
        }
        Command::PlaceEncounter {
            cell,
            encounter,
            conditions,
            triggers,
        } => {
            let site = world
                .sites
                .place_encounter(cell, encounter, conditions, triggers);
            out_events.push(Event::EncounterPlaced { site, cell });
        }
        Command::BeginSession => {
            if world.turn.current.is_some() || world.turn.ended {
                return;
            }
            world.turn.round = 1;
            match world.characters.next_active_after(None) {
                Some((character, _)) => world.start_turn(character, out_events),
                None => world.end_session(out_events),
            }
        }
        Command::MoveCharacter { character, to } => {
            if world.relocate(character, Some(to), out_events) {
                if let Some(state) = world.characters.get_mut(character) {
                    state.has_moved = true;
                }
            }
        }
        Command::TranslateCharacter { character, delta } => {
            let Some(from) = world.characters.get(character).map(|state| state.cell) else {
                return;
            };
            let _ = world.relocate(character, from.offset(delta), out_events);
        }
        Command::AdjustStat {
            character,
            stat,
            delta,
        } => {
            let Some(state) = world.characters.get_mut(character) else {
                return;
            };
            let value = state.stats.adjust(stat, delta);
            out_events.push(Event::StatAdjusted {
                character,
                stat,
                value,
            });

            if stat == StatKind::Health && value <= 0 && state.active {
                state.active = false;
                state.can_take_turn = false;
                out_events.push(Event::CharacterIncapacitated { character });
                world.clear_pending_for(character, out_events);
            }
        }
        Command::GiveItem { character, item } => {
            if let Some(state) = world.characters.get_mut(character) {
                state.inventory.push(item.clone());
                out_events.push(Event::ItemGiven { character, item });
            }
        }
        Command::TakeItem { character, item } => {
            if let Some(state) = world.characters.get_mut(character) {
                if state.take_item(&item) {
                    out_events.push(Event::ItemTaken { character, item });
                }
            }
        }
        Command::RevealFog { reveals } => {
            let raised = reveals
                .into_iter()
                .filter(|reveal| world.fog.raise(reveal.cell, reveal.grade))
                .count();
            if raised > 0 {
                out_events.push(Event::FogRevealed { cells: raised });
            }
        }
        Command::RecordVisit { site, character } => {
            if world.sites.record_visit(site, character) {
                out_events.push(Event::SiteVisited { site, character });
            }
        }
        Command::RecordStance {
            house,
            character,
            stance,
        } => {
            let recorded = world
                .sites
                .house_mut(house)
                .is_some_and(|state| state.record_stance(character, stance));
            if recorded {
                out_events.push(Event::StanceRecorded {
                    house,
                    character,
                    stance,
                });
            }
        }
        Command::OfferChoice {
            character,
            encounter,
            site,
        } => {
            world.turn.pending = Some(PendingChoice {
                character,
                encounter: encounter.clone(),
                site,
            });
            out_events.push(Event::ChoiceOffered {
                character,
                encounter,
            });
        }
        Command::ResolveChoice { character } => {
            world.clear_pending_for(character, out_events);
        }
        Command::EndTurn => {
            let current = world.turn.current;
            if let Some(previous) = current {
                if let Some(state) = world.characters.get_mut(previous) {
                    state.can_take_turn = false;
                    state.has_moved = false;
                }
                world.clear_pending_for(previous, out_events);
            }

            match world.characters.next_active_after(current) {
                Some((character, wrapped)) => {
                    if wrapped {
                        world.turn.round = world.turn.round.saturating_add(1);
                    }
                    world.start_turn(character, out_events);
                }
                None => world.end_session(out_events),
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use candy_quest_core::{
        CellCoord, CharacterId, CharacterSnapshot, ConditionDescriptor, EncounterId,
        EncounterSiteSnapshot, FogGrade, Grid, HouseSnapshot, PendingChoice, PlayMode, Region,
        RuleContext, SessionSnapshot, SiteRef, TileKind, TriggerDescriptor, TurnSnapshot, UserId,
    };

    use super::{MapModel, World};

    /// Read-only view of a placed house or encounter site.
    #[derive(Clone, Copy, Debug)]
    pub struct SiteView<'a> {
        /// Reference to the site.
        pub site: SiteRef,
        /// Cell the site occupies.
        pub cell: CellCoord,
        /// Encounter the site offers.
        pub encounter: &'a EncounterId,
        /// Gates that must pass before the encounter starts.
        pub conditions: &'a [ConditionDescriptor],
        /// Effects applied when the encounter starts.
        pub triggers: &'a [TriggerDescriptor],
    }

    /// Provides read-only access to the session map.
    #[must_use]
    pub fn map(world: &World) -> &MapModel {
        &world.map
    }

    /// Provides read-only access to the base tile grid.
    #[must_use]
    pub fn tiles(world: &World) -> &Grid<TileKind> {
        world.map.tiles()
    }

    /// Regions carved into the map, in carve order.
    #[must_use]
    pub fn regions(world: &World) -> &[Region] {
        world.map.regions()
    }

    /// Provides read-only access to the shared fog grid.
    #[must_use]
    pub fn fog(world: &World) -> &Grid<FogGrade> {
        world.fog.grades()
    }

    /// Captures a snapshot of a single character.
    #[must_use]
    pub fn character(world: &World, id: CharacterId) -> Option<CharacterSnapshot> {
        world.characters.get(id).map(|character| character.snapshot())
    }

    /// Captures the character controlled by the provided participant.
    #[must_use]
    pub fn character_for_user(world: &World, user: &UserId) -> Option<CharacterSnapshot> {
        world
            .characters
            .for_user(user)
            .map(|character| character.snapshot())
    }

    /// Captures every character ordered by identifier.
    #[must_use]
    pub fn characters(world: &World) -> Vec<CharacterSnapshot> {
        world
            .characters
            .iter()
            .map(|character| character.snapshot())
            .collect()
    }

    /// Captures every house ordered by identifier.
    #[must_use]
    pub fn houses(world: &World) -> Vec<HouseSnapshot> {
        world.sites.houses().map(|house| house.snapshot()).collect()
    }

    /// Captures every encounter site ordered by identifier.
    #[must_use]
    pub fn encounter_sites(world: &World) -> Vec<EncounterSiteSnapshot> {
        world
            .sites
            .encounters()
            .map(|site| site.snapshot())
            .collect()
    }

    /// Reports whether a house or encounter site occupies the cell.
    #[must_use]
    pub fn is_occupied(world: &World, cell: CellCoord) -> bool {
        world.sites.is_occupied(cell)
    }

    /// Looks up the site placed on the provided cell.
    #[must_use]
    pub fn site_at(world: &World, cell: CellCoord) -> Option<SiteView<'_>> {
        world.sites.at(cell).and_then(|site| site_view(world, site))
    }

    /// Looks up a site by reference.
    #[must_use]
    pub fn site_view(world: &World, site: SiteRef) -> Option<SiteView<'_>> {
        match site {
            SiteRef::House(id) => world.sites.house(id).map(|house| SiteView {
                site,
                cell: house.cell,
                encounter: &house.encounter,
                conditions: &house.conditions,
                triggers: &house.triggers,
            }),
            SiteRef::Encounter(id) => world.sites.encounter(id).map(|state| SiteView {
                site,
                cell: state.cell,
                encounter: &state.encounter,
                conditions: &state.conditions,
                triggers: &state.triggers,
            }),
        }
    }

    /// Character holding the current turn.
    #[must_use]
    pub fn current_character(world: &World) -> Option<CharacterId> {
        world.turn.current
    }

    /// Current round number; zero before the session begins.
    #[must_use]
    pub fn round(world: &World) -> u32 {
        world.turn.round
    }

    /// Encounter awaiting a participant's choice.
    #[must_use]
    pub fn pending_choice(world: &World) -> Option<&PendingChoice> {
        world.turn.pending.as_ref()
    }

    /// Reports whether every character has become inactive.
    #[must_use]
    pub fn session_ended(world: &World) -> bool {
        world.turn.ended
    }

    /// Captures turn bookkeeping.
    #[must_use]
    pub fn turn(world: &World) -> TurnSnapshot {
        TurnSnapshot {
            current: world.turn.current,
            round: world.turn.round,
            pending: world.turn.pending.clone(),
        }
    }

    /// Builds the counters consulted by the rules system for a character.
    #[must_use]
    pub fn rule_context(world: &World, character: CharacterId) -> RuleContext<'_> {
        let mut houses_visited = 0_u32;
        let mut tricks = 0_u32;
        let mut treats = 0_u32;
        for house in world.sites.houses() {
            if house.visitors.contains(&character) {
                houses_visited += 1;
            }
            tricks += count(&house.trickers, character);
            treats += count(&house.treaters, character);
        }

        RuleContext {
            tiles: world.map.tiles(),
            round: world.turn.round,
            houses_visited,
            tricks,
            treats,
        }
    }

    /// Exports the full public state for broadcast.
    #[must_use]
    pub fn export(world: &World, batch: u64, mode: PlayMode) -> SessionSnapshot {
        SessionSnapshot {
            batch,
            mode,
            tiles: world.map.tiles().to_rows(),
            fog: world.fog.grades().to_rows(),
            characters: characters(world),
            houses: houses(world),
            encounters: encounter_sites(world),
            turn: turn(world),
        }
    }

    fn count(entries: &[CharacterId], character: CharacterId) -> u32 {
        let matching = entries.iter().filter(|entry| **entry == character).count();
        u32::try_from(matching).unwrap_or(u32::MAX)
    }
}
