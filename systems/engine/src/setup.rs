//! Session population: sites, characters and the opening fog reveal.

use std::collections::BTreeSet;

use candy_quest_core::{
    CellCoord, Command, ContentTables, EncounterDescriptor, TileKind, UserId, HOUSE_TAG,
    STARTER_TAG, WANDERING_TAG,
};
use candy_quest_system_fog::FogPropagator;
use candy_quest_world::{query, World};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use crate::{runtime::apply_with_fog, SessionConfig};

/// Offset mixed into the seed so placement does not replay the map's rolls.
const PLACEMENT_STREAM: u64 = 0x5173_0000_0000_0001;

/// Problems that prevent a session from starting.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SetupError {
    /// No participants were provided.
    #[error("a session needs at least one player")]
    NoPlayers,
    /// The same participant was listed twice.
    #[error("player `{0}` joined more than once")]
    DuplicatePlayer(UserId),
    /// The map has no walkable cell to spawn on.
    #[error("map has no walkable cell to spawn characters on")]
    NoSpawnCell,
}

pub(crate) fn validate_players(players: &[UserId]) -> Result<(), SetupError> {
    if players.is_empty() {
        return Err(SetupError::NoPlayers);
    }
    let mut seen = BTreeSet::new();
    for player in players {
        if !seen.insert(player) {
            return Err(SetupError::DuplicatePlayer(player.clone()));
        }
    }
    Ok(())
}

/// Places sites, spawns one character per player, reveals the opening fog and
/// hands the first turn out.
pub(crate) fn populate(
    world: &mut World,
    config: &SessionConfig,
    content: &ContentTables,
    players: &[UserId],
    fog: &FogPropagator,
) -> Result<(), SetupError> {
    validate_players(players)?;
    let spawn = spawn_cell(world).ok_or(SetupError::NoSpawnCell)?;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed ^ PLACEMENT_STREAM);

    place_sites(world, content, &mut rng, spawn, SiteKind::House, config.house_count);
    place_sites(
        world,
        content,
        &mut rng,
        spawn,
        SiteKind::Wandering,
        config.encounter_count,
    );

    let inventory: Vec<_> = content
        .items()
        .filter(|item| item.has_tag(STARTER_TAG))
        .map(|item| item.id.clone())
        .collect();
    let joins = players
        .iter()
        .map(|user| Command::AddCharacter {
            user: user.clone(),
            name: user.as_str().to_owned(),
            cell: spawn,
            stats: config.starting_stats,
            inventory: inventory.clone(),
        })
        .collect();
    let _ = apply_with_fog(world, fog, joins);
    let _ = apply_with_fog(world, fog, vec![Command::BeginSession]);

    tracing::info!(
        players = players.len(),
        houses = query::houses(world).len(),
        encounters = query::encounter_sites(world).len(),
        spawn = ?spawn,
        "session populated"
    );
    Ok(())
}

/// Centre of the first region, or the first walkable cell in row-major order.
fn spawn_cell(world: &World) -> Option<CellCoord> {
    let tiles = query::tiles(world);
    query::regions(world)
        .first()
        .map(|region| region.bounds.center())
        .filter(|cell| tiles.at(*cell).is_some_and(|tile| tile.is_walkable()))
        .or_else(|| {
            tiles
                .cells()
                .find(|(_, tile)| tile.is_walkable())
                .map(|(cell, _)| cell)
        })
}

#[derive(Clone, Copy, Debug)]
enum SiteKind {
    House,
    Wandering,
}

impl SiteKind {
    fn tag(self) -> &'static str {
        match self {
            Self::House => HOUSE_TAG,
            Self::Wandering => WANDERING_TAG,
        }
    }

    fn tile(self) -> TileKind {
        match self {
            Self::House => TileKind::Room,
            Self::Wandering => TileKind::Corridor,
        }
    }

    fn command(self, cell: CellCoord, encounter: &EncounterDescriptor) -> Command {
        let (encounter_id, conditions, triggers) = (
            encounter.id.clone(),
            encounter.conditions.clone(),
            encounter.triggers.clone(),
        );
        match self {
            Self::House => Command::PlaceHouse {
                cell,
                encounter: encounter_id,
                conditions,
                triggers,
            },
            Self::Wandering => Command::PlaceEncounter {
                cell,
                encounter: encounter_id,
                conditions,
                triggers,
            },
        }
    }
}

fn place_sites(
    world: &mut World,
    content: &ContentTables,
    rng: &mut ChaCha8Rng,
    spawn: CellCoord,
    kind: SiteKind,
    count: u32,
) {
    if count == 0 {
        return;
    }
    let encounters: Vec<&EncounterDescriptor> = content
        .encounters()
        .filter(|encounter| encounter.has_tag(kind.tag()))
        .collect();
    if encounters.is_empty() {
        tracing::warn!(tag = kind.tag(), "no encounters carry the tag; placing none");
        return;
    }

    let mut cells: Vec<CellCoord> = query::tiles(world)
        .cells()
        .filter(|(cell, tile)| **tile == kind.tile() && *cell != spawn)
        .map(|(cell, _)| cell)
        .collect();
    cells.shuffle(rng);

    let wanted = usize::try_from(count).unwrap_or(usize::MAX);
    let mut placed = Vec::new();
    for cell in cells {
        if placed.len() >= wanted {
            break;
        }
        if query::is_occupied(world, cell) {
            continue;
        }
        let Some(encounter) = encounters.choose(rng) else {
            break;
        };
        let mut events = Vec::new();
        candy_quest_world::apply(world, kind.command(cell, encounter), &mut events);
        placed.push(cell);
    }

    if placed.len() < wanted {
        tracing::warn!(
            tag = kind.tag(),
            requested = wanted,
            placed = placed.len(),
            "ran out of free cells for sites"
        );
    }
}
