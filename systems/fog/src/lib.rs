#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fog-of-war propagation for Candy Quest characters.
//!
//! The propagator never writes the shared grid. It answers character arrivals
//! with a single [`Command::RevealFog`] that the world merges with a per-cell
//! maximum.

use std::collections::BTreeMap;

use candy_quest_core::{
    CellCoord, CharacterSnapshot, Command, Event, FogGrade, FogReveal, Grid, StatKind, TileKind,
};
use candy_quest_system_pathing::path_distances_within;
use serde::{Deserialize, Serialize};

/// Smallest exploration radius granted to any character.
pub const BASE_RADIUS: u32 = 3;

/// Selects how far a character's exploration reaches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiusPolicy {
    /// Radius grows with the vision stat, never below [`BASE_RADIUS`].
    #[default]
    Vision,
    /// Radius ignores stats.
    Fixed(u32),
}

impl RadiusPolicy {
    /// Exploration radius for a character with the provided vision.
    #[must_use]
    pub fn radius(self, vision: i32) -> u32 {
        match self {
            Self::Vision => u32::try_from(vision).unwrap_or(0).max(BASE_RADIUS),
            Self::Fixed(radius) => radius,
        }
    }
}

/// Grade revealed at the provided path distance from a character.
///
/// The table stops at distance 3. A wider [`RadiusPolicy::Vision`] radius
/// reaches further cells, which all share [`FogGrade::Dimmest`];
/// [`RadiusPolicy::Fixed`] with radius 3 leaves them untouched.
#[must_use]
pub const fn grade_for_distance(distance: u32) -> FogGrade {
    match distance {
        0 => FogGrade::Visible,
        1 => FogGrade::Dim,
        2 => FogGrade::Dimmer,
        _ => FogGrade::Dimmest,
    }
}

/// Fog system that reveals cells around characters after they arrive.
#[derive(Clone, Copy, Debug, Default)]
pub struct FogPropagator {
    radius_policy: RadiusPolicy,
}

impl FogPropagator {
    /// Creates a propagator using the provided radius policy.
    #[must_use]
    pub const fn new(radius_policy: RadiusPolicy) -> Self {
        Self { radius_policy }
    }

    /// Radius policy applied by the propagator.
    #[must_use]
    pub const fn radius_policy(&self) -> RadiusPolicy {
        self.radius_policy
    }

    /// Consumes world events and emits one fog command covering every
    /// character that joined or changed position.
    pub fn handle(
        &self,
        events: &[Event],
        tiles: &Grid<TileKind>,
        fog: &Grid<FogGrade>,
        characters: &[CharacterSnapshot],
        out: &mut Vec<Command>,
    ) {
        let mut merged: BTreeMap<CellCoord, FogGrade> = BTreeMap::new();

        for event in events {
            let (character, cell) = match event {
                Event::CharacterJoined { character, cell } => (*character, *cell),
                Event::CharacterMoved { character, to, .. } => (*character, *to),
                _ => continue,
            };
            let Some(snapshot) = characters.iter().find(|snapshot| snapshot.id == character)
            else {
                continue;
            };

            let vision = snapshot.stats.get(StatKind::Vision);
            for reveal in self.reveal_around(tiles, fog, cell, vision) {
                let entry = merged.entry(reveal.cell).or_insert(reveal.grade);
                *entry = (*entry).max(reveal.grade);
            }
        }

        if merged.is_empty() {
            return;
        }

        tracing::debug!(cells = merged.len(), "revealing fog");
        out.push(Command::RevealFog {
            reveals: merged
                .into_iter()
                .map(|(cell, grade)| FogReveal { cell, grade })
                .collect(),
        });
    }

    /// Computes the raises produced by a character with `vision` standing on
    /// `cell`.
    ///
    /// Candidates are confirmed by path reachability over the full tile grid,
    /// so walls block sight. Cells whose current grade already matches or
    /// exceeds the computed grade are omitted.
    #[must_use]
    pub fn reveal_around(
        &self,
        tiles: &Grid<TileKind>,
        fog: &Grid<FogGrade>,
        cell: CellCoord,
        vision: i32,
    ) -> Vec<FogReveal> {
        let radius = self.radius_policy.radius(vision);
        path_distances_within(tiles, cell, radius)
            .into_iter()
            .filter_map(|(candidate, distance)| {
                let grade = grade_for_distance(distance);
                let current = fog.at(candidate)?;
                (grade > *current).then_some(FogReveal {
                    cell: candidate,
                    grade,
                })
            })
            .collect()
    }
}
