#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shortest walkable paths, budget-bounded reachability and movement legality.
//!
//! Every search is a 4-directional A* with a Manhattan heuristic. Paths include
//! both the start and the goal cell, so the number of steps along a path is
//! one less than its length.

use std::{
    cmp::Reverse,
    collections::{BTreeMap, BTreeSet, BinaryHeap},
};

use candy_quest_core::{CellCoord, FogGrade, Grid, StatKind, Stats, TileKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunables that turn a character's stats into a movement budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementRules {
    /// Steps granted on top of the movement stat.
    pub bonus_steps: u32,
}

impl Default for MovementRules {
    fn default() -> Self {
        Self { bonus_steps: 1 }
    }
}

impl MovementRules {
    /// Number of steps a character with the provided stats may take in one move.
    #[must_use]
    pub fn budget(&self, stats: &Stats) -> u32 {
        let movement = u32::try_from(stats.get(StatKind::Movement).max(0)).unwrap_or(0);
        movement.saturating_add(self.bonus_steps)
    }
}

/// Reasons a requested move is refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize)]
pub enum MoveRejection {
    /// The target is the mover's current cell.
    #[error("target is the current position")]
    SamePosition,
    /// The target lies outside the map.
    #[error("target lies outside the map")]
    OutOfBounds,
    /// The target tile is a wall.
    #[error("target tile is not walkable")]
    NotWalkable,
    /// The target has not been revealed.
    #[error("target is hidden by fog")]
    Hidden,
    /// No revealed route reaches the target within the movement budget.
    #[error("target is out of reach")]
    OutOfReach,
}

/// Finds a shortest walkable path between two cells of a tile grid.
#[must_use]
pub fn find_path(grid: &Grid<TileKind>, start: CellCoord, goal: CellCoord) -> Option<Vec<CellCoord>> {
    find_path_by(grid, start, goal, |tile| tile.is_walkable())
}

/// Finds a shortest path using a caller-provided walkability predicate.
///
/// Returns `None` when the start is outside the grid, when the goal is outside
/// the grid or not walkable, or when no route exists. The start cell itself is
/// never tested for walkability.
pub fn find_path_by<T, F>(
    grid: &Grid<T>,
    start: CellCoord,
    goal: CellCoord,
    mut walkable: F,
) -> Option<Vec<CellCoord>>
where
    F: FnMut(&T) -> bool,
{
    if !grid.contains(start) || !grid.at(goal).is_some_and(&mut walkable) {
        return None;
    }

    let width = usize::try_from(grid.columns()).ok()?;
    let cell_count = width.checked_mul(usize::try_from(grid.rows()).ok()?)?;
    let mut best = vec![u32::MAX; cell_count];
    let mut came_from: Vec<Option<CellCoord>> = vec![None; cell_count];
    let mut open = BinaryHeap::new();

    best[slot(width, start)?] = 0;
    open.push(Reverse((start.manhattan_distance(goal), 0_u32, start)));

    while let Some(Reverse((_, cost, cell))) = open.pop() {
        if cell == goal {
            return reconstruct(&came_from, width, start, goal);
        }

        let current = slot(width, cell)?;
        if cost != best[current] {
            continue;
        }

        for neighbor in grid.neighbors(cell) {
            if !grid.at(neighbor).is_some_and(&mut walkable) {
                continue;
            }
            let Some(next) = slot(width, neighbor) else {
                continue;
            };
            let next_cost = cost.saturating_add(1);
            if next_cost < best[next] {
                best[next] = next_cost;
                came_from[next] = Some(cell);
                open.push(Reverse((
                    next_cost.saturating_add(neighbor.manhattan_distance(goal)),
                    next_cost,
                    neighbor,
                )));
            }
        }
    }

    None
}

/// Reports whether a walkable route joins the cells in at most `budget` steps.
#[must_use]
pub fn is_within_path_distance(
    grid: &Grid<TileKind>,
    start: CellCoord,
    goal: CellCoord,
    budget: u32,
) -> bool {
    find_path(grid, start, goal).is_some_and(|path| within_budget(&path, budget))
}

/// Collects every cell reachable from `start` in at most `budget` steps.
#[must_use]
pub fn points_within_path_distance(
    grid: &Grid<TileKind>,
    start: CellCoord,
    budget: u32,
) -> BTreeSet<CellCoord> {
    path_distances_within(grid, start, budget)
        .into_keys()
        .collect()
}

/// Maps every cell reachable from `start` in at most `budget` steps to its
/// step distance.
///
/// Candidates are pruned by Manhattan distance before each survivor is
/// confirmed with an exact path search.
#[must_use]
pub fn path_distances_within(
    grid: &Grid<TileKind>,
    start: CellCoord,
    budget: u32,
) -> BTreeMap<CellCoord, u32> {
    let mut distances = BTreeMap::new();
    if !grid.contains(start) {
        return distances;
    }

    let last_column = grid.columns().saturating_sub(1);
    let last_row = grid.rows().saturating_sub(1);
    let columns = start.column().saturating_sub(budget)
        ..=start.column().saturating_add(budget).min(last_column);
    let rows =
        start.row().saturating_sub(budget)..=start.row().saturating_add(budget).min(last_row);

    for row in rows {
        for column in columns.clone() {
            let candidate = CellCoord::new(column, row);
            if start.manhattan_distance(candidate) > budget {
                continue;
            }
            let Some(path) = find_path(grid, start, candidate) else {
                continue;
            };
            if let Some(steps) = steps(&path).filter(|steps| *steps <= budget) {
                let _ = distances.insert(candidate, steps);
            }
        }
    }

    distances
}

/// Validates a move against the map and the shared fog grid.
///
/// The route is searched only inside the window spanning `budget` cells around
/// the mover, clamped to the map, with hidden cells treated as walls.
pub fn check_move(
    tiles: &Grid<TileKind>,
    fog: &Grid<FogGrade>,
    from: CellCoord,
    to: CellCoord,
    budget: u32,
) -> Result<(), MoveRejection> {
    if from == to {
        return Err(MoveRejection::SamePosition);
    }
    let tile = tiles.at(to).ok_or(MoveRejection::OutOfBounds)?;
    if !tile.is_walkable() {
        return Err(MoveRejection::NotWalkable);
    }
    if fog.at(to).map_or(true, |grade| *grade == FogGrade::Hidden) {
        return Err(MoveRejection::Hidden);
    }

    let (origin, visible) =
        visible_window(tiles, fog, from, budget).ok_or(MoveRejection::OutOfBounds)?;
    let local = |cell: CellCoord| {
        CellCoord::new(
            cell.column().wrapping_sub(origin.column()),
            cell.row().wrapping_sub(origin.row()),
        )
    };

    find_path_by(&visible, local(from), local(to), |open| *open)
        .filter(|path| within_budget(path, budget))
        .map(|_| ())
        .ok_or(MoveRejection::OutOfReach)
}

/// Copies the revealed walkable cells around `center` into a boolean grid.
fn visible_window(
    tiles: &Grid<TileKind>,
    fog: &Grid<FogGrade>,
    center: CellCoord,
    budget: u32,
) -> Option<(CellCoord, Grid<bool>)> {
    let top_left = CellCoord::new(
        center.column().saturating_sub(budget),
        center.row().saturating_sub(budget),
    );
    let bottom_right = CellCoord::new(
        center
            .column()
            .saturating_add(budget)
            .min(tiles.columns().saturating_sub(1)),
        center
            .row()
            .saturating_add(budget)
            .min(tiles.rows().saturating_sub(1)),
    );

    let mut visible = tiles
        .submatrix(top_left, bottom_right)
        .ok()?
        .map(|tile| tile.is_walkable());
    let grades = fog.submatrix(top_left, bottom_right).ok()?;
    for (cell, grade) in grades.cells() {
        if *grade == FogGrade::Hidden {
            let _ = visible.set(cell, false);
        }
    }

    Some((top_left, visible))
}

fn within_budget(path: &[CellCoord], budget: u32) -> bool {
    steps(path).is_some_and(|steps| steps <= budget)
}

fn steps(path: &[CellCoord]) -> Option<u32> {
    path.len()
        .checked_sub(1)
        .and_then(|steps| u32::try_from(steps).ok())
}

fn slot(width: usize, cell: CellCoord) -> Option<usize> {
    let row = usize::try_from(cell.row()).ok()?;
    let column = usize::try_from(cell.column()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

fn reconstruct(
    came_from: &[Option<CellCoord>],
    width: usize,
    start: CellCoord,
    goal: CellCoord,
) -> Option<Vec<CellCoord>> {
    let mut path = vec![goal];
    let mut cursor = goal;
    while cursor != start {
        cursor = came_from.get(slot(width, cursor)?).copied().flatten()?;
        path.push(cursor);
    }
    path.reverse();
    Some(path)
}
