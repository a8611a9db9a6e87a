#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural map generation for Candy Quest sessions.
//!
//! Generation runs in three passes over an all-wall grid:
//!
//! 1. rectangular regions are carved at even-snapped locations so their
//!    interiors start on odd coordinates,
//! 2. growing-tree mazes fill the remaining odd lattice,
//! 3. a connector pass opens single wall cells between components until the
//!    walkable area is one component.
//!
//! The outer border is never carved. A given seed always produces the same map.

use std::collections::VecDeque;

use candy_quest_core::{
    CellCoord, CellRect, CellRectSize, Direction, Grid, Region, RegionId, TileKind,
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Tunables consumed by [`MapGenerator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapgenConfig {
    /// Grid width; even values are rounded down to the next odd value.
    pub columns: u32,
    /// Grid height; even values are rounded down to the next odd value.
    pub rows: u32,
    /// Number of regions requested.
    pub region_count: u32,
    /// Locations sampled per region before it is skipped.
    pub placement_attempts: u32,
    /// Smallest region side, rounded to odd.
    pub region_min: u32,
    /// Largest region side, rounded to odd.
    pub region_max: u32,
    /// Percent chance that a maze corridor turns instead of running straight.
    pub winding_percent: u32,
    /// Chance of opening a connector that joins already merged components.
    pub extra_connector_chance: f64,
    /// Whether intermediate grids are captured after each carve step.
    pub record_snapshots: bool,
}

impl Default for MapgenConfig {
    fn default() -> Self {
        Self {
            columns: 25,
            rows: 19,
            region_count: 6,
            placement_attempts: 60,
            region_min: 3,
            region_max: 7,
            winding_percent: 30,
            extra_connector_chance: 0.05,
            record_snapshots: false,
        }
    }
}

impl MapgenConfig {
    fn normalized(&self) -> Self {
        let region_min = odd_floor(self.region_min);
        Self {
            columns: odd_floor(self.columns),
            rows: odd_floor(self.rows),
            region_min,
            region_max: odd_floor(self.region_max).max(region_min),
            winding_percent: self.winding_percent.min(100),
            extra_connector_chance: if self.extra_connector_chance.is_finite() {
                self.extra_connector_chance.clamp(0.0, 1.0)
            } else {
                0.0
            },
            ..self.clone()
        }
    }
}

/// Result of a generation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedMap {
    /// Final tile grid.
    pub tiles: Grid<TileKind>,
    /// Regions that found a placement, in carve order.
    pub regions: Vec<Region>,
    /// Intermediate grids, empty unless snapshots were requested.
    pub snapshots: Vec<Grid<TileKind>>,
}

/// Seeded region and maze generator.
#[derive(Clone, Debug, Default)]
pub struct MapGenerator {
    config: MapgenConfig,
}

impl MapGenerator {
    /// Creates a generator using the provided configuration.
    #[must_use]
    pub fn new(config: MapgenConfig) -> Self {
        Self {
            config: config.normalized(),
        }
    }

    /// Configuration after size normalisation.
    #[must_use]
    pub fn config(&self) -> &MapgenConfig {
        &self.config
    }

    /// Generates a map from the provided seed.
    #[must_use]
    pub fn generate(&self, seed: u64) -> GeneratedMap {
        let mut carver = Carver::new(&self.config, ChaCha8Rng::seed_from_u64(seed));
        carver.place_regions();
        carver.carve_mazes();
        carver.connect_components();

        if !is_connected(&carver.tiles) {
            tracing::warn!(seed, "generated map has disconnected walkable areas");
        }
        tracing::debug!(
            seed,
            regions = carver.regions.len(),
            snapshots = carver.snapshots.len(),
            "map generated"
        );

        GeneratedMap {
            tiles: carver.tiles,
            regions: carver.regions,
            snapshots: carver.snapshots,
        }
    }
}

/// Reports whether every walkable tile belongs to a single 4-connected component.
///
/// Grids without walkable tiles count as connected.
#[must_use]
pub fn is_connected(tiles: &Grid<TileKind>) -> bool {
    let walkable: Vec<CellCoord> = tiles
        .cells()
        .filter(|(_, tile)| tile.is_walkable())
        .map(|(cell, _)| cell)
        .collect();
    let Some(&start) = walkable.first() else {
        return true;
    };

    let mut seen = tiles.map(|_| false);
    let _ = seen.set(start, true);
    let mut queue = VecDeque::from([start]);
    let mut reached = 1_usize;

    while let Some(cell) = queue.pop_front() {
        for neighbor in tiles.neighbors(cell) {
            let open = tiles.at(neighbor).is_some_and(|tile| tile.is_walkable());
            if open && seen.at(neighbor) == Some(&false) {
                let _ = seen.set(neighbor, true);
                reached += 1;
                queue.push_back(neighbor);
            }
        }
    }

    reached == walkable.len()
}

struct Carver<'a> {
    config: &'a MapgenConfig,
    rng: ChaCha8Rng,
    tiles: Grid<TileKind>,
    components: Grid<Option<u32>>,
    next_component: u32,
    regions: Vec<Region>,
    snapshots: Vec<Grid<TileKind>>,
}

impl<'a> Carver<'a> {
    fn new(config: &'a MapgenConfig, rng: ChaCha8Rng) -> Self {
        Self {
            config,
            rng,
            tiles: Grid::filled(config.columns, config.rows, TileKind::Wall),
            components: Grid::filled(config.columns, config.rows, None),
            next_component: 0,
            regions: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    fn record(&mut self) {
        if self.config.record_snapshots {
            self.snapshots.push(self.tiles.clone());
        }
    }

    fn carve(&mut self, cell: CellCoord, tile: TileKind, component: u32) {
        if self.is_interior(cell) {
            let _ = self.tiles.set(cell, tile);
            let _ = self.components.set(cell, Some(component));
        }
    }

    fn is_interior(&self, cell: CellCoord) -> bool {
        cell.column() >= 1
            && cell.row() >= 1
            && cell.column() + 1 < self.tiles.columns()
            && cell.row() + 1 < self.tiles.rows()
    }

    fn is_wall(&self, cell: CellCoord) -> bool {
        self.tiles.at(cell) == Some(&TileKind::Wall)
    }

    fn allocate_component(&mut self) -> u32 {
        let component = self.next_component;
        self.next_component += 1;
        component
    }

    fn odd_side(&mut self) -> u32 {
        let low = self.config.region_min / 2;
        let high = self.config.region_max / 2;
        self.rng.gen_range(low..=high) * 2 + 1
    }

    fn place_regions(&mut self) {
        for index in 0..self.config.region_count {
            let width = self.odd_side();
            let height = self.odd_side();

            match self.find_placement(width, height) {
                Some(origin) => {
                    let id = RegionId::new(u32::try_from(self.regions.len()).unwrap_or(u32::MAX));
                    let bounds =
                        CellRect::from_origin_and_size(origin, CellRectSize::new(width, height));
                    let component = self.allocate_component();
                    for cell in bounds.cells() {
                        self.carve(cell, TileKind::Room, component);
                    }
                    self.regions.push(Region { id, bounds });
                    self.record();
                }
                None => {
                    tracing::warn!(
                        region = index,
                        width,
                        height,
                        "no placement found for region; skipping"
                    );
                }
            }
        }
    }

    /// Samples wall-only boxes for a region, returning the interior origin.
    fn find_placement(&mut self, width: u32, height: u32) -> Option<CellCoord> {
        let box_width = width + 2;
        let box_height = height + 2;
        if box_width > self.tiles.columns() || box_height > self.tiles.rows() {
            return None;
        }

        for _ in 0..self.config.placement_attempts {
            let column = self.rng.gen_range(0..=self.tiles.columns() - box_width) & !1;
            let row = self.rng.gen_range(0..=self.tiles.rows() - box_height) & !1;
            let margin = CellRect::from_origin_and_size(
                CellCoord::new(column, row),
                CellRectSize::new(box_width, box_height),
            );
            if margin.cells().all(|cell| self.is_wall(cell)) {
                return Some(CellCoord::new(column + 1, row + 1));
            }
        }

        None
    }

    fn carve_mazes(&mut self) {
        let columns = self.tiles.columns();
        let rows = self.tiles.rows();
        for row in (1..rows.saturating_sub(1)).step_by(2) {
            for column in (1..columns.saturating_sub(1)).step_by(2) {
                let cell = CellCoord::new(column, row);
                let isolated = self.is_wall(cell)
                    && self
                        .tiles
                        .neighbors(cell)
                        .all(|neighbor| self.is_wall(neighbor));
                if isolated {
                    self.grow_maze(cell);
                    self.record();
                }
            }
        }
    }

    fn maze_step(&self, cell: CellCoord, direction: Direction) -> Option<(CellCoord, CellCoord)> {
        let between = cell.step(direction)?;
        let target = between.step(direction)?;
        (self.is_interior(target) && self.is_wall(target) && self.is_wall(between))
            .then_some((between, target))
    }

    fn grow_maze(&mut self, start: CellCoord) {
        let component = self.allocate_component();
        self.carve(start, TileKind::Corridor, component);

        let mut frontier = vec![start];
        let mut previous: Option<Direction> = None;

        while let Some(&cell) = frontier.last() {
            let open: Vec<Direction> = Direction::ALL
                .into_iter()
                .filter(|direction| self.maze_step(cell, *direction).is_some())
                .collect();

            let keep_straight = previous.filter(|direction| {
                open.contains(direction)
                    && self.rng.gen_range(0..100) >= self.config.winding_percent
            });
            let Some(direction) = keep_straight.or_else(|| open.choose(&mut self.rng).copied())
            else {
                let _ = frontier.pop();
                previous = None;
                continue;
            };

            if let Some((between, target)) = self.maze_step(cell, direction) {
                self.carve(between, TileKind::Corridor, component);
                self.carve(target, TileKind::Corridor, component);
                frontier.push(target);
                previous = Some(direction);
            }
        }
    }

    fn connectors(&self) -> Vec<(CellCoord, Vec<u32>)> {
        self.tiles
            .cells()
            .filter(|(cell, tile)| **tile == TileKind::Wall && self.is_interior(*cell))
            .filter_map(|(cell, _)| {
                let mut touching: Vec<u32> = self
                    .tiles
                    .neighbors(cell)
                    .filter_map(|neighbor| self.components.at(neighbor).copied().flatten())
                    .collect();
                touching.sort_unstable();
                touching.dedup();
                (touching.len() >= 2).then_some((cell, touching))
            })
            .collect()
    }

    fn connect_components(&mut self) {
        let mut merged = UnionFind::new(self.next_component);
        let mut connectors = self.connectors();
        let extra_chance = self.config.extra_connector_chance;

        while !connectors.is_empty() {
            let index = self.rng.gen_range(0..connectors.len());
            let (opened, touching) = connectors.swap_remove(index);
            let joined = touching[0];
            self.carve(opened, TileKind::Doorway, joined);
            for component in &touching[1..] {
                merged.union(joined, *component);
            }

            let mut extras = Vec::new();
            connectors.retain(|(cell, touching)| {
                if merged.spans_several(touching) {
                    return true;
                }
                if cell.manhattan_distance(opened) >= 2 && self.rng.gen_bool(extra_chance) {
                    extras.push((*cell, touching[0]));
                }
                false
            });
            for (cell, component) in extras {
                self.carve(cell, TileKind::Doorway, component);
            }
        }

        self.record();
    }
}

/// Disjoint sets of component markers.
struct UnionFind {
    parents: Vec<u32>,
}

impl UnionFind {
    fn new(count: u32) -> Self {
        Self {
            parents: (0..count).collect(),
        }
    }

    fn find(&mut self, component: u32) -> u32 {
        let mut root = component;
        while let Some(&parent) = self.parents.get(slot(root)) {
            if parent == root {
                break;
            }
            root = parent;
        }

        let mut cursor = component;
        while let Some(parent) = self.parents.get_mut(slot(cursor)) {
            if *parent == root {
                break;
            }
            cursor = std::mem::replace(parent, root);
        }
        root
    }

    fn union(&mut self, left: u32, right: u32) {
        let left = self.find(left);
        let right = self.find(right);
        if let Some(parent) = self.parents.get_mut(slot(right)) {
            *parent = left;
        }
    }

    fn spans_several(&mut self, components: &[u32]) -> bool {
        let mut roots: Vec<u32> = components.iter().map(|c| self.find(*c)).collect();
        roots.sort_unstable();
        roots.dedup();
        roots.len() > 1
    }
}

fn slot(component: u32) -> usize {
    usize::try_from(component).unwrap_or(usize::MAX)
}

fn odd_floor(value: u32) -> u32 {
    if value <= 1 {
        1
    } else if value % 2 == 0 {
        value - 1
    } else {
        value
    }
}
