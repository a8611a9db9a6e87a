//! Session map and the shared visibility grid layered over it.

use candy_quest_core::{CellCoord, FogGrade, Grid, Region, TileKind};

/// Generated map owned by a session.
///
/// The tile grid is fixed once the session starts; nothing in the world
/// mutates it afterwards.
#[derive(Clone, Debug)]
pub struct MapModel {
    tiles: Grid<TileKind>,
    regions: Vec<Region>,
    generation_steps: Vec<Grid<TileKind>>,
}

impl MapModel {
    /// Wraps a generated tile grid and the regions carved into it.
    #[must_use]
    pub fn new(tiles: Grid<TileKind>, regions: Vec<Region>) -> Self {
        Self {
            tiles,
            regions,
            generation_steps: Vec::new(),
        }
    }

    /// Retains the generator's intermediate grids for stepwise playback.
    #[must_use]
    pub fn with_generation_steps(mut self, steps: Vec<Grid<TileKind>>) -> Self {
        self.generation_steps = steps;
        self
    }

    /// Base tile grid.
    #[must_use]
    pub fn tiles(&self) -> &Grid<TileKind> {
        &self.tiles
    }

    /// Regions in carve order.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Intermediate generator grids in the order they were captured.
    #[must_use]
    pub fn generation_steps(&self) -> &[Grid<TileKind>] {
        &self.generation_steps
    }

    /// Reports whether the cell exists and can be walked on.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.tiles.at(cell).is_some_and(|tile| tile.is_walkable())
    }
}

/// Per-cell visibility grades whose values only ever increase.
#[derive(Clone, Debug)]
pub(crate) struct FogGrid {
    grades: Grid<FogGrade>,
}

impl FogGrid {
    pub(crate) fn hidden(columns: u32, rows: u32) -> Self {
        Self {
            grades: Grid::filled(columns, rows, FogGrade::Hidden),
        }
    }

    /// Raises the cell to `grade` when it strictly exceeds the recorded grade.
    pub(crate) fn raise(&mut self, cell: CellCoord, grade: FogGrade) -> bool {
        match self.grades.at(cell) {
            Some(current) if grade > *current => self.grades.set(cell, grade),
            _ => false,
        }
    }

    pub(crate) fn grades(&self) -> &Grid<FogGrade> {
        &self.grades
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raise_never_lowers_a_grade() {
        let mut fog = FogGrid::hidden(2, 2);
        let cell = CellCoord::new(1, 0);

        assert!(fog.raise(cell, FogGrade::Dim));
        assert!(!fog.raise(cell, FogGrade::Dimmest));
        assert!(!fog.raise(cell, FogGrade::Dim));
        assert_eq!(fog.grades().at(cell), Some(&FogGrade::Dim));

        assert!(fog.raise(cell, FogGrade::Visible));
        assert_eq!(fog.grades().at(cell), Some(&FogGrade::Visible));
    }

    #[test]
    fn raise_outside_grid_is_ignored() {
        let mut fog = FogGrid::hidden(2, 2);
        assert!(!fog.raise(CellCoord::new(5, 5), FogGrade::Visible));
    }
}
