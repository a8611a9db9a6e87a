//! Rectangular matrix storage and the coordinate types used to address it.
//!
//! Every component reaches tile, fog and carve data through [`Grid`]. Reads
//! beyond the grid extent return `None` instead of failing so bounds problems
//! stay local to the caller that produced the coordinate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Location of a single grid cell expressed as column and row coordinates.
///
/// `(0, 0)` addresses the top-left cell of a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Translates the coordinate by a signed offset.
    ///
    /// Returns `None` when the result would leave the non-negative quadrant.
    #[must_use]
    pub fn offset(self, delta: CellOffset) -> Option<CellCoord> {
        let column = self.column.checked_add_signed(delta.columns)?;
        let row = self.row.checked_add_signed(delta.rows)?;
        Some(CellCoord::new(column, row))
    }

    /// Neighbouring coordinate one step away in the provided direction.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        self.offset(direction.offset())
    }
}

/// Signed displacement between two cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellOffset {
    /// Change applied to the column index.
    pub columns: i32,
    /// Change applied to the row index.
    pub rows: i32,
}

impl CellOffset {
    /// Creates a new offset from explicit column and row deltas.
    #[must_use]
    pub const fn new(columns: i32, rows: i32) -> Self {
        Self { columns, rows }
    }

    /// Multiplies both components by the provided factor.
    #[must_use]
    pub const fn scaled(self, factor: i32) -> Self {
        Self {
            columns: self.columns * factor,
            rows: self.rows * factor,
        }
    }
}

/// Cardinal movement directions. Diagonal movement is never permitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All directions in clockwise order starting from north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Unit offset that moves one cell in this direction.
    #[must_use]
    pub const fn offset(self) -> CellOffset {
        match self {
            Self::North => CellOffset::new(0, -1),
            Self::East => CellOffset::new(1, 0),
            Self::South => CellOffset::new(0, 1),
            Self::West => CellOffset::new(-1, 0),
        }
    }
}

/// Failures reported by fallible grid constructors and extractors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// A row did not match the length of the first row.
    #[error("row {row} has {found} cells but {expected} were expected")]
    Ragged {
        /// Index of the offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// The top-left corner lies below or right of the bottom-right corner.
    #[error("submatrix corners {top_left:?} and {bottom_right:?} are inverted")]
    InvertedBounds {
        /// Requested top-left corner.
        top_left: CellCoord,
        /// Requested bottom-right corner.
        bottom_right: CellCoord,
    },
    /// A requested corner lies outside the grid.
    #[error("cell {0:?} lies outside the grid")]
    OutOfBounds(CellCoord),
}

/// Dense rectangular matrix stored in row-major order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Grid<T> {
    columns: u32,
    rows: u32,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Builds a grid from nested rows, rejecting ragged input.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, GridError> {
        let expected = rows.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(expected * rows.len());
        let row_count = rows.len();

        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != expected {
                return Err(GridError::Ragged {
                    row,
                    expected,
                    found: values.len(),
                });
            }
            cells.extend(values);
        }

        Ok(Self {
            columns: u32::try_from(expected).unwrap_or(u32::MAX),
            rows: u32::try_from(row_count).unwrap_or(u32::MAX),
            cells,
        })
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Provides the `(columns, rows)` extent of the grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Reports whether the coordinate addresses a cell inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Value stored at the provided cell, or `None` when out of bounds.
    #[must_use]
    pub fn at(&self, cell: CellCoord) -> Option<&T> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    /// Overwrites the value at the provided cell.
    ///
    /// Returns `false` and leaves the grid untouched when the cell is out of
    /// bounds.
    pub fn set(&mut self, cell: CellCoord, value: T) -> bool {
        match self.index(cell).and_then(|index| self.cells.get_mut(index)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Invokes `visit` for every cell in row-major order.
    pub fn for_each_cell<F>(&self, mut visit: F)
    where
        F: FnMut(CellCoord, &T),
    {
        for (cell, value) in self.cells() {
            visit(cell, value);
        }
    }

    /// Iterator over every cell and its value in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, &T)> + '_ {
        let columns = self.columns.max(1);
        self.cells.iter().enumerate().map(move |(index, value)| {
            let index = u32::try_from(index).unwrap_or(u32::MAX);
            (CellCoord::new(index % columns, index / columns), value)
        })
    }

    /// In-bounds 4-directional neighbours of the provided cell.
    pub fn neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| cell.step(direction))
            .filter(move |neighbor| self.contains(*neighbor))
    }

    /// Produces a new grid by transforming every value.
    #[must_use]
    pub fn map<U, F>(&self, transform: F) -> Grid<U>
    where
        F: FnMut(&T) -> U,
    {
        Grid {
            columns: self.columns,
            rows: self.rows,
            cells: self.cells.iter().map(transform).collect(),
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }

        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

impl<T: Clone> Grid<T> {
    /// Creates a grid with every cell set to `value`.
    #[must_use]
    pub fn filled(columns: u32, rows: u32, value: T) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![value; capacity],
        }
    }

    /// Copies the inclusive rectangle spanned by the two corners.
    pub fn submatrix(
        &self,
        top_left: CellCoord,
        bottom_right: CellCoord,
    ) -> Result<Grid<T>, GridError> {
        if top_left.column() > bottom_right.column() || top_left.row() > bottom_right.row() {
            return Err(GridError::InvertedBounds {
                top_left,
                bottom_right,
            });
        }
        for corner in [top_left, bottom_right] {
            if !self.contains(corner) {
                return Err(GridError::OutOfBounds(corner));
            }
        }

        let columns = bottom_right.column() - top_left.column() + 1;
        let rows = bottom_right.row() - top_left.row() + 1;
        let mut cells = Vec::with_capacity(usize::try_from(columns * rows).unwrap_or(0));
        for row in top_left.row()..=bottom_right.row() {
            for column in top_left.column()..=bottom_right.column() {
                if let Some(value) = self.at(CellCoord::new(column, row)) {
                    cells.push(value.clone());
                }
            }
        }

        Ok(Grid {
            columns,
            rows,
            cells,
        })
    }

    /// Nested row representation used by snapshot exports.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        let width = usize::try_from(self.columns).unwrap_or(0).max(1);
        self.cells.chunks(width).map(<[T]>::to_vec).collect()
    }
}
