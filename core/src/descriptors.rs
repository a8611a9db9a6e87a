//! Declarative condition and trigger records loaded from content tables.
//!
//! Descriptors are plain data. The rules system resolves them against a
//! character at evaluation time; nothing in this module executes them.

use serde::{Deserialize, Serialize};

use crate::{CellCoord, CellOffset, ItemId, TileKind};

/// Gate that must hold before an encounter, action or item becomes usable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "logic", rename_all = "snake_case")]
pub enum ConditionDescriptor {
    /// Passes when the character carries the referenced item.
    Item {
        /// Item that must be present in the inventory.
        item: ItemId,
    },
    /// Compares a named stat or counter against a constant.
    Numeric {
        /// Name of the stat or counter looked up at evaluation time.
        target: String,
        /// Comparison applied as `target <op> value`.
        comparison: Comparison,
        /// Right-hand side of the comparison.
        value: i32,
    },
    /// Passes when the character stands on the provided cell.
    Location {
        /// Cell the character must occupy.
        point: CellCoord,
    },
    /// Passes when the character stands on a tile of the provided kind.
    Tile {
        /// Tile kind the character must occupy.
        tile: TileKind,
    },
    /// Any logic kind this build does not understand.
    #[serde(other)]
    Unrecognized,
}

/// Numeric comparison operators understood by numeric conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Comparison {
    /// `lhs == rhs`
    Equals,
    /// `lhs < rhs`
    LessThan,
    /// `lhs > rhs`
    GreaterThan,
}

impl Comparison {
    /// Evaluates the comparison for the provided operands.
    #[must_use]
    pub const fn holds(self, lhs: i32, rhs: i32) -> bool {
        match self {
            Self::Equals => lhs == rhs,
            Self::LessThan => lhs < rhs,
            Self::GreaterThan => lhs > rhs,
        }
    }
}

/// Effect applied to a character when an encounter, action or item resolves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "logic", rename_all = "snake_case")]
pub enum TriggerDescriptor {
    /// Adds to or subtracts from a named stat.
    Stat {
        /// Direction of the adjustment.
        op: TriggerOp,
        /// Name of the stat looked up at evaluation time.
        target: String,
        /// Magnitude of the adjustment.
        value: i32,
    },
    /// Gives or takes an item.
    Item {
        /// Whether the item is given or taken.
        op: TriggerOp,
        /// Item moved into or out of the inventory.
        item: ItemId,
    },
    /// Translates the character's position by a delta.
    Position {
        /// Offset added to the current position.
        delta: CellOffset,
    },
    /// Any logic kind this build does not understand.
    #[serde(other)]
    Unrecognized,
}

/// Operation names accepted by triggers.
///
/// `Add`/`Give` and `Subtract`/`Take` are synonyms; content authors may use
/// whichever reads better for the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerOp {
    /// Increase a stat.
    Add,
    /// Give an item (or increase a stat).
    Give,
    /// Decrease a stat.
    Subtract,
    /// Take an item (or decrease a stat).
    Take,
}

impl TriggerOp {
    /// Sign applied to the trigger magnitude.
    #[must_use]
    pub const fn sign(self) -> i32 {
        match self {
            Self::Add | Self::Give => 1,
            Self::Subtract | Self::Take => -1,
        }
    }
}
