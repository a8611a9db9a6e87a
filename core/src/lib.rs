#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Candy Quest engine.
//!
//! This crate defines the message surface that connects the session engine,
//! the authoritative world, and pure systems. The engine submits [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then reports [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new commands.

mod content;
mod descriptors;
mod grid;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use content::{
    ActionDescriptor, ContentError, ContentTables, EncounterDescriptor, ItemDescriptor, Stance,
    HOUSE_TAG, STARTER_TAG, WANDERING_TAG,
};
pub use descriptors::{Comparison, ConditionDescriptor, TriggerDescriptor, TriggerOp};
pub use grid::{CellCoord, CellOffset, Direction, Grid, GridError};

/// Describes whether the session currently accepts participant input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    /// No action is queued or running; participants may act.
    #[default]
    Playable,
    /// An action is being resolved; new input is rejected.
    Working,
}

/// Unique identifier assigned to a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharacterId(u32);

impl CharacterId {
    /// Creates a new character identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a house placed on the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HouseId(u32);

impl HouseId {
    /// Creates a new house identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an encounter site placed on the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SiteId(u32);

impl SiteId {
    /// Creates a new site identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Marker distinguishing the regions carved by the map generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(u32);

impl RegionId {
    /// Creates a new region marker with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the marker.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a connected participant, issued by the transport.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps the provided identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an encounter descriptor in the content tables.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncounterId(String);

impl EncounterId {
    /// Wraps the provided identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EncounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an item descriptor in the content tables.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Wraps the provided identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an action offered by an encounter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    /// Wraps the provided identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a placed house or encounter site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SiteRef {
    /// A house placed inside a region.
    House(HouseId),
    /// An encounter placed along a corridor.
    Encounter(SiteId),
}

/// Kinds of tiles composing the generated map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    /// Solid, impassable tile.
    #[default]
    Wall,
    /// Floor carved as part of a region.
    Room,
    /// Floor carved by the maze pass.
    Corridor,
    /// Wall opened by the connector pass.
    Doorway,
}

impl TileKind {
    /// Reports whether characters may stand on and path through the tile.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Self::Wall)
    }
}

/// Ordered visibility grade recorded per cell.
///
/// Grades only ever increase over the lifetime of a session.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FogGrade {
    /// Never seen.
    #[default]
    Hidden,
    /// Seen from the edge of sight.
    Dimmest,
    /// Seen from two steps away.
    Dimmer,
    /// Seen from an adjacent cell.
    Dim,
    /// Stood upon.
    Visible,
}

/// Visibility raise proposed by the fog propagator for a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FogReveal {
    /// Cell whose grade should be raised.
    pub cell: CellCoord,
    /// Proposed grade; ignored unless it exceeds the recorded grade.
    pub grade: FogGrade,
}

/// Named character statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    /// Hit points; the character becomes inactive at zero.
    Health,
    /// Steps available per turn.
    Movement,
    /// Composure drained by frightening encounters.
    Sanity,
    /// Exploration radius used by the fog propagator.
    Vision,
    /// Collected score.
    Candies,
    /// Fortune modifier consulted by content.
    Luck,
    /// Appetite modifier consulted by content.
    Greed,
}

impl StatKind {
    /// Every stat in declaration order.
    pub const ALL: [StatKind; 7] = [
        StatKind::Health,
        StatKind::Movement,
        StatKind::Sanity,
        StatKind::Vision,
        StatKind::Candies,
        StatKind::Luck,
        StatKind::Greed,
    ];

    /// Name used by content tables to reference the stat.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Movement => "movement",
            Self::Sanity => "sanity",
            Self::Vision => "vision",
            Self::Candies => "candies",
            Self::Luck => "luck",
            Self::Greed => "greed",
        }
    }

    /// Resolves a content-table name into a stat.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stat| stat.name() == name)
    }
}

/// Stat block carried by every character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    /// Hit points.
    pub health: i32,
    /// Steps available per turn.
    pub movement: i32,
    /// Composure.
    pub sanity: i32,
    /// Exploration radius.
    pub vision: i32,
    /// Collected score.
    pub candies: i32,
    /// Fortune modifier.
    pub luck: i32,
    /// Appetite modifier.
    pub greed: i32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            health: 5,
            movement: 3,
            sanity: 5,
            vision: 3,
            candies: 0,
            luck: 1,
            greed: 1,
        }
    }
}

impl Stats {
    /// Reads a single stat.
    #[must_use]
    pub const fn get(&self, stat: StatKind) -> i32 {
        match stat {
            StatKind::Health => self.health,
            StatKind::Movement => self.movement,
            StatKind::Sanity => self.sanity,
            StatKind::Vision => self.vision,
            StatKind::Candies => self.candies,
            StatKind::Luck => self.luck,
            StatKind::Greed => self.greed,
        }
    }

    /// Adds a signed delta to a stat, saturating at the integer limits.
    ///
    /// Returns the updated value.
    pub fn adjust(&mut self, stat: StatKind, delta: i32) -> i32 {
        let slot = match stat {
            StatKind::Health => &mut self.health,
            StatKind::Movement => &mut self.movement,
            StatKind::Sanity => &mut self.sanity,
            StatKind::Vision => &mut self.vision,
            StatKind::Candies => &mut self.candies,
            StatKind::Luck => &mut self.luck,
            StatKind::Greed => &mut self.greed,
        };
        *slot = slot.saturating_add(delta);
        *slot
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Upper-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Reports whether the rectangle covers the provided cell.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() >= self.origin.column()
            && cell.row() >= self.origin.row()
            && cell.column() - self.origin.column() < self.size.width()
            && cell.row() - self.origin.row() < self.size.height()
    }

    /// Cell closest to the middle of the rectangle.
    #[must_use]
    pub const fn center(&self) -> CellCoord {
        CellCoord::new(
            self.origin.column() + self.size.width() / 2,
            self.origin.row() + self.size.height() / 2,
        )
    }

    /// Covered cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let origin = self.origin;
        let width = self.size.width();
        (0..self.size.height()).flat_map(move |row| {
            (0..width).map(move |column| {
                CellCoord::new(origin.column() + column, origin.row() + row)
            })
        })
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Rectangular area carved by the map generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    /// Marker assigned when the region was carved.
    pub id: RegionId,
    /// Carved floor cells of the region.
    pub bounds: CellRect,
}

/// Encounter awaiting a participant's choice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChoice {
    /// Character who must choose.
    pub character: CharacterId,
    /// Encounter whose actions are on offer.
    pub encounter: EncounterId,
    /// Site that hosted the encounter, absent for chained encounters.
    pub site: Option<SiteRef>,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Adds a participant's character to the session.
    AddCharacter {
        /// Participant controlling the character.
        user: UserId,
        /// Display name of the character.
        name: String,
        /// Spawn cell.
        cell: CellCoord,
        /// Starting stats.
        stats: Stats,
        /// Starting inventory.
        inventory: Vec<ItemId>,
    },
    /// Places a house hosting the provided encounter.
    PlaceHouse {
        /// Cell the house occupies.
        cell: CellCoord,
        /// Encounter offered by the house.
        encounter: EncounterId,
        /// Gates copied from the encounter descriptor.
        conditions: Vec<ConditionDescriptor>,
        /// Effects copied from the encounter descriptor.
        triggers: Vec<TriggerDescriptor>,
    },
    /// Places an encounter site hosting the provided encounter.
    PlaceEncounter {
        /// Cell the site occupies.
        cell: CellCoord,
        /// Encounter offered by the site.
        encounter: EncounterId,
        /// Gates copied from the encounter descriptor.
        conditions: Vec<ConditionDescriptor>,
        /// Effects copied from the encounter descriptor.
        triggers: Vec<TriggerDescriptor>,
    },
    /// Hands the first turn to the first active character.
    BeginSession,
    /// Moves a character to a previously validated cell.
    MoveCharacter {
        /// Character being moved.
        character: CharacterId,
        /// Destination cell.
        to: CellCoord,
    },
    /// Moves a character by a signed delta.
    TranslateCharacter {
        /// Character being moved.
        character: CharacterId,
        /// Offset added to the current position.
        delta: CellOffset,
    },
    /// Adds a signed delta to a character stat.
    AdjustStat {
        /// Character whose stat changes.
        character: CharacterId,
        /// Stat being adjusted.
        stat: StatKind,
        /// Signed change.
        delta: i32,
    },
    /// Appends an item to a character's inventory.
    GiveItem {
        /// Receiving character.
        character: CharacterId,
        /// Item handed over.
        item: ItemId,
    },
    /// Removes one copy of an item from a character's inventory.
    TakeItem {
        /// Character losing the item.
        character: CharacterId,
        /// Item removed.
        item: ItemId,
    },
    /// Raises fog grades on the shared visibility grid.
    RevealFog {
        /// Proposed raises; lower or equal grades are ignored.
        reveals: Vec<FogReveal>,
    },
    /// Records a character arriving at a site.
    RecordVisit {
        /// Visited site.
        site: SiteRef,
        /// Visiting character.
        character: CharacterId,
    },
    /// Records a trick or treat against a house.
    RecordStance {
        /// House the stance applies to.
        house: HouseId,
        /// Character taking the stance.
        character: CharacterId,
        /// Stance taken.
        stance: Stance,
    },
    /// Offers an encounter's actions to a character.
    OfferChoice {
        /// Character who must choose.
        character: CharacterId,
        /// Encounter on offer.
        encounter: EncounterId,
        /// Hosting site, if any.
        site: Option<SiteRef>,
    },
    /// Clears the pending choice of a character.
    ResolveChoice {
        /// Character whose choice resolved.
        character: CharacterId,
    },
    /// Passes the turn to the next active character.
    EndTurn,
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A character joined the session.
    CharacterJoined {
        /// Identifier allocated to the character.
        character: CharacterId,
        /// Spawn cell.
        cell: CellCoord,
    },
    /// A house was placed.
    HousePlaced {
        /// Identifier allocated to the house.
        house: HouseId,
        /// Cell the house occupies.
        cell: CellCoord,
    },
    /// An encounter site was placed.
    EncounterPlaced {
        /// Identifier allocated to the site.
        site: SiteId,
        /// Cell the site occupies.
        cell: CellCoord,
    },
    /// A character's turn started.
    TurnStarted {
        /// Character now acting.
        character: CharacterId,
        /// Round the turn belongs to.
        round: u32,
    },
    /// A character changed position.
    CharacterMoved {
        /// Character that moved.
        character: CharacterId,
        /// Previous cell.
        from: CellCoord,
        /// New cell.
        to: CellCoord,
    },
    /// A movement command targeted an unwalkable or missing cell.
    MoveRejected {
        /// Character that stayed put.
        character: CharacterId,
        /// Requested destination, if it could be computed.
        to: Option<CellCoord>,
    },
    /// A character stat changed.
    StatAdjusted {
        /// Character whose stat changed.
        character: CharacterId,
        /// Adjusted stat.
        stat: StatKind,
        /// Value after the adjustment.
        value: i32,
    },
    /// An item entered an inventory.
    ItemGiven {
        /// Receiving character.
        character: CharacterId,
        /// Item received.
        item: ItemId,
    },
    /// An item left an inventory.
    ItemTaken {
        /// Character that lost the item.
        character: CharacterId,
        /// Item removed.
        item: ItemId,
    },
    /// A character dropped to zero health and stopped taking turns.
    CharacterIncapacitated {
        /// Character marked inactive.
        character: CharacterId,
    },
    /// Fog grades were raised.
    FogRevealed {
        /// Number of cells whose grade increased.
        cells: usize,
    },
    /// A character arrived at a site.
    SiteVisited {
        /// Visited site.
        site: SiteRef,
        /// Visiting character.
        character: CharacterId,
    },
    /// A trick or treat was recorded against a house.
    StanceRecorded {
        /// House the stance applies to.
        house: HouseId,
        /// Character taking the stance.
        character: CharacterId,
        /// Stance taken.
        stance: Stance,
    },
    /// An encounter's actions were offered to a character.
    ChoiceOffered {
        /// Character who must choose.
        character: CharacterId,
        /// Encounter on offer.
        encounter: EncounterId,
    },
    /// A pending choice was cleared.
    ChoiceResolved {
        /// Character whose choice resolved.
        character: CharacterId,
    },
    /// No active characters remain.
    SessionEnded,
}

/// Request kinds accepted from participants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "action_kind",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum ActionKind {
    /// Move the participant's character to a cell.
    MoveTo(CellCoord),
    /// Pick one of the pending encounter's actions.
    ChoseAction(ActionId),
    /// Use an item from the inventory.
    UseItem(ItemId),
}

/// Inbound request issued by a participant through the transport.
///
/// On the wire the action is flattened next to the user, giving
/// `{"user": .., "action_kind": .., "payload": ..}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Participant issuing the request.
    pub user: UserId,
    /// Requested action and its payload.
    #[serde(flatten)]
    pub action: ActionKind,
}

/// Read-only inputs the rules system consults besides the character itself.
#[derive(Clone, Copy, Debug)]
pub struct RuleContext<'a> {
    /// Base tile grid of the session map.
    pub tiles: &'a Grid<TileKind>,
    /// Current round number.
    pub round: u32,
    /// Houses the evaluated character has visited.
    pub houses_visited: u32,
    /// Tricks the evaluated character has played.
    pub tricks: u32,
    /// Treats the evaluated character has accepted.
    pub treats: u32,
}

/// Immutable representation of a single character used for queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CharacterSnapshot {
    /// Identifier allocated to the character.
    pub id: CharacterId,
    /// Participant controlling the character.
    pub user: UserId,
    /// Display name.
    pub name: String,
    /// Current cell.
    pub cell: CellCoord,
    /// Current stats.
    pub stats: Stats,
    /// Whether the character holds the current turn.
    pub can_take_turn: bool,
    /// Whether the character already moved this turn.
    pub has_moved: bool,
    /// Whether the character still participates.
    pub active: bool,
    /// Carried items in acquisition order.
    pub inventory: Vec<ItemId>,
}

impl CharacterSnapshot {
    /// Reports whether the inventory holds at least one copy of the item.
    #[must_use]
    pub fn holds(&self, item: &ItemId) -> bool {
        self.inventory.iter().any(|held| held == item)
    }
}

/// Immutable representation of a house used for queries and exports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HouseSnapshot {
    /// Identifier allocated to the house.
    pub id: HouseId,
    /// Cell the house occupies.
    pub cell: CellCoord,
    /// Encounter offered by the house.
    pub encounter: EncounterId,
    /// Characters that arrived, in arrival order.
    pub visitors: Vec<CharacterId>,
    /// Characters that played a trick.
    pub trickers: Vec<CharacterId>,
    /// Characters that accepted a treat.
    pub treaters: Vec<CharacterId>,
}

/// Immutable representation of an encounter site used for queries and exports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EncounterSiteSnapshot {
    /// Identifier allocated to the site.
    pub id: SiteId,
    /// Cell the site occupies.
    pub cell: CellCoord,
    /// Encounter offered by the site.
    pub encounter: EncounterId,
    /// Characters that arrived, in arrival order.
    pub visitors: Vec<CharacterId>,
}

/// Turn bookkeeping captured in exports.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TurnSnapshot {
    /// Character holding the turn, absent once the session ended.
    pub current: Option<CharacterId>,
    /// Current round number.
    pub round: u32,
    /// Encounter awaiting a choice, if any.
    pub pending: Option<PendingChoice>,
}

/// Full public state broadcast to displays after every drained batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Sequence number of the batch that produced the snapshot.
    pub batch: u64,
    /// Input mode at export time.
    pub mode: PlayMode,
    /// Base map tiles, row by row.
    pub tiles: Vec<Vec<TileKind>>,
    /// Fog grades, row by row.
    pub fog: Vec<Vec<FogGrade>>,
    /// Every character, ordered by identifier.
    pub characters: Vec<CharacterSnapshot>,
    /// Every house, ordered by identifier.
    pub houses: Vec<HouseSnapshot>,
    /// Every encounter site, ordered by identifier.
    pub encounters: Vec<EncounterSiteSnapshot>,
    /// Turn bookkeeping.
    pub turn: TurnSnapshot,
}
