#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Grid Tactics engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Grid Tactics.";

/// Number of action points the blue team receives at the start of a round.
pub const DEFAULT_MAX_ACTION_POINTS: u32 = 6;
/// Number of steps a unit may travel during a single turn.
pub const DEFAULT_MOVEMENT_RANGE: u32 = 3;
/// Health assigned to freshly spawned units.
pub const DEFAULT_MAX_HEALTH: u32 = 100;
/// Damage dealt by a single resolved attack.
pub const DEFAULT_ATTACK_DAMAGE: u32 = 10;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the grid with an open floor of the provided dimensions.
    ///
    /// Every unit is removed and the combat state returns to `Waiting`.
    ConfigureGrid {
        /// Number of cell columns laid out in the grid.
        columns: u32,
        /// Number of cell rows laid out in the grid.
        rows: u32,
        /// Length of each square cell measured in world units.
        cell_size: f32,
        /// World-space position of the grid's lower corner.
        origin: Vec2,
    },
    /// Marks a cell as walkable floor or as a wall.
    SetWalkable {
        /// Cell whose walkability changes.
        cell: CellCoord,
        /// Whether units may stand on and path through the cell.
        walkable: bool,
    },
    /// Stores an arbitrary payload value on a cell.
    SetCellValue {
        /// Cell receiving the payload.
        cell: CellCoord,
        /// Payload value written to the cell.
        value: f32,
    },
    /// Designates the cell blue units must reach to win the round.
    SetEscapeCell {
        /// Cell acting as the escape goal.
        cell: CellCoord,
    },
    /// Requests that a spawner place a new unit onto the field.
    SpawnUnit {
        /// Faction the unit fights for.
        team: Team,
        /// Spawn cell, also used when units are returned to their spawners.
        cell: CellCoord,
        /// Statistics assigned to the unit.
        stats: UnitStats,
    },
    /// Rebuilds the rosters, refills action points and selects the first unit.
    StartRound,
    /// Requests that the active unit walk to the provided destination.
    RequestMove {
        /// Unit issuing the request.
        unit: UnitId,
        /// Cell the unit should travel to.
        destination: CellCoord,
    },
    /// Requests that the active unit attack an enemy.
    RequestAttack {
        /// Unit issuing the request.
        unit: UnitId,
        /// Unit receiving the attack.
        target: UnitId,
    },
    /// Signals that the presentation finished playing the unit's pending action.
    CompleteAction {
        /// Unit whose pending move or attack finished.
        unit: UnitId,
    },
    /// Ends the active unit's turn regardless of its remaining actions.
    ForceTurnOver,
    /// Removes a unit that was disabled by an external collaborator.
    Unsubscribe {
        /// Unit leaving the field.
        unit: UnitId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that the grid was rebuilt with new dimensions.
    GridConfigured {
        /// Number of cell columns in the new grid.
        columns: u32,
        /// Number of cell rows in the new grid.
        rows: u32,
    },
    /// Announces that a cell's walkability or payload changed.
    CellChanged {
        /// Cell whose payload changed.
        cell: CellCoord,
    },
    /// Confirms that the escape goal was assigned.
    EscapeCellAssigned {
        /// Cell acting as the escape goal.
        cell: CellCoord,
    },
    /// Confirms that a unit was placed onto the field.
    UnitSpawned {
        /// Identifier assigned to the unit.
        unit: UnitId,
        /// Faction the unit fights for.
        team: Team,
        /// Cell the unit occupies.
        cell: CellCoord,
    },
    /// Reports that a spawn request was rejected.
    SpawnRejected {
        /// Faction requested for the unit.
        team: Team,
        /// Cell provided in the spawn request.
        cell: CellCoord,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Announces that a new round began.
    RoundStarted {
        /// One-based index of the round.
        round: u32,
        /// Action points available to the blue team.
        action_points: u32,
    },
    /// Announces the unit that may act next.
    ActiveUnitChanged {
        /// Identifier of the newly active unit.
        unit: UnitId,
        /// Faction the unit belongs to.
        team: Team,
    },
    /// Confirms that a move request was accepted and playback may begin.
    MoveStarted {
        /// Unit travelling along the path.
        unit: UnitId,
        /// Cell the unit leaves.
        from: CellCoord,
        /// Cell the unit travels to.
        to: CellCoord,
        /// Cells visited along the way, including both endpoints.
        path: Vec<CellCoord>,
    },
    /// Confirms that a unit arrived at its destination.
    MoveCompleted {
        /// Unit that finished moving.
        unit: UnitId,
        /// Cell the unit left.
        from: CellCoord,
        /// Cell the unit now occupies.
        to: CellCoord,
    },
    /// Confirms that an attack request was accepted and playback may begin.
    AttackStarted {
        /// Unit performing the attack.
        attacker: UnitId,
        /// Unit being attacked.
        target: UnitId,
    },
    /// Reports the damage applied once an attack finished playing.
    AttackResolved {
        /// Unit that performed the attack.
        attacker: UnitId,
        /// Unit that received the damage.
        target: UnitId,
        /// Damage applied to the target.
        damage: u32,
        /// Health the target has left.
        remaining_health: u32,
    },
    /// Announces that a unit's health reached zero.
    UnitDied {
        /// Unit that died.
        unit: UnitId,
        /// Faction the unit belonged to.
        team: Team,
    },
    /// Confirms that a unit left the field and every roster.
    UnitRemoved {
        /// Unit that was removed.
        unit: UnitId,
    },
    /// Reports that a move or attack request was rejected.
    ActionRejected {
        /// Unit named in the rejected request.
        unit: UnitId,
        /// Specific reason the request failed.
        reason: ActionError,
    },
    /// Reports the blue team's remaining action points after a change.
    ActionPointsChanged {
        /// Action points left in the pool.
        remaining: u32,
    },
    /// Confirms that a unit was returned to its spawn cell.
    UnitReturnedToSpawn {
        /// Unit that was relocated.
        unit: UnitId,
        /// Cell the unit occupied before the reset.
        from: CellCoord,
        /// Spawn cell the unit occupies after the reset.
        to: CellCoord,
    },
    /// Announces that every unit was removed while tearing down the field.
    FieldCleared,
    /// Announces the outcome of the round.
    RoundEnded {
        /// Index of the round that ended.
        round: u32,
        /// Indicates whether the blue team won.
        won: bool,
    },
}

/// Opposing factions that share the battlefield.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    /// Player faction that spends action points and tries to escape.
    Blue,
    /// Opposing faction defending the level.
    Red,
}

impl Team {
    /// Returns the faction opposing this one.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Blue => Self::Red,
            Self::Red => Self::Blue,
        }
    }

    /// Reports whether completed turns of this faction consume action points.
    #[must_use]
    pub const fn spends_action_points(self) -> bool {
        matches!(self, Self::Blue)
    }
}

/// Unique identifier assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
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

/// Location of a single grid cell expressed as column and row coordinates.
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

    /// Computes the Chebyshev distance between two cell coordinates.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column()
            .abs_diff(other.column())
            .max(self.row().abs_diff(other.row()))
    }

    /// Returns the coordinate shifted by the provided deltas.
    ///
    /// Yields `None` when the result would leave the non-negative quadrant.
    #[must_use]
    pub fn offset(self, column_delta: i32, row_delta: i32) -> Option<CellCoord> {
        let column = self.column.checked_add_signed(column_delta)?;
        let row = self.row.checked_add_signed(row_delta)?;
        Some(CellCoord::new(column, row))
    }
}

/// Lifecycle state of the combat turn machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnState {
    /// Player or AI input is accepted.
    Normal,
    /// An action is playing out, or no round is running; input is rejected.
    Waiting,
}

/// Statistics assigned to a unit when it spawns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitStats {
    /// Health the unit starts with.
    pub max_health: u32,
    /// Number of steps the unit may travel per turn.
    pub movement_range: u32,
    /// Damage dealt by each of the unit's attacks.
    pub attack_damage: u32,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            max_health: DEFAULT_MAX_HEALTH,
            movement_range: DEFAULT_MOVEMENT_RANGE,
            attack_damage: DEFAULT_ATTACK_DAMAGE,
        }
    }
}

/// Rules applied by the combat orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Action points the blue team receives per round and after exhaustion.
    pub max_action_points: u32,
    /// Whether pathfinding may step diagonally between cells.
    pub diagonal_movement: bool,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            max_action_points: DEFAULT_MAX_ACTION_POINTS,
            diagonal_movement: false,
        }
    }
}

/// Reasons a move or attack request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum ActionError {
    /// The orchestrator is waiting for an action to finish or for a round to start.
    #[error("the orchestrator is not accepting input")]
    Waiting,
    /// No unit with the provided identifier exists.
    #[error("unit does not exist")]
    UnknownUnit,
    /// The requesting unit does not hold the turn.
    #[error("unit is not the active unit")]
    NotActiveUnit,
    /// The requesting unit still has an action playing out.
    #[error("unit already has an action pending")]
    ActionPending,
    /// The active unit already moved this turn.
    #[error("unit already moved this turn")]
    AlreadyMoved,
    /// The active unit already attacked this turn.
    #[error("unit already attacked this turn")]
    AlreadyAttacked,
    /// The destination lies outside the grid.
    #[error("destination lies outside the grid")]
    OutOfBounds,
    /// The destination is the cell the unit already occupies.
    #[error("unit already stands on the destination")]
    SameCell,
    /// Another unit occupies the destination.
    #[error("destination is occupied")]
    Occupied,
    /// No path within the unit's movement range reaches the destination.
    #[error("destination is not reachable this turn")]
    Unreachable,
    /// The attack target does not exist.
    #[error("attack target does not exist")]
    UnknownTarget,
    /// The attack target fights for the same faction.
    #[error("attack target is not an enemy")]
    FriendlyTarget,
    /// The attack target stands outside the unit's reach.
    #[error("attack target is out of range")]
    OutOfRange,
}

/// Reasons a spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum SpawnError {
    /// The spawn cell lies outside the grid.
    #[error("spawn cell lies outside the grid")]
    OutOfBounds,
    /// The spawn cell is a wall.
    #[error("spawn cell is not walkable")]
    Blocked,
    /// Another unit already occupies the spawn cell.
    #[error("spawn cell is occupied")]
    Occupied,
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitSnapshot {
    /// Unique identifier assigned to the unit.
    pub id: UnitId,
    /// Faction the unit fights for.
    pub team: Team,
    /// Grid cell currently occupied by the unit.
    pub cell: CellCoord,
    /// Cell the unit returns to when its team runs out of action points.
    pub spawn: CellCoord,
    /// Health the unit has left.
    pub health: u32,
    /// Health the unit started with.
    pub max_health: u32,
    /// Number of steps the unit may travel per turn.
    pub movement_range: u32,
    /// Damage dealt by each of the unit's attacks.
    pub attack_damage: u32,
    /// Indicates whether the unit waits for an action to complete.
    pub pending: bool,
}

/// Read-only snapshot describing all units on the field.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot captured for the provided unit.
    #[must_use]
    pub fn get(&self, unit: UnitId) -> Option<&UnitSnapshot> {
        self.snapshots
            .binary_search_by_key(&unit, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Iterator over the units fighting for the provided team.
    pub fn team(&self, team: Team) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots
            .iter()
            .filter(move |snapshot| snapshot.team == team)
    }

    /// Number of units captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Read-only summary of the orchestrator's turn bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnSnapshot {
    /// Current lifecycle state of the turn machine.
    pub state: TurnState,
    /// Unit currently holding the turn, if any.
    pub active: Option<UnitId>,
    /// Faction of the unit holding the turn, if any.
    pub active_team: Option<Team>,
    /// Action points left in the blue team's pool.
    pub action_points: u32,
    /// Size of the blue team's action point pool.
    pub max_action_points: u32,
    /// Whether the active unit may still move this turn.
    pub can_move: bool,
    /// Whether the active unit may still attack this turn.
    pub can_attack: bool,
}
