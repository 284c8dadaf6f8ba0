#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Grid Tactics.

pub mod cell;
mod combat;
pub mod grid;
pub mod pathfinding;
pub mod reachability;
mod units;

use glam::Vec2;
use grid_tactics_core::{CombatConfig, Command, Event, SpawnError, WELCOME_BANNER};
use tracing::{debug, warn};

use crate::{
    cell::Cell,
    combat::CombatState,
    grid::GridMap,
    pathfinding::Pathfinder,
    units::UnitRegistry,
};

const DEFAULT_GRID_COLUMNS: u32 = 10;
const DEFAULT_GRID_ROWS: u32 = 10;
const DEFAULT_CELL_SIZE: f32 = 1.0;

/// Represents the authoritative Grid Tactics world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: CombatConfig,
    grid: GridMap<Cell>,
    pathfinder: Pathfinder,
    units: UnitRegistry,
    combat: CombatState,
}

impl World {
    /// Creates a new world using the default combat rules.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CombatConfig::default())
    }

    /// Creates a new world governed by the provided combat rules.
    #[must_use]
    pub fn with_config(config: CombatConfig) -> Self {
        Self {
            banner: WELCOME_BANNER,
            config,
            grid: open_floor(DEFAULT_GRID_COLUMNS, DEFAULT_GRID_ROWS, DEFAULT_CELL_SIZE, Vec2::ZERO),
            pathfinder: Pathfinder::new(config.diagonal_movement),
            units: UnitRegistry::new(),
            combat: CombatState::new(config.max_action_points),
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid {
            columns,
            rows,
            cell_size,
            origin,
        } => {
            world.grid = open_floor(columns, rows, cell_size, origin);
            world.units = UnitRegistry::new();
            let round = world.combat.round;
            world.combat = CombatState::new(world.config.max_action_points);
            world.combat.round = round;
            debug!(columns, rows, cell_size, "grid configured");
            out_events.push(Event::GridConfigured { columns, rows });
        }
        Command::SetWalkable { cell, walkable } => {
            if !world.grid.update(cell, |slot| slot.set_walkable(walkable)) {
                warn!(?cell, "walkability change outside the grid ignored");
            }
        }
        Command::SetCellValue { cell, value } => {
            if !world.grid.update(cell, |slot| slot.set_value(value)) {
                warn!(?cell, "cell value change outside the grid ignored");
            }
        }
        Command::SetEscapeCell { cell } => {
            if world.grid.contains(cell) {
                world.combat.escape = Some(cell);
                out_events.push(Event::EscapeCellAssigned { cell });
            } else {
                warn!(?cell, "escape cell outside the grid ignored");
            }
        }
        Command::SpawnUnit { team, cell, stats } => {
            let rejection = match world.grid.get(cell) {
                None => Some(SpawnError::OutOfBounds),
                Some(slot) if !slot.walkable() => Some(SpawnError::Blocked),
                Some(slot) if slot.occupant().is_some() => Some(SpawnError::Occupied),
                Some(_) => None,
            };
            if let Some(reason) = rejection {
                debug!(?team, ?cell, %reason, "spawn rejected");
                out_events.push(Event::SpawnRejected { team, cell, reason });
            } else {
                let unit = world.units.spawn(team, cell, stats);
                if let Some(slot) = world.grid.get_mut(cell) {
                    slot.set_occupant(Some(unit));
                }
                debug!(unit = unit.get(), ?team, ?cell, "unit spawned");
                out_events.push(Event::UnitSpawned { unit, team, cell });
            }
        }
        Command::StartRound => {
            let _ = world.start_round(out_events);
        }
        Command::RequestMove { unit, destination } => {
            let _ = world.request_move(unit, destination, out_events);
        }
        Command::RequestAttack { unit, target } => {
            let _ = world.request_attack(unit, target, out_events);
        }
        Command::CompleteAction { unit } => {
            let _ = world.complete_action(unit, out_events);
        }
        Command::ForceTurnOver => {
            let _ = world.force_turn_over(out_events);
        }
        Command::Unsubscribe { unit } => {
            let _ = world.unsubscribe(unit, out_events);
        }
    }

    for cell in world.grid.drain_changes() {
        out_events.push(Event::CellChanged { cell });
    }
}

fn open_floor(columns: u32, rows: u32, cell_size: f32, origin: Vec2) -> GridMap<Cell> {
    GridMap::new(columns, rows, cell_size, origin, |_| Cell::floor())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use grid_tactics_core::{
        CellCoord, CombatConfig, Team, TurnSnapshot, UnitId, UnitSnapshot, UnitView,
    };

    use super::World;
    use crate::{
        cell::Cell, grid::GridMap, pathfinding::Pathfinder, reachability::ReachabilityOverlay,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Combat rules the world was created with.
    #[must_use]
    pub fn config(world: &World) -> CombatConfig {
        world.config
    }

    /// Provides read-only access to the battlefield grid.
    #[must_use]
    pub fn grid(world: &World) -> &GridMap<Cell> {
        &world.grid
    }

    /// Pathfinder configured with the world's adjacency rule.
    #[must_use]
    pub fn pathfinder(world: &World) -> &Pathfinder {
        &world.pathfinder
    }

    /// Captures the orchestrator's turn bookkeeping.
    #[must_use]
    pub fn turn(world: &World) -> TurnSnapshot {
        let combat = &world.combat;
        TurnSnapshot {
            state: combat.state,
            active: combat.active.map(|(unit, _)| unit),
            active_team: combat.active.map(|(_, team)| team),
            action_points: combat.action_points,
            max_action_points: world.config.max_action_points,
            can_move: combat.can_move,
            can_attack: combat.can_attack,
        }
    }

    /// Unit currently holding the turn, if any.
    #[must_use]
    pub fn active_unit(world: &World) -> Option<UnitId> {
        world.combat.active.map(|(unit, _)| unit)
    }

    /// Captures a snapshot of a single unit.
    #[must_use]
    pub fn unit(world: &World, unit: UnitId) -> Option<UnitSnapshot> {
        world.units.get(unit).map(|unit| unit.snapshot())
    }

    /// Captures a read-only view of every unit on the field.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        UnitView::from_snapshots(world.units.iter().map(|unit| unit.snapshot()).collect())
    }

    /// Units of `team` taking part in the current rotation, in turn order.
    #[must_use]
    pub fn roster(world: &World, team: Team) -> &[UnitId] {
        world.combat.roster(team).members()
    }

    /// Reports whether the active unit may move onto the cell.
    #[must_use]
    pub fn is_valid_move_target(world: &World, cell: CellCoord) -> bool {
        world.combat.reachability.is_valid_move_target(cell)
    }

    /// Reports whether the active unit may attack the occupant of the cell.
    #[must_use]
    pub fn is_valid_attack_target(world: &World, cell: CellCoord) -> bool {
        world.combat.reachability.is_valid_attack_target(cell)
    }

    /// Action points left in the blue team's pool.
    #[must_use]
    pub fn current_action_points(world: &World) -> u32 {
        world.combat.action_points
    }

    /// Cell blue units must reach to win, if one was assigned.
    #[must_use]
    pub fn escape_cell(world: &World) -> Option<CellCoord> {
        world.combat.escape
    }

    /// Number of rounds started by this world; regenerating the grid keeps counting.
    #[must_use]
    pub fn round(world: &World) -> u32 {
        world.combat.round
    }

    /// Outcome of the most recent round: `Some(true)` when blue won.
    #[must_use]
    pub fn outcome(world: &World) -> Option<bool> {
        world.combat.outcome
    }

    /// Reachability overlay computed for the active unit.
    #[must_use]
    pub fn reachability(world: &World) -> &ReachabilityOverlay {
        &world.combat.reachability
    }
}
