#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that plays a team's turns by targeting the nearest opponent.

use grid_tactics_core::{
    CellCoord, Command, Event, Team, TurnSnapshot, TurnState, UnitId, UnitSnapshot, UnitView,
};
use grid_tactics_world::{cell::Cell, grid::GridMap, reachability::ReachabilityOverlay};
use tracing::debug;

/// Action chosen for the active unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Attack the provided enemy.
    Attack {
        /// Unit to attack.
        target: UnitId,
    },
    /// Walk to the provided cell.
    Move {
        /// Cell to walk to.
        destination: CellCoord,
    },
    /// Give up the rest of the turn.
    EndTurn,
}

/// Locates the opponent whose cell centre lies closest to the actor's.
///
/// Ties resolve to the opponent with the lowest identifier.
#[must_use]
pub fn nearest_opponent<'a>(
    actor: &UnitSnapshot,
    units: &'a UnitView,
    grid: &GridMap<Cell>,
) -> Option<&'a UnitSnapshot> {
    let origin = grid.cell_center_to_world(actor.cell);
    let mut best: Option<(f32, &UnitSnapshot)> = None;

    for candidate in units.team(actor.team.opponent()) {
        let distance = origin.distance(grid.cell_center_to_world(candidate.cell));
        if best.map_or(true, |(closest, _)| distance < closest) {
            best = Some((distance, candidate));
        }
    }

    best.map(|(_, unit)| unit)
}

/// Picks the free destination whose centre lies closest to `goal`.
///
/// Candidates are visited in sweep order and ties keep the earliest one.
#[must_use]
pub fn approach(
    grid: &GridMap<Cell>,
    reachability: &ReachabilityOverlay,
    goal: CellCoord,
) -> Option<CellCoord> {
    let goal_point = grid.cell_center_to_world(goal);
    let mut best: Option<(f32, CellCoord)> = None;

    for &candidate in reachability.move_targets() {
        let distance = goal_point.distance(grid.cell_center_to_world(candidate));
        if best.map_or(true, |(closest, _)| distance < closest) {
            best = Some((distance, candidate));
        }
    }

    best.map(|(_, cell)| cell)
}

/// Chooses the opening action of a fresh turn.
///
/// Attacks the nearest opponent when it is in reach; otherwise walks towards
/// it. Without opponents or destinations the turn ends.
#[must_use]
pub fn decide(
    actor: &UnitSnapshot,
    units: &UnitView,
    grid: &GridMap<Cell>,
    reachability: &ReachabilityOverlay,
) -> Decision {
    let Some(target) = nearest_opponent(actor, units, grid) else {
        return Decision::EndTurn;
    };

    if reachability.is_valid_attack_target(target.cell) {
        return Decision::Attack { target: target.id };
    }

    approach(grid, reachability, target.cell)
        .map_or(Decision::EndTurn, |destination| Decision::Move { destination })
}

/// Chooses the action taken once the actor finished moving.
#[must_use]
pub fn follow_up(
    actor: &UnitSnapshot,
    units: &UnitView,
    grid: &GridMap<Cell>,
    reachability: &ReachabilityOverlay,
) -> Decision {
    match nearest_opponent(actor, units, grid) {
        Some(target) if reachability.is_valid_attack_target(target.cell) => {
            Decision::Attack { target: target.id }
        }
        _ => Decision::EndTurn,
    }
}

/// Point in the active unit's turn the opponent reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Trigger {
    TurnStarted,
    MoveFinished,
    AttackFinished,
    Rejected,
}

/// Event-driven driver that issues commands for one team's units.
#[derive(Debug)]
pub struct Opponent {
    team: Team,
    escape: Option<CellCoord>,
}

impl Opponent {
    /// Creates an opponent that plays the provided team.
    #[must_use]
    pub fn new(team: Team) -> Self {
        Self { team, escape: None }
    }

    /// Makes the opponent head for `escape` whenever no enemy is in reach.
    #[must_use]
    pub fn seeking(mut self, escape: Option<CellCoord>) -> Self {
        self.escape = escape;
        self
    }

    /// Team played by the opponent.
    #[must_use]
    pub fn team(&self) -> Team {
        self.team
    }

    /// Consumes world events and immutable views to emit turn commands.
    ///
    /// Nothing is issued unless one of the team's units holds the turn and the
    /// world accepts input.
    pub fn handle(
        &mut self,
        events: &[Event],
        turn: &TurnSnapshot,
        units: &UnitView,
        grid: &GridMap<Cell>,
        reachability: &ReachabilityOverlay,
        out: &mut Vec<Command>,
    ) {
        if turn.state == TurnState::Waiting || turn.active_team != Some(self.team) {
            return;
        }
        let Some(active) = turn.active else {
            return;
        };
        let Some(trigger) = latest_trigger(events, active) else {
            return;
        };
        let Some(actor) = units.get(active) else {
            out.push(Command::ForceTurnOver);
            return;
        };

        let decision = match trigger {
            Trigger::TurnStarted => self.open(actor, units, grid, reachability),
            Trigger::MoveFinished if turn.can_attack => follow_up(actor, units, grid, reachability),
            Trigger::MoveFinished | Trigger::AttackFinished | Trigger::Rejected => {
                Decision::EndTurn
            }
        };
        debug!(unit = active.get(), team = ?self.team, ?trigger, ?decision, "opponent decided");

        out.push(match decision {
            Decision::Attack { target } => Command::RequestAttack {
                unit: active,
                target,
            },
            Decision::Move { destination } => Command::RequestMove {
                unit: active,
                destination,
            },
            Decision::EndTurn => Command::ForceTurnOver,
        });
    }

    fn open(
        &self,
        actor: &UnitSnapshot,
        units: &UnitView,
        grid: &GridMap<Cell>,
        reachability: &ReachabilityOverlay,
    ) -> Decision {
        let Some(escape) = self.escape else {
            return decide(actor, units, grid, reachability);
        };
        if reachability.is_valid_move_target(escape) {
            return Decision::Move {
                destination: escape,
            };
        }

        match decide(actor, units, grid, reachability) {
            Decision::Attack { target } => Decision::Attack { target },
            Decision::Move { .. } | Decision::EndTurn => approach(grid, reachability, escape)
                .map_or(Decision::EndTurn, |destination| Decision::Move { destination }),
        }
    }
}

fn latest_trigger(events: &[Event], active: UnitId) -> Option<Trigger> {
    events.iter().rev().find_map(|event| match event {
        Event::ActiveUnitChanged { unit, .. } if *unit == active => Some(Trigger::TurnStarted),
        Event::MoveCompleted { unit, .. } if *unit == active => Some(Trigger::MoveFinished),
        Event::AttackResolved { attacker, .. } if *attacker == active => {
            Some(Trigger::AttackFinished)
        }
        Event::ActionRejected { unit, .. } if *unit == active => Some(Trigger::Rejected),
        _ => None,
    })
}
