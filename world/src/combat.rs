//! Turn orchestration: rosters, the action point pool and round outcomes.

use grid_tactics_core::{ActionError, CellCoord, Event, Team, TurnState, UnitId};
use tracing::{debug, info, warn};

use crate::{
    reachability::ReachabilityOverlay,
    units::{PendingAction, Unit},
    World,
};

/// Ordered, duplicate-free list of units taking turns for one team.
///
/// The rotation cursor survives pruning, so removing a unit that precedes
/// the cursor shifts the rotation and may hand the next turn to the unit that
/// just acted.
#[derive(Clone, Debug, Default)]
pub(crate) struct Roster {
    members: Vec<UnitId>,
    cursor: Option<usize>,
}

impl Roster {
    fn rebuild<I>(&mut self, members: I)
    where
        I: IntoIterator<Item = UnitId>,
    {
        self.members.clear();
        for member in members {
            if !self.members.contains(&member) {
                self.members.push(member);
            }
        }
        self.cursor = None;
    }

    fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&UnitId) -> bool,
    {
        self.members.retain(keep);
    }

    fn remove(&mut self, unit: UnitId) {
        self.members.retain(|member| *member != unit);
    }

    fn advance(&mut self) -> Option<UnitId> {
        if self.members.is_empty() {
            return None;
        }

        let next = self
            .cursor
            .map_or(0, |cursor| cursor.wrapping_add(1) % self.members.len());
        self.cursor = Some(next);
        self.members.get(next).copied()
    }

    fn clear(&mut self) {
        self.members.clear();
        self.cursor = None;
    }

    pub(crate) fn members(&self) -> &[UnitId] {
        &self.members
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Bookkeeping owned by the turn state machine.
#[derive(Debug)]
pub(crate) struct CombatState {
    pub(crate) state: TurnState,
    pub(crate) active: Option<(UnitId, Team)>,
    pub(crate) blue: Roster,
    pub(crate) red: Roster,
    pub(crate) action_points: u32,
    pub(crate) can_move: bool,
    pub(crate) can_attack: bool,
    pub(crate) escape: Option<CellCoord>,
    pub(crate) round: u32,
    pub(crate) outcome: Option<bool>,
    pub(crate) reachability: ReachabilityOverlay,
}

impl CombatState {
    pub(crate) fn new(max_action_points: u32) -> Self {
        Self {
            state: TurnState::Waiting,
            active: None,
            blue: Roster::default(),
            red: Roster::default(),
            action_points: max_action_points,
            can_move: false,
            can_attack: false,
            escape: None,
            round: 0,
            outcome: None,
            reachability: ReachabilityOverlay::default(),
        }
    }

    pub(crate) fn roster(&self, team: Team) -> &Roster {
        match team {
            Team::Blue => &self.blue,
            Team::Red => &self.red,
        }
    }

    fn roster_mut(&mut self, team: Team) -> &mut Roster {
        match team {
            Team::Blue => &mut self.blue,
            Team::Red => &mut self.red,
        }
    }
}

impl World {
    /// Starts a new round with every living unit and selects the first unit to act.
    ///
    /// Returns `false` when no units are on the field.
    pub fn start_round(&mut self, out_events: &mut Vec<Event>) -> bool {
        let blue: Vec<UnitId> = self.team_members(Team::Blue);
        let red: Vec<UnitId> = self.team_members(Team::Red);
        if blue.is_empty() && red.is_empty() {
            warn!("start round requested without any units on the field");
            return false;
        }

        self.combat.blue.rebuild(blue);
        self.combat.red.rebuild(red);
        self.combat.action_points = self.config.max_action_points;
        self.combat.active = None;
        self.combat.outcome = None;
        self.combat.round = self.combat.round.saturating_add(1);

        for unit in self.units.iter_mut() {
            unit.pending = None;
        }
        let placements: Vec<(UnitId, CellCoord)> =
            self.units.iter().map(|unit| (unit.id, unit.cell)).collect();
        for (id, cell) in placements {
            if let Some(slot) = self.grid.get_mut(cell) {
                slot.set_occupant(Some(id));
            }
        }

        info!(
            round = self.combat.round,
            blue = self.combat.blue.members().len(),
            red = self.combat.red.members().len(),
            "round started"
        );
        out_events.push(Event::RoundStarted {
            round: self.combat.round,
            action_points: self.combat.action_points,
        });

        self.select_next_active_unit(out_events);
        self.combat.state = TurnState::Normal;
        true
    }

    /// Requests that the active unit walk to `destination`.
    ///
    /// On acceptance the orchestrator waits for [`World::complete_action`].
    pub fn request_move(
        &mut self,
        unit: UnitId,
        destination: CellCoord,
        out_events: &mut Vec<Event>,
    ) -> bool {
        let actor = match self.validate_actor(unit) {
            Ok(actor) => actor,
            Err(reason) => return self.reject(unit, reason, out_events),
        };
        if !self.combat.can_move {
            return self.reject(unit, ActionError::AlreadyMoved, out_events);
        }

        let Some(cell) = self.grid.get(destination) else {
            return self.reject(unit, ActionError::OutOfBounds, out_events);
        };
        let from = actor.cell;
        if destination == from {
            return self.reject(unit, ActionError::SameCell, out_events);
        }
        if cell.occupant().is_some() {
            return self.reject(unit, ActionError::Occupied, out_events);
        }
        if !self.combat.reachability.is_valid_move_target(destination) {
            return self.reject(unit, ActionError::Unreachable, out_events);
        }
        let Some(path) = self.pathfinder.find_path(&self.grid, from, destination) else {
            return self.reject(unit, ActionError::Unreachable, out_events);
        };

        if let Some(actor) = self.units.get_mut(unit) {
            actor.pending = Some(PendingAction::Move {
                from,
                to: destination,
            });
        }
        self.combat.can_move = false;
        self.combat.state = TurnState::Waiting;

        debug!(unit = unit.get(), ?from, to = ?destination, steps = path.step_count(), "move started");
        out_events.push(Event::MoveStarted {
            unit,
            from,
            to: destination,
            path: path.cells().collect(),
        });
        true
    }

    /// Requests that the active unit attack `target`.
    ///
    /// On acceptance the orchestrator waits for [`World::complete_action`].
    pub fn request_attack(
        &mut self,
        unit: UnitId,
        target: UnitId,
        out_events: &mut Vec<Event>,
    ) -> bool {
        let actor = match self.validate_actor(unit) {
            Ok(actor) => actor,
            Err(reason) => return self.reject(unit, reason, out_events),
        };
        if !self.combat.can_attack {
            return self.reject(unit, ActionError::AlreadyAttacked, out_events);
        }

        let team = actor.team;
        let Some(victim) = self.units.get(target) else {
            return self.reject(unit, ActionError::UnknownTarget, out_events);
        };
        if victim.team == team {
            return self.reject(unit, ActionError::FriendlyTarget, out_events);
        }
        if !self.combat.reachability.is_valid_attack_target(victim.cell) {
            return self.reject(unit, ActionError::OutOfRange, out_events);
        }

        if let Some(actor) = self.units.get_mut(unit) {
            actor.pending = Some(PendingAction::Attack { target });
        }
        self.combat.can_attack = false;
        self.combat.state = TurnState::Waiting;

        debug!(unit = unit.get(), target = target.get(), "attack started");
        out_events.push(Event::AttackStarted {
            attacker: unit,
            target,
        });
        true
    }

    /// Delivers the completion signal for the unit's pending move or attack.
    ///
    /// Signals that arrive while no action is pending for the unit are ignored.
    pub fn complete_action(&mut self, unit: UnitId, out_events: &mut Vec<Event>) -> bool {
        if self.combat.state != TurnState::Waiting {
            warn!(unit = unit.get(), "ignoring completion while accepting input");
            return false;
        }
        let Some(pending) = self.units.get_mut(unit).and_then(|actor| actor.pending.take()) else {
            warn!(unit = unit.get(), "ignoring completion without pending action");
            return false;
        };

        self.combat.state = TurnState::Normal;
        match pending {
            PendingAction::Move { from, to } => self.finish_move(unit, from, to, out_events),
            PendingAction::Attack { target } => self.finish_attack(unit, target, out_events),
        }
        true
    }

    /// Ends the active unit's turn immediately.
    ///
    /// A blue unit that already spent an action pays for the turn. Returns
    /// `false` while an action plays out or when no unit holds the turn.
    pub fn force_turn_over(&mut self, out_events: &mut Vec<Event>) -> bool {
        if self.combat.state != TurnState::Normal {
            debug!("force turn over rejected while waiting");
            return false;
        }
        let Some((unit, team)) = self.combat.active else {
            debug!("force turn over rejected without active unit");
            return false;
        };

        let acted = !self.combat.can_move || !self.combat.can_attack;
        debug!(unit = unit.get(), ?team, acted, "turn forced over");
        self.conclude_turn(team.spends_action_points() && acted, out_events);
        true
    }

    /// Removes a unit disabled by an outside collaborator.
    ///
    /// The unit leaves the grid and both rosters. Outcome evaluation is left
    /// to the next completed turn.
    pub fn unsubscribe(&mut self, unit: UnitId, out_events: &mut Vec<Event>) -> bool {
        let listed = self
            .units
            .get(unit)
            .is_some_and(|actor| self.combat.roster(actor.team).members().contains(&unit));
        let Some(removed) = self.remove_unit(unit, out_events) else {
            debug!(unit = unit.get(), "unsubscribe ignored for unknown unit");
            return false;
        };

        // The last member of a fighting team leaving decides the round on the spot.
        if listed
            && self.combat.roster(removed.team).is_empty()
            && self.check_round_end(out_events)
        {
            return true;
        }

        if removed.pending.is_some() && self.combat.state == TurnState::Waiting {
            self.combat.state = TurnState::Normal;
        }
        self.refresh_reachability();
        true
    }

    fn validate_actor(&self, unit: UnitId) -> Result<&Unit, ActionError> {
        if self.combat.state != TurnState::Normal {
            return Err(ActionError::Waiting);
        }
        let actor = self.units.get(unit).ok_or(ActionError::UnknownUnit)?;
        if self.combat.active.map(|(active, _)| active) != Some(unit) {
            return Err(ActionError::NotActiveUnit);
        }
        if actor.pending.is_some() {
            return Err(ActionError::ActionPending);
        }
        Ok(actor)
    }

    fn reject(&self, unit: UnitId, reason: ActionError, out_events: &mut Vec<Event>) -> bool {
        debug!(unit = unit.get(), %reason, "action rejected");
        out_events.push(Event::ActionRejected { unit, reason });
        false
    }

    fn finish_move(
        &mut self,
        unit: UnitId,
        from: CellCoord,
        to: CellCoord,
        out_events: &mut Vec<Event>,
    ) {
        if let Some(slot) = self.grid.get_mut(from) {
            if slot.occupant() == Some(unit) {
                slot.set_occupant(None);
            }
        }
        if let Some(slot) = self.grid.get_mut(to) {
            slot.set_occupant(Some(unit));
        }
        if let Some(actor) = self.units.get_mut(unit) {
            actor.cell = to;
        }

        self.refresh_reachability();
        out_events.push(Event::MoveCompleted { unit, from, to });
        self.test_turn_over(out_events);
    }

    fn finish_attack(&mut self, attacker: UnitId, target: UnitId, out_events: &mut Vec<Event>) {
        let damage = self.units.get(attacker).map_or(0, |unit| unit.attack_damage);
        let Some(victim) = self.units.get_mut(target) else {
            warn!(attacker = attacker.get(), target = target.get(), "attack target vanished");
            self.test_turn_over(out_events);
            return;
        };

        let remaining_health = victim.health.apply_damage(damage);
        let died = victim.health.is_dead();
        let team = victim.team;
        out_events.push(Event::AttackResolved {
            attacker,
            target,
            damage,
            remaining_health,
        });

        if died {
            info!(unit = target.get(), ?team, "unit died");
            out_events.push(Event::UnitDied { unit: target, team });
            let _ = self.remove_unit(target, out_events);
            self.refresh_reachability();
            if self.check_round_end(out_events) {
                return;
            }
        }

        self.test_turn_over(out_events);
    }

    /// Advances the rotation once the active unit has spent both actions.
    fn test_turn_over(&mut self, out_events: &mut Vec<Event>) {
        let Some((_, team)) = self.combat.active else {
            return;
        };

        if self.combat.can_move || self.combat.can_attack {
            let _ = self.check_round_end(out_events);
            return;
        }

        self.conclude_turn(team.spends_action_points(), out_events);
    }

    fn conclude_turn(&mut self, spend_point: bool, out_events: &mut Vec<Event>) {
        if spend_point {
            self.combat.action_points = self.combat.action_points.saturating_sub(1);
            out_events.push(Event::ActionPointsChanged {
                remaining: self.combat.action_points,
            });
        }

        if self.check_round_end(out_events) {
            return;
        }

        if spend_point && self.combat.action_points == 0 {
            info!(round = self.combat.round, "action points exhausted");
            self.reset_team_to_spawn(Team::Blue, out_events);
            self.combat.action_points = self.config.max_action_points;
            out_events.push(Event::ActionPointsChanged {
                remaining: self.combat.action_points,
            });
        }

        self.select_next_active_unit(out_events);
    }

    fn select_next_active_unit(&mut self, out_events: &mut Vec<Event>) {
        self.prune_rosters();

        let team = match (self.combat.blue.is_empty(), self.combat.red.is_empty()) {
            (true, true) => {
                warn!("no units left to take a turn");
                return;
            }
            (true, false) => Team::Red,
            (false, true) => Team::Blue,
            (false, false) => match self.combat.active {
                Some((_, Team::Blue)) => Team::Red,
                Some((_, Team::Red)) | None => Team::Blue,
            },
        };

        let Some(unit) = self.combat.roster_mut(team).advance() else {
            return;
        };

        self.combat.active = Some((unit, team));
        self.combat.can_move = true;
        self.combat.can_attack = true;
        self.refresh_reachability();

        debug!(unit = unit.get(), ?team, "active unit changed");
        out_events.push(Event::ActiveUnitChanged { unit, team });
    }

    /// Evaluates escape and elimination, ending the round when either holds.
    fn check_round_end(&mut self, out_events: &mut Vec<Event>) -> bool {
        self.prune_rosters();

        let escaped = self.combat.escape.is_some_and(|escape| {
            self.combat
                .blue
                .members()
                .iter()
                .filter_map(|id| self.units.get(*id))
                .any(|unit| unit.cell == escape)
        });

        let won = if escaped {
            true
        } else if self.combat.blue.is_empty() {
            false
        } else if self.combat.red.is_empty() {
            true
        } else {
            return false;
        };

        self.end_round(won, out_events);
        true
    }

    fn end_round(&mut self, won: bool, out_events: &mut Vec<Event>) {
        self.combat.state = TurnState::Waiting;
        self.combat.active = None;
        self.combat.blue.clear();
        self.combat.red.clear();
        self.combat.reachability.clear();

        let cells: Vec<CellCoord> = self.units.iter().map(|unit| unit.cell).collect();
        for cell in cells {
            if let Some(slot) = self.grid.get_mut(cell) {
                slot.set_occupant(None);
            }
        }
        self.units.clear();
        out_events.push(Event::FieldCleared);

        self.combat.outcome = Some(won);
        info!(round = self.combat.round, won, "round ended");
        out_events.push(Event::RoundEnded {
            round: self.combat.round,
            won,
        });
    }

    /// Returns every unit of `team` whose spawn cell is free to its spawn cell.
    fn reset_team_to_spawn(&mut self, team: Team, out_events: &mut Vec<Event>) {
        let relocations: Vec<(UnitId, CellCoord, CellCoord)> = self
            .units
            .iter()
            .filter(|unit| unit.team == team && unit.cell != unit.spawn)
            .map(|unit| (unit.id, unit.cell, unit.spawn))
            .collect();

        for (unit, from, to) in relocations {
            let free = self
                .grid
                .get(to)
                .is_some_and(|cell| cell.walkable() && cell.occupant().is_none());
            if !free {
                warn!(unit = unit.get(), spawn = ?to, "spawn cell blocked, unit stays put");
                continue;
            }

            if let Some(slot) = self.grid.get_mut(from) {
                slot.set_occupant(None);
            }
            if let Some(slot) = self.grid.get_mut(to) {
                slot.set_occupant(Some(unit));
            }
            if let Some(actor) = self.units.get_mut(unit) {
                actor.cell = to;
            }
            out_events.push(Event::UnitReturnedToSpawn { unit, from, to });
        }
    }

    fn remove_unit(&mut self, unit: UnitId, out_events: &mut Vec<Event>) -> Option<Unit> {
        let removed = self.units.remove(unit)?;
        if let Some(slot) = self.grid.get_mut(removed.cell) {
            if slot.occupant() == Some(unit) {
                slot.set_occupant(None);
            }
        }
        self.combat.roster_mut(removed.team).remove(unit);
        out_events.push(Event::UnitRemoved { unit });
        Some(removed)
    }

    fn prune_rosters(&mut self) {
        let units = &self.units;
        self.combat.blue.retain(|id| units.contains(*id));
        self.combat.red.retain(|id| units.contains(*id));
    }

    fn team_members(&self, team: Team) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|unit| unit.team == team && !unit.health.is_dead())
            .map(|unit| unit.id)
            .collect()
    }

    pub(crate) fn refresh_reachability(&mut self) {
        let Some((active, team)) = self.combat.active else {
            self.combat.reachability.clear();
            return;
        };
        let Some(unit) = self.units.get(active) else {
            self.combat.reachability.clear();
            return;
        };

        let units = &self.units;
        self.combat.reachability = ReachabilityOverlay::sweep(
            &self.grid,
            &self.pathfinder,
            unit.cell,
            unit.movement_range,
            |occupant| units.get(occupant).is_some_and(|other| other.team != team),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(ids: &[u32]) -> Roster {
        let mut roster = Roster::default();
        roster.rebuild(ids.iter().copied().map(UnitId::new));
        roster
    }

    #[test]
    fn advance_wraps_around_the_roster() {
        let mut roster = roster(&[0, 1, 2]);

        let picks: Vec<_> = (0..4).filter_map(|_| roster.advance()).map(|id| id.get()).collect();

        assert_eq!(picks, vec![0, 1, 2, 0]);
    }

    #[test]
    fn rebuild_drops_duplicates() {
        let roster = roster(&[3, 1, 3]);

        assert_eq!(roster.members(), &[UnitId::new(3), UnitId::new(1)]);
    }

    #[test]
    fn cursor_survives_pruning() {
        let mut roster = roster(&[0, 1, 2]);
        let _ = roster.advance();
        let _ = roster.advance();

        roster.remove(UnitId::new(0));

        assert_eq!(roster.advance(), Some(UnitId::new(1)));
    }

    #[test]
    fn empty_roster_yields_nothing() {
        let mut roster = Roster::default();

        assert_eq!(roster.advance(), None);
        roster.clear();
        assert!(roster.is_empty());
    }
}
