//! Authoritative unit state and identifier allocation.

use std::collections::BTreeMap;

use grid_tactics_core::{CellCoord, Team, UnitId, UnitSnapshot, UnitStats};

/// Current and maximum hit points of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Health {
    current: u32,
    max: u32,
}

impl Health {
    pub(crate) const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub(crate) const fn current(&self) -> u32 {
        self.current
    }

    pub(crate) const fn max(&self) -> u32 {
        self.max
    }

    /// Applies damage, clamping at zero, and returns the remaining health.
    pub(crate) fn apply_damage(&mut self, amount: u32) -> u32 {
        self.current = self.current.saturating_sub(amount);
        self.current
    }

    pub(crate) const fn is_dead(&self) -> bool {
        self.current == 0
    }
}

/// Action accepted by the orchestrator that still awaits its completion signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PendingAction {
    Move { from: CellCoord, to: CellCoord },
    Attack { target: UnitId },
}

#[derive(Clone, Debug)]
pub(crate) struct Unit {
    pub(crate) id: UnitId,
    pub(crate) team: Team,
    pub(crate) cell: CellCoord,
    pub(crate) spawn: CellCoord,
    pub(crate) health: Health,
    pub(crate) movement_range: u32,
    pub(crate) attack_damage: u32,
    pub(crate) pending: Option<PendingAction>,
}

impl Unit {
    pub(crate) fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            team: self.team,
            cell: self.cell,
            spawn: self.spawn,
            health: self.health.current(),
            max_health: self.health.max(),
            movement_range: self.movement_range,
            attack_damage: self.attack_damage,
            pending: self.pending.is_some(),
        }
    }
}

/// Registry that stores units and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct UnitRegistry {
    entries: BTreeMap<UnitId, Unit>,
    next_unit_id: UnitId,
}

impl UnitRegistry {
    /// Creates an empty unit registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_unit_id: UnitId::new(0),
        }
    }

    /// Stores a new unit spawned at `cell` and returns its identifier.
    pub(crate) fn spawn(&mut self, team: Team, cell: CellCoord, stats: UnitStats) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id = UnitId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(
            id,
            Unit {
                id,
                team,
                cell,
                spawn: cell,
                health: Health::new(stats.max_health),
                movement_range: stats.movement_range,
                attack_damage: stats.attack_damage,
                pending: None,
            },
        );
        id
    }

    pub(crate) fn get(&self, id: UnitId) -> Option<&Unit> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn contains(&self, id: UnitId) -> bool {
        self.entries.contains_key(&id)
    }

    pub(crate) fn remove(&mut self, id: UnitId) -> Option<Unit> {
        self.entries.remove(&id)
    }

    /// Iterates over every unit in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.entries.values_mut()
    }

    /// Removes every unit while keeping the identifier counter.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_clamps_at_zero() {
        let mut health = Health::new(15);

        assert_eq!(health.apply_damage(10), 5);
        assert!(!health.is_dead());
        assert_eq!(health.apply_damage(10), 0);
        assert!(health.is_dead());
        assert_eq!(health.max(), 15);
    }

    #[test]
    fn registry_allocates_sequential_identifiers() {
        let mut registry = UnitRegistry::new();
        let first = registry.spawn(Team::Blue, CellCoord::new(0, 0), UnitStats::default());
        let second = registry.spawn(Team::Red, CellCoord::new(1, 0), UnitStats::default());

        assert_eq!(first, UnitId::new(0));
        assert_eq!(second, UnitId::new(1));
        assert!(registry.remove(first).is_some());
        registry.clear();
        let third = registry.spawn(Team::Red, CellCoord::new(2, 0), UnitStats::default());
        assert_eq!(third, UnitId::new(2));
    }

    #[test]
    fn snapshot_reflects_spawn_statistics() {
        let mut registry = UnitRegistry::new();
        let stats = UnitStats {
            max_health: 40,
            movement_range: 2,
            attack_damage: 15,
        };
        let id = registry.spawn(Team::Blue, CellCoord::new(3, 1), stats);
        let snapshot = registry.get(id).map(Unit::snapshot).expect("unit exists");

        assert_eq!(snapshot.spawn, CellCoord::new(3, 1));
        assert_eq!(snapshot.health, 40);
        assert_eq!(snapshot.movement_range, 2);
        assert!(!snapshot.pending);
    }
}
