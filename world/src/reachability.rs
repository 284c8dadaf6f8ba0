//! Per-turn overlay describing where the active unit may move or strike.

use std::collections::BTreeMap;

use grid_tactics_core::{CellCoord, UnitId};

use crate::{cell::Cell, grid::GridMap, pathfinding::Pathfinder};

/// Classification of a cell the active unit can reach this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mark {
    /// Free cell the unit may move onto.
    MoveTarget,
    /// Cell held by an enemy the unit may attack.
    AttackTarget,
    /// Cell within reach that holds the unit itself or an ally.
    Reachable,
}

/// Reachability sweep results computed for a single origin and range.
///
/// The sweep visits the square of cells around the origin column by column,
/// keeps walkable candidates, and confirms each one whose shortest path fits
/// inside the movement budget. Occupied cells do not block the search; they are
/// classified by their occupant instead.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReachabilityOverlay {
    origin: Option<CellCoord>,
    range: u32,
    marks: BTreeMap<CellCoord, Mark>,
    move_targets: Vec<CellCoord>,
}

impl ReachabilityOverlay {
    /// Sweeps the grid around `origin`, classifying every cell reachable in `range` steps.
    #[must_use]
    pub fn sweep<F>(
        grid: &GridMap<Cell>,
        pathfinder: &Pathfinder,
        origin: CellCoord,
        range: u32,
        mut is_enemy: F,
    ) -> Self
    where
        F: FnMut(UnitId) -> bool,
    {
        let mut overlay = Self {
            origin: Some(origin),
            range,
            ..Self::default()
        };
        if !grid.contains(origin) || grid.columns() == 0 || grid.rows() == 0 {
            return overlay;
        }

        let min_column = origin.column().saturating_sub(range);
        let max_column = origin.column().saturating_add(range).min(grid.columns() - 1);
        let min_row = origin.row().saturating_sub(range);
        let max_row = origin.row().saturating_add(range).min(grid.rows() - 1);

        let mut provisional = Vec::new();
        for column in min_column..=max_column {
            for row in min_row..=max_row {
                let cell = CellCoord::new(column, row);
                if grid.get(cell).is_some_and(Cell::walkable) {
                    provisional.push(cell);
                }
            }
        }

        for cell in provisional {
            if !pathfinder.within_range(grid, origin, cell, range) {
                continue;
            }

            let mark = match grid.get(cell).and_then(Cell::occupant) {
                None => Mark::MoveTarget,
                Some(occupant) if is_enemy(occupant) => Mark::AttackTarget,
                Some(_) => Mark::Reachable,
            };
            if mark == Mark::MoveTarget {
                overlay.move_targets.push(cell);
            }
            let _ = overlay.marks.insert(cell, mark);
        }

        overlay
    }

    /// Cell the sweep was computed from, if any.
    #[must_use]
    pub const fn origin(&self) -> Option<CellCoord> {
        self.origin
    }

    /// Movement budget used by the sweep.
    #[must_use]
    pub const fn range(&self) -> u32 {
        self.range
    }

    /// Classification recorded for the cell, if it is reachable.
    #[must_use]
    pub fn mark(&self, cell: CellCoord) -> Option<Mark> {
        self.marks.get(&cell).copied()
    }

    /// Reports whether the active unit may move onto the cell.
    #[must_use]
    pub fn is_valid_move_target(&self, cell: CellCoord) -> bool {
        self.mark(cell) == Some(Mark::MoveTarget)
    }

    /// Reports whether the occupant of the cell may be attacked.
    #[must_use]
    pub fn is_valid_attack_target(&self, cell: CellCoord) -> bool {
        self.mark(cell) == Some(Mark::AttackTarget)
    }

    /// Free destinations in sweep order (column-major around the origin).
    #[must_use]
    pub fn move_targets(&self) -> &[CellCoord] {
        &self.move_targets
    }

    /// Cells holding attackable enemies, ordered by coordinate.
    pub fn attack_targets(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.marks
            .iter()
            .filter(|(_, mark)| **mark == Mark::AttackTarget)
            .map(|(cell, _)| *cell)
    }

    /// Reports whether the sweep found no reachable cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}
