//! Battlefield cell payload stored inside the world's grid.

use grid_tactics_core::UnitId;

use crate::grid::Walkable;

/// State tracked for a single battlefield cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    walkable: bool,
    occupant: Option<UnitId>,
    value: f32,
}

impl Cell {
    /// Creates an open floor cell without occupant.
    #[must_use]
    pub const fn floor() -> Self {
        Self {
            walkable: true,
            occupant: None,
            value: 0.0,
        }
    }

    /// Creates a wall cell that units can neither enter nor path through.
    #[must_use]
    pub const fn wall() -> Self {
        Self {
            walkable: false,
            occupant: None,
            value: 0.0,
        }
    }

    /// Reports whether units may enter the cell.
    #[must_use]
    pub const fn walkable(&self) -> bool {
        self.walkable
    }

    /// Unit currently standing on the cell, if any.
    #[must_use]
    pub const fn occupant(&self) -> Option<UnitId> {
        self.occupant
    }

    /// Arbitrary payload value assigned to the cell.
    #[must_use]
    pub const fn value(&self) -> f32 {
        self.value
    }

    pub(crate) fn set_walkable(&mut self, walkable: bool) {
        self.walkable = walkable;
    }

    pub(crate) fn set_value(&mut self, value: f32) {
        self.value = value;
    }

    pub(crate) fn set_occupant(&mut self, occupant: Option<UnitId>) {
        self.occupant = occupant;
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::floor()
    }
}

impl Walkable for Cell {
    fn is_walkable(&self) -> bool {
        self.walkable
    }
}
