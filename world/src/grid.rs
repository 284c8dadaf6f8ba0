//! Generic fixed-size grid container shared by the world and its systems.

use glam::Vec2;
use grid_tactics_core::CellCoord;

/// Payloads that can tell the pathfinder whether a unit may stand on them.
pub trait Walkable {
    /// Reports whether units may enter the cell.
    fn is_walkable(&self) -> bool;
}

/// Dense two-dimensional container mapping cell coordinates to payloads.
///
/// Payloads are stored in row-major order and created by a factory when the
/// grid is built. The grid also knows how it is laid out in world space so
/// callers can convert between pointer positions and cells. Mutations made
/// through [`GridMap::set`] and [`GridMap::update`] are recorded and later
/// drained by the world into change notifications.
#[derive(Clone, Debug)]
pub struct GridMap<T> {
    columns: u32,
    rows: u32,
    cell_size: f32,
    origin: Vec2,
    cells: Vec<T>,
    changes: Vec<CellCoord>,
}

impl<T> GridMap<T> {
    /// Creates a grid with the provided layout, filling every cell via `factory`.
    #[must_use]
    pub fn new<F>(columns: u32, rows: u32, cell_size: f32, origin: Vec2, mut factory: F) -> Self
    where
        F: FnMut(CellCoord) -> T,
    {
        let capacity = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        let mut cells = Vec::with_capacity(capacity);
        for row in 0..rows {
            for column in 0..columns {
                cells.push(factory(CellCoord::new(column, row)));
            }
        }

        Self {
            columns,
            rows,
            cell_size,
            origin,
            cells,
            changes: Vec::new(),
        }
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

    /// Side length of a single square cell expressed in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World-space position of the grid's lower corner.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Total number of cells stored by the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Row-major storage index of the cell, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }

        let column = usize::try_from(cell.column()).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Coordinate stored at the provided row-major index.
    #[must_use]
    pub fn cell_at(&self, index: usize) -> Option<CellCoord> {
        if index >= self.cells.len() {
            return None;
        }

        let width = usize::try_from(self.columns).ok()?;
        let column = u32::try_from(index % width).ok()?;
        let row = u32::try_from(index / width).ok()?;
        Some(CellCoord::new(column, row))
    }

    /// Payload stored at the provided cell.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<&T> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    /// Mutable payload stored at the provided cell.
    ///
    /// Changes made through this accessor are not recorded.
    pub fn get_mut(&mut self, cell: CellCoord) -> Option<&mut T> {
        let index = self.index(cell)?;
        self.cells.get_mut(index)
    }

    /// Replaces the payload stored at the provided cell.
    ///
    /// Returns `false` when the cell lies outside the grid.
    pub fn set(&mut self, cell: CellCoord, value: T) -> bool {
        let Some(slot) = self.get_mut(cell) else {
            return false;
        };
        *slot = value;
        self.notify_changed(cell);
        true
    }

    /// Mutates the payload stored at the provided cell in place.
    ///
    /// Returns `false` when the cell lies outside the grid.
    pub fn update<F>(&mut self, cell: CellCoord, mutate: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let Some(slot) = self.get_mut(cell) else {
            return false;
        };
        mutate(slot);
        self.notify_changed(cell);
        true
    }

    /// Records that the payload of the provided cell changed.
    pub fn notify_changed(&mut self, cell: CellCoord) {
        if self.contains(cell) && !self.changes.contains(&cell) {
            self.changes.push(cell);
        }
    }

    /// Drains the cells recorded as changed since the previous drain.
    pub fn drain_changes(&mut self) -> Vec<CellCoord> {
        std::mem::take(&mut self.changes)
    }

    /// Converts a world-space position into the cell containing it.
    #[must_use]
    pub fn world_to_cell(&self, point: Vec2) -> Option<CellCoord> {
        if self.cell_size <= 0.0 {
            return None;
        }

        let local = ((point - self.origin) / self.cell_size).floor();
        if !local.is_finite() {
            return None;
        }
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }

        let cell = CellCoord::new(local.x as u32, local.y as u32);
        self.contains(cell).then_some(cell)
    }

    /// World-space position of the cell's lower corner.
    #[must_use]
    pub fn cell_to_world(&self, cell: CellCoord) -> Vec2 {
        self.origin + Vec2::new(cell.column() as f32, cell.row() as f32) * self.cell_size
    }

    /// World-space position of the cell's centre.
    #[must_use]
    pub fn cell_center_to_world(&self, cell: CellCoord) -> Vec2 {
        self.cell_to_world(cell) + Vec2::splat(self.cell_size * 0.5)
    }

    /// Finds the first cell, in row-major order, whose payload matches.
    #[must_use]
    pub fn locate<P>(&self, mut predicate: P) -> Option<CellCoord>
    where
        P: FnMut(&T) -> bool,
    {
        let index = self.cells.iter().position(|value| predicate(value))?;
        self.cell_at(index)
    }

    /// Iterates over every cell and its payload in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, &T)> + '_ {
        let columns = self.columns.max(1);
        (0_u32..).zip(self.cells.iter()).map(move |(index, value)| {
            (CellCoord::new(index % columns, index / columns), value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(columns: u32, rows: u32) -> GridMap<u32> {
        GridMap::new(columns, rows, 2.0, Vec2::new(10.0, -4.0), |cell| {
            cell.row() * columns + cell.column()
        })
    }

    #[test]
    fn factory_fills_cells_in_row_major_order() {
        let grid = numbered(3, 2);

        assert_eq!(grid.get(CellCoord::new(2, 0)), Some(&2));
        assert_eq!(grid.get(CellCoord::new(0, 1)), Some(&3));
        let order: Vec<_> = grid.iter().map(|(cell, value)| (cell, *value)).collect();
        assert_eq!(order[4], (CellCoord::new(1, 1), 4));
        assert_eq!(order.len(), 6);
    }

    #[test]
    fn out_of_range_access_yields_none() {
        let mut grid = numbered(3, 2);

        assert!(grid.get(CellCoord::new(3, 0)).is_none());
        assert!(grid.get(CellCoord::new(0, 2)).is_none());
        assert!(!grid.set(CellCoord::new(5, 5), 9));
        assert!(grid.drain_changes().is_empty());
    }

    #[test]
    fn mutations_record_each_cell_once() {
        let mut grid = numbered(3, 2);

        assert!(grid.set(CellCoord::new(1, 1), 40));
        assert!(grid.update(CellCoord::new(1, 1), |value| *value += 1));
        assert!(grid.update(CellCoord::new(0, 0), |value| *value = 7));

        assert_eq!(grid.get(CellCoord::new(1, 1)), Some(&41));
        assert_eq!(
            grid.drain_changes(),
            vec![CellCoord::new(1, 1), CellCoord::new(0, 0)]
        );
        assert!(grid.drain_changes().is_empty());
    }

    #[test]
    fn get_mut_does_not_record_changes() {
        let mut grid = numbered(2, 2);

        if let Some(value) = grid.get_mut(CellCoord::new(1, 0)) {
            *value = 99;
        }

        assert_eq!(grid.get(CellCoord::new(1, 0)), Some(&99));
        assert!(grid.drain_changes().is_empty());
    }

    #[test]
    fn world_positions_round_trip_through_cells() {
        let grid = numbered(4, 3);
        let cell = CellCoord::new(3, 2);

        assert_eq!(grid.cell_to_world(cell), Vec2::new(16.0, 0.0));
        assert_eq!(grid.cell_center_to_world(cell), Vec2::new(17.0, 1.0));
        assert_eq!(grid.world_to_cell(grid.cell_center_to_world(cell)), Some(cell));
        assert_eq!(grid.world_to_cell(Vec2::new(9.9, -4.0)), None);
        assert_eq!(grid.world_to_cell(Vec2::new(18.0, 0.0)), None);
    }

    #[test]
    fn non_finite_positions_have_no_cell() {
        let grid = numbered(4, 3);

        assert_eq!(grid.world_to_cell(Vec2::new(f32::NAN, 0.0)), None);
        assert_eq!(grid.world_to_cell(Vec2::new(12.0, f32::NAN)), None);
        assert_eq!(grid.world_to_cell(Vec2::new(f32::INFINITY, 0.0)), None);
    }

    #[test]
    fn locate_returns_first_match() {
        let grid = numbered(3, 3);

        assert_eq!(grid.locate(|value| *value % 4 == 3), Some(CellCoord::new(0, 1)));
        assert_eq!(grid.locate(|value| *value > 100), None);
    }
}
