//! Walkability grid owned by the floor.

use ark_descent_core::{CellCoord, CellState, GridView};

/// Dense row-major walkability grid with a mutation revision counter.
///
/// Traps flip individual cells at runtime; every effective change bumps the
/// revision so cached paths can be checked for staleness. Out-of-bounds
/// queries report blocking cells, never an error.
#[derive(Clone, Debug)]
pub struct GridMap {
    columns: u32,
    rows: u32,
    cell_size: u32,
    cells: Vec<CellState>,
    revision: u64,
}

impl GridMap {
    /// Builds a grid from plan data, padding missing cells as blocking.
    #[must_use]
    pub(crate) fn from_parts(
        columns: u32,
        rows: u32,
        cell_size: u32,
        mut cells: Vec<CellState>,
    ) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        cells.resize(capacity, CellState::Blocking);
        Self {
            columns,
            rows,
            cell_size: cell_size.max(1),
            cells,
            revision: 0,
        }
    }

    /// State of the provided cell; blocking when out of bounds.
    #[must_use]
    pub fn state(&self, cell: CellCoord) -> CellState {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(CellState::Blocking)
    }

    /// Reports whether the cell is open for traversal.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.state(cell) == CellState::Open
    }

    /// Sets the state of a cell, returning whether anything changed.
    ///
    /// Out-of-bounds writes are ignored. An effective change bumps the
    /// revision counter.
    pub(crate) fn set_cell_state(&mut self, cell: CellCoord, state: CellState) -> bool {
        let Some(index) = self.index(cell) else {
            return false;
        };
        let Some(slot) = self.cells.get_mut(index) else {
            return false;
        };
        if *slot == state {
            return false;
        }
        *slot = state;
        self.revision = self.revision.saturating_add(1);
        true
    }

    /// Captures a read-only view of the grid.
    #[must_use]
    pub fn view(&self) -> GridView<'_> {
        GridView::new(
            &self.cells,
            self.columns,
            self.rows,
            self.cell_size,
            self.revision,
        )
    }

    /// Provides the dimensions of the grid in cells.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Side length of a square cell in map units.
    #[must_use]
    pub const fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Mutation counter; differs whenever any cell changed state.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(columns: u32, rows: u32) -> GridMap {
        GridMap::from_parts(
            columns,
            rows,
            2,
            vec![CellState::Open; (columns * rows) as usize],
        )
    }

    #[test]
    fn out_of_bounds_queries_report_blocking() {
        let grid = open_grid(3, 3);
        assert!(grid.is_walkable(CellCoord::new(2, 2)));
        assert!(!grid.is_walkable(CellCoord::new(3, 0)));
        assert_eq!(grid.state(CellCoord::new(0, 99)), CellState::Blocking);
    }

    #[test]
    fn set_cell_state_bumps_revision_only_on_change() {
        let mut grid = open_grid(2, 2);
        let cell = CellCoord::new(1, 0);

        assert!(grid.set_cell_state(cell, CellState::Blocking));
        assert_eq!(grid.revision(), 1);
        assert!(!grid.set_cell_state(cell, CellState::Blocking));
        assert_eq!(grid.revision(), 1);
        assert!(grid.set_cell_state(cell, CellState::Open));
        assert_eq!(grid.revision(), 2);
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut grid = open_grid(2, 2);
        assert!(!grid.set_cell_state(CellCoord::new(9, 9), CellState::Blocking));
        assert_eq!(grid.revision(), 0);
    }

    #[test]
    fn short_plan_data_pads_as_blocking() {
        let grid = GridMap::from_parts(2, 2, 2, vec![CellState::Open]);
        assert!(grid.is_walkable(CellCoord::new(0, 0)));
        assert!(!grid.is_walkable(CellCoord::new(1, 1)));
    }
}
