//! Sub-stepped collision resolution against the walkability grid.
//!
//! Desired movement is cut into sub-steps short enough that no single step
//! exceeds half a cell, which keeps fast entities from tunneling through
//! one-cell walls. Each axis is applied and tested independently so entities
//! slide along walls instead of sticking to them.

use ark_descent_core::{MapPoint, MapVec};

use crate::grid::GridMap;

/// Shrink applied to the trailing edge of the collider when sampling cells,
/// so a collider flush against a cell boundary does not read the next cell.
const EDGE_EPSILON: f32 = 1e-3;

/// Result of a resolved move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct MoveOutcome {
    /// Position after the move.
    pub(crate) position: MapPoint,
    /// Delta that was actually applied.
    pub(crate) applied: MapVec,
}

/// Moves a square collider through the grid, clamping against blocking cells.
///
/// An axis is cancelled for the remainder of the move on first contact. If
/// the collider already overlaps a blocking cell when the move starts (a trap
/// closed on top of it), collision tests are skipped for this move so the
/// entity can escape.
pub(crate) fn move_collider(
    grid: &GridMap,
    position: MapPoint,
    half_extent: f32,
    desired: MapVec,
) -> MoveOutcome {
    let longest = desired.x().abs().max(desired.y().abs());
    if longest <= f32::EPSILON {
        return MoveOutcome {
            position,
            applied: MapVec::ZERO,
        };
    }

    let start_blocked = overlaps_blocking(grid, position, half_extent);
    let half_cell = grid.cell_size() as f32 / 2.0;
    let steps = (longest / half_cell).ceil().max(1.0) as u32;
    let step_x = desired.x() / steps as f32;
    let step_y = desired.y() / steps as f32;

    let mut current = position;
    let mut x_alive = step_x != 0.0;
    let mut y_alive = step_y != 0.0;

    for _ in 0..steps {
        if x_alive {
            let candidate = MapPoint::new(current.x() + step_x, current.y());
            if start_blocked || !overlaps_blocking(grid, candidate, half_extent) {
                current = candidate;
            } else {
                x_alive = false;
            }
        }
        if y_alive {
            let candidate = MapPoint::new(current.x(), current.y() + step_y);
            if start_blocked || !overlaps_blocking(grid, candidate, half_extent) {
                current = candidate;
            } else {
                y_alive = false;
            }
        }
        if !x_alive && !y_alive {
            break;
        }
    }

    MoveOutcome {
        position: current,
        applied: position.vector_to(current),
    }
}

/// Reports whether a square collider centered at `center` overlaps any
/// blocking cell or pokes outside the grid.
pub(crate) fn overlaps_blocking(grid: &GridMap, center: MapPoint, half_extent: f32) -> bool {
    let (columns, rows) = grid.dimensions();
    let size = grid.cell_size() as f32;
    let min_x = center.x() - half_extent;
    let min_y = center.y() - half_extent;
    let max_x = center.x() + half_extent - EDGE_EPSILON;
    let max_y = center.y() + half_extent - EDGE_EPSILON;

    if min_x < 0.0 || min_y < 0.0 {
        return true;
    }
    if max_x >= columns as f32 * size || max_y >= rows as f32 * size {
        return true;
    }

    let first_column = (min_x / size).floor() as u32;
    let last_column = (max_x / size).floor() as u32;
    let first_row = (min_y / size).floor() as u32;
    let last_row = (max_y / size).floor() as u32;

    for row in first_row..=last_row {
        for column in first_column..=last_column {
            if !grid.is_walkable(ark_descent_core::CellCoord::new(column, row)) {
                return true;
            }
        }
    }
    false
}
