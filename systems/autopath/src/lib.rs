#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic path planning system for player auto-movement.
//!
//! The planner answers path requests and invalidations with fresh
//! [`Command::AssignPath`] batches. Search is A* over the walkability grid
//! with octile costs and diagonal movement; ties break on
//! `(f, h, row, column, insertion order)` so the same grid and endpoints
//! always produce the same path. An unreachable goal is not an error: the
//! planner falls back to the reachable cell closest to the goal by heuristic
//! distance among everything the exhausted search frontier touched.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ark_descent_core::{CellCoord, Command, Event, GridView, PlayerSnapshot};

/// Cost of an orthogonal step, in tenths of a cell.
const ORTH_COST: u32 = 10;
/// Cost of a diagonal step, in tenths of a cell.
const DIAG_COST: u32 = 14;

/// Configuration parameters required to construct the autopath system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    actor_half_extent: f32,
}

impl Config {
    /// Creates a new configuration for an actor with the given square
    /// collider half-extent in map units.
    #[must_use]
    pub const fn new(actor_half_extent: f32) -> Self {
        Self { actor_half_extent }
    }
}

/// Pure system that reacts to path requests and invalidations.
#[derive(Clone, Copy, Debug)]
pub struct Autopath {
    config: Config,
}

impl Autopath {
    /// Creates a new autopath system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Consumes events and immutable views to emit path assignments.
    ///
    /// Requests plan from the cell recorded in the event; invalidations plan
    /// from wherever the player currently stands, because the player keeps
    /// walking the surviving prefix while the replacement is computed.
    pub fn handle(
        &mut self,
        events: &[Event],
        grid: &GridView<'_>,
        player: &PlayerSnapshot,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::AutoPathRequested { start, goal } => {
                    self.emit_plan(grid, *start, *goal, out);
                }
                Event::PathInvalidated { goal, .. } => {
                    self.emit_plan(grid, player.cell, *goal, out);
                }
                _ => {}
            }
        }
    }

    fn emit_plan(
        &self,
        grid: &GridView<'_>,
        start: CellCoord,
        goal: CellCoord,
        out: &mut Vec<Command>,
    ) {
        let clearance = clearance_radius(self.config.actor_half_extent, grid.cell_size());
        let outcome = plan(grid, start, goal, clearance);
        out.push(Command::AssignPath {
            path: outcome.path,
            goal,
        });
    }
}

/// Result of a planning run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanOutcome {
    /// Cells to walk, in order, excluding the start cell. Empty when the
    /// start already satisfies the request.
    pub path: Vec<CellCoord>,
    /// Whether the path ends on the requested goal rather than a fallback.
    pub reached_goal: bool,
}

/// Number of clearance cells required on each side of a cell so an actor
/// with the given half-extent fits through.
#[must_use]
pub fn clearance_radius(actor_half_extent: f32, cell_size: u32) -> u32 {
    let size = cell_size.max(1) as f32;
    let span_cells = ((actor_half_extent * 2.0) / size).ceil().max(1.0) as u32;
    (span_cells - 1) / 2
}

/// Plans a path across the grid using A* with octile costs.
///
/// Determinism contract: identical inputs yield identical output. The open
/// list orders by `(f, h, row, column, insertion)`, and the fallback cell is
/// the expanded cell minimizing `(h, row, column)`.
#[must_use]
pub fn plan(
    grid: &GridView<'_>,
    start: CellCoord,
    goal: CellCoord,
    clearance: u32,
) -> PlanOutcome {
    let (columns, rows) = grid.dimensions();
    let Some(node_count) = cell_count(columns, rows) else {
        return PlanOutcome {
            path: Vec::new(),
            reached_goal: false,
        };
    };
    if node_count == 0 || !has_clearance(grid, start, clearance) {
        return PlanOutcome {
            path: Vec::new(),
            reached_goal: false,
        };
    }
    if start == goal {
        return PlanOutcome {
            path: Vec::new(),
            reached_goal: true,
        };
    }

    let width = columns as usize;
    let mut best_g = vec![u32::MAX; node_count];
    let mut closed = vec![false; node_count];
    let mut parent: Vec<Option<usize>> = vec![None; node_count];
    let mut open = BinaryHeap::new();
    let mut insertion: u64 = 0;

    let start_index = index_of(width, start);
    best_g[start_index] = 0;
    open.push(OpenNode {
        f: heuristic(start, goal),
        h: heuristic(start, goal),
        cell: start,
        insertion,
    });

    // Best fallback among expanded cells, keyed by (h, row, column).
    let mut fallback = start;
    let mut fallback_h = heuristic(start, goal);

    while let Some(node) = open.pop() {
        let node_index = index_of(width, node.cell);
        if closed[node_index] {
            continue;
        }
        closed[node_index] = true;

        if node.cell == goal {
            return PlanOutcome {
                path: reconstruct(&parent, width, start_index, node_index),
                reached_goal: true,
            };
        }

        let node_h = heuristic(node.cell, goal);
        if (node_h, node.cell.row(), node.cell.column())
            < (fallback_h, fallback.row(), fallback.column())
        {
            fallback = node.cell;
            fallback_h = node_h;
        }

        let node_g = best_g[node_index];
        for (neighbor, step_cost) in neighbors(grid, node.cell, clearance) {
            let neighbor_index = index_of(width, neighbor);
            if closed[neighbor_index] {
                continue;
            }
            let tentative = node_g.saturating_add(step_cost);
            if tentative >= best_g[neighbor_index] {
                continue;
            }
            best_g[neighbor_index] = tentative;
            parent[neighbor_index] = Some(node_index);
            insertion = insertion.wrapping_add(1);
            let h = heuristic(neighbor, goal);
            open.push(OpenNode {
                f: tentative.saturating_add(h),
                h,
                cell: neighbor,
                insertion,
            });
        }
    }

    // Search exhausted without reaching the goal: walk to the closest cell
    // the frontier expanded instead.
    let fallback_index = index_of(width, fallback);
    PlanOutcome {
        path: reconstruct(&parent, width, start_index, fallback_index),
        reached_goal: false,
    }
}

/// Octile heuristic scaled to match the step costs.
#[must_use]
pub fn heuristic(a: CellCoord, b: CellCoord) -> u32 {
    let dx = a.column().abs_diff(b.column());
    let dy = a.row().abs_diff(b.row());
    DIAG_COST * dx.min(dy) + ORTH_COST * (dx.max(dy) - dx.min(dy))
}

fn cell_count(columns: u32, rows: u32) -> Option<usize> {
    usize::try_from(u64::from(columns) * u64::from(rows)).ok()
}

fn index_of(width: usize, cell: CellCoord) -> usize {
    cell.row() as usize * width + cell.column() as usize
}

/// Reports whether the cell and its clearance neighborhood are all open.
fn has_clearance(grid: &GridView<'_>, cell: CellCoord, clearance: u32) -> bool {
    let radius = clearance as i32;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            match cell.offset(dx, dy) {
                Some(probe) if grid.is_walkable(probe) => {}
                _ => return false,
            }
        }
    }
    true
}

fn neighbors<'g>(
    grid: &'g GridView<'g>,
    cell: CellCoord,
    clearance: u32,
) -> impl Iterator<Item = (CellCoord, u32)> + 'g {
    const DIRECTIONS: [(i32, i32, u32); 8] = [
        (1, 0, ORTH_COST),
        (-1, 0, ORTH_COST),
        (0, 1, ORTH_COST),
        (0, -1, ORTH_COST),
        (1, 1, DIAG_COST),
        (-1, 1, DIAG_COST),
        (1, -1, DIAG_COST),
        (-1, -1, DIAG_COST),
    ];

    DIRECTIONS.into_iter().filter_map(move |(dx, dy, cost)| {
        let neighbor = cell.offset(dx, dy)?;
        if !grid.is_walkable(neighbor) {
            return None;
        }
        if !has_clearance(grid, neighbor, clearance) {
            return None;
        }
        if dx != 0 && dy != 0 {
            // A diagonal step may not cut a corner: both orthogonally
            // adjacent cells must be open.
            let across_column = cell.offset(dx, 0)?;
            let across_row = cell.offset(0, dy)?;
            if !grid.is_walkable(across_column) || !grid.is_walkable(across_row) {
                return None;
            }
        }
        Some((neighbor, cost))
    })
}

fn reconstruct(
    parent: &[Option<usize>],
    width: usize,
    start_index: usize,
    end_index: usize,
) -> Vec<CellCoord> {
    let mut indices = vec![end_index];
    let mut cursor = end_index;
    while cursor != start_index {
        let Some(Some(previous)) = parent.get(cursor).copied() else {
            return Vec::new();
        };
        cursor = previous;
        indices.push(cursor);
    }
    indices.reverse();
    indices
        .into_iter()
        .skip(1)
        .map(|index| CellCoord::new((index % width) as u32, (index / width) as u32))
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenNode {
    f: u32,
    h: u32,
    cell: CellCoord,
    insertion: u64,
}

impl OpenNode {
    fn key(&self) -> (u32, u32, u32, u32, u64) {
        (
            self.f,
            self.h,
            self.cell.row(),
            self.cell.column(),
            self.insertion,
        )
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the binary heap pops the smallest key first.
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
