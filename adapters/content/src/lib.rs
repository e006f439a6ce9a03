#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Content adapter: turns floor documents and tuning files into validated
//! plans.
//!
//! The simulation crates never read files; everything enters through this
//! adapter. Floor documents are JSON (walkability grid, spawn, trigger
//! zones, traps, enemy markers), tuning overlays are TOML with a default for
//! every field, and enemy markers are scattered into concrete spawn cells
//! deterministically from a per-floor seed.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use ark_descent_core::{
    CellCoord, CellState, FloorId, FloorPlan, MapPoint, MapRect, TrapSchedule, TrapSpec,
    TriggerId, TriggerKind, TriggerZone, Tuning,
};

/// Farthest cell distance an enemy may scatter from its marker.
const SCATTER_MAX_DISTANCE: u32 = 36;
/// Domain separator mixed into every per-floor scatter seed.
const SCATTER_SEED_DOMAIN: &[u8] = b"ark-descent/enemy-scatter";

/// Failures the content adapter can report.
///
/// These are the only fatal conditions in the workspace; the simulation
/// crates degrade gracefully instead of erroring.
#[derive(Debug, Error)]
pub enum ContentError {
    /// Reading the file from disk failed.
    #[error("failed to read {path}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The floor document was not valid JSON for the expected shape.
    #[error("malformed floor document {path}")]
    MalformedFloor {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// The tuning document was not valid TOML for the expected shape.
    #[error("malformed tuning document {path}")]
    MalformedTuning {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: toml::de::Error,
    },
    /// The collision grid held no rows or no columns.
    #[error("collision grid is empty")]
    EmptyGrid,
    /// One grid row disagreed with the width of the first row.
    #[error("collision grid row {row} has {found} cells, expected {expected}")]
    RaggedGrid {
        /// Index of the offending row.
        row: usize,
        /// Width taken from the first row.
        expected: usize,
        /// Width found on the offending row.
        found: usize,
    },
    /// The cell size must be a positive number of map units.
    #[error("cell size must be positive")]
    ZeroCellSize,
    /// A trigger used a type string this adapter does not know.
    #[error("trigger {id} has unrecognized type {kind:?}")]
    UnknownTriggerKind {
        /// Identifier of the trigger.
        id: String,
        /// Offending type string.
        kind: String,
    },
    /// An exit trigger did not name a destination floor.
    #[error("exit trigger {id} is missing its destination floor")]
    ExitWithoutDestination {
        /// Identifier of the trigger.
        id: String,
    },
}

#[derive(Debug, Deserialize)]
struct FloorDoc {
    floor: u16,
    cell_size: u32,
    collision_grid: Vec<Vec<u8>>,
    spawn: SpawnDoc,
    #[serde(default)]
    triggers: Vec<TriggerDoc>,
    #[serde(default)]
    enemies: Vec<EnemyMarkerDoc>,
    #[serde(default)]
    traps: Vec<TrapDoc>,
    #[serde(default)]
    briefing_lines: usize,
    /// Visual asset reference carried through for the presentation layer.
    #[serde(default)]
    #[allow(dead_code)]
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpawnDoc {
    player: [f32; 2],
}

#[derive(Debug, Deserialize)]
struct TriggerDoc {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    rect: [f32; 4],
    #[serde(default)]
    to_floor: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct EnemyMarkerDoc {
    marker: [u32; 2],
    #[serde(default = "default_marker_count")]
    count: u32,
}

fn default_marker_count() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct TrapDoc {
    cells: Vec<[u32; 2]>,
    schedule: TrapScheduleDoc,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TrapScheduleDoc {
    Collapse {
        after_secs: f32,
    },
    Periodic {
        open_secs: f32,
        closed_secs: f32,
        #[serde(default)]
        start_closed: bool,
    },
}

/// Loads a floor document from disk and validates it into a plan.
pub fn load_map(path: &Path, tuning: Tuning) -> Result<FloorPlan, ContentError> {
    let text = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: FloorDoc =
        serde_json::from_str(&text).map_err(|source| ContentError::MalformedFloor {
            path: path.to_path_buf(),
            source,
        })?;
    plan_from_doc(doc, tuning)
}

/// Loads a tuning overlay from disk; absent fields keep their defaults.
pub fn load_tuning(path: &Path) -> Result<Tuning, ContentError> {
    let text = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ContentError::MalformedTuning {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses a floor document from JSON text; used by tests and embedders.
pub fn plan_from_json(text: &str, tuning: Tuning) -> Result<FloorPlan, ContentError> {
    let doc: FloorDoc =
        serde_json::from_str(text).map_err(|source| ContentError::MalformedFloor {
            path: PathBuf::from("<inline>"),
            source,
        })?;
    plan_from_doc(doc, tuning)
}

fn plan_from_doc(doc: FloorDoc, tuning: Tuning) -> Result<FloorPlan, ContentError> {
    if doc.cell_size == 0 {
        return Err(ContentError::ZeroCellSize);
    }
    let rows = doc.collision_grid.len();
    let columns = doc.collision_grid.first().map_or(0, Vec::len);
    if rows == 0 || columns == 0 {
        return Err(ContentError::EmptyGrid);
    }

    let mut cells = Vec::with_capacity(rows * columns);
    for (row_index, row) in doc.collision_grid.iter().enumerate() {
        if row.len() != columns {
            return Err(ContentError::RaggedGrid {
                row: row_index,
                expected: columns,
                found: row.len(),
            });
        }
        // Code zero is walkable ground; everything else blocks.
        cells.extend(row.iter().map(|&code| {
            if code == 0 {
                CellState::Open
            } else {
                CellState::Blocking
            }
        }));
    }

    let mut triggers = Vec::with_capacity(doc.triggers.len());
    for trigger in doc.triggers {
        let kind = match trigger.kind.as_str() {
            "exit" => {
                let Some(level) = trigger.to_floor else {
                    return Err(ContentError::ExitWithoutDestination { id: trigger.id });
                };
                TriggerKind::Exit {
                    to_floor: FloorId::new(level),
                }
            }
            "terminal" => TriggerKind::Terminal,
            "frame" => TriggerKind::Frame,
            "switch" => TriggerKind::Switch,
            "npc" => TriggerKind::Npc,
            _ => {
                return Err(ContentError::UnknownTriggerKind {
                    id: trigger.id,
                    kind: trigger.kind,
                })
            }
        };
        let [x1, y1, x2, y2] = trigger.rect;
        triggers.push(TriggerZone {
            id: TriggerId::new(trigger.id),
            kind,
            region: MapRect::from_corners(x1, y1, x2, y2),
        });
    }

    let traps = doc
        .traps
        .into_iter()
        .map(|trap| TrapSpec {
            cells: trap
                .cells
                .into_iter()
                .map(|[column, row]| CellCoord::new(column, row))
                .collect(),
            schedule: match trap.schedule {
                TrapScheduleDoc::Collapse { after_secs } => TrapSchedule::Collapse { after_secs },
                TrapScheduleDoc::Periodic {
                    open_secs,
                    closed_secs,
                    start_closed,
                } => TrapSchedule::Periodic {
                    open_secs,
                    closed_secs,
                    start_closed,
                },
            },
        })
        .collect();

    let floor = FloorId::new(doc.floor);
    let columns = columns as u32;
    let rows = rows as u32;
    let enemy_spawns = scatter_enemy_spawns(&cells, columns, rows, &doc.enemies, floor);

    Ok(FloorPlan {
        floor,
        columns,
        rows,
        cell_size: doc.cell_size,
        cells,
        spawn: MapPoint::new(doc.spawn.player[0], doc.spawn.player[1]),
        triggers,
        traps,
        enemy_spawns,
        briefing_lines: doc.briefing_lines,
        tuning,
    })
}

/// Scatters enemy markers into concrete spawn cells.
///
/// Candidates come from a bounded breadth-first walk over open cells around
/// each marker; the pick among candidates uses a ChaCha stream seeded from
/// the floor id, so a floor always spawns the same layout while different
/// floors differ.
fn scatter_enemy_spawns(
    cells: &[CellState],
    columns: u32,
    rows: u32,
    markers: &[EnemyMarkerDoc],
    floor: FloorId,
) -> Vec<CellCoord> {
    let mut rng = ChaCha20Rng::from_seed(scatter_seed(floor));
    let mut spawns = Vec::new();
    let mut taken = vec![false; cells.len()];

    for marker_doc in markers {
        let marker = CellCoord::new(marker_doc.marker[0], marker_doc.marker[1]);
        let mut candidates = reachable_cells(cells, columns, rows, marker);
        candidates.retain(|cell| !taken[cell_index(columns, *cell)]);
        let count = marker_doc.count as usize;
        for cell in candidates.choose_multiple(&mut rng, count) {
            taken[cell_index(columns, *cell)] = true;
            spawns.push(*cell);
        }
    }
    spawns
}

fn scatter_seed(floor: FloorId) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(SCATTER_SEED_DOMAIN);
    hasher.update(floor.level().to_le_bytes());
    hasher.finalize().into()
}

fn cell_index(columns: u32, cell: CellCoord) -> usize {
    (cell.row() * columns + cell.column()) as usize
}

fn is_open(cells: &[CellState], columns: u32, rows: u32, cell: CellCoord) -> bool {
    cell.column() < columns
        && cell.row() < rows
        && cells[cell_index(columns, cell)] == CellState::Open
}

/// Open cells within the scatter distance of the marker, in breadth-first
/// discovery order.
fn reachable_cells(
    cells: &[CellState],
    columns: u32,
    rows: u32,
    marker: CellCoord,
) -> Vec<CellCoord> {
    if !is_open(cells, columns, rows, marker) {
        return Vec::new();
    }

    let mut visited = vec![false; cells.len()];
    let mut queue = VecDeque::new();
    let mut found = Vec::new();
    visited[cell_index(columns, marker)] = true;
    queue.push_back((marker, 0u32));

    while let Some((cell, depth)) = queue.pop_front() {
        found.push(cell);
        if depth == SCATTER_MAX_DISTANCE {
            continue;
        }
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let Some(neighbor) = cell.offset(dx, dy) else {
                continue;
            };
            if !is_open(cells, columns, rows, neighbor) {
                continue;
            }
            let index = cell_index(columns, neighbor);
            if visited[index] {
                continue;
            }
            visited[index] = true;
            queue.push_back((neighbor, depth + 1));
        }
    }
    found
}
