use std::time::Duration;

use ark_descent_core::{
    tuning::PlayerTuning, CellCoord, CellState, Command, Event, FloorId, FloorPlan, MapPoint,
    TrapSchedule, TrapSpec, Tuning,
};
use ark_descent_system_autopath::{Autopath, Config};
use ark_descent_world::{self as world, query, Floor};

const DT: Duration = Duration::from_millis(100);

fn plan_with_trap() -> FloorPlan {
    // Single corridor row at row 2; the trap collapses the corridor cell
    // (4, 2) shortly after the run starts, forcing a detour through row 0.
    let columns = 8;
    let rows = 5;
    let mut cells = vec![CellState::Open; (columns * rows) as usize];
    for column in 0..columns {
        if column != 4 {
            cells[(1 * columns + column) as usize] = CellState::Blocking;
            cells[(3 * columns + column) as usize] = CellState::Blocking;
        }
    }
    FloorPlan {
        floor: FloorId::new(35),
        columns,
        rows,
        cell_size: 10,
        cells,
        spawn: MapPoint::new(5.0, 25.0),
        triggers: Vec::new(),
        traps: vec![TrapSpec {
            cells: vec![CellCoord::new(4, 2)],
            schedule: TrapSchedule::Collapse { after_secs: 0.05 },
        }],
        enemy_spawns: Vec::new(),
        briefing_lines: 0,
        tuning: Tuning {
            player: PlayerTuning {
                collider_half_extent: 4.0,
                speed: 40.0,
                ..PlayerTuning::default()
            },
            ..Tuning::default()
        },
    }
}

fn pump(floor: &mut Floor, autopath: &mut Autopath, mut events: Vec<Event>) -> Vec<Event> {
    let mut log = events.clone();
    for _ in 0..8 {
        if events.is_empty() {
            break;
        }
        let grid = query::grid_view(floor);
        let player = query::player_snapshot(floor);
        let mut commands = Vec::new();
        autopath.handle(&events, &grid, &player, &mut commands);
        drop(grid);
        if commands.is_empty() {
            break;
        }
        events.clear();
        for command in commands {
            let mut generated = Vec::new();
            world::apply(floor, command, &mut generated);
            log.extend(generated.iter().cloned());
            events.extend(generated);
        }
    }
    log
}

#[test]
fn trap_collapse_triggers_replan_that_avoids_the_cell() {
    let mut floor = Floor::new(plan_with_trap());
    let mut autopath = Autopath::new(Config::new(4.0));

    let goal = CellCoord::new(7, 2);
    let mut events = Vec::new();
    world::apply(&mut floor, Command::AutoPathTo { goal }, &mut events);
    let log = pump(&mut floor, &mut autopath, events);
    assert!(log
        .iter()
        .any(|event| matches!(event, Event::PathAssigned { .. })));

    // The first plan runs straight down the corridor through (4, 2).
    let mut saw_invalidation = false;
    let mut replanned = false;
    for _ in 0..200 {
        let mut tick_events = Vec::new();
        world::apply(&mut floor, Command::Tick { dt: DT }, &mut tick_events);
        let log = pump(&mut floor, &mut autopath, tick_events);

        for event in &log {
            if let Event::PathInvalidated { blocked, .. } = event {
                assert_eq!(*blocked, CellCoord::new(4, 2));
                saw_invalidation = true;
            }
            if saw_invalidation {
                if let Event::PathAssigned { .. } = event {
                    replanned = true;
                }
            }
        }
        if replanned {
            break;
        }
    }

    assert!(saw_invalidation, "trap collapse never invalidated the path");
    assert!(replanned, "no replacement path was planned");

    // The replacement path must avoid the collapsed cell.
    let snapshot = query::player_snapshot(&floor);
    assert!(snapshot.path_goal.is_some());
    let grid = query::grid_view(&floor);
    assert!(!grid.is_walkable(CellCoord::new(4, 2)));
}

#[test]
fn unreachable_goal_still_produces_a_walkable_plan() {
    let mut floor = Floor::new(plan_with_trap());
    let mut autopath = Autopath::new(Config::new(4.0));

    // Let the trap collapse first so the corridor is sealed, then ask for a
    // goal behind it while the detour rows stay open only near the seam.
    for _ in 0..2 {
        let mut tick_events = Vec::new();
        world::apply(&mut floor, Command::Tick { dt: DT }, &mut tick_events);
        let _ = pump(&mut floor, &mut autopath, tick_events);
    }

    let goal = CellCoord::new(4, 2);
    let mut events = Vec::new();
    world::apply(&mut floor, Command::AutoPathTo { goal }, &mut events);
    let log = pump(&mut floor, &mut autopath, events);

    // The goal cell itself is now blocking; planning must degrade to the
    // nearest reachable cell instead of erroring out.
    assert!(log.iter().any(|event| matches!(
        event,
        Event::PathAssigned { .. } | Event::PathCompleted { .. }
    )));
}
