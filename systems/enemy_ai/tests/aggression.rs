use std::time::Duration;

use ark_descent_core::{
    tuning::EnemyTuning, CellCoord, CellState, Command, EnemyPhase, Event, FloorId, FloorPlan,
    MapPoint, Tuning,
};
use ark_descent_system_enemy_ai::{Config, EnemyAi};
use ark_descent_world::{self as world, query, Floor};

const DT: Duration = Duration::from_millis(100);

fn arena_plan(enemy_cell: CellCoord) -> FloorPlan {
    let columns = 20;
    let rows = 20;
    FloorPlan {
        floor: FloorId::new(35),
        columns,
        rows,
        cell_size: 10,
        cells: vec![CellState::Open; (columns * rows) as usize],
        spawn: MapPoint::new(100.0, 100.0),
        triggers: Vec::new(),
        traps: Vec::new(),
        enemy_spawns: vec![enemy_cell],
        briefing_lines: 0,
        tuning: Tuning {
            enemy: EnemyTuning {
                aggro_radius: 60.0,
                lose_interest_radius: 90.0,
                strike_range: 30.0,
                speed: 0.0,
                windup_secs: 0.3,
                ..EnemyTuning::default()
            },
            ..Tuning::default()
        },
    }
}

/// Applies one tick and routes the resulting events through the AI exactly
/// the way the floor controller does, within the same tick.
fn tick_with_ai(floor: &mut Floor, ai: &mut EnemyAi) -> Vec<Event> {
    let mut log = Vec::new();
    let mut events = Vec::new();
    world::apply(floor, Command::Tick { dt: DT }, &mut events);
    log.extend(events.iter().cloned());

    for _ in 0..4 {
        let enemies = query::enemy_view(floor);
        let player = query::player_snapshot(floor);
        let mut commands = Vec::new();
        ai.handle(&events, &enemies, &player, &mut commands);
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

fn enemy_phase(floor: &Floor) -> EnemyPhase {
    query::enemy_view(floor)
        .into_vec()
        .first()
        .expect("enemy present")
        .phase
}

#[test]
fn enemy_alerts_within_the_tick_the_player_is_in_range() {
    // Spawn cell (5, 10) centers the enemy at (55, 105): exactly 45.3 units
    // from the player spawn, inside the 60-unit aggro radius.
    let mut floor = Floor::new(arena_plan(CellCoord::new(5, 10)));
    let mut ai = EnemyAi::new(Config::new(60.0, 90.0, 30.0));

    let log = tick_with_ai(&mut floor, &mut ai);

    assert!(log.iter().any(|event| matches!(
        event,
        Event::EnemyPhaseChanged {
            phase: EnemyPhase::Alert,
            ..
        }
    )));
    assert_eq!(enemy_phase(&floor), EnemyPhase::Alert);
}

#[test]
fn windup_survives_the_player_leaving_range() {
    // Enemy adjacent to the player: alert and strike-ready immediately.
    let mut floor = Floor::new(arena_plan(CellCoord::new(11, 10)));
    let mut ai = EnemyAi::new(Config::new(60.0, 90.0, 30.0));

    let log = tick_with_ai(&mut floor, &mut ai);
    assert!(
        log.iter().any(|event| matches!(
            event,
            Event::EnemyPhaseChanged {
                phase: EnemyPhase::Windup,
                ..
            }
        )),
        "enemy in strike range should commit to a windup"
    );

    // The player sprints away mid-windup. The commitment holds: the enemy
    // stays in windup, the strike frame still executes on schedule, and it
    // simply fails to connect.
    let mut steer = Vec::new();
    world::apply(
        &mut floor,
        Command::Steer {
            input: ark_descent_core::MoveInput {
                left: true,
                right: false,
                up: false,
                down: false,
            },
        },
        &mut steer,
    );

    let mut strike = None;
    for _ in 0..5 {
        let log = tick_with_ai(&mut floor, &mut ai);
        assert!(
            !log.iter().any(|event| matches!(
                event,
                Event::EnemyPhaseChanged {
                    phase: EnemyPhase::Idle,
                    ..
                }
            )),
            "windup must not be interrupted"
        );
        if let Some(Event::EnemyStruck { connected, .. }) = log
            .iter()
            .find(|event| matches!(event, Event::EnemyStruck { .. }))
        {
            strike = Some(*connected);
            break;
        }
    }
    match strike {
        Some(connected) => assert!(!connected, "player left range; strike must whiff"),
        None => panic!("the committed strike never executed"),
    }
}
