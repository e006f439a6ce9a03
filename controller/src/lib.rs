#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Floor controller composing the authoritative floor with its systems.
//!
//! The controller owns one [`Floor`] plus the autopath and enemy AI systems,
//! translates raw input intents into commands, and runs the fixed-timestep
//! tick: intents first, then the clock advance, then system command batches
//! pumped back into the floor until everything settles. It is the explicit
//! per-floor context object: created on floor load, dropped on floor exit,
//! with no ambient state anywhere.

use std::time::Duration;

use ark_descent_core::{CellCoord, Command, Event, FloorPlan, MapVec, MoveInput};
use ark_descent_system_autopath::{Autopath, Config as AutopathConfig};
use ark_descent_system_enemy_ai::{Config as EnemyAiConfig, EnemyAi};
use ark_descent_world::{apply, query, Floor};

/// Ceiling on system/floor round-trips within one tick; systems converge in
/// one or two rounds, so hitting this indicates a feedback loop.
const MAX_PUMP_ROUNDS: usize = 8;

/// Discrete input intents gathered by the external input layer for one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Intents {
    /// Held directional keys.
    pub steer: MoveInput,
    /// Cell the player right-clicked, if any.
    pub autopath_to: Option<CellCoord>,
    /// Aim vector of a fire request, if any.
    pub fire: Option<MapVec>,
    /// Whether a reload was requested.
    pub reload: bool,
    /// Whether the interact key was pressed.
    pub interact: bool,
    /// Whether the confirm key advanced the briefing.
    pub confirm: bool,
}

/// Composes one floor instance with its systems and drives the tick loop.
#[derive(Debug)]
pub struct FloorController {
    floor: Floor,
    autopath: Autopath,
    enemy_ai: EnemyAi,
}

impl FloorController {
    /// Builds a controller for the provided floor plan.
    #[must_use]
    pub fn from_plan(plan: FloorPlan) -> Self {
        let autopath = Autopath::new(AutopathConfig::new(plan.tuning.player.collider_half_extent));
        let enemy_ai = EnemyAi::new(EnemyAiConfig::from_tuning(&plan.tuning.enemy));
        Self {
            floor: Floor::new(plan),
            autopath,
            enemy_ai,
        }
    }

    /// Read-only access to the floor for queries.
    #[must_use]
    pub fn floor(&self) -> &Floor {
        &self.floor
    }

    /// Runs one fixed-timestep update and returns every event it produced.
    ///
    /// Order within the tick: input intents are applied first, then the
    /// clock advances (traps before movement before combat before triggers),
    /// then system responses are pumped until no system has anything left to
    /// say. Path invalidations therefore resolve into fresh assignments
    /// within the same tick they are reported.
    pub fn tick(&mut self, intents: &Intents, dt: Duration) -> Vec<Event> {
        let mut log = Vec::new();
        let mut pending = Vec::new();

        if intents.confirm {
            self.run_command(Command::Confirm, &mut log, &mut pending);
        }
        self.run_command(
            Command::Steer {
                input: intents.steer,
            },
            &mut log,
            &mut pending,
        );
        if let Some(goal) = intents.autopath_to {
            self.run_command(Command::AutoPathTo { goal }, &mut log, &mut pending);
        }
        if let Some(aim) = intents.fire {
            self.run_command(Command::Fire { aim }, &mut log, &mut pending);
        }
        if intents.reload {
            self.run_command(Command::Reload, &mut log, &mut pending);
        }
        if intents.interact {
            self.run_command(Command::Interact, &mut log, &mut pending);
        }
        self.run_command(Command::Tick { dt }, &mut log, &mut pending);

        self.pump_systems(pending, &mut log);
        log
    }

    fn run_command(
        &mut self,
        command: Command,
        log: &mut Vec<Event>,
        pending: &mut Vec<Event>,
    ) {
        let mut events = Vec::new();
        apply(&mut self.floor, command, &mut events);
        log.extend(events.iter().cloned());
        pending.extend(events);
    }

    fn pump_systems(&mut self, mut events: Vec<Event>, log: &mut Vec<Event>) {
        for _ in 0..MAX_PUMP_ROUNDS {
            if events.is_empty() {
                break;
            }

            let mut commands = Vec::new();
            {
                let grid = query::grid_view(&self.floor);
                let player = query::player_snapshot(&self.floor);
                let enemies = query::enemy_view(&self.floor);
                self.autopath.handle(&events, &grid, &player, &mut commands);
                self.enemy_ai
                    .handle(&events, &enemies, &player, &mut commands);
            }
            if commands.is_empty() {
                break;
            }

            events.clear();
            for command in commands {
                let mut generated = Vec::new();
                apply(&mut self.floor, command, &mut generated);
                log.extend(generated.iter().cloned());
                events.extend(generated);
            }
        }
    }
}
