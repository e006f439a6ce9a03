#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that drives enemy aggression decisions.
//!
//! Each tick the system samples every enemy's surroundings (distance to the
//! player, current phase, attack readiness) and answers with phase change
//! requests. The floor validates each request, so this system never needs to
//! reason about windup interruption or fading corpses beyond skipping them.

use ark_descent_core::{
    tuning::EnemyTuning, Command, EnemyPhase, EnemyPhaseRequest, EnemyView, Event,
    PlayerSnapshot,
};

/// Configuration parameters required to construct the enemy AI system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    aggro_radius: f32,
    lose_interest_radius: f32,
    strike_range: f32,
}

impl Config {
    /// Creates a new configuration from explicit radii.
    #[must_use]
    pub const fn new(aggro_radius: f32, lose_interest_radius: f32, strike_range: f32) -> Self {
        Self {
            aggro_radius,
            lose_interest_radius,
            strike_range,
        }
    }

    /// Derives the configuration from enemy tuning.
    #[must_use]
    pub fn from_tuning(tuning: &EnemyTuning) -> Self {
        Self::new(
            tuning.aggro_radius,
            tuning.lose_interest_radius,
            tuning.strike_range,
        )
    }
}

/// Enemy aggression system emitting phase change requests.
#[derive(Clone, Copy, Debug)]
pub struct EnemyAi {
    config: Config,
}

impl EnemyAi {
    /// Creates a new enemy AI system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Consumes events and immutable views to emit phase requests.
    ///
    /// Decisions are taken once per time advance; other events are ignored
    /// so replays stay deterministic regardless of event interleaving.
    pub fn handle(
        &mut self,
        events: &[Event],
        enemies: &EnemyView,
        player: &PlayerSnapshot,
        out: &mut Vec<Command>,
    ) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        for enemy in enemies.iter() {
            let distance = enemy.position.distance_to(player.position);
            let request = match enemy.phase {
                EnemyPhase::Idle if distance <= self.config.aggro_radius => {
                    Some(EnemyPhaseRequest::Alert)
                }
                EnemyPhase::Alert if distance > self.config.lose_interest_radius => {
                    Some(EnemyPhaseRequest::StandDown)
                }
                EnemyPhase::Alert
                    if distance <= self.config.strike_range
                        && enemy.cooldown_remaining.is_zero() =>
                {
                    Some(EnemyPhaseRequest::BeginWindup)
                }
                // Windup is committed and fading corpses are inert.
                _ => None,
            };
            if let Some(request) = request {
                out.push(Command::SetEnemyPhase {
                    enemy: enemy.id,
                    request,
                });
            }
        }
    }
}
