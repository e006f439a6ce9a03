//! Combat state advanced once per tick: projectiles, enemy timers, damage.
//!
//! Aggression *decisions* (when to alert, when to commit to a strike) belong
//! to the AI system; this module enforces the timing contracts: a windup,
//! once begun, always reaches its strike frame, and a dead enemy fades for a
//! fixed duration during which it is excluded from collision and targeting.

use std::time::Duration;

use ark_descent_core::{
    tuning::{EnemyTuning, WeaponTuning},
    EnemyId, EnemyPhase, Event, Health, MapPoint, MapVec, ProjectileId, ProjectileImpact,
};

use crate::collision::move_collider;
use crate::grid::GridMap;

/// Player weapon state: clip, fire cooldown, and the running reload.
#[derive(Clone, Debug)]
pub(crate) struct Weapon {
    pub(crate) ammo: u32,
    pub(crate) cooldown: Duration,
    pub(crate) reload: Option<Duration>,
}

impl Weapon {
    pub(crate) fn full(tuning: &WeaponTuning) -> Self {
        Self {
            ammo: tuning.clip_size,
            cooldown: Duration::ZERO,
            reload: None,
        }
    }
}

/// One hostile entity on the floor.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) position: MapPoint,
    pub(crate) phase: EnemyPhase,
    pub(crate) health: Health,
    pub(crate) windup: Duration,
    pub(crate) cooldown: Duration,
    pub(crate) fade: Duration,
}

impl Enemy {
    pub(crate) fn spawned(id: EnemyId, position: MapPoint, tuning: &EnemyTuning) -> Self {
        Self {
            id,
            position,
            phase: EnemyPhase::Idle,
            health: Health::new(tuning.max_health),
            windup: Duration::ZERO,
            cooldown: Duration::ZERO,
            fade: Duration::ZERO,
        }
    }

    /// Fading enemies no longer block shots or deal damage.
    pub(crate) fn is_targetable(&self) -> bool {
        self.phase != EnemyPhase::Fading
    }
}

/// One projectile in flight.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) position: MapPoint,
    pub(crate) direction: MapVec,
    pub(crate) lifetime: Duration,
}

/// Aggregate effects of a projectile tick, fed back into quest logic.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ProjectileTickOutcome {
    /// An idle enemy was alerted by taking damage.
    pub(crate) any_alerted: bool,
    /// At least one enemy dropped to zero health this tick.
    pub(crate) any_died: bool,
}

/// Advances all projectiles, resolving terrain and enemy hits.
///
/// Travel is cut into half-cell sub-steps so fast projectiles cannot skip
/// over thin walls or small bodies between frames.
pub(crate) fn tick_projectiles(
    projectiles: &mut Vec<Projectile>,
    enemies: &mut [Enemy],
    grid: &GridMap,
    weapon: &WeaponTuning,
    enemy_tuning: &EnemyTuning,
    dt: Duration,
    out: &mut Vec<Event>,
) -> ProjectileTickOutcome {
    let mut outcome = ProjectileTickOutcome::default();
    let mut survivors = Vec::with_capacity(projectiles.len());

    for mut projectile in projectiles.drain(..) {
        if projectile.lifetime <= dt {
            out.push(Event::ProjectileDestroyed {
                projectile: projectile.id,
                impact: ProjectileImpact::Expired,
            });
            continue;
        }
        projectile.lifetime -= dt;

        let travel = weapon.projectile_speed * dt.as_secs_f32();
        let half_cell = grid.cell_size() as f32 / 2.0;
        let steps = (travel / half_cell).ceil().max(1.0) as u32;
        let step = projectile.direction.scaled(travel / steps as f32);

        let mut impact = None;
        for _ in 0..steps {
            projectile.position = projectile.position.offset(step);
            let cell = projectile.position.to_cell(grid.cell_size());
            if !grid.is_walkable(cell) {
                impact = Some(ProjectileImpact::Terrain);
                break;
            }
            let hit = enemies.iter_mut().find(|enemy| {
                enemy.is_targetable()
                    && enemy.position.distance_to(projectile.position)
                        <= enemy_tuning.radius + weapon.projectile_radius
            });
            if let Some(enemy) = hit {
                let damage = apply_enemy_damage(enemy, weapon.damage, enemy_tuning, out);
                outcome.any_alerted |= damage.alerted;
                outcome.any_died |= damage.died;
                impact = Some(ProjectileImpact::HitEnemy(enemy.id));
                break;
            }
        }

        match impact {
            Some(impact) => out.push(Event::ProjectileDestroyed {
                projectile: projectile.id,
                impact,
            }),
            None => survivors.push(projectile),
        }
    }

    *projectiles = survivors;
    outcome
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct DamageOutcome {
    pub(crate) alerted: bool,
    pub(crate) died: bool,
}

/// Applies damage to an enemy, handling the alert-on-hit and death rules.
pub(crate) fn apply_enemy_damage(
    enemy: &mut Enemy,
    amount: u32,
    tuning: &EnemyTuning,
    out: &mut Vec<Event>,
) -> DamageOutcome {
    let mut outcome = DamageOutcome::default();
    enemy.health = enemy.health.saturating_sub(amount);
    out.push(Event::EnemyDamaged {
        enemy: enemy.id,
        amount,
        remaining: enemy.health,
    });

    if enemy.health.is_zero() {
        enemy.phase = EnemyPhase::Fading;
        enemy.fade = tuning.fade_time();
        out.push(Event::EnemyPhaseChanged {
            enemy: enemy.id,
            phase: EnemyPhase::Fading,
        });
        outcome.died = true;
    } else if enemy.phase == EnemyPhase::Idle {
        enemy.phase = EnemyPhase::Alert;
        out.push(Event::EnemyPhaseChanged {
            enemy: enemy.id,
            phase: EnemyPhase::Alert,
        });
        outcome.alerted = true;
    }
    outcome
}

/// Aggregate effects of an enemy tick.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct EnemyTickOutcome {
    /// Total strike damage that connected with the player this tick.
    pub(crate) player_damage: u32,
}

/// Advances windups, strikes, chase movement, and death fades.
pub(crate) fn tick_enemies(
    enemies: &mut Vec<Enemy>,
    grid: &GridMap,
    player_position: MapPoint,
    tuning: &EnemyTuning,
    dt: Duration,
    out: &mut Vec<Event>,
) -> EnemyTickOutcome {
    let mut outcome = EnemyTickOutcome::default();

    for enemy in enemies.iter_mut() {
        match enemy.phase {
            EnemyPhase::Fading => {
                enemy.fade = enemy.fade.saturating_sub(dt);
            }
            EnemyPhase::Windup => {
                enemy.cooldown = enemy.cooldown.saturating_sub(dt);
                enemy.windup = enemy.windup.saturating_sub(dt);
                if enemy.windup.is_zero() {
                    // The strike always lands on schedule; range only decides
                    // whether it connects.
                    let connected =
                        enemy.position.distance_to(player_position) <= tuning.strike_range;
                    out.push(Event::EnemyStruck {
                        enemy: enemy.id,
                        connected,
                    });
                    if connected {
                        outcome.player_damage += tuning.strike_damage;
                    }
                    enemy.cooldown = tuning.attack_cooldown();
                    enemy.phase = EnemyPhase::Alert;
                    out.push(Event::EnemyPhaseChanged {
                        enemy: enemy.id,
                        phase: EnemyPhase::Alert,
                    });
                }
            }
            EnemyPhase::Alert => {
                enemy.cooldown = enemy.cooldown.saturating_sub(dt);
                let to_player = enemy.position.vector_to(player_position);
                if to_player.length() > tuning.strike_range {
                    if let Some(direction) = to_player.normalized() {
                        let desired = direction.scaled(tuning.speed * dt.as_secs_f32());
                        let moved =
                            move_collider(grid, enemy.position, tuning.radius, desired);
                        if moved.applied.length() > f32::EPSILON {
                            let from = enemy.position;
                            enemy.position = moved.position;
                            out.push(Event::EnemyMoved {
                                enemy: enemy.id,
                                from,
                                to: enemy.position,
                            });
                        }
                    }
                }
            }
            EnemyPhase::Idle => {
                enemy.cooldown = enemy.cooldown.saturating_sub(dt);
            }
        }
    }

    let mut removed = Vec::new();
    enemies.retain(|enemy| {
        let gone = enemy.phase == EnemyPhase::Fading && enemy.fade.is_zero();
        if gone {
            removed.push(enemy.id);
        }
        !gone
    });
    for enemy in removed {
        out.push(Event::EnemyRemoved { enemy });
    }

    outcome
}
