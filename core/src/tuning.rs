//! Numeric tuning applied to a floor.
//!
//! Every field carries a default so tuning documents may override any subset.
//! Durations are stored as seconds for the benefit of the TOML surface and
//! exposed as [`Duration`] through accessors.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Complete tuning bundle for one floor.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Player movement, health, and interaction tuning.
    pub player: PlayerTuning,
    /// Sidearm tuning.
    pub weapon: WeaponTuning,
    /// Enemy aggression and combat tuning.
    pub enemy: EnemyTuning,
}

/// Player movement, health, and interaction tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Maximum hit points.
    pub max_health: u32,
    /// Walking speed in map units per second.
    pub speed: f32,
    /// Half-extent of the square collider in map units.
    pub collider_half_extent: f32,
    /// Radius within which interactable triggers respond, in map units.
    pub interact_radius: f32,
    /// Seconds without taking damage before regeneration starts.
    pub regen_delay_secs: f32,
    /// Hit points regenerated per second once regeneration is running.
    pub regen_rate: f32,
}

impl PlayerTuning {
    /// Delay before regeneration starts.
    #[must_use]
    pub fn regen_delay(&self) -> Duration {
        Duration::from_secs_f32(self.regen_delay_secs.max(0.0))
    }
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_health: 100,
            speed: 180.0,
            collider_half_extent: 9.0,
            interact_radius: 50.0,
            regen_delay_secs: 60.0,
            regen_rate: 1.0,
        }
    }
}

/// Sidearm tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTuning {
    /// Rounds held by a full clip.
    pub clip_size: u32,
    /// Seconds between successive shots.
    pub fire_cooldown_secs: f32,
    /// Seconds a reload takes to complete.
    pub reload_secs: f32,
    /// Projectile speed in map units per second.
    pub projectile_speed: f32,
    /// Seconds a projectile survives without hitting anything.
    pub projectile_lifetime_secs: f32,
    /// Projectile radius in map units, used by the hit test.
    pub projectile_radius: f32,
    /// Hit points removed per projectile hit.
    pub damage: u32,
}

impl WeaponTuning {
    /// Time between successive shots.
    #[must_use]
    pub fn fire_cooldown(&self) -> Duration {
        Duration::from_secs_f32(self.fire_cooldown_secs.max(0.0))
    }

    /// Time a reload takes to complete.
    #[must_use]
    pub fn reload_time(&self) -> Duration {
        Duration::from_secs_f32(self.reload_secs.max(0.0))
    }

    /// Time a projectile survives without hitting anything.
    #[must_use]
    pub fn projectile_lifetime(&self) -> Duration {
        Duration::from_secs_f32(self.projectile_lifetime_secs.max(0.0))
    }
}

impl Default for WeaponTuning {
    fn default() -> Self {
        Self {
            clip_size: 10,
            fire_cooldown_secs: 0.18,
            reload_secs: 1.0,
            projectile_speed: 520.0,
            projectile_lifetime_secs: 1.5,
            projectile_radius: 3.0,
            damage: 24,
        }
    }
}

/// Enemy aggression and combat tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    /// Maximum hit points.
    pub max_health: u32,
    /// Chase speed in map units per second.
    pub speed: f32,
    /// Body radius in map units, used by the projectile hit test.
    pub radius: f32,
    /// Distance at which an idle enemy becomes alert.
    pub aggro_radius: f32,
    /// Distance at which an alert enemy loses interest.
    pub lose_interest_radius: f32,
    /// Distance within which a strike can begin and can connect.
    pub strike_range: f32,
    /// Seconds of committed windup before the strike frame.
    pub windup_secs: f32,
    /// Seconds between successive strikes.
    pub attack_cooldown_secs: f32,
    /// Hit points removed from the player by a connecting strike.
    pub strike_damage: u32,
    /// Seconds a dead enemy lingers while fading out.
    pub fade_secs: f32,
}

impl EnemyTuning {
    /// Committed windup duration before the strike frame.
    #[must_use]
    pub fn windup(&self) -> Duration {
        Duration::from_secs_f32(self.windup_secs.max(0.0))
    }

    /// Time between successive strikes.
    #[must_use]
    pub fn attack_cooldown(&self) -> Duration {
        Duration::from_secs_f32(self.attack_cooldown_secs.max(0.0))
    }

    /// Time a dead enemy lingers while fading out.
    #[must_use]
    pub fn fade_time(&self) -> Duration {
        Duration::from_secs_f32(self.fade_secs.max(0.0))
    }
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            max_health: 60,
            speed: 90.0,
            radius: 14.0,
            aggro_radius: 320.0,
            lose_interest_radius: 360.0,
            strike_range: 70.0,
            windup_secs: 0.28,
            attack_cooldown_secs: 1.4,
            strike_damage: 12,
            fade_secs: 0.6,
        }
    }
}
