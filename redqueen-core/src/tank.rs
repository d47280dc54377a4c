//! Tanks - battle-time agents instantiated from a genome
//!
//! A tank never outlives its battle. The simulator builds a [`Perception`]
//! snapshot for each living tank every tick and the tank answers with an
//! [`Intent`]; the simulator then applies movement and firing.

use serde::{Deserialize, Serialize};

use crate::arena::Vec2;
use crate::genome::Genome;
use crate::team::Team;

/// Half the side length of a tank's square bounding box
pub const TANK_HALF_SIZE: f32 = 12.0;

/// Period (seconds) of the strafing direction flip
const STRAFE_PERIOD: f32 = 2.0;

// ============================================================================
// BEHAVIOUR
// ============================================================================

/// Behaviour weights derived once from a genome
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Behavior {
    /// Units per second
    pub max_speed: f32,
    /// Distance the tank tries to hold from its target
    pub preferred_range: f32,
    /// Seconds between shots
    pub fire_interval: f32,
    /// Maximum aiming error in radians before learning
    pub base_spread: f32,
    /// Fraction of incoming damage ignored
    pub damage_reduction: f32,
    /// Pull toward the ally centroid
    pub cohesion: f32,
    /// Pull toward the control point
    pub objective_focus: f32,
    /// Health fraction below which the tank withdraws
    pub retreat_threshold: f32,
    /// Sideways movement while engaging
    pub strafe: f32,
    /// How fast aiming improves with hits
    pub learning: f32,
    /// Willingness to regroup when outnumbered
    pub adaptability: f32,
    /// Preference for finishing wounded enemies
    pub focus_fire: f32,
}

impl Behavior {
    pub fn from_genome(g: &Genome) -> Self {
        Self {
            max_speed: 40.0 + 80.0 * g.speed(),
            preferred_range: 320.0 - 220.0 * g.aggression(),
            fire_interval: 1.4 - 0.8 * g.aggression(),
            base_spread: 0.05 + 0.45 * (1.0 - g.accuracy()),
            damage_reduction: 0.45 * g.defense(),
            cohesion: g.teamwork(),
            objective_focus: 0.2 + 0.3 * g.teamwork() + 0.3 * g.adaptability(),
            retreat_threshold: 0.5 * (1.0 - g.risk_taking()),
            strafe: g.evasion(),
            learning: g.learning(),
            adaptability: g.adaptability(),
            focus_fire: g.teamwork(),
        }
    }
}

// ============================================================================
// STATS
// ============================================================================

/// Per-tank combat counters accumulated over one battle
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatStats {
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub survival_time: f32,
    pub kills: u32,
    pub distance_travelled: f32,
}

impl CombatStats {
    pub fn accuracy(&self) -> f32 {
        if self.shots_fired == 0 {
            0.0
        } else {
            self.shots_hit as f32 / self.shots_fired as f32
        }
    }
}

// ============================================================================
// DECISIONS
// ============================================================================

/// What a tank is currently trying to do
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TankMode {
    Engage,
    Capture,
    Regroup,
    Retreat,
}

/// World snapshot handed to a tank each tick
#[derive(Clone, Copy, Debug)]
pub struct Perception {
    /// Chosen target position and distance
    pub target: Option<(Vec2, f32)>,
    pub ally_centroid: Option<Vec2>,
    pub hill: Vec2,
    pub hill_radius: f32,
    pub allies_alive: usize,
    pub enemies_alive: usize,
    pub fire_range: f32,
    pub time: f32,
}

/// A tank's answer to a perception
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intent {
    pub mode: TankMode,
    /// Unit (or zero) movement direction
    pub direction: Vec2,
    pub fire_at: Option<Vec2>,
}

// ============================================================================
// TANK
// ============================================================================

#[derive(Clone, Debug)]
pub struct Tank {
    pub id: usize,
    pub team: Team,
    /// Index of the genome this tank was built from within its team's lineup
    pub genome_index: usize,
    pub genome: Genome,
    pub behavior: Behavior,
    pub position: Vec2,
    pub spawn: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub cooldown: f32,
    pub alive: bool,
    pub mode: TankMode,
    pub mode_switches: u32,
    pub stats: CombatStats,
}

impl Tank {
    pub fn new(id: usize, team: Team, genome_index: usize, genome: Genome, spawn: Vec2, health: f32) -> Self {
        let behavior = Behavior::from_genome(&genome);
        Self {
            id,
            team,
            genome_index,
            genome,
            behavior,
            position: spawn,
            spawn,
            health,
            max_health: health,
            // Stagger opening volleys by genome
            cooldown: behavior.fire_interval * 0.5,
            alive: true,
            mode: TankMode::Capture,
            mode_switches: 0,
            stats: CombatStats::default(),
        }
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }

    /// Aiming error bound, shrinking as the tank lands hits
    pub fn current_spread(&self) -> f32 {
        let experience = (self.stats.shots_hit as f32 / 8.0).min(1.0);
        self.behavior.base_spread * (1.0 - 0.5 * self.behavior.learning * experience)
    }

    /// Whether the tank has left its spawn point
    pub fn has_moved(&self, threshold: f32) -> bool {
        self.position.distance(self.spawn) > threshold
    }

    /// Decide mode, movement and firing for this tick
    pub fn decide(&self, p: &Perception) -> Intent {
        let mode = self.choose_mode(p);
        let direction = self.steer(mode, p).normalized();

        let fire_at = match p.target {
            Some((pos, dist)) if dist <= p.fire_range && self.cooldown <= 0.0 => Some(pos),
            _ => None,
        };

        Intent { mode, direction, fire_at }
    }

    fn choose_mode(&self, p: &Perception) -> TankMode {
        let outnumbered = p.enemies_alive > p.allies_alive;

        if p.target.is_some() && self.health_fraction() < self.behavior.retreat_threshold {
            TankMode::Retreat
        } else if outnumbered && p.allies_alive > 1 && self.behavior.adaptability > 0.5 {
            TankMode::Regroup
        } else {
            match p.target {
                Some((_, dist)) if dist < self.behavior.preferred_range + 200.0 => TankMode::Engage,
                _ => TankMode::Capture,
            }
        }
    }

    fn steer(&self, mode: TankMode, p: &Perception) -> Vec2 {
        let b = &self.behavior;
        let to_hill = (p.hill - self.position).normalized();
        let on_hill = self.position.distance(p.hill) < p.hill_radius * 0.6;
        let to_allies = p
            .ally_centroid
            .map(|c| (c - self.position).normalized())
            .unwrap_or(Vec2::ZERO);

        match (mode, p.target) {
            (TankMode::Engage, Some((target, dist))) => {
                let to_target = (target - self.position).normalized();
                let range_error = (dist - b.preferred_range) / b.preferred_range.max(1.0);
                let approach = to_target * range_error.clamp(-1.0, 1.0);
                let strafe = to_target.perp() * (b.strafe * self.strafe_sign(p.time));
                let hill = if on_hill { Vec2::ZERO } else { to_hill * (b.objective_focus * 0.5) };
                approach + strafe + hill + to_allies * (b.cohesion * 0.4)
            }
            (TankMode::Regroup, target) => {
                let away = target
                    .map(|(t, _)| (self.position - t).normalized() * 0.3)
                    .unwrap_or(Vec2::ZERO);
                let anchor = if p.ally_centroid.is_some() { to_allies } else { to_hill };
                anchor + away
            }
            (TankMode::Retreat, Some((target, _))) => {
                let away = (self.position - target).normalized();
                away + (self.spawn - self.position).normalized() * 0.5
            }
            _ => {
                let hill = if on_hill { Vec2::ZERO } else { to_hill };
                hill + to_allies * (b.cohesion * 0.3)
            }
        }
    }

    fn strafe_sign(&self, time: f32) -> f32 {
        let phase = (time / STRAFE_PERIOD) as i64 + self.id as i64;
        if phase % 2 == 0 {
            1.0
        } else {
            -1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::Archetype;

    fn perception(target: Option<(Vec2, f32)>) -> Perception {
        Perception {
            target,
            ally_centroid: None,
            hill: Vec2::new(500.0, 300.0),
            hill_radius: 70.0,
            allies_alive: 3,
            enemies_alive: 3,
            fire_range: 350.0,
            time: 0.0,
        }
    }

    #[test]
    fn test_behavior_tracks_traits() {
        let berserker = Behavior::from_genome(&Archetype::Berserker.preset());
        let sniper = Behavior::from_genome(&Archetype::Sniper.preset());
        assert!(berserker.max_speed > sniper.max_speed);
        assert!(berserker.preferred_range < sniper.preferred_range);
        assert!(sniper.base_spread < berserker.base_spread);
        assert!(sniper.damage_reduction > berserker.damage_reduction);
    }

    #[test]
    fn test_no_target_heads_for_hill() {
        let tank = Tank::new(0, Team::Red, 0, Genome::default(), Vec2::new(60.0, 300.0), 100.0);
        let intent = tank.decide(&perception(None));
        assert_eq!(intent.mode, TankMode::Capture);
        assert!(intent.direction.x > 0.9);
        assert!(intent.fire_at.is_none());
    }

    #[test]
    fn test_wounded_cautious_tank_retreats() {
        let mut g = Genome::default();
        g.set(crate::genome::Trait::RiskTaking, 0.0);
        let mut tank = Tank::new(0, Team::Red, 0, g, Vec2::new(300.0, 300.0), 100.0);
        tank.health = 20.0;
        let intent = tank.decide(&perception(Some((Vec2::new(400.0, 300.0), 100.0))));
        assert_eq!(intent.mode, TankMode::Retreat);
        assert!(intent.direction.x < 0.0);
    }

    #[test]
    fn test_fires_only_in_range_and_ready() {
        let mut tank = Tank::new(0, Team::Blue, 0, Genome::default(), Vec2::new(500.0, 300.0), 100.0);
        tank.cooldown = 0.0;
        let near = tank.decide(&perception(Some((Vec2::new(600.0, 300.0), 100.0))));
        assert!(near.fire_at.is_some());
        let far = tank.decide(&perception(Some((Vec2::new(950.0, 300.0), 450.0))));
        assert!(far.fire_at.is_none());
        tank.cooldown = 0.5;
        let cooling = tank.decide(&perception(Some((Vec2::new(600.0, 300.0), 100.0))));
        assert!(cooling.fire_at.is_none());
    }

    #[test]
    fn test_learning_narrows_spread() {
        let mut g = Genome::default();
        g.set(crate::genome::Trait::Learning, 1.0);
        let mut tank = Tank::new(0, Team::Red, 0, g, Vec2::ZERO, 100.0);
        let before = tank.current_spread();
        tank.stats.shots_hit = 10;
        assert!(tank.current_spread() < before);
    }
}
