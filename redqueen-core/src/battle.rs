//! Battle simulator - tick-based combat and control-point state machine
//!
//! ```text
//! Ready --start--> Running --pause--> Paused --resume--> Running
//!                  Running --win / timeout / force_timeout--> Ended
//! ```
//!
//! Each tick, in order:
//! 1. living tanks perceive, decide, move and fire
//! 2. projectiles advance
//! 3. projectile hits are resolved, spent shells removed
//! 4. the control point is updated
//! 5. win conditions are checked (elimination, then control)
//! 6. the time limit is checked
//!
//! The battle clock does not run until some tank has left its spawn point,
//! so a battle that never gets going cannot time out at zero length.
//! All randomness comes from the simulator's own seeded RNG.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::arena::{Arena, Vec2};
use crate::control_point::ControlPoint;
use crate::genome::Genome;
use crate::projectile::Projectile;
use crate::result::{
    AgentReport, BattleResult, Survivors, TacticalMetrics, TeamStats, TeamTactics, VictoryType, Winner,
};
use crate::tank::{Perception, Tank, TANK_HALF_SIZE};
use crate::team::Team;

/// Distance over which team spread maps coordination from 1 down to 0
const COORDINATION_SPREAD: f32 = 300.0;

/// Mean pairwise genome distance that counts as fully diverse
const FULL_DIVERSITY_DISTANCE: f32 = 1.5;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Battle rules and physics constants
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    pub arena_width: f32,
    pub arena_height: f32,
    pub obstacle_count: usize,
    /// Seconds after which the battle times out
    pub max_duration: f32,
    /// Timeout is never declared before this many seconds
    pub min_duration: f32,
    /// Largest step accepted by `tick`
    pub max_dt: f32,
    pub hill_radius: f32,
    /// Seconds for a lone team to capture the hill from zero
    pub capture_time: f32,
    /// Continuous full control needed to win
    pub control_win_time: f32,
    /// Distance a tank must leave its spawn before the clock starts
    pub start_threshold: f32,
    pub tank_health: f32,
    pub projectile_speed: f32,
    pub projectile_damage: f32,
    pub projectile_lifetime: f32,
    pub fire_range: f32,
    /// Tanks spawned per supplied genome
    pub tanks_per_genome: usize,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            arena_width: 1000.0,
            arena_height: 600.0,
            obstacle_count: 4,
            max_duration: 120.0,
            min_duration: 15.0,
            max_dt: 0.1,
            hill_radius: 70.0,
            capture_time: 5.0,
            control_win_time: 20.0,
            start_threshold: 5.0,
            tank_health: 100.0,
            projectile_speed: 400.0,
            projectile_damage: 20.0,
            projectile_lifetime: 1.5,
            fire_range: 350.0,
            tanks_per_genome: 1,
        }
    }
}

/// Simulator lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleState {
    Ready,
    Running,
    Paused,
    Ended,
}

// ============================================================================
// SIMULATOR
// ============================================================================

pub struct BattleSimulator {
    config: BattleConfig,
    seed: u64,
    rng: ChaCha8Rng,
    arena: Arena,
    hill: ControlPoint,
    tanks: Vec<Tank>,
    projectiles: Vec<Projectile>,
    /// Genomes each team was started with, by team index
    lineups: [Vec<Genome>; 2],
    state: BattleState,
    elapsed: f32,
    started: bool,
    ticks: u64,
    /// (sum, samples) of per-tick coordination, by team index
    coordination: [(f32, u32); 2],
    result: Option<BattleResult>,
}

impl BattleSimulator {
    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Create a simulator; the battlefield layout is drawn from `seed`
    pub fn new(config: BattleConfig, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let arena = Arena::generate(
            config.arena_width,
            config.arena_height,
            config.obstacle_count,
            config.hill_radius,
            &mut rng,
        );
        let hill = ControlPoint::new(arena.center(), config.hill_radius, config.capture_time);

        Self {
            config,
            seed,
            rng,
            arena,
            hill,
            tanks: Vec::new(),
            projectiles: Vec::new(),
            lineups: [Vec::new(), Vec::new()],
            state: BattleState::Ready,
            elapsed: 0.0,
            started: false,
            ticks: 0,
            coordination: [(0.0, 0); 2],
            result: None,
        }
    }

    /// Reset the clock and spawn both teams at opposite edges.
    ///
    /// An empty lineup is coerced to a single neutral genome.
    pub fn start(&mut self, red: &[Genome], blue: &[Genome]) {
        self.tanks.clear();
        self.projectiles.clear();
        self.hill.reset();
        self.elapsed = 0.0;
        self.started = false;
        self.ticks = 0;
        self.coordination = [(0.0, 0); 2];
        self.result = None;

        for (team, lineup) in [(Team::Red, red), (Team::Blue, blue)] {
            let lineup = if lineup.is_empty() {
                tracing::warn!("Empty {} lineup, fielding one neutral tank", team);
                vec![Genome::default()]
            } else {
                lineup.to_vec()
            };
            self.spawn_team(team, &lineup);
            self.lineups[team.index()] = lineup;
        }

        self.state = BattleState::Running;
        tracing::debug!(
            seed = self.seed,
            red = self.lineups[0].len(),
            blue = self.lineups[1].len(),
            "Battle started"
        );
    }

    fn spawn_team(&mut self, team: Team, lineup: &[Genome]) {
        let per_genome = self.config.tanks_per_genome.max(1);
        let points = self.arena.spawn_points(team, lineup.len() * per_genome);

        for (slot, point) in points.into_iter().enumerate() {
            let genome_index = slot / per_genome;
            let jitter = Vec2::new(0.0, self.rng.gen_range(-8.0..8.0));
            let spawn = self.arena.confine(point + jitter, TANK_HALF_SIZE);
            let id = self.tanks.len();
            self.tanks.push(Tank::new(
                id,
                team,
                genome_index,
                lineup[genome_index],
                spawn,
                self.config.tank_health,
            ));
        }
    }

    /// Stop advancing without losing the clock. Returns false if not running.
    pub fn pause(&mut self) -> bool {
        if self.state == BattleState::Running {
            self.state = BattleState::Paused;
            true
        } else {
            false
        }
    }

    /// Continue a paused battle on the same clock
    pub fn resume(&mut self) -> bool {
        if self.state == BattleState::Paused {
            self.state = BattleState::Running;
            true
        } else {
            false
        }
    }

    /// End the battle now as a timeout, whatever its state
    pub fn force_timeout(&mut self) {
        if self.state == BattleState::Ended {
            return;
        }
        tracing::warn!(elapsed = self.elapsed, "Forcing battle timeout");
        self.finish(Winner::Timeout, VictoryType::Timeout);
    }

    // ========================================================================
    // TICK
    // ========================================================================

    /// Advance the battle by `dt` seconds (capped at `max_dt`)
    pub fn tick(&mut self, dt: f32) -> BattleState {
        if self.state != BattleState::Running {
            return self.state;
        }
        let dt = if dt.is_finite() { dt.clamp(0.0, self.config.max_dt) } else { 0.0 };
        if dt <= 0.0 {
            return self.state;
        }
        self.ticks += 1;

        self.advance_tanks(dt);

        if !self.started {
            let threshold = self.config.start_threshold;
            self.started = self.tanks.iter().any(|t| t.has_moved(threshold));
        }
        if self.started {
            self.elapsed += dt;
            for tank in self.tanks.iter_mut().filter(|t| t.alive) {
                tank.stats.survival_time += dt;
            }
        }

        self.advance_projectiles(dt);
        self.resolve_collisions();
        self.update_control_point(dt);
        if self.started {
            self.sample_coordination();
        }

        if let Some((winner, victory)) = self.check_victory() {
            self.finish(winner, victory);
        } else if self.elapsed > self.config.max_duration && self.elapsed >= self.config.min_duration {
            self.finish(Winner::Timeout, VictoryType::Timeout);
        }

        self.state
    }

    fn advance_tanks(&mut self, dt: f32) {
        let centroids = [self.team_sum(Team::Red), self.team_sum(Team::Blue)];

        let intents: Vec<_> = (0..self.tanks.len())
            .map(|i| {
                let tank = &self.tanks[i];
                if tank.alive {
                    Some(tank.decide(&self.perceive(tank, &centroids)))
                } else {
                    None
                }
            })
            .collect();

        let Self { tanks, arena, rng, projectiles, config, .. } = self;

        for (tank, intent) in tanks.iter_mut().zip(intents) {
            let Some(intent) = intent else { continue };

            if intent.mode != tank.mode {
                tank.mode = intent.mode;
                tank.mode_switches += 1;
            }

            let step = intent.direction * (tank.behavior.max_speed * dt);
            let next = arena.confine(tank.position + step, TANK_HALF_SIZE);
            tank.stats.distance_travelled += next.distance(tank.position);
            tank.position = next;

            match intent.fire_at {
                Some(target) => {
                    let spread = tank.current_spread();
                    let angle = rng.gen_range(-1.0f32..=1.0) * spread;
                    let direction = (target - tank.position).normalized().rotated(angle);
                    projectiles.push(Projectile::new(
                        tank.id,
                        tank.team,
                        tank.position + direction * (TANK_HALF_SIZE + 2.0),
                        direction,
                        config.projectile_speed,
                        config.projectile_damage,
                        config.projectile_lifetime,
                    ));
                    tank.stats.shots_fired += 1;
                    tank.cooldown = tank.behavior.fire_interval;
                }
                None => tank.cooldown = (tank.cooldown - dt).max(0.0),
            }
        }
    }

    fn perceive(&self, tank: &Tank, centroids: &[(Vec2, usize); 2]) -> Perception {
        let (sum, count) = centroids[tank.team.index()];
        let ally_centroid = if count > 1 {
            let others = sum - tank.position;
            Some(others * (1.0 / (count - 1) as f32))
        } else {
            None
        };

        Perception {
            target: self.select_target(tank),
            ally_centroid,
            hill: self.hill.position,
            hill_radius: self.hill.radius,
            allies_alive: count,
            enemies_alive: centroids[tank.team.opponent().index()].1,
            fire_range: self.config.fire_range,
            time: self.elapsed,
        }
    }

    /// Nearest enemy, discounted toward wounded ones by focus fire
    fn select_target(&self, tank: &Tank) -> Option<(Vec2, f32)> {
        let mut best: Option<(f32, Vec2, f32)> = None;
        for enemy in self.tanks.iter().filter(|t| t.alive && t.team != tank.team) {
            let dist = tank.position.distance(enemy.position);
            let score = dist - tank.behavior.focus_fire * 150.0 * (1.0 - enemy.health_fraction());
            if best.map_or(true, |(s, _, _)| score < s) {
                best = Some((score, enemy.position, dist));
            }
        }
        best.map(|(_, pos, dist)| (pos, dist))
    }

    /// Position sum and count of living tanks
    fn team_sum(&self, team: Team) -> (Vec2, usize) {
        self.tanks
            .iter()
            .filter(|t| t.alive && t.team == team)
            .fold((Vec2::ZERO, 0), |(sum, n), t| (sum + t.position, n + 1))
    }

    fn advance_projectiles(&mut self, dt: f32) {
        for p in &mut self.projectiles {
            p.advance(dt);
        }
    }

    /// A shell hits the first living enemy along its path this step
    fn resolve_collisions(&mut self) {
        let shells = std::mem::take(&mut self.projectiles);
        let mut remaining = Vec::with_capacity(shells.len());

        for shell in shells {
            let hit = self
                .tanks
                .iter()
                .enumerate()
                .filter(|(_, t)| t.alive && t.team != shell.team)
                .filter_map(|(i, t)| shell.swept_entry(t.position, TANK_HALF_SIZE).map(|entry| (i, entry)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, _)| i);

            match hit {
                Some(index) => self.apply_hit(&shell, index),
                None => {
                    let spent = shell.expired()
                        || !self.arena.in_bounds(shell.position)
                        || self.arena.blocked(shell.position);
                    if !spent {
                        remaining.push(shell);
                    }
                }
            }
        }

        self.projectiles = remaining;
    }

    fn apply_hit(&mut self, shell: &Projectile, target_index: usize) {
        let target = &mut self.tanks[target_index];
        let damage = shell.damage * (1.0 - target.behavior.damage_reduction);
        target.health -= damage;
        target.stats.damage_taken += damage;

        let killed = target.health <= 0.0;
        if killed {
            target.health = 0.0;
            target.alive = false;
            tracing::trace!(tank = target.id, team = %target.team, time = self.elapsed, "Tank destroyed");
        }

        if let Some(shooter) = self.tanks.get_mut(shell.owner) {
            shooter.stats.shots_hit += 1;
            shooter.stats.damage_dealt += damage;
            if killed {
                shooter.stats.kills += 1;
            }
        }
    }

    fn update_control_point(&mut self, dt: f32) {
        let mut present = [0usize; 2];
        for t in self.tanks.iter().filter(|t| t.alive && self.hill.contains(t.position)) {
            present[t.team.index()] += 1;
        }
        self.hill.update(present[0], present[1], dt, self.elapsed);
    }

    fn sample_coordination(&mut self) {
        for team in Team::ALL {
            let (sum, count) = self.team_sum(team);
            if count < 2 {
                continue;
            }
            let centroid = sum * (1.0 / count as f32);
            let spread = self
                .tanks
                .iter()
                .filter(|t| t.alive && t.team == team)
                .map(|t| t.position.distance(centroid))
                .sum::<f32>()
                / count as f32;
            let acc = &mut self.coordination[team.index()];
            acc.0 += (1.0 - spread / COORDINATION_SPREAD).clamp(0.0, 1.0);
            acc.1 += 1;
        }
    }

    /// Elimination first (mutual elimination is a draw), then control
    fn check_victory(&self) -> Option<(Winner, VictoryType)> {
        let red = self.alive_count(Team::Red);
        let blue = self.alive_count(Team::Blue);

        match (red, blue) {
            (0, 0) => return Some((Winner::Draw, VictoryType::Elimination)),
            (0, _) => return Some((Winner::Blue, VictoryType::Elimination)),
            (_, 0) => return Some((Winner::Red, VictoryType::Elimination)),
            _ => {}
        }

        match self.hill.holder() {
            Some((team, streak)) if streak >= self.config.control_win_time => {
                Some((Winner::from_team(team), VictoryType::Control))
            }
            _ => None,
        }
    }

    // ========================================================================
    // RESOLUTION
    // ========================================================================

    fn finish(&mut self, winner: Winner, victory_type: VictoryType) {
        let agents: Vec<AgentReport> = self
            .tanks
            .iter()
            .map(|t| AgentReport {
                id: t.id,
                team: t.team,
                genome_index: t.genome_index,
                alive: t.alive,
                stats: t.stats,
            })
            .collect();

        let red_team_stats = TeamStats::aggregate(agents.iter().filter(|a| a.team == Team::Red));
        let blue_team_stats = TeamStats::aggregate(agents.iter().filter(|a| a.team == Team::Blue));

        let result = BattleResult {
            winner,
            victory_type,
            duration: self.elapsed,
            survivors: Survivors {
                red: red_team_stats.survivors,
                blue: blue_team_stats.survivors,
            },
            red_team_stats,
            blue_team_stats,
            tactical_metrics: TacticalMetrics {
                red: self.team_tactics(Team::Red),
                blue: self.team_tactics(Team::Blue),
            },
            control_point_summary: self.hill.summary(),
            agents,
            seed: self.seed,
            ticks: self.ticks,
        };

        tracing::debug!(
            winner = ?result.winner,
            victory = ?result.victory_type,
            duration = result.duration,
            red_survivors = result.survivors.red,
            blue_survivors = result.survivors.blue,
            "Battle ended"
        );

        self.result = Some(result);
        self.state = BattleState::Ended;
    }

    fn team_tactics(&self, team: Team) -> TeamTactics {
        let (sum, samples) = self.coordination[team.index()];
        let coordination = if samples == 0 { 0.0 } else { sum / samples as f32 };

        let (switches, tanks) = self
            .tanks
            .iter()
            .filter(|t| t.team == team)
            .fold((0u32, 0usize), |(s, n), t| (s + t.mode_switches, n + 1));
        let windows = (self.elapsed / 10.0).max(1.0);
        let adaptability = if tanks == 0 {
            0.0
        } else {
            (switches as f32 / (tanks as f32 * windows)).clamp(0.0, 1.0)
        };

        TeamTactics {
            coordination,
            adaptability,
            diversity: lineup_diversity(&self.lineups[team.index()]),
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn state(&self) -> BattleState {
        self.state
    }

    /// Battle clock in seconds
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn tanks(&self) -> &[Tank] {
        &self.tanks
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn control_point(&self) -> &ControlPoint {
        &self.hill
    }

    pub fn alive_count(&self, team: Team) -> usize {
        self.tanks.iter().filter(|t| t.alive && t.team == team).count()
    }

    pub fn result(&self) -> Option<&BattleResult> {
        self.result.as_ref()
    }

    pub fn take_result(&mut self) -> Option<BattleResult> {
        self.result.take()
    }
}

/// Mean pairwise genome distance, scaled into `[0, 1]`
fn lineup_diversity(lineup: &[Genome]) -> f32 {
    let mut total = 0.0;
    let mut pairs = 0u32;
    for (i, a) in lineup.iter().enumerate() {
        for b in &lineup[i + 1..] {
            total += a.distance(b);
            pairs += 1;
        }
    }
    if pairs == 0 {
        0.0
    } else {
        (total / pairs as f32 / FULL_DIVERSITY_DISTANCE).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::Archetype;

    const DT: f32 = 0.05;

    fn lineup(archetypes: &[Archetype]) -> Vec<Genome> {
        archetypes.iter().map(|a| a.preset()).collect()
    }

    /// Config where nobody can die and the hill never decides the battle
    fn stalemate_config() -> BattleConfig {
        BattleConfig {
            tank_health: 1.0e9,
            control_win_time: 1.0e6,
            ..Default::default()
        }
    }

    fn run_to_end(sim: &mut BattleSimulator) -> BattleResult {
        for _ in 0..20_000 {
            if sim.tick(DT) == BattleState::Ended {
                break;
            }
        }
        sim.take_result().expect("battle should have ended")
    }

    #[test]
    fn test_identical_seeds_replay_identically() {
        let red = lineup(&[Archetype::Berserker, Archetype::Skirmisher, Archetype::Balanced]);
        let blue = lineup(&[Archetype::Sniper, Archetype::Guardian, Archetype::Tactician]);

        let mut a = BattleSimulator::new(BattleConfig::default(), 99);
        a.start(&red, &blue);
        let mut b = BattleSimulator::new(BattleConfig::default(), 99);
        b.start(&red, &blue);

        let ra = run_to_end(&mut a);
        let rb = run_to_end(&mut b);
        assert_eq!(ra, rb);
        assert_eq!(ra.control_point_summary.timeline, rb.control_point_summary.timeline);
    }

    #[test]
    fn test_elimination_resolves_for_survivor_team() {
        let mut sim = BattleSimulator::new(stalemate_config(), 1);
        sim.start(&lineup(&[Archetype::Berserker, Archetype::Berserker]), &lineup(&[Archetype::Sniper, Archetype::Sniper]));

        while sim.elapsed() < 12.0 {
            assert_eq!(sim.tick(DT), BattleState::Running);
        }
        for t in sim.tanks.iter_mut().filter(|t| t.team == Team::Red) {
            t.alive = false;
        }
        assert_eq!(sim.tick(DT), BattleState::Ended);

        let result = sim.take_result().unwrap();
        assert_eq!(result.winner, Winner::Blue);
        assert_eq!(result.victory_type, VictoryType::Elimination);
        assert_eq!(result.survivors.red, 0);
        assert_eq!(result.survivors.blue, 2);
        assert!((result.duration - 12.0).abs() < 0.2, "duration {}", result.duration);
    }

    #[test]
    fn test_mutual_elimination_is_draw() {
        let mut sim = BattleSimulator::new(stalemate_config(), 2);
        sim.start(&lineup(&[Archetype::Balanced]), &lineup(&[Archetype::Balanced]));
        sim.tick(DT);
        for t in sim.tanks.iter_mut() {
            t.alive = false;
        }
        sim.tick(DT);
        assert_eq!(sim.result().unwrap().winner, Winner::Draw);
    }

    #[test]
    fn test_stalemate_times_out_after_max_duration() {
        let config = BattleConfig { max_duration: 20.0, ..stalemate_config() };
        let mut sim = BattleSimulator::new(config, 3);
        sim.start(&lineup(&[Archetype::Guardian]), &lineup(&[Archetype::Guardian]));
        let result = run_to_end(&mut sim);
        assert_eq!(result.winner, Winner::Timeout);
        assert_eq!(result.victory_type, VictoryType::Timeout);
        assert!(result.duration > 20.0 && result.duration < 20.2);
        assert_eq!(result.survivors, Survivors { red: 1, blue: 1 });
    }

    #[test]
    fn test_timeout_respects_minimum_duration() {
        let config = BattleConfig { max_duration: 2.0, min_duration: 15.0, ..stalemate_config() };
        let mut sim = BattleSimulator::new(config, 4);
        sim.start(&lineup(&[Archetype::Balanced]), &lineup(&[Archetype::Balanced]));
        let result = run_to_end(&mut sim);
        assert_eq!(result.winner, Winner::Timeout);
        assert!(result.duration >= 15.0);
    }

    #[test]
    fn test_clock_waits_for_movement() {
        let mut sim = BattleSimulator::new(BattleConfig::default(), 5);
        sim.start(&lineup(&[Archetype::Sniper]), &lineup(&[Archetype::Sniper]));
        sim.tick(DT);
        assert!(!sim.has_started());
        assert_eq!(sim.elapsed(), 0.0);
        for _ in 0..40 {
            sim.tick(DT);
        }
        assert!(sim.has_started());
        assert!(sim.elapsed() > 0.0);
    }

    #[test]
    fn test_pause_keeps_clock() {
        let mut sim = BattleSimulator::new(stalemate_config(), 6);
        sim.start(&lineup(&[Archetype::Balanced]), &lineup(&[Archetype::Balanced]));
        for _ in 0..60 {
            sim.tick(DT);
        }
        let before = sim.elapsed();
        assert!(sim.pause());
        assert_eq!(sim.tick(DT), BattleState::Paused);
        assert_eq!(sim.elapsed(), before);
        assert!(sim.resume());
        sim.tick(DT);
        assert!(sim.elapsed() > before);
    }

    #[test]
    fn test_large_dt_is_capped() {
        let mut sim = BattleSimulator::new(stalemate_config(), 7);
        sim.start(&lineup(&[Archetype::Skirmisher]), &lineup(&[Archetype::Skirmisher]));
        for _ in 0..20 {
            sim.tick(DT);
        }
        let before = sim.elapsed();
        sim.tick(10.0);
        assert!(sim.elapsed() - before <= 0.1 + 1e-6);
    }

    #[test]
    fn test_empty_lineup_fields_neutral_tank() {
        let mut sim = BattleSimulator::new(BattleConfig::default(), 8);
        sim.start(&[], &lineup(&[Archetype::Sniper]));
        assert_eq!(sim.alive_count(Team::Red), 1);
        assert_eq!(sim.tanks()[0].genome, Genome::default());
    }

    #[test]
    fn test_control_streak_wins() {
        let mut sim = BattleSimulator::new(BattleConfig::default(), 9);
        sim.start(&lineup(&[Archetype::Balanced]), &lineup(&[Archetype::Balanced]));
        for i in 0..300 {
            sim.hill.update(1, 0, 0.1, i as f32 * 0.1);
        }
        assert_eq!(sim.check_victory(), Some((Winner::Red, VictoryType::Control)));
    }

    #[test]
    fn test_natural_battle_resolves() {
        let mut sim = BattleSimulator::new(BattleConfig::default(), 10);
        sim.start(
            &lineup(&[Archetype::Berserker, Archetype::Berserker, Archetype::Skirmisher]),
            &lineup(&[Archetype::Sniper, Archetype::Guardian, Archetype::Tactician]),
        );
        let result = run_to_end(&mut sim);
        assert!(result.duration <= 120.0 + 0.1);
        let fired = result.red_team_stats.shots_fired + result.blue_team_stats.shots_fired;
        assert!(fired > 0);
        assert_eq!(result.agents.len(), 6);
        for tactics in [result.tactical_metrics.red, result.tactical_metrics.blue] {
            assert!((0.0..=1.0).contains(&tactics.coordination));
            assert!((0.0..=1.0).contains(&tactics.adaptability));
            assert!((0.0..=1.0).contains(&tactics.diversity));
        }
    }

    #[test]
    fn test_force_timeout() {
        let mut sim = BattleSimulator::new(BattleConfig::default(), 11);
        sim.start(&lineup(&[Archetype::Balanced]), &lineup(&[Archetype::Balanced]));
        sim.tick(DT);
        sim.force_timeout();
        assert_eq!(sim.state(), BattleState::Ended);
        assert_eq!(sim.result().unwrap().winner, Winner::Timeout);
        assert_eq!(sim.tick(DT), BattleState::Ended);
    }

    #[test]
    fn test_shell_hits_nearest_tank_on_path() {
        let mut sim = BattleSimulator::new(stalemate_config(), 12);
        sim.start(&lineup(&[Archetype::Balanced]), &lineup(&[Archetype::Guardian, Archetype::Guardian]));

        let blue: Vec<usize> = (0..sim.tanks.len()).filter(|&i| sim.tanks[i].team == Team::Blue).collect();
        let (far, near) = (blue[0], blue[1]);
        sim.tanks[far].position = Vec2::new(520.0, 300.0);
        sim.tanks[near].position = Vec2::new(490.0, 300.0);
        let shooter = sim.tanks.iter().position(|t| t.team == Team::Red).unwrap();
        let full = sim.tanks[far].health;

        let origin = Vec2::new(470.0, 300.0);
        let mut shell = Projectile::new(shooter, Team::Red, origin, Vec2::new(1.0, 0.0), 1000.0, 20.0, 1.0);
        shell.advance(0.1);
        sim.projectiles = vec![shell];
        sim.resolve_collisions();

        assert!(sim.tanks[near].health < full);
        assert_eq!(sim.tanks[far].health, full);
        assert!(sim.projectiles.is_empty());
        assert_eq!(sim.tanks[shooter].stats.shots_hit, 1);
    }
}
