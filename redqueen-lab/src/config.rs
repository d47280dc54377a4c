//! Configuration types for the evolution lab
//!
//! Level 4 - Utilities and configuration

use std::path::{Path, PathBuf};

use redqueen_core::BattleConfig;
use redqueen_evolve::ResearchConfig;
use serde::{Deserialize, Serialize};

/// Problems reading or validating a lab configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Candidate pool limits
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Ranked candidates kept per team
    pub per_team_cap: usize,
    /// Trimmed candidates kept aside per team
    pub reserve_per_team: usize,
    /// Similarity above which a new candidate merges into an existing one
    pub merge_similarity: f32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            per_team_cap: 8,
            reserve_per_team: 2,
            merge_similarity: 0.9,
        }
    }
}

/// Weights of the five fitness terms
///
/// They need not sum to one; the evaluator normalises by their total.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessWeights {
    pub outcome: f32,
    pub individual: f32,
    pub team: f32,
    pub diversity: f32,
    pub complexity: f32,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            outcome: 0.35,
            individual: 0.25,
            team: 0.15,
            diversity: 0.15,
            complexity: 0.10,
        }
    }
}

impl FitnessWeights {
    pub fn total(&self) -> f32 {
        self.outcome + self.individual + self.team + self.diversity + self.complexity
    }
}

/// How the async runner drives a battle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Simulated seconds per frame
    pub frame_dt: f32,
    /// Frames stepped between yields to the executor
    pub yield_every: u32,
    /// Wall-clock budget per battle before a forced timeout
    pub wall_clock_limit_ms: u64,
    /// Frame budget per battle before a forced timeout
    pub max_frames: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            frame_dt: 0.05,
            yield_every: 20,
            wall_clock_limit_ms: 30_000,
            max_frames: 6_000,
        }
    }
}

/// Everything the orchestrator needs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub seed: u64,
    pub battle: BattleConfig,
    pub research: ResearchConfig,
    pub pool: PoolConfig,
    pub fitness: FitnessWeights,
    pub runner: RunnerConfig,
    /// Experiments (battles) per generation
    pub experiments_per_generation: u32,
    /// Battle records kept for counter-evolution
    pub history_window: usize,
    /// Random team-biased candidates seeded per team on reset
    pub initial_per_team: usize,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            battle: BattleConfig::default(),
            research: ResearchConfig::default(),
            pool: PoolConfig::default(),
            fitness: FitnessWeights::default(),
            runner: RunnerConfig::default(),
            experiments_per_generation: 5,
            history_window: 50,
            initial_per_team: 4,
        }
    }
}

impl LabConfig {
    /// Read a JSON config; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: LabConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Clamp rates into `[0, 1]` and reject sizes that would stall the loop
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let r = &mut self.research;
        r.crossover_rate = r.crossover_rate.clamp(0.0, 1.0);
        r.elite_fraction = r.elite_fraction.clamp(0.0, 1.0);
        r.mutation.rate = r.mutation.rate.clamp(0.0, 1.0);
        r.emergent_probability = r.emergent_probability.clamp(0.0, 1.0);
        self.pool.merge_similarity = self.pool.merge_similarity.clamp(0.0, 1.0);

        if r.proposals_per_team == 0 {
            return Err(ConfigError::Invalid("research.proposals_per_team must be at least 1".into()));
        }
        if r.tournament_size == 0 {
            return Err(ConfigError::Invalid("research.tournament_size must be at least 1".into()));
        }
        if self.pool.per_team_cap == 0 {
            return Err(ConfigError::Invalid("pool.per_team_cap must be at least 1".into()));
        }
        if self.experiments_per_generation == 0 {
            return Err(ConfigError::Invalid("experiments_per_generation must be at least 1".into()));
        }
        if !(self.runner.frame_dt > 0.0) {
            return Err(ConfigError::Invalid("runner.frame_dt must be positive".into()));
        }
        if self.runner.yield_every == 0 {
            return Err(ConfigError::Invalid("runner.yield_every must be at least 1".into()));
        }
        if self.battle.min_duration > self.battle.max_duration {
            return Err(ConfigError::Invalid(format!(
                "battle.min_duration ({}) exceeds battle.max_duration ({})",
                self.battle.min_duration, self.battle.max_duration
            )));
        }
        if !(self.fitness.total() > 0.0) {
            return Err(ConfigError::Invalid("fitness weights must sum to a positive value".into()));
        }
        Ok(())
    }
}
