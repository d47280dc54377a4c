//! Red Queen Lab - evaluation and the coevolution loop
//!
//! This crate provides the evaluation side of the loop:
//! - Fitness evaluation from battle results
//! - Team-segregated candidate pool
//! - Async battle runner with frame and wall-clock budgets
//! - Evolution orchestrator with start/pause/reset and events
//! - Parallel bench of seeded battles
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: Orchestrator::run (orchestration)
//! - Level 2: Orchestrator::step, CandidatePool::add_batch, run_bench (phases)
//! - Level 3: run_battle, FitnessEvaluator::evaluate, play_single_battle (steps)
//! - Level 4: utilities, configuration

mod bench;
mod config;
mod fitness;
mod orchestrator;
mod pool;
mod runner;

pub use bench::{play_single_battle, run_bench, run_bench_parallel, BenchResult};
pub use config::{ConfigError, FitnessWeights, LabConfig, PoolConfig, RunnerConfig};
pub use fitness::{
    complexity_score, diversity_score, individual_score, outcome_score, FitnessBreakdown, FitnessEvaluator,
};
pub use orchestrator::{EvolutionEvent, ExperimentReport, Orchestrator, ScoredGenome};
pub use pool::{AddOutcome, CandidatePool};
pub use runner::{run_battle, BattleRun, ControlHandle, ForcedStop, RunnerError};
