//! Evolution orchestrator - the coevolution loop
//!
//! # Architecture
//!
//! Level 1 - Orchestration:
//!   - run() - step repeatedly while the control handle is running
//!
//! Level 2 - Phases (one experiment, see step()):
//!   - propose - Researcher builds a lineup per team
//!   - simulate - run_battle awaits the battle's completion
//!   - score - FitnessEvaluator turns the result into candidates
//!   - update - CandidatePool merges, ranks and trims
//!
//! Every `experiments_per_generation` experiments the generation counter
//! advances. The pool is only touched between battles. Pausing the
//! control handle mid-battle suspends that battle on its own clock until
//! the handle is started again.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use redqueen_core::{
    BattleRecord, BattleResult, BattleSimulator, Candidate, CandidateRecord, Genome, Outcome, Team,
};
use redqueen_evolve::{candidate_label, Researcher};
use tokio::sync::mpsc;

use crate::config::LabConfig;
use crate::fitness::{FitnessBreakdown, FitnessEvaluator};
use crate::pool::CandidatePool;
use crate::runner::{run_battle, ControlHandle, ForcedStop, RunnerError};

/// Buffered events per subscriber before new ones are dropped
const EVENT_BUFFER: usize = 128;

// ============================================================================
// EVENTS
// ============================================================================

#[derive(Clone, Debug)]
pub enum EvolutionEvent {
    BattleCompleted {
        experiment: u64,
        generation: u32,
        result: Box<BattleResult>,
    },
    GenerationComplete {
        generation: u32,
        best_red: Option<f32>,
        best_blue: Option<f32>,
    },
    Reset,
}

/// Fitness assigned to one lineup slot
#[derive(Clone, Debug)]
pub struct ScoredGenome {
    pub team: Team,
    pub index: usize,
    pub genome: Genome,
    pub fitness: FitnessBreakdown,
}

/// What one experiment produced
#[derive(Clone, Debug)]
pub struct ExperimentReport {
    pub experiment: u64,
    /// Generation the battle was fought in
    pub generation: u32,
    pub result: BattleResult,
    pub scores: Vec<ScoredGenome>,
    pub forced: Option<ForcedStop>,
    /// This experiment closed out its generation
    pub generation_completed: bool,
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

pub struct Orchestrator {
    config: LabConfig,
    rng: ChaCha8Rng,
    researcher: Researcher,
    evaluator: FitnessEvaluator,
    pool: CandidatePool,
    history: Vec<BattleRecord>,
    /// Lineups fought in the latest experiment, by team index
    populations: [Vec<Genome>; 2],
    generation: u32,
    experiment: u64,
    control: ControlHandle,
    subscribers: Vec<mpsc::Sender<EvolutionEvent>>,
}

impl Orchestrator {
    pub fn new(config: LabConfig) -> Self {
        let mut orchestrator = Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            researcher: Researcher::new(config.research.clone()),
            evaluator: FitnessEvaluator::new(config.fitness.clone(), config.battle.max_duration),
            pool: CandidatePool::new(config.pool.clone()),
            history: Vec::new(),
            populations: [Vec::new(), Vec::new()],
            generation: 0,
            experiment: 0,
            control: ControlHandle::default(),
            subscribers: Vec::new(),
            config,
        };
        orchestrator.initialize();
        orchestrator
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    pub fn control(&self) -> ControlHandle {
        self.control.clone()
    }

    pub fn start(&self) {
        self.control.start();
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }

    /// Clear history, pool and populations and reseed as on first run.
    ///
    /// Leaves the loop paused.
    pub fn reset(&mut self) {
        self.control.pause();
        self.initialize();
        tracing::info!(seed = self.config.seed, "Evolution reset");
        self.emit(EvolutionEvent::Reset);
    }

    fn initialize(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.pool.clear();
        self.history.clear();
        self.populations = [Vec::new(), Vec::new()];
        self.generation = 0;
        self.experiment = 0;

        for team in Team::ALL {
            self.pool
                .seed_initial(team, self.config.initial_per_team, 0, &mut self.rng);
        }
    }

    /// Receive events from now on
    pub fn subscribe(&mut self) -> mpsc::Receiver<EvolutionEvent> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: EvolutionEvent) {
        self.subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Event subscriber is full, dropping event");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    // ========================================================================
    // LOOP (Level 1)
    // ========================================================================

    /// Run up to `max_experiments` experiments while the handle is running
    ///
    /// # Returns
    /// Number of experiments completed
    pub async fn run(&mut self, max_experiments: u64) -> Result<u64, RunnerError> {
        let mut completed = 0;
        while completed < max_experiments && self.control.is_running() {
            self.step().await?;
            completed += 1;
        }
        Ok(completed)
    }

    /// One experiment: propose, simulate, score, update (Level 2)
    ///
    /// The battle only advances while the control handle is running.
    pub async fn step(&mut self) -> Result<ExperimentReport, RunnerError> {
        let generation = self.generation;
        let experiment = self.experiment;

        let red = self.propose(Team::Red);
        let blue = self.propose(Team::Blue);

        let seed: u64 = self.rng.gen();
        let mut sim = BattleSimulator::new(self.config.battle.clone(), seed);
        let run = run_battle(&mut sim, &red, &blue, &self.config.runner, &self.control).await?;
        let result = run.result;

        let scores = self.score(&result, &red, &blue);
        let candidates: Vec<Candidate> = scores
            .iter()
            .map(|s| {
                let won = result.outcome_for(s.team) == Outcome::Win;
                Candidate::new(s.team, s.genome, generation).with_outcome(s.fitness.total, won)
            })
            .collect();
        self.pool.add_batch(candidates);

        self.remember(BattleRecord::from_result(&result, &red, &blue, experiment, generation));
        self.populations = [red, blue];
        self.experiment += 1;

        tracing::debug!(
            experiment,
            generation,
            winner = ?result.winner,
            duration = result.duration,
            "Experiment complete"
        );
        self.emit(EvolutionEvent::BattleCompleted {
            experiment,
            generation,
            result: Box::new(result.clone()),
        });

        let generation_completed = self.experiment % u64::from(self.config.experiments_per_generation.max(1)) == 0;
        if generation_completed {
            self.complete_generation();
        }

        Ok(ExperimentReport {
            experiment,
            generation,
            result,
            scores,
            forced: run.forced,
            generation_completed,
        })
    }

    // ========================================================================
    // PHASES (Level 2)
    // ========================================================================

    fn propose(&mut self, team: Team) -> Vec<Genome> {
        let parents = self.pool.parents_for(team, self.researcher.config().min_parents);
        self.researcher
            .propose(team, &parents, &self.history, self.generation, &mut self.rng)
            .into_iter()
            .map(|p| p.genome)
            .collect()
    }

    fn score(&self, result: &BattleResult, red: &[Genome], blue: &[Genome]) -> Vec<ScoredGenome> {
        let mut scores = Vec::with_capacity(red.len() + blue.len());
        for (team, lineup) in [(Team::Red, red), (Team::Blue, blue)] {
            let team_pool = self.pool.genomes(team);
            for (index, genome) in lineup.iter().enumerate() {
                let fitness = self.evaluator.evaluate(team, index, genome, result, &team_pool);
                scores.push(ScoredGenome { team, index, genome: *genome, fitness });
            }
        }
        scores
    }

    fn remember(&mut self, record: BattleRecord) {
        self.history.push(record);
        let cap = self.config.history_window.max(1);
        if self.history.len() > cap {
            let excess = self.history.len() - cap;
            self.history.drain(..excess);
        }
    }

    fn complete_generation(&mut self) {
        self.generation += 1;
        let best_red = self.pool.best(Team::Red).map(|c| c.fitness());
        let best_blue = self.pool.best(Team::Blue).map(|c| c.fitness());

        let label = |team: Team| {
            self.pool
                .best(team)
                .map(|c| format!("{} {:.3}", candidate_label(team, c.genome()), c.fitness()))
                .unwrap_or_else(|| format!("{}: none", team))
        };
        tracing::info!(
            "Generation {} complete: best {}, best {}",
            self.generation,
            label(Team::Red),
            label(Team::Blue),
        );
        self.emit(EvolutionEvent::GenerationComplete {
            generation: self.generation,
            best_red,
            best_blue,
        });
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn config(&self) -> &LabConfig {
        &self.config
    }

    pub fn pool(&self) -> &CandidatePool {
        &self.pool
    }

    pub fn history(&self) -> &[BattleRecord] {
        &self.history
    }

    pub fn population(&self, team: Team) -> &[Genome] {
        &self.populations[team.index()]
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn experiment(&self) -> u64 {
        self.experiment
    }

    /// Bring external candidates into the pool between battles
    pub fn import(&mut self, records: impl IntoIterator<Item = CandidateRecord>) -> usize {
        self.pool.import(records)
    }
}
